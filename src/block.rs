//! Growable byte region backing a document.
//!
//! A [`Block`] separates its allocated capacity from the `used` watermark, the
//! position one past the last byte that belongs to the encoded document.
//! Everything between `used` and the capacity is zero. Encoded containers
//! treat zero bytes as free space, so keeping the tail zeroed lets a cursor
//! write past `used` without first clearing memory.

use tracing::trace;

/// Overallocation factor applied whenever a block has to grow.
pub const GROWTH_FACTOR: f64 = 1.7;

/// An owned, resizable byte region with a last-used-byte watermark.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Block {
    bytes: Vec<u8>,
    used: usize,
}

impl Block {
    /// Creates an empty block with `capacity` zeroed bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Block {
            bytes: vec![0; capacity],
            used: 0,
        }
    }

    /// Wraps existing bytes; all of them count as used.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let used = bytes.len();
        Block { bytes, used }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// The encoded bytes, `[0, used)`.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.used]
    }

    /// The whole allocation including the zeroed tail.
    #[inline]
    pub(crate) fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the block, returning exactly the used bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.truncate(self.used);
        self.bytes
    }

    /// Adds `by` zeroed bytes of capacity.
    pub fn grow(&mut self, by: usize) {
        let new_len = self.bytes.len() + by;
        trace!(target: "colbin::block", from = self.bytes.len(), to = new_len, "grow");
        self.bytes.resize(new_len, 0);
    }

    /// Makes sure at least `min_capacity` bytes are allocated, overallocating
    /// by [`GROWTH_FACTOR`] when a reallocation is needed.
    pub fn reserve_to(&mut self, min_capacity: usize) {
        if min_capacity <= self.bytes.len() {
            return;
        }
        let target = ((min_capacity as f64) * GROWTH_FACTOR).ceil() as usize;
        self.grow(target - self.bytes.len());
    }

    /// Trims capacity down to the used length.
    pub fn shrink(&mut self) {
        self.bytes.truncate(self.used);
        self.bytes.shrink_to_fit();
    }

    /// Writes `data` at `offset`, growing the block and raising `used` as needed.
    pub(crate) fn write_at(&mut self, offset: usize, data: &[u8]) {
        let end = offset + data.len();
        self.reserve_to(end);
        self.bytes[offset..end].copy_from_slice(data);
        self.used = self.used.max(end);
        self.debug_check();
    }

    /// Shifts `[offset, used)` right by `n` and zero-fills the gap.
    pub(crate) fn insert_zeros(&mut self, offset: usize, n: usize) {
        debug_assert!(offset <= self.used, "insert past used watermark");
        if n == 0 {
            return;
        }
        self.reserve_to(self.used + n);
        self.bytes.copy_within(offset..self.used, offset + n);
        self.bytes[offset..offset + n].fill(0);
        self.used += n;
        self.debug_check();
    }

    /// Shifts `[offset + n, used)` left by `n` and zeroes the vacated tail.
    pub(crate) fn remove_range(&mut self, offset: usize, n: usize) {
        debug_assert!(offset + n <= self.used, "remove past used watermark");
        if n == 0 {
            return;
        }
        self.bytes.copy_within(offset + n..self.used, offset);
        self.bytes[self.used - n..self.used].fill(0);
        self.used -= n;
        self.debug_check();
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(self.used <= self.bytes.len(), "used exceeds capacity");
    }
}
