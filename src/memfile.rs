//! Positional cursor over a [`Block`].
//!
//! A [`MemFile`] is the only way the engine touches document bytes. It keeps
//! a position, a bounded stack of saved positions, an access mode and an
//! optional bit-addressing mode on top of byte addressing. All accesses are
//! checked: reading past the block's used watermark is
//! [`Error::OutOfBounds`], and any mutation through a read-only cursor is
//! [`Error::WriteProtected`].
//!
//! The cursor borrows its block. Iterators that need an independent position
//! over the same bytes either [`MemFile::reborrow`] (nested, temporary) or
//! take ownership of the cursor (moving deeper into a document).
//!
//! ```rust
//! use colbin::{Block, MemFile, AccessMode};
//!
//! let mut block = Block::with_capacity(16);
//! let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
//! file.write(b"ab").unwrap();
//! file.write_varuint(300).unwrap();
//! file.seek(2).unwrap();
//! assert_eq!(file.read_varuint().unwrap(), 300);
//! ```

use crate::block::Block;
use crate::varuint::{decode_varuint, encode_varuint, varuint_len, MAX_VARUINT_LEN};
use crate::{Error, Result};
use tracing::{debug, trace};

/// Depth of the save/restore position stack.
pub const POSITION_STACK_DEPTH: usize = 10;

/// Whether a cursor may mutate its block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    ReadOnly,
    ReadWrite,
}

/// Outcome of [`MemFile::write_varuint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarUintWrite {
    /// Encoded width of the value.
    pub written: usize,
    /// Bytes inserted in front of existing data to make room.
    pub shift: i64,
}

enum BlockRef<'a> {
    Shared(&'a Block),
    Exclusive(&'a mut Block),
}

#[derive(Clone, Copy, Debug, Default)]
struct BitState {
    active: bool,
    read_bit: u8,
    write_bit: u8,
    bytes_completed: u64,
}

/// A checked cursor into a [`Block`].
pub struct MemFile<'a> {
    block: BlockRef<'a>,
    pos: u64,
    saved: [u64; POSITION_STACK_DEPTH],
    saved_len: usize,
    mode: AccessMode,
    bits: BitState,
}

impl<'a> MemFile<'a> {
    /// Opens a read-only cursor at offset 0.
    #[must_use]
    pub fn open(block: &'a Block) -> Self {
        Self::with_ref(BlockRef::Shared(block), AccessMode::ReadOnly)
    }

    /// Opens a cursor over an exclusively borrowed block.
    #[must_use]
    pub fn open_mut(block: &'a mut Block, mode: AccessMode) -> Self {
        Self::with_ref(BlockRef::Exclusive(block), mode)
    }

    fn with_ref(block: BlockRef<'a>, mode: AccessMode) -> Self {
        MemFile {
            block,
            pos: 0,
            saved: [0; POSITION_STACK_DEPTH],
            saved_len: 0,
            mode,
            bits: BitState::default(),
        }
    }

    /// A second cursor over the same block at the same position, borrowing
    /// this one for its lifetime. The position stack starts empty.
    pub fn reborrow(&mut self) -> MemFile<'_> {
        let block = match &mut self.block {
            BlockRef::Shared(b) => BlockRef::Shared(&**b),
            BlockRef::Exclusive(b) => BlockRef::Exclusive(&mut **b),
        };
        let mut file = MemFile::with_ref(block, self.mode);
        file.pos = self.pos;
        file
    }

    #[inline]
    #[must_use]
    pub fn block(&self) -> &Block {
        match &self.block {
            BlockRef::Shared(b) => *b,
            BlockRef::Exclusive(b) => &**b,
        }
    }

    fn block_mut(&mut self) -> Result<&mut Block> {
        match (&mut self.block, self.mode) {
            (BlockRef::Exclusive(b), AccessMode::ReadWrite) => Ok(&mut **b),
            _ => Err(Error::WriteProtected),
        }
    }

    /// The used bytes of the underlying block.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.block().as_bytes()
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.mode == AccessMode::ReadWrite && matches!(self.block, BlockRef::Exclusive(_))
    }

    /// Current offset.
    #[inline]
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// The block's used watermark.
    #[inline]
    #[must_use]
    pub fn used(&self) -> u64 {
        self.block().used() as u64
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.used().saturating_sub(self.pos)
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        let used = self.used();
        match offset.checked_add(len) {
            Some(end) if end <= used => Ok(()),
            _ => Err(Error::out_of_bounds(offset, len, used)),
        }
    }

    /// Moves to `pos`, which may equal the used watermark but not exceed it.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.check_range(pos, 0)?;
        self.pos = pos;
        Ok(())
    }

    /// Moves by a signed distance.
    pub fn skip(&mut self, n: i64) -> Result<()> {
        let target = if n >= 0 {
            self.pos.checked_add(n as u64)
        } else {
            self.pos.checked_sub(n.unsigned_abs())
        };
        match target {
            Some(pos) => self.seek(pos),
            None => Err(Error::out_of_bounds(self.pos, n.unsigned_abs(), self.used())),
        }
    }

    /// Reads `n` bytes and advances.
    pub fn read(&mut self, n: u64) -> Result<&[u8]> {
        let start = self.pos;
        self.check_range(start, n)?;
        self.pos += n;
        Ok(&self.bytes()[start as usize..(start + n) as usize])
    }

    /// Reads `n` bytes without advancing.
    pub fn peek(&self, n: u64) -> Result<&[u8]> {
        self.bytes_at(self.pos, n)
    }

    /// Reads `n` bytes at an absolute offset without moving.
    pub fn bytes_at(&self, offset: u64, n: u64) -> Result<&[u8]> {
        self.check_range(offset, n)?;
        Ok(&self.bytes()[offset as usize..(offset + n) as usize])
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    pub fn peek_byte(&self) -> Result<u8> {
        Ok(self.peek(1)?[0])
    }

    /// Overwrites bytes at the position and advances past them.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let pos = self.pos as usize;
        self.block_mut()?.write_at(pos, data);
        self.pos += data.len() as u64;
        Ok(())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte])
    }

    /// Adds `by` zeroed bytes of capacity to the block.
    pub fn grow(&mut self, by: usize) -> Result<()> {
        self.block_mut()?.grow(by);
        Ok(())
    }

    /// Guarantees `n` writable bytes at the position without clobbering data.
    ///
    /// The `n` bytes at the position are scanned; zero bytes count as free
    /// space. At the first non-zero byte, found after `i` free bytes, `n - i`
    /// zero bytes are inserted at the position. Returns the number of bytes
    /// inserted, which is zero on a repeated call.
    pub fn ensure_space(&mut self, n: u64) -> Result<u64> {
        let pos = self.pos as usize;
        let block = self.block_mut()?;
        let raw = block.raw();
        let mut free = n;
        for i in 0..n as usize {
            if raw.get(pos + i).copied().unwrap_or(0) != 0 {
                free = i as u64;
                break;
            }
        }
        let missing = n - free;
        if missing > 0 {
            trace!(target: "colbin::memfile", offset = pos, missing, "ensure_space shifts tail");
            block.insert_zeros(pos, missing as usize);
        }
        Ok(missing)
    }

    /// Shifts everything at and after the position right by `n` zero bytes.
    pub fn inplace_insert(&mut self, n: u64) -> Result<()> {
        let pos = self.pos;
        self.check_range(pos, 0)?;
        self.block_mut()?.insert_zeros(pos as usize, n as usize);
        Ok(())
    }

    /// Removes `n` bytes at the position, shifting the tail left.
    pub fn inplace_remove(&mut self, n: u64) -> Result<()> {
        let pos = self.pos;
        self.check_range(pos, n)?;
        self.block_mut()?.remove_range(pos as usize, n as usize);
        Ok(())
    }

    /// Pushes the current position.
    pub fn save_position(&mut self) -> Result<()> {
        if self.saved_len == POSITION_STACK_DEPTH {
            return Err(Error::StackOverflow(POSITION_STACK_DEPTH));
        }
        self.saved[self.saved_len] = self.pos;
        self.saved_len += 1;
        Ok(())
    }

    /// Pops the most recently saved position and seeks to it.
    pub fn restore_position(&mut self) -> Result<()> {
        if self.saved_len == 0 {
            return Err(Error::StackUnderflow);
        }
        self.saved_len -= 1;
        let pos = self.saved[self.saved_len];
        self.seek(pos)
    }

    /// Starts bit-addressed writing at the position. The byte under the
    /// cursor is cleared.
    pub fn begin_bit_mode(&mut self) -> Result<()> {
        let pos = self.pos as usize;
        self.block_mut()?.write_at(pos, &[0]);
        self.bits = BitState {
            active: true,
            ..BitState::default()
        };
        Ok(())
    }

    /// Writes one bit, least significant first, moving to a fresh byte after
    /// every eighth bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if !self.bits.active {
            return Err(Error::internal("write_bit outside bit mode"));
        }
        self.bits.read_bit = 0;
        if self.bits.write_bit == 8 {
            self.bits.write_bit = 0;
            self.bits.bytes_completed += 1;
            self.pos += 1;
            let pos = self.pos as usize;
            self.block_mut()?.write_at(pos, &[0]);
        }
        let pos = self.pos as usize;
        let mask = 1u8 << self.bits.write_bit;
        let block = self.block_mut()?;
        let current = block.raw()[pos];
        let byte = if bit { current | mask } else { current & !mask };
        block.write_at(pos, &[byte]);
        self.bits.write_bit += 1;
        Ok(())
    }

    /// Reads one bit, least significant first.
    pub fn read_bit(&mut self) -> Result<bool> {
        self.bits.write_bit = 0;
        if self.bits.read_bit == 8 {
            self.bits.read_bit = 0;
            self.pos += 1;
        }
        let byte = self.bytes_at(self.pos, 1)?[0];
        let bit = (byte >> self.bits.read_bit) & 1 == 1;
        self.bits.read_bit += 1;
        Ok(bit)
    }

    /// Leaves bit mode, moves past the last touched byte and returns the
    /// number of bytes written in bit mode.
    pub fn end_bit_mode(&mut self) -> Result<u64> {
        if !self.bits.active {
            return Err(Error::internal("end_bit_mode outside bit mode"));
        }
        let written = self.bits.bytes_completed + 1;
        self.bits = BitState::default();
        self.pos += 1;
        Ok(written)
    }

    /// Decodes a varuint at the position without advancing, returning
    /// `(value, width)`.
    pub fn peek_varuint(&self) -> Result<(u64, usize)> {
        let start = self.pos as usize;
        let bytes = self.bytes();
        if start > bytes.len() {
            return Err(Error::out_of_bounds(self.pos, 1, bytes.len() as u64));
        }
        decode_varuint(&bytes[start..]).map_err(|e| match e {
            Error::OutOfBounds { len, .. } => Error::out_of_bounds(self.pos, len, self.used()),
            Error::Corrupted { offset, marker } => Error::corrupted(self.pos + offset, marker),
            other => other,
        })
    }

    pub fn read_varuint(&mut self) -> Result<u64> {
        let (value, width) = self.peek_varuint()?;
        self.pos += width as u64;
        Ok(value)
    }

    /// Writes `value` as a varuint, first making room so no encoded byte
    /// after the position is overwritten.
    pub fn write_varuint(&mut self, value: u64) -> Result<VarUintWrite> {
        let mut buf = [0u8; MAX_VARUINT_LEN];
        let written = encode_varuint(value, &mut buf);
        let shift = self.ensure_space(written as u64)?;
        self.write(&buf[..written])?;
        Ok(VarUintWrite {
            written,
            shift: shift as i64,
        })
    }

    /// Rewrites the varuint at the position with `value`, inserting or
    /// removing bytes when the width changes. Advances past the new encoding
    /// and returns the signed shift applied to every byte after it.
    pub fn update_varuint(&mut self, value: u64) -> Result<i64> {
        if !self.is_writable() {
            return Err(Error::WriteProtected);
        }
        let (_, old_width) = self.peek_varuint()?;
        let new_width = varuint_len(value);
        let shift = new_width as i64 - old_width as i64;
        if shift > 0 {
            self.inplace_insert(shift as u64)?;
        } else if shift < 0 {
            self.inplace_remove(shift.unsigned_abs())?;
        }
        if shift != 0 {
            debug!(target: "colbin::memfile", offset = self.pos, old_width, new_width, "varuint width change");
        }
        let mut buf = [0u8; MAX_VARUINT_LEN];
        let written = encode_varuint(value, &mut buf);
        self.write(&buf[..written])?;
        Ok(shift)
    }
}
