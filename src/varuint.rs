//! # Variable-Length Unsigned Integers
//!
//! Lengths, counts, capacities and media-type ids are stored as varuints: a
//! little-endian base-128 stream where each byte carries seven value bits and
//! the high bit signals that another byte follows.
//!
//! | Value Range              | Bytes |
//! |--------------------------|-------|
//! | 0 - 127                  | 1     |
//! | 128 - 16383              | 2     |
//! | 16384 - 2097151          | 3     |
//! | ...                      | ...   |
//! | 2^63 - u64::MAX          | 10    |
//!
//! Encoding is always minimal, so the width of a value is a pure function of
//! the value. [`crate::MemFile::update_varuint`] relies on this to decide
//! whether rewriting a length needs bytes inserted or removed.
//!
//! ## Usage Example
//!
//! ```rust
//! use colbin::varuint::{decode_varuint, encode_varuint, varuint_len};
//!
//! assert_eq!(varuint_len(300), 2);
//!
//! let mut buf = [0u8; 10];
//! let written = encode_varuint(300, &mut buf);
//! assert_eq!(&buf[..written], &[0xac, 0x02]);
//!
//! let (value, read) = decode_varuint(&buf).unwrap();
//! assert_eq!((value, read), (300, 2));
//! ```

use crate::{Error, Result};

/// Largest number of bytes a `u64` needs.
pub const MAX_VARUINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// Returns the encoded width of `value` in bytes.
#[inline]
#[must_use]
pub const fn varuint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}

/// Encodes `value` into the front of `buf`, returning the bytes written.
///
/// # Panics
///
/// Panics if `buf` is shorter than [`varuint_len`] of `value`.
pub fn encode_varuint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value as u8) & PAYLOAD_MASK;
        value >>= 7;
        if value == 0 {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | CONTINUATION;
        i += 1;
    }
}

/// Encodes `value` into a fresh vector.
#[must_use]
pub fn varuint_bytes(value: u64) -> Vec<u8> {
    let mut buf = [0u8; MAX_VARUINT_LEN];
    let n = encode_varuint(value, &mut buf);
    buf[..n].to_vec()
}

/// Decodes a varuint from the front of `buf`, returning `(value, bytes_read)`.
///
/// # Errors
///
/// Returns [`Error::OutOfBounds`] when the stream ends mid-value and
/// [`Error::Corrupted`] when the stream runs past ten bytes or overflows `u64`.
pub fn decode_varuint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARUINT_LEN {
            return Err(Error::corrupted(i as u64, byte));
        }
        let payload = u64::from(byte & PAYLOAD_MASK);
        if i == MAX_VARUINT_LEN - 1 && payload > 1 {
            return Err(Error::corrupted(i as u64, byte));
        }
        value |= payload << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::out_of_bounds(
        0,
        buf.len() as u64 + 1,
        buf.len() as u64,
    ))
}
