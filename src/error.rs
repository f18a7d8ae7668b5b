//! Error types for document encoding, navigation and mutation.
//!
//! Every fallible operation in this crate returns [`Result`], carrying one
//! [`Error`] variant per failure class:
//!
//! - **Cursor errors**: [`Error::OutOfBounds`], [`Error::WriteProtected`],
//!   [`Error::StackOverflow`], [`Error::StackUnderflow`]
//! - **Type errors**: [`Error::TypeMismatch`] when an accessor or a column does
//!   not match the encoded field kind
//! - **Iterator errors**: [`Error::NotPositioned`] for element access before
//!   the first or after the last element
//! - **Path errors**: [`Error::PathParse`] for malformed dot-paths and
//!   [`Error::NotFound`] for paths that resolve to nothing
//! - **Format errors**: [`Error::Corrupted`] when an unknown marker byte is met
//!
//! Find, update and revision APIs report an unresolved path as `None` or
//! `false`; [`Error::NotFound`] only shows up where a caller explicitly asked
//! for a value that must exist.
//!
//! ## Examples
//!
//! ```rust
//! use colbin::Error;
//!
//! let err = Error::type_mismatch("u8", "string");
//! assert!(err.to_string().contains("expected u8"));
//! assert!(!err.is_not_found());
//! ```

use std::fmt;
use thiserror::Error;

/// Represents every failure the binary engine can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A required argument was empty or missing
    #[error("Null argument: {0}")]
    NullArgument(String),

    /// Read or seek past the last used byte of the block
    #[error("Out of bounds: offset {offset} + {len} exceeds used length {used}")]
    OutOfBounds { offset: u64, len: u64, used: u64 },

    /// Mutation attempted through a read-only cursor
    #[error("Write protected: cursor was opened read-only")]
    WriteProtected,

    /// A bounded stack is full: saved cursor positions, or container
    /// nesting while building
    #[error("Stack overflow (depth {0})")]
    StackOverflow(usize),

    /// Restore without a matching save
    #[error("Position stack underflow")]
    StackUnderflow,

    /// The encoded field does not have the requested kind
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Element access on an iterator that is before its first or past its
    /// last element
    #[error("Iterator is not positioned on an element")]
    NotPositioned,

    /// Malformed dot-path expression
    #[error("Invalid path '{path}': {msg}")]
    PathParse { path: String, msg: String },

    /// Path did not resolve to a field
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation exists in the API but has no implementation yet
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Unknown marker byte, usually buffer corruption or a version mismatch
    #[error("Corrupted document at offset {offset}: unexpected marker 0x{marker:02x}")]
    Corrupted { offset: u64, marker: u8 },

    /// Invariant violation inside the engine
    #[error("Internal error: {0}")]
    Internal(String),

    /// Custom error raised through serde
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an out-of-bounds error for an access of `len` bytes at `offset`.
    pub fn out_of_bounds(offset: u64, len: u64, used: u64) -> Self {
        Error::OutOfBounds { offset, len, used }
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colbin::Error;
    ///
    /// let err = Error::type_mismatch("column<u8>", "i64");
    /// assert!(err.to_string().contains("found i64"));
    /// ```
    pub fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a path parse error.
    pub fn path_parse(path: &str, msg: &str) -> Self {
        Error::PathParse {
            path: path.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a corruption error for an unknown marker byte.
    pub fn corrupted(offset: u64, marker: u8) -> Self {
        Error::Corrupted { offset, marker }
    }

    pub fn not_found(path: &str) -> Self {
        Error::NotFound(path.to_string())
    }

    pub fn not_implemented(what: &str) -> Self {
        Error::NotImplemented(what.to_string())
    }

    pub fn internal(msg: impl fmt::Display) -> Self {
        Error::Internal(msg.to_string())
    }

    pub fn null_argument(what: &str) -> Self {
        Error::NullArgument(what.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` for the "path resolved to nothing" outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_out_of_bounds() {
        let err = Error::out_of_bounds(10, 4, 12);
        let msg = err.to_string();
        assert!(msg.contains("offset 10"));
        assert!(msg.contains("used length 12"));
    }

    #[test]
    fn test_display_corrupted() {
        let err = Error::corrupted(7, 0xee);
        assert_eq!(
            err.to_string(),
            "Corrupted document at offset 7: unexpected marker 0xee"
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(Error::not_found("a.b").is_not_found());
        assert!(!Error::WriteProtected.is_not_found());
    }
}
