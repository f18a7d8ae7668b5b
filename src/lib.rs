//! # colbin
//!
//! A mutable, self-describing binary document format with packed columns and
//! in-place updates.
//!
//! ## What is colbin?
//!
//! colbin stores one record per document: a small head (record key and
//! commit hash) followed by a root array or object. Every field carries a
//! one-byte marker, so documents are readable without a schema. Homogeneous
//! numeric or boolean sequences can be stored as columns: packed fixed-width
//! slots with O(1) indexed access.
//!
//! ## Key Features
//!
//! - **Self-Describing**: scalars, strings, typed binary blobs, arrays,
//!   objects and columns, each tagged by its marker byte
//! - **In-Place Mutation**: containers reserve zero-filled free space, so
//!   inserts and fixed-width updates rarely move the rest of the document
//! - **Columns**: packed slots with per-type null sentinels, growing by a
//!   factor of 1.7
//! - **Dot-Paths**: `"users.3.name"` style lookups and updates
//! - **Revisions**: edit a copy, then commit it with the next commit hash or
//!   abort it
//! - **Serde Compatible**: any `T: Serialize` converts to a [`Value`] or a
//!   [`Document`]
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! colbin = "0.1"
//! ```
//!
//! ### Building a Document
//!
//! ```rust
//! use colbin::{ColumnType, Derivation, Document};
//!
//! let mut doc = Document::new();
//! {
//!     let mut ins = doc.inserter().unwrap();
//!     ins.insert_string("sensor-7").unwrap();
//!     ins.begin_column(ColumnType::U16, Derivation::default()).unwrap();
//!     for reading in [120u16, 121, 119] {
//!         ins.insert(reading).unwrap();
//!     }
//!     ins.end_column().unwrap();
//!     ins.finish().unwrap();
//! }
//!
//! assert_eq!(doc.to_json().unwrap(), r#"["sensor-7", [120, 121, 119]]"#);
//! assert_eq!(doc.find("1.2").unwrap().as_u64(), Some(119));
//! ```
//!
//! ### From Serde Types
//!
//! ```rust
//! use colbin::{to_document, DocOptions};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//! let doc = to_document(&user, DocOptions::new()).unwrap();
//! assert_eq!(doc.to_json().unwrap(), r#"{"id": 123, "name": "Alice", "active": true}"#);
//! ```
//!
//! ### Revisions
//!
//! ```rust
//! use colbin::{colbin, DocOptions, Document};
//!
//! let doc = Document::from_value(&colbin!({"visits": 9u32}), DocOptions::new()).unwrap();
//! let mut rev = doc.revise();
//! rev.set("visits", 10u32).unwrap();
//! let doc = rev.commit().unwrap();
//! assert_eq!(doc.find("visits").unwrap().as_u64(), Some(10));
//! assert_eq!(doc.commit_hash().unwrap(), 1);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Column access**: O(1) per slot
//! - **Column appends**: amortized O(1), O(log n) reallocations
//! - **Fixed-width updates**: in place when the encoded kind is unchanged
//! - **Array and object access**: O(n) forward scans
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Every read is bounds-checked; malformed input yields
//!   [`Error::Corrupted`] or [`Error::OutOfBounds`], never a panic
//! - Array/object nesting is capped at [`codec::MAX_DEPTH`] levels when
//!   reading and when building
//!
//! ## Wire Format
//!
//! The byte layout is documented in [`format`].
//!
//! ## Demos
//!
//! See the `demos/` directory:
//!
//! - **`build_document.rs`** - Building nested documents with the inserter
//! - **`columns.rs`** - Column access, sentinels and growth
//! - **`revisions.rs`** - Dot-path updates inside revisions
//!
//! Run any demo with: `cargo run --example <name>`

mod array;
mod block;
pub mod codec;
mod column;
mod document;
pub mod error;
mod field;
mod find;
pub mod format;
mod insert;
pub mod macros;
mod map;
mod memfile;
pub mod mime;
mod object;
pub mod options;
mod path;
mod revise;
pub mod ser;
mod value;
pub mod varuint;

pub use array::{ArrayIter, IterState};
pub use block::{Block, GROWTH_FACTOR};
pub use column::ColumnIter;
pub use document::{key_marker, DocKey, Document, Root};
pub use error::{Error, Result};
pub use field::{marker, ColumnType, Derivation, FieldType, Number, Scalar};
pub use find::Find;
pub use insert::{Inserter, Reservation};
pub use map::DocMap;
pub use memfile::{AccessMode, MemFile, VarUintWrite};
pub use object::ObjectIter;
pub use options::{DocOptions, KeyKind, RootKind};
pub use path::{DotPath, PathEvaluation, PathSegment, PathStatus, PathTarget};
pub use revise::Revision;
pub use ser::{to_document, to_value, ValueSerializer};
pub use value::{Binary, BinaryKind, Value};

/// Decodes a document from its bytes into an owned [`Value`].
///
/// # Examples
///
/// ```rust
/// use colbin::{colbin, from_slice, DocOptions, Document};
///
/// let doc = Document::from_value(&colbin!(["a", 1u8]), DocOptions::new()).unwrap();
/// assert_eq!(from_slice(doc.as_bytes()).unwrap(), colbin!(["a", 1u8]));
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not a well-formed document.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    Document::from_bytes(bytes.to_vec())?.to_value()
}
