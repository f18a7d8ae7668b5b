//! Configuration options for new documents.
//!
//! This module provides the types that shape a document when it is created:
//!
//! - [`DocOptions`]: main configuration struct
//! - [`KeyKind`]: which record key goes into the document head
//! - [`RootKind`]: whether the root container is an array or an object
//!
//! ## Examples
//!
//! ```rust
//! use colbin::{DocOptions, Document, KeyKind, RootKind};
//!
//! // Object root keyed by a string, no reserved padding
//! let options = DocOptions::compact()
//!     .with_root(RootKind::Object)
//!     .with_key(KeyKind::String("user:42".into()));
//! let doc = Document::with_options(options);
//! assert_eq!(doc.root_kind(), RootKind::Object);
//! assert_eq!(doc.to_json().unwrap(), "{}");
//! ```

use crate::field::Derivation;
use crate::insert::Reservation;

/// Record key requested for a new document.
///
/// # Examples
///
/// ```rust
/// use colbin::{DocKey, DocOptions, Document, KeyKind};
///
/// let doc = Document::with_options(DocOptions::new().with_key(KeyKind::Signed(-1)));
/// assert_eq!(doc.key().unwrap(), DocKey::Signed(-1));
///
/// // Auto keys are drawn from a process-wide counter
/// let a = Document::with_options(DocOptions::new().with_key(KeyKind::Auto));
/// let b = Document::with_options(DocOptions::new().with_key(KeyKind::Auto));
/// assert_ne!(a.key().unwrap(), b.key().unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum KeyKind {
    #[default]
    None,
    /// Next value of the process-wide counter.
    Auto,
    Unsigned(u64),
    Signed(i64),
    String(String),
}

/// Kind of the root container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RootKind {
    #[default]
    Array,
    Object,
}

/// Configuration options for new documents.
///
/// Controls the document head, the root container and how much free space
/// the insertion engine reserves when it opens nested containers.
///
/// # Examples
///
/// ```rust
/// use colbin::{Derivation, DocOptions};
///
/// let options = DocOptions::new()
///     .with_derivation(Derivation::SortedSet)
///     .with_column_capacity(64)
///     .with_float_precision(4);
/// assert_eq!(options.column_capacity, 64);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DocOptions {
    pub key: KeyKind,
    pub root: RootKind,
    /// Derivation of the root container.
    pub derivation: Derivation,
    /// Free bytes reserved inside a newly opened array, including the root.
    pub array_capacity: usize,
    /// Free bytes reserved inside a newly opened object, including the root.
    pub object_capacity: usize,
    /// Slots allocated for a newly opened column.
    pub column_capacity: u64,
    /// Initial allocation of the backing block, in bytes.
    pub initial_block_capacity: usize,
    /// Decimals used when floats are rendered as text.
    pub float_precision: usize,
}

impl Default for DocOptions {
    fn default() -> Self {
        let reservation = Reservation::default();
        DocOptions {
            key: KeyKind::None,
            root: RootKind::Array,
            derivation: Derivation::UnsortedMultiset,
            array_capacity: reservation.array,
            object_capacity: reservation.object,
            column_capacity: reservation.column,
            initial_block_capacity: 1024,
            float_precision: 2,
        }
    }
}

impl DocOptions {
    /// Creates default options: no key, unsorted-multiset array root, the
    /// default reservations and two float decimals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that reserve no free space anywhere, so every insert
    /// lands tightly packed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colbin::DocOptions;
    ///
    /// let options = DocOptions::compact();
    /// assert_eq!(options.array_capacity, 0);
    /// assert_eq!(options.column_capacity, 0);
    /// ```
    #[must_use]
    pub fn compact() -> Self {
        let reservation = Reservation::none();
        DocOptions {
            array_capacity: reservation.array,
            object_capacity: reservation.object,
            column_capacity: reservation.column,
            initial_block_capacity: 64,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: KeyKind) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: RootKind) -> Self {
        self.root = root;
        self
    }

    #[must_use]
    pub fn with_derivation(mut self, derivation: Derivation) -> Self {
        self.derivation = derivation;
        self
    }

    #[must_use]
    pub fn with_array_capacity(mut self, bytes: usize) -> Self {
        self.array_capacity = bytes;
        self
    }

    #[must_use]
    pub fn with_object_capacity(mut self, bytes: usize) -> Self {
        self.object_capacity = bytes;
        self
    }

    #[must_use]
    pub fn with_column_capacity(mut self, slots: u64) -> Self {
        self.column_capacity = slots;
        self
    }

    #[must_use]
    pub fn with_initial_block_capacity(mut self, bytes: usize) -> Self {
        self.initial_block_capacity = bytes;
        self
    }

    /// Sets the number of decimals used when floats are rendered as text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colbin::{colbin, DocOptions, Document};
    ///
    /// let doc = Document::from_value(&colbin!([0.125f32]), DocOptions::new().with_float_precision(3)).unwrap();
    /// assert_eq!(doc.to_json().unwrap(), "[0.125]");
    /// ```
    #[must_use]
    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }

    /// The free space the insertion engine reserves under these options.
    #[must_use]
    pub fn reservation(&self) -> Reservation {
        Reservation {
            array: self.array_capacity,
            object: self.object_capacity,
            column: self.column_capacity,
        }
    }
}
