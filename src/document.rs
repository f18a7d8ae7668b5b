//! Documents: a head followed by one root container, in an owned block.
//!
//! ```text
//! [key marker][key payload][commit hash: u64 LE][root array or object]
//! ```
//!
//! The key identifies the record, the commit hash counts committed
//! revisions. Everything after the head is the root container; the root may
//! carry reserved free space that [`Document::shrink`] removes.
//!
//! ## Examples
//!
//! ```rust
//! use colbin::{Derivation, Document};
//!
//! let mut doc = Document::new();
//! {
//!     let mut ins = doc.inserter().unwrap();
//!     ins.insert(1u8).unwrap();
//!     ins.begin_object(Derivation::default()).unwrap();
//!     ins.insert_prop_string("name", "colbin").unwrap();
//!     ins.end_object().unwrap();
//!     ins.finish().unwrap();
//! }
//! assert_eq!(doc.to_json().unwrap(), r#"[1, {"name": "colbin"}]"#);
//!
//! let json = doc.to_json().unwrap();
//! doc.shrink().unwrap();
//! assert_eq!(doc.to_json().unwrap(), json);
//! ```

use crate::array::ArrayIter;
use crate::block::Block;
use crate::codec;
use crate::field::{marker, FieldType};
use crate::find::Find;
use crate::insert::{Frame, Inserter};
use crate::memfile::{AccessMode, MemFile};
use crate::object::ObjectIter;
use crate::options::{DocOptions, KeyKind, RootKind};
use crate::revise::Revision;
use crate::{Error, Result, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Head marker bytes, one per key kind.
pub mod key_marker {
    pub const NONE: u8 = b'?';
    pub const AUTO: u8 = b'*';
    pub const UNSIGNED: u8 = b'+';
    pub const SIGNED: u8 = b'-';
    pub const STRING: u8 = b'!';
}

const COMMIT_HASH_LEN: u64 = 8;

static NEXT_AUTO_KEY: AtomicU64 = AtomicU64::new(1);

/// Record key stored in a document head.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DocKey {
    None,
    /// A value drawn from the process-wide counter.
    Auto(u64),
    Unsigned(u64),
    Signed(i64),
    String(String),
}

impl DocKey {
    /// Resolves a requested key kind, drawing auto keys from the counter.
    fn assign(kind: &KeyKind) -> Self {
        match kind {
            KeyKind::None => DocKey::None,
            KeyKind::Auto => DocKey::Auto(NEXT_AUTO_KEY.fetch_add(1, Ordering::Relaxed)),
            KeyKind::Unsigned(v) => DocKey::Unsigned(*v),
            KeyKind::Signed(v) => DocKey::Signed(*v),
            KeyKind::String(s) => DocKey::String(s.clone()),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            DocKey::None => out.push(key_marker::NONE),
            DocKey::Auto(v) => {
                out.push(key_marker::AUTO);
                out.extend_from_slice(&v.to_le_bytes());
            }
            DocKey::Unsigned(v) => {
                out.push(key_marker::UNSIGNED);
                out.extend_from_slice(&v.to_le_bytes());
            }
            DocKey::Signed(v) => {
                out.push(key_marker::SIGNED);
                out.extend_from_slice(&v.to_le_bytes());
            }
            DocKey::String(s) => {
                out.push(key_marker::STRING);
                out.extend_from_slice(&crate::varuint::varuint_bytes(s.len() as u64));
                out.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Decodes the key at the start of `bytes`, returning it and the offset
    /// of the commit hash.
    fn decode(bytes: &[u8]) -> Result<(Self, u64)> {
        match codec::byte_at(bytes, 0)? {
            key_marker::NONE => Ok((DocKey::None, 1)),
            key_marker::AUTO => Ok((DocKey::Auto(u64_at(bytes, 1)?), 9)),
            key_marker::UNSIGNED => Ok((DocKey::Unsigned(u64_at(bytes, 1)?), 9)),
            key_marker::SIGNED => Ok((DocKey::Signed(u64_at(bytes, 1)? as i64), 9)),
            key_marker::STRING => {
                let (s, end) = codec::read_str(bytes, 1)?;
                Ok((DocKey::String(s.to_string()), end))
            }
            other => Err(Error::corrupted(0, other)),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocKey::None => f.write_str("(none)"),
            DocKey::Auto(v) | DocKey::Unsigned(v) => write!(f, "{}", v),
            DocKey::Signed(v) => write!(f, "{}", v),
            DocKey::String(s) => f.write_str(s),
        }
    }
}

fn u64_at(bytes: &[u8], offset: u64) -> Result<u64> {
    let start = offset as usize;
    bytes
        .get(start..start + COMMIT_HASH_LEN as usize)
        .and_then(|s| s.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| Error::out_of_bounds(offset, COMMIT_HASH_LEN, bytes.len() as u64))
}

/// Iterator over a document's root container.
pub enum Root<'a> {
    Array(ArrayIter<'a>),
    Object(ObjectIter<'a>),
}

impl<'a> Root<'a> {
    fn open(file: MemFile<'a>) -> Result<Self> {
        match codec::field_type_at(file.bytes(), file.tell())? {
            FieldType::Array(_) => ArrayIter::open(file).map(Root::Array),
            FieldType::Object(_) => ObjectIter::open(file).map(Root::Object),
            other => Err(Error::type_mismatch("array or object root", other)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> RootKind {
        match self {
            Root::Array(_) => RootKind::Array,
            Root::Object(_) => RootKind::Object,
        }
    }
}

/// A self-describing binary document that owns its bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    block: Block,
    options: DocOptions,
    /// Offset of the root container's begin marker.
    root: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with default options: no key, empty array root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DocOptions::default())
    }

    #[must_use]
    pub fn with_options(options: DocOptions) -> Self {
        let mut bytes = Vec::with_capacity(options.initial_block_capacity);
        DocKey::assign(&options.key).encode(&mut bytes);
        bytes.extend_from_slice(&0u64.to_le_bytes());
        let root = bytes.len() as u64;
        let (begin, reserve, end) = match options.root {
            RootKind::Array => (
                FieldType::Array(options.derivation),
                options.array_capacity,
                marker::END_ARRAY,
            ),
            RootKind::Object => (
                FieldType::Object(options.derivation),
                options.object_capacity,
                marker::END_OBJECT,
            ),
        };
        bytes.push(begin.marker());
        bytes.resize(bytes.len() + reserve, marker::FREE);
        bytes.push(end);
        let mut block = Block::from_bytes(bytes);
        block.reserve_to(options.initial_block_capacity);
        Document {
            block,
            options,
            root,
        }
    }

    /// Opens encoded bytes. The head, the root marker and the extent of the
    /// root container are validated.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (_, hash_offset) = DocKey::decode(&bytes)?;
        u64_at(&bytes, hash_offset)?;
        let root = hash_offset + COMMIT_HASH_LEN;
        match codec::field_type_at(&bytes, root)? {
            FieldType::Array(_) | FieldType::Object(_) => {}
            _ => return Err(Error::corrupted(root, codec::byte_at(&bytes, root)?)),
        }
        let end = codec::field_end(&bytes, root)?;
        if end != bytes.len() as u64 {
            return Err(Error::corrupted(end, codec::byte_at(&bytes, end)?));
        }
        let mut doc = Document {
            block: Block::from_bytes(bytes),
            options: DocOptions::default(),
            root,
        };
        doc.options.root = doc.root_kind();
        Ok(doc)
    }

    /// Builds a document holding `value`. An array or object becomes the
    /// root, with its own derivation; any other value becomes the single
    /// element of an array root.
    pub fn from_value(value: &Value, options: DocOptions) -> Result<Self> {
        let (root, derivation) = match value {
            Value::Array { derivation, .. } => (RootKind::Array, *derivation),
            Value::Object { derivation, .. } => (RootKind::Object, *derivation),
            _ => (RootKind::Array, options.derivation),
        };
        let mut doc = Document::with_options(DocOptions {
            root,
            derivation,
            ..options
        });
        {
            let mut ins = doc.inserter()?;
            match value {
                Value::Array { items, .. } => {
                    for item in items {
                        write_value(&mut ins, None, item)?;
                    }
                }
                Value::Object { map, .. } => {
                    for (key, item) in map.iter() {
                        write_value(&mut ins, Some(key), item)?;
                    }
                }
                other => write_value(&mut ins, None, other)?,
            }
            ins.finish()?;
        }
        Ok(doc)
    }

    #[must_use]
    pub fn options(&self) -> &DocOptions {
        &self.options
    }

    #[must_use]
    pub fn block(&self) -> &Block {
        &self.block
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.block.as_bytes()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.block.into_bytes()
    }

    /// Encoded length in bytes, head included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.block.used()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block.used() == 0
    }

    pub fn key(&self) -> Result<DocKey> {
        Ok(DocKey::decode(self.as_bytes())?.0)
    }

    fn hash_offset(&self) -> u64 {
        self.root - COMMIT_HASH_LEN
    }

    /// Number of revisions committed on top of the original document.
    pub fn commit_hash(&self) -> Result<u64> {
        u64_at(self.as_bytes(), self.hash_offset())
    }

    #[must_use]
    pub fn root_offset(&self) -> u64 {
        self.root
    }

    #[must_use]
    pub fn root_kind(&self) -> RootKind {
        match codec::field_type_at(self.as_bytes(), self.root) {
            Ok(FieldType::Object(_)) => RootKind::Object,
            _ => RootKind::Array,
        }
    }

    /// Read-only iterator over the root container.
    pub fn root(&self) -> Result<Root<'_>> {
        let mut file = MemFile::open(&self.block);
        file.seek(self.root)?;
        Root::open(file)
    }

    /// Read-write iterator over the root container.
    pub fn root_mut(&mut self) -> Result<Root<'_>> {
        let mut file = MemFile::open_mut(&mut self.block, AccessMode::ReadWrite);
        file.seek(self.root)?;
        Root::open(file)
    }

    /// An inserter appending after the last element of the root.
    pub fn inserter(&mut self) -> Result<Inserter<'_>> {
        let object = self.root_kind() == RootKind::Object;
        let append_at = codec::items_end(self.as_bytes(), self.root, object)?.last_live_end;
        let frame = if object {
            Frame::Object { begin: self.root }
        } else {
            Frame::Array { begin: self.root }
        };
        let reservation = self.options.reservation();
        let mut file = MemFile::open_mut(&mut self.block, AccessMode::ReadWrite);
        file.seek(append_at)?;
        Ok(Inserter::new(file, frame).with_reservation(reservation))
    }

    /// Looks up `path`. A path that does not resolve is a `Find` without
    /// result; only a malformed path is an error.
    pub fn find(&self, path: &str) -> Result<Find> {
        Find::run(self, path)
    }

    /// Starts a revision: a mutable copy of this document.
    #[must_use]
    pub fn revise(&self) -> Revision<'_> {
        Revision::new(self)
    }

    /// Removes every reserved byte: free space in arrays and objects and
    /// unused column slots.
    pub fn shrink(&mut self) -> Result<()> {
        let bytes = self.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        out.extend_from_slice(&bytes[..self.root as usize]);
        codec::compact_field(bytes, self.root, &mut out)?;
        debug!(
            target: "colbin::document",
            from = bytes.len(),
            to = out.len(),
            "shrink"
        );
        self.block = Block::from_bytes(out);
        Ok(())
    }

    /// Decodes the root container.
    pub fn to_value(&self) -> Result<Value> {
        Ok(codec::decode_value(self.as_bytes(), self.root)?.0)
    }

    /// Renders the root container as JSON-like text.
    pub fn to_json(&self) -> Result<String> {
        Ok(self.to_value()?.render(self.options.float_precision))
    }

    /// Replaces the record key, shifting the rest of the document when the
    /// encoded key changes size.
    pub(crate) fn set_key(&mut self, key: &KeyKind) -> Result<()> {
        let mut encoded = Vec::new();
        DocKey::assign(key).encode(&mut encoded);
        let old_len = self.hash_offset();
        let new_len = encoded.len() as u64;
        let mut file = MemFile::open_mut(&mut self.block, AccessMode::ReadWrite);
        if new_len > old_len {
            file.inplace_insert(new_len - old_len)?;
        } else if new_len < old_len {
            file.inplace_remove(old_len - new_len)?;
        }
        file.write(&encoded)?;
        self.root = new_len + COMMIT_HASH_LEN;
        self.options.key = key.clone();
        trace!(target: "colbin::document", old_len, new_len, "key replaced");
        Ok(())
    }

    pub(crate) fn set_commit_hash(&mut self, hash: u64) -> Result<()> {
        let offset = self.hash_offset();
        let mut file = MemFile::open_mut(&mut self.block, AccessMode::ReadWrite);
        file.seek(offset)?;
        file.write(&hash.to_le_bytes())
    }
}

/// Writes `value` through the inserter, opening nested containers with the
/// inserter's reservation.
fn write_value(ins: &mut Inserter<'_>, key: Option<&str>, value: &Value) -> Result<()> {
    match value {
        Value::Array { items, derivation } => {
            match key {
                Some(key) => ins.begin_prop_array(key, *derivation)?,
                None => ins.begin_array(*derivation)?,
            }
            for item in items {
                write_value(ins, None, item)?;
            }
            ins.end_array()
        }
        Value::Object { map, derivation } => {
            match key {
                Some(key) => ins.begin_prop_object(key, *derivation)?,
                None => ins.begin_object(*derivation)?,
            }
            for (k, item) in map.iter() {
                write_value(ins, Some(k), item)?;
            }
            ins.end_object()
        }
        Value::Column {
            ty,
            items,
            derivation,
        } => {
            match key {
                Some(key) => ins.begin_prop_column(key, *ty, *derivation)?,
                None => ins.begin_column(*ty, *derivation)?,
            }
            for item in items {
                ins.insert(*item)?;
            }
            ins.end_column()
        }
        leaf => match key {
            Some(key) => ins.insert_prop_value(key, leaf),
            None => ins.insert_value(leaf),
        },
    }
}
