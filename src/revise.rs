//! Revisions: bounded mutation sessions over a document.
//!
//! A [`Revision`] borrows its source document read-only and edits an owned
//! copy. Nothing reaches the source: [`Revision::commit`] hands back the
//! edited copy stamped with the next commit hash, [`Revision::abort`] drops
//! it.
//!
//! Updates go through the path evaluator. A fixed-width value replacing one
//! of the same encoded kind is rewritten in place; any other replacement
//! removes the old field by its exact span and inserts the new one at the
//! same position, shifting the rest of the document. Column slots take only
//! the column's element type or null.
//!
//! ## Examples
//!
//! ```rust
//! use colbin::{colbin, DocOptions, Document};
//!
//! let doc = Document::from_value(&colbin!({"count": 1u8, "tags": ["a"]}), DocOptions::new()).unwrap();
//!
//! let mut rev = doc.revise();
//! assert!(rev.set("count", 300u16).unwrap());
//! assert!(rev.remove("tags.0").unwrap());
//! assert!(!rev.set("missing", 1u8).unwrap());
//! let next = rev.commit().unwrap();
//!
//! assert_eq!(next.to_json().unwrap(), r#"{"count": 300, "tags": []}"#);
//! assert_eq!(next.commit_hash().unwrap(), doc.commit_hash().unwrap() + 1);
//! assert_eq!(doc.find("count").unwrap().as_u64(), Some(1));
//! ```

use crate::field::{ColumnType, Scalar};
use crate::find::Find;
use crate::insert::Inserter;
use crate::options::KeyKind;
use crate::path::{DotPath, PathEvaluation};
use crate::{Document, Error, Result};
use tracing::debug;

/// A mutable copy of a document, committed or aborted as a whole.
pub struct Revision<'s> {
    source: &'s Document,
    target: Document,
}

impl<'s> Revision<'s> {
    pub(crate) fn new(source: &'s Document) -> Self {
        Revision {
            source,
            target: source.clone(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &Document {
        self.source
    }

    /// The document as edited so far.
    #[must_use]
    pub fn target(&self) -> &Document {
        &self.target
    }

    fn resolve(&mut self, path: &str) -> Result<PathEvaluation<'_>> {
        let path = DotPath::parse(path)?;
        path.evaluate(self.target.root_mut()?)
    }

    /// Replaces the field at `path` with a fixed-width value. Returns `false`
    /// when the path does not resolve.
    pub fn set(&mut self, path: &str, value: impl Into<Scalar>) -> Result<bool> {
        let value = value.into();
        let mut eval = self.resolve(path)?;
        match eval.target_mut() {
            Some(target) => {
                target.set(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_string(&mut self, _path: &str, _value: &str) -> Result<bool> {
        Err(Error::not_implemented("string update"))
    }

    pub fn set_binary(&mut self, _path: &str, _data: &[u8], _ext: &str) -> Result<bool> {
        Err(Error::not_implemented("binary update"))
    }

    pub fn set_array(&mut self, _path: &str) -> Result<bool> {
        Err(Error::not_implemented("array update"))
    }

    pub fn set_object(&mut self, _path: &str) -> Result<bool> {
        Err(Error::not_implemented("object update"))
    }

    pub fn set_column(&mut self, _path: &str, _ty: ColumnType) -> Result<bool> {
        Err(Error::not_implemented("column update"))
    }

    /// Removes the element, property or column slot at `path`. Returns
    /// `false` when the path does not resolve.
    pub fn remove(&mut self, path: &str) -> Result<bool> {
        let mut eval = self.resolve(path)?;
        match eval.target_mut() {
            Some(target) => {
                target.remove()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// An inserter appending to the root of the target.
    pub fn inserter(&mut self) -> Result<Inserter<'_>> {
        self.target.inserter()
    }

    /// Looks up `path` in the target, edits included.
    pub fn find(&self, path: &str) -> Result<Find> {
        self.target.find(path)
    }

    pub fn set_key(&mut self, key: KeyKind) -> Result<()> {
        self.target.set_key(&key)
    }

    /// Drops every reserved byte of the target.
    pub fn shrink(&mut self) -> Result<()> {
        self.target.shrink()
    }

    /// Finishes the revision and returns the edited document, its commit
    /// hash one above the source's.
    pub fn commit(mut self) -> Result<Document> {
        let hash = self.source.commit_hash()?.wrapping_add(1);
        self.target.set_commit_hash(hash)?;
        debug!(
            target: "colbin::revise",
            hash,
            len = self.target.len(),
            "revision committed"
        );
        Ok(self.target)
    }

    /// Discards every edit.
    pub fn abort(self) {
        debug!(target: "colbin::revise", len = self.target.len(), "revision aborted");
    }
}
