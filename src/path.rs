//! Dot-path parsing and evaluation.
//!
//! A path such as `"users.0.name"` is a sequence of segments separated by
//! dots. A segment made only of ASCII digits is an index, anything else is a
//! key. Evaluation starts at the root container and takes one segment per
//! level:
//!
//! - an object looks the segment up by key, first match in document order
//!   (an index segment is looked up by its decimal text)
//! - an array selects the n-th live element
//! - a column selects the n-th slot directly
//!
//! A nested container continues with the next segment; a scalar has to be the
//! last one. A path that does not resolve is a normal outcome reported through
//! [`PathStatus`], distinct from the [`Error::PathParse`] raised for a
//! malformed path.
//!
//! ## Examples
//!
//! ```rust
//! use colbin::{colbin, DocOptions, Document, DotPath, PathStatus};
//!
//! let doc = Document::from_value(&colbin!({"a": [10u8, {"b": true}]}), DocOptions::new()).unwrap();
//!
//! let path: DotPath = "a.1.b".parse().unwrap();
//! let eval = path.evaluate(doc.root().unwrap()).unwrap();
//! assert!(eval.has_result());
//!
//! let eval = "a.0.b".parse::<DotPath>().unwrap().evaluate(doc.root().unwrap()).unwrap();
//! assert_eq!(eval.status(), PathStatus::NotTraversable);
//! ```

use crate::array::ArrayIter;
use crate::column::ColumnIter;
use crate::document::Root;
use crate::field::{FieldType, Scalar};
use crate::object::ObjectIter;
use crate::{Error, Result, Value};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// One component of a [`DotPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(u64),
}

impl PathSegment {
    /// The segment as an object key.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A parsed dot-path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DotPath {
    segments: Vec<PathSegment>,
}

impl DotPath {
    pub fn parse(path: &str) -> Result<Self> {
        path.parse()
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walks the path from `root`.
    pub fn evaluate<'a>(&self, root: Root<'a>) -> Result<PathEvaluation<'a>> {
        evaluate(root, self)
    }
}

impl FromStr for DotPath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::path_parse(path, "empty path"));
        }
        let segments = path
            .split('.')
            .enumerate()
            .map(|(i, segment)| {
                if segment.is_empty() {
                    return Err(Error::path_parse(
                        path,
                        &format!("empty segment at position {}", i),
                    ));
                }
                let numeric = segment.bytes().all(|b| b.is_ascii_digit());
                Ok(match segment.parse::<u64>() {
                    Ok(index) if numeric => PathSegment::Index(index),
                    _ => PathSegment::Key(segment.to_string()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DotPath { segments })
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Outcome of a path evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathStatus {
    Resolved,
    /// An object has no property with the segment's key.
    NoSuchKey,
    /// An array or column is shorter than the segment's index.
    NoSuchIndex,
    /// A scalar was reached before the last segment.
    NotTraversable,
    /// A key segment was applied to an array or column.
    SegmentMismatch,
}

/// A resolved path: the iterator of the container holding the target,
/// positioned on it.
pub enum PathTarget<'a> {
    Array(ArrayIter<'a>),
    Object(ObjectIter<'a>),
    /// A column and the index of the addressed slot.
    Column(ColumnIter<'a>, u64),
}

impl<'a> PathTarget<'a> {
    pub fn field_type(&self) -> Result<FieldType> {
        match self {
            PathTarget::Array(it) => it.current_field_type(),
            PathTarget::Object(it) => it.current_field_type(),
            PathTarget::Column(it, _) => it.current_field_type(),
        }
    }

    /// Decodes the target, including nested containers.
    pub fn value(&self) -> Result<Value> {
        match self {
            PathTarget::Array(it) => it.current_value(),
            PathTarget::Object(it) => it.current_value(),
            PathTarget::Column(it, _) => it.current_value(),
        }
    }

    pub fn scalar(&self) -> Result<Scalar> {
        match self {
            PathTarget::Array(it) => it.scalar(),
            PathTarget::Object(it) => it.scalar(),
            PathTarget::Column(it, _) => it.scalar(),
        }
    }

    /// Replaces the target with a fixed-width value.
    pub fn set(&mut self, value: impl Into<Scalar>) -> Result<()> {
        match self {
            PathTarget::Array(it) => it.set_current(value),
            PathTarget::Object(it) => it.set_current(value),
            PathTarget::Column(it, index) => it.set(*index, value),
        }
    }

    /// Removes the target: an element, a property or a column slot.
    pub fn remove(&mut self) -> Result<()> {
        match self {
            PathTarget::Array(it) => it.remove(),
            PathTarget::Object(it) => it.remove(),
            PathTarget::Column(it, index) => it.remove_at(*index),
        }
    }

    fn descend(self) -> Result<Option<Node<'a>>> {
        let ty = self.field_type()?;
        if !ty.is_traversable() {
            return Ok(None);
        }
        let node = match (self, ty) {
            (PathTarget::Array(it), FieldType::Array(_)) => Node::Array(it.into_array()?),
            (PathTarget::Array(it), FieldType::Object(_)) => Node::Object(it.into_object()?),
            (PathTarget::Array(it), FieldType::Column(..)) => Node::Column(it.into_column()?),
            (PathTarget::Object(it), FieldType::Array(_)) => Node::Array(it.into_array()?),
            (PathTarget::Object(it), FieldType::Object(_)) => Node::Object(it.into_object()?),
            (PathTarget::Object(it), FieldType::Column(..)) => Node::Column(it.into_column()?),
            _ => return Ok(None),
        };
        Ok(Some(node))
    }
}

/// Result of [`DotPath::evaluate`]. Check [`PathEvaluation::has_result`]
/// before taking the target.
pub struct PathEvaluation<'a> {
    status: PathStatus,
    target: Option<PathTarget<'a>>,
}

impl<'a> PathEvaluation<'a> {
    fn resolved(target: PathTarget<'a>) -> Self {
        PathEvaluation {
            status: PathStatus::Resolved,
            target: Some(target),
        }
    }

    fn unresolved(status: PathStatus) -> Self {
        PathEvaluation {
            status,
            target: None,
        }
    }

    #[must_use]
    pub fn has_result(&self) -> bool {
        self.target.is_some()
    }

    #[must_use]
    pub fn status(&self) -> PathStatus {
        self.status
    }

    #[must_use]
    pub fn target(&self) -> Option<&PathTarget<'a>> {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> Option<&mut PathTarget<'a>> {
        self.target.as_mut()
    }

    #[must_use]
    pub fn into_target(self) -> Option<PathTarget<'a>> {
        self.target
    }
}

enum Node<'a> {
    Array(ArrayIter<'a>),
    Object(ObjectIter<'a>),
    Column(ColumnIter<'a>),
}

impl<'a> From<Root<'a>> for Node<'a> {
    fn from(root: Root<'a>) -> Self {
        match root {
            Root::Array(it) => Node::Array(it),
            Root::Object(it) => Node::Object(it),
        }
    }
}

/// Walks `path` from `root`.
pub fn evaluate<'a>(root: Root<'a>, path: &DotPath) -> Result<PathEvaluation<'a>> {
    let mut node = Node::from(root);
    let last = path.len().saturating_sub(1);
    for (depth, segment) in path.segments().iter().enumerate() {
        let target = match (node, segment) {
            (Node::Array(mut it), PathSegment::Index(index)) => {
                let mut found = true;
                for _ in 0..=*index {
                    if !it.next()? {
                        found = false;
                        break;
                    }
                }
                if !found {
                    return Ok(PathEvaluation::unresolved(PathStatus::NoSuchIndex));
                }
                PathTarget::Array(it)
            }
            (Node::Object(mut it), segment) => {
                if !it.seek_key(&segment.key())? {
                    return Ok(PathEvaluation::unresolved(PathStatus::NoSuchKey));
                }
                PathTarget::Object(it)
            }
            (Node::Column(mut it), PathSegment::Index(index)) => {
                if !it.seek_index(*index)? {
                    return Ok(PathEvaluation::unresolved(PathStatus::NoSuchIndex));
                }
                PathTarget::Column(it, *index)
            }
            (Node::Array(_) | Node::Column(_), PathSegment::Key(_)) => {
                return Ok(PathEvaluation::unresolved(PathStatus::SegmentMismatch));
            }
        };
        if depth == last {
            return Ok(PathEvaluation::resolved(target));
        }
        node = match target.descend()? {
            Some(node) => node,
            None => {
                trace!(target: "colbin::path", %path, depth, "scalar before last segment");
                return Ok(PathEvaluation::unresolved(PathStatus::NotTraversable));
            }
        };
    }
    Err(Error::path_parse(&path.to_string(), "empty path"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{colbin, DocOptions, Document};

    fn doc() -> Document {
        let value = colbin!({
            "a": {"b": [1u8, 2u8, {"c": "deep"}]},
            "7": "numeric key",
            "n": null
        });
        Document::from_value(&value, DocOptions::new()).unwrap()
    }

    fn status(doc: &Document, path: &str) -> PathStatus {
        DotPath::parse(path)
            .unwrap()
            .evaluate(doc.root().unwrap())
            .unwrap()
            .status()
    }

    #[test]
    fn test_parse_segments() {
        let path = DotPath::parse("a.0.b12.007").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("a".into()),
                PathSegment::Index(0),
                PathSegment::Key("b12".into()),
                PathSegment::Index(7),
            ]
        );
        assert_eq!(path.to_string(), "a.0.b12.7");
        let huge = DotPath::parse("99999999999999999999999").unwrap();
        assert!(matches!(huge.segments()[0], PathSegment::Key(_)));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "a..b", ".a", "a."] {
            assert!(
                matches!(DotPath::parse(bad), Err(Error::PathParse { .. })),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_resolution() {
        let doc = doc();
        let eval = DotPath::parse("a.b.2.c")
            .unwrap()
            .evaluate(doc.root().unwrap())
            .unwrap();
        assert!(eval.has_result());
        assert_eq!(
            eval.target().unwrap().value().unwrap(),
            Value::from("deep")
        );
        assert_eq!(status(&doc, "7"), PathStatus::Resolved);
        assert_eq!(status(&doc, "n"), PathStatus::Resolved);
        assert_eq!(status(&doc, "a.b"), PathStatus::Resolved);
    }

    #[test]
    fn test_failures_are_not_errors() {
        let doc = doc();
        assert_eq!(status(&doc, "zzz"), PathStatus::NoSuchKey);
        assert_eq!(status(&doc, "a.b.3"), PathStatus::NoSuchIndex);
        assert_eq!(status(&doc, "a.b.0.x"), PathStatus::NotTraversable);
        assert_eq!(status(&doc, "n.x"), PathStatus::NotTraversable);
        assert_eq!(status(&doc, "a.b.c"), PathStatus::SegmentMismatch);
    }

    #[test]
    fn test_column_slot() {
        let mut doc = Document::new();
        {
            let mut ins = doc.inserter().unwrap();
            ins.begin_column(crate::ColumnType::U16, crate::Derivation::SortedSet)
                .unwrap();
            ins.insert(4u16).unwrap();
            ins.insert(None::<u16>).unwrap();
            ins.end_column().unwrap();
            ins.finish().unwrap();
        }
        let eval = DotPath::parse("0.1").unwrap().evaluate(doc.root().unwrap()).unwrap();
        match eval.into_target() {
            Some(PathTarget::Column(it, index)) => {
                assert_eq!(index, 1);
                assert_eq!(it.scalar().unwrap(), Scalar::Null);
            }
            _ => panic!("expected a column slot"),
        }
        assert_eq!(status(&doc, "0.2"), PathStatus::NoSuchIndex);
        assert_eq!(status(&doc, "0.1.0"), PathStatus::NotTraversable);
    }
}
