//! Read-only lookups by dot-path.

use crate::field::{Derivation, FieldType};
use crate::path::{DotPath, PathStatus};
use crate::{Document, Error, Result, Value};

/// The outcome of [`Document::find`]: the resolved field's kind and an owned
/// copy of its value, or the reason nothing was found.
///
/// # Examples
///
/// ```rust
/// use colbin::{colbin, DocOptions, Document, FieldType};
///
/// let doc = Document::from_value(&colbin!({"id": 7u32, "tags": ["a", "b"]}), DocOptions::new()).unwrap();
///
/// let found = doc.find("id").unwrap();
/// assert_eq!(found.result_type(), Some(FieldType::U32));
/// assert_eq!(found.as_u64(), Some(7));
///
/// let tags = doc.find("tags").unwrap();
/// assert_eq!(tags.is_multiset(), Some(true));
/// assert_eq!(tags.to_json().as_deref(), Some(r#"["a", "b"]"#));
///
/// assert!(!doc.find("missing").unwrap().has_result());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Find {
    path: DotPath,
    status: PathStatus,
    result: Option<(FieldType, Value)>,
    precision: usize,
}

impl Find {
    pub(crate) fn run(doc: &Document, path: &str) -> Result<Self> {
        let path = DotPath::parse(path)?;
        let eval = path.evaluate(doc.root()?)?;
        let status = eval.status();
        let result = match eval.target() {
            Some(target) => Some((target.field_type()?, target.value()?)),
            None => None,
        };
        Ok(Find {
            path,
            status,
            result,
            precision: doc.options().float_precision,
        })
    }

    #[must_use]
    pub fn path(&self) -> &DotPath {
        &self.path
    }

    #[must_use]
    pub fn status(&self) -> PathStatus {
        self.status
    }

    #[must_use]
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Kind of the resolved field. Column slots report the kind of their
    /// value, `Null` for a sentinel.
    #[must_use]
    pub fn result_type(&self) -> Option<FieldType> {
        self.result.as_ref().map(|(ty, _)| *ty)
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref().map(|(_, value)| value)
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        self.result.map(|(_, value)| value)
    }

    /// The resolved value, or [`Error::NotFound`] when the path resolved to
    /// nothing.
    pub fn require(self) -> Result<Value> {
        match self.result {
            Some((_, value)) => Ok(value),
            None => Err(Error::not_found(&self.path.to_string())),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value().map_or(false, Value::is_null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value()?.as_bool()
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.value()?.as_u64()
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.value()?.as_i64()
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.value()?.as_f64()
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value()?.as_str()
    }

    fn derivation(&self) -> Option<Derivation> {
        self.result_type()?.derivation()
    }

    /// Whether the resolved container may hold duplicates. `None` when the
    /// result is not a container.
    #[must_use]
    pub fn is_multiset(&self) -> Option<bool> {
        self.derivation().map(Derivation::is_multiset)
    }

    #[must_use]
    pub fn is_sorted(&self) -> Option<bool> {
        self.derivation().map(Derivation::is_sorted)
    }

    /// Text rendering of the resolved value.
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        Some(self.value()?.render(self.precision))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        colbin, ColumnType, Derivation, DocOptions, Document, FieldType, PathStatus, Value,
    };

    #[test]
    fn test_scalar_results() {
        let doc = Document::from_value(
            &colbin!({"i": (-4i16), "f": 1.5f32, "s": "x", "b": false}),
            DocOptions::new(),
        )
        .unwrap();
        let found = doc.find("i").unwrap();
        assert_eq!(found.result_type(), Some(FieldType::I16));
        assert_eq!(found.as_i64(), Some(-4));
        assert_eq!(found.as_u64(), None);
        assert_eq!(found.is_sorted(), None);
        assert_eq!(doc.find("f").unwrap().as_f64(), Some(1.5));
        assert_eq!(doc.find("f").unwrap().to_json().as_deref(), Some("1.50"));
        assert_eq!(doc.find("s").unwrap().as_str(), Some("x"));
        assert_eq!(doc.find("b").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn test_container_facts() {
        let mut doc = Document::new();
        {
            let mut ins = doc.inserter().unwrap();
            ins.begin_column(ColumnType::U8, Derivation::SortedSet).unwrap();
            ins.insert(None::<u8>).unwrap();
            ins.end_column().unwrap();
            ins.finish().unwrap();
        }
        let column = doc.find("0").unwrap();
        assert_eq!(
            column.result_type(),
            Some(FieldType::Column(ColumnType::U8, Derivation::SortedSet))
        );
        assert_eq!(column.is_multiset(), Some(false));
        assert_eq!(column.is_sorted(), Some(true));

        let slot = doc.find("0.0").unwrap();
        assert_eq!(slot.result_type(), Some(FieldType::Null));
        assert!(slot.is_null());
    }

    #[test]
    fn test_missing_paths() {
        let doc = Document::from_value(&colbin!([1u8]), DocOptions::new()).unwrap();
        let found = doc.find("3").unwrap();
        assert!(!found.has_result());
        assert_eq!(found.status(), PathStatus::NoSuchIndex);
        assert_eq!(found.to_json(), None);
        assert!(found.require().unwrap_err().is_not_found());
        assert_eq!(doc.find("0").unwrap().require().unwrap(), Value::from(1u8));
        assert!(doc.find("a..b").is_err());
    }
}
