//! Ordered multimap for object values.
//!
//! Encoded objects are multimaps unless their derivation says otherwise, so
//! [`DocMap`] keeps every `(key, value)` pair in document order and allows
//! repeated keys. Lookups return the first match, which is the same rule the
//! path evaluator applies.
//!
//! ## Examples
//!
//! ```rust
//! use colbin::{DocMap, Value};
//!
//! let mut map = DocMap::new();
//! map.insert("tag", Value::from("a"));
//! map.insert("tag", Value::from("b"));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("tag").and_then(|v| v.as_str()), Some("a"));
//! assert_eq!(map.get_all("tag").count(), 2);
//! ```

use crate::Value;

/// Key/value pairs in document order, duplicates allowed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocMap(Vec<(String, Value)>);

impl DocMap {
    #[must_use]
    pub fn new() -> Self {
        DocMap(Vec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        DocMap(Vec::with_capacity(capacity))
    }

    /// Appends a pair. Existing pairs with the same key are kept.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.push((key.into(), value));
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in document order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes and returns the first value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for DocMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Value)> for DocMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        DocMap(iter.into_iter().collect())
    }
}

impl From<Vec<(String, Value)>> for DocMap {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        DocMap(pairs)
    }
}
