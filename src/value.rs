//! Owned, dynamically typed mirror of a decoded document.
//!
//! [`Value`] holds everything a document can encode: scalars, strings,
//! binary blobs and the three container kinds together with their
//! [`Derivation`]. It is what [`crate::Document::to_value`] decodes into and
//! what [`crate::Inserter::insert_value`] encodes from.
//!
//! ## Creating Values
//!
//! ```rust
//! use colbin::{colbin, Value};
//!
//! let null = Value::Null;
//! let flag = Value::from(true);
//! let small = Value::from(7u8);
//! let text = Value::from("hello");
//!
//! let obj = colbin!({
//!     "name": "Alice",
//!     "scores": [1, 2, 3]
//! });
//! assert!(obj.is_object());
//! ```
//!
//! ## Text Rendering
//!
//! `Display` renders a JSON-like text: floats with two decimals, non-finite
//! floats and column sentinels as `null`, binary blobs as base64 objects.
//!
//! ```rust
//! use colbin::Value;
//!
//! let value = Value::array(vec![Value::from(1u8), Value::from(-42i64), Value::from(23.0f32)]);
//! assert_eq!(value.to_string(), "[1, -42, 23.00]");
//! ```

use crate::field::{ColumnType, Derivation, FieldType, Number, Scalar};
use crate::{mime, DocMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use std::fmt::{self, Write as _};

/// Media type of a binary field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryKind {
    /// Id into the [`crate::mime`] table.
    Mime(u64),
    /// Application-defined type name.
    Custom(String),
}

/// A binary blob with its media type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Binary {
    pub kind: BinaryKind,
    pub data: Vec<u8>,
}

impl Binary {
    /// A blob typed by file extension; unknown extensions become
    /// `application/octet-stream`.
    #[must_use]
    pub fn with_extension(data: impl Into<Vec<u8>>, ext: &str) -> Self {
        Binary {
            kind: BinaryKind::Mime(mime::id_for_extension(ext)),
            data: data.into(),
        }
    }

    #[must_use]
    pub fn custom(data: impl Into<Vec<u8>>, type_name: impl Into<String>) -> Self {
        Binary {
            kind: BinaryKind::Custom(type_name.into()),
            data: data.into(),
        }
    }

    /// The media type name, or the custom type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match &self.kind {
            BinaryKind::Mime(id) => mime::name(*id).unwrap_or("application/octet-stream"),
            BinaryKind::Custom(name) => name,
        }
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self.kind {
            BinaryKind::Mime(_) => FieldType::Binary,
            BinaryKind::Custom(_) => FieldType::CustomBinary,
        }
    }
}

/// Any value a document can hold.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Binary(Binary),
    Array {
        items: Vec<Value>,
        derivation: Derivation,
    },
    Object {
        map: DocMap,
        derivation: Derivation,
    },
    /// Homogeneous column; [`Scalar::Null`] entries are stored as the
    /// element type's sentinel.
    Column {
        ty: ColumnType,
        items: Vec<Scalar>,
        derivation: Derivation,
    },
}

impl Value {
    /// An unsorted-multiset array.
    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array {
            items,
            derivation: Derivation::default(),
        }
    }

    /// An unsorted multimap object.
    #[must_use]
    pub fn object(map: DocMap) -> Self {
        Value::Object {
            map,
            derivation: Derivation::default(),
        }
    }

    /// An unsorted-multiset column.
    #[must_use]
    pub fn column(ty: ColumnType, items: Vec<Scalar>) -> Self {
        Value::Column {
            ty,
            items,
            derivation: Derivation::default(),
        }
    }

    /// Encoded field type of this value.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Null => FieldType::Null,
            Value::Bool(true) => FieldType::True,
            Value::Bool(false) => FieldType::False,
            Value::Number(n) => n.field_type(),
            Value::String(_) => FieldType::String,
            Value::Binary(b) => b.field_type(),
            Value::Array { derivation, .. } => FieldType::Array(*derivation),
            Value::Object { derivation, .. } => FieldType::Object(*derivation),
            Value::Column { ty, derivation, .. } => FieldType::Column(*ty, *derivation),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array { .. })
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object { .. })
    }

    #[inline]
    #[must_use]
    pub const fn is_column(&self) -> bool {
        matches!(self, Value::Column { .. })
    }

    /// `true` for arrays, objects and columns.
    #[inline]
    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.is_array() || self.is_object() || self.is_column()
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Non-negative integers of any width.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    /// Integers of any width that fit in `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    /// Any number, widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&DocMap> {
        match self {
            Value::Object { map, .. } => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_column(&self) -> Option<(ColumnType, &[Scalar])> {
        match self {
            Value::Column { ty, items, .. } => Some((*ty, items)),
            _ => None,
        }
    }

    /// The value as a fixed-width scalar, if it is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(*n)),
            _ => None,
        }
    }

    /// Container derivation, if this is a container.
    #[must_use]
    pub fn derivation(&self) -> Option<Derivation> {
        match self {
            Value::Array { derivation, .. }
            | Value::Object { derivation, .. }
            | Value::Column { derivation, .. } => Some(*derivation),
            _ => None,
        }
    }

    /// Renders the value as JSON-like text with `precision` float decimals.
    #[must_use]
    pub fn render(&self, precision: usize) -> String {
        let mut out = String::new();
        self.write_text(&mut out, precision);
        out
    }

    fn write_text(&self, out: &mut String, precision: usize) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&n.render(precision)),
            Value::String(s) => write_quoted(out, s),
            Value::Binary(b) => {
                out.push_str("{\"type\": ");
                write_quoted(out, b.type_name());
                out.push_str(", \"encoding\": \"base64\", \"binary-string\": ");
                write_quoted(out, &BASE64.encode(&b.data));
                out.push('}');
            }
            Value::Array { items, .. } => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_text(out, precision);
                }
                out.push(']');
            }
            Value::Object { map, .. } => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_quoted(out, key);
                    out.push_str(": ");
                    value.write_text(out, precision);
                }
                out.push('}');
            }
            Value::Column { items, .. } => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match item {
                        Scalar::Number(n) => out.push_str(&n.render(precision)),
                        other => out.push_str(&other.to_string()),
                    }
                }
                out.push(']');
            }
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(2))
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::U8(v) => serializer.serialize_u8(v),
            Number::U16(v) => serializer.serialize_u16(v),
            Number::U32(v) => serializer.serialize_u32(v),
            Number::U64(v) => serializer.serialize_u64(v),
            Number::I8(v) => serializer.serialize_i8(v),
            Number::I16(v) => serializer.serialize_i16(v),
            Number::I32(v) => serializer.serialize_i32(v),
            Number::I64(v) => serializer.serialize_i64(v),
            Number::Float(v) => serializer.serialize_f32(v),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(n) => n.serialize(serializer),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Binary(b) => serializer.serialize_bytes(&b.data),
            Value::Array { items, .. } => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object { map, .. } => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Column { items, .. } => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::type_mismatch("integer", value.field_type()))
    }
}

impl TryFrom<Value> for u64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_u64()
            .ok_or_else(|| crate::Error::type_mismatch("unsigned integer", value.field_type()))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::type_mismatch("number", value.field_type()))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| crate::Error::type_mismatch("boolean", value.field_type()))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(crate::Error::type_mismatch("string", other.field_type())),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
        }
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

value_from_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32);

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Binary> for Value {
    fn from(value: Binary) -> Self {
        Value::Binary(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<DocMap> for Value {
    fn from(value: DocMap) -> Self {
        Value::object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mixed_array() {
        let value = Value::array(vec![
            Value::from(1u8),
            Value::from(-42i64),
            Value::from(23.0f32),
        ]);
        assert_eq!(value.to_string(), "[1, -42, 23.00]");
        assert_eq!(value.render(1), "[1, -42, 23.0]");
    }

    #[test]
    fn test_render_object_and_strings() {
        let mut map = DocMap::new();
        map.insert("name", Value::from("a \"quoted\"\nline"));
        map.insert("ok", Value::Bool(true));
        assert_eq!(
            Value::object(map).to_string(),
            r#"{"name": "a \"quoted\"\nline", "ok": true}"#
        );
    }

    #[test]
    fn test_render_column_nulls() {
        let value = Value::column(
            ColumnType::U8,
            vec![Scalar::from(3u8), Scalar::Null, Scalar::from(5u8)],
        );
        assert_eq!(value.to_string(), "[3, null, 5]");
    }

    #[test]
    fn test_render_binary() {
        let value = Value::from(Binary::with_extension(b"hi".to_vec(), "txt"));
        assert_eq!(
            value.to_string(),
            r#"{"type": "text/plain", "encoding": "base64", "binary-string": "aGk="}"#
        );
    }

    #[test]
    fn test_non_finite_float_renders_null() {
        assert_eq!(Value::from(f32::INFINITY).to_string(), "null");
    }

    #[test]
    fn test_field_types() {
        assert_eq!(Value::from(true).field_type(), FieldType::True);
        assert_eq!(Value::from(7u16).field_type(), FieldType::U16);
        assert_eq!(
            Value::array(vec![]).field_type(),
            FieldType::Array(Derivation::UnsortedMultiset)
        );
        assert!(Value::array(vec![]).is_container());
        assert!(!Value::from("x").is_container());
        assert_eq!(
            Value::from(Binary::custom(vec![1], "my/type")).field_type(),
            FieldType::CustomBinary
        );
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(Value::from(42u8)).unwrap(), 42);
        assert_eq!(u64::try_from(Value::from(42i32)).unwrap(), 42);
        assert!(u64::try_from(Value::from(-1i32)).is_err());
        assert!(bool::try_from(Value::from(1u8)).is_err());
        assert_eq!(String::try_from(Value::from("s")).unwrap(), "s");
    }

    #[test]
    fn test_serialize_matches_json() {
        let value = Value::array(vec![Value::from(1u8), Value::Null, Value::from("x")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,null,"x"]"#);
    }
}
