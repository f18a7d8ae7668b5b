//! Field kinds, marker bytes and fixed-width scalar values.
//!
//! Every encoded field starts with a one-byte marker. Scalars carry their
//! payload right after the marker; containers encode their derivation (and,
//! for columns, their element type) in the marker itself. See
//! [`crate::format`] for the complete byte layout.
//!
//! Zero is never a marker. Inside arrays and objects a zero byte is reserved
//! free space, which is what lets the insertion engine grow containers in
//! place.

use crate::{Error, Result};
use std::fmt;

/// Marker bytes of the wire format.
pub mod marker {
    pub const NULL: u8 = b'n';
    pub const TRUE: u8 = b't';
    pub const FALSE: u8 = b'f';
    pub const U8: u8 = b'c';
    pub const U16: u8 = b'd';
    pub const U32: u8 = b'i';
    pub const U64: u8 = b'l';
    pub const I8: u8 = b'C';
    pub const I16: u8 = b'D';
    pub const I32: u8 = b'I';
    pub const I64: u8 = b'L';
    pub const FLOAT: u8 = b'r';
    pub const STRING: u8 = b's';
    pub const BINARY: u8 = b'b';
    pub const CUSTOM_BINARY: u8 = b'x';

    pub const ARRAY_UNSORTED_MULTISET: u8 = b'[';
    pub const ARRAY_SORTED_MULTISET: u8 = 0x80;
    pub const ARRAY_UNSORTED_SET: u8 = 0x81;
    pub const ARRAY_SORTED_SET: u8 = 0x82;
    pub const END_ARRAY: u8 = b']';

    pub const OBJECT_UNSORTED_MULTIMAP: u8 = b'{';
    pub const OBJECT_SORTED_MULTIMAP: u8 = 0x83;
    pub const OBJECT_UNSORTED_MAP: u8 = 0x84;
    pub const OBJECT_SORTED_MAP: u8 = 0x85;
    pub const END_OBJECT: u8 = b'}';

    /// First column marker; the column markers occupy
    /// `COLUMN_BASE..COLUMN_BASE + 40`, four derivations per element type.
    pub const COLUMN_BASE: u8 = 0x90;

    /// Free space inside an array or object.
    pub const FREE: u8 = 0;
}

/// Ordering and uniqueness semantics attached to a container.
///
/// The derivation is recorded in the container's marker. The engine does not
/// enforce sortedness or uniqueness; that is up to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Derivation {
    #[default]
    UnsortedMultiset,
    SortedMultiset,
    UnsortedSet,
    SortedSet,
}

impl Derivation {
    pub const ALL: [Derivation; 4] = [
        Derivation::UnsortedMultiset,
        Derivation::SortedMultiset,
        Derivation::UnsortedSet,
        Derivation::SortedSet,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Derivation::UnsortedMultiset => 0,
            Derivation::SortedMultiset => 1,
            Derivation::UnsortedSet => 2,
            Derivation::SortedSet => 3,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_sorted(self) -> bool {
        matches!(self, Derivation::SortedMultiset | Derivation::SortedSet)
    }

    #[inline]
    #[must_use]
    pub const fn is_multiset(self) -> bool {
        matches!(
            self,
            Derivation::UnsortedMultiset | Derivation::SortedMultiset
        )
    }

    const fn array_marker(self) -> u8 {
        match self {
            Derivation::UnsortedMultiset => marker::ARRAY_UNSORTED_MULTISET,
            Derivation::SortedMultiset => marker::ARRAY_SORTED_MULTISET,
            Derivation::UnsortedSet => marker::ARRAY_UNSORTED_SET,
            Derivation::SortedSet => marker::ARRAY_SORTED_SET,
        }
    }

    const fn object_marker(self) -> u8 {
        match self {
            Derivation::UnsortedMultiset => marker::OBJECT_UNSORTED_MULTIMAP,
            Derivation::SortedMultiset => marker::OBJECT_SORTED_MULTIMAP,
            Derivation::UnsortedSet => marker::OBJECT_UNSORTED_MAP,
            Derivation::SortedSet => marker::OBJECT_SORTED_MAP,
        }
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Derivation::UnsortedMultiset => "unsorted-multiset",
            Derivation::SortedMultiset => "sorted-multiset",
            Derivation::UnsortedSet => "unsorted-set",
            Derivation::SortedSet => "sorted-set",
        })
    }
}

/// Element type of a column. Every column slot has this type's fixed width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    Bool,
}

impl ColumnType {
    pub const ALL: [ColumnType; 10] = [
        ColumnType::U8,
        ColumnType::U16,
        ColumnType::U32,
        ColumnType::U64,
        ColumnType::I8,
        ColumnType::I16,
        ColumnType::I32,
        ColumnType::I64,
        ColumnType::Float,
        ColumnType::Bool,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            ColumnType::U8 => 0,
            ColumnType::U16 => 1,
            ColumnType::U32 => 2,
            ColumnType::U64 => 3,
            ColumnType::I8 => 4,
            ColumnType::I16 => 5,
            ColumnType::I32 => 6,
            ColumnType::I64 => 7,
            ColumnType::Float => 8,
            ColumnType::Bool => 9,
        }
    }

    /// Slot width in bytes.
    #[inline]
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            ColumnType::U8 | ColumnType::I8 | ColumnType::Bool => 1,
            ColumnType::U16 | ColumnType::I16 => 2,
            ColumnType::U32 | ColumnType::I32 | ColumnType::Float => 4,
            ColumnType::U64 | ColumnType::I64 => 8,
        }
    }

    /// The reserved bit pattern standing for "no value" in a slot.
    #[must_use]
    pub const fn null_sentinel(self) -> &'static [u8] {
        match self {
            ColumnType::U8 => &[0xff],
            ColumnType::U16 => &[0xff; 2],
            ColumnType::U32 => &[0xff; 4],
            ColumnType::U64 => &[0xff; 8],
            ColumnType::I8 => &[0x80],
            ColumnType::I16 => &[0x00, 0x80],
            ColumnType::I32 => &[0x00, 0x00, 0x00, 0x80],
            ColumnType::I64 => &[0, 0, 0, 0, 0, 0, 0, 0x80],
            ColumnType::Float => &[0x00, 0x00, 0xc0, 0x7f],
            ColumnType::Bool => &[2],
        }
    }

    /// Decodes one slot; sentinel patterns decode to [`Scalar::Null`].
    pub fn decode_slot(self, slot: &[u8], offset: u64) -> Result<Scalar> {
        if slot.len() != self.width() {
            return Err(Error::internal(format!(
                "slot of {} bytes for {} column",
                slot.len(),
                self
            )));
        }
        if slot == self.null_sentinel() {
            return Ok(Scalar::Null);
        }
        let number = match self {
            ColumnType::Bool => {
                return match slot[0] {
                    0 => Ok(Scalar::Bool(false)),
                    1 => Ok(Scalar::Bool(true)),
                    other => Err(Error::corrupted(offset, other)),
                };
            }
            ColumnType::Float => {
                let value = f32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]);
                if value.is_nan() {
                    return Ok(Scalar::Null);
                }
                Number::Float(value)
            }
            _ => Number::decode(self.scalar_field_type(), slot)?,
        };
        Ok(Scalar::Number(number))
    }

    /// Encodes `value` for a slot of this column.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] unless `value` is null or has exactly this
    /// element type. A non-null value that would read back as null (the
    /// sentinel pattern itself, or any NaN in a float column) is rejected
    /// the same way.
    pub fn encode_slot(self, value: &Scalar) -> Result<Vec<u8>> {
        match (self, value) {
            (_, Scalar::Null) => Ok(self.null_sentinel().to_vec()),
            (ColumnType::Bool, Scalar::Bool(b)) => Ok(vec![u8::from(*b)]),
            (_, Scalar::Number(n)) if n.column_type() == self => {
                let mut out = Vec::with_capacity(self.width());
                n.write_le(&mut out);
                let nan = matches!(n, Number::Float(v) if v.is_nan());
                if nan || out == self.null_sentinel() {
                    return Err(Error::type_mismatch(
                        format!("column<{}> element", self),
                        format!("{} null sentinel", n.field_type()),
                    ));
                }
                Ok(out)
            }
            _ => Err(Error::type_mismatch(
                format!("column<{}> element", self),
                value.field_type(),
            )),
        }
    }

    /// Field type of a non-null, non-boolean element.
    const fn scalar_field_type(self) -> FieldType {
        match self {
            ColumnType::U8 => FieldType::U8,
            ColumnType::U16 => FieldType::U16,
            ColumnType::U32 => FieldType::U32,
            ColumnType::U64 => FieldType::U64,
            ColumnType::I8 => FieldType::I8,
            ColumnType::I16 => FieldType::I16,
            ColumnType::I32 => FieldType::I32,
            ColumnType::I64 => FieldType::I64,
            ColumnType::Float => FieldType::Float,
            ColumnType::Bool => FieldType::True,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            ColumnType::U8 => "u8",
            ColumnType::U16 => "u16",
            ColumnType::U32 => "u32",
            ColumnType::U64 => "u64",
            ColumnType::I8 => "i8",
            ColumnType::I16 => "i16",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::Float => "float",
            ColumnType::Bool => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of an encoded field, as told by its marker byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Null,
    True,
    False,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    String,
    Binary,
    CustomBinary,
    Array(Derivation),
    Object(Derivation),
    Column(ColumnType, Derivation),
}

impl FieldType {
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            FieldType::Null => marker::NULL,
            FieldType::True => marker::TRUE,
            FieldType::False => marker::FALSE,
            FieldType::U8 => marker::U8,
            FieldType::U16 => marker::U16,
            FieldType::U32 => marker::U32,
            FieldType::U64 => marker::U64,
            FieldType::I8 => marker::I8,
            FieldType::I16 => marker::I16,
            FieldType::I32 => marker::I32,
            FieldType::I64 => marker::I64,
            FieldType::Float => marker::FLOAT,
            FieldType::String => marker::STRING,
            FieldType::Binary => marker::BINARY,
            FieldType::CustomBinary => marker::CUSTOM_BINARY,
            FieldType::Array(d) => d.array_marker(),
            FieldType::Object(d) => d.object_marker(),
            FieldType::Column(ty, d) => marker::COLUMN_BASE + ty.index() * 4 + d.index(),
        }
    }

    /// Classifies a marker byte. End markers and free space are not fields
    /// and yield `None`, as do unknown bytes.
    #[must_use]
    pub fn from_marker(byte: u8) -> Option<Self> {
        let ty = match byte {
            marker::NULL => FieldType::Null,
            marker::TRUE => FieldType::True,
            marker::FALSE => FieldType::False,
            marker::U8 => FieldType::U8,
            marker::U16 => FieldType::U16,
            marker::U32 => FieldType::U32,
            marker::U64 => FieldType::U64,
            marker::I8 => FieldType::I8,
            marker::I16 => FieldType::I16,
            marker::I32 => FieldType::I32,
            marker::I64 => FieldType::I64,
            marker::FLOAT => FieldType::Float,
            marker::STRING => FieldType::String,
            marker::BINARY => FieldType::Binary,
            marker::CUSTOM_BINARY => FieldType::CustomBinary,
            marker::ARRAY_UNSORTED_MULTISET => FieldType::Array(Derivation::UnsortedMultiset),
            marker::ARRAY_SORTED_MULTISET => FieldType::Array(Derivation::SortedMultiset),
            marker::ARRAY_UNSORTED_SET => FieldType::Array(Derivation::UnsortedSet),
            marker::ARRAY_SORTED_SET => FieldType::Array(Derivation::SortedSet),
            marker::OBJECT_UNSORTED_MULTIMAP => FieldType::Object(Derivation::UnsortedMultiset),
            marker::OBJECT_SORTED_MULTIMAP => FieldType::Object(Derivation::SortedMultiset),
            marker::OBJECT_UNSORTED_MAP => FieldType::Object(Derivation::UnsortedSet),
            marker::OBJECT_SORTED_MAP => FieldType::Object(Derivation::SortedSet),
            b if (marker::COLUMN_BASE..marker::COLUMN_BASE + 40).contains(&b) => {
                let rel = b - marker::COLUMN_BASE;
                FieldType::Column(
                    ColumnType::ALL[(rel / 4) as usize],
                    Derivation::ALL[(rel % 4) as usize],
                )
            }
            _ => return None,
        };
        Some(ty)
    }

    /// Like [`FieldType::from_marker`], reporting unknown bytes as corruption.
    pub fn decode(byte: u8, offset: u64) -> Result<Self> {
        Self::from_marker(byte).ok_or_else(|| Error::corrupted(offset, byte))
    }

    /// Payload width of fixed-width scalars (excluding the marker).
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldType::Null | FieldType::True | FieldType::False => Some(0),
            FieldType::U8 | FieldType::I8 => Some(1),
            FieldType::U16 | FieldType::I16 => Some(2),
            FieldType::U32 | FieldType::I32 | FieldType::Float => Some(4),
            FieldType::U64 | FieldType::I64 => Some(8),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_fixed_width(self) -> bool {
        self.fixed_width().is_some()
    }

    /// Containers are the only fields a path can descend into.
    #[inline]
    #[must_use]
    pub const fn is_traversable(self) -> bool {
        matches!(
            self,
            FieldType::Array(_) | FieldType::Object(_) | FieldType::Column(..)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self, FieldType::True | FieldType::False)
    }

    #[inline]
    #[must_use]
    pub const fn is_number(self) -> bool {
        matches!(
            self,
            FieldType::U8
                | FieldType::U16
                | FieldType::U32
                | FieldType::U64
                | FieldType::I8
                | FieldType::I16
                | FieldType::I32
                | FieldType::I64
                | FieldType::Float
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, FieldType::Binary | FieldType::CustomBinary)
    }

    /// Derivation of a container field.
    #[must_use]
    pub const fn derivation(self) -> Option<Derivation> {
        match self {
            FieldType::Array(d) | FieldType::Object(d) | FieldType::Column(_, d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Null => f.write_str("null"),
            FieldType::True | FieldType::False => f.write_str("boolean"),
            FieldType::U8 => f.write_str("u8"),
            FieldType::U16 => f.write_str("u16"),
            FieldType::U32 => f.write_str("u32"),
            FieldType::U64 => f.write_str("u64"),
            FieldType::I8 => f.write_str("i8"),
            FieldType::I16 => f.write_str("i16"),
            FieldType::I32 => f.write_str("i32"),
            FieldType::I64 => f.write_str("i64"),
            FieldType::Float => f.write_str("float"),
            FieldType::String => f.write_str("string"),
            FieldType::Binary => f.write_str("binary"),
            FieldType::CustomBinary => f.write_str("custom-binary"),
            FieldType::Array(d) => write!(f, "array({})", d),
            FieldType::Object(d) => write!(f, "object({})", d),
            FieldType::Column(ty, d) => write!(f, "column<{}>({})", ty, d),
        }
    }
}

/// A fixed-width numeric value, tagged with its encoded width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Float(f32),
}

impl Number {
    #[must_use]
    pub const fn field_type(self) -> FieldType {
        match self {
            Number::U8(_) => FieldType::U8,
            Number::U16(_) => FieldType::U16,
            Number::U32(_) => FieldType::U32,
            Number::U64(_) => FieldType::U64,
            Number::I8(_) => FieldType::I8,
            Number::I16(_) => FieldType::I16,
            Number::I32(_) => FieldType::I32,
            Number::I64(_) => FieldType::I64,
            Number::Float(_) => FieldType::Float,
        }
    }

    #[must_use]
    pub const fn column_type(self) -> ColumnType {
        match self {
            Number::U8(_) => ColumnType::U8,
            Number::U16(_) => ColumnType::U16,
            Number::U32(_) => ColumnType::U32,
            Number::U64(_) => ColumnType::U64,
            Number::I8(_) => ColumnType::I8,
            Number::I16(_) => ColumnType::I16,
            Number::I32(_) => ColumnType::I32,
            Number::I64(_) => ColumnType::I64,
            Number::Float(_) => ColumnType::Float,
        }
    }

    /// Returns the value as `u64` for non-negative integers.
    #[must_use]
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Number::U8(v) => Some(v.into()),
            Number::U16(v) => Some(v.into()),
            Number::U32(v) => Some(v.into()),
            Number::U64(v) => Some(v),
            Number::I8(v) => u64::try_from(v).ok(),
            Number::I16(v) => u64::try_from(v).ok(),
            Number::I32(v) => u64::try_from(v).ok(),
            Number::I64(v) => u64::try_from(v).ok(),
            Number::Float(_) => None,
        }
    }

    /// Returns the value as `i64` for integers that fit.
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::U8(v) => Some(v.into()),
            Number::U16(v) => Some(v.into()),
            Number::U32(v) => Some(v.into()),
            Number::U64(v) => i64::try_from(v).ok(),
            Number::I8(v) => Some(v.into()),
            Number::I16(v) => Some(v.into()),
            Number::I32(v) => Some(v.into()),
            Number::I64(v) => Some(v),
            Number::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::U8(v) => v.into(),
            Number::U16(v) => v.into(),
            Number::U32(v) => v.into(),
            Number::U64(v) => v as f64,
            Number::I8(v) => v.into(),
            Number::I16(v) => v.into(),
            Number::I32(v) => v.into(),
            Number::I64(v) => v as f64,
            Number::Float(v) => v.into(),
        }
    }

    /// Appends the little-endian payload.
    pub fn write_le(self, out: &mut Vec<u8>) {
        match self {
            Number::U8(v) => out.push(v),
            Number::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::I8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Number::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// Decodes a little-endian payload of a numeric field type.
    pub fn decode(ty: FieldType, payload: &[u8]) -> Result<Self> {
        fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N]> {
            payload
                .get(..N)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| Error::out_of_bounds(0, N as u64, payload.len() as u64))
        }
        Ok(match ty {
            FieldType::U8 => Number::U8(fixed::<1>(payload)?[0]),
            FieldType::U16 => Number::U16(u16::from_le_bytes(fixed(payload)?)),
            FieldType::U32 => Number::U32(u32::from_le_bytes(fixed(payload)?)),
            FieldType::U64 => Number::U64(u64::from_le_bytes(fixed(payload)?)),
            FieldType::I8 => Number::I8(i8::from_le_bytes(fixed(payload)?)),
            FieldType::I16 => Number::I16(i16::from_le_bytes(fixed(payload)?)),
            FieldType::I32 => Number::I32(i32::from_le_bytes(fixed(payload)?)),
            FieldType::I64 => Number::I64(i64::from_le_bytes(fixed(payload)?)),
            FieldType::Float => Number::Float(f32::from_le_bytes(fixed(payload)?)),
            other => return Err(Error::type_mismatch("number", other)),
        })
    }

    /// Renders the number, floats with `precision` decimals.
    #[must_use]
    pub fn render(self, precision: usize) -> String {
        match self {
            Number::Float(v) if !v.is_finite() => "null".to_string(),
            Number::Float(v) => format!("{:.*}", precision, v),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::U8(v) => write!(f, "{}", v),
            Number::U16(v) => write!(f, "{}", v),
            Number::U32(v) => write!(f, "{}", v),
            Number::U64(v) => write!(f, "{}", v),
            Number::I8(v) => write!(f, "{}", v),
            Number::I16(v) => write!(f, "{}", v),
            Number::I32(v) => write!(f, "{}", v),
            Number::I64(v) => write!(f, "{}", v),
            Number::Float(v) if !v.is_finite() => f.write_str("null"),
            Number::Float(v) => write!(f, "{:.2}", v),
        }
    }
}

/// Any fixed-width value: the unit of scalar insertion and update.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
}

impl Scalar {
    #[must_use]
    pub const fn field_type(self) -> FieldType {
        match self {
            Scalar::Null => FieldType::Null,
            Scalar::Bool(true) => FieldType::True,
            Scalar::Bool(false) => FieldType::False,
            Scalar::Number(n) => n.field_type(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self, Scalar::Null)
    }

    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(self) -> Option<Number> {
        match self {
            Scalar::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn to_bool(self) -> Result<bool> {
        self.as_bool()
            .ok_or_else(|| Error::type_mismatch("boolean", self.field_type()))
    }

    /// Any unsigned integer, widened.
    pub fn to_unsigned(self) -> Result<u64> {
        match self {
            Scalar::Number(Number::U8(v)) => Ok(v.into()),
            Scalar::Number(Number::U16(v)) => Ok(v.into()),
            Scalar::Number(Number::U32(v)) => Ok(v.into()),
            Scalar::Number(Number::U64(v)) => Ok(v),
            other => Err(Error::type_mismatch("unsigned integer", other.field_type())),
        }
    }

    /// Any signed integer, widened.
    pub fn to_signed(self) -> Result<i64> {
        match self {
            Scalar::Number(Number::I8(v)) => Ok(v.into()),
            Scalar::Number(Number::I16(v)) => Ok(v.into()),
            Scalar::Number(Number::I32(v)) => Ok(v.into()),
            Scalar::Number(Number::I64(v)) => Ok(v),
            other => Err(Error::type_mismatch("signed integer", other.field_type())),
        }
    }

    pub fn to_float(self) -> Result<f32> {
        match self {
            Scalar::Number(Number::Float(v)) => Ok(v),
            other => Err(Error::type_mismatch(FieldType::Float, other.field_type())),
        }
    }

    /// Appends marker and payload as a standalone field.
    pub fn write_field(self, out: &mut Vec<u8>) {
        out.push(self.field_type().marker());
        if let Scalar::Number(n) = self {
            n.write_le(out);
        }
    }

    /// Encoded length as a standalone field, marker included.
    #[must_use]
    pub fn field_len(self) -> usize {
        1 + self.field_type().fixed_width().unwrap_or(0)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<Number> for Scalar {
    fn from(value: Number) -> Self {
        Scalar::Number(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

macro_rules! number_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::$variant(value)
                }
            }

            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::Number(Number::$variant(value))
                }
            }
        )*
    };
}

number_conversions! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => Float,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_round_trip() {
        let mut types = vec![
            FieldType::Null,
            FieldType::True,
            FieldType::False,
            FieldType::U8,
            FieldType::I64,
            FieldType::Float,
            FieldType::String,
            FieldType::Binary,
            FieldType::CustomBinary,
        ];
        for d in Derivation::ALL {
            types.push(FieldType::Array(d));
            types.push(FieldType::Object(d));
            for ty in ColumnType::ALL {
                types.push(FieldType::Column(ty, d));
            }
        }
        for ty in types {
            assert_ne!(ty.marker(), marker::FREE);
            assert_eq!(FieldType::from_marker(ty.marker()), Some(ty), "{}", ty);
        }
    }

    #[test]
    fn test_end_markers_are_not_fields() {
        assert_eq!(FieldType::from_marker(marker::END_ARRAY), None);
        assert_eq!(FieldType::from_marker(marker::END_OBJECT), None);
        assert_eq!(FieldType::from_marker(marker::FREE), None);
        assert!(matches!(
            FieldType::decode(0xfe, 3),
            Err(Error::Corrupted { offset: 3, marker: 0xfe })
        ));
    }

    #[test]
    fn test_null_sentinels_have_slot_width() {
        for ty in ColumnType::ALL {
            assert_eq!(ty.null_sentinel().len(), ty.width(), "{}", ty);
            assert_eq!(ty.decode_slot(ty.null_sentinel(), 0).unwrap(), Scalar::Null);
        }
    }

    #[test]
    fn test_encode_slot_requires_exact_type() {
        assert_eq!(ColumnType::U8.encode_slot(&Scalar::from(7u8)).unwrap(), vec![7]);
        assert_eq!(
            ColumnType::U8.encode_slot(&Scalar::Null).unwrap(),
            vec![0xff]
        );
        assert!(matches!(
            ColumnType::U8.encode_slot(&Scalar::from(7u16)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(ColumnType::Bool.encode_slot(&Scalar::from(1u8)).is_err());
        assert_eq!(
            ColumnType::Bool.encode_slot(&Scalar::Bool(true)).unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_encode_slot_rejects_sentinel_values() {
        let cases = [
            (ColumnType::U8, Scalar::from(u8::MAX)),
            (ColumnType::U16, Scalar::from(u16::MAX)),
            (ColumnType::U32, Scalar::from(u32::MAX)),
            (ColumnType::U64, Scalar::from(u64::MAX)),
            (ColumnType::I8, Scalar::from(i8::MIN)),
            (ColumnType::I16, Scalar::from(i16::MIN)),
            (ColumnType::I32, Scalar::from(i32::MIN)),
            (ColumnType::I64, Scalar::from(i64::MIN)),
            (ColumnType::Float, Scalar::from(f32::NAN)),
            (ColumnType::Float, Scalar::from(-f32::NAN)),
        ];
        for (ty, value) in cases {
            assert!(
                matches!(ty.encode_slot(&value), Err(Error::TypeMismatch { .. })),
                "{} accepted {:?}",
                ty,
                value
            );
        }
        assert_eq!(ColumnType::U8.encode_slot(&Scalar::from(254u8)).unwrap(), vec![254]);
        assert_eq!(
            ColumnType::I8.encode_slot(&Scalar::from(i8::MIN + 1)).unwrap(),
            vec![0x81]
        );
        assert!(ColumnType::Float.encode_slot(&Scalar::from(f32::INFINITY)).is_ok());
    }

    #[test]
    fn test_scalar_field_encoding() {
        let mut out = Vec::new();
        Scalar::from(-42i64).write_field(&mut out);
        assert_eq!(out[0], marker::I64);
        assert_eq!(out.len(), Scalar::from(-42i64).field_len());
        assert_eq!(
            Number::decode(FieldType::I64, &out[1..]).unwrap(),
            Number::I64(-42)
        );
    }

    #[test]
    fn test_typed_conversions() {
        assert_eq!(Scalar::from(7u16).to_unsigned().unwrap(), 7);
        assert_eq!(Scalar::from(-7i8).to_signed().unwrap(), -7);
        assert!(Scalar::from(7u8).to_signed().is_err());
        assert!(Scalar::Null.to_bool().is_err());
        assert_eq!(Scalar::from(1.5f32).to_float().unwrap(), 1.5);
    }

    #[test]
    fn test_number_render() {
        assert_eq!(Number::Float(23.0).render(2), "23.00");
        assert_eq!(Number::I64(-42).render(2), "-42");
        assert_eq!(Number::Float(f32::NAN).to_string(), "null");
    }

    #[test]
    fn test_derivation_facts() {
        assert!(Derivation::SortedSet.is_sorted());
        assert!(!Derivation::SortedSet.is_multiset());
        assert!(Derivation::UnsortedMultiset.is_multiset());
        assert!(!Derivation::UnsortedMultiset.is_sorted());
    }
}
