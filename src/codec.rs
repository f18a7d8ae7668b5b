//! Encoding and decoding of individual fields.
//!
//! Everything here works on plain byte slices and absolute offsets, so the
//! same routines serve read-only cursors, iterators and the insertion
//! engine. The central operation is [`field_end`], which computes the exact
//! byte span of a field including any nested containers; removal, update and
//! iteration all depend on it.
//!
//! Walks over nested arrays and objects are bounded by [`MAX_DEPTH`]: input
//! nested deeper is reported as [`Error::Corrupted`] at the offending
//! container instead of exhausting the stack.

use crate::field::{marker, ColumnType, Derivation, FieldType, Number, Scalar};
use crate::value::{Binary, BinaryKind};
use crate::varuint::{decode_varuint, encode_varuint, varuint_bytes, MAX_VARUINT_LEN};
use crate::{DocMap, Error, Result, Value};

/// Deepest array/object nesting the codec walks, counted from the container
/// a walk starts at.
pub const MAX_DEPTH: usize = 128;

/// Rejects the container at `offset` when it sits `depth` levels down.
fn check_depth(bytes: &[u8], offset: u64, depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::corrupted(offset, byte_at(bytes, offset)?));
    }
    Ok(())
}

/// Location of one live field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRef {
    /// Offset of the marker byte.
    pub offset: u64,
    pub ty: FieldType,
    /// Offset one past the last byte of the field.
    pub end: u64,
}

impl FieldRef {
    /// Reads the field at `offset`.
    pub fn at(bytes: &[u8], offset: u64) -> Result<Self> {
        let ty = field_type_at(bytes, offset)?;
        let end = field_end(bytes, offset)?;
        Ok(FieldRef { offset, ty, end })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.offset
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the payload, right after the marker.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> u64 {
        self.offset + 1
    }

    pub fn scalar(&self, bytes: &[u8]) -> Result<Scalar> {
        decode_scalar(bytes, self.offset, self.ty)
    }

    pub fn boolean(&self, bytes: &[u8]) -> Result<bool> {
        self.scalar(bytes)?.to_bool()
    }

    pub fn unsigned(&self, bytes: &[u8]) -> Result<u64> {
        self.scalar(bytes)?.to_unsigned()
    }

    pub fn signed(&self, bytes: &[u8]) -> Result<i64> {
        self.scalar(bytes)?.to_signed()
    }

    pub fn float(&self, bytes: &[u8]) -> Result<f32> {
        self.scalar(bytes)?.to_float()
    }

    pub fn string<'b>(&self, bytes: &'b [u8]) -> Result<&'b str> {
        if self.ty != FieldType::String {
            return Err(Error::type_mismatch(FieldType::String, self.ty));
        }
        Ok(read_str(bytes, self.payload())?.0)
    }

    pub fn binary(&self, bytes: &[u8]) -> Result<Binary> {
        if !self.ty.is_binary() {
            return Err(Error::type_mismatch(FieldType::Binary, self.ty));
        }
        Ok(decode_binary(bytes, self.offset, self.ty)?.0)
    }

    pub fn value(&self, bytes: &[u8]) -> Result<Value> {
        Ok(decode_value(bytes, self.offset)?.0)
    }
}

/// Header of an encoded column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnHeader {
    pub offset: u64,
    pub ty: ColumnType,
    pub derivation: Derivation,
    pub count: u64,
    pub count_offset: u64,
    pub capacity: u64,
    pub capacity_offset: u64,
    /// Offset of slot 0.
    pub payload: u64,
}

impl ColumnHeader {
    pub fn read(bytes: &[u8], offset: u64) -> Result<Self> {
        let (ty, derivation) = match field_type_at(bytes, offset)? {
            FieldType::Column(ty, d) => (ty, d),
            other => return Err(Error::type_mismatch("column", other)),
        };
        let count_offset = offset + 1;
        let (count, count_width) = varuint_at(bytes, count_offset)?;
        let capacity_offset = count_offset + count_width;
        let (capacity, capacity_width) = varuint_at(bytes, capacity_offset)?;
        if count > capacity {
            return Err(Error::corrupted(count_offset, byte_at(bytes, count_offset)?));
        }
        if capacity > bytes.len() as u64 {
            return Err(Error::out_of_bounds(capacity_offset, capacity, bytes.len() as u64));
        }
        let header = ColumnHeader {
            offset,
            ty,
            derivation,
            count,
            count_offset,
            capacity,
            capacity_offset,
            payload: capacity_offset + capacity_width,
        };
        check_end(bytes, header.end())?;
        Ok(header)
    }

    #[inline]
    #[must_use]
    pub fn slot_offset(&self, index: u64) -> u64 {
        self.payload + index * self.ty.width() as u64
    }

    /// Offset one past the last slot.
    #[inline]
    #[must_use]
    pub fn end(&self) -> u64 {
        self.slot_offset(self.capacity)
    }

    pub fn slot(&self, bytes: &[u8], index: u64) -> Result<Scalar> {
        if index >= self.count {
            return Err(Error::out_of_bounds(index, 1, self.count));
        }
        let offset = self.slot_offset(index);
        let width = self.ty.width();
        let start = offset as usize;
        self.ty.decode_slot(&bytes[start..start + width], offset)
    }
}

fn check_end(bytes: &[u8], end: u64) -> Result<()> {
    if end > bytes.len() as u64 {
        return Err(Error::out_of_bounds(end, 0, bytes.len() as u64));
    }
    Ok(())
}

#[inline]
pub(crate) fn byte_at(bytes: &[u8], offset: u64) -> Result<u8> {
    usize::try_from(offset)
        .ok()
        .and_then(|i| bytes.get(i).copied())
        .ok_or_else(|| Error::out_of_bounds(offset, 1, bytes.len() as u64))
}

/// Decodes a varuint at `offset`, returning `(value, width)`.
pub(crate) fn varuint_at(bytes: &[u8], offset: u64) -> Result<(u64, u64)> {
    let used = bytes.len() as u64;
    if offset > used {
        return Err(Error::out_of_bounds(offset, 1, used));
    }
    let (value, width) = decode_varuint(&bytes[offset as usize..]).map_err(|e| match e {
        Error::OutOfBounds { len, .. } => Error::out_of_bounds(offset, len, used),
        Error::Corrupted { offset: rel, marker } => Error::corrupted(offset + rel, marker),
        other => other,
    })?;
    Ok((value, width as u64))
}

/// Reads a length-prefixed UTF-8 string, returning it and the offset after it.
pub(crate) fn read_str(bytes: &[u8], offset: u64) -> Result<(&str, u64)> {
    let (len, width) = varuint_at(bytes, offset)?;
    let start = offset + width;
    let end = start
        .checked_add(len)
        .ok_or_else(|| Error::out_of_bounds(start, len, bytes.len() as u64))?;
    check_end(bytes, end)?;
    let raw = &bytes[start as usize..end as usize];
    let s = std::str::from_utf8(raw)
        .map_err(|e| Error::corrupted(start + e.valid_up_to() as u64, raw[e.valid_up_to()]))?;
    Ok((s, end))
}

fn skip_blob(bytes: &[u8], offset: u64) -> Result<u64> {
    let (len, width) = varuint_at(bytes, offset)?;
    let end = (offset + width)
        .checked_add(len)
        .ok_or_else(|| Error::out_of_bounds(offset, len, bytes.len() as u64))?;
    check_end(bytes, end)?;
    Ok(end)
}

pub fn field_type_at(bytes: &[u8], offset: u64) -> Result<FieldType> {
    FieldType::decode(byte_at(bytes, offset)?, offset)
}

/// Offset one past the field starting at `offset`.
pub fn field_end(bytes: &[u8], offset: u64) -> Result<u64> {
    field_end_at(bytes, offset, 0)
}

fn field_end_at(bytes: &[u8], offset: u64, depth: usize) -> Result<u64> {
    let ty = field_type_at(bytes, offset)?;
    let payload = offset + 1;
    let end = match ty {
        FieldType::String => skip_blob(bytes, payload)?,
        FieldType::Binary => {
            let (_, width) = varuint_at(bytes, payload)?;
            skip_blob(bytes, payload + width)?
        }
        FieldType::CustomBinary => skip_blob(bytes, skip_blob(bytes, payload)?)?,
        FieldType::Array(_) => items_end_at(bytes, offset, false, depth)?.end,
        FieldType::Object(_) => items_end_at(bytes, offset, true, depth)?.end,
        FieldType::Column(..) => ColumnHeader::read(bytes, offset)?.end(),
        fixed => payload + fixed.fixed_width().unwrap_or(0) as u64,
    };
    check_end(bytes, end)?;
    Ok(end)
}

/// Where the live content of an array or object stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemsEnd {
    /// Offset one past the last live entry, or one past the begin marker
    /// when the container is empty.
    pub last_live_end: u64,
    /// Offset of the end marker.
    pub end_marker: u64,
    /// Offset one past the end marker.
    pub end: u64,
}

/// Scans an array (or object) beginning at `offset` to its end marker.
pub fn items_end(bytes: &[u8], offset: u64, object: bool) -> Result<ItemsEnd> {
    items_end_at(bytes, offset, object, 0)
}

fn items_end_at(bytes: &[u8], offset: u64, object: bool, depth: usize) -> Result<ItemsEnd> {
    check_depth(bytes, offset, depth)?;
    let end_byte = if object {
        marker::END_OBJECT
    } else {
        marker::END_ARRAY
    };
    let mut pos = offset + 1;
    let mut last_live_end = pos;
    loop {
        let byte = byte_at(bytes, pos)?;
        if byte == marker::FREE {
            pos += 1;
            continue;
        }
        if byte == end_byte {
            return Ok(ItemsEnd {
                last_live_end,
                end_marker: pos,
                end: pos + 1,
            });
        }
        let field_offset = if object {
            key_end(bytes, pos)?
        } else {
            pos
        };
        pos = field_end_at(bytes, field_offset, depth + 1)?;
        last_live_end = pos;
    }
}

/// Offset of the value following the object key at `offset`.
pub(crate) fn key_end(bytes: &[u8], offset: u64) -> Result<u64> {
    Ok(read_str(bytes, offset)?.1)
}

pub fn decode_scalar(bytes: &[u8], offset: u64, ty: FieldType) -> Result<Scalar> {
    match ty {
        FieldType::Null => Ok(Scalar::Null),
        FieldType::True => Ok(Scalar::Bool(true)),
        FieldType::False => Ok(Scalar::Bool(false)),
        ty if ty.is_number() => {
            let width = ty.fixed_width().unwrap_or(0) as u64;
            let start = offset + 1;
            check_end(bytes, start + width)?;
            let number = Number::decode(ty, &bytes[start as usize..(start + width) as usize])?;
            Ok(Scalar::Number(number))
        }
        other => Err(Error::type_mismatch("scalar", other)),
    }
}

fn decode_binary(bytes: &[u8], offset: u64, ty: FieldType) -> Result<(Binary, u64)> {
    let payload = offset + 1;
    let (kind, data_offset) = match ty {
        FieldType::Binary => {
            let (id, width) = varuint_at(bytes, payload)?;
            (BinaryKind::Mime(id), payload + width)
        }
        _ => {
            let (name, next) = read_str(bytes, payload)?;
            (BinaryKind::Custom(name.to_string()), next)
        }
    };
    let (len, width) = varuint_at(bytes, data_offset)?;
    let start = data_offset + width;
    let end = start
        .checked_add(len)
        .ok_or_else(|| Error::out_of_bounds(start, len, bytes.len() as u64))?;
    check_end(bytes, end)?;
    let data = bytes[start as usize..end as usize].to_vec();
    Ok((Binary { kind, data }, end))
}

/// Decodes the field at `offset` into an owned value, returning the value and
/// the offset after the field.
pub fn decode_value(bytes: &[u8], offset: u64) -> Result<(Value, u64)> {
    decode_value_at(bytes, offset, 0)
}

fn decode_value_at(bytes: &[u8], offset: u64, depth: usize) -> Result<(Value, u64)> {
    let ty = field_type_at(bytes, offset)?;
    match ty {
        FieldType::String => {
            let (s, end) = read_str(bytes, offset + 1)?;
            Ok((Value::String(s.to_string()), end))
        }
        FieldType::Binary | FieldType::CustomBinary => {
            let (binary, end) = decode_binary(bytes, offset, ty)?;
            Ok((Value::Binary(binary), end))
        }
        FieldType::Array(derivation) => {
            check_depth(bytes, offset, depth)?;
            let mut items = Vec::new();
            let mut pos = offset + 1;
            loop {
                match byte_at(bytes, pos)? {
                    marker::FREE => pos += 1,
                    marker::END_ARRAY => break,
                    _ => {
                        let (item, next) = decode_value_at(bytes, pos, depth + 1)?;
                        items.push(item);
                        pos = next;
                    }
                }
            }
            Ok((Value::Array { items, derivation }, pos + 1))
        }
        FieldType::Object(derivation) => {
            check_depth(bytes, offset, depth)?;
            let mut map = DocMap::new();
            let mut pos = offset + 1;
            loop {
                match byte_at(bytes, pos)? {
                    marker::FREE => pos += 1,
                    marker::END_OBJECT => break,
                    _ => {
                        let (key, value_offset) = read_str(bytes, pos)?;
                        let (value, next) = decode_value_at(bytes, value_offset, depth + 1)?;
                        map.insert(key, value);
                        pos = next;
                    }
                }
            }
            Ok((Value::Object { map, derivation }, pos + 1))
        }
        FieldType::Column(ty, derivation) => {
            let header = ColumnHeader::read(bytes, offset)?;
            let items = (0..header.count)
                .map(|i| header.slot(bytes, i))
                .collect::<Result<Vec<_>>>()?;
            Ok((
                Value::Column {
                    ty,
                    items,
                    derivation,
                },
                header.end(),
            ))
        }
        scalar => {
            let value = decode_scalar(bytes, offset, scalar)?.into();
            Ok((value, offset + 1 + scalar.fixed_width().unwrap_or(0) as u64))
        }
    }
}

fn push_varuint(out: &mut Vec<u8>, value: u64) {
    let mut buf = [0u8; MAX_VARUINT_LEN];
    let n = encode_varuint(value, &mut buf);
    out.extend_from_slice(&buf[..n]);
}

/// Appends an object key.
///
/// A key of exactly 125 bytes would have a length prefix equal to the
/// object end marker, so its prefix is written in the two-byte form
/// `0xfd 0x00`, which decodes to the same length.
pub fn encode_key(key: &str, out: &mut Vec<u8>) -> Result<()> {
    if key.is_empty() {
        return Err(Error::null_argument("object key"));
    }
    let len = key.len() as u64;
    if len == u64::from(marker::END_OBJECT) {
        out.extend_from_slice(&[marker::END_OBJECT | 0x80, 0x00]);
    } else {
        push_varuint(out, len);
    }
    out.extend_from_slice(key.as_bytes());
    Ok(())
}

pub fn encode_string(s: &str, out: &mut Vec<u8>) {
    out.push(marker::STRING);
    push_varuint(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

pub fn encode_binary(binary: &Binary, out: &mut Vec<u8>) {
    match &binary.kind {
        BinaryKind::Mime(id) => {
            out.push(marker::BINARY);
            push_varuint(out, *id);
        }
        BinaryKind::Custom(name) => {
            out.push(marker::CUSTOM_BINARY);
            push_varuint(out, name.len() as u64);
            out.extend_from_slice(name.as_bytes());
        }
    }
    push_varuint(out, binary.data.len() as u64);
    out.extend_from_slice(&binary.data);
}

/// Encodes a column header followed by `capacity` slots, the first ones
/// holding `items`.
pub fn encode_column(
    ty: ColumnType,
    derivation: Derivation,
    items: &[Scalar],
    capacity: u64,
    out: &mut Vec<u8>,
) -> Result<()> {
    let count = items.len() as u64;
    let capacity = capacity.max(count);
    out.push(FieldType::Column(ty, derivation).marker());
    push_varuint(out, count);
    push_varuint(out, capacity);
    for item in items {
        out.extend_from_slice(&ty.encode_slot(item)?);
    }
    for _ in count..capacity {
        out.extend_from_slice(ty.null_sentinel());
    }
    Ok(())
}

/// Appends the tightly packed encoding of `value`.
///
/// # Errors
///
/// [`Error::StackOverflow`] when arrays and objects nest deeper than
/// [`MAX_DEPTH`], since such a field could not be read back.
pub fn encode_value(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    encode_value_at(value, out, 0)
}

fn encode_value_at(value: &Value, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH && matches!(value, Value::Array { .. } | Value::Object { .. }) {
        return Err(Error::StackOverflow(MAX_DEPTH));
    }
    match value {
        Value::Null => Scalar::Null.write_field(out),
        Value::Bool(b) => Scalar::Bool(*b).write_field(out),
        Value::Number(n) => Scalar::Number(*n).write_field(out),
        Value::String(s) => encode_string(s, out),
        Value::Binary(b) => encode_binary(b, out),
        Value::Array { items, derivation } => {
            out.push(FieldType::Array(*derivation).marker());
            for item in items {
                encode_value_at(item, out, depth + 1)?;
            }
            out.push(marker::END_ARRAY);
        }
        Value::Object { map, derivation } => {
            out.push(FieldType::Object(*derivation).marker());
            for (key, item) in map.iter() {
                encode_key(key, out)?;
                encode_value_at(item, out, depth + 1)?;
            }
            out.push(marker::END_OBJECT);
        }
        Value::Column {
            ty,
            items,
            derivation,
        } => encode_column(*ty, *derivation, items, items.len() as u64, out)?,
    }
    Ok(())
}

/// Copies the field at `offset` to `out` without reserved space: free bytes
/// inside arrays and objects are dropped and columns are cut to their
/// element count. Returns the offset after the source field.
pub fn compact_field(bytes: &[u8], offset: u64, out: &mut Vec<u8>) -> Result<u64> {
    compact_field_at(bytes, offset, out, 0)
}

fn compact_field_at(bytes: &[u8], offset: u64, out: &mut Vec<u8>, depth: usize) -> Result<u64> {
    let ty = field_type_at(bytes, offset)?;
    match ty {
        FieldType::Array(_) | FieldType::Object(_) => {
            check_depth(bytes, offset, depth)?;
            let object = matches!(ty, FieldType::Object(_));
            let end_byte = if object {
                marker::END_OBJECT
            } else {
                marker::END_ARRAY
            };
            out.push(ty.marker());
            let mut pos = offset + 1;
            loop {
                let byte = byte_at(bytes, pos)?;
                if byte == marker::FREE {
                    pos += 1;
                    continue;
                }
                if byte == end_byte {
                    out.push(end_byte);
                    return Ok(pos + 1);
                }
                if object {
                    let value_offset = key_end(bytes, pos)?;
                    out.extend_from_slice(&bytes[pos as usize..value_offset as usize]);
                    pos = value_offset;
                }
                pos = compact_field_at(bytes, pos, out, depth + 1)?;
            }
        }
        FieldType::Column(ty, derivation) => {
            let header = ColumnHeader::read(bytes, offset)?;
            out.push(FieldType::Column(ty, derivation).marker());
            out.extend_from_slice(&varuint_bytes(header.count));
            out.extend_from_slice(&varuint_bytes(header.count));
            let start = header.payload as usize;
            let live = header.slot_offset(header.count) as usize;
            out.extend_from_slice(&bytes[start..live]);
            Ok(header.end())
        }
        _ => {
            let end = field_end(bytes, offset)?;
            out.extend_from_slice(&bytes[offset as usize..end as usize]);
            Ok(end)
        }
    }
}
