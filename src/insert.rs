//! The insertion engine.
//!
//! An [`Inserter`] writes new fields at a position inside an open container.
//! It carries a stack of open container frames: `begin_*` writes a nested
//! container (both markers at once, with reserved free space in between)
//! and pushes a frame, so subsequent inserts land inside the child;
//! `end_*` drops the unused reservation and pops back to the parent, which
//! continues right after the now tightly packed child.
//!
//! Inserting never overwrites live data: every write first claims room with
//! [`MemFile::ensure_space`], which consumes free zero bytes and shifts the
//! rest of the document only when there are not enough of them.
//!
//! ```rust
//! use colbin::{ColumnType, Derivation, Document};
//!
//! let mut doc = Document::new();
//! let mut ins = doc.inserter().unwrap();
//! ins.insert(1u8).unwrap();
//! ins.begin_column(ColumnType::I32, Derivation::SortedMultiset).unwrap();
//! ins.insert(-5i32).unwrap();
//! ins.insert(None::<i32>).unwrap();
//! ins.end_column().unwrap();
//! ins.finish().unwrap();
//!
//! assert_eq!(doc.to_json().unwrap(), "[1, [-5, null]]");
//! ```

use crate::block::GROWTH_FACTOR;
use crate::codec::{self, ColumnHeader, FieldRef};
use crate::field::{marker, ColumnType, Derivation, FieldType, Scalar};
use crate::memfile::MemFile;
use crate::value::Binary;
use crate::{Error, Result, Value};
use tracing::{debug, trace};

/// Free space reserved by `begin_*` calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    /// Bytes reserved inside a new array.
    pub array: usize,
    /// Bytes reserved inside a new object.
    pub object: usize,
    /// Slots reserved in a new column.
    pub column: u64,
}

impl Default for Reservation {
    fn default() -> Self {
        Reservation {
            array: 16,
            object: 32,
            column: 8,
        }
    }
}

impl Reservation {
    /// Reserve nothing; containers grow on every insert.
    #[must_use]
    pub const fn none() -> Self {
        Reservation {
            array: 0,
            object: 0,
            column: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    Array { begin: u64 },
    Object { begin: u64 },
    Column { begin: u64 },
}

impl Frame {
    fn name(self) -> &'static str {
        match self {
            Frame::Array { .. } => "array context",
            Frame::Object { .. } => "object context",
            Frame::Column { .. } => "column context",
        }
    }
}

/// Writes fields into an open container.
pub struct Inserter<'a> {
    file: MemFile<'a>,
    frames: Vec<Frame>,
    reservation: Reservation,
    column_growths: u64,
}

impl<'a> Inserter<'a> {
    /// An inserter writing at the cursor's position inside `frame`.
    pub(crate) fn new(file: MemFile<'a>, frame: Frame) -> Self {
        Inserter {
            file,
            frames: vec![frame],
            reservation: Reservation::default(),
            column_growths: 0,
        }
    }

    /// Replaces the space reserved by subsequent `begin_*` calls.
    #[must_use]
    pub fn with_reservation(mut self, reservation: Reservation) -> Self {
        self.reservation = reservation;
        self
    }

    #[must_use]
    pub fn reservation(&self) -> Reservation {
        self.reservation
    }

    /// Number of containers opened and not yet ended.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Offset where the next array or object field is written.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.file.tell()
    }

    /// How many times a column had to be reallocated so far.
    #[must_use]
    pub fn column_growths(&self) -> u64 {
        self.column_growths
    }

    fn top(&self) -> Result<Frame> {
        self.frames
            .last()
            .copied()
            .ok_or_else(|| Error::internal("inserter without open frame"))
    }

    /// Writes `encoded` (preceded by `key` in objects) at the cursor and
    /// returns the offset of the field marker.
    fn write_field(&mut self, key: Option<&str>, encoded: &[u8]) -> Result<u64> {
        let top = self.top()?;
        let mut bytes = Vec::with_capacity(encoded.len() + key.map_or(0, |k| k.len() + 2));
        match (top, key) {
            (Frame::Object { .. }, Some(key)) => codec::encode_key(key, &mut bytes)?,
            (Frame::Object { .. }, None) => {
                return Err(Error::null_argument("object property key"));
            }
            (Frame::Array { .. }, None) => {}
            (other, _) => {
                let expected = if key.is_some() {
                    "object context"
                } else {
                    "array context"
                };
                return Err(Error::type_mismatch(expected, other.name()));
            }
        }
        let key_len = bytes.len() as u64;
        bytes.extend_from_slice(encoded);
        self.file.ensure_space(bytes.len() as u64)?;
        let at = self.file.tell();
        self.file.write(&bytes)?;
        trace!(target: "colbin::insert", offset = at, len = bytes.len(), "field written");
        Ok(at + key_len)
    }

    /// Inserts a fixed-width value. In a column the value must have the
    /// column's element type or be null.
    pub fn insert(&mut self, value: impl Into<Scalar>) -> Result<()> {
        let value = value.into();
        if let Frame::Column { begin } = self.top()? {
            return self.push_slot(begin, &value);
        }
        let mut encoded = Vec::with_capacity(value.field_len());
        value.write_field(&mut encoded);
        self.write_field(None, &encoded).map(drop)
    }

    pub fn insert_prop(&mut self, key: &str, value: impl Into<Scalar>) -> Result<()> {
        let mut encoded = Vec::new();
        value.into().write_field(&mut encoded);
        self.write_field(Some(key), &encoded).map(drop)
    }

    pub fn insert_string(&mut self, value: &str) -> Result<()> {
        let mut encoded = Vec::new();
        codec::encode_string(value, &mut encoded);
        self.write_field(None, &encoded).map(drop)
    }

    pub fn insert_prop_string(&mut self, key: &str, value: &str) -> Result<()> {
        let mut encoded = Vec::new();
        codec::encode_string(value, &mut encoded);
        self.write_field(Some(key), &encoded).map(drop)
    }

    /// Inserts a blob whose media type is looked up from a file extension.
    pub fn insert_binary(&mut self, data: &[u8], ext: &str) -> Result<()> {
        self.insert_value(&Value::Binary(Binary::with_extension(data, ext)))
    }

    pub fn insert_prop_binary(&mut self, key: &str, data: &[u8], ext: &str) -> Result<()> {
        self.insert_prop_value(key, &Value::Binary(Binary::with_extension(data, ext)))
    }

    /// Inserts a blob tagged with an application-defined type name.
    pub fn insert_custom_binary(&mut self, data: &[u8], type_name: &str) -> Result<()> {
        if type_name.is_empty() {
            return Err(Error::null_argument("custom binary type name"));
        }
        self.insert_value(&Value::Binary(Binary::custom(data, type_name)))
    }

    pub fn insert_prop_custom_binary(
        &mut self,
        key: &str,
        data: &[u8],
        type_name: &str,
    ) -> Result<()> {
        if type_name.is_empty() {
            return Err(Error::null_argument("custom binary type name"));
        }
        self.insert_prop_value(key, &Value::Binary(Binary::custom(data, type_name)))
    }

    /// Inserts a whole value tree, tightly packed.
    pub fn insert_value(&mut self, value: &Value) -> Result<()> {
        if let Frame::Column { begin } = self.top()? {
            let scalar = value
                .as_scalar()
                .ok_or_else(|| Error::type_mismatch("column element", value.field_type()))?;
            return self.push_slot(begin, &scalar);
        }
        let mut encoded = Vec::new();
        codec::encode_value(value, &mut encoded)?;
        self.write_field(None, &encoded).map(drop)
    }

    pub fn insert_prop_value(&mut self, key: &str, value: &Value) -> Result<()> {
        let mut encoded = Vec::new();
        codec::encode_value(value, &mut encoded)?;
        self.write_field(Some(key), &encoded).map(drop)
    }

    fn begin_items(&mut self, key: Option<&str>, ty: FieldType, reserve: usize) -> Result<()> {
        if self.frames.len() >= codec::MAX_DEPTH {
            return Err(Error::StackOverflow(codec::MAX_DEPTH));
        }
        let end_marker = match ty {
            FieldType::Object(_) => marker::END_OBJECT,
            _ => marker::END_ARRAY,
        };
        let mut encoded = Vec::with_capacity(reserve + 2);
        encoded.push(ty.marker());
        encoded.resize(reserve + 1, marker::FREE);
        encoded.push(end_marker);
        let begin = self.write_field(key, &encoded)?;
        self.file.seek(begin + 1)?;
        self.frames.push(match ty {
            FieldType::Object(_) => Frame::Object { begin },
            _ => Frame::Array { begin },
        });
        Ok(())
    }

    /// Opens a nested array; inserts go into it until [`Inserter::end_array`].
    pub fn begin_array(&mut self, derivation: Derivation) -> Result<()> {
        self.begin_items(None, FieldType::Array(derivation), self.reservation.array)
    }

    pub fn begin_prop_array(&mut self, key: &str, derivation: Derivation) -> Result<()> {
        self.begin_items(Some(key), FieldType::Array(derivation), self.reservation.array)
    }

    pub fn begin_object(&mut self, derivation: Derivation) -> Result<()> {
        self.begin_items(None, FieldType::Object(derivation), self.reservation.object)
    }

    pub fn begin_prop_object(&mut self, key: &str, derivation: Derivation) -> Result<()> {
        self.begin_items(Some(key), FieldType::Object(derivation), self.reservation.object)
    }

    fn begin_column_field(
        &mut self,
        key: Option<&str>,
        ty: ColumnType,
        derivation: Derivation,
    ) -> Result<()> {
        let mut encoded = Vec::new();
        codec::encode_column(ty, derivation, &[], self.reservation.column, &mut encoded)?;
        let begin = self.write_field(key, &encoded)?;
        self.frames.push(Frame::Column { begin });
        Ok(())
    }

    /// Opens a nested column of `ty` elements.
    pub fn begin_column(&mut self, ty: ColumnType, derivation: Derivation) -> Result<()> {
        self.begin_column_field(None, ty, derivation)
    }

    pub fn begin_prop_column(
        &mut self,
        key: &str,
        ty: ColumnType,
        derivation: Derivation,
    ) -> Result<()> {
        self.begin_column_field(Some(key), ty, derivation)
    }

    fn pop(&mut self, expected: &str) -> Result<Frame> {
        if self.frames.len() < 2 {
            return Err(Error::StackUnderflow);
        }
        let top = self.top()?;
        let matches = match top {
            Frame::Array { .. } => expected == "array",
            Frame::Object { .. } => expected == "object",
            Frame::Column { .. } => expected == "column",
        };
        if !matches {
            return Err(Error::type_mismatch(format!("open {}", expected), top.name()));
        }
        self.frames.pop();
        Ok(top)
    }

    /// Drops the free space between the cursor and the end marker, then
    /// moves past the end marker.
    fn close_items(&mut self, end_marker: u8) -> Result<()> {
        let pos = self.file.tell();
        let bytes = self.file.bytes();
        let mut free = 0u64;
        loop {
            match codec::byte_at(bytes, pos + free)? {
                marker::FREE => free += 1,
                b if b == end_marker => break,
                other => {
                    return Err(Error::internal(format!(
                        "container closed at {} before marker 0x{:02x}",
                        pos + free,
                        other
                    )))
                }
            }
        }
        if free > 0 {
            self.file.inplace_remove(free)?;
        }
        self.file.seek(pos + 1)
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.pop("array")?;
        self.close_items(marker::END_ARRAY)
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.pop("object")?;
        self.close_items(marker::END_OBJECT)
    }

    /// Closes the current column, cutting its capacity to its element count.
    pub fn end_column(&mut self) -> Result<()> {
        let begin = match self.pop("column")? {
            Frame::Column { begin } => begin,
            other => return Err(Error::internal(format!("popped {}", other.name()))),
        };
        let header = ColumnHeader::read(self.file.bytes(), begin)?;
        if header.count < header.capacity {
            let unused = (header.capacity - header.count) * header.ty.width() as u64;
            self.file.seek(header.slot_offset(header.count))?;
            self.file.inplace_remove(unused)?;
            self.file.seek(header.capacity_offset)?;
            self.file.update_varuint(header.count)?;
        }
        let end = ColumnHeader::read(self.file.bytes(), begin)?.end();
        self.file.seek(end)
    }

    fn push_slot(&mut self, begin: u64, value: &Scalar) -> Result<()> {
        let mut header = ColumnHeader::read(self.file.bytes(), begin)?;
        let slot = header.ty.encode_slot(value)?;
        if header.count == header.capacity {
            self.grow_column(&header)?;
            header = ColumnHeader::read(self.file.bytes(), begin)?;
        }
        self.file.seek(header.slot_offset(header.count))?;
        self.file.write(&slot)?;
        self.file.seek(header.count_offset)?;
        self.file.update_varuint(header.count + 1)?;
        Ok(())
    }

    /// Grows a full column to `ceil((capacity + 1) * 1.7)` slots.
    fn grow_column(&mut self, header: &ColumnHeader) -> Result<()> {
        let capacity = ((header.capacity + 1) as f64 * GROWTH_FACTOR).ceil() as u64;
        let added = capacity - header.capacity;
        let width = header.ty.width() as u64;
        self.file.seek(header.end())?;
        self.file.inplace_insert(added * width)?;
        let fill = header.ty.null_sentinel().repeat(added as usize);
        self.file.write(&fill)?;
        self.file.seek(header.capacity_offset)?;
        self.file.update_varuint(capacity)?;
        self.column_growths += 1;
        debug!(
            target: "colbin::insert",
            offset = header.offset,
            from = header.capacity,
            to = capacity,
            "column reallocated"
        );
        Ok(())
    }

    /// Checks that every nested container was ended and returns the
    /// position after the last insert.
    pub fn finish(self) -> Result<u64> {
        if self.frames.len() != 1 {
            return Err(Error::internal(format!(
                "{} container(s) left open",
                self.frames.len() - 1
            )));
        }
        Ok(self.file.tell())
    }
}

/// Replaces the fixed-width value of `field`, in place when the encoded
/// kind is unchanged and by remove-then-reinsert otherwise. Returns the
/// location of the new field.
///
/// The reinsert shifts the tail by exactly the new field's length, so free
/// space reserved after `field` is left untouched and the document grows or
/// shrinks by the width difference.
pub(crate) fn overwrite_scalar(
    file: &mut MemFile<'_>,
    field: FieldRef,
    value: Scalar,
) -> Result<FieldRef> {
    let ty = value.field_type();
    if field.ty == ty && ty.is_fixed_width() {
        let mut encoded = Vec::with_capacity(value.field_len());
        value.write_field(&mut encoded);
        file.seek(field.payload())?;
        file.write(&encoded[1..])?;
        debug!(target: "colbin::update", offset = field.offset, "in place");
        return Ok(field);
    }
    debug!(
        target: "colbin::update",
        offset = field.offset,
        from = %field.ty,
        to = %ty,
        "remove and reinsert"
    );
    let mut encoded = Vec::with_capacity(value.field_len());
    value.write_field(&mut encoded);
    file.seek(field.offset)?;
    file.inplace_remove(field.len())?;
    file.inplace_insert(encoded.len() as u64)?;
    file.write(&encoded)?;
    file.seek(field.offset)?;
    FieldRef::at(file.bytes(), field.offset)
}
