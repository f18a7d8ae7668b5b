//! Sequential iteration over an encoded array.
//!
//! Iterators walk a container without decoding it: each step skips free
//! bytes, stops at the end marker or classifies the next live field and
//! computes its span. Values are decoded only when an accessor asks.
//!
//! Every iterator follows the same state machine:
//!
//! ```text
//! BeforeFirst --next()--> Positioned --next()--> ... --next()--> AtEnd
//! ```
//!
//! `next()` at `AtEnd` keeps returning `false`. Element accessors outside
//! `Positioned` fail with [`Error::NotPositioned`]. After [`ArrayIter::remove`]
//! or [`ArrayIter::insert_here`] the iterator sits before the element that now
//! occupies the affected offset, so the following `next()` yields it.

use crate::codec::{self, FieldRef};
use crate::column::ColumnIter;
use crate::field::{marker, Derivation, FieldType, Scalar};
use crate::insert::{Frame, Inserter};
use crate::memfile::MemFile;
use crate::object::ObjectIter;
use crate::value::Binary;
use crate::{Error, Result, Value};
use tracing::trace;

/// Coarse position of an iterator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterState {
    BeforeFirst,
    Positioned,
    AtEnd,
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    /// Before the element at or after this offset.
    Pending(u64),
    At(FieldRef),
    /// At the end marker, stored here.
    End(u64),
}

/// Outcome of scanning for the next live entry.
pub(crate) enum Scan<T> {
    Entry(T),
    End(u64),
}

/// Iterator over the fields of one array.
pub struct ArrayIter<'a> {
    file: MemFile<'a>,
    begin: u64,
    derivation: Derivation,
    cursor: Cursor,
}

impl<'a> ArrayIter<'a> {
    /// Opens the array whose begin marker is at the cursor's position.
    pub fn open(file: MemFile<'a>) -> Result<Self> {
        let begin = file.tell();
        let derivation = match codec::field_type_at(file.bytes(), begin)? {
            FieldType::Array(d) => d,
            other => return Err(Error::type_mismatch("array", other)),
        };
        Ok(ArrayIter {
            file,
            begin,
            derivation,
            cursor: Cursor::Pending(begin + 1),
        })
    }

    /// Offset of the begin marker.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.begin
    }

    #[must_use]
    pub fn derivation(&self) -> Derivation {
        self.derivation
    }

    #[must_use]
    pub fn state(&self) -> IterState {
        match self.cursor {
            Cursor::Pending(_) => IterState::BeforeFirst,
            Cursor::At(_) => IterState::Positioned,
            Cursor::End(_) => IterState::AtEnd,
        }
    }

    fn scan(&self, from: u64) -> Result<Scan<FieldRef>> {
        let bytes = self.file.bytes();
        let mut pos = from;
        loop {
            match codec::byte_at(bytes, pos)? {
                marker::FREE => pos += 1,
                marker::END_ARRAY => return Ok(Scan::End(pos)),
                _ => return FieldRef::at(bytes, pos).map(Scan::Entry),
            }
        }
    }

    fn resume_offset(&self) -> Option<u64> {
        match self.cursor {
            Cursor::Pending(pos) => Some(pos),
            Cursor::At(field) => Some(field.end),
            Cursor::End(_) => None,
        }
    }

    /// Advances to the next live field. Returns `false` at the end marker.
    pub fn next(&mut self) -> Result<bool> {
        let Some(from) = self.resume_offset() else {
            return Ok(false);
        };
        match self.scan(from)? {
            Scan::Entry(field) => {
                self.file.seek(field.offset)?;
                self.cursor = Cursor::At(field);
                Ok(true)
            }
            Scan::End(pos) => {
                self.file.seek(pos)?;
                self.cursor = Cursor::End(pos);
                Ok(false)
            }
        }
    }

    /// Whether another live field follows, without advancing.
    pub fn has_next(&self) -> Result<bool> {
        match self.resume_offset() {
            Some(from) => Ok(matches!(self.scan(from)?, Scan::Entry(_))),
            None => Ok(false),
        }
    }

    /// Back to `BeforeFirst`.
    pub fn rewind(&mut self) -> Result<()> {
        self.file.seek(self.begin + 1)?;
        self.cursor = Cursor::Pending(self.begin + 1);
        Ok(())
    }

    /// Moves to `AtEnd` and returns the offset right after the array.
    pub fn skip_remaining(&mut self) -> Result<u64> {
        while self.next()? {}
        match self.cursor {
            Cursor::End(pos) => Ok(pos + 1),
            _ => Err(Error::internal("array iterator stopped before its end")),
        }
    }

    pub(crate) fn current(&self) -> Result<FieldRef> {
        match self.cursor {
            Cursor::At(field) => Ok(field),
            _ => Err(Error::NotPositioned),
        }
    }

    pub fn current_field_type(&self) -> Result<FieldType> {
        Ok(self.current()?.ty)
    }

    pub fn bool_value(&self) -> Result<bool> {
        self.current()?.boolean(self.file.bytes())
    }

    /// The current unsigned integer, of any width.
    pub fn u64_value(&self) -> Result<u64> {
        self.current()?.unsigned(self.file.bytes())
    }

    /// The current signed integer, of any width.
    pub fn i64_value(&self) -> Result<i64> {
        self.current()?.signed(self.file.bytes())
    }

    pub fn float_value(&self) -> Result<f32> {
        self.current()?.float(self.file.bytes())
    }

    pub fn string_value(&self) -> Result<&str> {
        self.current()?.string(self.file.bytes())
    }

    pub fn binary_value(&self) -> Result<Binary> {
        self.current()?.binary(self.file.bytes())
    }

    /// The current fixed-width value.
    pub fn scalar(&self) -> Result<Scalar> {
        self.current()?.scalar(self.file.bytes())
    }

    /// Decodes the current field, including nested containers.
    pub fn current_value(&self) -> Result<Value> {
        self.current()?.value(self.file.bytes())
    }

    fn child_file(&mut self) -> Result<MemFile<'_>> {
        let field = self.current()?;
        let mut file = self.file.reborrow();
        file.seek(field.offset)?;
        Ok(file)
    }

    /// Iterates the current field, which must be an array.
    pub fn array_value(&mut self) -> Result<ArrayIter<'_>> {
        ArrayIter::open(self.child_file()?)
    }

    pub fn object_value(&mut self) -> Result<ObjectIter<'_>> {
        ObjectIter::open(self.child_file()?)
    }

    pub fn column_value(&mut self) -> Result<ColumnIter<'_>> {
        ColumnIter::open(self.child_file()?)
    }

    /// Like [`ArrayIter::array_value`], handing over this iterator's cursor.
    pub fn into_array(mut self) -> Result<ArrayIter<'a>> {
        let field = self.current()?;
        self.file.seek(field.offset)?;
        ArrayIter::open(self.file)
    }

    pub fn into_object(mut self) -> Result<ObjectIter<'a>> {
        let field = self.current()?;
        self.file.seek(field.offset)?;
        ObjectIter::open(self.file)
    }

    pub fn into_column(mut self) -> Result<ColumnIter<'a>> {
        let field = self.current()?;
        self.file.seek(field.offset)?;
        ColumnIter::open(self.file)
    }

    /// Removes the current field. The iterator then sits before the field
    /// that followed it.
    pub fn remove(&mut self) -> Result<()> {
        let field = self.current()?;
        self.file.seek(field.offset)?;
        self.file.inplace_remove(field.len())?;
        self.cursor = Cursor::Pending(field.offset);
        trace!(target: "colbin::array", offset = field.offset, len = field.len(), "field removed");
        Ok(())
    }

    /// Replaces the current fixed-width value, in place when its encoded
    /// kind does not change.
    pub fn set_current(&mut self, value: impl Into<Scalar>) -> Result<()> {
        let field = self.current()?;
        let updated = crate::insert::overwrite_scalar(&mut self.file, field, value.into())?;
        self.cursor = Cursor::At(updated);
        Ok(())
    }

    /// Opens an inserter at the current field, so new fields land in front
    /// of it. Before the first element it inserts at the front; at the end,
    /// after the last live field.
    pub fn insert_here(&mut self) -> Result<Inserter<'_>> {
        let pos = match self.cursor {
            Cursor::Pending(pos) => pos,
            Cursor::At(field) => field.offset,
            Cursor::End(_) => codec::items_end(self.file.bytes(), self.begin, false)?.last_live_end,
        };
        self.file.seek(pos)?;
        self.cursor = Cursor::Pending(pos);
        Ok(Inserter::new(
            self.file.reborrow(),
            Frame::Array { begin: self.begin },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::codec::decode_value;
    use crate::memfile::AccessMode;

    fn block_of(value: &Value) -> Block {
        let mut bytes = Vec::new();
        codec::encode_value(value, &mut bytes).unwrap();
        Block::from_bytes(bytes)
    }

    #[test]
    fn test_state_machine() {
        let block = block_of(&Value::array(vec![Value::from(1u8), Value::from("s")]));
        let mut it = ArrayIter::open(MemFile::open(&block)).unwrap();
        assert_eq!(it.state(), IterState::BeforeFirst);
        assert_eq!(it.current_value(), Err(Error::NotPositioned));

        assert!(it.next().unwrap());
        assert_eq!(it.state(), IterState::Positioned);
        assert_eq!(it.current_field_type().unwrap(), FieldType::U8);
        assert_eq!(it.u64_value().unwrap(), 1);
        assert!(matches!(it.i64_value(), Err(Error::TypeMismatch { .. })));
        assert!(it.has_next().unwrap());

        assert!(it.next().unwrap());
        assert_eq!(it.string_value().unwrap(), "s");
        assert!(!it.has_next().unwrap());

        assert!(!it.next().unwrap());
        assert_eq!(it.state(), IterState::AtEnd);
        assert!(!it.next().unwrap());
        assert_eq!(it.scalar(), Err(Error::NotPositioned));

        it.rewind().unwrap();
        assert!(it.next().unwrap());
        assert_eq!(it.scalar().unwrap(), Scalar::from(1u8));
    }

    #[test]
    fn test_skip_remaining_returns_end() {
        let block = block_of(&Value::array(vec![Value::Null, Value::Null]));
        let mut it = ArrayIter::open(MemFile::open(&block)).unwrap();
        assert_eq!(it.skip_remaining().unwrap(), 4);
        assert_eq!(it.state(), IterState::AtEnd);
    }

    #[test]
    fn test_remove_middle() {
        let mut block = block_of(&Value::array(vec![
            Value::Bool(true),
            Value::Null,
            Value::Bool(false),
        ]));
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ArrayIter::open(file).unwrap();
            it.next().unwrap();
            it.next().unwrap();
            it.remove().unwrap();
            assert!(it.next().unwrap());
            assert!(!it.bool_value().unwrap());
            assert!(!it.has_next().unwrap());
        }
        let mut it = ArrayIter::open(MemFile::open(&block)).unwrap();
        assert!(it.next().unwrap());
        assert!(it.next().unwrap());
        assert!(!it.has_next().unwrap());
        assert_eq!(block.as_bytes(), b"[tf]");
    }

    #[test]
    fn test_descend_into_nested() {
        let inner = Value::array(vec![Value::from(7i16)]);
        let block = block_of(&Value::array(vec![inner.clone(), Value::Null]));
        let mut it = ArrayIter::open(MemFile::open(&block)).unwrap();
        it.next().unwrap();
        {
            let mut child = it.array_value().unwrap();
            assert!(child.next().unwrap());
            assert_eq!(child.i64_value().unwrap(), 7);
        }
        assert!(matches!(
            it.object_value(),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(it.current_value().unwrap(), inner);
        assert!(it.next().unwrap());
        assert_eq!(it.current_field_type().unwrap(), FieldType::Null);
    }

    #[test]
    fn test_insert_here_goes_before_current() {
        let mut block = block_of(&Value::array(vec![Value::from(1u8), Value::from(3u8)]));
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ArrayIter::open(file).unwrap();
            it.next().unwrap();
            it.next().unwrap();
            it.insert_here().unwrap().insert(2u8).unwrap();
            assert!(it.next().unwrap());
            assert_eq!(it.u64_value().unwrap(), 2);
            assert!(it.next().unwrap());
            assert_eq!(it.u64_value().unwrap(), 3);
            assert!(!it.next().unwrap());
            it.insert_here().unwrap().insert(4u8).unwrap();
        }
        assert_eq!(decode_value(block.as_bytes(), 0).unwrap().0.to_string(), "[1, 2, 3, 4]");
    }

    #[test]
    fn test_set_current_widens() {
        let mut block = block_of(&Value::array(vec![Value::from(1u8), Value::Null]));
        let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        let mut it = ArrayIter::open(file).unwrap();
        it.next().unwrap();
        it.set_current(4u64).unwrap();
        assert_eq!(it.current_field_type().unwrap(), FieldType::U64);
        assert!(it.next().unwrap());
        assert_eq!(it.current_field_type().unwrap(), FieldType::Null);
    }

    #[test]
    fn test_not_an_array() {
        let block = block_of(&Value::Null);
        assert!(matches!(
            ArrayIter::open(MemFile::open(&block)),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
