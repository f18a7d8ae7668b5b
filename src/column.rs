//! Indexed access to an encoded column.
//!
//! A column has no per-element markers: its header records the element type,
//! the live element count and the slot capacity, and every slot has the same
//! width. The iterator therefore reads any slot in O(1) with [`ColumnIter::at`]
//! and walks the live slots `0..value_count()` with the same state machine as
//! [`crate::ArrayIter`]. Slots holding the element type's null sentinel read
//! back as [`Scalar::Null`].

use crate::array::IterState;
use crate::codec::ColumnHeader;
use crate::field::{ColumnType, Derivation, FieldType, Scalar};
use crate::memfile::MemFile;
use crate::{Error, Result, Value};
use tracing::trace;

#[derive(Clone, Copy, Debug)]
enum Cursor {
    /// Before the slot with this index.
    Pending(u64),
    At(u64),
    End,
}

/// Iterator over the live slots of one column.
pub struct ColumnIter<'a> {
    file: MemFile<'a>,
    header: ColumnHeader,
    cursor: Cursor,
}

impl<'a> ColumnIter<'a> {
    /// Opens the column whose marker is at the cursor's position.
    pub fn open(file: MemFile<'a>) -> Result<Self> {
        let header = ColumnHeader::read(file.bytes(), file.tell())?;
        Ok(ColumnIter {
            file,
            header,
            cursor: Cursor::Pending(0),
        })
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.header.offset
    }

    /// Number of live elements.
    #[must_use]
    pub fn value_count(&self) -> u64 {
        self.header.count
    }

    /// Number of allocated slots, live or not.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.header.capacity
    }

    #[must_use]
    pub fn element_type(&self) -> ColumnType {
        self.header.ty
    }

    #[must_use]
    pub fn derivation(&self) -> Derivation {
        self.header.derivation
    }

    #[must_use]
    pub fn state(&self) -> IterState {
        match self.cursor {
            Cursor::Pending(_) => IterState::BeforeFirst,
            Cursor::At(_) => IterState::Positioned,
            Cursor::End => IterState::AtEnd,
        }
    }

    fn next_index(&self) -> Option<u64> {
        match self.cursor {
            Cursor::Pending(i) => Some(i),
            Cursor::At(i) => Some(i + 1),
            Cursor::End => None,
        }
    }

    pub fn next(&mut self) -> Result<bool> {
        match self.next_index() {
            Some(i) if i < self.header.count => {
                self.cursor = Cursor::At(i);
                Ok(true)
            }
            _ => {
                self.cursor = Cursor::End;
                Ok(false)
            }
        }
    }

    pub fn has_next(&self) -> Result<bool> {
        Ok(matches!(self.next_index(), Some(i) if i < self.header.count))
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.cursor = Cursor::Pending(0);
        Ok(())
    }

    /// Moves to `AtEnd` and returns the offset right after the last slot.
    pub fn skip_remaining(&mut self) -> Result<u64> {
        self.cursor = Cursor::End;
        Ok(self.header.end())
    }

    /// Positions the iterator on slot `index`. Returns `false`, leaving the
    /// iterator at its end, when the column has no such element.
    pub fn seek_index(&mut self, index: u64) -> Result<bool> {
        if index < self.header.count {
            self.cursor = Cursor::At(index);
            Ok(true)
        } else {
            self.cursor = Cursor::End;
            Ok(false)
        }
    }

    /// Index of the current slot.
    pub fn index(&self) -> Result<u64> {
        match self.cursor {
            Cursor::At(i) => Ok(i),
            _ => Err(Error::NotPositioned),
        }
    }

    /// Reads slot `index` directly, whatever the iterator's position.
    pub fn at(&self, index: u64) -> Result<Scalar> {
        self.header.slot(self.file.bytes(), index)
    }

    /// The current slot's value.
    pub fn scalar(&self) -> Result<Scalar> {
        self.at(self.index()?)
    }

    /// Kind of the current value: `Null` for a sentinel slot, `True` or
    /// `False` in boolean columns, the element type's number kind otherwise.
    pub fn current_field_type(&self) -> Result<FieldType> {
        Ok(self.scalar()?.field_type())
    }

    pub fn bool_value(&self) -> Result<bool> {
        self.scalar()?.to_bool()
    }

    pub fn u64_value(&self) -> Result<u64> {
        self.scalar()?.to_unsigned()
    }

    pub fn i64_value(&self) -> Result<i64> {
        self.scalar()?.to_signed()
    }

    pub fn float_value(&self) -> Result<f32> {
        self.scalar()?.to_float()
    }

    pub fn current_value(&self) -> Result<Value> {
        Ok(self.scalar()?.into())
    }

    /// Overwrites slot `index`. The value must have the element type or be
    /// null.
    pub fn set(&mut self, index: u64, value: impl Into<Scalar>) -> Result<()> {
        if index >= self.header.count {
            return Err(Error::out_of_bounds(index, 1, self.header.count));
        }
        let slot = self.header.ty.encode_slot(&value.into())?;
        self.file.seek(self.header.slot_offset(index))?;
        self.file.write(&slot)?;
        trace!(target: "colbin::column", offset = self.header.offset, index, "slot set");
        Ok(())
    }

    pub fn set_current(&mut self, value: impl Into<Scalar>) -> Result<()> {
        self.set(self.index()?, value)
    }

    /// Removes the current element; the iterator then sits before the
    /// element that took its index.
    pub fn remove(&mut self) -> Result<()> {
        self.remove_at(self.index()?)
    }

    /// Removes element `index`. Later elements move one slot down, the freed
    /// tail slot gets the null sentinel and the count shrinks by one.
    pub fn remove_at(&mut self, index: u64) -> Result<()> {
        let header = self.header;
        if index >= header.count {
            return Err(Error::out_of_bounds(index, 1, header.count));
        }
        let width = header.ty.width() as u64;
        let from = header.slot_offset(index + 1);
        let tail = header.slot_offset(header.count) - from;
        let moved = self.file.bytes_at(from, tail)?.to_vec();
        self.file.seek(header.slot_offset(index))?;
        self.file.write(&moved)?;
        self.file.write(header.ty.null_sentinel())?;
        let live_end = header.slot_offset(header.count);
        if self.file.tell() != live_end {
            return Err(Error::internal(format!(
                "column remove stopped at {} instead of {}",
                self.file.tell(),
                live_end
            )));
        }
        self.file.seek(header.count_offset)?;
        self.file.update_varuint(header.count - 1)?;
        self.header = ColumnHeader::read(self.file.bytes(), header.offset)?;
        self.cursor = match self.cursor {
            Cursor::At(i) | Cursor::Pending(i) if i == index => Cursor::Pending(index),
            Cursor::At(i) if i > index => Cursor::At(i - 1),
            Cursor::Pending(i) if i > index => Cursor::Pending(i - 1),
            other => other,
        };
        trace!(target: "colbin::column", offset = header.offset, index, width, "slot removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::codec::{self, decode_value};
    use crate::memfile::AccessMode;

    fn column_block(ty: ColumnType, items: &[Scalar], capacity: u64) -> Block {
        let mut bytes = Vec::new();
        codec::encode_column(ty, Derivation::UnsortedMultiset, items, capacity, &mut bytes).unwrap();
        Block::from_bytes(bytes)
    }

    #[test]
    fn test_indexed_access() {
        let block = column_block(
            ColumnType::I16,
            &[Scalar::from(-3i16), Scalar::Null, Scalar::from(9i16)],
            5,
        );
        let it = ColumnIter::open(MemFile::open(&block)).unwrap();
        assert_eq!(it.value_count(), 3);
        assert_eq!(it.capacity(), 5);
        assert_eq!(it.element_type(), ColumnType::I16);
        assert_eq!(it.at(2).unwrap(), Scalar::from(9i16));
        assert_eq!(it.at(1).unwrap(), Scalar::Null);
        assert!(matches!(it.at(3), Err(Error::OutOfBounds { .. })));
        assert_eq!(it.scalar(), Err(Error::NotPositioned));
    }

    #[test]
    fn test_iteration_and_field_types() {
        let block = column_block(
            ColumnType::Bool,
            &[Scalar::Bool(true), Scalar::Null, Scalar::Bool(false)],
            3,
        );
        let mut it = ColumnIter::open(MemFile::open(&block)).unwrap();
        let mut kinds = Vec::new();
        while it.next().unwrap() {
            kinds.push(it.current_field_type().unwrap());
        }
        assert_eq!(kinds, vec![FieldType::True, FieldType::Null, FieldType::False]);
        assert_eq!(it.state(), IterState::AtEnd);
        assert!(!it.next().unwrap());
        assert_eq!(it.skip_remaining().unwrap(), block.used() as u64);
    }

    #[test]
    fn test_set_checks_element_type() {
        let mut block = column_block(ColumnType::U8, &[Scalar::from(1u8)], 2);
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ColumnIter::open(file).unwrap();
            it.set(0, 200u8).unwrap();
            assert!(matches!(it.set(0, 200u16), Err(Error::TypeMismatch { .. })));
            assert!(matches!(it.set(1, 1u8), Err(Error::OutOfBounds { .. })));
            assert!(it.next().unwrap());
            it.set_current(None::<u8>).unwrap();
            assert_eq!(it.current_field_type().unwrap(), FieldType::Null);
        }
        assert_eq!(block.as_bytes(), &[0x90, 1, 2, 0xff, 0xff]);
    }

    #[test]
    fn test_remove_shifts_slots() {
        let items: Vec<Scalar> = (1..=4u32).map(Scalar::from).collect();
        let mut block = column_block(ColumnType::U32, &items, 4);
        let before = block.used();
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ColumnIter::open(file).unwrap();
            it.next().unwrap();
            it.next().unwrap();
            it.remove().unwrap();
            assert_eq!(it.state(), IterState::BeforeFirst);
            assert!(it.next().unwrap());
            assert_eq!(it.u64_value().unwrap(), 3);
            assert_eq!(it.value_count(), 3);
            assert_eq!(it.capacity(), 4);
        }
        assert_eq!(block.used(), before);
        let (value, _) = decode_value(block.as_bytes(), 0).unwrap();
        assert_eq!(value.to_string(), "[1, 3, 4]");
        assert_eq!(&block.as_bytes()[block.used() - 4..], &[0xff; 4]);
    }

    #[test]
    fn test_remove_shrinking_count_width() {
        let items: Vec<Scalar> = (0..128u8).map(Scalar::from).collect();
        let mut block = column_block(ColumnType::U8, &items, 128);
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ColumnIter::open(file).unwrap();
            it.remove_at(0).unwrap();
            assert_eq!(it.value_count(), 127);
            assert_eq!(it.at(0).unwrap(), Scalar::from(1u8));
            assert_eq!(it.at(126).unwrap(), Scalar::from(127u8));
        }
        // count varuint went from two bytes to one
        assert_eq!(block.used(), 1 + 1 + 2 + 128);
    }

    #[test]
    fn test_remove_last_slots_of_full_column() {
        let items = [Scalar::from(7u16), Scalar::from(8u16)];
        let mut block = column_block(ColumnType::U16, &items, 2);
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ColumnIter::open(file).unwrap();
            it.remove_at(1).unwrap();
            assert_eq!(it.value_count(), 1);
            it.remove_at(0).unwrap();
            assert_eq!(it.value_count(), 0);
            assert!(matches!(it.remove_at(0), Err(Error::OutOfBounds { .. })));
            assert!(!it.next().unwrap());
        }
        assert_eq!(block.as_bytes(), &[0x94, 0, 2, 0xff, 0xff, 0xff, 0xff]);
    }
}
