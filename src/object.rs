//! Sequential iteration over an encoded object.
//!
//! Same state machine as [`crate::ArrayIter`]; every entry is a key followed
//! by its value field. Keys may repeat unless the object's derivation says
//! otherwise.

use crate::array::{ArrayIter, IterState, Scan};
use crate::codec::{self, FieldRef};
use crate::column::ColumnIter;
use crate::field::{marker, Derivation, FieldType, Scalar};
use crate::insert::{Frame, Inserter};
use crate::memfile::MemFile;
use crate::value::Binary;
use crate::{Error, Result, Value};
use tracing::trace;

/// One key/value entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Prop {
    /// Offset of the key's length prefix.
    pub key: u64,
    pub value: FieldRef,
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    Pending(u64),
    At(Prop),
    End(u64),
}

/// Iterator over the properties of one object.
pub struct ObjectIter<'a> {
    file: MemFile<'a>,
    begin: u64,
    derivation: Derivation,
    cursor: Cursor,
}

impl<'a> ObjectIter<'a> {
    /// Opens the object whose begin marker is at the cursor's position.
    pub fn open(file: MemFile<'a>) -> Result<Self> {
        let begin = file.tell();
        let derivation = match codec::field_type_at(file.bytes(), begin)? {
            FieldType::Object(d) => d,
            other => return Err(Error::type_mismatch("object", other)),
        };
        Ok(ObjectIter {
            file,
            begin,
            derivation,
            cursor: Cursor::Pending(begin + 1),
        })
    }

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

    fn scan(&self, from: u64) -> Result<Scan<Prop>> {
        let bytes = self.file.bytes();
        let mut pos = from;
        loop {
            match codec::byte_at(bytes, pos)? {
                marker::FREE => pos += 1,
                marker::END_OBJECT => return Ok(Scan::End(pos)),
                _ => {
                    let value = FieldRef::at(bytes, codec::key_end(bytes, pos)?)?;
                    return Ok(Scan::Entry(Prop { key: pos, value }));
                }
            }
        }
    }

    fn resume_offset(&self) -> Option<u64> {
        match self.cursor {
            Cursor::Pending(pos) => Some(pos),
            Cursor::At(prop) => Some(prop.value.end),
            Cursor::End(_) => None,
        }
    }

    pub fn next(&mut self) -> Result<bool> {
        let Some(from) = self.resume_offset() else {
            return Ok(false);
        };
        match self.scan(from)? {
            Scan::Entry(prop) => {
                self.file.seek(prop.key)?;
                self.cursor = Cursor::At(prop);
                Ok(true)
            }
            Scan::End(pos) => {
                self.file.seek(pos)?;
                self.cursor = Cursor::End(pos);
                Ok(false)
            }
        }
    }

    pub fn has_next(&self) -> Result<bool> {
        match self.resume_offset() {
            Some(from) => Ok(matches!(self.scan(from)?, Scan::Entry(_))),
            None => Ok(false),
        }
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.file.seek(self.begin + 1)?;
        self.cursor = Cursor::Pending(self.begin + 1);
        Ok(())
    }

    /// Moves to `AtEnd` and returns the offset right after the object.
    pub fn skip_remaining(&mut self) -> Result<u64> {
        while self.next()? {}
        match self.cursor {
            Cursor::End(pos) => Ok(pos + 1),
            _ => Err(Error::internal("object iterator stopped before its end")),
        }
    }

    pub(crate) fn current_prop(&self) -> Result<Prop> {
        match self.cursor {
            Cursor::At(prop) => Ok(prop),
            _ => Err(Error::NotPositioned),
        }
    }

    pub(crate) fn current(&self) -> Result<FieldRef> {
        Ok(self.current_prop()?.value)
    }

    /// Key of the current property.
    pub fn key(&self) -> Result<&str> {
        let prop = self.current_prop()?;
        Ok(codec::read_str(self.file.bytes(), prop.key)?.0)
    }

    /// Advances to the first property after the current position whose key
    /// equals `key`. Returns `false`, at `AtEnd`, when there is none.
    pub fn seek_key(&mut self, key: &str) -> Result<bool> {
        while self.next()? {
            if self.key()? == key {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn current_field_type(&self) -> Result<FieldType> {
        Ok(self.current()?.ty)
    }

    pub fn bool_value(&self) -> Result<bool> {
        self.current()?.boolean(self.file.bytes())
    }

    pub fn u64_value(&self) -> Result<u64> {
        self.current()?.unsigned(self.file.bytes())
    }

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

    pub fn scalar(&self) -> Result<Scalar> {
        self.current()?.scalar(self.file.bytes())
    }

    pub fn current_value(&self) -> Result<Value> {
        self.current()?.value(self.file.bytes())
    }

    fn child_file(&mut self) -> Result<MemFile<'_>> {
        let field = self.current()?;
        let mut file = self.file.reborrow();
        file.seek(field.offset)?;
        Ok(file)
    }

    pub fn array_value(&mut self) -> Result<ArrayIter<'_>> {
        ArrayIter::open(self.child_file()?)
    }

    pub fn object_value(&mut self) -> Result<ObjectIter<'_>> {
        ObjectIter::open(self.child_file()?)
    }

    pub fn column_value(&mut self) -> Result<ColumnIter<'_>> {
        ColumnIter::open(self.child_file()?)
    }

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

    /// Removes the current property, key and value.
    pub fn remove(&mut self) -> Result<()> {
        let prop = self.current_prop()?;
        let len = prop.value.end - prop.key;
        self.file.seek(prop.key)?;
        self.file.inplace_remove(len)?;
        self.cursor = Cursor::Pending(prop.key);
        trace!(target: "colbin::object", offset = prop.key, len, "property removed");
        Ok(())
    }

    /// Replaces the current property's fixed-width value; the key stays.
    pub fn set_current(&mut self, value: impl Into<Scalar>) -> Result<()> {
        let prop = self.current_prop()?;
        let value = crate::insert::overwrite_scalar(&mut self.file, prop.value, value.into())?;
        self.cursor = Cursor::At(Prop { key: prop.key, value });
        Ok(())
    }

    /// Opens an inserter in front of the current property (see
    /// [`ArrayIter::insert_here`]). Inserts need the `*_prop` variants.
    pub fn insert_here(&mut self) -> Result<Inserter<'_>> {
        let pos = match self.cursor {
            Cursor::Pending(pos) => pos,
            Cursor::At(prop) => prop.key,
            Cursor::End(_) => codec::items_end(self.file.bytes(), self.begin, true)?.last_live_end,
        };
        self.file.seek(pos)?;
        self.cursor = Cursor::Pending(pos);
        Ok(Inserter::new(
            self.file.reborrow(),
            Frame::Object { begin: self.begin },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::codec::decode_value;
    use crate::memfile::AccessMode;
    use crate::DocMap;

    fn block_of(pairs: &[(&str, Value)]) -> Block {
        let mut map = DocMap::new();
        for (k, v) in pairs {
            map.insert(*k, v.clone());
        }
        let mut bytes = Vec::new();
        codec::encode_value(&Value::object(map), &mut bytes).unwrap();
        Block::from_bytes(bytes)
    }

    #[test]
    fn test_keys_and_values() {
        let block = block_of(&[
            ("a", Value::from(1u8)),
            ("b", Value::from("two")),
            ("a", Value::from(3i8)),
        ]);
        let mut it = ObjectIter::open(MemFile::open(&block)).unwrap();
        assert_eq!(it.key(), Err(Error::NotPositioned));
        assert!(it.next().unwrap());
        assert_eq!(it.key().unwrap(), "a");
        assert_eq!(it.u64_value().unwrap(), 1);
        assert!(it.next().unwrap());
        assert_eq!(it.key().unwrap(), "b");
        assert_eq!(it.string_value().unwrap(), "two");
        assert!(it.seek_key("a").unwrap());
        assert_eq!(it.i64_value().unwrap(), 3);
        assert!(!it.has_next().unwrap());
        assert!(!it.next().unwrap());
        assert_eq!(it.state(), IterState::AtEnd);
    }

    #[test]
    fn test_remove_property() {
        let mut block = block_of(&[("x", Value::Null), ("y", Value::from(true))]);
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ObjectIter::open(file).unwrap();
            it.next().unwrap();
            it.remove().unwrap();
            assert!(it.next().unwrap());
            assert_eq!(it.key().unwrap(), "y");
        }
        assert_eq!(block.as_bytes(), &[b'{', 1, b'y', b't', b'}']);
    }

    #[test]
    fn test_insert_here_requires_keys() {
        let mut block = block_of(&[("b", Value::from(2u8))]);
        {
            let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            let mut it = ObjectIter::open(file).unwrap();
            let mut ins = it.insert_here().unwrap();
            assert!(matches!(ins.insert(1u8), Err(Error::NullArgument(_))));
            ins.insert_prop("a", 1u8).unwrap();
        }
        assert_eq!(
            decode_value(block.as_bytes(), 0).unwrap().0.to_string(),
            r#"{"a": 1, "b": 2}"#
        );
    }

    #[test]
    fn test_set_current_keeps_key() {
        let mut block = block_of(&[("k", Value::from("text"))]);
        let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        let mut it = ObjectIter::open(file).unwrap();
        it.next().unwrap();
        it.set_current(false).unwrap();
        assert_eq!(it.key().unwrap(), "k");
        assert!(!it.bool_value().unwrap());
        assert!(!it.next().unwrap());
    }
}
