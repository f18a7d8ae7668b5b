//! Wire Format
//!
//! This module documents the byte layout of a colbin document as written
//! and read by this library. It contains no code.
//!
//! # Overview
//!
//! A document is a single contiguous byte buffer: a short head followed by
//! one root container. Every field is self-describing, starting with a
//! one-byte marker, so a reader never needs a schema. Containers may carry
//! zero-filled free space, which lets inserts and updates happen in place.
//!
//! ```text
//! [key marker][key payload][commit hash: u64 LE][root container]
//! ```
//!
//! ## Integers
//!
//! Fixed-width numbers are little-endian. Lengths and counts are varuints:
//! unsigned LEB128, seven payload bits per byte, the high bit set on every
//! byte except the last. Writers emit the minimal form; readers accept any
//! form up to ten bytes.
//!
//! # Head
//!
//! | Marker | Key | Payload |
//! |--------|-----|---------|
//! | `?` | none | nothing |
//! | `*` | auto | u64 drawn from a process-wide counter |
//! | `+` | unsigned | u64 |
//! | `-` | signed | i64 |
//! | `!` | string | varuint length, UTF-8 bytes |
//!
//! The eight-byte commit hash follows the key. It starts at zero and grows by
//! one with every committed revision.
//!
//! # Scalars
//!
//! | Marker | Field | Payload |
//! |--------|-------|---------|
//! | `n` | null | nothing |
//! | `t` / `f` | true / false | nothing |
//! | `c` `d` `i` `l` | u8 u16 u32 u64 | 1, 2, 4, 8 bytes |
//! | `C` `D` `I` `L` | i8 i16 i32 i64 | 1, 2, 4, 8 bytes |
//! | `r` | float | f32, 4 bytes |
//! | `s` | string | varuint length, UTF-8 bytes |
//! | `b` | binary | varuint media type id, varuint length, bytes |
//! | `x` | custom binary | varuint name length, name, varuint length, bytes |
//!
//! Media type ids index [`crate::mime::MIME_TYPES`]; id 0 is
//! `application/octet-stream`.
//!
//! # Arrays and Objects
//!
//! The begin marker encodes the container's derivation:
//!
//! | Derivation | Array | Object |
//! |------------|-------|--------|
//! | unsorted multiset | `[` | `{` |
//! | sorted multiset | `0x80` | `0x83` |
//! | unsorted set | `0x81` | `0x84` |
//! | sorted set | `0x82` | `0x85` |
//!
//! Arrays end with `]`, objects with `}`. Between the markers, items follow
//! one another, interleaved with any number of `0x00` bytes of free space.
//! An object item is a key followed by a field:
//!
//! ```text
//! { [varuint key length][key bytes][field] ... 00 00 }
//! ```
//!
//! Keys are never empty, so a key length never reads as free space. A key of
//! exactly 125 bytes would have a length byte equal to `}`; its length is
//! written in the padded two-byte form `0xfd 0x00` instead.
//!
//! # Columns
//!
//! A column is a packed run of fixed-width slots of one element type:
//!
//! ```text
//! [marker][varuint count][varuint capacity][slot 0]...[slot capacity-1]
//! ```
//!
//! The marker is `0x90 + 4 * element + derivation`, with elements numbered
//! u8, u16, u32, u64, i8, i16, i32, i64, float, boolean (0 through 9) and
//! derivations numbered as in the table above (0 through 3). A default u64
//! column therefore starts with `0x9c`.
//!
//! Slots past `count` are unused capacity and hold the null sentinel. A slot
//! holding its type's sentinel reads back as null:
//!
//! | Element | Width | Null sentinel |
//! |---------|-------|---------------|
//! | unsigned | 1, 2, 4, 8 | all bits set |
//! | signed | 1, 2, 4, 8 | minimum value |
//! | float | 4 | quiet NaN (any NaN reads as null) |
//! | boolean | 1 | `0x02` |
//!
//! The sentinel is therefore not a storable value: writing `u8::MAX`,
//! `i64::MIN` or a NaN into a column of that type is a type mismatch.
//!
//! Columns never carry free space of their own. When a full column grows,
//! it is reallocated with `ceil((capacity + 1) * 1.7)` slots, so n appends
//! cost O(log n) reallocations.
//!
//! # Free Space
//!
//! Zero is never a marker, so inside arrays and objects a `0x00` byte can
//! only be free space. Readers skip it. Newly opened containers reserve some
//! free space (see [`crate::DocOptions`]); inserts consume it before they
//! shift the rest of the document, and [`crate::Document::shrink`] drops
//! whatever is left.
//!
//! # Nesting
//!
//! Arrays and objects nest at most [`crate::codec::MAX_DEPTH`] levels deep.
//! Deeper input is reported as corruption at the first container past the
//! limit.
