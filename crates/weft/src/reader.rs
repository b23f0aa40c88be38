//! The pull half of the event model.
//!
//! A [`Reader`] wraps a parser and buffers exactly one peeked item.
//! Predicates (`has_*`) inspect without consuming; consumers (`read_*`)
//! assert the kind and advance. Tags are transparent: every predicate and
//! consumer other than the tag accessors silently steps over pending `Tag`
//! items, so decoders that do not care about tags never see them.

use crate::error::{Error, Position, Result};
use crate::item::{Item, Target};
use crate::receiver::Parser;

/// Size information of a just-opened container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Definite container with the announced element count.
    Counted(u64),
    /// Indefinite container, terminated by a break.
    Unbounded,
}

impl Bound {
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Bound::Unbounded)
    }
}

pub struct Reader<P: Parser> {
    parser: P,
    next: Item,
    next_pos: Position,
}

impl<P: Parser> Reader<P> {
    pub fn new(mut parser: P) -> Result<Self> {
        let next = parser.pull()?;
        let next_pos = parser.position();
        Ok(Self {
            parser,
            next,
            next_pos,
        })
    }

    /// The format being read.
    #[must_use]
    pub fn target(&self) -> Target {
        self.parser.target()
    }

    /// Position of the buffered item.
    #[must_use]
    pub fn position(&self) -> Position {
        self.next_pos
    }

    /// The buffered item, tags included.
    #[must_use]
    pub fn peek(&self) -> &Item {
        &self.next
    }

    /// Consumes and returns the buffered item, pulling the next one.
    pub fn pull(&mut self) -> Result<Item> {
        let item = self.parser.pull()?;
        let pos = self.parser.position();
        self.next_pos = pos;
        Ok(core::mem::replace(&mut self.next, item))
    }

    #[inline]
    fn skip_tags(&mut self) -> Result<()> {
        while matches!(self.next, Item::Tag(_)) {
            self.pull()?;
        }
        Ok(())
    }

    /// Builds the standard "cannot consume this item" error for the buffered
    /// item.
    pub fn unexpected_data_item(&self, expected: &str) -> Error {
        Error::unexpected_item(
            self.next_pos,
            format!("expected {expected} but got {}", self.next.kind_name()),
        )
    }

    /// An [`Error::InvalidInputData`] at the current position, for decoders
    /// that reject a well-typed but out-of-range value.
    pub fn invalid_data(&self, msg: impl Into<String>) -> Error {
        Error::invalid_input(self.next_pos, msg)
    }

    /// Wraps a user-level codec failure with the current position.
    pub fn codec_error(&self, msg: impl Into<String>) -> Error {
        Error::general(self.next_pos, msg)
    }

    // --- predicates -----------------------------------------------------

    pub fn has_null(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Null))
    }

    pub fn has_undefined(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Undefined))
    }

    pub fn has_bool(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Bool(_)))
    }

    pub fn has_int(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Int(_)))
    }

    /// True for any event a signed 64-bit decoder can widen from.
    pub fn has_long(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Int(_) | Item::Long(_)))
    }

    pub fn has_over_long(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::OverLong { .. }))
    }

    pub fn has_float16(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Float16(_)))
    }

    pub fn has_float(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Float16(_) | Item::Float(_)))
    }

    pub fn has_double(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(
            self.next,
            Item::Float16(_) | Item::Float(_) | Item::Double(_)
        ))
    }

    pub fn has_number_string(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::NumberString(_)))
    }

    pub fn has_string(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Str(_) | Item::TextStart))
    }

    pub fn has_bytes(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Bytes(_) | Item::BytesStart))
    }

    pub fn has_array_header(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::ArrayHeader(_)))
    }

    pub fn has_array_start(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::ArrayStart))
    }

    pub fn has_array(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::ArrayHeader(_) | Item::ArrayStart))
    }

    pub fn has_map_header(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::MapHeader(_)))
    }

    pub fn has_map_start(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::MapStart))
    }

    pub fn has_map(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::MapHeader(_) | Item::MapStart))
    }

    pub fn has_tag(&mut self) -> bool {
        matches!(self.next, Item::Tag(_))
    }

    pub fn has_tag_of(&mut self, tag: u64) -> bool {
        matches!(self.next, Item::Tag(t) if t == tag)
    }

    pub fn has_simple(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Simple(_)))
    }

    pub fn has_break(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::Break))
    }

    pub fn has_end_of_input(&mut self) -> Result<bool> {
        self.skip_tags()?;
        Ok(matches!(self.next, Item::EndOfInput))
    }

    // --- consumers ------------------------------------------------------

    pub fn read_null(&mut self) -> Result<()> {
        self.skip_tags()?;
        match self.next {
            Item::Null => self.pull().map(|_| ()),
            _ => Err(self.unexpected_data_item("Null")),
        }
    }

    pub fn read_undefined(&mut self) -> Result<()> {
        self.skip_tags()?;
        match self.next {
            Item::Undefined => self.pull().map(|_| ()),
            _ => Err(self.unexpected_data_item("Undefined")),
        }
    }

    /// Consumes a `Null`, returning whether one was present.
    pub fn try_read_null(&mut self) -> Result<bool> {
        self.skip_tags()?;
        if matches!(self.next, Item::Null) {
            self.pull()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.skip_tags()?;
        match self.next {
            Item::Bool(b) => {
                self.pull()?;
                Ok(b)
            }
            _ => Err(self.unexpected_data_item("Bool")),
        }
    }

    pub fn read_int(&mut self) -> Result<i32> {
        self.skip_tags()?;
        match self.next {
            Item::Int(i) => {
                self.pull()?;
                Ok(i)
            }
            _ => Err(self.unexpected_data_item("Int")),
        }
    }

    /// Reads a signed 64-bit integer, widening from `Int`.
    pub fn read_long(&mut self) -> Result<i64> {
        self.skip_tags()?;
        match self.next {
            Item::Int(i) => {
                self.pull()?;
                Ok(i64::from(i))
            }
            Item::Long(l) => {
                self.pull()?;
                Ok(l)
            }
            _ => Err(self.unexpected_data_item("Int or Long")),
        }
    }

    /// Reads an unsigned 64-bit integer, widening from `Int`/`Long` and
    /// accepting non-negative `OverLong`.
    pub fn read_unsigned_long(&mut self) -> Result<u64> {
        self.skip_tags()?;
        match self.next {
            Item::Int(i) if i >= 0 => {
                self.pull()?;
                Ok(i as u64)
            }
            Item::Long(l) if l >= 0 => {
                self.pull()?;
                Ok(l as u64)
            }
            Item::OverLong {
                negative: false,
                raw,
            } => {
                self.pull()?;
                Ok(raw)
            }
            _ => Err(self.unexpected_data_item("non-negative integer")),
        }
    }

    pub fn read_over_long(&mut self) -> Result<(bool, u64)> {
        self.skip_tags()?;
        match self.next {
            Item::OverLong { negative, raw } => {
                self.pull()?;
                Ok((negative, raw))
            }
            _ => Err(self.unexpected_data_item("OverLong")),
        }
    }

    pub fn read_float16(&mut self) -> Result<f32> {
        self.skip_tags()?;
        match self.next {
            Item::Float16(f) => {
                self.pull()?;
                Ok(f)
            }
            _ => Err(self.unexpected_data_item("Float16")),
        }
    }

    /// Reads a 32-bit float, widening from `Float16` and exact integers.
    pub fn read_float(&mut self) -> Result<f32> {
        self.skip_tags()?;
        match self.next {
            Item::Float16(f) | Item::Float(f) => {
                self.pull()?;
                Ok(f)
            }
            Item::Int(i) => {
                self.pull()?;
                Ok(i as f32)
            }
            Item::Long(l) => {
                self.pull()?;
                Ok(l as f32)
            }
            _ => Err(self.unexpected_data_item("Float")),
        }
    }

    /// Reads a 64-bit float, widening from every numeric event. A
    /// `NumberString` lexeme is parsed, potentially with rounding.
    pub fn read_double(&mut self) -> Result<f64> {
        self.skip_tags()?;
        match &self.next {
            Item::Float16(f) | Item::Float(f) => {
                let f = *f;
                self.pull()?;
                Ok(f64::from(f))
            }
            Item::Double(d) => {
                let d = *d;
                self.pull()?;
                Ok(d)
            }
            Item::Int(i) => {
                let i = *i;
                self.pull()?;
                Ok(f64::from(i))
            }
            Item::Long(l) => {
                let l = *l;
                self.pull()?;
                Ok(l as f64)
            }
            Item::NumberString(s) => {
                let parsed = s
                    .parse::<f64>()
                    .map_err(|_| self.invalid_data(format!("`{s}` is not a valid number")))?;
                self.pull()?;
                Ok(parsed)
            }
            _ => Err(self.unexpected_data_item("Double")),
        }
    }

    pub fn read_number_string(&mut self) -> Result<String> {
        self.skip_tags()?;
        match self.next {
            Item::NumberString(_) => match self.pull()? {
                Item::NumberString(s) => Ok(s),
                _ => unreachable!(),
            },
            _ => Err(self.unexpected_data_item("NumberString")),
        }
    }

    /// Reads a text string. A chunked text string is concatenated into one
    /// value.
    pub fn read_string(&mut self) -> Result<String> {
        self.skip_tags()?;
        match self.next {
            Item::Str(_) => match self.pull()? {
                Item::Str(s) => Ok(s),
                _ => unreachable!(),
            },
            Item::TextStart => {
                self.pull()?;
                let mut merged = String::new();
                loop {
                    match self.pull()? {
                        Item::Str(chunk) => merged.push_str(&chunk),
                        Item::Break => return Ok(merged),
                        _ => return Err(self.unexpected_data_item("text chunk or Break")),
                    }
                }
            }
            _ => Err(self.unexpected_data_item("String")),
        }
    }

    /// Reads a byte string. A chunked byte string is concatenated into one
    /// value.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.skip_tags()?;
        match self.next {
            Item::Bytes(_) => match self.pull()? {
                Item::Bytes(b) => Ok(b),
                _ => unreachable!(),
            },
            Item::BytesStart => {
                self.pull()?;
                let mut merged = Vec::new();
                loop {
                    match self.pull()? {
                        Item::Bytes(chunk) => merged.extend_from_slice(&chunk),
                        Item::Break => return Ok(merged),
                        _ => return Err(self.unexpected_data_item("byte chunk or Break")),
                    }
                }
            }
            _ => Err(self.unexpected_data_item("Bytes")),
        }
    }

    pub fn read_array_header(&mut self) -> Result<u64> {
        self.skip_tags()?;
        match self.next {
            Item::ArrayHeader(n) => {
                self.pull()?;
                Ok(n)
            }
            _ => Err(self.unexpected_data_item("ArrayHeader")),
        }
    }

    pub fn read_array_start(&mut self) -> Result<()> {
        self.skip_tags()?;
        match self.next {
            Item::ArrayStart => self.pull().map(|_| ()),
            _ => Err(self.unexpected_data_item("ArrayStart")),
        }
    }

    pub fn read_map_header(&mut self) -> Result<u64> {
        self.skip_tags()?;
        match self.next {
            Item::MapHeader(n) => {
                self.pull()?;
                Ok(n)
            }
            _ => Err(self.unexpected_data_item("MapHeader")),
        }
    }

    pub fn read_map_start(&mut self) -> Result<()> {
        self.skip_tags()?;
        match self.next {
            Item::MapStart => self.pull().map(|_| ()),
            _ => Err(self.unexpected_data_item("MapStart")),
        }
    }

    pub fn read_break(&mut self) -> Result<()> {
        self.skip_tags()?;
        match self.next {
            Item::Break => self.pull().map(|_| ()),
            _ => Err(self.unexpected_data_item("Break")),
        }
    }

    pub fn read_tag(&mut self) -> Result<u64> {
        match self.next {
            Item::Tag(t) => {
                self.pull()?;
                Ok(t)
            }
            _ => Err(self.unexpected_data_item("Tag")),
        }
    }

    /// Asserts a specific tag.
    pub fn read_tag_of(&mut self, expected: u64) -> Result<()> {
        match self.next {
            Item::Tag(t) if t == expected => self.pull().map(|_| ()),
            _ => Err(self.unexpected_data_item(&format!("Tag({expected})"))),
        }
    }

    /// Consumes the given tag if it is pending.
    pub fn try_read_tag(&mut self, tag: u64) -> Result<bool> {
        if self.has_tag_of(tag) {
            self.pull()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn read_simple(&mut self) -> Result<u8> {
        self.skip_tags()?;
        match self.next {
            Item::Simple(v) => {
                self.pull()?;
                Ok(v)
            }
            _ => Err(self.unexpected_data_item("SimpleValue")),
        }
    }

    pub fn read_end_of_input(&mut self) -> Result<()> {
        self.skip_tags()?;
        match self.next {
            Item::EndOfInput => Ok(()),
            _ => Err(self.unexpected_data_item("end of input")),
        }
    }

    // --- containers, format-agnostic ------------------------------------

    /// Opens an array of exactly `expected` elements. Returns whether the
    /// array was unbounded; pass the flag to [`Reader::read_array_close`].
    pub fn read_array_open(&mut self, expected: u64) -> Result<bool> {
        match self.array_open()? {
            Bound::Unbounded => Ok(true),
            Bound::Counted(n) if n == expected => Ok(false),
            Bound::Counted(n) => Err(Error::unexpected_item(
                self.next_pos,
                format!("expected array of {expected} elements but got {n}"),
            )),
        }
    }

    /// Closes an array opened with [`Reader::read_array_open`], consuming
    /// the matching break if and only if the array was unbounded, and hands
    /// `value` through.
    pub fn read_array_close<T>(&mut self, unbounded: bool, value: T) -> Result<T> {
        if unbounded {
            self.read_break()?;
        }
        Ok(value)
    }

    /// Opens an array of unknown size.
    pub fn array_open(&mut self) -> Result<Bound> {
        self.skip_tags()?;
        match self.next {
            Item::ArrayHeader(n) => {
                self.pull()?;
                Ok(Bound::Counted(n))
            }
            Item::ArrayStart => {
                self.pull()?;
                Ok(Bound::Unbounded)
            }
            _ => Err(self.unexpected_data_item("Array")),
        }
    }

    /// Opens a map of exactly `expected` entries, mirroring
    /// [`Reader::read_array_open`].
    pub fn read_map_open(&mut self, expected: u64) -> Result<bool> {
        match self.map_open()? {
            Bound::Unbounded => Ok(true),
            Bound::Counted(n) if n == expected => Ok(false),
            Bound::Counted(n) => Err(Error::unexpected_item(
                self.next_pos,
                format!("expected map of {expected} entries but got {n}"),
            )),
        }
    }

    pub fn read_map_close<T>(&mut self, unbounded: bool, value: T) -> Result<T> {
        if unbounded {
            self.read_break()?;
        }
        Ok(value)
    }

    /// Opens a map of unknown size.
    pub fn map_open(&mut self) -> Result<Bound> {
        self.skip_tags()?;
        match self.next {
            Item::MapHeader(n) => {
                self.pull()?;
                Ok(Bound::Counted(n))
            }
            Item::MapStart => {
                self.pull()?;
                Ok(Bound::Unbounded)
            }
            _ => Err(self.unexpected_data_item("Map")),
        }
    }

    /// Structurally skips one element, containers included.
    pub fn skip_element(&mut self) -> Result<()> {
        self.skip_tags()?;
        if matches!(self.next, Item::Break | Item::EndOfInput) {
            return Err(self.unexpected_data_item("an element"));
        }
        match self.pull()? {
            Item::ArrayHeader(n) => {
                for _ in 0..n {
                    self.skip_element()?;
                }
                Ok(())
            }
            Item::MapHeader(n) => {
                for _ in 0..n.saturating_mul(2) {
                    self.skip_element()?;
                }
                Ok(())
            }
            Item::ArrayStart | Item::MapStart => {
                while !self.has_break()? {
                    self.skip_element()?;
                }
                self.read_break()
            }
            Item::BytesStart | Item::TextStart => loop {
                match self.pull()? {
                    Item::Break => return Ok(()),
                    Item::Bytes(_) | Item::Str(_) => {}
                    _ => return Err(self.unexpected_data_item("chunk or Break")),
                }
            },
            _ => Ok(()),
        }
    }
}
