//! The push half of the event model.
//!
//! A [`Writer`] wraps a renderer (behind a structural [`Validated`] check)
//! and exposes one method per element kind, plus the format-agnostic
//! `write_array_open`/`write_array_close` pair that picks a definite header
//! or an indefinite start/break depending on the output format.

use crate::error::{Error, Position, Result};
use crate::item::{Item, Target};
use crate::receiver::{Receiver, Renderer};
use crate::validation::Validated;

pub struct Writer<R: Renderer> {
    receiver: Validated<R>,
}

impl<R: Renderer> Writer<R> {
    pub fn new(renderer: R, max_nesting: usize) -> Self {
        Self {
            receiver: Validated::new(renderer, max_nesting),
        }
    }

    /// The format being written.
    #[must_use]
    pub fn target(&self) -> Target {
        self.receiver.target()
    }

    /// Ordinal of the next event, the render-side error position.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.receiver.item_index())
    }

    /// Pushes a raw item.
    pub fn write(&mut self, item: Item) -> Result<()> {
        self.receiver.receive(item)
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.write(Item::Null)
    }

    pub fn write_undefined(&mut self) -> Result<()> {
        self.write(Item::Undefined)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write(Item::Bool(value))
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.write(Item::Int(value))
    }

    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.write(Item::Long(value))
    }

    /// Writes an unsigned 64-bit integer, spilling into `OverLong` when the
    /// value exceeds the signed 64-bit range.
    pub fn write_unsigned_long(&mut self, value: u64) -> Result<()> {
        match i64::try_from(value) {
            Ok(v) => self.write_long(v),
            Err(_) => self.write(Item::OverLong {
                negative: false,
                raw: value,
            }),
        }
    }

    pub fn write_over_long(&mut self, negative: bool, raw: u64) -> Result<()> {
        self.write(Item::OverLong { negative, raw })
    }

    pub fn write_float16(&mut self, value: f32) -> Result<()> {
        self.write(Item::Float16(value))
    }

    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.write(Item::Float(value))
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.write(Item::Double(value))
    }

    pub fn write_number_string(&mut self, lexeme: &str) -> Result<()> {
        self.write(Item::NumberString(lexeme.to_string()))
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write(Item::Str(value.to_string()))
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write(Item::Bytes(value.to_vec()))
    }

    pub fn write_bytes_start(&mut self) -> Result<()> {
        self.write(Item::BytesStart)
    }

    pub fn write_text_start(&mut self) -> Result<()> {
        self.write(Item::TextStart)
    }

    pub fn write_array_header(&mut self, size: u64) -> Result<()> {
        self.write(Item::ArrayHeader(size))
    }

    pub fn write_array_start(&mut self) -> Result<()> {
        self.write(Item::ArrayStart)
    }

    pub fn write_map_header(&mut self, size: u64) -> Result<()> {
        self.write(Item::MapHeader(size))
    }

    pub fn write_map_start(&mut self) -> Result<()> {
        self.write(Item::MapStart)
    }

    pub fn write_break(&mut self) -> Result<()> {
        self.write(Item::Break)
    }

    pub fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.write(Item::Tag(tag))
    }

    /// Writes a CBOR simple value. Values 20..=31 are taken by
    /// booleans/null/undefined/floats and are rejected.
    pub fn write_simple(&mut self, value: u8) -> Result<()> {
        if (20..=31).contains(&value) {
            return Err(Error::validation(
                self.position(),
                format!("{value} is not encodable as a simple value"),
            ));
        }
        self.write(Item::Simple(value))
    }

    /// Opens an array of known size: a definite header where the format
    /// supports it, an indefinite start otherwise. Pair with
    /// [`Writer::write_array_close`].
    pub fn write_array_open(&mut self, size: u64) -> Result<()> {
        match self.target() {
            Target::Cbor => self.write_array_header(size),
            Target::Json => self.write_array_start(),
        }
    }

    pub fn write_array_close(&mut self) -> Result<()> {
        match self.target() {
            Target::Cbor => Ok(()),
            Target::Json => self.write_break(),
        }
    }

    /// Opens a map of known entry count, like [`Writer::write_array_open`].
    pub fn write_map_open(&mut self, size: u64) -> Result<()> {
        match self.target() {
            Target::Cbor => self.write_map_header(size),
            Target::Json => self.write_map_start(),
        }
    }

    pub fn write_map_close(&mut self) -> Result<()> {
        match self.target() {
            Target::Cbor => Ok(()),
            Target::Json => self.write_break(),
        }
    }

    /// Signals end of input and hands back the renderer's output.
    pub fn finish(mut self) -> Result<R::Out> {
        self.receiver.receive(Item::EndOfInput)?;
        Ok(self.receiver.into_output())
    }
}
