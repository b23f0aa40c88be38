//! Renders the event stream as RFC 8949 bytes.
//!
//! Integers are emitted in their shortest form. Floats are written at the
//! width of the event that carries them; no cross-width compression is
//! attempted.

use half::f16;

use crate::error::{Error, Position, Result};
use crate::io::output::Output;
use crate::item::{Item, Target};
use crate::receiver::{Receiver, Renderer};

pub struct CborRenderer<O: Output> {
    out: O,
    count: usize,
}

impl<O: Output> CborRenderer<O> {
    pub fn new(out: O) -> Self {
        Self { out, count: 0 }
    }

    #[inline]
    fn pos(&self) -> Position {
        Position::new(self.count)
    }

    /// Writes an initial byte plus the shortest argument encoding.
    fn write_type_and_arg(&mut self, major: u8, arg: u64) {
        let base = major << 5;
        if arg < 24 {
            self.out.write_byte(base | arg as u8);
        } else if arg <= u64::from(u8::MAX) {
            self.out.write_2(base | 24, arg as u8);
        } else if arg <= u64::from(u16::MAX) {
            let b = (arg as u16).to_be_bytes();
            self.out.write_3(base | 25, b[0], b[1]);
        } else if arg <= u64::from(u32::MAX) {
            self.out.write_byte(base | 26);
            self.out.write_slice(&(arg as u32).to_be_bytes());
        } else {
            self.out.write_byte(base | 27);
            self.out.write_slice(&arg.to_be_bytes());
        }
    }

    fn write_long(&mut self, value: i64) {
        if value >= 0 {
            self.write_type_and_arg(0, value as u64);
        } else {
            self.write_type_and_arg(1, !(value) as u64);
        }
    }

    /// Emits a verbatim numeric lexeme in its best binary representation.
    fn write_number_string(&mut self, lexeme: &str) -> Result<()> {
        if let Ok(v) = lexeme.parse::<i64>() {
            self.write_long(v);
            return Ok(());
        }
        if let Ok(v) = lexeme.parse::<u64>() {
            self.write_type_and_arg(0, v);
            return Ok(());
        }
        match lexeme.parse::<f64>() {
            Ok(v) => {
                self.out.write_byte(0xFB);
                self.out.write_slice(&v.to_bits().to_be_bytes());
                Ok(())
            }
            Err(_) => Err(Error::validation(
                self.pos(),
                format!("`{lexeme}` is not a representable number"),
            )),
        }
    }
}

impl<O: Output> Receiver for CborRenderer<O> {
    fn receive(&mut self, item: Item) -> Result<()> {
        self.count += 1;
        match item {
            Item::Null => self.out.write_byte(0xF6),
            Item::Undefined => self.out.write_byte(0xF7),
            Item::Bool(false) => self.out.write_byte(0xF4),
            Item::Bool(true) => self.out.write_byte(0xF5),
            Item::Int(i) => self.write_long(i64::from(i)),
            Item::Long(l) => self.write_long(l),
            Item::OverLong { negative, raw } => {
                self.write_type_and_arg(if negative { 1 } else { 0 }, raw);
            }
            Item::Float16(f) => {
                let bits = f16::from_f32(f).to_bits().to_be_bytes();
                self.out.write_3(0xF9, bits[0], bits[1]);
            }
            Item::Float(f) => {
                self.out.write_byte(0xFA);
                self.out.write_slice(&f.to_bits().to_be_bytes());
            }
            Item::Double(d) => {
                self.out.write_byte(0xFB);
                self.out.write_slice(&d.to_bits().to_be_bytes());
            }
            Item::NumberString(s) => self.write_number_string(&s)?,
            Item::Bytes(b) => {
                self.write_type_and_arg(2, b.len() as u64);
                self.out.write_slice(&b);
            }
            Item::BytesStart => self.out.write_byte(0x5F),
            Item::Str(s) => {
                self.write_type_and_arg(3, s.len() as u64);
                self.out.write_slice(s.as_bytes());
            }
            Item::TextStart => self.out.write_byte(0x7F),
            Item::ArrayHeader(n) => self.write_type_and_arg(4, n),
            Item::ArrayStart => self.out.write_byte(0x9F),
            Item::MapHeader(n) => self.write_type_and_arg(5, n),
            Item::MapStart => self.out.write_byte(0xBF),
            Item::Tag(t) => self.write_type_and_arg(6, t),
            Item::Simple(v) => {
                if v < 24 {
                    self.out.write_byte(0xE0 | v);
                } else if v >= 32 {
                    self.out.write_2(0xF8, v);
                } else {
                    return Err(Error::validation(
                        self.pos(),
                        format!("{v} is not encodable as a simple value"),
                    ));
                }
            }
            Item::Break => self.out.write_byte(0xFF),
            Item::EndOfInput => {}
        }
        Ok(())
    }
}

impl<O: Output> Renderer for CborRenderer<O> {
    type Out = O::Result;

    fn target(&self) -> Target {
        Target::Cbor
    }

    fn item_index(&self) -> usize {
        self.count
    }

    fn into_output(self) -> O::Result {
        self.out.finish()
    }
}
