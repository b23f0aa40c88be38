//! Pull parser for RFC 8949 byte streams.
//!
//! Major types 0..7 are decoded in a flat loop; structural bookkeeping
//! (chunk typing inside indefinite strings, break legality, nesting depth)
//! is delegated to the shared [`Validator`]. Over-long integer encodings are
//! accepted on read. Integers are classified by magnitude into
//! `Int`/`Long`/`OverLong`.

use half::f16;

use crate::cbor::CborDecodeConfig;
use crate::error::{Error, Position, Result};
use crate::io::input::Input;
use crate::item::{Item, Target};
use crate::receiver::Parser;
use crate::validation::Validator;

pub struct CborParser<I: Input> {
    input: I,
    config: CborDecodeConfig,
    structure: Validator,
    item_start: usize,
    parsed_any: bool,
}

impl<I: Input> CborParser<I> {
    pub fn new(input: I, config: CborDecodeConfig) -> Self {
        let structure = Validator::new(config.max_nesting_levels);
        Self {
            input,
            config,
            structure,
            item_start: 0,
            parsed_any: false,
        }
    }

    pub fn into_input(self) -> I {
        self.input
    }

    #[inline]
    fn start_pos(&self) -> Position {
        Position::new(self.item_start)
    }

    fn invalid(&self, msg: impl Into<String>) -> Error {
        Error::invalid_input(self.start_pos(), msg)
    }

    /// Reads the argument encoded by the additional info bits.
    fn read_arg(&mut self, info: u8) -> Result<u64> {
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => self.input.read_byte().map(u64::from),
            25 => self.input.read_double_byte_be().map(u64::from),
            26 => self.input.read_quad_byte_be().map(u64::from),
            27 => self.input.read_octa_byte_be(),
            _ => Err(self.invalid(format!("reserved additional info {info}"))),
        }
    }

    fn unsigned_item(value: u64) -> Item {
        if value <= i32::MAX as u64 {
            Item::Int(value as i32)
        } else if value <= i64::MAX as u64 {
            Item::Long(value as i64)
        } else {
            Item::OverLong {
                negative: false,
                raw: value,
            }
        }
    }

    /// Item for a major type 1 argument, representing `-1 - raw`.
    fn negative_item(raw: u64) -> Item {
        if raw <= i32::MAX as u64 {
            Item::Int((-1i64 - raw as i64) as i32)
        } else if raw <= i64::MAX as u64 {
            Item::Long(-1i64 - raw as i64)
        } else {
            Item::OverLong {
                negative: true,
                raw,
            }
        }
    }

    fn read_byte_string(&mut self, len: u64) -> Result<Item> {
        if len > self.config.max_byte_string_length {
            return Err(Error::overflow(
                self.start_pos(),
                format!("byte string length {len} exceeds the configured maximum"),
            ));
        }
        let len = usize::try_from(len)
            .map_err(|_| self.invalid("byte string length exceeds the address space"))?;
        let mut bytes = Vec::with_capacity(len.min(1 << 20));
        self.input.read_into(len, &mut bytes)?;
        Ok(Item::Bytes(bytes))
    }

    fn read_text_string(&mut self, len: u64) -> Result<Item> {
        if len > self.config.max_text_string_length {
            return Err(Error::overflow(
                self.start_pos(),
                format!("text string length {len} exceeds the configured maximum"),
            ));
        }
        let len = usize::try_from(len)
            .map_err(|_| self.invalid("text string length exceeds the address space"))?;
        let mut bytes = Vec::with_capacity(len.min(1 << 20));
        self.input.read_into(len, &mut bytes)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| self.invalid(format!("text string is not valid UTF-8: {}", e.utf8_error())))?;
        Ok(Item::Str(text))
    }

    /// Parses the next chunk (or break) of an indefinite-length string.
    /// RFC 8949 requires every chunk to be a definite string of the same
    /// major type.
    fn parse_chunk(&mut self, text: bool) -> Result<Item> {
        let ib = self.input.read_byte()?;
        if ib == 0xFF {
            return Ok(Item::Break);
        }
        let major = ib >> 5;
        let info = ib & 0x1F;
        let expected = if text { 3 } else { 2 };
        if major != expected || info == 31 {
            return Err(self.invalid(
                "indefinite-length string chunks must be definite strings of the same major type",
            ));
        }
        let len = self.read_arg(info)?;
        if text {
            self.read_text_string(len)
        } else {
            self.read_byte_string(len)
        }
    }

    fn parse_item(&mut self) -> Result<Item> {
        if self.structure.top_is_bytes() {
            return self.parse_chunk(false);
        }
        if self.structure.top_is_text() {
            return self.parse_chunk(true);
        }

        let ib = self.input.read_byte()?;
        let major = ib >> 5;
        let info = ib & 0x1F;
        match major {
            0 => self.read_arg(info).map(Self::unsigned_item),
            1 => self.read_arg(info).map(Self::negative_item),
            2 => {
                if info == 31 {
                    return Ok(Item::BytesStart);
                }
                let len = self.read_arg(info)?;
                self.read_byte_string(len)
            }
            3 => {
                if info == 31 {
                    return Ok(Item::TextStart);
                }
                let len = self.read_arg(info)?;
                self.read_text_string(len)
            }
            4 => {
                if info == 31 {
                    return Ok(Item::ArrayStart);
                }
                let len = self.read_arg(info)?;
                if len > self.config.max_array_length {
                    return Err(Error::overflow(
                        self.start_pos(),
                        format!("array length {len} exceeds the configured maximum"),
                    ));
                }
                Ok(Item::ArrayHeader(len))
            }
            5 => {
                if info == 31 {
                    return Ok(Item::MapStart);
                }
                let len = self.read_arg(info)?;
                if len > self.config.max_map_length {
                    return Err(Error::overflow(
                        self.start_pos(),
                        format!("map length {len} exceeds the configured maximum"),
                    ));
                }
                Ok(Item::MapHeader(len))
            }
            6 => self.read_arg(info).map(Item::Tag),
            _ => match info {
                0..=19 => Ok(Item::Simple(info)),
                20 => Ok(Item::Bool(false)),
                21 => Ok(Item::Bool(true)),
                22 => Ok(Item::Null),
                23 => Ok(Item::Undefined),
                24 => {
                    let v = self.input.read_byte()?;
                    if v < 32 {
                        return Err(self.invalid(format!(
                            "simple value {v} must be encoded directly in the initial byte"
                        )));
                    }
                    Ok(Item::Simple(v))
                }
                25 => {
                    let bits = self.input.read_double_byte_be()?;
                    Ok(Item::Float16(f16::from_bits(bits).to_f32()))
                }
                26 => {
                    let bits = self.input.read_quad_byte_be()?;
                    Ok(Item::Float(f32::from_bits(bits)))
                }
                27 => {
                    let bits = self.input.read_octa_byte_be()?;
                    Ok(Item::Double(f64::from_bits(bits)))
                }
                31 => Ok(Item::Break),
                _ => Err(self.invalid(format!("reserved additional info {info}"))),
            },
        }
    }

    fn track(&mut self, item: &Item) -> Result<()> {
        let pos = self.start_pos();
        self.structure.check(item, pos).map_err(|e| match e {
            // Structural defects found while parsing are input errors, not
            // encoder bugs.
            Error::Validation { pos, msg } => Error::invalid_input(pos, msg),
            other => other,
        })
    }
}

impl<I: Input> Parser for CborParser<I> {
    fn pull(&mut self) -> Result<Item> {
        self.item_start = self.input.cursor();
        if self.structure.depth() == 0 && !self.input.has_bytes(1) {
            if !self.parsed_any {
                return Err(Error::unexpected_end(self.start_pos()));
            }
            return Ok(Item::EndOfInput);
        }
        let item = self.parse_item()?;
        self.track(&item)?;
        self.parsed_any = true;
        Ok(item)
    }

    fn position(&self) -> Position {
        self.start_pos()
    }

    fn target(&self) -> Target {
        Target::Cbor
    }
}
