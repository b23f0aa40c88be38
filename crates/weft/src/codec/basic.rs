//! `Encode`/`Decode` for primitives and strings.
//!
//! Integer decoders accept widening: an `Int` event satisfies any wider
//! integer decoder, with range checks where the target is narrower than the
//! event. `u64` additionally accepts non-negative `OverLong` events and, for
//! values that JSON could not narrow, integral `NumberString` lexemes.

use std::borrow::Cow;

use half::f16;

use crate::codec::{Decode, Encode};
use crate::error::Result;
use crate::reader::Reader;
use crate::receiver::{Parser, Renderer};
use crate::writer::Writer;

impl Encode for bool {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_bool(*self)
    }
}

impl Decode for bool {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_bool()
    }
}

impl Encode for () {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_null()
    }
}

impl Decode for () {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_null()
    }
}

macro_rules! impl_small_int {
    ($($t:ty),+) => {
        $(
            impl Encode for $t {
                fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
                    w.write_int(i32::from(*self))
                }
            }

            impl Decode for $t {
                fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
                    let value = r.read_long()?;
                    <$t>::try_from(value).map_err(|_| {
                        r.invalid_data(format!(
                            "{value} is out of range for {}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )+
    };
}

impl_small_int!(i8, i16, u8, u16);

impl Encode for i32 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_int(*self)
    }
}

impl Decode for i32 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let value = r.read_long()?;
        i32::try_from(value)
            .map_err(|_| r.invalid_data(format!("{value} is out of range for i32")))
    }
}

impl Encode for u32 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        match i32::try_from(*self) {
            Ok(v) => w.write_int(v),
            Err(_) => w.write_long(i64::from(*self)),
        }
    }
}

impl Decode for u32 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let value = r.read_long()?;
        u32::try_from(value)
            .map_err(|_| r.invalid_data(format!("{value} is out of range for u32")))
    }
}

impl Encode for i64 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_long(*self)
    }
}

impl Decode for i64 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_long()
    }
}

impl Encode for u64 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_unsigned_long(*self)
    }
}

impl Decode for u64 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.has_number_string()? {
            let lexeme = r.read_number_string()?;
            return lexeme
                .parse::<u64>()
                .map_err(|_| r.invalid_data(format!("`{lexeme}` is out of range for u64")));
        }
        r.read_unsigned_long()
    }
}

impl Encode for isize {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_long(*self as i64)
    }
}

impl Decode for isize {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let value = r.read_long()?;
        isize::try_from(value)
            .map_err(|_| r.invalid_data(format!("{value} is out of range for isize")))
    }
}

impl Encode for usize {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_unsigned_long(*self as u64)
    }
}

impl Decode for usize {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let value = u64::decode(r)?;
        usize::try_from(value)
            .map_err(|_| r.invalid_data(format!("{value} is out of range for usize")))
    }
}

impl Encode for f16 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_float16(self.to_f32())
    }
}

impl Decode for f16 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_float16().map(f16::from_f32)
    }
}

impl Encode for f32 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_float(*self)
    }
}

impl Decode for f32 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.has_float()? {
            return r.read_float();
        }
        // Narrow from a wider numeric event (the only shape JSON produces).
        r.read_double().map(|d| d as f32)
    }
}

impl Encode for f64 {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_double(*self)
    }
}

impl Decode for f64 {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_double()
    }
}

impl Encode for char {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        let mut buf = [0u8; 4];
        w.write_string(self.encode_utf8(&mut buf))
    }
}

impl Decode for char {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let s = r.read_string()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(r.invalid_data("expected a single-character string")),
        }
    }
}

impl Encode for str {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_string(self)
    }
}

impl Encode for String {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_string(self)
    }
}

impl Decode for String {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_string()
    }
}

impl Encode for Cow<'_, str> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_string(self)
    }
}

impl Decode for Cow<'_, str> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        r.read_string().map(Cow::Owned)
    }
}
