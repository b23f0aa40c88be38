//! Newtype wrappers selecting alternate wire shapes.
//!
//! The default impls on plain types pick one canonical encoding; wrapping a
//! value in one of these opts into a different one, in the spirit of the
//! usual Rust adapter-newtype idiom.

use core::fmt::Display;
use core::marker::PhantomData;
use core::str::FromStr;

use crate::base::{Base64, BaseEncoding};
use crate::codec::{Decode, Encode};
use crate::error::Result;
use crate::item::Target;
use crate::reader::{Bound, Reader};
use crate::receiver::{Parser, Renderer};
use crate::writer::Writer;

/// `Option` encoded as `null` / bare value instead of a 0-or-1 array.
///
/// The inner value must not itself encode as `null`, otherwise `Some(())`
/// and `None` collapse on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NullOption<T>(pub Option<T>);

impl<T: Encode> Encode for NullOption<T> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        match &self.0 {
            Some(value) => value.encode(w),
            None => w.write_null(),
        }
    }
}

impl<T: Decode> Decode for NullOption<T> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.try_read_null()? {
            Ok(NullOption(None))
        } else {
            T::decode(r).map(|v| NullOption(Some(v)))
        }
    }
}

/// A number carried as a string (`"42"`), and accepted back from either a
/// string or a plain number event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringNumber<T>(pub T);

impl<T: Display> Encode for StringNumber<T> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_string(&self.0.to_string())
    }
}

impl<T: Decode + FromStr> Decode for StringNumber<T> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.has_string()? {
            let s = r.read_string()?;
            return s
                .parse::<T>()
                .map(StringNumber)
                .map_err(|_| r.invalid_data(format!("`{s}` does not parse as a number")));
        }
        T::decode(r).map(StringNumber)
    }
}

/// A boolean carried as `"true"` / `"false"`, accepted back from either a
/// string or a boolean event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringBool(pub bool);

impl Encode for StringBool {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_string(if self.0 { "true" } else { "false" })
    }
}

impl Decode for StringBool {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.has_bool()? {
            return r.read_bool().map(StringBool);
        }
        let s = r.read_string()?;
        match s.as_str() {
            "true" => Ok(StringBool(true)),
            "false" => Ok(StringBool(false)),
            _ => Err(r.invalid_data(format!("`{s}` is not a boolean"))),
        }
    }
}

/// A null carried as the string `"null"`, accepted back from either shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringNull;

impl Encode for StringNull {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_string("null")
    }
}

impl Decode for StringNull {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.try_read_null()? {
            return Ok(StringNull);
        }
        let s = r.read_string()?;
        if s == "null" {
            Ok(StringNull)
        } else {
            Err(r.invalid_data(format!("`{s}` is not null")))
        }
    }
}

/// A byte string that renders natively in CBOR and as a character encoding
/// (base64 unless another [`BaseEncoding`] is chosen) in JSON.
pub struct ByteString<E: BaseEncoding = Base64> {
    pub bytes: Vec<u8>,
    _encoding: PhantomData<E>,
}

impl<E: BaseEncoding> std::fmt::Debug for ByteString<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteString").field("bytes", &self.bytes).finish()
    }
}

impl<E: BaseEncoding> Clone for ByteString<E> {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            _encoding: PhantomData,
        }
    }
}

impl<E: BaseEncoding> PartialEq for ByteString<E> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<E: BaseEncoding> Eq for ByteString<E> {}

impl<E: BaseEncoding> ByteString<E> {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            _encoding: PhantomData,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<E: BaseEncoding> From<Vec<u8>> for ByteString<E> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl<E: BaseEncoding> Encode for ByteString<E> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        match w.target() {
            Target::Cbor => w.write_bytes(&self.bytes),
            Target::Json => w.write_string(&E::encode(&self.bytes)),
        }
    }
}

impl<E: BaseEncoding> Decode for ByteString<E> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        match r.target() {
            Target::Cbor => r.read_bytes().map(Self::new),
            Target::Json => {
                let s = r.read_string()?;
                E::decode(&s)
                    .map(Self::new)
                    .map_err(|e| r.invalid_data(format!("invalid {} data: {e}", E::NAME)))
            }
        }
    }
}

/// An either encoded as a singleton map: `{"0": left}` / `{"1": right}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedEither<A, B>(pub super::Either<A, B>);

impl<A: Encode, B: Encode> Encode for KeyedEither<A, B> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_map_open(1)?;
        match &self.0 {
            super::Either::Left(a) => {
                w.write_string("0")?;
                a.encode(w)?;
            }
            super::Either::Right(b) => {
                w.write_string("1")?;
                b.encode(w)?;
            }
        }
        w.write_map_close()
    }
}

impl<A: Decode, B: Decode> Decode for KeyedEither<A, B> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let unbounded = match r.map_open()? {
            Bound::Counted(1) => false,
            Bound::Counted(n) => {
                return Err(r.invalid_data(format!("expected a singleton map but got {n} entries")));
            }
            Bound::Unbounded => true,
        };
        let key = r.read_string()?;
        let value = match key.as_str() {
            "0" => super::Either::Left(A::decode(r)?),
            "1" => super::Either::Right(B::decode(r)?),
            _ => {
                return Err(r.invalid_data(format!("`{key}` is not a valid either discriminant")));
            }
        };
        r.read_map_close(unbounded, KeyedEither(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base16;
    use crate::codec::Either;
    use crate::{cbor, json};

    #[test]
    fn null_options() {
        assert_eq!(
            json::encode(&NullOption(Some(1))).to_byte_array().unwrap(),
            b"1"
        );
        assert_eq!(
            json::encode(&NullOption::<i32>(None))
                .to_byte_array()
                .unwrap(),
            b"null"
        );
        assert_eq!(
            json::decode(b"null")
                .to_value::<NullOption<i32>>()
                .unwrap(),
            NullOption(None)
        );
        assert_eq!(
            json::decode(b"7").to_value::<NullOption<i32>>().unwrap(),
            NullOption(Some(7))
        );
    }

    #[test]
    fn string_numbers() {
        assert_eq!(
            json::encode(&StringNumber(42i64)).to_byte_array().unwrap(),
            b"\"42\""
        );
        assert_eq!(
            json::decode(b"\"42\"")
                .to_value::<StringNumber<i64>>()
                .unwrap(),
            StringNumber(42)
        );
        // Plain numbers are accepted too.
        assert_eq!(
            json::decode(b"42")
                .to_value::<StringNumber<i64>>()
                .unwrap(),
            StringNumber(42)
        );
    }

    #[test]
    fn string_booleans_and_nulls() {
        assert_eq!(
            json::encode(&StringBool(true)).to_byte_array().unwrap(),
            b"\"true\""
        );
        assert_eq!(
            json::decode(b"\"false\"").to_value::<StringBool>().unwrap(),
            StringBool(false)
        );
        assert_eq!(
            json::encode(&StringNull).to_byte_array().unwrap(),
            b"\"null\""
        );
        assert_eq!(
            json::decode(b"null").to_value::<StringNull>().unwrap(),
            StringNull
        );
    }

    #[test]
    fn byte_strings_are_native_in_cbor_and_base64_in_json() {
        let value: ByteString = ByteString::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        assert_eq!(bytes, vec![0x44, 0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(
            cbor::decode(&bytes).to_value::<ByteString>().unwrap(),
            value
        );

        let text = json::encode(&value).to_byte_array().unwrap();
        assert_eq!(text, b"\"3q2+7w==\"");
        assert_eq!(json::decode(&text).to_value::<ByteString>().unwrap(), value);
    }

    #[test]
    fn byte_string_encoding_is_pluggable() {
        let value: ByteString<Base16> = ByteString::new(vec![0xDE, 0xAD]);
        let text = json::encode(&value).to_byte_array().unwrap();
        assert_eq!(text, b"\"dead\"");
        assert_eq!(
            json::decode(&text)
                .to_value::<ByteString<Base16>>()
                .unwrap(),
            value
        );
    }

    #[test]
    fn keyed_eithers() {
        let left: KeyedEither<i32, String> = KeyedEither(Either::Left(5));
        let text = json::encode(&left).to_byte_array().unwrap();
        assert_eq!(text, br#"{"0":5}"#);
        assert_eq!(
            json::decode(&text)
                .to_value::<KeyedEither<i32, String>>()
                .unwrap(),
            left
        );
    }
}
