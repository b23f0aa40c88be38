//! The type-class layer: translating application values to and from event
//! streams.
//!
//! [`Encode`] and [`Decode`] are implemented directly on value types;
//! resolution happens at compile time through ordinary trait lookup, and the
//! whole call chain monomorphizes against the concrete format. The built-in
//! implementations cover primitives, strings, byte strings, collections,
//! options, eithers and tuples; alternate wire shapes are opted into with
//! newtype wrappers ([`NullOption`], [`StringNumber`], [`ByteString`], ...).
//!
//! For composing codecs out of existing ones at the value level, the
//! [`Encoder`]/[`Decoder`] object traits carry the combinators
//! (`contramap`, `map`, `map_option`, `map_result`, [`Codec::bimap`]).

mod basic;
mod bignum;
mod collections;
mod wrappers;

pub use bignum::{BigDecimal, BigInt};
pub use collections::Either;
pub use wrappers::{ByteString, KeyedEither, NullOption, StringBool, StringNull, StringNumber};

use core::fmt::Display;
use core::marker::PhantomData;

use crate::error::Result;
use crate::reader::Reader;
use crate::receiver::{Parser, Renderer};
use crate::writer::Writer;

/// Values that can write themselves onto an event stream.
///
/// Implementations must emit exactly one top-level data item (tags are
/// prefixes and do not count).
pub trait Encode {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()>;
}

/// Values that can read themselves off an event stream.
pub trait Decode: Sized {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        (**self).encode(w)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        (**self).encode(w)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        T::decode(r).map(Box::new)
    }
}

/// An encoder as a first-class value, for combinator-style composition.
pub trait Encoder<T: ?Sized> {
    fn encode_value<R: Renderer>(&self, w: &mut Writer<R>, value: &T) -> Result<()>;

    /// Derives an encoder for `U` from one for `T` via a projection.
    fn contramap<U, F>(self, f: F) -> Contramap<Self, F>
    where
        Self: Sized,
        T: Sized,
        F: Fn(&U) -> T,
    {
        Contramap { encoder: self, f }
    }
}

/// A decoder as a first-class value, for combinator-style composition.
pub trait Decoder<T> {
    fn decode_value<P: Parser>(&self, r: &mut Reader<P>) -> Result<T>;

    /// Derives a decoder for `U` from one for `T`.
    fn map<U, F>(self, f: F) -> Map<Self, F, T>
    where
        Self: Sized,
        F: Fn(T) -> U,
    {
        Map {
            decoder: self,
            f,
            _marker: PhantomData,
        }
    }

    /// Like [`Decoder::map`], but `None` fails the decoding run.
    fn map_option<U, F>(self, f: F) -> MapOption<Self, F, T>
    where
        Self: Sized,
        F: Fn(T) -> Option<U>,
    {
        MapOption {
            decoder: self,
            f,
            _marker: PhantomData,
        }
    }

    /// Like [`Decoder::map`], with a fallible projection.
    fn map_result<U, E, F>(self, f: F) -> MapResult<Self, F, T>
    where
        Self: Sized,
        E: Display,
        F: Fn(T) -> core::result::Result<U, E>,
    {
        MapResult {
            decoder: self,
            f,
            _marker: PhantomData,
        }
    }
}

pub struct Contramap<E, F> {
    encoder: E,
    f: F,
}

impl<T, U, E, F> Encoder<U> for Contramap<E, F>
where
    E: Encoder<T>,
    F: Fn(&U) -> T,
{
    fn encode_value<R: Renderer>(&self, w: &mut Writer<R>, value: &U) -> Result<()> {
        self.encoder.encode_value(w, &(self.f)(value))
    }
}

pub struct Map<D, F, T> {
    decoder: D,
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, U, D, F> Decoder<U> for Map<D, F, T>
where
    D: Decoder<T>,
    F: Fn(T) -> U,
{
    fn decode_value<P: Parser>(&self, r: &mut Reader<P>) -> Result<U> {
        self.decoder.decode_value(r).map(&self.f)
    }
}

pub struct MapOption<D, F, T> {
    decoder: D,
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, U, D, F> Decoder<U> for MapOption<D, F, T>
where
    D: Decoder<T>,
    F: Fn(T) -> Option<U>,
{
    fn decode_value<P: Parser>(&self, r: &mut Reader<P>) -> Result<U> {
        let value = self.decoder.decode_value(r)?;
        (self.f)(value).ok_or_else(|| r.codec_error("value rejected by mapping decoder"))
    }
}

pub struct MapResult<D, F, T> {
    decoder: D,
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, U, E, D, F> Decoder<U> for MapResult<D, F, T>
where
    D: Decoder<T>,
    E: Display,
    F: Fn(T) -> core::result::Result<U, E>,
{
    fn decode_value<P: Parser>(&self, r: &mut Reader<P>) -> Result<U> {
        let value = self.decoder.decode_value(r)?;
        (self.f)(value).map_err(|e| r.codec_error(e.to_string()))
    }
}

/// An encoder/decoder pair.
pub struct Codec<E, D> {
    pub encoder: E,
    pub decoder: D,
}

impl<E, D> Codec<E, D> {
    pub fn new(encoder: E, decoder: D) -> Self {
        Self { encoder, decoder }
    }

    /// Derives a codec for `S` from one for `T` via a pair of conversions.
    pub fn bimap<T, S>(
        self,
        to: impl Fn(&S) -> T,
        from: impl Fn(T) -> S,
    ) -> Codec<Contramap<E, impl Fn(&S) -> T>, Map<D, impl Fn(T) -> S, T>>
    where
        E: Encoder<T>,
        D: Decoder<T>,
    {
        Codec::new(self.encoder.contramap(to), self.decoder.map(from))
    }
}

/// Encoder/decoder deferring to the type's own `Encode`/`Decode` impl; the
/// usual starting point for combinator chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodec;

impl<T: Encode + ?Sized> Encoder<T> for DefaultCodec {
    fn encode_value<R: Renderer>(&self, w: &mut Writer<R>, value: &T) -> Result<()> {
        value.encode(w)
    }
}

impl<T: Decode> Decoder<T> for DefaultCodec {
    fn decode_value<P: Parser>(&self, r: &mut Reader<P>) -> Result<T> {
        T::decode(r)
    }
}

/// The default codec pair.
#[must_use]
pub fn default_codec() -> Codec<DefaultCodec, DefaultCodec> {
    Codec::new(DefaultCodec, DefaultCodec)
}

/// Binds a value to an explicit encoder object so it can flow through the
/// `Encode`-based entry points.
pub struct WithEncoder<'a, T: ?Sized, E> {
    value: &'a T,
    encoder: &'a E,
}

/// See [`WithEncoder`].
pub fn with_encoder<'a, T: ?Sized, E: Encoder<T>>(
    encoder: &'a E,
    value: &'a T,
) -> WithEncoder<'a, T, E> {
    WithEncoder { value, encoder }
}

impl<T: ?Sized, E: Encoder<T>> Encode for WithEncoder<'_, T, E> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        self.encoder.encode_value(w, self.value)
    }
}

/// Decoders that can consult a record-level default value.
///
/// Record codecs layered above the core hand the declared field default to
/// the decoder; the decoder may substitute it or adjust its wire shape
/// around it.
pub trait DecodeWithDefault: Sized {
    fn decode_with_default<P: Parser>(r: &mut Reader<P>, default: Self) -> Result<Self>;
}

/// Encoders that can consult a record-level default value. Returns whether
/// anything was written; `false` signals the surrounding record codec to
/// omit the field entirely.
pub trait EncodeWithDefault: Encode {
    fn encode_with_default<R: Renderer>(&self, w: &mut Writer<R>, default: &Self)
    -> Result<bool>;
}

// With a `None` default the option wrapper is dropped on the wire: a present
// value is encoded bare and an absent one is omitted by the record codec.
impl<T: Encode> EncodeWithDefault for Option<T> {
    fn encode_with_default<R: Renderer>(
        &self,
        w: &mut Writer<R>,
        default: &Self,
    ) -> Result<bool> {
        if default.is_none() {
            match self {
                None => Ok(false),
                Some(value) => {
                    value.encode(w)?;
                    Ok(true)
                }
            }
        } else {
            self.encode(w)?;
            Ok(true)
        }
    }
}

impl<T: Decode> DecodeWithDefault for Option<T> {
    fn decode_with_default<P: Parser>(r: &mut Reader<P>, default: Self) -> Result<Self> {
        if default.is_none() {
            T::decode(r).map(Some)
        } else {
            Self::decode(r)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, json};

    #[test]
    fn contramap_projects_before_encoding() {
        struct Celsius(f64);
        let encoder = DefaultCodec.contramap(|c: &Celsius| c.0 * 9.0 / 5.0 + 32.0);
        let text = json::encode(&with_encoder(&encoder, &Celsius(100.0)))
            .to_byte_array()
            .unwrap();
        assert_eq!(text, b"212.0");
    }

    #[test]
    fn map_chains_after_decoding() {
        let decoder = DefaultCodec.map(|n: i64| n * 2);
        let value = json::decode(b"21").to_value_with(&decoder).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn map_option_rejects_none() {
        let decoder = DefaultCodec.map_option(|n: i64| u8::try_from(n).ok());
        assert_eq!(json::decode(b"200").to_value_with(&decoder).unwrap(), 200);
        let err = json::decode(b"300").to_value_with(&decoder).unwrap_err();
        assert!(matches!(err, Error::General { .. }));
    }

    #[test]
    fn map_result_carries_the_message() {
        let decoder =
            DefaultCodec.map_result(|s: String| s.parse::<i32>().map_err(|e| e.to_string()));
        assert_eq!(
            json::decode(b"\"17\"").to_value_with(&decoder).unwrap(),
            17
        );
        assert!(json::decode(b"\"x\"").to_value_with(&decoder).is_err());
    }

    #[test]
    fn bimap_derives_a_full_codec() {
        #[derive(Debug, PartialEq)]
        struct Id(u32);
        let codec = default_codec().bimap(|id: &Id| id.0, Id);
        let text = json::encode(&with_encoder(&codec.encoder, &Id(9)))
            .to_byte_array()
            .unwrap();
        assert_eq!(text, b"9");
        assert_eq!(
            json::decode(&text).to_value_with(&codec.decoder).unwrap(),
            Id(9)
        );
    }
}
