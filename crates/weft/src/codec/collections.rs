//! `Encode`/`Decode` for options, eithers, sequences, maps and tuples.
//!
//! Sequences with a known size open their container with
//! `write_array_open`, which renders a definite header in CBOR and an
//! indefinite start in JSON; decoding goes through `array_open`, so every
//! collection decoder handles both container flavors.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use crate::codec::{Decode, Encode};
use crate::error::Result;
use crate::reader::{Bound, Reader};
use crate::receiver::{Parser, Renderer};
use crate::writer::Writer;

/// Caps speculative pre-allocation from attacker-controlled headers.
const MAX_PREALLOCATION: u64 = 1024;

/// `Some(v)` is a one-element array, `None` an empty one. See
/// [`crate::codec::NullOption`] for the null-based alternative.
impl<T: Encode> Encode for Option<T> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        match self {
            Some(value) => {
                w.write_array_open(1)?;
                value.encode(w)?;
                w.write_array_close()
            }
            None => {
                w.write_array_open(0)?;
                w.write_array_close()
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        match r.array_open()? {
            Bound::Counted(0) => Ok(None),
            Bound::Counted(1) => T::decode(r).map(Some),
            Bound::Counted(n) => Err(r.invalid_data(format!(
                "expected an array of zero or one elements but got {n}"
            ))),
            Bound::Unbounded => {
                if r.has_break()? {
                    r.read_break()?;
                    Ok(None)
                } else {
                    let value = T::decode(r)?;
                    r.read_break()?;
                    Ok(Some(value))
                }
            }
        }
    }
}

/// A two-way sum with a positional wire shape: `[0, left]` / `[1, right]`.
/// See [`crate::codec::KeyedEither`] for the map-keyed alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<A, B> {
    Left(A),
    Right(B),
}

impl<A: Encode, B: Encode> Encode for Either<A, B> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        w.write_array_open(2)?;
        match self {
            Either::Left(a) => {
                w.write_int(0)?;
                a.encode(w)?;
            }
            Either::Right(b) => {
                w.write_int(1)?;
                b.encode(w)?;
            }
        }
        w.write_array_close()
    }
}

impl<A: Decode, B: Decode> Decode for Either<A, B> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let unbounded = r.read_array_open(2)?;
        let value = match r.read_int()? {
            0 => Either::Left(A::decode(r)?),
            1 => Either::Right(B::decode(r)?),
            d => return Err(r.invalid_data(format!("{d} is not a valid either discriminant"))),
        };
        r.read_array_close(unbounded, value)
    }
}

fn encode_seq<'a, T, R, I>(w: &mut Writer<R>, len: usize, items: I) -> Result<()>
where
    T: Encode + 'a,
    R: Renderer,
    I: Iterator<Item = &'a T>,
{
    w.write_array_open(len as u64)?;
    for item in items {
        item.encode(w)?;
    }
    w.write_array_close()
}

fn decode_seq<T, P, F>(r: &mut Reader<P>, mut push: F) -> Result<()>
where
    T: Decode,
    P: Parser,
    F: FnMut(T),
{
    match r.array_open()? {
        Bound::Counted(n) => {
            for _ in 0..n {
                push(T::decode(r)?);
            }
            Ok(())
        }
        Bound::Unbounded => {
            while !r.has_break()? {
                push(T::decode(r)?);
            }
            r.read_break()
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_seq(w, self.len(), self.iter())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_seq(w, self.len(), self.iter())
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let mut out = match r.array_open()? {
            Bound::Counted(n) => {
                let mut out = Vec::with_capacity(n.min(MAX_PREALLOCATION) as usize);
                for _ in 0..n {
                    out.push(T::decode(r)?);
                }
                return Ok(out);
            }
            Bound::Unbounded => Vec::new(),
        };
        while !r.has_break()? {
            out.push(T::decode(r)?);
        }
        r.read_break()?;
        Ok(out)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_seq(w, N, self.iter())
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let unbounded = r.read_array_open(N as u64)?;
        let mut out = Vec::with_capacity(N);
        for _ in 0..N {
            out.push(T::decode(r)?);
        }
        let array = out
            .try_into()
            .unwrap_or_else(|_| unreachable!("length checked above"));
        r.read_array_close(unbounded, array)
    }
}

impl<T: Encode + Ord> Encode for BTreeSet<T> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_seq(w, self.len(), self.iter())
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let mut out = BTreeSet::new();
        decode_seq(r, |v| {
            out.insert(v);
        })?;
        Ok(out)
    }
}

impl<T: Encode + Eq + Hash, S: BuildHasher> Encode for HashSet<T, S> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_seq(w, self.len(), self.iter())
    }
}

impl<T: Decode + Eq + Hash, S: BuildHasher + Default> Decode for HashSet<T, S> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let mut out = HashSet::default();
        decode_seq(r, |v| {
            out.insert(v);
        })?;
        Ok(out)
    }
}

fn encode_map<'a, K, V, R, I>(w: &mut Writer<R>, len: usize, entries: I) -> Result<()>
where
    K: Encode + 'a,
    V: Encode + 'a,
    R: Renderer,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    w.write_map_open(len as u64)?;
    for (key, value) in entries {
        key.encode(w)?;
        value.encode(w)?;
    }
    w.write_map_close()
}

fn decode_map<K, V, P, F>(r: &mut Reader<P>, mut insert: F) -> Result<()>
where
    K: Decode,
    V: Decode,
    P: Parser,
    F: FnMut(K, V),
{
    match r.map_open()? {
        Bound::Counted(n) => {
            for _ in 0..n {
                let key = K::decode(r)?;
                let value = V::decode(r)?;
                insert(key, value);
            }
            Ok(())
        }
        Bound::Unbounded => {
            while !r.has_break()? {
                let key = K::decode(r)?;
                let value = V::decode(r)?;
                insert(key, value);
            }
            r.read_break()
        }
    }
}

impl<K: Encode + Ord, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_map(w, self.len(), self.iter())
    }
}

/// Duplicate keys in the input are kept last-wins.
impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let mut out = BTreeMap::new();
        decode_map(r, |k, v| {
            out.insert(k, v);
        })?;
        Ok(out)
    }
}

impl<K: Encode + Eq + Hash, V: Encode, S: BuildHasher> Encode for HashMap<K, V, S> {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        encode_map(w, self.len(), self.iter())
    }
}

impl<K: Decode + Eq + Hash, V: Decode, S: BuildHasher + Default> Decode for HashMap<K, V, S> {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        let mut out = HashMap::default();
        decode_map(r, |k, v| {
            out.insert(k, v);
        })?;
        Ok(out)
    }
}

macro_rules! impl_tuple {
    ($len:expr; $($t:ident . $idx:tt),+) => {
        impl<$($t: Encode),+> Encode for ($($t,)+) {
            fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
                w.write_array_open($len)?;
                $(self.$idx.encode(w)?;)+
                w.write_array_close()
            }
        }

        impl<$($t: Decode),+> Decode for ($($t,)+) {
            fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
                let unbounded = r.read_array_open($len)?;
                let value = ($($t::decode(r)?,)+);
                r.read_array_close(unbounded, value)
            }
        }
    };
}

impl_tuple!(1; A.0);
impl_tuple!(2; A.0, B.1);
impl_tuple!(3; A.0, B.1, C.2);
impl_tuple!(4; A.0, B.1, C.2, D.3);
impl_tuple!(5; A.0, B.1, C.2, D.3, E.4);
impl_tuple!(6; A.0, B.1, C.2, D.3, E.4, F.5);
impl_tuple!(7; A.0, B.1, C.2, D.3, E.4, F.5, G.6);
impl_tuple!(8; A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cbor, json};

    #[test]
    fn option_wire_shapes() {
        assert_eq!(
            json::encode(&Some(5)).to_byte_array().unwrap(),
            b"[5]"
        );
        assert_eq!(
            json::encode(&None::<i32>).to_byte_array().unwrap(),
            b"[]"
        );
        // CBOR uses definite headers.
        assert_eq!(
            cbor::encode(&Some(5)).to_byte_array().unwrap(),
            vec![0x81, 0x05]
        );
        assert_eq!(
            cbor::encode(&None::<i32>).to_byte_array().unwrap(),
            vec![0x80]
        );
    }

    #[test]
    fn option_round_trips() {
        for value in [None, Some(42i32)] {
            let bytes = cbor::encode(&value).to_byte_array().unwrap();
            assert_eq!(cbor::decode(&bytes).to_value::<Option<i32>>().unwrap(), value);
            let text = json::encode(&value).to_byte_array().unwrap();
            assert_eq!(json::decode(&text).to_value::<Option<i32>>().unwrap(), value);
        }
    }

    #[test]
    fn either_discriminants() {
        let left: Either<i32, Vec<i32>> = Either::Left(1);
        assert_eq!(json::encode(&left).to_byte_array().unwrap(), b"[0,1]");
        let right: Either<i32, Vec<i32>> = Either::Right(vec![2, 3]);
        assert_eq!(
            json::encode(&right).to_byte_array().unwrap(),
            b"[1,[2,3]]"
        );
        let text = json::encode(&right).to_byte_array().unwrap();
        assert_eq!(
            json::decode(&text)
                .to_value::<Either<i32, Vec<i32>>>()
                .unwrap(),
            right
        );
    }

    #[test]
    fn tuples_are_fixed_arrays() {
        let value = (1u8, "two".to_string(), 3.5f64);
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        assert_eq!(bytes[0], 0x83);
        assert_eq!(
            cbor::decode(&bytes)
                .to_value::<(u8, String, f64)>()
                .unwrap(),
            value
        );
    }

    #[test]
    fn maps_round_trip_in_both_formats() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![1, 2]);
        map.insert("b".to_string(), vec![]);
        let bytes = cbor::encode(&map).to_byte_array().unwrap();
        assert_eq!(
            cbor::decode(&bytes)
                .to_value::<BTreeMap<String, Vec<i32>>>()
                .unwrap(),
            map
        );
        let text = json::encode(&map).to_byte_array().unwrap();
        assert_eq!(text, br#"{"a":[1,2],"b":[]}"#);
        assert_eq!(
            json::decode(&text)
                .to_value::<BTreeMap<String, Vec<i32>>>()
                .unwrap(),
            map
        );
    }

    #[test]
    fn json_maps_with_duplicate_keys_keep_the_last() {
        let map: BTreeMap<String, i32> = json::decode(br#"{"a":1,"a":2}"#).to_value().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], 2);
    }

    #[test]
    fn arrays_with_const_size() {
        let value = [1i32, 2, 3];
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        assert_eq!(cbor::decode(&bytes).to_value::<[i32; 3]>().unwrap(), value);
        assert!(cbor::decode(&bytes).to_value::<[i32; 4]>().is_err());
    }
}
