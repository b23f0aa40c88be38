//! Arbitrary-precision integers and decimals.
//!
//! [`BigInt`] is a sign plus a big-endian byte magnitude; [`BigDecimal`] an
//! unscaled [`BigInt`] with a decimal scale (`value = unscaled * 10^-scale`).
//! In CBOR they use the RFC 8949 bignum tags (2/3) and the decimal-fraction
//! tag (4, as `[exponent, mantissa]`); values that fit a plain integer are
//! written as one. In JSON they travel as verbatim numeric lexemes.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::codec::{Decode, Encode};
use crate::error::Result;
use crate::item::{Target, tags};
use crate::reader::Reader;
use crate::receiver::{Parser, Renderer};
use crate::writer::Writer;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("`{input}` is not a valid decimal number")]
pub struct ParseNumberError {
    input: String,
}

fn trim_leading_zeros(magnitude: &mut Vec<u8>) {
    let nonzero = magnitude.iter().position(|&b| b != 0);
    match nonzero {
        Some(0) => {}
        Some(i) => {
            magnitude.drain(..i);
        }
        None => magnitude.clear(),
    }
}

/// `magnitude = magnitude * mul + add`, big-endian.
fn mul_add(magnitude: &mut Vec<u8>, mul: u32, add: u32) {
    let mut carry = u64::from(add);
    for b in magnitude.iter_mut().rev() {
        let v = u64::from(*b) * u64::from(mul) + carry;
        *b = v as u8;
        carry = v >> 8;
    }
    while carry > 0 {
        magnitude.insert(0, carry as u8);
        carry >>= 8;
    }
}

/// `magnitude /= div`, returning the remainder.
fn div_rem(magnitude: &mut Vec<u8>, div: u32) -> u32 {
    let mut rem = 0u64;
    for b in magnitude.iter_mut() {
        let v = rem << 8 | u64::from(*b);
        *b = (v / u64::from(div)) as u8;
        rem = v % u64::from(div);
    }
    trim_leading_zeros(magnitude);
    rem as u32
}

fn add_one(magnitude: &mut Vec<u8>) {
    for b in magnitude.iter_mut().rev() {
        let (v, overflow) = b.overflowing_add(1);
        *b = v;
        if !overflow {
            return;
        }
    }
    magnitude.insert(0, 1);
}

/// The magnitude must be non-zero.
fn sub_one(magnitude: &mut Vec<u8>) {
    for b in magnitude.iter_mut().rev() {
        let (v, underflow) = b.overflowing_sub(1);
        *b = v;
        if !underflow {
            break;
        }
    }
    trim_leading_zeros(magnitude);
}

/// A signed integer of arbitrary size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BigInt {
    negative: bool,
    /// Big-endian, without leading zeros; empty for zero.
    magnitude: Vec<u8>,
}

impl BigInt {
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds a value from a sign and a big-endian magnitude.
    #[must_use]
    pub fn from_magnitude_bytes(negative: bool, bytes: &[u8]) -> Self {
        let mut magnitude = bytes.to_vec();
        trim_leading_zeros(&mut magnitude);
        Self {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        }
    }

    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        let negative = value < 0;
        Self::from_magnitude_bytes(negative, &value.unsigned_abs().to_be_bytes())
    }

    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self::from_magnitude_bytes(false, &value.to_be_bytes())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// The big-endian magnitude, without leading zeros.
    #[must_use]
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    fn magnitude_u64(&self) -> Option<u64> {
        if self.magnitude.len() > 8 {
            return None;
        }
        let mut v = 0u64;
        for &b in &self.magnitude {
            v = v << 8 | u64::from(b);
        }
        Some(v)
    }

    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        let magnitude = self.magnitude_u64()?;
        if self.negative {
            if magnitude <= 1 << 63 {
                Some((magnitude as i64).wrapping_neg())
            } else {
                None
            }
        } else {
            i64::try_from(magnitude).ok()
        }
    }
}

impl From<i64> for BigInt {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl FromStr for BigInt {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let error = || ParseNumberError {
            input: s.to_string(),
        };
        let (negative, digits) = match s.as_bytes() {
            [b'-', rest @ ..] => (true, rest),
            [b'+', rest @ ..] => (false, rest),
            rest => (false, rest),
        };
        if digits.is_empty() {
            return Err(error());
        }
        let mut magnitude = Vec::with_capacity(digits.len() / 2 + 1);
        for &d in digits {
            if !d.is_ascii_digit() {
                return Err(error());
            }
            mul_add(&mut magnitude, 10, u32::from(d - b'0'));
        }
        trim_leading_zeros(&mut magnitude);
        Ok(Self {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        })
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.negative {
            f.write_str("-")?;
        }
        let mut scratch = self.magnitude.clone();
        let mut digits = Vec::new();
        while !scratch.is_empty() {
            digits.push(b'0' + div_rem(&mut scratch, 10) as u8);
        }
        digits.reverse();
        f.write_str(core::str::from_utf8(&digits).expect("decimal digits"))
    }
}

impl Encode for BigInt {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        if w.target() == Target::Json {
            return w.write_number_string(&self.to_string());
        }
        if let Some(v) = self.to_i64() {
            return w.write_long(v);
        }
        if self.negative {
            // -1 - n representation; fits the wire integer iff n does.
            let mut n = self.magnitude.clone();
            sub_one(&mut n);
            if n.len() <= 8 {
                let mut raw = 0u64;
                for &b in &n {
                    raw = raw << 8 | u64::from(b);
                }
                return w.write_over_long(true, raw);
            }
            w.write_tag(tags::NEGATIVE_BIGNUM)?;
            w.write_bytes(&n)
        } else {
            if let Some(magnitude) = self.magnitude_u64() {
                return w.write_unsigned_long(magnitude);
            }
            w.write_tag(tags::UNSIGNED_BIGNUM)?;
            w.write_bytes(&self.magnitude)
        }
    }
}

impl Decode for BigInt {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.has_tag_of(tags::UNSIGNED_BIGNUM) {
            r.read_tag()?;
            let bytes = r.read_bytes()?;
            return Ok(Self::from_magnitude_bytes(false, &bytes));
        }
        if r.has_tag_of(tags::NEGATIVE_BIGNUM) {
            r.read_tag()?;
            // value = -1 - n
            let bytes = r.read_bytes()?;
            let mut value = Self::from_magnitude_bytes(true, &bytes);
            add_one(&mut value.magnitude);
            value.negative = true;
            return Ok(value);
        }
        if r.has_over_long()? {
            let (negative, raw) = r.read_over_long()?;
            let mut value = Self::from_u64(raw);
            if negative {
                add_one(&mut value.magnitude);
                value.negative = true;
            }
            return Ok(value);
        }
        if r.has_number_string()? {
            let lexeme = r.read_number_string()?;
            return lexeme
                .parse()
                .map_err(|e: ParseNumberError| r.invalid_data(e.to_string()));
        }
        r.read_long().map(Self::from_i64)
    }
}

/// An arbitrary-precision decimal: `unscaled * 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BigDecimal {
    unscaled: BigInt,
    scale: i32,
}

impl BigDecimal {
    #[must_use]
    pub fn new(unscaled: BigInt, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    #[must_use]
    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    #[must_use]
    pub fn scale(&self) -> i32 {
        self.scale
    }
}

impl From<BigInt> for BigDecimal {
    fn from(unscaled: BigInt) -> Self {
        Self::new(unscaled, 0)
    }
}

impl FromStr for BigDecimal {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let error = || ParseNumberError {
            input: s.to_string(),
        };
        let (mantissa, exp) = match s.split_once(['e', 'E']) {
            Some((m, e)) => (m, e.parse::<i32>().map_err(|_| error())?),
            None => (s, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if frac_part.bytes().any(|b| !b.is_ascii_digit()) {
            return Err(error());
        }
        let mut digits = String::with_capacity(int_part.len() + frac_part.len());
        digits.push_str(int_part);
        digits.push_str(frac_part);
        let unscaled: BigInt = digits.parse().map_err(|_| error())?;
        let scale = frac_part.len() as i32 - exp;
        Ok(Self::new(unscaled, scale))
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.to_string();
        let (sign, digits) = match digits.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", digits.as_str()),
        };
        // Extreme scales render in scientific notation to keep the lexeme
        // short.
        if self.scale > 50 || self.scale < -50 {
            return write!(f, "{sign}{digits}E{}", -i64::from(self.scale));
        }
        if self.scale <= 0 {
            write!(f, "{sign}{digits}")?;
            for _ in 0..-self.scale {
                f.write_str("0")?;
            }
            return Ok(());
        }
        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

impl Encode for BigDecimal {
    fn encode<R: Renderer>(&self, w: &mut Writer<R>) -> Result<()> {
        if w.target() == Target::Json {
            return w.write_number_string(&self.to_string());
        }
        if self.scale == 0 {
            return self.unscaled.encode(w);
        }
        w.write_tag(tags::DECIMAL_FRACTION)?;
        w.write_array_header(2)?;
        w.write_long(-i64::from(self.scale))?;
        self.unscaled.encode(w)
    }
}

impl Decode for BigDecimal {
    fn decode<P: Parser>(r: &mut Reader<P>) -> Result<Self> {
        if r.has_tag_of(tags::DECIMAL_FRACTION) {
            r.read_tag()?;
            let unbounded = r.read_array_open(2)?;
            let exponent = r.read_long()?;
            let unscaled = BigInt::decode(r)?;
            let scale = i32::try_from(-exponent)
                .map_err(|_| r.invalid_data(format!("{exponent} is out of range for a scale")))?;
            return r.read_array_close(unbounded, Self::new(unscaled, scale));
        }
        if r.has_number_string()? {
            let lexeme = r.read_number_string()?;
            return lexeme
                .parse()
                .map_err(|e: ParseNumberError| r.invalid_data(e.to_string()));
        }
        if r.has_double()? {
            let mut buffer = ryu::Buffer::new();
            let rendered = buffer.format_finite(r.read_double()?).to_string();
            return rendered
                .parse()
                .map_err(|e: ParseNumberError| r.invalid_data(e.to_string()));
        }
        BigInt::decode(r).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cbor, json};

    #[test]
    fn decimal_string_round_trip() {
        for s in ["0", "1", "-1", "255", "256", "123456789012345678901234567890"] {
            let value: BigInt = s.parse().unwrap();
            assert_eq!(value.to_string(), s);
        }
        assert_eq!("  ".parse::<BigInt>().ok(), None);
        assert_eq!("--1".parse::<BigInt>().ok(), None);
        assert_eq!("-0".parse::<BigInt>().unwrap(), BigInt::zero());
    }

    #[test]
    fn small_values_encode_as_plain_integers() {
        let bytes = cbor::encode(&BigInt::from_i64(-500)).to_byte_array().unwrap();
        assert_eq!(bytes, vec![0x39, 0x01, 0xF3]);
        assert_eq!(
            cbor::decode(&bytes).to_value::<BigInt>().unwrap(),
            BigInt::from_i64(-500)
        );
    }

    #[test]
    fn unsigned_64_bit_range_uses_over_long() {
        let value: BigInt = "18446744073709551615".parse().unwrap();
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        assert_eq!(bytes[0], 0x1B);
        assert_eq!(cbor::decode(&bytes).to_value::<BigInt>().unwrap(), value);

        let value: BigInt = "-18446744073709551616".parse().unwrap();
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        assert_eq!(bytes[0], 0x3B);
        assert_eq!(cbor::decode(&bytes).to_value::<BigInt>().unwrap(), value);
    }

    #[test]
    fn large_values_use_bignum_tags() {
        let value: BigInt = "3141592653589793238462643383279502884197169399375105820974944592307816"
            .parse()
            .unwrap();
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "c2581d748734b402b41df49150f2d71eaa36fa06d63b69f95a89da23e14fa668"
        );
        assert_eq!(cbor::decode(&bytes).to_value::<BigInt>().unwrap(), value);

        let negative: BigInt = "-3141592653589793238462643383279502884197169399375105820974944592307816"
            .parse()
            .unwrap();
        let bytes = cbor::encode(&negative).to_byte_array().unwrap();
        assert_eq!(bytes[0], 0xC3);
        assert_eq!(cbor::decode(&bytes).to_value::<BigInt>().unwrap(), negative);
    }

    #[test]
    fn json_big_ints_are_number_lexemes() {
        let value: BigInt = "123456789012345678901234567890".parse().unwrap();
        let text = json::encode(&value).to_byte_array().unwrap();
        assert_eq!(text, b"123456789012345678901234567890");
        assert_eq!(json::decode(&text).to_value::<BigInt>().unwrap(), value);
    }

    #[test]
    fn big_decimal_formatting() {
        let cases = [
            ("123.45", "123.45"),
            ("0.005", "0.005"),
            ("-1.5", "-1.5"),
            ("12000", "12000"),
            ("1.5e3", "1500"),
            ("15e-4", "0.0015"),
        ];
        for (input, formatted) in cases {
            let value: BigDecimal = input.parse().unwrap();
            assert_eq!(value.to_string(), formatted, "for {input}");
        }
    }

    #[test]
    fn big_decimal_cbor_uses_tag_4() {
        let value: BigDecimal = "273.15".parse().unwrap();
        let bytes = cbor::encode(&value).to_byte_array().unwrap();
        // c4 82 21 19 6ab3
        assert_eq!(hex::encode(&bytes), "c48221196ab3");
        assert_eq!(cbor::decode(&bytes).to_value::<BigDecimal>().unwrap(), value);
    }

    #[test]
    fn big_decimal_json_round_trip() {
        let value: BigDecimal = "-0.000123456789012345678901".parse().unwrap();
        let text = json::encode(&value).to_byte_array().unwrap();
        let back: BigDecimal = json::decode(&text).to_value().unwrap();
        assert_eq!(back, value);
    }
}
