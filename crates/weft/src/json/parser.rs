//! Pull parser for RFC 8259 text.
//!
//! The hot paths run word-parallel over 8-byte windows fetched with padded
//! reads: whitespace skipping marks bytes above `0x20` and jumps to the
//! first hit via count-leading-zeros; string scanning copies clean windows
//! verbatim and drops to a byte-wise slow path only at quotes, backslashes,
//! control characters and non-ASCII bytes. The `0xFF` padding byte is
//! outside every scanned class, so the scans stop at the end of input
//! without bounds checks in the loop.
//!
//! Numbers are classified adaptively: integers that fit go out as
//! `Int`/`Long`, decimals inside the lossless double window as `Double`,
//! everything else as a verbatim `NumberString` lexeme materialized straight
//! from the input bytes.
//!
//! The parser is a seven-state machine over at most 64 nesting levels,
//! tracked as a depth counter plus one is-map bit per level.

use crate::error::{Error, Position, Result};
use crate::io::input::Input;
use crate::item::{Item, Target};
use crate::json::JsonDecodeConfig;
use crate::receiver::Parser;

const LO: u64 = 0x0101_0101_0101_0101;
const HI: u64 = 0x8080_8080_8080_8080;

/// Marks (with the byte's high bit) every byte equal to `n`. May spuriously
/// mark a byte directly preceding a true hit; callers must tolerate false
/// positives, never false negatives.
#[inline]
fn swar_eq(x: u64, n: u8) -> u64 {
    let v = x ^ (LO * u64::from(n));
    v.wrapping_sub(LO) & !v & HI
}

/// Marks every byte greater than `n` (`n < 0x80`). Exact.
#[inline]
fn swar_gt(x: u64, n: u8) -> u64 {
    (((x & !HI) + (LO * (0x7F - u64::from(n)))) | x) & HI
}

/// Marks every byte less than `n` (`n < 0x80`). Exact.
#[inline]
fn swar_lt(x: u64, n: u8) -> u64 {
    !(((x & !HI) + (LO * (0x80 - u64::from(n)))) | x) & HI
}

/// Exact powers of ten representable in an `f64` without rounding.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectValue,
    ExpectArrayValueOrBreak,
    ExpectCommaAndArrayValueOrBreak,
    ExpectMapKeyOrBreak,
    ExpectColonAndMapValue,
    ExpectCommaAndMapKeyOrBreak,
    ExpectEndOfInput,
}

/// Running state of one number literal: a negative accumulator (so both
/// signs share the same overflow check) plus digit bookkeeping.
#[derive(Debug, Default)]
struct Digits {
    acc: i64,
    count: u32,
    too_big: bool,
}

pub struct JsonParser<I: Input> {
    input: I,
    config: JsonDecodeConfig,
    state: State,
    /// One bit per nesting level; set means the level is a map.
    map_levels: u64,
    depth: u32,
    scratch: String,
    item_start: usize,
    ended: bool,
}

impl<I: Input> JsonParser<I> {
    pub fn new(input: I, config: JsonDecodeConfig) -> Self {
        let scratch = String::with_capacity(config.initial_char_buffer_size);
        Self {
            input,
            config,
            state: State::ExpectValue,
            map_levels: 0,
            depth: 0,
            scratch,
            item_start: 0,
            ended: false,
        }
    }

    pub fn into_input(self) -> I {
        self.input
    }

    #[inline]
    fn pos_at(&self, cursor: usize) -> Position {
        self.input.position(cursor)
    }

    /// Error for the most recently consumed byte.
    fn invalid_here(&self, msg: impl Into<String>) -> Error {
        Error::invalid_input(self.pos_at(self.input.cursor() - 1), msg)
    }

    fn skip_whitespace(&mut self) {
        loop {
            let octa = self.input.read_octa_byte_be_padded();
            let non_ws = swar_gt(octa, 0x20);
            if non_ws != 0 {
                let k = (non_ws.leading_zeros() / 8) as usize;
                self.input.unread(8 - k);
                return;
            }
        }
    }

    /// Consumes the next non-whitespace byte, or reports the end of input.
    fn next_token_byte(&mut self) -> Result<u8> {
        self.skip_whitespace();
        let b = self.input.read_byte_padded();
        if b == 0xFF {
            self.input.unread(1);
            if !self.input.has_bytes(1) {
                return Err(Error::unexpected_end(self.pos_at(self.input.cursor())));
            }
            self.input.read_byte_padded();
        }
        Ok(b)
    }

    #[inline]
    fn level_is_map(&self) -> bool {
        self.depth > 0 && (self.map_levels >> (self.depth - 1)) & 1 == 1
    }

    fn push_level(&mut self, map: bool) -> Result<()> {
        if self.depth == 64 {
            return Err(Error::overflow(
                self.pos_at(self.item_start),
                "exceeded the maximum of 64 nesting levels",
            ));
        }
        if map {
            self.map_levels |= 1 << self.depth;
        } else {
            self.map_levels &= !(1 << self.depth);
        }
        self.depth += 1;
        Ok(())
    }

    fn pop_level(&mut self) {
        self.depth -= 1;
        self.after_value();
    }

    /// Sets the state a completed value leads to.
    fn after_value(&mut self) {
        self.state = if self.depth == 0 {
            State::ExpectEndOfInput
        } else if self.level_is_map() {
            State::ExpectCommaAndMapKeyOrBreak
        } else {
            State::ExpectCommaAndArrayValueOrBreak
        };
    }

    fn parse_value(&mut self, b: u8) -> Result<Item> {
        match b {
            b'{' => {
                self.push_level(true)?;
                self.state = State::ExpectMapKeyOrBreak;
                Ok(Item::MapStart)
            }
            b'[' => {
                self.push_level(false)?;
                self.state = State::ExpectArrayValueOrBreak;
                Ok(Item::ArrayStart)
            }
            b'"' => {
                let s = self.parse_string()?;
                self.after_value();
                Ok(Item::Str(s))
            }
            b't' => {
                self.expect_literal("true", b"rue")?;
                self.after_value();
                Ok(Item::Bool(true))
            }
            b'f' => {
                self.expect_literal("false", b"alse")?;
                self.after_value();
                Ok(Item::Bool(false))
            }
            b'n' => {
                self.expect_literal("null", b"ull")?;
                self.after_value();
                Ok(Item::Null)
            }
            b'-' | b'0'..=b'9' => {
                let item = self.parse_number(b)?;
                self.after_value();
                Ok(item)
            }
            _ => Err(self.invalid_here(format!("Expected JSON value but got '{}'", b as char))),
        }
    }

    fn expect_literal(&mut self, name: &str, rest: &[u8]) -> Result<()> {
        for &expected in rest {
            let b = self.input.read_byte_padded();
            if b != expected {
                self.input.unread(1);
                if !self.input.has_bytes(1) {
                    return Err(Error::unexpected_end(self.pos_at(self.input.cursor())));
                }
                return Err(Error::invalid_input(
                    self.pos_at(self.item_start),
                    format!("Expected keyword `{name}`"),
                ));
            }
        }
        Ok(())
    }

    /// Parses a map key, leaving the state expecting the colon.
    fn parse_key(&mut self) -> Result<Item> {
        let s = self.parse_string()?;
        self.state = State::ExpectColonAndMapValue;
        Ok(Item::Str(s))
    }

    // --- strings --------------------------------------------------------

    /// Parses a string body (opening quote already consumed) into the
    /// scratch buffer.
    fn parse_string(&mut self) -> Result<String> {
        self.scratch.clear();
        loop {
            let octa = self.input.read_octa_byte_be_padded();
            let special =
                swar_eq(octa, b'"') | swar_eq(octa, b'\\') | (octa & HI) | swar_lt(octa, 0x20);
            if special == 0 {
                for b in octa.to_be_bytes() {
                    self.scratch.push(b as char);
                }
                self.check_string_length()?;
                continue;
            }
            let k = (special.leading_zeros() / 8) as usize;
            let bytes = octa.to_be_bytes();
            for &b in &bytes[..k] {
                self.scratch.push(b as char);
            }
            self.input.unread(8 - k);
            let b = self.input.read_byte_padded();
            match b {
                b'"' => {
                    self.check_string_length()?;
                    return Ok(self.scratch.clone());
                }
                b'\\' => self.parse_escape()?,
                b if b >= 0x80 => self.parse_multi_byte()?,
                b if b < 0x20 => {
                    return Err(self.invalid_here(format!(
                        "illegal control character 0x{b:02X} in string"
                    )));
                }
                // The word scan may over-mark a byte next to a real hit;
                // such a byte is plain ASCII.
                b => self.scratch.push(b as char),
            }
        }
    }

    fn check_string_length(&self) -> Result<()> {
        if self.scratch.len() > self.config.max_string_length {
            return Err(Error::overflow(
                self.pos_at(self.input.cursor()),
                "string exceeds the configured maximum length",
            ));
        }
        Ok(())
    }

    fn parse_escape(&mut self) -> Result<()> {
        let b = self.input.read_byte()?;
        let decoded = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{0008}',
            b'f' => '\u{000C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.parse_unicode_escape(),
            _ => {
                return Err(self.invalid_here(format!("illegal escape sequence `\\{}`", b as char)));
            }
        };
        self.scratch.push(decoded);
        Ok(())
    }

    fn read_hex_quad(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let b = self.input.read_byte()?;
            let digit = match b {
                b'0'..=b'9' => u32::from(b - b'0'),
                b'a'..=b'f' => u32::from(b - b'a') + 10,
                b'A'..=b'F' => u32::from(b - b'A') + 10,
                _ => {
                    return Err(
                        self.invalid_here(format!("illegal hex digit '{}' in escape", b as char))
                    );
                }
            };
            value = value << 4 | digit;
        }
        Ok(value)
    }

    fn parse_unicode_escape(&mut self) -> Result<()> {
        let first = self.read_hex_quad()?;
        let code_point = match first {
            0xD800..=0xDBFF => {
                // High surrogate: the low half must follow immediately.
                let b1 = self.input.read_byte()?;
                let b2 = self.input.read_byte()?;
                if b1 != b'\\' || b2 != b'u' {
                    return Err(self.invalid_here(format!("unpaired surrogate \\u{first:04X}")));
                }
                let second = self.read_hex_quad()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.invalid_here(format!(
                        "illegal surrogate pair \\u{first:04X}\\u{second:04X}"
                    )));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.invalid_here(format!("unpaired surrogate \\u{first:04X}")));
            }
            cp => cp,
        };
        let c = char::from_u32(code_point)
            .ok_or_else(|| self.invalid_here(format!("illegal code point {code_point:#X}")))?;
        self.scratch.push(c);
        Ok(())
    }

    fn continuation_byte(&mut self) -> Result<u32> {
        let b = self.input.read_byte()?;
        if b & 0xC0 != 0x80 {
            return Err(self.invalid_here(format!("illegal UTF-8 continuation byte 0x{b:02X}")));
        }
        Ok(u32::from(b & 0x3F))
    }

    /// Decodes one multi-byte UTF-8 scalar. The lead byte has been consumed;
    /// it is re-read here so that end-of-input padding is told apart from a
    /// real stray byte.
    fn parse_multi_byte(&mut self) -> Result<()> {
        self.input.unread(1);
        if !self.input.has_bytes(1) {
            return Err(Error::unexpected_end(self.pos_at(self.input.cursor())));
        }
        let lead = self.input.read_byte()?;
        let code_point = match lead {
            0xC2..=0xDF => {
                let c1 = self.continuation_byte()?;
                (u32::from(lead & 0x1F) << 6) | c1
            }
            0xE0..=0xEF => {
                let c1 = self.continuation_byte()?;
                if lead == 0xE0 && c1 < 0x20 {
                    return Err(self.invalid_here("over-long UTF-8 encoding"));
                }
                let c2 = self.continuation_byte()?;
                let cp = (u32::from(lead & 0x0F) << 12) | c1 << 6 | c2;
                if (0xD800..=0xDFFF).contains(&cp) {
                    return Err(self.invalid_here(format!("UTF-8 encoded surrogate {cp:#X}")));
                }
                cp
            }
            0xF0..=0xF4 => {
                let c1 = self.continuation_byte()?;
                if lead == 0xF0 && c1 < 0x10 {
                    return Err(self.invalid_here("over-long UTF-8 encoding"));
                }
                if lead == 0xF4 && c1 > 0x0F {
                    return Err(self.invalid_here("code point beyond U+10FFFF"));
                }
                let c2 = self.continuation_byte()?;
                let c3 = self.continuation_byte()?;
                (u32::from(lead & 0x07) << 18) | c1 << 12 | c2 << 6 | c3
            }
            _ => {
                return Err(self.invalid_here(format!("illegal UTF-8 start byte 0x{lead:02X}")));
            }
        };
        let c = char::from_u32(code_point)
            .ok_or_else(|| self.invalid_here(format!("illegal code point {code_point:#X}")))?;
        self.scratch.push(c);
        self.check_string_length()
    }

    // --- numbers --------------------------------------------------------

    /// Reads a run of digits into the accumulator. Returns the first
    /// non-digit byte, already consumed.
    fn read_digit_run(&mut self, digits: &mut Digits) -> Result<u8> {
        loop {
            let b = self.input.read_byte_padded();
            if !b.is_ascii_digit() {
                return Ok(b);
            }
            digits.count += 1;
            if digits.count > self.config.max_number_mantissa_digits {
                return Err(Error::overflow(
                    self.pos_at(self.input.cursor() - 1),
                    "number exceeds the configured maximum mantissa digit count",
                ));
            }
            let d = i64::from(b - b'0');
            match digits.acc.checked_mul(10).and_then(|a| a.checked_sub(d)) {
                Some(a) => digits.acc = a,
                None => digits.too_big = true,
            }
        }
    }

    /// Reads the exponent after `e`/`E`. Returns the signed exponent and the
    /// first byte after it, already consumed.
    fn read_exponent(&mut self) -> Result<(i32, u8)> {
        let mut b = self.input.read_byte_padded();
        let negative = match b {
            b'-' => {
                b = self.input.read_byte_padded();
                true
            }
            b'+' => {
                b = self.input.read_byte_padded();
                false
            }
            _ => false,
        };
        if !b.is_ascii_digit() {
            self.input.unread(1);
            if !self.input.has_bytes(1) {
                return Err(Error::unexpected_end(self.pos_at(self.input.cursor())));
            }
            self.input.read_byte_padded();
            return Err(self.invalid_here(format!(
                "Expected digit in exponent but got '{}'",
                b as char
            )));
        }
        let max = self.config.max_number_abs_exponent as i32;
        let mut value = 0i32;
        loop {
            value = value * 10 + i32::from(b - b'0');
            if value > max {
                return Err(Error::overflow(
                    self.pos_at(self.input.cursor() - 1),
                    "exponent exceeds the configured maximum",
                ));
            }
            b = self.input.read_byte_padded();
            if !b.is_ascii_digit() {
                break;
            }
        }
        Ok((if negative { -value } else { value }, b))
    }

    fn parse_number(&mut self, first: u8) -> Result<Item> {
        let start = self.input.cursor() - 1;
        let mut digits = Digits::default();
        let mut b = first;
        let negative = b == b'-';
        if negative {
            b = self.input.read_byte_padded();
            if !b.is_ascii_digit() {
                self.input.unread(1);
                if !self.input.has_bytes(1) {
                    return Err(Error::unexpected_end(self.pos_at(self.input.cursor())));
                }
                self.input.read_byte_padded();
                return Err(
                    self.invalid_here(format!("Expected digit but got '{}'", b as char))
                );
            }
        }
        // Integral part. A leading zero must stand alone.
        if b == b'0' {
            b = self.input.read_byte_padded();
            if b.is_ascii_digit() {
                return Err(self.invalid_here("leading zeros are not allowed"));
            }
        } else {
            digits.count = 1;
            digits.acc = -i64::from(b - b'0');
            b = self.read_digit_run(&mut digits)?;
        }

        let mut frac_digits = 0i32;
        let has_frac = b == b'.';
        if has_frac {
            let before = digits.count;
            b = self.read_digit_run(&mut digits)?;
            frac_digits = (digits.count - before) as i32;
            if frac_digits == 0 {
                return Err(self.invalid_here(format!(
                    "Expected digit after decimal point but got '{}'",
                    b as char
                )));
            }
        }

        let mut exp = 0i32;
        let has_exp = b == b'e' || b == b'E';
        if has_exp {
            let (e, nb) = self.read_exponent()?;
            exp = e;
            b = nb;
        }

        // `b` is the first byte after the number.
        let _ = b;
        self.input.unread(1);
        let end = self.input.cursor();

        self.classify_number(start, end, &digits, negative, has_frac, has_exp, frac_digits, exp)
    }

    /// The dispatch policy: `Int` where it fits, then `Long`, then a
    /// lossless `Double`, then an integral `Long` with trailing zeros, and a
    /// verbatim `NumberString` as the last resort.
    #[allow(clippy::too_many_arguments)]
    fn classify_number(
        &mut self,
        start: usize,
        end: usize,
        digits: &Digits,
        negative: bool,
        has_frac: bool,
        has_exp: bool,
        frac_digits: i32,
        exp: i32,
    ) -> Result<Item> {
        if !has_frac && !has_exp {
            if !digits.too_big {
                if negative {
                    return Ok(Self::long_item(digits.acc));
                }
                if let Some(value) = digits.acc.checked_neg() {
                    return Ok(Self::long_item(value));
                }
            }
            return Ok(Item::NumberString(self.lexeme(start, end)));
        }

        if !self.config.read_decimal_numbers_only_as_number_strings && !digits.too_big {
            let adjusted = exp - frac_digits;
            let mantissa = digits.acc.unsigned_abs();
            if mantissa <= 1 << 53 && (-22..=22).contains(&adjusted) {
                let m = mantissa as f64;
                let scale = POW10[adjusted.unsigned_abs() as usize];
                let magnitude = if adjusted >= 0 { m * scale } else { m / scale };
                return Ok(Item::Double(if negative { -magnitude } else { magnitude }));
            }
            if (0..=18).contains(&adjusted) {
                let scaled = (0..adjusted).try_fold(digits.acc, |a, _| a.checked_mul(10));
                if let Some(scaled) = scaled {
                    if negative {
                        return Ok(Self::long_item(scaled));
                    }
                    if let Some(value) = scaled.checked_neg() {
                        return Ok(Self::long_item(value));
                    }
                }
            }
        }
        Ok(Item::NumberString(self.lexeme(start, end)))
    }

    fn long_item(value: i64) -> Item {
        match i32::try_from(value) {
            Ok(i) => Item::Int(i),
            Err(_) => Item::Long(value),
        }
    }

    /// Materializes the exact number lexeme from the input bytes.
    fn lexeme(&mut self, start: usize, end: usize) -> String {
        let mut s = String::new();
        self.input.preceding_bytes_as_ascii(end - start, &mut s);
        s
    }
}

impl<I: Input> Parser for JsonParser<I> {
    fn pull(&mut self) -> Result<Item> {
        if self.ended {
            return Ok(Item::EndOfInput);
        }
        match self.state {
            State::ExpectValue => {
                self.skip_whitespace();
                self.item_start = self.input.cursor();
                let b = self.next_token_byte()?;
                self.parse_value(b)
            }
            State::ExpectArrayValueOrBreak => {
                self.skip_whitespace();
                self.item_start = self.input.cursor();
                let b = self.next_token_byte()?;
                if b == b']' {
                    self.pop_level();
                    Ok(Item::Break)
                } else {
                    self.parse_value(b)
                }
            }
            State::ExpectCommaAndArrayValueOrBreak => {
                let b = self.next_token_byte()?;
                match b {
                    b',' => {
                        self.skip_whitespace();
                        self.item_start = self.input.cursor();
                        let b = self.next_token_byte()?;
                        self.parse_value(b)
                    }
                    b']' => {
                        self.item_start = self.input.cursor() - 1;
                        self.pop_level();
                        Ok(Item::Break)
                    }
                    _ => Err(self.invalid_here(format!(
                        "Expected ',' or ']' but got '{}'",
                        b as char
                    ))),
                }
            }
            State::ExpectMapKeyOrBreak => {
                let b = self.next_token_byte()?;
                self.item_start = self.input.cursor() - 1;
                match b {
                    b'}' => {
                        self.pop_level();
                        Ok(Item::Break)
                    }
                    b'"' => self.parse_key(),
                    _ => Err(self.invalid_here(format!(
                        "Expected '\"' or '}}' but got '{}'",
                        b as char
                    ))),
                }
            }
            State::ExpectColonAndMapValue => {
                let b = self.next_token_byte()?;
                if b != b':' {
                    return Err(
                        self.invalid_here(format!("Expected ':' but got '{}'", b as char))
                    );
                }
                self.skip_whitespace();
                self.item_start = self.input.cursor();
                let b = self.next_token_byte()?;
                self.parse_value(b)
            }
            State::ExpectCommaAndMapKeyOrBreak => {
                let b = self.next_token_byte()?;
                match b {
                    b',' => {
                        let b = self.next_token_byte()?;
                        self.item_start = self.input.cursor() - 1;
                        if b != b'"' {
                            return Err(self.invalid_here(format!(
                                "Expected '\"' but got '{}'",
                                b as char
                            )));
                        }
                        self.parse_key()
                    }
                    b'}' => {
                        self.item_start = self.input.cursor() - 1;
                        self.pop_level();
                        Ok(Item::Break)
                    }
                    _ => Err(self.invalid_here(format!(
                        "Expected ',' or '}}' but got '{}'",
                        b as char
                    ))),
                }
            }
            State::ExpectEndOfInput => {
                self.skip_whitespace();
                self.item_start = self.input.cursor();
                if self.input.has_bytes(1) {
                    let b = self.input.read_byte_padded();
                    return Err(self.invalid_here(format!(
                        "Expected end of input but got '{}'",
                        b as char
                    )));
                }
                self.ended = true;
                Ok(Item::EndOfInput)
            }
        }
    }

    fn position(&self) -> Position {
        self.pos_at(self.item_start)
    }

    fn target(&self) -> Target {
        Target::Json
    }
}

#[cfg(test)]
mod tests;
