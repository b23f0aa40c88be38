//! JSON (RFC 8259) entry points.
//!
//! ```
//! let json = weft::json::encode(&vec![1, 2, 3]).to_byte_array().unwrap();
//! assert_eq!(json, b"[1,2,3]");
//! let back: Vec<i32> = weft::json::decode(&json).to_value().unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

mod parser;
mod renderer;

pub use parser::JsonParser;
pub use renderer::JsonRenderer;

use crate::codec::{Decode, Decoder, Encode};
use crate::error::Result;
use crate::io::byte_access::ByteAccess;
use crate::io::input::{BytesInput, Input, from_slice};
use crate::io::output::{ChunkedOutput, DEFAULT_CHUNK_SIZE, Output};
use crate::reader::Reader;
use crate::validation::MAX_NESTING;
use crate::writer::Writer;

/// Bounds and modes applied while decoding JSON.
#[derive(Debug, Clone)]
pub struct JsonDecodeConfig {
    pub max_string_length: usize,
    pub max_number_mantissa_digits: u32,
    pub max_number_abs_exponent: u32,
    pub initial_char_buffer_size: usize,
    /// Suppresses the lossless-double path so that every number carrying a
    /// fraction or exponent surfaces as a verbatim `NumberString`.
    pub read_decimal_numbers_only_as_number_strings: bool,
}

impl Default for JsonDecodeConfig {
    fn default() -> Self {
        Self {
            max_string_length: i32::MAX as usize,
            max_number_mantissa_digits: 34,
            max_number_abs_exponent: 999,
            initial_char_buffer_size: 256,
            read_decimal_numbers_only_as_number_strings: false,
        }
    }
}

/// Buffer and layout settings applied while encoding JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonEncodeConfig {
    pub buffer_size: usize,
    pub allow_buffer_caching: bool,
    /// Indentation per nesting level; `None` renders compact.
    pub pretty_indent: Option<String>,
}

impl JsonEncodeConfig {
    pub(crate) fn effective_buffer_size(&self) -> usize {
        if self.buffer_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.buffer_size
        }
    }
}

/// Starts an encoding run for `value`.
pub fn encode<T: Encode + ?Sized>(value: &T) -> EncodingSetup<'_, T> {
    EncodingSetup {
        value,
        config: JsonEncodeConfig::default(),
    }
}

/// Starts a decoding run over a byte slice.
pub fn decode(bytes: &[u8]) -> DecodingSetup<BytesInput<&[u8]>> {
    decode_input(from_slice(bytes))
}

/// Starts a decoding run over an arbitrary [`Input`].
pub fn decode_input<I: Input>(input: I) -> DecodingSetup<I> {
    DecodingSetup {
        input,
        config: JsonDecodeConfig::default(),
    }
}

pub struct EncodingSetup<'a, T: ?Sized> {
    value: &'a T,
    config: JsonEncodeConfig,
}

impl<T: Encode + ?Sized> EncodingSetup<'_, T> {
    #[must_use]
    pub fn with_config(mut self, config: JsonEncodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Encodes into a fresh contiguous byte vector.
    pub fn to_byte_array(self) -> Result<Vec<u8>> {
        let out = ChunkedOutput::new(
            self.config.effective_buffer_size(),
            self.config.allow_buffer_caching,
        );
        self.to_output(out)
    }

    /// Encodes to a `String`.
    pub fn to_string(self) -> Result<String> {
        self.to_byte_array().map(|bytes| {
            // The renderer only ever emits valid UTF-8.
            String::from_utf8(bytes).expect("renderer output is UTF-8")
        })
    }

    /// Encodes into a byte container of the given adapter.
    pub fn to_bytes<A: ByteAccess>(self, access: &A) -> Result<A::Bytes> {
        self.to_byte_array().map(|v| access.from_vec(v))
    }

    /// Encodes into an arbitrary [`Output`].
    pub fn to_output<O: Output>(self, out: O) -> Result<O::Result> {
        let renderer = JsonRenderer::new(out, self.config.pretty_indent.clone());
        let mut writer = Writer::new(renderer, MAX_NESTING);
        self.value.encode(&mut writer)?;
        writer.finish()
    }
}

pub struct DecodingSetup<I: Input> {
    input: I,
    config: JsonDecodeConfig,
}

impl<I: Input> DecodingSetup<I> {
    #[must_use]
    pub fn with_config(mut self, config: JsonDecodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Decodes a single value and asserts that the input is exhausted.
    pub fn to_value<T: Decode>(self) -> Result<T> {
        let mut reader = self.reader()?;
        let value = T::decode(&mut reader)?;
        reader.read_end_of_input()?;
        Ok(value)
    }

    /// Like [`DecodingSetup::to_value`], using an explicit decoder object.
    pub fn to_value_with<T, D: Decoder<T>>(self, decoder: &D) -> Result<T> {
        let mut reader = self.reader()?;
        let value = decoder.decode_value(&mut reader)?;
        reader.read_end_of_input()?;
        Ok(value)
    }

    /// Hands out the reader for manual event-level decoding.
    pub fn reader(self) -> Result<Reader<JsonParser<I>>> {
        Reader::new(JsonParser::new(self.input, self.config))
    }
}
