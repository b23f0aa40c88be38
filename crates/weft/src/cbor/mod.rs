//! CBOR (RFC 8949) entry points.
//!
//! ```
//! let bytes = weft::cbor::encode(&vec![1u8, 2, 3]).to_byte_array().unwrap();
//! let back: Vec<u8> = weft::cbor::decode(&bytes).to_value().unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

mod parser;
mod renderer;

pub use parser::CborParser;
pub use renderer::CborRenderer;

use crate::codec::{Decode, Decoder, Encode};
use crate::error::Result;
use crate::io::byte_access::ByteAccess;
use crate::io::input::{BytesInput, Input, from_slice};
use crate::io::output::{ChunkedOutput, DEFAULT_CHUNK_SIZE, Output};
use crate::reader::Reader;
use crate::validation::MAX_NESTING;
use crate::writer::Writer;

/// Bounds applied while decoding CBOR.
#[derive(Debug, Clone)]
pub struct CborDecodeConfig {
    pub max_array_length: u64,
    pub max_map_length: u64,
    pub max_byte_string_length: u64,
    pub max_text_string_length: u64,
    /// Clamped to 64.
    pub max_nesting_levels: usize,
    pub allow_buffer_caching: bool,
}

impl Default for CborDecodeConfig {
    fn default() -> Self {
        Self {
            max_array_length: i32::MAX as u64,
            max_map_length: i32::MAX as u64,
            max_byte_string_length: i32::MAX as u64,
            max_text_string_length: i32::MAX as u64,
            max_nesting_levels: MAX_NESTING,
            allow_buffer_caching: true,
        }
    }
}

/// Buffer settings applied while encoding CBOR.
#[derive(Debug, Clone)]
pub struct CborEncodeConfig {
    pub buffer_size: usize,
    pub allow_buffer_caching: bool,
}

impl Default for CborEncodeConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_CHUNK_SIZE,
            allow_buffer_caching: true,
        }
    }
}

/// Starts an encoding run for `value`.
pub fn encode<T: Encode + ?Sized>(value: &T) -> EncodingSetup<'_, T> {
    EncodingSetup {
        value,
        config: CborEncodeConfig::default(),
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
        config: CborDecodeConfig::default(),
    }
}

pub struct EncodingSetup<'a, T: ?Sized> {
    value: &'a T,
    config: CborEncodeConfig,
}

impl<T: Encode + ?Sized> EncodingSetup<'_, T> {
    #[must_use]
    pub fn with_config(mut self, config: CborEncodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Encodes into a fresh contiguous byte vector.
    pub fn to_byte_array(self) -> Result<Vec<u8>> {
        let out = ChunkedOutput::new(self.config.buffer_size, self.config.allow_buffer_caching);
        self.to_output(out)
    }

    /// Encodes into a byte container of the given adapter.
    pub fn to_bytes<A: ByteAccess>(self, access: &A) -> Result<A::Bytes> {
        self.to_byte_array().map(|v| access.from_vec(v))
    }

    /// Encodes into an arbitrary [`Output`].
    pub fn to_output<O: Output>(self, out: O) -> Result<O::Result> {
        let mut writer = Writer::new(CborRenderer::new(out), MAX_NESTING);
        self.value.encode(&mut writer)?;
        writer.finish()
    }
}

pub struct DecodingSetup<I: Input> {
    input: I,
    config: CborDecodeConfig,
}

impl<I: Input> DecodingSetup<I> {
    #[must_use]
    pub fn with_config(mut self, config: CborDecodeConfig) -> Self {
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
    pub fn reader(self) -> Result<Reader<CborParser<I>>> {
        Reader::new(CborParser::new(self.input, self.config))
    }
}
