//! Format conversion through the event model, without an intermediate tree.
//!
//! JSON to CBOR is lossless. CBOR to JSON is lossy for events JSON cannot
//! carry: tags are dropped, half-precision floats widen to single precision,
//! byte strings re-encode as base64 text, chunked strings coalesce.
//! `Undefined` and simple values have no JSON counterpart and fail the
//! conversion.

use crate::base::{Base64, BaseEncoding};
use crate::cbor::{CborDecodeConfig, CborEncodeConfig, CborParser, CborRenderer};
use crate::error::Result;
use crate::io::input::{Input, from_slice};
use crate::io::output::ChunkedOutput;
use crate::item::Item;
use crate::json::{JsonDecodeConfig, JsonEncodeConfig, JsonParser, JsonRenderer};
use crate::receiver::{Parser, Receiver, Renderer};

/// Converts one CBOR data item to JSON text.
pub fn cbor_to_json(cbor: &[u8]) -> Result<Vec<u8>> {
    cbor_to_json_with(cbor, CborDecodeConfig::default(), JsonEncodeConfig::default())
}

/// [`cbor_to_json`] with explicit configurations.
pub fn cbor_to_json_with(
    cbor: &[u8],
    decode: CborDecodeConfig,
    encode: JsonEncodeConfig,
) -> Result<Vec<u8>> {
    let mut parser = CborParser::new(from_slice(cbor), decode);
    let out = ChunkedOutput::new(encode.effective_buffer_size(), encode.allow_buffer_caching);
    let mut renderer = JsonRenderer::new(out, encode.pretty_indent);
    loop {
        let item = parser.pull()?;
        match item {
            Item::EndOfInput => {
                renderer.receive(Item::EndOfInput)?;
                return Ok(renderer.into_output());
            }
            Item::Tag(_) => {}
            Item::Float16(f) => renderer.receive(Item::Float(f))?,
            Item::Bytes(b) => renderer.receive(Item::Str(Base64::encode(&b)))?,
            Item::BytesStart => {
                let bytes = collect_byte_chunks(&mut parser)?;
                renderer.receive(Item::Str(Base64::encode(&bytes)))?;
            }
            Item::TextStart => {
                let text = collect_text_chunks(&mut parser)?;
                renderer.receive(Item::Str(text))?;
            }
            other => renderer.receive(other)?,
        }
    }
}

/// Converts one JSON document to CBOR bytes.
pub fn json_to_cbor(json: &[u8]) -> Result<Vec<u8>> {
    json_to_cbor_with(json, JsonDecodeConfig::default(), CborEncodeConfig::default())
}

/// [`json_to_cbor`] with explicit configurations.
pub fn json_to_cbor_with(
    json: &[u8],
    decode: JsonDecodeConfig,
    encode: CborEncodeConfig,
) -> Result<Vec<u8>> {
    let mut parser = JsonParser::new(from_slice(json), decode);
    let out = ChunkedOutput::new(encode.buffer_size, encode.allow_buffer_caching);
    let mut renderer = CborRenderer::new(out);
    loop {
        let item = parser.pull()?;
        let done = item == Item::EndOfInput;
        renderer.receive(item)?;
        if done {
            return Ok(renderer.into_output());
        }
    }
}

fn collect_byte_chunks<I: Input>(parser: &mut CborParser<I>) -> Result<Vec<u8>> {
    let mut merged = Vec::new();
    loop {
        match parser.pull()? {
            Item::Bytes(chunk) => merged.extend_from_slice(&chunk),
            Item::Break => return Ok(merged),
            // The parser enforces chunk typing.
            _ => unreachable!("chunked byte string"),
        }
    }
}

fn collect_text_chunks<I: Input>(parser: &mut CborParser<I>) -> Result<String> {
    let mut merged = String::new();
    loop {
        match parser.pull()? {
            Item::Str(chunk) => merged.push_str(&chunk),
            Item::Break => return Ok(merged),
            _ => unreachable!("chunked text string"),
        }
    }
}
