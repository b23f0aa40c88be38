//! weft — a dual-format (CBOR + JSON) serialization engine.
//!
//! Both formats are driven through one streaming event model: parsers emit a
//! flat sequence of [`Item`]s, renderers consume one, and no document tree
//! is built in between. Callers that know their types statically go through
//! the [`Encode`]/[`Decode`] traits and the [`cbor`]/[`json`] entry points:
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! let mut value = BTreeMap::new();
//! value.insert("primes".to_string(), vec![2, 3, 5, 7]);
//!
//! let bytes = weft::cbor::encode(&value).to_byte_array().unwrap();
//! let json = weft::transcode::cbor_to_json(&bytes).unwrap();
//! assert_eq!(json, br#"{"primes":[2,3,5,7]}"#);
//!
//! let back: BTreeMap<String, Vec<i32>> = weft::json::decode(&json).to_value().unwrap();
//! assert_eq!(back, value);
//! ```
//!
//! Event-level access goes through [`Reader`] (pull, single-item lookahead)
//! and [`Writer`] (push, structurally validated); custom wire shapes are
//! built from those in `Encode`/`Decode` impls or via the combinator traits
//! in [`codec`].

pub mod base;
pub mod cbor;
pub mod codec;
pub mod io;
pub mod json;
pub mod logging;
pub mod script;
pub mod transcode;

mod error;
mod item;
mod reader;
mod receiver;
mod validation;
mod writer;

pub use codec::{Decode, Encode};
pub use error::{Error, Position, Result};
pub use item::{Item, Target, tags};
pub use reader::{Bound, Reader};
pub use receiver::{Parser, Receiver, Renderer, Transformer};
pub use validation::{MAX_NESTING, Validated, Validator};
pub use writer::Writer;
