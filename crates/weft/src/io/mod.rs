//! Input/output abstractions: byte sources with padded reads, chunked byte
//! sinks, byte-container adapters and the optional buffer cache.

pub mod byte_access;
pub(crate) mod cache;
pub mod input;
pub mod output;

pub use byte_access::{BoxedSliceAccess, ByteAccess, VecAccess};
pub use input::{BytesInput, ChunkedInput, Input};
pub use output::{ChunkedOutput, NullOutput, Output, WriteOutput};
