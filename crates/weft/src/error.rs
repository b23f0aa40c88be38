//! Error taxonomy shared by parsers, renderers, readers, writers and codecs.
//!
//! Every error carries a [`Position`]: a byte offset into the input for
//! parse-side failures, or an event ordinal for render-side failures. Errors
//! are raised immediately and never silently recovered.

use thiserror::Error;

/// A location attached to an error.
///
/// For decoding this is the byte offset of the offending data item within the
/// input. For encoding it is the ordinal of the offending event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset (decoding) or event ordinal (encoding).
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.offset)
    }
}

/// All failure modes of the engine.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    /// Malformed bytes: illegal UTF-8, illegal escapes, syntax errors, or a
    /// decoder type mismatch.
    #[error("{msg} at {pos}")]
    InvalidInputData { pos: Position, msg: String },

    /// The input is well-formed at the format level but the current decoder
    /// cannot consume the next event.
    #[error("unexpected data item: {msg} at {pos}")]
    UnexpectedDataItem { pos: Position, msg: String },

    /// The input terminated in the middle of a data item.
    #[error("unexpected end of input at {pos}")]
    UnexpectedEndOfInput { pos: Position },

    /// A size, length, nesting or number bound was exceeded.
    #[error("overflow: {msg} at {pos}")]
    Overflow { pos: Position, msg: String },

    /// An encoder attempted to emit a structurally invalid event stream.
    #[error("validation error: {msg} at {pos}")]
    Validation { pos: Position, msg: String },

    /// An error raised by a user-supplied codec, wrapped with the position of
    /// the event being processed when it was raised.
    #[error("{msg} at {pos}")]
    General { pos: Position, msg: String },
}

impl Error {
    pub(crate) fn invalid_input(pos: Position, msg: impl Into<String>) -> Self {
        Self::InvalidInputData {
            pos,
            msg: msg.into(),
        }
    }

    pub(crate) fn unexpected_item(pos: Position, msg: impl Into<String>) -> Self {
        Self::UnexpectedDataItem {
            pos,
            msg: msg.into(),
        }
    }

    pub(crate) fn unexpected_end(pos: Position) -> Self {
        Self::UnexpectedEndOfInput { pos }
    }

    pub(crate) fn overflow(pos: Position, msg: impl Into<String>) -> Self {
        Self::Overflow {
            pos,
            msg: msg.into(),
        }
    }

    pub(crate) fn validation(pos: Position, msg: impl Into<String>) -> Self {
        Self::Validation {
            pos,
            msg: msg.into(),
        }
    }

    pub(crate) fn general(pos: Position, msg: impl Into<String>) -> Self {
        Self::General {
            pos,
            msg: msg.into(),
        }
    }

    /// The position the error was raised at.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::InvalidInputData { pos, .. }
            | Self::UnexpectedDataItem { pos, .. }
            | Self::UnexpectedEndOfInput { pos }
            | Self::Overflow { pos, .. }
            | Self::Validation { pos, .. }
            | Self::General { pos, .. } => *pos,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
