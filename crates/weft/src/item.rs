//! The wire alphabet: every parser emits, and every renderer consumes,
//! exactly one [`Item`] per call.
//!
//! `Item` is the narrow waist between the two formats. A CBOR byte stream and
//! a JSON text are both flattened into the same sequence of items, which is
//! what makes transcoding and format-agnostic codecs possible.

/// The format an event stream is bound for (or originates from).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Cbor,
    Json,
}

/// One primitive data item of the streaming event model.
///
/// Scalar variants carry their decoded value. Container variants come in a
/// definite flavor (`ArrayHeader`/`MapHeader`, announcing the element count
/// up front) and an indefinite one (`ArrayStart`/`MapStart`, terminated by
/// `Break`). `BytesStart`/`TextStart` open chunked byte/text strings whose
/// chunks follow as `Bytes`/`Str` items until `Break`.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Null,
    Undefined,
    Bool(bool),
    /// An integer within the signed 32-bit range.
    Int(i32),
    /// An integer within the signed 64-bit range but outside the 32-bit one.
    Long(i64),
    /// A CBOR integer outside the signed 64-bit range but inside 64 unsigned
    /// bits of magnitude. `negative == true` means the value is `-1 - raw`.
    OverLong { negative: bool, raw: u64 },
    /// An IEEE 754 half-precision float, widened to `f32`.
    Float16(f32),
    Float(f32),
    Double(f64),
    /// A verbatim numeric lexeme that JSON could not cheaply narrow to an
    /// integer or a lossless double.
    NumberString(String),
    Bytes(Vec<u8>),
    BytesStart,
    Str(String),
    TextStart,
    ArrayHeader(u64),
    ArrayStart,
    /// Definite map of `n` entries: exactly `2n` items follow, alternating
    /// key and value.
    MapHeader(u64),
    MapStart,
    /// A CBOR tag. Never stands alone: always immediately precedes the item
    /// it qualifies.
    Tag(u64),
    /// A CBOR simple value outside the boolean/null/undefined set.
    Simple(u8),
    /// Closes an indefinite container.
    Break,
    EndOfInput,
}

impl Item {
    /// Short name used in "expected X, got Y" error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Item::Null => "Null",
            Item::Undefined => "Undefined",
            Item::Bool(_) => "Bool",
            Item::Int(_) => "Int",
            Item::Long(_) => "Long",
            Item::OverLong { .. } => "OverLong",
            Item::Float16(_) => "Float16",
            Item::Float(_) => "Float",
            Item::Double(_) => "Double",
            Item::NumberString(_) => "NumberString",
            Item::Bytes(_) => "Bytes",
            Item::BytesStart => "BytesStart",
            Item::Str(_) => "String",
            Item::TextStart => "TextStart",
            Item::ArrayHeader(_) => "ArrayHeader",
            Item::ArrayStart => "ArrayStart",
            Item::MapHeader(_) => "MapHeader",
            Item::MapStart => "MapStart",
            Item::Tag(_) => "Tag",
            Item::Simple(_) => "SimpleValue",
            Item::Break => "Break",
            Item::EndOfInput => "EndOfInput",
        }
    }

    /// Whether this item opens a nesting level (container or chunked string).
    #[must_use]
    pub fn opens_level(&self) -> bool {
        matches!(
            self,
            Item::ArrayHeader(_)
                | Item::ArrayStart
                | Item::MapHeader(_)
                | Item::MapStart
                | Item::BytesStart
                | Item::TextStart
        )
    }

    /// Whether this item is a data item for container counting purposes.
    /// Tags are prefixes, `Break`/`EndOfInput` are delimiters; everything
    /// else counts as one element of its enclosing container.
    #[must_use]
    pub fn counts_as_element(&self) -> bool {
        !matches!(self, Item::Tag(_) | Item::Break | Item::EndOfInput)
    }
}

/// Well-known CBOR tag numbers. All tags pass through the engine; these
/// constants only give the common ones a name.
pub mod tags {
    /// RFC 3339 date/time string.
    pub const DATE_TIME_STRING: u64 = 0;
    /// Epoch-based date/time.
    pub const EPOCH_DATE_TIME: u64 = 1;
    /// Unsigned bignum (byte string magnitude).
    pub const UNSIGNED_BIGNUM: u64 = 2;
    /// Negative bignum (byte string magnitude of `-1 - n`).
    pub const NEGATIVE_BIGNUM: u64 = 3;
    /// Decimal fraction: array of `[exponent, mantissa]`.
    pub const DECIMAL_FRACTION: u64 = 4;
    /// Expected conversion to base64url.
    pub const EXPECTED_BASE64URL: u64 = 21;
    /// Expected conversion to base64.
    pub const EXPECTED_BASE64: u64 = 22;
    /// Expected conversion to base16.
    pub const EXPECTED_BASE16: u64 = 23;
    /// Embedded CBOR data item.
    pub const EMBEDDED_CBOR: u64 = 24;
    /// URI text string.
    pub const URI: u64 = 32;
    /// Regular expression.
    pub const REGEX: u64 = 35;
    /// Self-described CBOR magic header.
    pub const SELF_DESCRIBED_CBOR: u64 = 55799;
}
