//! Renders the event stream as RFC 8259 text.
//!
//! Every array and map renders through the same level stack regardless of
//! whether it arrived as a definite header or an indefinite start; definite
//! containers close themselves once the announced element count has been
//! received, which is what makes CBOR-to-JSON transcoding work without a
//! rewrite pass. Map keys must be strings. Numbers render via the shortest
//! round-trip form; NaN and infinities have no JSON representation and are
//! rejected.

use crate::error::{Error, Position, Result};
use crate::io::output::Output;
use crate::item::{Item, Target};
use crate::receiver::{Receiver, Renderer};

#[derive(Debug, Clone, Copy)]
struct Level {
    map: bool,
    /// Total item slots for a definite container (`2n` for maps).
    total: Option<u64>,
    /// Items written so far (keys and values both count).
    items: u64,
}

pub struct JsonRenderer<O: Output> {
    out: O,
    count: usize,
    levels: Vec<Level>,
    indent: Option<String>,
}

impl<O: Output> JsonRenderer<O> {
    pub fn new(out: O, pretty_indent: Option<String>) -> Self {
        Self {
            out,
            count: 0,
            levels: Vec::new(),
            indent: pretty_indent,
        }
    }

    #[inline]
    fn pos(&self) -> Position {
        Position::new(self.count)
    }

    fn reject(&self, item: &Item) -> Error {
        Error::unexpected_item(
            self.pos(),
            format!("{} cannot be represented in JSON", item.kind_name()),
        )
    }

    fn write_newline_indent(&mut self, depth: usize) {
        if let Some(indent) = &self.indent {
            self.out.write_byte(b'\n');
            for _ in 0..depth {
                self.out.write_slice(indent.as_bytes());
            }
        }
    }

    /// Separator and key/value bookkeeping before a value (or key) is
    /// written. `is_string` tells whether the incoming item can stand in a
    /// key slot.
    fn before_item(&mut self, is_string: bool, kind: &'static str) -> Result<()> {
        let Some(top) = self.levels.last() else {
            return Ok(());
        };
        let key_slot = top.map && top.items % 2 == 0;
        if key_slot && !is_string {
            return Err(Error::unexpected_item(
                self.pos(),
                format!("map keys must be strings in JSON, got {kind}"),
            ));
        }
        if top.map && !key_slot {
            self.out.write_byte(b':');
            if self.indent.is_some() {
                self.out.write_byte(b' ');
            }
        } else {
            if top.items > 0 {
                self.out.write_byte(b',');
            }
            self.write_newline_indent(self.levels.len());
        }
        Ok(())
    }

    /// One item has been completed at the current level; closes definite
    /// containers whose element count is satisfied.
    fn item_done(&mut self) {
        loop {
            let Some(top) = self.levels.last_mut() else {
                return;
            };
            top.items += 1;
            match top.total {
                Some(total) if top.items == total => {
                    let map = top.map;
                    self.levels.pop();
                    self.write_newline_indent(self.levels.len());
                    self.out.write_byte(if map { b'}' } else { b']' });
                    continue;
                }
                _ => return,
            }
        }
    }

    fn open(&mut self, map: bool, total: Option<u64>) -> Result<()> {
        self.before_item(false, "container")?;
        if total == Some(0) {
            self.out
                .write_slice(if map { b"{}" } else { b"[]" });
            self.item_done();
            return Ok(());
        }
        self.out.write_byte(if map { b'{' } else { b'[' });
        self.levels.push(Level {
            map,
            total,
            items: 0,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.levels.pop() {
            Some(Level {
                total: None,
                map,
                items,
            }) => {
                if map && items % 2 == 1 {
                    return Err(Error::validation(
                        self.pos(),
                        "map closed with an unpaired key",
                    ));
                }
                if items > 0 {
                    self.write_newline_indent(self.levels.len());
                }
                self.out.write_byte(if map { b'}' } else { b']' });
                self.item_done();
                Ok(())
            }
            _ => Err(Error::validation(
                self.pos(),
                "break outside of an indefinite-length container",
            )),
        }
    }

    fn write_escaped(&mut self, s: &str) {
        self.out.write_byte(b'"');
        let bytes = s.as_bytes();
        let mut from = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escape: &[u8] = match b {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                0x08 => b"\\b",
                0x09 => b"\\t",
                0x0A => b"\\n",
                0x0C => b"\\f",
                0x0D => b"\\r",
                b if b < 0x20 => {
                    self.out.write_slice(&bytes[from..i]);
                    const HEX: &[u8; 16] = b"0123456789abcdef";
                    self.out.write_slice(b"\\u00");
                    self.out
                        .write_2(HEX[usize::from(b >> 4)], HEX[usize::from(b & 0x0F)]);
                    from = i + 1;
                    continue;
                }
                _ => continue,
            };
            self.out.write_slice(&bytes[from..i]);
            self.out.write_slice(escape);
            from = i + 1;
        }
        self.out.write_slice(&bytes[from..]);
        self.out.write_byte(b'"');
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::validation(
                self.pos(),
                "NaN and infinite values have no JSON representation",
            ));
        }
        let mut buffer = ryu::Buffer::new();
        self.out.write_slice(buffer.format_finite(value).as_bytes());
        Ok(())
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::validation(
                self.pos(),
                "NaN and infinite values have no JSON representation",
            ));
        }
        let mut buffer = ryu::Buffer::new();
        self.out.write_slice(buffer.format_finite(value).as_bytes());
        Ok(())
    }
}

impl<O: Output> Receiver for JsonRenderer<O> {
    fn receive(&mut self, item: Item) -> Result<()> {
        self.count += 1;
        match item {
            Item::Null => {
                self.before_item(false, "Null")?;
                self.out.write_slice(b"null");
                self.item_done();
            }
            Item::Bool(b) => {
                self.before_item(false, "Bool")?;
                self.out.write_slice(if b { b"true" } else { b"false" });
                self.item_done();
            }
            Item::Int(i) => {
                self.before_item(false, "Int")?;
                let mut buffer = itoa::Buffer::new();
                self.out.write_slice(buffer.format(i).as_bytes());
                self.item_done();
            }
            Item::Long(l) => {
                self.before_item(false, "Long")?;
                let mut buffer = itoa::Buffer::new();
                self.out.write_slice(buffer.format(l).as_bytes());
                self.item_done();
            }
            Item::OverLong { negative, raw } => {
                self.before_item(false, "OverLong")?;
                let value = if negative {
                    -1i128 - i128::from(raw)
                } else {
                    i128::from(raw)
                };
                let mut buffer = itoa::Buffer::new();
                self.out.write_slice(buffer.format(value).as_bytes());
                self.item_done();
            }
            Item::Float(f) => {
                self.before_item(false, "Float")?;
                self.write_float(f)?;
                self.item_done();
            }
            Item::Double(d) => {
                self.before_item(false, "Double")?;
                self.write_double(d)?;
                self.item_done();
            }
            Item::NumberString(ref s) => {
                self.before_item(false, "NumberString")?;
                self.out.write_slice(s.as_bytes());
                self.item_done();
            }
            Item::Str(ref s) => {
                self.before_item(true, "String")?;
                self.write_escaped(s);
                self.item_done();
            }
            Item::ArrayHeader(n) => self.open(false, Some(n))?,
            Item::ArrayStart => self.open(false, None)?,
            Item::MapHeader(n) => {
                let slots = n.checked_mul(2).ok_or_else(|| {
                    Error::overflow(self.pos(), "map header exceeds the representable element count")
                })?;
                self.open(true, Some(slots))?;
            }
            Item::MapStart => self.open(true, None)?,
            Item::Break => self.close()?,
            Item::EndOfInput => {
                if !self.levels.is_empty() {
                    return Err(Error::validation(self.pos(), "unclosed container"));
                }
            }
            Item::Undefined
            | Item::Float16(_)
            | Item::Bytes(_)
            | Item::BytesStart
            | Item::TextStart
            | Item::Tag(_)
            | Item::Simple(_) => return Err(self.reject(&item)),
        }
        Ok(())
    }
}

impl<O: Output> Renderer for JsonRenderer<O> {
    type Out = O::Result;

    fn target(&self) -> Target {
        Target::Json
    }

    fn item_index(&self) -> usize {
        self.count
    }

    fn into_output(self) -> O::Result {
        self.out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::output::ChunkedOutput;

    fn render(items: &[Item]) -> String {
        render_with(items, None).unwrap()
    }

    fn render_with(items: &[Item], indent: Option<&str>) -> Result<String> {
        let mut renderer = JsonRenderer::new(
            ChunkedOutput::default(),
            indent.map(str::to_string),
        );
        for item in items {
            renderer.receive(item.clone())?;
        }
        Ok(String::from_utf8(renderer.into_output()).unwrap())
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(render(&[Item::Null]), "null");
        assert_eq!(render(&[Item::Bool(true)]), "true");
        assert_eq!(render(&[Item::Int(-42)]), "-42");
        assert_eq!(render(&[Item::Double(1.5)]), "1.5");
        // Integral doubles keep their type marker.
        assert_eq!(render(&[Item::Double(42.0)]), "42.0");
        assert_eq!(
            render(&[Item::OverLong {
                negative: true,
                raw: u64::MAX
            }]),
            "-18446744073709551616"
        );
    }

    #[test]
    fn string_escaping() {
        assert_eq!(
            render(&[Item::Str("a\"b\\c\nd\u{1}".into())]),
            r#""a\"b\\c\nd""#
        );
        assert_eq!(render(&[Item::Str("日本".into())]), "\"日本\"");
    }

    #[test]
    fn definite_headers_render_like_indefinite_starts() {
        let definite = render(&[
            Item::ArrayHeader(2),
            Item::Int(1),
            Item::Int(2),
        ]);
        let indefinite = render(&[
            Item::ArrayStart,
            Item::Int(1),
            Item::Int(2),
            Item::Break,
        ]);
        assert_eq!(definite, "[1,2]");
        assert_eq!(definite, indefinite);
    }

    #[test]
    fn maps_require_string_keys() {
        let err = render_with(&[Item::MapStart, Item::Int(1)], None).unwrap_err();
        assert!(matches!(err, Error::UnexpectedDataItem { .. }));
    }

    #[test]
    fn nested_structures() {
        let json = render(&[
            Item::MapHeader(2),
            Item::Str("a".into()),
            Item::ArrayHeader(2),
            Item::Int(0),
            Item::Int(1),
            Item::Str("b".into()),
            Item::ArrayHeader(0),
        ]);
        assert_eq!(json, r#"{"a":[0,1],"b":[]}"#);
    }

    #[test]
    fn rejects_non_finite_numbers() {
        let err = render_with(&[Item::Double(f64::NAN)], None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        let err = render_with(&[Item::Float(f32::INFINITY)], None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_cbor_only_items() {
        for item in [
            Item::Undefined,
            Item::Float16(1.0),
            Item::Bytes(vec![1]),
            Item::Tag(2),
            Item::Simple(16),
        ] {
            let err = render_with(&[item], None).unwrap_err();
            assert!(matches!(err, Error::UnexpectedDataItem { .. }));
        }
    }

    #[test]
    fn pretty_printing_indents() {
        let json = render_with(
            &[
                Item::MapStart,
                Item::Str("a".into()),
                Item::ArrayHeader(1),
                Item::Int(1),
                Item::Break,
            ],
            Some("  "),
        )
        .unwrap();
        assert_eq!(json, "{\n  \"a\": [\n    1\n  ]\n}");
    }
}
