//! Event logging as a composed receiver.
//!
//! An [`EventLog`] is an ordinary [`Receiver`]: compose it with a renderer
//! through a [`Transformer`](crate::receiver::Transformer) and every event
//! flowing to the renderer is also formatted into a text buffer, one line
//! per event, indented by container level, with optional gutter counters and
//! cut-offs for long strings and byte strings.

use crate::error::Result;
use crate::item::Item;
use crate::receiver::Receiver;

/// Formatting knobs for [`EventLog`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Characters shown of a text string before it is elided.
    pub max_shown_string_length: usize,
    /// Bytes shown of a byte string before it is elided.
    pub max_shown_byte_string_length: usize,
    /// Prefix each element with `i/n:` (definite) or `i:` (indefinite)
    /// counters.
    pub gutter_counters: bool,
    /// Indentation per container level.
    pub indent: &'static str,
}


#[derive(Debug, Clone, Copy)]
struct LogLevel {
    map: bool,
    chunked: bool,
    /// Element slots for definite containers (`2n` for maps).
    total: Option<u64>,
    count: u64,
}

/// Receiver that renders the event stream as an indented text log.
#[derive(Debug, Default)]
pub struct EventLog {
    config: LogConfig,
    out: String,
    levels: Vec<LogLevel>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_shown_string_length: 40,
            max_shown_byte_string_length: 16,
            gutter_counters: true,
            indent: "    ",
        }
    }
}

impl EventLog {
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            out: String::new(),
            levels: Vec::new(),
        }
    }

    /// The collected log text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.out
    }

    pub fn into_text(self) -> String {
        self.out
    }

    fn line_prefix(&mut self) {
        for _ in 0..self.levels.len() {
            self.out.push_str(self.config.indent);
        }
        if self.config.gutter_counters {
            if let Some(top) = self.levels.last() {
                let ordinal = top.count + 1;
                match top.total {
                    Some(total) if top.map => {
                        self.out
                            .push_str(&format!("{}/{}: ", ordinal.div_ceil(2), total / 2));
                    }
                    Some(total) => self.out.push_str(&format!("{ordinal}/{total}: ")),
                    None if top.map && !top.chunked => {
                        self.out.push_str(&format!("{}: ", ordinal.div_ceil(2)));
                    }
                    None => self.out.push_str(&format!("{ordinal}: ")),
                }
            }
        }
        if let Some(top) = self.levels.last() {
            if top.map && !top.chunked && top.count % 2 == 1 {
                self.out.push_str("-> ");
            }
        }
    }

    fn truncated_string(&self, s: &str) -> String {
        let max = self.config.max_shown_string_length;
        if s.chars().count() <= max {
            format!("{s:?}")
        } else {
            let shown: String = s.chars().take(max).collect();
            format!("{shown:?}...")
        }
    }

    fn formatted_bytes(&self, bytes: &[u8]) -> String {
        let max = self.config.max_shown_byte_string_length;
        let shown = bytes
            .iter()
            .take(max)
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        if bytes.len() <= max {
            format!("BYTES[{}: {shown}]", bytes.len())
        } else {
            format!("BYTES[{}: {shown} ...]", bytes.len())
        }
    }

    fn scalar_text(&self, item: &Item) -> String {
        match item {
            Item::Null => "null".to_string(),
            Item::Undefined => "undefined".to_string(),
            Item::Bool(b) => b.to_string(),
            Item::Int(i) => i.to_string(),
            Item::Long(l) => format!("{l}L"),
            Item::OverLong { negative, raw } => {
                if *negative {
                    format!("-1 - {raw}")
                } else {
                    format!("{raw}UL")
                }
            }
            Item::Float16(f) => format!("{f}f16"),
            Item::Float(f) => format!("{f}f"),
            Item::Double(d) => d.to_string(),
            Item::NumberString(s) => format!("number {s}"),
            Item::Bytes(b) => self.formatted_bytes(b),
            Item::Str(s) => self.truncated_string(s),
            Item::Tag(t) => format!("tag({t})"),
            Item::Simple(v) => format!("simple({v})"),
            Item::EndOfInput => "END".to_string(),
            _ => unreachable!("containers are handled before scalars"),
        }
    }

    /// Closing bracket at the depth of the just-closed container, without
    /// a gutter.
    fn close_line(&mut self, map: bool) {
        for _ in 0..=self.levels.len() {
            self.out.push_str(self.config.indent);
        }
        self.out.push(if map { '}' } else { ']' });
        self.out.push('\n');
    }

    /// Counts one completed element, closing definite levels as their
    /// announced size fills up.
    fn element_done(&mut self) {
        loop {
            let Some(top) = self.levels.last_mut() else {
                return;
            };
            top.count += 1;
            match top.total {
                Some(total) if top.count == total => {
                    let map = top.map;
                    self.levels.pop();
                    self.close_line(map);
                    continue;
                }
                _ => return,
            }
        }
    }

    fn open(&mut self, map: bool, chunked: bool, total: Option<u64>, marker: &str) {
        self.line_prefix();
        self.out.push_str(marker);
        self.out.push('\n');
        if total == Some(0) {
            self.close_line(map);
            self.element_done();
            return;
        }
        self.levels.push(LogLevel {
            map,
            chunked,
            total,
            count: 0,
        });
    }
}

impl Receiver for EventLog {
    fn receive(&mut self, item: Item) -> Result<()> {
        match &item {
            Item::ArrayHeader(n) => self.open(false, false, Some(*n), &format!("[#{n}")),
            Item::ArrayStart => self.open(false, false, None, "["),
            Item::MapHeader(n) => self.open(true, false, Some(n.saturating_mul(2)), &format!("{{#{n}")),
            Item::MapStart => self.open(true, false, None, "{"),
            Item::BytesStart => self.open(false, true, None, "BYTES-STREAM["),
            Item::TextStart => self.open(false, true, None, "TEXT-STREAM["),
            Item::Break => {
                if let Some(level) = self.levels.pop() {
                    self.close_line(level.map);
                }
                self.element_done();
            }
            Item::Tag(_) => {
                // A prefix, not an element: logged on its own line without
                // advancing the counters.
                self.line_prefix();
                let text = self.scalar_text(&item);
                self.out.push_str(&text);
                self.out.push('\n');
            }
            Item::EndOfInput => {
                self.out.push_str("END\n");
            }
            _ => {
                self.line_prefix();
                let text = self.scalar_text(&item);
                self.out.push_str(&text);
                self.out.push('\n');
                self.element_done();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::output::ChunkedOutput;
    use crate::item::Target;
    use crate::json::JsonRenderer;
    use crate::receiver::Transformer;
    use crate::validation::MAX_NESTING;
    use crate::writer::Writer;

    #[test]
    fn log_composes_with_a_renderer() {
        let renderer = JsonRenderer::new(ChunkedOutput::default(), None);
        let log = EventLog::new(LogConfig::default());
        let mut writer = Writer::new(Transformer::new(renderer, log), MAX_NESTING);
        assert_eq!(writer.target(), Target::Json);

        writer.write_map_start().unwrap();
        writer.write_string("key").unwrap();
        writer.write_array_open(2).unwrap();
        writer.write_int(1).unwrap();
        writer.write_int(2).unwrap();
        writer.write_array_close().unwrap();
        writer.write_break().unwrap();
        let (json, log) = writer.finish().unwrap();

        assert_eq!(String::from_utf8(json).unwrap(), r#"{"key":[1,2]}"#);
        let expected = concat!(
            "{\n",
            "    1: \"key\"\n",
            "    1: -> [\n",
            "        1: 1\n",
            "        2: 2\n",
            "        ]\n",
            "    }\n",
            "END\n",
        );
        assert_eq!(log.text(), expected);
    }

    #[test]
    fn long_strings_are_elided() {
        let mut log = EventLog::new(LogConfig {
            max_shown_string_length: 4,
            ..LogConfig::default()
        });
        log.receive(Item::Str("abcdefgh".into())).unwrap();
        assert_eq!(log.text(), "\"abcd\"...\n");
    }

    #[test]
    fn byte_strings_are_elided() {
        let mut log = EventLog::new(LogConfig {
            max_shown_byte_string_length: 2,
            ..LogConfig::default()
        });
        log.receive(Item::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(log.text(), "BYTES[3: 01 02 ...]\n");
    }
}
