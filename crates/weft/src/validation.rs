//! Structural validation of outgoing event streams.
//!
//! A [`Validated`] receiver sits between the writer and the renderer and
//! rejects streams that are not well-formed: a `Break` without an open
//! indefinite container, a map closed on an unpaired key, chunked strings
//! containing foreign items, more than one top-level data item, or running
//! out of input with containers still open.
//!
//! Definite containers close implicitly once the announced element count has
//! been delivered; surplus writes therefore overflow into the enclosing
//! level, where they are caught as count mismatches or as a second top-level
//! item.

use crate::error::{Error, Position, Result};
use crate::item::{Item, Target};
use crate::receiver::{Receiver, Renderer};

/// Default and maximum supported nesting depth.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelKind {
    Array,
    Map,
    Bytes,
    Text,
}

#[derive(Debug, Clone, Copy)]
struct Level {
    kind: LevelKind,
    /// Items still expected for a definite container (`2n` for maps);
    /// `None` for indefinite ones.
    remaining: Option<u64>,
    /// Items received so far in an indefinite container.
    count: u64,
}

/// Tracks nesting depth and per-level expected element counts.
#[derive(Debug)]
pub struct Validator {
    levels: Vec<Level>,
    max_nesting: usize,
    top_level_items: u64,
}

impl Validator {
    #[must_use]
    pub fn new(max_nesting: usize) -> Self {
        Self {
            levels: Vec::new(),
            max_nesting: max_nesting.min(MAX_NESTING),
            top_level_items: 0,
        }
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn top_is_bytes(&self) -> bool {
        matches!(
            self.levels.last(),
            Some(Level {
                kind: LevelKind::Bytes,
                ..
            })
        )
    }

    pub(crate) fn top_is_text(&self) -> bool {
        matches!(
            self.levels.last(),
            Some(Level {
                kind: LevelKind::Text,
                ..
            })
        )
    }

    /// Checks one item against the structural rules, updating level state.
    pub fn check(&mut self, item: &Item, pos: Position) -> Result<()> {
        if let Some(top) = self.levels.last() {
            match top.kind {
                LevelKind::Bytes if !matches!(item, Item::Bytes(_) | Item::Break) => {
                    return Err(Error::validation(
                        pos,
                        format!("{} not allowed within a chunked byte string", item.kind_name()),
                    ));
                }
                LevelKind::Text if !matches!(item, Item::Str(_) | Item::Break) => {
                    return Err(Error::validation(
                        pos,
                        format!("{} not allowed within a chunked text string", item.kind_name()),
                    ));
                }
                _ => {}
            }
        }
        match item {
            Item::Tag(_) => Ok(()),
            Item::Break => self.close_indefinite(pos),
            Item::EndOfInput => self.finish(pos),
            Item::ArrayHeader(n) => self.open(LevelKind::Array, Some(*n), pos),
            Item::MapHeader(n) => {
                let slots = n.checked_mul(2).ok_or_else(|| {
                    Error::overflow(pos, "map header exceeds the representable element count")
                })?;
                self.open(LevelKind::Map, Some(slots), pos)
            }
            Item::ArrayStart => self.open(LevelKind::Array, None, pos),
            Item::MapStart => self.open(LevelKind::Map, None, pos),
            Item::BytesStart => self.open(LevelKind::Bytes, None, pos),
            Item::TextStart => self.open(LevelKind::Text, None, pos),
            _ => self.element(pos),
        }
    }

    fn open(&mut self, kind: LevelKind, remaining: Option<u64>, pos: Position) -> Result<()> {
        if remaining == Some(0) {
            // Empty definite container: a complete element right away.
            return self.element(pos);
        }
        if self.levels.len() >= self.max_nesting {
            return Err(Error::overflow(
                pos,
                format!("exceeded maximum nesting depth of {}", self.max_nesting),
            ));
        }
        self.levels.push(Level {
            kind,
            remaining,
            count: 0,
        });
        Ok(())
    }

    fn close_indefinite(&mut self, pos: Position) -> Result<()> {
        match self.levels.pop() {
            Some(Level {
                remaining: None,
                kind,
                count,
            }) => {
                if kind == LevelKind::Map && count % 2 == 1 {
                    return Err(Error::validation(pos, "map closed with an unpaired key"));
                }
                self.element(pos)
            }
            Some(level) => {
                self.levels.push(level);
                Err(Error::validation(
                    pos,
                    "break outside of an indefinite-length container",
                ))
            }
            None => Err(Error::validation(
                pos,
                "break outside of an indefinite-length container",
            )),
        }
    }

    /// One element has been completed at the current level.
    fn element(&mut self, pos: Position) -> Result<()> {
        loop {
            match self.levels.last_mut() {
                None => {
                    self.top_level_items += 1;
                    if self.top_level_items > 1 {
                        return Err(Error::validation(
                            pos,
                            "more than one top-level data item",
                        ));
                    }
                    return Ok(());
                }
                Some(level) => match &mut level.remaining {
                    Some(remaining) => {
                        *remaining -= 1;
                        if *remaining == 0 {
                            self.levels.pop();
                            // The completed container is itself an element
                            // of its parent.
                            continue;
                        }
                        return Ok(());
                    }
                    None => {
                        level.count += 1;
                        return Ok(());
                    }
                },
            }
        }
    }

    fn finish(&mut self, pos: Position) -> Result<()> {
        if let Some(level) = self.levels.last() {
            let msg = match level.remaining {
                Some(n) => format!("definite-length container is missing {n} item(s)"),
                None => "unclosed indefinite-length container".to_string(),
            };
            return Err(Error::validation(pos, msg));
        }
        if self.top_level_items == 0 {
            return Err(Error::validation(pos, "no top-level data item"));
        }
        Ok(())
    }
}

/// A renderer wrapper that validates the event stream before forwarding it.
pub struct Validated<R: Renderer> {
    inner: R,
    validator: Validator,
}

impl<R: Renderer> Validated<R> {
    pub fn new(inner: R, max_nesting: usize) -> Self {
        Self {
            inner,
            validator: Validator::new(max_nesting),
        }
    }
}

impl<R: Renderer> Receiver for Validated<R> {
    fn receive(&mut self, item: Item) -> Result<()> {
        let pos = Position::new(self.inner.item_index());
        self.validator.check(&item, pos)?;
        self.inner.receive(item)
    }
}

impl<R: Renderer> Renderer for Validated<R> {
    type Out = R::Out;

    fn target(&self) -> Target {
        self.inner.target()
    }

    fn item_index(&self) -> usize {
        self.inner.item_index()
    }

    fn into_output(self) -> R::Out {
        self.inner.into_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_all(items: &[Item]) -> Result<()> {
        let mut v = Validator::new(MAX_NESTING);
        for (i, item) in items.iter().enumerate() {
            v.check(item, Position::new(i))?;
        }
        Ok(())
    }

    #[test]
    fn accepts_balanced_streams() {
        check_all(&[
            Item::ArrayHeader(2),
            Item::Int(1),
            Item::ArrayStart,
            Item::Int(2),
            Item::Break,
            Item::EndOfInput,
        ])
        .unwrap();
    }

    #[test]
    fn rejects_stray_break() {
        let err = check_all(&[Item::Break]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_unpaired_map_key() {
        let err = check_all(&[
            Item::MapStart,
            Item::Str("key".into()),
            Item::Break,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_second_top_level_item() {
        let err = check_all(&[Item::Int(1), Item::Int(2)]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_short_definite_container_at_end() {
        let err = check_all(&[Item::ArrayHeader(2), Item::Int(1), Item::EndOfInput]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_foreign_item_in_chunked_text() {
        let err = check_all(&[Item::TextStart, Item::Int(1)]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn empty_definite_containers_complete_immediately() {
        check_all(&[
            Item::ArrayHeader(1),
            Item::MapHeader(0),
            Item::EndOfInput,
        ])
        .unwrap();
    }
}
