//! Scripted event sequences for tests: a [`Script`] replays an arbitrary
//! item list through the pull interface, and a [`Recorder`] captures
//! whatever a writer pushes. Together they let codec logic be exercised
//! without going through a wire format.

use std::collections::VecDeque;

use crate::error::{Position, Result};
use crate::item::{Item, Target};
use crate::receiver::{Parser, Receiver, Renderer};

/// A parser that replays a fixed sequence of items.
pub struct Script {
    items: VecDeque<Item>,
    target: Target,
    index: usize,
}

impl Script {
    pub fn new(target: Target, items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().collect(),
            target,
            index: 0,
        }
    }

    pub fn cbor(items: impl IntoIterator<Item = Item>) -> Self {
        Self::new(Target::Cbor, items)
    }

    pub fn json(items: impl IntoIterator<Item = Item>) -> Self {
        Self::new(Target::Json, items)
    }
}

impl Parser for Script {
    fn pull(&mut self) -> Result<Item> {
        match self.items.pop_front() {
            Some(item) => {
                self.index += 1;
                Ok(item)
            }
            None => Ok(Item::EndOfInput),
        }
    }

    fn position(&self) -> Position {
        Position::new(self.index.saturating_sub(1))
    }

    fn target(&self) -> Target {
        self.target
    }
}

/// A renderer that records the received items instead of producing bytes.
pub struct Recorder {
    items: Vec<Item>,
    target: Target,
}

impl Recorder {
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            items: Vec::new(),
            target,
        }
    }

    #[must_use]
    pub fn cbor() -> Self {
        Self::new(Target::Cbor)
    }

    #[must_use]
    pub fn json() -> Self {
        Self::new(Target::Json)
    }

    /// The items recorded so far.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl Receiver for Recorder {
    fn receive(&mut self, item: Item) -> Result<()> {
        self.items.push(item);
        Ok(())
    }
}

impl Renderer for Recorder {
    type Out = Vec<Item>;

    fn target(&self) -> Target {
        self.target
    }

    fn item_index(&self) -> usize {
        self.items.len()
    }

    fn into_output(self) -> Vec<Item> {
        self.items
    }
}
