//! The push and pull halves of the event model.
//!
//! A [`Parser`] produces items one at a time (pull); a [`Receiver`] consumes
//! them (push). Renderers are receivers that also materialize an output
//! value. [`Transformer`] composes two receivers so that every event is seen
//! by both, which is how logging is inserted into an event chain without a
//! side channel.

use crate::error::{Position, Result};
use crate::item::{Item, Target};

/// Pull side: a source of items.
pub trait Parser {
    /// Produces the next item. After the logical end of the stream this
    /// returns `Item::EndOfInput` on every call.
    fn pull(&mut self) -> Result<Item>;

    /// Position of the start of the most recently pulled item.
    fn position(&self) -> Position;

    /// The format this parser reads.
    fn target(&self) -> Target;
}

/// Push side: a sink of items.
pub trait Receiver {
    fn receive(&mut self, item: Item) -> Result<()>;
}

/// A receiver that renders items into an output value.
pub trait Renderer: Receiver {
    /// The materialized output (for the default chunked buffer output this
    /// is `Vec<u8>`).
    type Out;

    /// The format this renderer writes.
    fn target(&self) -> Target;

    /// Number of items received so far, used as the render-side error
    /// position.
    fn item_index(&self) -> usize;

    /// Finishes rendering and hands back the output.
    fn into_output(self) -> Self::Out;
}

/// Forwards every received item to a secondary receiver (typically a logger)
/// before handing it to the primary one.
pub struct Transformer<R, S> {
    primary: R,
    secondary: S,
}

impl<R, S> Transformer<R, S> {
    pub fn new(primary: R, secondary: S) -> Self {
        Self { primary, secondary }
    }

    /// The secondary receiver, e.g. to extract a collected log.
    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    pub fn into_parts(self) -> (R, S) {
        (self.primary, self.secondary)
    }
}

impl<R: Receiver, S: Receiver> Receiver for Transformer<R, S> {
    fn receive(&mut self, item: Item) -> Result<()> {
        self.secondary.receive(item.clone())?;
        self.primary.receive(item)
    }
}

impl<R: Renderer, S: Receiver> Renderer for Transformer<R, S> {
    type Out = (R::Out, S);

    fn target(&self) -> Target {
        self.primary.target()
    }

    fn item_index(&self) -> usize {
        self.primary.item_index()
    }

    fn into_output(self) -> Self::Out {
        (self.primary.into_output(), self.secondary)
    }
}
