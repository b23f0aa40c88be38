//! Byte sinks for renderers.
//!
//! The default sink is a chunked append-only buffer: once a fixed-size chunk
//! fills up, a new one is appended and the write cursor resets. `finish()`
//! flattens the chunks into one contiguous vector. Chunk buffers can come
//! from the thread-local cache when caching is enabled.

use std::io::Write;

use crate::io::cache;

/// A byte sink. Write errors of streaming sinks are deferred and surfaced by
/// `finish()`; in-memory sinks are infallible.
pub trait Output {
    /// The materialized result value.
    type Result;

    fn write_byte(&mut self, byte: u8);

    #[inline]
    fn write_2(&mut self, a: u8, b: u8) {
        self.write_byte(a);
        self.write_byte(b);
    }

    #[inline]
    fn write_3(&mut self, a: u8, b: u8, c: u8) {
        self.write_2(a, b);
        self.write_byte(c);
    }

    #[inline]
    fn write_4(&mut self, a: u8, b: u8, c: u8, d: u8) {
        self.write_2(a, b);
        self.write_2(c, d);
    }

    fn write_slice(&mut self, bytes: &[u8]);

    fn finish(self) -> Self::Result;
}

/// Default chunk size of [`ChunkedOutput`].
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// The default chunked buffer sink.
pub struct ChunkedOutput {
    full: Vec<Vec<u8>>,
    current: Vec<u8>,
    chunk_size: usize,
    caching: bool,
}

impl ChunkedOutput {
    pub fn new(chunk_size: usize, caching: bool) -> Self {
        let chunk_size = chunk_size.max(64);
        Self {
            full: Vec::new(),
            current: cache::acquire(chunk_size, caching),
            chunk_size,
            caching,
        }
    }

    #[inline]
    fn roll_over(&mut self) {
        let fresh = cache::acquire(self.chunk_size, self.caching);
        self.full.push(core::mem::replace(&mut self.current, fresh));
    }
}

impl Default for ChunkedOutput {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, false)
    }
}

impl Output for ChunkedOutput {
    type Result = Vec<u8>;

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        if self.current.len() == self.chunk_size {
            self.roll_over();
        }
        self.current.push(byte);
    }

    fn write_slice(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        loop {
            let room = self.chunk_size - self.current.len();
            if rest.len() <= room {
                self.current.extend_from_slice(rest);
                return;
            }
            self.current.extend_from_slice(&rest[..room]);
            rest = &rest[room..];
            self.roll_over();
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.full.is_empty() {
            return core::mem::take(&mut self.current);
        }
        let total = self.full.iter().map(Vec::len).sum::<usize>() + self.current.len();
        let mut result = Vec::with_capacity(total);
        for chunk in self.full.drain(..) {
            result.extend_from_slice(&chunk);
            cache::release(chunk, self.caching);
        }
        result.extend_from_slice(&self.current);
        cache::release(core::mem::take(&mut self.current), self.caching);
        result
    }
}

/// Sink forwarding to an `io::Write` stream (file, socket, ...). The first
/// I/O error is retained and reported by `finish()`.
pub struct WriteOutput<W: Write> {
    inner: W,
    error: Option<std::io::Error>,
}

impl<W: Write> WriteOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    fn write_all(&mut self, bytes: &[u8]) {
        if self.error.is_none() {
            if let Err(e) = self.inner.write_all(bytes) {
                self.error = Some(e);
            }
        }
    }
}

impl<W: Write> Output for WriteOutput<W> {
    type Result = std::io::Result<W>;

    fn write_byte(&mut self, byte: u8) {
        self.write_all(&[byte]);
    }

    fn write_slice(&mut self, bytes: &[u8]) {
        self.write_all(bytes);
    }

    fn finish(mut self) -> std::io::Result<W> {
        match self.error.take() {
            Some(e) => Err(e),
            None => {
                self.inner.flush()?;
                Ok(self.inner)
            }
        }
    }
}

/// Sink that drops everything. Useful for validation-only runs.
#[derive(Default)]
pub struct NullOutput {
    count: usize,
}

impl NullOutput {
    /// Number of bytes that would have been written.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Output for NullOutput {
    type Result = ();

    fn write_byte(&mut self, _byte: u8) {
        self.count += 1;
    }

    fn write_slice(&mut self, bytes: &[u8]) {
        self.count += bytes.len();
    }

    fn finish(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_output_rolls_over() {
        let mut out = ChunkedOutput::new(64, false);
        for i in 0..200u8 {
            out.write_byte(i);
        }
        out.write_slice(&[200, 201, 202]);
        let bytes = out.finish();
        assert_eq!(bytes.len(), 203);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[199], 199);
        assert_eq!(bytes[202], 202);
    }

    #[test]
    fn chunked_output_large_slice() {
        let mut out = ChunkedOutput::new(64, false);
        out.write_slice(&[7u8; 1000]);
        assert_eq!(out.finish(), vec![7u8; 1000]);
    }
}
