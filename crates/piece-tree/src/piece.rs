//! Piece descriptors.

use crate::chunk::{ChunkBuffer, ChunkId};

/// A contiguous run of text inside one chunk: `[start, end)` in chunk byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Chunk holding the text.
    pub buffer: ChunkId,
    /// Inclusive start offset inside the chunk.
    pub start: usize,
    /// Exclusive end offset inside the chunk.
    pub end: usize,
    /// Number of line breaks inside the piece (`\r\n` counts once).
    pub line_feed_count: usize,
}

impl Piece {
    /// Describe `[start, end)` of `chunk`, counting its line breaks.
    pub fn new(buffer: ChunkId, chunk: &ChunkBuffer, start: usize, end: usize) -> Self {
        Self {
            buffer,
            start,
            end,
            line_feed_count: chunk.line_feeds_in(start, end),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for a zero-length piece.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
