#![warn(missing_docs)]
//! Piece Tree - Text Buffer Core for Code Editors
//!
//! # Overview
//!
//! `piece-tree` stores a text document as a balanced tree of *pieces*: descriptors pointing into
//! immutable chunks of text. Loading a file never copies it into a single string, edits never
//! move existing text, and every offset/line lookup runs in `O(log n)`.
//!
//! # Core Features
//!
//! - **Piece Tree Storage**: red-black tree of pieces with per-node left-subtree length and
//!   line-break aggregates
//! - **Line Index**: line starts precomputed per chunk, `\n`, `\r\n` and `\r` all recognized
//! - **CRLF Integrity**: a `\r\n` pair is never split across two pieces, so line counts stay exact
//!   under arbitrary edits
//! - **Search Cache**: recently resolved nodes are remembered, so sequential reads skip the descent
//! - **Streaming Snapshots**: content can be read piece by piece without materializing it
//! - **Search**: literal and regex search with whole-word and case options
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  PieceTreeBuffer (edits, reads, EOL, BOM)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Snapshot / Search                          │  ← Streaming & Find
//! ├─────────────────────────────────────────────┤
//! │  PieceTreeModel (red-black tree + cache)    │  ← Offset/Line Index
//! ├─────────────────────────────────────────────┤
//! │  Pieces                                     │  ← Text Descriptors
//! ├─────────────────────────────────────────────┤
//! │  Chunk Buffers (original + add)             │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use piece_tree::{PieceTreeBuffer, Position};
//!
//! let mut buffer = PieceTreeBuffer::new("fn main() {\r\n}\r\n");
//!
//! // Insert a line
//! let edit = buffer.apply_edit(13, 0, "    println!(\"hi\");\r\n");
//! assert_eq!(edit.inserted_length, 21);
//!
//! assert_eq!(buffer.get_line_count(), 4);
//! assert_eq!(buffer.get_line_content(2), "    println!(\"hi\");");
//! assert_eq!(buffer.get_position_at(17), Position::new(2, 5));
//! assert_eq!(buffer.get_offset_at(3, 1), 34);
//! ```
//!
//! ## Building From Chunks
//!
//! ```rust
//! use piece_tree::{PieceTreeBuilder, PieceTreeOptions};
//!
//! let mut builder = PieceTreeBuilder::new();
//! for chunk in ["first\r", "\nsecond\r", "\nthird"] {
//!     builder.accept_chunk(chunk);
//! }
//! let buffer = builder.finish(PieceTreeOptions::default());
//!
//! assert_eq!(buffer.get_lines_content(), vec!["first", "second", "third"]);
//! ```
//!
//! # Coordinates
//!
//! - Offsets, lengths and columns are UTF-8 **byte** counts.
//! - Positions are 1-based (`line >= 1`, `column >= 1`).
//! - Out-of-range inputs are clamped, never rejected.

mod buffer;
mod builder;
mod cache;
mod chunk;
pub mod delta;
mod error;
pub mod line_ending;
mod options;
mod piece;
mod position;
pub mod search;
pub mod snapshot;
mod text;
mod tree;

pub use buffer::PieceTreeBuffer;
pub use builder::{BOM, PieceTreeBuilder};
pub use cache::SearchCacheSnapshot;
pub use chunk::{ChunkBuffer, ChunkId, EolCounts};
pub use delta::AppliedEdit;
pub use error::InvariantViolation;
pub use line_ending::{EndOfLinePreference, LineEnding};
pub use options::{
    DEFAULT_CACHE_CLEAR_THRESHOLD, DEFAULT_CHUNK_SIZE, DEFAULT_SEARCH_CACHE_CAPACITY,
    PieceTreeOptions,
};
pub use piece::Piece;
pub use position::{Position, TextRange};
pub use search::{SearchError, SearchMatch, SearchOptions};
pub use snapshot::PieceTreeSnapshot;
pub use text::ContentFlags;
pub use tree::{PieceTreeModel, Pieces};
