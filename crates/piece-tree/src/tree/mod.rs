//! Piece tree model: an arena-backed red-black tree of pieces.
//!
//! In-order traversal of the tree yields the document. Every node caches the byte length
//! (`size_left`) and line-break count (`lf_left`) of its left subtree, so offset and line
//! lookups descend in `O(log n)`.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]; absent children are `None`
//! rather than a shared sentinel. Removed nodes go on a free list and are reused by later
//! inserts.

mod edit;
mod rbtree;
mod validate;

pub(crate) use edit::split_text;

use std::cell::RefCell;

use crate::cache::{CacheEntry, SearchCache, SearchCacheSnapshot};
use crate::chunk::{ChunkBuffer, ChunkId};
use crate::options::PieceTreeOptions;
use crate::piece::Piece;
use crate::position::Position;

/// Index of a node in the model's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub piece: Piece,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub color: Color,
    /// Total length of the left subtree.
    pub size_left: usize,
    /// Total line breaks of the left subtree.
    pub lf_left: usize,
}

/// Result of resolving a document offset to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeHit {
    pub node: NodeId,
    /// Offset of the target inside the node's piece.
    pub remainder: usize,
    pub node_start_offset: usize,
    /// 1-based line on which the node starts.
    pub node_start_line: usize,
}

impl NodeHit {
    fn cache_entry(&self, piece: &Piece) -> CacheEntry {
        CacheEntry {
            node: self.node,
            node_start_offset: self.node_start_offset,
            node_start_line: self.node_start_line,
            length: piece.len(),
            line_feeds: piece.line_feed_count,
        }
    }
}

/// Apply a signed delta to an aggregate that can never go negative.
fn apply_delta(value: usize, delta: isize) -> usize {
    let updated = value.checked_add_signed(delta);
    debug_assert!(updated.is_some(), "aggregate {value} underflows by {delta}");
    updated.unwrap_or(0)
}

/// The piece tree itself.
///
/// Mutations go through [`PieceTreeModel::insert`] and [`PieceTreeModel::delete`]; reads take
/// `&self` and only touch the search cache through interior mutability.
#[derive(Debug)]
pub struct PieceTreeModel {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    originals: Vec<ChunkBuffer>,
    add: ChunkBuffer,
    total_length: usize,
    total_line_feeds: usize,
    piece_count: usize,
    cache: RefCell<SearchCache>,
    options: PieceTreeOptions,
}

impl PieceTreeModel {
    /// Build a model whose initial content is the concatenation of `chunks`.
    pub fn new(chunks: Vec<ChunkBuffer>, options: PieceTreeOptions) -> Self {
        let mut model = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            originals: Vec::new(),
            add: ChunkBuffer::empty(),
            total_length: 0,
            total_line_feeds: 0,
            piece_count: 0,
            cache: RefCell::new(SearchCache::new(options.search_cache_capacity)),
            options,
        };
        model.load(chunks);
        model
    }

    /// An empty model.
    pub fn empty(options: PieceTreeOptions) -> Self {
        Self::new(Vec::new(), options)
    }

    /// Replace the whole content with `chunks`, dropping every node and the add chunk.
    pub(crate) fn load(&mut self, chunks: Vec<ChunkBuffer>) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.add = ChunkBuffer::empty();
        self.total_length = 0;
        self.total_line_feeds = 0;
        self.piece_count = 0;
        self.cache.borrow_mut().clear();
        self.originals = chunks;

        let mut seams = Vec::new();
        for index in 0..self.originals.len() {
            let chunk = &self.originals[index];
            if chunk.is_empty() {
                continue;
            }
            let piece = Piece::new(ChunkId::Original(index), chunk, 0, chunk.len());
            if self.total_length > 0 {
                seams.push(self.total_length);
            }
            self.insert_piece_at_end(piece);
        }
        // Chunks may cut a `\r\n` pair in two.
        for offset in seams {
            self.repair_seam(offset);
        }
    }

    /// Options the model was built with.
    pub fn options(&self) -> &PieceTreeOptions {
        &self.options
    }

    /// Document length in bytes.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of line breaks in the document.
    pub fn total_line_feeds(&self) -> usize {
        self.total_line_feeds
    }

    /// Number of lines (line breaks plus one).
    pub fn line_count(&self) -> usize {
        self.total_line_feeds + 1
    }

    /// Number of pieces in the tree.
    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    /// Returns `true` for an empty document.
    pub fn is_empty(&self) -> bool {
        self.total_length == 0
    }

    /// Number of sealed chunks, including those created for oversized inserts.
    pub fn original_chunk_count(&self) -> usize {
        self.originals.len()
    }

    /// Current size of the add chunk in bytes.
    pub fn add_chunk_len(&self) -> usize {
        self.add.len()
    }

    /// Counters of the search cache.
    pub fn search_cache_snapshot(&self) -> SearchCacheSnapshot {
        self.cache.borrow().snapshot()
    }

    /// Pieces in document order.
    pub fn pieces(&self) -> Pieces<'_> {
        Pieces {
            model: self,
            next: self.first(),
        }
    }

    /// Piece texts in document order.
    pub fn chunks(&self) -> impl Iterator<Item = &str> + '_ {
        self.pieces().map(move |piece| self.piece_text(&piece))
    }

    /// Text a piece refers to.
    pub fn piece_text(&self, piece: &Piece) -> &str {
        self.chunk(piece.buffer).slice(piece.start, piece.end)
    }

    pub(crate) fn chunk(&self, id: ChunkId) -> &ChunkBuffer {
        match id {
            ChunkId::Add => &self.add,
            ChunkId::Original(index) => &self.originals[index],
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn piece_of(&self, id: NodeId) -> Piece {
        self.nodes[id.0].piece
    }

    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    pub(crate) fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.node(id).right {
            id = right;
        }
        id
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor.
    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.node(id).right {
            return Some(self.leftmost(right));
        }
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// In-order predecessor.
    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.node(id).left {
            return Some(self.rightmost(left));
        }
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Document offset at which `id` starts.
    pub(crate) fn offset_of(&self, id: NodeId) -> usize {
        let mut offset = self.node(id).size_left;
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).right == Some(current) {
                let p = self.node(parent);
                offset += p.size_left + p.piece.len();
            }
            current = parent;
        }
        offset
    }

    /// Line breaks in the document before `id`.
    pub(crate) fn lf_before(&self, id: NodeId) -> usize {
        let mut count = self.node(id).lf_left;
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).right == Some(current) {
                let p = self.node(parent);
                count += p.lf_left + p.piece.line_feed_count;
            }
            current = parent;
        }
        count
    }

    /// The last node, positioned just past its end.
    fn end_hit(&self) -> Option<NodeHit> {
        let last = self.last()?;
        let piece = self.piece_of(last);
        Some(NodeHit {
            node: last,
            remainder: piece.len(),
            node_start_offset: self.total_length - piece.len(),
            node_start_line: self.total_line_feeds - piece.line_feed_count + 1,
        })
    }

    /// Resolve `offset` by descending from the root, bypassing the cache.
    ///
    /// Node ranges are half-open, so an offset on a boundary resolves to the node starting
    /// there; `offset >= total_length` resolves to the end of the last node.
    pub(crate) fn locate(&self, offset: usize) -> Option<NodeHit> {
        if offset >= self.total_length {
            return self.end_hit();
        }

        let mut current = self.root?;
        let mut remaining = offset;
        let mut start = 0;
        let mut lines = 0;
        loop {
            let node = self.node(current);
            let len = node.piece.len();
            if remaining < node.size_left {
                current = node.left?;
            } else if remaining < node.size_left + len {
                return Some(NodeHit {
                    node: current,
                    remainder: remaining - node.size_left,
                    node_start_offset: start + node.size_left,
                    node_start_line: lines + node.lf_left + 1,
                });
            } else {
                remaining -= node.size_left + len;
                start += node.size_left + len;
                lines += node.lf_left + node.piece.line_feed_count;
                current = node.right?;
            }
        }
    }

    /// Resolve `offset`, consulting the search cache first and remembering the result.
    pub(crate) fn node_at(&self, offset: usize) -> Option<NodeHit> {
        if offset >= self.total_length {
            return self.end_hit();
        }

        if let Some(entry) = self.cache.borrow_mut().lookup_offset(offset) {
            return Some(NodeHit {
                node: entry.node,
                remainder: offset - entry.node_start_offset,
                node_start_offset: entry.node_start_offset,
                node_start_line: entry.node_start_line,
            });
        }

        let hit = self.locate(offset)?;
        let entry = hit.cache_entry(&self.node(hit.node).piece);
        self.cache.borrow_mut().remember(entry);
        Some(hit)
    }

    /// Offset at which the 1-based `line` starts.
    ///
    /// Lines past the end resolve to the document length.
    pub(crate) fn line_start_offset(&self, line: usize) -> usize {
        if line <= 1 {
            return 0;
        }
        if line > self.line_count() {
            return self.total_length;
        }

        if let Some(entry) = self.cache.borrow_mut().lookup_line(line) {
            let piece = self.node(entry.node).piece;
            let k = line - entry.node_start_line;
            let end = self.chunk(piece.buffer).line_break_end(piece.start, piece.end, k);
            return entry.node_start_offset + end - piece.start;
        }

        let Some(mut current) = self.root else {
            return 0;
        };
        let mut k = line - 1;
        let mut start = 0;
        let mut lines = 0;
        loop {
            let node = self.node(current);
            let lf = node.piece.line_feed_count;
            if k <= node.lf_left {
                match node.left {
                    Some(left) => current = left,
                    None => return start,
                }
            } else if k <= node.lf_left + lf {
                let piece = node.piece;
                let node_start = start + node.size_left;
                let hit = NodeHit {
                    node: current,
                    remainder: 0,
                    node_start_offset: node_start,
                    node_start_line: lines + node.lf_left + 1,
                };
                self.cache.borrow_mut().remember(hit.cache_entry(&piece));
                let end = self
                    .chunk(piece.buffer)
                    .line_break_end(piece.start, piece.end, k - node.lf_left);
                return node_start + end - piece.start;
            } else {
                k -= node.lf_left + lf;
                start += node.size_left + node.piece.len();
                lines += node.lf_left + lf;
                match node.right {
                    Some(right) => current = right,
                    None => return self.total_length,
                }
            }
        }
    }

    /// Offset just past the last content byte of `line`, before its terminator.
    fn line_content_end(&self, line: usize, line_start: usize) -> usize {
        if line >= self.line_count() {
            return self.total_length;
        }
        let raw_end = self.line_start_offset(line + 1);
        if raw_end <= line_start {
            return line_start;
        }
        match self.byte_at(raw_end - 1) {
            Some(b'\n') => {
                if raw_end >= line_start + 2 && self.byte_at(raw_end - 2) == Some(b'\r') {
                    raw_end - 2
                } else {
                    raw_end - 1
                }
            }
            Some(b'\r') => raw_end - 1,
            _ => raw_end,
        }
    }

    /// Byte at `offset`.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        if offset >= self.total_length {
            return None;
        }
        let hit = self.node_at(offset)?;
        let piece = self.node(hit.node).piece;
        self.chunk(piece.buffer).byte_at(piece.start + hit.remainder)
    }

    /// Position of `offset`, clamped to the document.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.total_length);
        let Some(hit) = self.node_at(offset) else {
            return Position::new(1, 1);
        };
        let piece = self.node(hit.node).piece;
        let chunk = self.chunk(piece.buffer);
        let breaks = chunk.line_breaks_before(piece.start, piece.end, piece.start + hit.remainder);
        let line = hit.node_start_line + breaks;
        let line_start = if breaks > 0 {
            hit.node_start_offset + chunk.line_break_end(piece.start, piece.end, breaks)
                - piece.start
        } else {
            self.line_start_offset(line)
        };
        Position::new(line, offset - line_start + 1)
    }

    /// Offset of a 1-based position.
    ///
    /// Lines below 1 clamp to the document start, lines past the end to the document end, and
    /// columns to the line's content (terminator excluded).
    pub fn offset_at(&self, line: usize, column: usize) -> usize {
        if line == 0 {
            return 0;
        }
        if line > self.line_count() {
            return self.total_length;
        }
        let start = self.line_start_offset(line);
        let end = self.line_content_end(line, start);
        start + column.saturating_sub(1).min(end - start)
    }

    /// Content of `line` without its terminator; empty past the end.
    pub fn line_content(&self, line: usize) -> String {
        if line == 0 || line > self.line_count() {
            return String::new();
        }
        let start = self.line_start_offset(line);
        let end = self.line_content_end(line, start);
        self.value_in_range(start, end)
    }

    /// Content of `line` including its terminator.
    pub fn line_raw_content(&self, line: usize) -> String {
        if line == 0 || line > self.line_count() {
            return String::new();
        }
        let start = self.line_start_offset(line);
        let end = if line == self.line_count() {
            self.total_length
        } else {
            self.line_start_offset(line + 1)
        };
        self.value_in_range(start, end)
    }

    /// Length of `line` in bytes, terminator excluded.
    pub fn line_length(&self, line: usize) -> usize {
        if line == 0 || line > self.line_count() {
            return 0;
        }
        let start = self.line_start_offset(line);
        self.line_content_end(line, start) - start
    }

    /// Text in `[start, end)`, clamped to the document.
    pub fn value_in_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.total_length);
        if start >= end {
            return String::new();
        }
        let Some(hit) = self.node_at(start) else {
            return String::new();
        };

        let mut out = String::with_capacity(end - start);
        let mut cursor = Some(hit.node);
        let mut skip = hit.remainder;
        let mut remaining = end - start;
        while let Some(id) = cursor {
            if remaining == 0 {
                break;
            }
            let piece = self.node(id).piece;
            let from = piece.start + skip;
            let to = (from + remaining).min(piece.end);
            out.push_str(self.chunk(piece.buffer).slice(from, to));
            remaining -= to - from;
            skip = 0;
            cursor = self.next(id);
        }
        out
    }

    /// The whole document.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.total_length);
        for chunk in self.chunks() {
            out.push_str(chunk);
        }
        out
    }

    /// Text of the piece containing `offset`, or `None` past the end.
    pub fn nearest_chunk(&self, offset: usize) -> Option<&str> {
        if offset >= self.total_length {
            return None;
        }
        let hit = self.node_at(offset)?;
        let piece = self.node(hit.node).piece;
        Some(self.chunk(piece.buffer).slice(piece.start + hit.remainder, piece.end))
    }
}

/// In-order iterator over the pieces of a [`PieceTreeModel`].
#[derive(Debug, Clone)]
pub struct Pieces<'a> {
    model: &'a PieceTreeModel,
    next: Option<NodeId>,
}

impl Iterator for Pieces<'_> {
    type Item = Piece;

    fn next(&mut self) -> Option<Piece> {
        let id = self.next?;
        self.next = self.model.next(id);
        Some(self.model.piece_of(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(chunks: &[&str]) -> PieceTreeModel {
        PieceTreeModel::new(
            chunks.iter().map(|text| ChunkBuffer::new(*text)).collect(),
            PieceTreeOptions::default(),
        )
    }

    #[test]
    fn test_load_skips_empty_chunks() {
        let model = model(&["abc", "", "def\n"]);
        assert_eq!(model.piece_count(), 2);
        assert_eq!(model.total_length(), 7);
        assert_eq!(model.line_count(), 2);
        assert_eq!(model.text(), "abcdef\n");
    }

    #[test]
    fn test_load_joins_pair_cut_between_chunks() {
        let joined = model(&["a\r", "\nb"]);
        assert_eq!(joined.text(), "a\r\nb");
        assert_eq!(joined.total_line_feeds(), 1);
        assert_eq!(joined.line_count(), 2);
        assert_eq!(joined.line_content(1), "a");
        assert_eq!(joined.line_content(2), "b");
        joined.validate().unwrap();

        let bare = model(&["\r", "\n", "x\r", "\n"]);
        assert_eq!(bare.text(), "\r\nx\r\n");
        assert_eq!(bare.line_count(), 3);
        bare.validate().unwrap();
    }

    #[test]
    fn test_locate_is_half_open() {
        let model = model(&["abc", "def"]);
        let hit = model.locate(3).unwrap();
        assert_eq!(hit.remainder, 0);
        assert_eq!(hit.node_start_offset, 3);
        let end = model.locate(6).unwrap();
        assert_eq!(end.remainder, 3);
        assert_eq!(end.node_start_offset, 3);
    }

    #[test]
    fn test_line_start_offset_across_chunks() {
        let model = model(&["a\nb", "c\r\n", "d\re"]);
        assert_eq!(model.line_count(), 4);
        assert_eq!(model.line_start_offset(1), 0);
        assert_eq!(model.line_start_offset(2), 2);
        assert_eq!(model.line_start_offset(3), 6);
        assert_eq!(model.line_start_offset(4), 8);
        assert_eq!(model.line_start_offset(5), model.total_length());
    }

    #[test]
    fn test_position_and_offset_are_inverse() {
        let model = model(&["one\ntwo", "\r\nthree"]);
        let text = model.text();
        for offset in 0..=text.len() {
            let bytes = text.as_bytes();
            if offset > 0 && bytes[offset - 1] == b'\r' && bytes.get(offset) == Some(&b'\n') {
                continue;
            }
            let pos = model.position_at(offset);
            assert_eq!(model.offset_at(pos.line, pos.column), offset, "offset {offset}");
        }
    }

    #[test]
    fn test_lines_of_simple_document() {
        let model = model(&["first\r\nsecond\nthird"]);
        assert_eq!(model.line_content(1), "first");
        assert_eq!(model.line_raw_content(1), "first\r\n");
        assert_eq!(model.line_length(2), 6);
        assert_eq!(model.line_content(3), "third");
        assert_eq!(model.line_content(4), "");
    }

    #[test]
    fn test_nearest_chunk() {
        let model = model(&["abc", "def"]);
        assert_eq!(model.nearest_chunk(1), Some("bc"));
        assert_eq!(model.nearest_chunk(3), Some("def"));
        assert_eq!(model.nearest_chunk(6), None);
    }
}
