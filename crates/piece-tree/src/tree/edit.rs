//! Insert and delete on the piece tree, plus CRLF seam repair.
//!
//! After every edit no piece may end with `\r` while its successor starts with `\n`. An edit
//! can only create such a seam at the boundaries it touched, so those are checked and, when
//! needed, the pair is moved into a fresh two-byte piece of its own.

use tracing::{debug, trace};

use super::{NodeId, PieceTreeModel};
use crate::chunk::{ChunkBuffer, ChunkId};
use crate::piece::Piece;

/// Split `text` into parts of at most `size` bytes, never inside a character or a `\r\n` pair.
///
/// A part may exceed `size` by one byte to keep a pair together.
pub(crate) fn split_text(text: &str, size: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while rest.len() > size {
        let mut cut = size;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            cut = rest
                .char_indices()
                .nth(1)
                .map_or(rest.len(), |(index, _)| index);
        }
        let bytes = rest.as_bytes();
        if bytes[cut - 1] == b'\r' && bytes.get(cut) == Some(&b'\n') {
            cut += 1;
        }
        let (head, tail) = rest.split_at(cut);
        parts.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}

impl PieceTreeModel {
    /// Drop cached nodes an edit at `offset` spanning `span` bytes may have changed.
    fn invalidate_for_edit(&self, offset: usize, span: usize) {
        let mut cache = self.cache.borrow_mut();
        if span > self.options.cache_clear_threshold {
            debug!(offset, span, "large edit, clearing search cache");
            cache.clear();
        } else {
            trace!(offset, span, "invalidating search cache");
            cache.invalidate_from(offset);
        }
    }

    /// Store `text` and describe it as pieces.
    ///
    /// Small inserts go to the add chunk; anything larger than the chunk size is sealed into new
    /// original chunks.
    fn create_pieces(&mut self, text: &str) -> Vec<Piece> {
        if text.len() <= self.options.chunk_size {
            let start = self.add.append(text);
            return vec![Piece::new(ChunkId::Add, &self.add, start, start + text.len())];
        }

        let parts = split_text(text, self.options.chunk_size);
        debug!(
            bytes = text.len(),
            chunks = parts.len(),
            "storing oversized insert in sealed chunks"
        );
        parts
            .into_iter()
            .map(|part| {
                let index = self.originals.len();
                let chunk = ChunkBuffer::new(part);
                let piece = Piece::new(ChunkId::Original(index), &chunk, 0, chunk.len());
                self.originals.push(chunk);
                piece
            })
            .collect()
    }

    /// Grow `node` in place when it is the add chunk's tail piece.
    fn try_extend(&mut self, node: NodeId, text: &str) -> bool {
        let piece = self.piece_of(node);
        if piece.buffer != ChunkId::Add
            || piece.end != self.add.len()
            || text.len() > self.options.chunk_size
        {
            return false;
        }
        // The append would need a separator and break contiguity.
        if self.add.text().ends_with('\r') && text.starts_with('\n') {
            return false;
        }

        let start = self.add.append(text);
        debug_assert_eq!(start, piece.end);
        let extended = Piece::new(ChunkId::Add, &self.add, piece.start, start + text.len());
        self.set_piece(node, extended);
        true
    }

    /// Insert `text` at `offset` (clamped to the document length).
    ///
    /// `offset` must lie on a `char` boundary.
    pub fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = offset.min(self.total_length);
        let expected_length = self.total_length + text.len();
        let hit = self.node_at(offset);
        self.invalidate_for_edit(offset, text.len());

        let Some(hit) = hit else {
            for piece in self.create_pieces(text) {
                self.insert_piece_at_end(piece);
            }
            return;
        };

        let node = hit.node;
        let piece = self.piece_of(node);
        if hit.remainder == piece.len() {
            if !self.try_extend(node, text) {
                let mut anchor = node;
                for new_piece in self.create_pieces(text) {
                    anchor = self.insert_after(anchor, new_piece);
                }
            }
        } else if hit.remainder == 0 {
            let extended = match self.prev(node) {
                Some(prev) => self.try_extend(prev, text),
                None => false,
            };
            if !extended {
                for new_piece in self.create_pieces(text) {
                    self.insert_before(node, new_piece);
                }
            }
        } else {
            let split = piece.start + hit.remainder;
            let (head, tail) = {
                let chunk = self.chunk(piece.buffer);
                (
                    Piece::new(piece.buffer, chunk, piece.start, split),
                    Piece::new(piece.buffer, chunk, split, piece.end),
                )
            };
            self.set_piece(node, head);
            let mut anchor = node;
            for new_piece in self.create_pieces(text) {
                anchor = self.insert_after(anchor, new_piece);
            }
            self.insert_after(anchor, tail);
        }

        trace!(offset, len = text.len(), pieces = self.piece_count, "inserted");
        self.repair_seam(offset);
        self.repair_seam(offset + text.len());
        debug_assert_eq!(self.total_length, expected_length);
    }

    /// Delete `len` bytes starting at `offset`; the range is clamped to the document.
    ///
    /// Both ends must lie on `char` boundaries.
    pub fn delete(&mut self, offset: usize, len: usize) {
        let offset = offset.min(self.total_length);
        let len = len.min(self.total_length - offset);
        if len == 0 {
            return;
        }
        let expected_length = self.total_length - len;
        let Some(start) = self.node_at(offset) else {
            return;
        };
        self.invalidate_for_edit(offset, len);
        let Some(end) = self.locate(offset + len - 1) else {
            return;
        };
        // Exclusive end inside the end node.
        let end_cut = end.remainder + 1;

        if start.node == end.node {
            let node = start.node;
            let piece = self.piece_of(node);
            let keep_head = start.remainder > 0;
            let keep_tail = end_cut < piece.len();
            match (keep_head, keep_tail) {
                (false, false) => self.rb_delete(node),
                (false, true) => {
                    let tail = self.sub_piece(piece, piece.start + end_cut, piece.end);
                    self.set_piece(node, tail);
                }
                (true, false) => {
                    let head = self.sub_piece(piece, piece.start, piece.start + start.remainder);
                    self.set_piece(node, head);
                }
                (true, true) => {
                    let head = self.sub_piece(piece, piece.start, piece.start + start.remainder);
                    let tail = self.sub_piece(piece, piece.start + end_cut, piece.end);
                    self.set_piece(node, head);
                    self.insert_after(node, tail);
                }
            }
        } else {
            let mut doomed = Vec::new();
            let mut cursor = self.next(start.node);
            while let Some(id) = cursor {
                if id == end.node {
                    break;
                }
                doomed.push(id);
                cursor = self.next(id);
            }

            let start_piece = self.piece_of(start.node);
            if start.remainder == 0 {
                doomed.push(start.node);
            } else {
                let head = self.sub_piece(
                    start_piece,
                    start_piece.start,
                    start_piece.start + start.remainder,
                );
                self.set_piece(start.node, head);
            }

            let end_piece = self.piece_of(end.node);
            if end_cut == end_piece.len() {
                doomed.push(end.node);
            } else {
                let tail = self.sub_piece(end_piece, end_piece.start + end_cut, end_piece.end);
                self.set_piece(end.node, tail);
            }

            // Transplant-style deletion keeps the identity of surviving nodes, so the list
            // stays valid while it is drained.
            for id in doomed {
                self.rb_delete(id);
            }
        }

        trace!(offset, len, pieces = self.piece_count, "deleted");
        self.repair_seam(offset);
        debug_assert_eq!(self.total_length, expected_length);
        debug_assert_eq!(self.root.is_none(), self.piece_count == 0);
    }

    fn sub_piece(&self, piece: Piece, start: usize, end: usize) -> Piece {
        Piece::new(piece.buffer, self.chunk(piece.buffer), start, end)
    }

    /// Merge a `\r` | `\n` pair split across the piece boundary at `offset`, if there is one.
    pub(super) fn repair_seam(&mut self, offset: usize) {
        if offset == 0 || offset >= self.total_length {
            return;
        }
        let Some(hit) = self.locate(offset) else {
            return;
        };
        if hit.remainder != 0 {
            return;
        }
        let Some(prev) = self.prev(hit.node) else {
            return;
        };

        let prev_piece = self.piece_of(prev);
        let next_piece = self.piece_of(hit.node);
        let ends_with_cr = self.chunk(prev_piece.buffer).byte_at(prev_piece.end - 1) == Some(b'\r');
        let starts_with_lf = self.chunk(next_piece.buffer).byte_at(next_piece.start) == Some(b'\n');
        if ends_with_cr && starts_with_lf {
            self.fix_crlf(prev, hit.node);
        }
    }

    /// Move the `\r` ending `prev` and the `\n` starting `next` into a new `\r\n` piece.
    fn fix_crlf(&mut self, prev: NodeId, next: NodeId) {
        trace!(prev = prev.index(), next = next.index(), "joining split CRLF");
        let prev_piece = self.piece_of(prev);
        let next_piece = self.piece_of(next);
        let trimmed_prev = self.sub_piece(prev_piece, prev_piece.start, prev_piece.end - 1);
        let trimmed_next = self.sub_piece(next_piece, next_piece.start + 1, next_piece.end);
        self.set_piece(prev, trimmed_prev);
        self.set_piece(next, trimmed_next);

        let start = self.add.append("\r\n");
        let pair = Piece::new(ChunkId::Add, &self.add, start, start + 2);
        self.insert_after(prev, pair);

        if trimmed_prev.is_empty() {
            self.rb_delete(prev);
        }
        if trimmed_next.is_empty() {
            self.rb_delete(next);
        }
    }
}
