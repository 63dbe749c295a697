//! Full invariant check, used by tests and available to callers chasing corruption.

use super::{Color, NodeId, PieceTreeModel};
use crate::error::InvariantViolation;

/// Sums gathered for one subtree.
struct SubtreeSummary {
    length: usize,
    line_feeds: usize,
    count: usize,
    black_height: usize,
}

impl PieceTreeModel {
    /// Check every structural invariant of the tree.
    ///
    /// This walks the whole tree and recounts every aggregate, so it is `O(n)` (and
    /// `O(n log n)` for the cache entries); call it from tests or diagnostics, not per edit.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if let Some(root) = self.root {
            let node = self.node(root);
            if node.color != Color::Black {
                return Err(InvariantViolation::RedRoot);
            }
            if node.parent.is_some() {
                return Err(InvariantViolation::RootHasParent);
            }
        }

        let summary = self.check_subtree(self.root)?;
        for (field, actual, expected) in [
            ("total_length", self.total_length, summary.length),
            ("total_line_feeds", self.total_line_feeds, summary.line_feeds),
            ("piece_count", self.piece_count, summary.count),
        ] {
            if actual != expected {
                return Err(InvariantViolation::Totals {
                    field,
                    actual,
                    expected,
                });
            }
        }

        self.check_pieces()?;
        self.check_cache()
    }

    fn check_subtree(&self, id: Option<NodeId>) -> Result<SubtreeSummary, InvariantViolation> {
        let Some(id) = id else {
            return Ok(SubtreeSummary {
                length: 0,
                line_feeds: 0,
                count: 0,
                black_height: 1,
            });
        };
        let node = self.node(id);

        for child in [node.left, node.right].into_iter().flatten() {
            if self.node(child).parent != Some(id) {
                return Err(InvariantViolation::ParentLink { node: id.index() });
            }
            if node.color == Color::Red && self.node(child).color == Color::Red {
                return Err(InvariantViolation::RedRed { node: id.index() });
            }
        }

        let left = self.check_subtree(node.left)?;
        let right = self.check_subtree(node.right)?;

        if left.black_height != right.black_height {
            return Err(InvariantViolation::BlackHeight {
                node: id.index(),
                left: left.black_height,
                right: right.black_height,
            });
        }
        if node.size_left != left.length {
            return Err(InvariantViolation::Aggregate {
                node: id.index(),
                field: "size_left",
                actual: node.size_left,
                expected: left.length,
            });
        }
        if node.lf_left != left.line_feeds {
            return Err(InvariantViolation::Aggregate {
                node: id.index(),
                field: "lf_left",
                actual: node.lf_left,
                expected: left.line_feeds,
            });
        }

        Ok(SubtreeSummary {
            length: left.length + node.piece.len() + right.length,
            line_feeds: left.line_feeds + node.piece.line_feed_count + right.line_feeds,
            count: left.count + 1 + right.count,
            black_height: left.black_height + usize::from(node.color == Color::Black),
        })
    }

    fn check_pieces(&self) -> Result<(), InvariantViolation> {
        let mut offset = 0;
        let mut previous_ends_with_cr = false;
        for piece in self.pieces() {
            let chunk = self.chunk(piece.buffer);
            let fail = |reason| InvariantViolation::Piece {
                buffer: piece.buffer,
                start: piece.start,
                end: piece.end,
                reason,
            };
            if piece.is_empty() {
                return Err(fail("empty piece"));
            }
            if piece.start > piece.end || piece.end > chunk.len() {
                return Err(fail("out of chunk bounds"));
            }
            if !chunk.text().is_char_boundary(piece.start) || !chunk.text().is_char_boundary(piece.end)
            {
                return Err(fail("splits a character"));
            }
            if piece.line_feed_count != chunk.line_feeds_in(piece.start, piece.end) {
                return Err(fail("wrong line break count"));
            }

            if previous_ends_with_cr && chunk.byte_at(piece.start) == Some(b'\n') {
                return Err(InvariantViolation::SplitCrlf { offset });
            }
            previous_ends_with_cr = chunk.byte_at(piece.end - 1) == Some(b'\r');
            offset += piece.len();
        }
        Ok(())
    }

    fn check_cache(&self) -> Result<(), InvariantViolation> {
        let cache = self.cache.borrow();
        for entry in cache.entries() {
            let id = entry.node;
            let stale = InvariantViolation::StaleCacheEntry { node: id.index() };
            if id.index() >= self.nodes.len() || self.is_free(id) {
                return Err(stale);
            }
            let piece = self.piece_of(id);
            if self.offset_of(id) != entry.node_start_offset
                || self.lf_before(id) + 1 != entry.node_start_line
                || piece.len() != entry.length
                || piece.line_feed_count != entry.line_feeds
            {
                return Err(stale);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::chunk::{ChunkBuffer, ChunkId};
    use crate::error::InvariantViolation;
    use crate::piece::Piece;
    use crate::options::PieceTreeOptions;
    use crate::tree::{Color, PieceTreeModel};

    #[test]
    fn test_detects_corrupted_aggregate() {
        let mut model = PieceTreeModel::new(
            vec![ChunkBuffer::new("ab"), ChunkBuffer::new("cd")],
            PieceTreeOptions::default(),
        );
        let root = model.root.unwrap();
        model.node_mut(root).size_left += 1;
        assert!(matches!(
            model.validate(),
            Err(InvariantViolation::Aggregate { field: "size_left", .. })
        ));
    }

    #[test]
    fn test_detects_red_root() {
        let mut model =
            PieceTreeModel::new(vec![ChunkBuffer::new("ab")], PieceTreeOptions::default());
        let root = model.root.unwrap();
        model.node_mut(root).color = Color::Red;
        assert_eq!(model.validate(), Err(InvariantViolation::RedRoot));
    }

    #[test]
    fn test_detects_split_crlf() {
        let mut model = PieceTreeModel::new(
            vec![ChunkBuffer::new("a\r"), ChunkBuffer::new("x\nb")],
            PieceTreeOptions::default(),
        );
        model.validate().unwrap();
        // Drop the `x` so the second piece starts with the `\n`.
        let first = model.first().unwrap();
        let second = model.next(first).unwrap();
        let piece = Piece::new(ChunkId::Original(1), &model.originals[1], 1, 3);
        model.set_piece(second, piece);
        assert_eq!(model.text(), "a\r\nb");
        assert_eq!(
            model.validate(),
            Err(InvariantViolation::SplitCrlf { offset: 2 })
        );
    }
}
