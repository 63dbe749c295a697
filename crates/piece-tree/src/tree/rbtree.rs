//! Red-black tree primitives.
//!
//! Attaching, detaching and re-pointing a node ([`PieceTreeModel::set_piece`]) are the only
//! places that touch the document totals and the left-subtree aggregates; everything else is
//! built on top of them.

use super::{Color, Node, NodeId, PieceTreeModel, apply_delta};
use crate::piece::Piece;

impl PieceTreeModel {
    fn alloc(&mut self, piece: Piece) -> NodeId {
        let node = Node {
            piece,
            parent: None,
            left: None,
            right: None,
            color: Color::Red,
            size_left: 0,
            lf_left: 0,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId::from_index(self.nodes.len() - 1)
            }
        }
    }

    pub(crate) fn is_free(&self, id: NodeId) -> bool {
        self.free.contains(&id)
    }

    fn color_of(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |id| self.node(id).color)
    }

    fn set_color(&mut self, id: Option<NodeId>, color: Color) {
        if let Some(id) = id {
            self.node_mut(id).color = color;
        }
    }

    /// Add `(len, lf)` deltas to every ancestor that has `id` in its left subtree.
    pub(crate) fn update_tree_metadata(&mut self, id: NodeId, len_delta: isize, lf_delta: isize) {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let p = self.node_mut(parent);
            if p.left == Some(current) {
                p.size_left = apply_delta(p.size_left, len_delta);
                p.lf_left = apply_delta(p.lf_left, lf_delta);
            }
            current = parent;
        }
    }

    fn adjust_totals(&mut self, len_delta: isize, lf_delta: isize) {
        self.total_length = apply_delta(self.total_length, len_delta);
        self.total_line_feeds = apply_delta(self.total_line_feeds, lf_delta);
    }

    /// Re-point `id` at a different piece, keeping aggregates and totals in step.
    pub(crate) fn set_piece(&mut self, id: NodeId, piece: Piece) {
        let old = self.node(id).piece;
        self.node_mut(id).piece = piece;
        let len_delta = piece.len() as isize - old.len() as isize;
        let lf_delta = piece.line_feed_count as isize - old.line_feed_count as isize;
        if len_delta != 0 || lf_delta != 0 {
            self.update_tree_metadata(id, len_delta, lf_delta);
            self.adjust_totals(len_delta, lf_delta);
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let Some(y) = self.node(x).right else {
            return;
        };
        let (x_size, x_lf) = {
            let n = self.node(x);
            (n.size_left + n.piece.len(), n.lf_left + n.piece.line_feed_count)
        };
        {
            let yn = self.node_mut(y);
            yn.size_left += x_size;
            yn.lf_left += x_lf;
        }

        let y_left = self.node(y).left;
        self.node_mut(x).right = y_left;
        if let Some(b) = y_left {
            self.node_mut(b).parent = Some(x);
        }
        self.replace_child(x, Some(y));
        self.node_mut(y).left = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    fn rotate_right(&mut self, y: NodeId) {
        let Some(x) = self.node(y).left else {
            return;
        };
        let (x_size, x_lf) = {
            let n = self.node(x);
            (n.size_left + n.piece.len(), n.lf_left + n.piece.line_feed_count)
        };
        {
            let yn = self.node_mut(y);
            yn.size_left -= x_size;
            yn.lf_left -= x_lf;
        }

        let x_right = self.node(x).right;
        self.node_mut(y).left = x_right;
        if let Some(b) = x_right {
            self.node_mut(b).parent = Some(y);
        }
        self.replace_child(y, Some(x));
        self.node_mut(x).right = Some(y);
        self.node_mut(y).parent = Some(x);
    }

    /// Put `new` where `old` hangs under its parent (or at the root).
    fn replace_child(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self.node(old).parent;
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.node(p).left == Some(old) {
                    self.node_mut(p).left = new;
                } else {
                    self.node_mut(p).right = new;
                }
            }
        }
        if let Some(new) = new {
            self.node_mut(new).parent = parent;
        }
    }

    /// Hook a freshly allocated node into the tree and account for it.
    fn attach(&mut self, z: NodeId) {
        let piece = self.node(z).piece;
        let len = piece.len() as isize;
        let lf = piece.line_feed_count as isize;
        self.update_tree_metadata(z, len, lf);
        self.adjust_totals(len, lf);
        self.piece_count += 1;
        self.fix_insert(z);
    }

    /// Insert `piece` as the in-order successor of `node`.
    pub(crate) fn insert_after(&mut self, node: NodeId, piece: Piece) -> NodeId {
        let z = self.alloc(piece);
        match self.node(node).right {
            None => {
                self.node_mut(node).right = Some(z);
                self.node_mut(z).parent = Some(node);
            }
            Some(right) => {
                let successor = self.leftmost(right);
                self.node_mut(successor).left = Some(z);
                self.node_mut(z).parent = Some(successor);
            }
        }
        self.attach(z);
        z
    }

    /// Insert `piece` as the in-order predecessor of `node`.
    pub(crate) fn insert_before(&mut self, node: NodeId, piece: Piece) -> NodeId {
        let z = self.alloc(piece);
        match self.node(node).left {
            None => {
                self.node_mut(node).left = Some(z);
                self.node_mut(z).parent = Some(node);
            }
            Some(left) => {
                let predecessor = self.rightmost(left);
                self.node_mut(predecessor).right = Some(z);
                self.node_mut(z).parent = Some(predecessor);
            }
        }
        self.attach(z);
        z
    }

    /// Append `piece` after the last node, or make it the root of an empty tree.
    pub(crate) fn insert_piece_at_end(&mut self, piece: Piece) -> NodeId {
        match self.last() {
            Some(last) => self.insert_after(last, piece),
            None => {
                let z = self.alloc(piece);
                self.root = Some(z);
                self.attach(z);
                z
            }
        }
    }

    fn fix_insert(&mut self, mut z: NodeId) {
        while let Some(parent) = self.node(z).parent {
            if self.node(parent).color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = self.node(parent).parent else {
                break;
            };

            if self.node(grand).left == Some(parent) {
                let uncle = self.node(grand).right;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(Some(parent), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(grand), Color::Red);
                    z = grand;
                } else {
                    let mut parent = parent;
                    if self.node(parent).right == Some(z) {
                        z = parent;
                        self.rotate_left(z);
                        parent = self.node(z).parent.unwrap_or(parent);
                    }
                    self.set_color(Some(parent), Color::Black);
                    self.set_color(Some(grand), Color::Red);
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.node(grand).left;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(Some(parent), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(grand), Color::Red);
                    z = grand;
                } else {
                    let mut parent = parent;
                    if self.node(parent).left == Some(z) {
                        z = parent;
                        self.rotate_right(z);
                        parent = self.node(z).parent.unwrap_or(parent);
                    }
                    self.set_color(Some(parent), Color::Black);
                    self.set_color(Some(grand), Color::Red);
                    self.rotate_left(grand);
                }
            }
        }
        self.set_color(self.root, Color::Black);
    }

    /// Unlink `z` from the tree and put it on the free list.
    pub(crate) fn rb_delete(&mut self, z: NodeId) {
        let z_piece = self.node(z).piece;
        let z_len = z_piece.len() as isize;
        let z_lf = z_piece.line_feed_count as isize;

        let z_left = self.node(z).left;
        let z_right = self.node(z).right;
        let removed_color;
        let x;
        let x_parent;

        match (z_left, z_right) {
            (None, _) | (_, None) => {
                removed_color = self.node(z).color;
                x = z_left.or(z_right);
                x_parent = self.node(z).parent;
                self.update_tree_metadata(z, -z_len, -z_lf);
                self.replace_child(z, x);
            }
            (Some(_), Some(right)) => {
                let y = self.leftmost(right);
                let y_piece = self.node(y).piece;
                let (y_len, y_lf) = (y_piece.len() as isize, y_piece.line_feed_count as isize);
                removed_color = self.node(y).color;
                x = self.node(y).right;

                // y leaves its place: ancestors strictly between y and z lose it from their
                // left subtrees.
                let mut current = y;
                while let Some(parent) = self.node(current).parent {
                    if parent == z {
                        break;
                    }
                    let p = self.node_mut(parent);
                    if p.left == Some(current) {
                        p.size_left = apply_delta(p.size_left, -y_len);
                        p.lf_left = apply_delta(p.lf_left, -y_lf);
                    }
                    current = parent;
                }
                // z itself disappears from the document.
                self.update_tree_metadata(z, -z_len, -z_lf);

                if self.node(y).parent == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.node(y).parent;
                    self.replace_child(y, x);
                    self.node_mut(y).right = Some(right);
                    self.node_mut(right).parent = Some(y);
                }
                self.replace_child(z, Some(y));
                let z_left = self.node(z).left;
                self.node_mut(y).left = z_left;
                if let Some(left) = z_left {
                    self.node_mut(left).parent = Some(y);
                }
                let (z_color, z_size_left, z_lf_left) = {
                    let n = self.node(z);
                    (n.color, n.size_left, n.lf_left)
                };
                let yn = self.node_mut(y);
                yn.color = z_color;
                yn.size_left = z_size_left;
                yn.lf_left = z_lf_left;
            }
        }

        self.adjust_totals(-z_len, -z_lf);
        self.piece_count -= 1;
        self.free.push(z);

        if removed_color == Color::Black {
            self.fix_delete(x, x_parent);
        }
    }

    fn fix_delete(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && self.color_of(x) == Color::Black {
            let Some(p) = parent else {
                break;
            };
            if self.node(p).left == x {
                let Some(mut w) = self.node(p).right else {
                    break;
                };
                if self.node(w).color == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(p).color = Color::Red;
                    self.rotate_left(p);
                    let Some(next) = self.node(p).right else {
                        break;
                    };
                    w = next;
                }
                if self.color_of(self.node(w).left) == Color::Black
                    && self.color_of(self.node(w).right) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = Some(p);
                    parent = self.node(p).parent;
                } else {
                    if self.color_of(self.node(w).right) == Color::Black {
                        let w_left = self.node(w).left;
                        self.set_color(w_left, Color::Black);
                        self.node_mut(w).color = Color::Red;
                        self.rotate_right(w);
                        let Some(next) = self.node(p).right else {
                            break;
                        };
                        w = next;
                    }
                    self.node_mut(w).color = self.node(p).color;
                    self.node_mut(p).color = Color::Black;
                    let w_right = self.node(w).right;
                    self.set_color(w_right, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let Some(mut w) = self.node(p).left else {
                    break;
                };
                if self.node(w).color == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(p).color = Color::Red;
                    self.rotate_right(p);
                    let Some(next) = self.node(p).left else {
                        break;
                    };
                    w = next;
                }
                if self.color_of(self.node(w).left) == Color::Black
                    && self.color_of(self.node(w).right) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = Some(p);
                    parent = self.node(p).parent;
                } else {
                    if self.color_of(self.node(w).left) == Color::Black {
                        let w_right = self.node(w).right;
                        self.set_color(w_right, Color::Black);
                        self.node_mut(w).color = Color::Red;
                        self.rotate_left(w);
                        let Some(next) = self.node(p).left else {
                            break;
                        };
                        w = next;
                    }
                    self.node_mut(w).color = self.node(p).color;
                    self.node_mut(p).color = Color::Black;
                    let w_left = self.node(w).left;
                    self.set_color(w_left, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }
        self.set_color(x, Color::Black);
    }
}

#[cfg(test)]
mod tests {
    use crate::chunk::{ChunkBuffer, ChunkId};
    use crate::options::PieceTreeOptions;
    use crate::piece::Piece;
    use crate::tree::PieceTreeModel;

    fn model_of(text: &str) -> PieceTreeModel {
        PieceTreeModel::new(vec![ChunkBuffer::new(text)], PieceTreeOptions::default())
    }

    /// Cut the single original piece into one-byte pieces by pushing them in order.
    fn fragmented(text: &str) -> PieceTreeModel {
        let mut model = PieceTreeModel::empty(PieceTreeOptions::default());
        model.originals.push(ChunkBuffer::new(text));
        for start in 0..text.len() {
            let piece = Piece::new(ChunkId::Original(0), &model.originals[0], start, start + 1);
            model.insert_piece_at_end(piece);
        }
        model
    }

    #[test]
    fn test_sequential_inserts_stay_balanced() {
        let model = fragmented("abcdefghijklmnopqrstuvwxyz0123456789");
        assert_eq!(model.piece_count(), 36);
        assert_eq!(model.text(), "abcdefghijklmnopqrstuvwxyz0123456789");
        model.validate().unwrap();
    }

    #[test]
    fn test_delete_every_other_node() {
        let mut model = fragmented("a\nb\nc\nd\ne\nf\ng\nh\n");
        let ids: Vec<_> = {
            let mut ids = Vec::new();
            let mut cursor = model.first();
            while let Some(id) = cursor {
                ids.push(id);
                cursor = model.next(id);
            }
            ids
        };
        for id in ids.iter().step_by(2) {
            model.rb_delete(*id);
            model.validate().unwrap();
        }
        assert_eq!(model.text(), "\n\n\n\n\n\n\n\n");
        assert_eq!(model.total_line_feeds(), 8);
    }

    #[test]
    fn test_free_list_reuses_slots() {
        let mut model = model_of("abc");
        let first = model.first().unwrap();
        let piece = model.piece_of(first);
        model.rb_delete(first);
        assert!(model.is_empty());
        let again = model.insert_piece_at_end(piece);
        assert_eq!(again, first);
        assert_eq!(model.text(), "abc");
        model.validate().unwrap();
    }

    #[test]
    fn test_set_piece_updates_totals() {
        let mut model = model_of("ab\ncd");
        let id = model.first().unwrap();
        let chunk = model.chunk(ChunkId::Original(0)).clone();
        model.set_piece(id, Piece::new(ChunkId::Original(0), &chunk, 0, 2));
        assert_eq!(model.total_length(), 2);
        assert_eq!(model.total_line_feeds(), 0);
        model.validate().unwrap();
    }
}
