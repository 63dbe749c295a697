use thiserror::Error;

use crate::chunk::ChunkId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// A broken piece-tree invariant, reported by [`crate::PieceTreeModel::validate`].
///
/// Any of these means the tree mutation logic has a bug; the document content can no longer be
/// trusted.
pub enum InvariantViolation {
    #[error("root node must be black")]
    /// The root is red.
    RedRoot,

    #[error("root node has a parent")]
    /// The root's parent link is set.
    RootHasParent,

    #[error("node {node} is red and has a red child")]
    /// Two consecutive red nodes on a path.
    RedRed {
        /// Arena index of the offending node.
        node: usize,
    },

    #[error("black height mismatch at node {node}: left {left}, right {right}")]
    /// Paths below a node carry different numbers of black nodes.
    BlackHeight {
        /// Arena index of the offending node.
        node: usize,
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },

    #[error("child of node {node} does not point back to it")]
    /// A child's parent link is wrong.
    ParentLink {
        /// Arena index of the parent node.
        node: usize,
    },

    #[error("node {node}: {field} is {actual}, expected {expected}")]
    /// A cached left-subtree aggregate disagrees with a full recount.
    Aggregate {
        /// Arena index of the offending node.
        node: usize,
        /// `size_left` or `lf_left`.
        field: &'static str,
        /// Value stored in the node.
        actual: usize,
        /// Value recomputed from the subtree.
        expected: usize,
    },

    #[error("piece in {buffer:?} [{start}, {end}) is invalid: {reason}")]
    /// A piece is empty, out of its chunk's bounds, or miscounts its line breaks.
    Piece {
        /// Chunk the piece points into.
        buffer: ChunkId,
        /// Piece start.
        start: usize,
        /// Piece end.
        end: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    #[error("{field} is {actual}, pieces add up to {expected}")]
    /// Document totals disagree with the pieces.
    Totals {
        /// `total_length`, `total_line_feeds` or `piece_count`.
        field: &'static str,
        /// Value kept by the model.
        actual: usize,
        /// Value recomputed from the pieces.
        expected: usize,
    },

    #[error("a \\r\\n pair is split across the piece boundary at offset {offset}")]
    /// A piece ends with `\r` while the next one starts with `\n`.
    SplitCrlf {
        /// Document offset of the boundary.
        offset: usize,
    },

    #[error("search cache entry for node {node} is stale")]
    /// A cache entry no longer describes its node.
    StaleCacheEntry {
        /// Arena index of the cached node.
        node: usize,
    },
}
