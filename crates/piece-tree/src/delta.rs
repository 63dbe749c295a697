//! Edit results.
//!
//! [`crate::PieceTreeBuffer::apply_edit`] clamps its input before touching the tree. Consumers
//! that keep offsets of their own (decorations, cursors, incremental parsers) need the edit that
//! was *actually* applied to re-anchor them, without diffing old and new text. Offsets are
//! UTF-8 byte offsets.

/// The clamped edit performed by [`crate::PieceTreeBuffer::apply_edit`].
///
/// Semantics:
/// - `offset` is a byte offset in the document **before** the edit.
/// - `deleted_length` bytes starting at `offset` were removed, then `inserted_length` bytes were
///   inserted at `offset`.
/// - An edit that changed nothing has both lengths zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AppliedEdit {
    /// Start byte offset of the edit.
    pub offset: usize,
    /// Number of bytes removed.
    pub deleted_length: usize,
    /// Number of bytes inserted.
    pub inserted_length: usize,
}

impl AppliedEdit {
    /// Returns `true` if the edit changed nothing.
    pub fn is_noop(&self) -> bool {
        self.deleted_length == 0 && self.inserted_length == 0
    }

    /// Exclusive end of the deleted range in the pre-edit document.
    pub fn deleted_end(&self) -> usize {
        self.offset + self.deleted_length
    }

    /// Exclusive end of the inserted range in the post-edit document.
    pub fn inserted_end(&self) -> usize {
        self.offset + self.inserted_length
    }

    /// Change of the document length.
    pub fn length_delta(&self) -> isize {
        self.inserted_length as isize - self.deleted_length as isize
    }

    /// Map a pre-edit offset to the post-edit document.
    ///
    /// Offsets before the edit are unchanged, offsets after the deleted range shift by
    /// [`Self::length_delta`], and offsets inside the deleted range collapse to the edit start.
    /// An offset exactly at `offset` stays put, so text inserted there lands after it.
    pub fn map_offset(&self, pre_edit: usize) -> usize {
        if pre_edit <= self.offset {
            pre_edit
        } else if pre_edit >= self.deleted_end() {
            pre_edit - self.deleted_length + self.inserted_length
        } else {
            self.offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_offset() {
        let edit = AppliedEdit {
            offset: 4,
            deleted_length: 3,
            inserted_length: 5,
        };
        assert_eq!(edit.map_offset(2), 2);
        assert_eq!(edit.map_offset(4), 4);
        assert_eq!(edit.map_offset(5), 4);
        assert_eq!(edit.map_offset(7), 9);
        assert_eq!(edit.map_offset(10), 12);
        assert_eq!(edit.length_delta(), 2);
    }

    #[test]
    fn test_noop() {
        assert!(AppliedEdit::default().is_noop());
    }
}
