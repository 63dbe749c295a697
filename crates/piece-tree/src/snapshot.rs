//! Streaming snapshot of a buffer's content.
//!
//! A snapshot walks the pieces in order and hands out borrowed slices, so even a very large
//! document can be written out without building one big `String`. It borrows the model, which
//! means the buffer cannot be edited while a snapshot is alive.

use crate::tree::{PieceTreeModel, Pieces};

/// Restartable reader over the text of a [`crate::PieceTreeBuffer`].
///
/// Yields the byte order mark first (when requested and present), then one slice per piece.
/// [`PieceTreeSnapshot::read`] returns `None` once everything has been handed out.
#[derive(Debug, Clone)]
pub struct PieceTreeSnapshot<'a> {
    model: &'a PieceTreeModel,
    bom: &'static str,
    bom_pending: bool,
    pieces: Pieces<'a>,
}

impl<'a> PieceTreeSnapshot<'a> {
    pub(crate) fn new(model: &'a PieceTreeModel, bom: &'static str) -> Self {
        Self {
            model,
            bom,
            bom_pending: !bom.is_empty(),
            pieces: model.pieces(),
        }
    }

    /// The next chunk of text, or `None` at the end.
    pub fn read(&mut self) -> Option<&'a str> {
        if self.bom_pending {
            self.bom_pending = false;
            return Some(self.bom);
        }
        let piece = self.pieces.next()?;
        Some(self.model.piece_text(&piece))
    }

    /// Start over from the beginning.
    pub fn restart(&mut self) {
        self.bom_pending = !self.bom.is_empty();
        self.pieces = self.model.pieces();
    }

    /// Read everything that is left into one `String`.
    pub fn read_to_string(&mut self) -> String {
        let mut out = String::with_capacity(self.model.total_length() + self.bom.len());
        while let Some(chunk) = self.read() {
            out.push_str(chunk);
        }
        out
    }
}

impl<'a> Iterator for PieceTreeSnapshot<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.read()
    }
}
