//! The public text buffer.
//!
//! [`PieceTreeBuffer`] owns a [`PieceTreeModel`] together with the document-level facts the tree
//! does not track: the byte order mark, the preferred line ending and the content flags. Every
//! operation is total: offsets and positions outside the document are clamped, never rejected.

use tracing::debug;

use crate::builder::PieceTreeBuilder;
use crate::cache::SearchCacheSnapshot;
use crate::chunk::{ChunkBuffer, scan_line_starts};
use crate::delta::AppliedEdit;
use crate::line_ending::{EndOfLinePreference, LineEnding, normalize_into};
use crate::options::PieceTreeOptions;
use crate::position::{Position, TextRange};
use crate::snapshot::PieceTreeSnapshot;
use crate::text::ContentFlags;
use crate::tree::{PieceTreeModel, split_text};

const BOM_STR: &str = "\u{FEFF}";

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// A text document stored as a piece tree.
#[derive(Debug)]
pub struct PieceTreeBuffer {
    model: PieceTreeModel,
    bom: bool,
    eol: LineEnding,
    flags: ContentFlags,
}

impl Default for PieceTreeBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl PieceTreeBuffer {
    /// Create a buffer holding `text`, with default options.
    pub fn new(text: &str) -> Self {
        Self::with_options(text, PieceTreeOptions::default())
    }

    /// Create a buffer holding `text`.
    pub fn with_options(text: &str, options: PieceTreeOptions) -> Self {
        let mut builder = PieceTreeBuilder::new();
        builder.accept_chunk(text);
        builder.finish(options)
    }

    /// Create a buffer from content split into chunks.
    pub fn from_chunks<I, S>(chunks: I, options: PieceTreeOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PieceTreeBuilder::build_from_chunks(chunks, options)
    }

    pub(crate) fn from_parts(
        model: PieceTreeModel,
        bom: bool,
        eol: LineEnding,
        flags: ContentFlags,
    ) -> Self {
        Self {
            model,
            bom,
            eol,
            flags,
        }
    }

    /// The underlying tree, for inspection and integrity checks.
    pub fn model(&self) -> &PieceTreeModel {
        &self.model
    }

    /// Document length in bytes (BOM excluded).
    pub fn len(&self) -> usize {
        self.model.total_length()
    }

    /// Returns `true` for an empty document.
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    fn floor_char_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.len());
        while offset > 0 && self.model.byte_at(offset).is_some_and(is_continuation) {
            offset -= 1;
        }
        offset
    }

    fn ceil_char_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.len());
        while self.model.byte_at(offset).is_some_and(is_continuation) {
            offset += 1;
        }
        offset
    }

    /// Replace `length` bytes at `offset` with `text`.
    ///
    /// `length == 0` is a pure insert and an empty `text` a pure delete. The range is clamped to
    /// the document and widened to whole characters; the returned [`AppliedEdit`] describes what
    /// was actually done.
    pub fn apply_edit(&mut self, offset: usize, length: usize, text: &str) -> AppliedEdit {
        let start = self.floor_char_boundary(offset);
        // Only a deleted range is widened; a pure insert stays at the snapped offset.
        let end = if length == 0 {
            start
        } else {
            self.ceil_char_boundary(offset.saturating_add(length)).max(start)
        };
        if start != offset || end - start != length {
            debug!(offset, length, start, end, "edit range clamped");
        }

        if end > start {
            self.model.delete(start, end - start);
        }
        if !text.is_empty() {
            self.model.insert(start, text);
            self.flags.merge(ContentFlags::scan(text));
        }
        debug_assert!(self.model.total_length() >= start);

        AppliedEdit {
            offset: start,
            deleted_length: end - start,
            inserted_length: text.len(),
        }
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> AppliedEdit {
        self.apply_edit(offset, 0, text)
    }

    /// Delete `length` bytes at `offset`.
    pub fn delete(&mut self, offset: usize, length: usize) -> AppliedEdit {
        self.apply_edit(offset, length, "")
    }

    /// The whole document (BOM excluded).
    pub fn get_text(&self) -> String {
        self.model.text()
    }

    /// Text between two byte offsets, widened to whole characters.
    pub fn get_value_in_range(&self, start: usize, end: usize) -> String {
        let start = self.floor_char_boundary(start);
        let end = self.ceil_char_boundary(end);
        self.model.value_in_range(start, end)
    }

    fn range_offsets(&self, range: TextRange) -> (usize, usize) {
        (
            self.get_offset_at(range.start.line, range.start.column),
            self.get_offset_at(range.end.line, range.end.column),
        )
    }

    fn preferred_eol(&self, preference: EndOfLinePreference) -> Option<LineEnding> {
        match preference {
            EndOfLinePreference::TextDefined => None,
            EndOfLinePreference::Lf => Some(LineEnding::Lf),
            EndOfLinePreference::Crlf => Some(LineEnding::Crlf),
        }
    }

    /// Text of a position range, with every terminator rewritten per `preference`.
    pub fn get_value_in_range_with_eol(
        &self,
        range: TextRange,
        preference: EndOfLinePreference,
    ) -> String {
        let (start, end) = self.range_offsets(range);
        let raw = self.model.value_in_range(start, end);
        match self.preferred_eol(preference) {
            None => raw,
            Some(eol) => {
                let mut out = String::with_capacity(raw.len());
                normalize_into(&raw, eol.as_str(), &mut false, &mut out);
                out
            }
        }
    }

    /// Byte length of [`Self::get_value_in_range_with_eol`] for the same arguments.
    pub fn get_value_length_in_range(
        &self,
        range: TextRange,
        preference: EndOfLinePreference,
    ) -> usize {
        let (start, end) = self.range_offsets(range);
        let Some(eol) = self.preferred_eol(preference) else {
            return end - start;
        };
        if range.is_single_line() {
            return end - start;
        }
        let raw = self.model.value_in_range(start, end);
        let mut sink = Vec::new();
        let counts = scan_line_starts(&raw, 0, &mut sink);
        let stored = counts.cr + counts.lf + 2 * counts.crlf;
        raw.len() - stored + counts.total() * eol.len()
    }

    /// Number of lines.
    pub fn get_line_count(&self) -> usize {
        self.model.line_count()
    }

    /// Content of a 1-based line without its terminator.
    pub fn get_line_content(&self, line: usize) -> String {
        self.model.line_content(line)
    }

    /// Content of a 1-based line including its terminator.
    pub fn get_line_raw_content(&self, line: usize) -> String {
        self.model.line_raw_content(line)
    }

    /// Byte length of a line, terminator excluded.
    pub fn get_line_length(&self, line: usize) -> usize {
        self.model.line_length(line)
    }

    /// Every line, terminators excluded.
    pub fn get_lines_content(&self) -> Vec<String> {
        (1..=self.get_line_count())
            .map(|line| self.model.line_content(line))
            .collect()
    }

    /// Offset of a 1-based position, clamped to the document.
    pub fn get_offset_at(&self, line: usize, column: usize) -> usize {
        self.model.offset_at(line, column)
    }

    /// Position of an offset, clamped to the document.
    pub fn get_position_at(&self, offset: usize) -> Position {
        self.model.position_at(offset)
    }

    /// Byte value at `offset`, `0` when out of bounds.
    pub fn get_char_code(&self, offset: usize) -> u32 {
        self.model.byte_at(offset).map_or(0, u32::from)
    }

    /// Byte value at `index` (0-based) of a line's content, `0` when out of bounds.
    pub fn get_line_char_code(&self, line: usize, index: usize) -> u32 {
        if line == 0 || line > self.get_line_count() || index >= self.get_line_length(line) {
            return 0;
        }
        let start = self.get_offset_at(line, 1);
        self.get_char_code(start + index)
    }

    /// The character starting at `offset`, if `offset` is on a character boundary.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        let lead = self.model.byte_at(offset)?;
        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return None,
        };
        self.model
            .value_in_range(offset, offset + width)
            .chars()
            .next()
    }

    /// Text from `offset` to the end of the piece containing it; empty past the end.
    pub fn get_nearest_chunk(&self, offset: usize) -> &str {
        self.model.nearest_chunk(offset).unwrap_or_default()
    }

    /// Preferred line ending.
    pub fn get_eol(&self) -> LineEnding {
        self.eol
    }

    /// Rewrite every terminator to `eol` and make it the preferred line ending.
    ///
    /// The tree is rebuilt from fresh chunks, which also resets the add chunk and the search
    /// cache.
    pub fn set_eol(&mut self, eol: LineEnding) {
        let mut text = String::with_capacity(self.len());
        let mut pending = false;
        for chunk in self.model.chunks() {
            normalize_into(chunk, eol.as_str(), &mut pending, &mut text);
        }
        let chunks = split_text(&text, self.model.options().chunk_size)
            .into_iter()
            .map(ChunkBuffer::new)
            .collect();
        self.model.load(chunks);
        self.eol = eol;
        debug!(?eol, length = self.len(), "line endings normalized");
    }

    /// The byte order mark, or `""` when the content had none.
    pub fn get_bom(&self) -> &'static str {
        if self.bom { BOM_STR } else { "" }
    }

    /// Whether the content started with a byte order mark.
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Content flags gathered at build time and on every insert.
    pub fn content_flags(&self) -> ContentFlags {
        self.flags
    }

    /// Whether the document may contain right-to-left characters.
    pub fn might_contain_rtl(&self) -> bool {
        self.flags.rtl
    }

    /// Whether the document may contain U+2028, U+2029 or U+0085.
    pub fn might_contain_unusual_line_terminators(&self) -> bool {
        self.flags.unusual_line_terminators
    }

    /// Whether the document may contain characters outside 7-bit ASCII.
    pub fn might_contain_non_basic_ascii(&self) -> bool {
        self.flags.non_basic_ascii
    }

    /// Clear the unusual-line-terminator flag, e.g. after the caller replaced them all.
    pub fn reset_might_contain_unusual_line_terminators(&mut self) {
        self.flags.unusual_line_terminators = false;
    }

    /// A streaming reader over the content.
    pub fn create_snapshot(&self, preserve_bom: bool) -> PieceTreeSnapshot<'_> {
        let bom = if preserve_bom { self.get_bom() } else { "" };
        PieceTreeSnapshot::new(&self.model, bom)
    }

    /// Content equality: same BOM, same preferred EOL and same text.
    ///
    /// Piece layout does not matter; the texts are compared as streams without materializing
    /// either document.
    pub fn equal(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.bom != other.bom || self.eol != other.eol || self.len() != other.len() {
            return false;
        }
        let mut left = self.model.chunks().flat_map(str::bytes);
        let mut right = other.model.chunks().flat_map(str::bytes);
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (a, b) if a != b => return false,
                _ => {}
            }
        }
    }

    /// Counters of the search cache.
    pub fn search_cache_snapshot(&self) -> SearchCacheSnapshot {
        self.model.search_cache_snapshot()
    }
}

impl PartialEq for PieceTreeBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for PieceTreeBuffer {}

impl From<&str> for PieceTreeBuffer {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
