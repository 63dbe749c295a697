//! Chunk buffers: the immutable backing stores that pieces point into.
//!
//! A chunk owns a slab of UTF-8 text plus the offsets at which each line starts inside that
//! slab. Line terminators are `\n`, `\r\n` and a lone `\r`; a line start is the offset just past
//! a terminator. Chunks are sealed once built, except for the single add chunk which only ever
//! grows at its tail.

use memchr::memchr2_iter;

/// Identifies the chunk a [`crate::Piece`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkId {
    /// A sealed chunk: initial content, or an oversized insert that was stored on its own.
    Original(usize),
    /// The append-only chunk that receives inserted text.
    Add,
}

/// Terminator counts gathered while scanning text for line starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EolCounts {
    /// Lone `\r` terminators.
    pub cr: usize,
    /// Lone `\n` terminators.
    pub lf: usize,
    /// `\r\n` pairs.
    pub crlf: usize,
}

impl EolCounts {
    /// Total number of line breaks.
    pub fn total(&self) -> usize {
        self.cr + self.lf + self.crlf
    }

    pub(crate) fn add(&mut self, other: EolCounts) {
        self.cr += other.cr;
        self.lf += other.lf;
        self.crlf += other.crlf;
    }
}

/// Scan `text` for line terminators, pushing `base + end_of_terminator` for each of them.
pub(crate) fn scan_line_starts(text: &str, base: usize, out: &mut Vec<usize>) -> EolCounts {
    let bytes = text.as_bytes();
    let mut counts = EolCounts::default();
    let mut skip_lf_at = None;

    for pos in memchr2_iter(b'\r', b'\n', bytes) {
        if skip_lf_at == Some(pos) {
            continue;
        }
        if bytes[pos] == b'\r' {
            if bytes.get(pos + 1) == Some(&b'\n') {
                counts.crlf += 1;
                out.push(base + pos + 2);
                skip_lf_at = Some(pos + 1);
            } else {
                counts.cr += 1;
                out.push(base + pos + 1);
            }
        } else {
            counts.lf += 1;
            out.push(base + pos + 1);
        }
    }

    counts
}

/// Immutable text slab with its line-start table.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    text: String,
    line_starts: Vec<usize>,
}

impl ChunkBuffer {
    /// Build a sealed chunk from `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        scan_line_starts(&text, 0, &mut line_starts);
        Self { text, line_starts }
    }

    /// An empty chunk (used as the initial add chunk).
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            line_starts: vec![0],
        }
    }

    /// Whole text of the chunk.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the chunk holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Line-start offsets, beginning with `0` and strictly increasing.
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Byte at `offset`, if any.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(offset).copied()
    }

    /// Text in `[start, end)`.
    ///
    /// Out-of-range or non-`char`-boundary requests are a caller bug: they assert in debug
    /// builds and are clamped (or yield an empty string) in release builds.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        debug_assert!(
            start <= end && end <= self.text.len(),
            "chunk slice {start}..{end} out of range (len {})",
            self.text.len()
        );
        let end = end.min(self.text.len());
        let start = start.min(end);
        debug_assert!(
            self.text.is_char_boundary(start) && self.text.is_char_boundary(end),
            "chunk slice {start}..{end} splits a character"
        );
        self.text.get(start..end).unwrap_or_default()
    }

    /// The nearest line start at or before `offset`.
    pub fn line_start_at(&self, offset: usize) -> usize {
        let idx = self.line_starts.partition_point(|&start| start <= offset);
        self.line_starts[idx.saturating_sub(1)]
    }

    /// Append `text` at the tail and return the offset where it begins.
    ///
    /// When the chunk ends with `\r` and `text` starts with `\n`, a `_` separator is written first
    /// so that the existing line-start table never has to be rewritten.
    pub(crate) fn append(&mut self, text: &str) -> usize {
        if self.text.ends_with('\r') && text.starts_with('\n') {
            self.text.push('_');
        }
        let start = self.text.len();
        self.text.push_str(text);
        scan_line_starts(text, start, &mut self.line_starts);
        start
    }

    /// Returns `true` when the `\r` just before `end` is followed by `\n` in the chunk, i.e. a
    /// piece ending at `end` cuts a CRLF pair in half.
    fn cuts_crlf_at(&self, start: usize, end: usize) -> bool {
        end > start && self.byte_at(end - 1) == Some(b'\r') && self.byte_at(end) == Some(b'\n')
    }

    /// Number of line breaks inside `[start, end)`.
    pub fn line_feeds_in(&self, start: usize, end: usize) -> usize {
        self.line_breaks_before(start, end, end)
    }

    /// Number of line breaks of the range `[start, end)` that are complete at `at`.
    ///
    /// A break is complete once `at` is past its last byte; a `\r` whose `\n` lies outside the
    /// range counts as a complete break at the range end.
    pub fn line_breaks_before(&self, start: usize, end: usize, at: usize) -> usize {
        let at = at.min(end);
        let lo = self.line_starts.partition_point(|&ls| ls <= start);
        let hi = self.line_starts.partition_point(|&ls| ls <= at);
        let mut count = hi.saturating_sub(lo);
        if at == end && self.cuts_crlf_at(start, end) {
            count += 1;
        }
        count
    }

    /// Chunk offset just past the `k`-th (1-based) line break of `[start, end)`.
    ///
    /// `k` must not exceed [`Self::line_feeds_in`] for the same range.
    pub fn line_break_end(&self, start: usize, end: usize, k: usize) -> usize {
        if k == 0 {
            return start;
        }
        let lo = self.line_starts.partition_point(|&ls| ls <= start);
        self.line_starts
            .get(lo + k - 1)
            .map_or(end, |&ls| ls.min(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_starts_mixed_terminators() {
        let chunk = ChunkBuffer::new("a\r\nb\nc\rd");
        assert_eq!(chunk.line_starts(), &[0, 3, 5, 7]);
    }

    #[test]
    fn test_scan_counts() {
        let mut out = Vec::new();
        let counts = scan_line_starts("\r\r\n\n\r", 10, &mut out);
        assert_eq!(counts, EolCounts { cr: 2, lf: 1, crlf: 1 });
        assert_eq!(out, vec![11, 13, 14, 15]);
    }

    #[test]
    fn test_line_start_at() {
        let chunk = ChunkBuffer::new("ab\ncd\nef");
        assert_eq!(chunk.line_start_at(0), 0);
        assert_eq!(chunk.line_start_at(2), 0);
        assert_eq!(chunk.line_start_at(3), 3);
        assert_eq!(chunk.line_start_at(7), 6);
    }

    #[test]
    fn test_line_feeds_in_range_cutting_crlf() {
        let chunk = ChunkBuffer::new("a\r\nb");
        // "a\r" keeps its carriage return as a break of its own.
        assert_eq!(chunk.line_feeds_in(0, 2), 1);
        // "\nb" owns the line feed.
        assert_eq!(chunk.line_feeds_in(2, 4), 1);
        // The whole pair counts once.
        assert_eq!(chunk.line_feeds_in(0, 4), 1);
        assert_eq!(chunk.line_feeds_in(1, 3), 1);
    }

    #[test]
    fn test_line_breaks_before_inside_pair() {
        let chunk = ChunkBuffer::new("a\r\nb");
        assert_eq!(chunk.line_breaks_before(0, 4, 2), 0);
        assert_eq!(chunk.line_breaks_before(0, 4, 3), 1);
    }

    #[test]
    fn test_line_break_end() {
        let chunk = ChunkBuffer::new("x\ny\r\nz");
        assert_eq!(chunk.line_break_end(0, 6, 1), 2);
        assert_eq!(chunk.line_break_end(0, 6, 2), 5);
        // Piece cut between `\r` and `\n`: its break ends at the piece end.
        assert_eq!(chunk.line_break_end(2, 4, 1), 4);
    }

    #[test]
    fn test_append_inserts_separator_between_cr_and_lf() {
        let mut chunk = ChunkBuffer::empty();
        assert_eq!(chunk.append("a\r"), 0);
        let start = chunk.append("\nb");
        assert_eq!(start, 3);
        assert_eq!(chunk.text(), "a\r_\nb");
        assert_eq!(chunk.line_starts(), &[0, 2, 4]);
    }

    #[test]
    fn test_append_keeps_existing_line_starts() {
        let mut chunk = ChunkBuffer::empty();
        chunk.append("ab\n");
        chunk.append("cd\r\nef");
        assert_eq!(chunk.line_starts(), &[0, 3, 7]);
        assert_eq!(chunk.slice(3, 5), "cd");
    }
}
