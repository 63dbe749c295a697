//! Chunked construction of a [`PieceTreeBuffer`].
//!
//! Content can arrive in arbitrary pieces (file reads, network frames). The builder strips a
//! leading byte order mark, keeps `\r\n` pairs inside one chunk, and gathers the line-ending
//! statistics and content flags the buffer needs, so nothing has to be rescanned at
//! [`PieceTreeBuilder::finish`].

use tracing::debug;

use crate::buffer::PieceTreeBuffer;
use crate::chunk::{ChunkBuffer, EolCounts, scan_line_starts};
use crate::line_ending::{LineEnding, normalize_into};
use crate::options::PieceTreeOptions;
use crate::text::ContentFlags;
use crate::tree::{PieceTreeModel, split_text};

/// UTF-8 byte order mark.
pub const BOM: char = '\u{FEFF}';

/// Accumulates text chunks and turns them into a [`PieceTreeBuffer`].
///
/// ```rust
/// use piece_tree::{LineEnding, PieceTreeBuilder, PieceTreeOptions};
///
/// let mut builder = PieceTreeBuilder::new();
/// builder.accept_chunk("\u{FEFF}first line\r");
/// builder.accept_chunk("\nsecond line");
/// let buffer = builder.finish(PieceTreeOptions::default());
///
/// assert!(buffer.has_bom());
/// assert_eq!(buffer.get_eol(), LineEnding::Crlf);
/// assert_eq!(buffer.get_line_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PieceTreeBuilder {
    texts: Vec<String>,
    has_bom: bool,
    seen_content: bool,
    pending_cr: bool,
    counts: EolCounts,
    flags: ContentFlags,
}

impl PieceTreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from a sequence of chunks in one go.
    pub fn build_from_chunks<I, S>(chunks: I, options: PieceTreeOptions) -> PieceTreeBuffer
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Self::new();
        for chunk in chunks {
            builder.accept_chunk(chunk.as_ref());
        }
        builder.finish(options)
    }

    /// Feed the next chunk of content.
    pub fn accept_chunk(&mut self, chunk: &str) {
        let mut chunk = chunk;
        if !self.seen_content {
            if let Some(rest) = chunk.strip_prefix(BOM) {
                debug!("byte order mark detected");
                self.has_bom = true;
                chunk = rest;
            }
            if chunk.is_empty() {
                return;
            }
            self.seen_content = true;
        }
        if chunk.is_empty() {
            return;
        }

        // A trailing `\r` waits for the next chunk in case that one starts with `\n`.
        let (body, carry) = match chunk.strip_suffix('\r') {
            Some(body) => (body, true),
            None => (chunk, false),
        };
        let mut text = String::with_capacity(body.len() + 1);
        if self.pending_cr {
            text.push('\r');
        }
        text.push_str(body);
        self.pending_cr = carry;

        if !text.is_empty() {
            self.push_text(text);
        }
    }

    fn push_text(&mut self, text: String) {
        let mut sink = Vec::new();
        self.counts.add(scan_line_starts(&text, 0, &mut sink));
        self.flags.merge(ContentFlags::scan(&text));
        self.texts.push(text);
    }

    /// Whether a byte order mark was stripped from the content.
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Line terminators seen so far (a carried `\r` is not counted yet).
    pub fn eol_counts(&self) -> EolCounts {
        self.counts
    }

    /// Content flags of the text seen so far.
    pub fn content_flags(&self) -> ContentFlags {
        self.flags
    }

    /// Build the buffer.
    pub fn finish(mut self, options: PieceTreeOptions) -> PieceTreeBuffer {
        if self.pending_cr {
            self.pending_cr = false;
            self.counts.cr += 1;
            match self.texts.last_mut() {
                Some(last) => last.push('\r'),
                None => self.texts.push(String::from("\r")),
            }
        }

        let eol = LineEnding::from_counts(self.counts, options.default_eol);
        let mixed = match eol {
            LineEnding::Lf => self.counts.cr + self.counts.crlf > 0,
            LineEnding::Crlf => self.counts.cr + self.counts.lf > 0,
        };

        let texts = if options.normalize_eol && mixed {
            debug!(?eol, counts = ?self.counts, "normalizing line endings");
            let mut pending = false;
            self.texts
                .iter()
                .map(|text| {
                    let mut out = String::with_capacity(text.len());
                    normalize_into(text, eol.as_str(), &mut pending, &mut out);
                    out
                })
                .collect()
        } else {
            self.texts
        };

        let chunks: Vec<ChunkBuffer> = texts
            .iter()
            .flat_map(|text| split_text(text, options.chunk_size))
            .map(ChunkBuffer::new)
            .collect();
        debug!(
            chunks = chunks.len(),
            bom = self.has_bom,
            ?eol,
            "built piece tree"
        );

        let model = PieceTreeModel::new(chunks, options);
        PieceTreeBuffer::from_parts(model, self.has_bom, eol, self.flags)
    }
}
