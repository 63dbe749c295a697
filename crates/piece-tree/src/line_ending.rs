//! Line ending helpers.
//!
//! The buffer stores text byte-for-byte, so mixed `\n` / `\r\n` / `\r` documents round-trip
//! unchanged. The preferred line ending is what new lines should use and what
//! [`crate::PieceTreeBuffer::set_eol`] normalizes to.

use crate::chunk::EolCounts;

/// The preferred newline sequence of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// The newline sequence itself.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Byte length of the newline sequence.
    pub fn len(self) -> usize {
        self.as_str().len()
    }

    /// Always `false`; a line ending is never empty.
    pub fn is_empty(self) -> bool {
        false
    }

    /// Pick the dominant line ending from terminator counts.
    ///
    /// Policy: `fallback` when there are no terminators, CRLF when lines ending in `\r` (alone
    /// or paired) are more than half of all terminators, LF otherwise.
    pub fn from_counts(counts: EolCounts, fallback: Self) -> Self {
        let total = counts.total();
        if total == 0 {
            fallback
        } else if counts.cr + counts.crlf > total / 2 {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    /// Detect the dominant line ending of `text`.
    pub fn detect_in_text(text: &str, fallback: Self) -> Self {
        let mut sink = Vec::new();
        Self::from_counts(crate::chunk::scan_line_starts(text, 0, &mut sink), fallback)
    }
}

/// Which newline sequence a read should produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EndOfLinePreference {
    /// Keep the terminators stored in the document.
    #[default]
    TextDefined,
    /// Rewrite every terminator to `\n`.
    Lf,
    /// Rewrite every terminator to `\r\n`.
    Crlf,
}

/// Rewrite every `\r\n`, `\r` and `\n` in `text` to `eol`.
///
/// `pending_cr` carries a trailing `\r` across calls so a pair split over two inputs is
/// rewritten once; pass the same flag for consecutive slices of one document.
pub(crate) fn normalize_into(text: &str, eol: &str, pending_cr: &mut bool, out: &mut String) {
    let mut rest = text;
    if *pending_cr {
        *pending_cr = false;
        if let Some(stripped) = rest.strip_prefix('\n') {
            rest = stripped;
        }
    }

    let bytes = rest.as_bytes();
    let mut copied = 0;
    let mut skip_lf_at = None;
    for pos in memchr::memchr2_iter(b'\r', b'\n', bytes) {
        if skip_lf_at == Some(pos) {
            copied = pos + 1;
            continue;
        }
        out.push_str(&rest[copied..pos]);
        out.push_str(eol);
        copied = pos + 1;
        if bytes[pos] == b'\r' {
            match bytes.get(pos + 1) {
                Some(b'\n') => skip_lf_at = Some(pos + 1),
                Some(_) => {}
                None => *pending_cr = true,
            }
        }
    }
    out.push_str(&rest[copied..]);
}
