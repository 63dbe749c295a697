//! Content classification used for the buffer's "might contain" flags.

/// Conservative facts about a document's characters.
///
/// Flags only ever go from `false` to `true` while editing; deleting the text that set a flag
/// does not clear it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentFlags {
    /// Right-to-left characters (Hebrew, Arabic and related scripts).
    pub rtl: bool,
    /// U+2028, U+2029 or U+0085.
    pub unusual_line_terminators: bool,
    /// Any character outside 7-bit ASCII.
    pub non_basic_ascii: bool,
}

impl ContentFlags {
    /// Classify `text`.
    pub fn scan(text: &str) -> Self {
        if text.is_ascii() {
            return Self::default();
        }
        let mut flags = Self {
            non_basic_ascii: true,
            ..Self::default()
        };
        for ch in text.chars() {
            flags.rtl |= is_rtl(ch);
            flags.unusual_line_terminators |= is_unusual_line_terminator(ch);
            if flags.rtl && flags.unusual_line_terminators {
                break;
            }
        }
        flags
    }

    /// Fold the flags of more content into `self`.
    pub fn merge(&mut self, other: Self) {
        self.rtl |= other.rtl;
        self.unusual_line_terminators |= other.unusual_line_terminators;
        self.non_basic_ascii |= other.non_basic_ascii;
    }
}

fn is_rtl(ch: char) -> bool {
    matches!(
        u32::from(ch),
        0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x10800..=0x10FFF | 0x1E900..=0x1E95F
    )
}

fn is_unusual_line_terminator(ch: char) -> bool {
    matches!(ch, '\u{2028}' | '\u{2029}' | '\u{0085}')
}
