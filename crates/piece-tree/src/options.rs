//! Construction-time configuration.

use crate::line_ending::LineEnding;

/// Default size of a sealed chunk; larger inputs are split.
pub const DEFAULT_CHUNK_SIZE: usize = 65535;

/// Default number of entries kept by the search cache.
pub const DEFAULT_SEARCH_CACHE_CAPACITY: usize = 4;

/// Default edit span (bytes) above which an edit clears the search cache outright.
pub const DEFAULT_CACHE_CLEAR_THRESHOLD: usize = 4096;

/// Options used when building a [`crate::PieceTreeBuffer`].
///
/// ```rust
/// use piece_tree::{LineEnding, PieceTreeOptions};
///
/// let options = PieceTreeOptions::default()
///     .normalize_eol(true)
///     .default_eol(LineEnding::Crlf);
/// assert!(options.normalize_eol);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceTreeOptions {
    /// Rewrite every line terminator to the detected preferred EOL while building.
    pub normalize_eol: bool,
    /// Preferred EOL for documents that contain no line terminator.
    pub default_eol: LineEnding,
    /// Maximum entries in the search cache (at least 1).
    pub search_cache_capacity: usize,
    /// Edit span in bytes above which the search cache is cleared instead of invalidated.
    pub cache_clear_threshold: usize,
    /// Target size of sealed chunks; also the size above which an insert gets its own chunks.
    pub chunk_size: usize,
}

impl Default for PieceTreeOptions {
    fn default() -> Self {
        Self {
            normalize_eol: false,
            default_eol: LineEnding::Lf,
            search_cache_capacity: DEFAULT_SEARCH_CACHE_CAPACITY,
            cache_clear_threshold: DEFAULT_CACHE_CLEAR_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PieceTreeOptions {
    /// Set [`Self::normalize_eol`].
    pub fn normalize_eol(mut self, normalize: bool) -> Self {
        self.normalize_eol = normalize;
        self
    }

    /// Set [`Self::default_eol`].
    pub fn default_eol(mut self, eol: LineEnding) -> Self {
        self.default_eol = eol;
        self
    }

    /// Set [`Self::search_cache_capacity`].
    pub fn search_cache_capacity(mut self, capacity: usize) -> Self {
        self.search_cache_capacity = capacity.max(1);
        self
    }

    /// Set [`Self::cache_clear_threshold`].
    pub fn cache_clear_threshold(mut self, threshold: usize) -> Self {
        self.cache_clear_threshold = threshold;
        self
    }

    /// Set [`Self::chunk_size`]; values below 16 are raised to 16.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(16);
        self
    }
}
