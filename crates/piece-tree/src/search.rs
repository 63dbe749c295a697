//! Text search over a [`PieceTreeBuffer`].
//!
//! Queries are plain substrings (escaped and compiled into a regex) or regular expressions, with
//! optional case folding and whole-word matching. Match ranges are half-open UTF-8 byte ranges
//! and carry their 1-based positions as well.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::buffer::PieceTreeBuffer;
use crate::position::{Position, TextRange};

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// A match, as a half-open byte range plus the positions of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
    /// Position of `start`.
    pub start_position: Position,
    /// Position of `end`.
    pub end_position: Position,
}

impl SearchMatch {
    /// Length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The match as a position range.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start_position, self.end_position)
    }
}

/// Search errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provided regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

fn compile_search_regex(query: &str, options: SearchOptions) -> Result<Regex, SearchError> {
    let pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()?)
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Whether `query` may match a line terminator, and so has to see the whole document.
fn spans_lines(query: &str, options: SearchOptions) -> bool {
    if query.contains(['\n', '\r']) {
        return true;
    }
    options.regex
        && ["\\n", "\\r", "\\s", "\\W", "\\D", "[^"]
            .iter()
            .any(|escape| query.contains(escape))
}

/// Non-empty matches of `re` in `text`, as byte ranges, honoring whole-word filtering.
fn byte_matches<'t>(
    re: &'t Regex,
    text: &'t str,
    options: SearchOptions,
) -> impl Iterator<Item = (usize, usize)> + 't {
    re.find_iter(text)
        .map(|m| (m.start(), m.end()))
        .filter(move |&(start, end)| {
            start < end && (!options.whole_word || is_whole_word(text, start, end))
        })
}

impl PieceTreeBuffer {
    fn to_match(&self, start: usize, end: usize) -> SearchMatch {
        SearchMatch {
            start,
            end,
            start_position: self.get_position_at(start),
            end_position: self.get_position_at(end),
        }
    }

    /// Feed every match to `visit` in document order until it returns `false`.
    ///
    /// Queries that cannot match a line terminator are run over one line's content at a time, so
    /// the document is never materialized for them.
    fn scan_matches(
        &self,
        re: &Regex,
        query: &str,
        options: SearchOptions,
        mut visit: impl FnMut(usize, usize) -> bool,
    ) {
        if spans_lines(query, options) {
            let text = self.get_text();
            for (start, end) in byte_matches(re, &text, options) {
                if !visit(start, end) {
                    return;
                }
            }
            return;
        }

        for line in 1..=self.get_line_count() {
            let line_start = self.get_offset_at(line, 1);
            let content = self.get_line_content(line);
            for (start, end) in byte_matches(re, &content, options) {
                if !visit(line_start + start, line_start + end) {
                    return;
                }
            }
        }
    }

    /// The first match starting at or after `from`, wrapping around to the document start.
    ///
    /// Returns `Ok(None)` when there is no match at all (or `query` is empty).
    pub fn find_next(
        &self,
        query: &str,
        options: SearchOptions,
        from: usize,
    ) -> Result<Option<SearchMatch>, SearchError> {
        if query.is_empty() {
            return Ok(None);
        }
        let re = compile_search_regex(query, options)?;

        let mut first = None;
        let mut found = None;
        self.scan_matches(&re, query, options, |start, end| {
            if start >= from {
                found = Some((start, end));
                return false;
            }
            if first.is_none() {
                first = Some((start, end));
            }
            true
        });
        Ok(found.or(first).map(|(start, end)| self.to_match(start, end)))
    }

    /// The last match ending at or before `from`, wrapping around to the document end.
    ///
    /// Returns `Ok(None)` when there is no match at all (or `query` is empty).
    pub fn find_prev(
        &self,
        query: &str,
        options: SearchOptions,
        from: usize,
    ) -> Result<Option<SearchMatch>, SearchError> {
        if query.is_empty() {
            return Ok(None);
        }
        let re = compile_search_regex(query, options)?;

        let mut before = None;
        let mut last = None;
        self.scan_matches(&re, query, options, |start, end| {
            if end <= from {
                before = Some((start, end));
            }
            last = Some((start, end));
            true
        });
        Ok(before.or(last).map(|(start, end)| self.to_match(start, end)))
    }

    /// Every match in the document.
    pub fn find_all(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchMatch>, SearchError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let re = compile_search_regex(query, options)?;

        let mut matches = Vec::new();
        self.scan_matches(&re, query, options, |start, end| {
            matches.push(self.to_match(start, end));
            true
        });
        Ok(matches)
    }

    /// Matches inside `range`, searching each line's content separately, at most `limit` of
    /// them.
    ///
    /// Matches never span a line break; a match must lie entirely inside the range.
    pub fn find_matches_line_by_line(
        &self,
        query: &str,
        options: SearchOptions,
        range: TextRange,
        limit: usize,
    ) -> Result<Vec<SearchMatch>, SearchError> {
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let re = compile_search_regex(query, options)?;
        let range_start = self.get_offset_at(range.start.line, range.start.column);
        let range_end = self.get_offset_at(range.end.line, range.end.column);
        let last_line = range.end.line.min(self.get_line_count());

        let mut matches = Vec::new();
        for line in range.start.line.max(1)..=last_line {
            let line_start = self.get_offset_at(line, 1);
            let content = self.get_line_content(line);
            for (start, end) in byte_matches(&re, &content, options) {
                let (start, end) = (line_start + start, line_start + end);
                if start < range_start || end > range_end {
                    continue;
                }
                matches.push(self.to_match(start, end));
                if matches.len() == limit {
                    return Ok(matches);
                }
            }
        }
        Ok(matches)
    }
}
