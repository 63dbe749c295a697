//! Search cache: a tiny most-recently-used list of resolved tree nodes.
//!
//! Offset and line lookups consult the cache before descending the tree. Entries snapshot the
//! node's start offset, start line, length and line-feed count at the time they were stored, so
//! checking coverage never touches the tree. Every edit drops the entries it may have touched.

use crate::tree::NodeId;

/// A remembered node together with where it sat in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CacheEntry {
    pub node: NodeId,
    pub node_start_offset: usize,
    /// 1-based line on which the node starts.
    pub node_start_line: usize,
    pub length: usize,
    pub line_feeds: usize,
}

impl CacheEntry {
    fn end_offset(&self) -> usize {
        self.node_start_offset + self.length
    }

    fn covers_offset(&self, offset: usize) -> bool {
        self.node_start_offset <= offset && offset < self.end_offset()
    }

    /// The start of `line` lies inside the node.
    fn covers_line(&self, line: usize) -> bool {
        self.node_start_line < line && line <= self.node_start_line + self.line_feeds
    }
}

/// Read-only view of the cache counters.
///
/// Counters are informational only; they never influence what a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCacheSnapshot {
    /// Lookups answered from the cache.
    pub hit_count: u64,
    /// Lookups that fell back to a tree descent.
    pub miss_count: u64,
    /// Clears and invalidations that dropped at least one entry.
    pub clear_count: u64,
    /// Entries stored since the cache was created.
    pub entry_count: u64,
    /// Entries currently held.
    pub entries_remaining: usize,
    /// Offset passed to the most recent invalidation, if any.
    pub last_invalidated_offset: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct SearchCache {
    capacity: usize,
    entries: Vec<CacheEntry>,
    stats: SearchCacheSnapshot,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            stats: SearchCacheSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> SearchCacheSnapshot {
        SearchCacheSnapshot {
            entries_remaining: self.entries.len(),
            ..self.stats
        }
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn lookup_offset(&mut self, offset: usize) -> Option<CacheEntry> {
        let found = self
            .entries
            .iter()
            .rev()
            .find(|entry| entry.covers_offset(offset))
            .copied();
        self.record(found.is_some());
        found
    }

    pub fn lookup_line(&mut self, line: usize) -> Option<CacheEntry> {
        let found = self
            .entries
            .iter()
            .rev()
            .find(|entry| entry.covers_line(line))
            .copied();
        self.record(found.is_some());
        found
    }

    fn record(&mut self, hit: bool) {
        if hit {
            self.stats.hit_count += 1;
        } else {
            self.stats.miss_count += 1;
        }
    }

    pub fn remember(&mut self, entry: CacheEntry) {
        if entry.length == 0 {
            return;
        }
        self.entries.retain(|existing| existing.node != entry.node);
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(entry);
        self.stats.entry_count += 1;
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.stats.clear_count += 1;
            self.entries.clear();
        }
    }

    /// Drop every entry whose node ends at or after `offset`.
    ///
    /// A node ending exactly at `offset` is dropped too: an edit there may extend it or trim a
    /// trailing `\r` off it.
    pub fn invalidate_from(&mut self, offset: usize) {
        self.stats.last_invalidated_offset = Some(offset);
        let before = self.entries.len();
        self.entries.retain(|entry| entry.end_offset() < offset);
        if self.entries.len() != before {
            self.stats.clear_count += 1;
        }
    }
}
