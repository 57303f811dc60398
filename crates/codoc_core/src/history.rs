//! Ordered edit history.
//!
//! Every accepted edit - network-submitted or reconciled from disk - is
//! recorded as a [`HistoryEntry`]. The log is append-only and totally
//! ordered: entry versions are dense, starting at 1, and the document at
//! version `v` is reconstructible by replaying entries `1..=v` in order.

use serde::{Deserialize, Serialize};

use crate::op::{Author, EditStep};

/// Immutable record of one applied edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Document version this entry produced.
    pub version: u32,

    /// The edit steps that were applied.
    pub ops: Vec<EditStep>,

    /// CRC32 of the content after applying the edit.
    pub crc32: u32,

    /// Unix timestamp when the edit was committed (milliseconds).
    pub committed_at: i64,

    /// Provenance of the edit.
    pub author: Author,

    /// User the edit is attributed to. Sentinel ids (see [`crate::op`])
    /// mark system and unknown-origin entries.
    pub user_id: u32,
}

/// Append-only log of applied edits.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are never reordered or rewritten.
    pub fn append(&mut self, entry: HistoryEntry) {
        debug_assert_eq!(
            entry.version as usize,
            self.entries.len() + 1,
            "history versions must be dense and ordered"
        );
        self.entries.push(entry);
    }

    /// Entries whose version falls in the window `[from, to]`.
    ///
    /// Versions are 1-indexed and the window is inclusive on both ends, so
    /// `range(1, 2)` returns the first two entries. Out-of-range bounds are
    /// clamped; an inverted window is empty.
    pub fn range(&self, from: u32, to: u32) -> &[HistoryEntry] {
        if self.entries.is_empty() || to < from {
            return &[];
        }
        let start = from.max(1) as usize - 1;
        let end = (to as usize).min(self.entries.len());
        if start >= end {
            return &[];
        }
        &self.entries[start..end]
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Iterate over all entries in version order.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries, e.g. when re-linking a file.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
