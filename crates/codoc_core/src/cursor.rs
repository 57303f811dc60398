//! Per-editor cursor and selection state.
//!
//! Cursors are ephemeral presence data: they are keyed by a client-chosen
//! id, not versioned, never recorded in history, and lost when the service
//! restarts or the document is re-linked.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The user a cursor belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorOwner {
    /// User id of the owning session.
    pub id: u32,
    /// Display name of the owning session.
    pub name: String,
}

/// One editor's cursor and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Client-chosen cursor id.
    pub id: String,
    /// Caret position, in characters.
    pub position: u32,
    /// Selection start, in characters.
    pub selection_start: u32,
    /// Selection end, in characters.
    pub selection_end: u32,
    /// Who the cursor belongs to.
    pub owner: CursorOwner,
}

/// Table of live cursors, keyed by cursor id.
#[derive(Debug, Clone, Default)]
pub struct CursorTable {
    cursors: HashMap<String, Cursor>,
}

impl CursorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the cursor with the same id.
    pub fn upsert(&mut self, cursor: Cursor) {
        self.cursors.insert(cursor.id.clone(), cursor);
    }

    /// Remove a cursor. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.cursors.remove(id).is_some()
    }

    /// All live cursors, in no particular order.
    pub fn snapshot(&self) -> Vec<Cursor> {
        self.cursors.values().cloned().collect()
    }

    /// Number of live cursors.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Drop all cursors, e.g. when re-linking a file.
    pub fn clear(&mut self) {
        self.cursors.clear();
    }
}
