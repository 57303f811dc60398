//! The document aggregate.
//!
//! A [`Document`] owns everything that makes up one shared file: the linked
//! path, the text buffer, the version counter, the edit history and the
//! cursor table. It is held exclusively by a single
//! [`DocumentService`](crate::service::DocumentService); nothing else may
//! mutate contents or version, which is what makes the version counter a
//! faithful record of mutation order.

use std::path::{Path, PathBuf};

use crate::buffer::TextBuffer;
use crate::cursor::CursorTable;
use crate::error::{CodocError, Result};
use crate::history::{HistoryEntry, HistoryLog};
use crate::op::{checksum, Author, EditStep, SYSTEM_USER_ID};

/// One shared document: content, version, history and cursors.
///
/// The version counter starts at 1 when a file is linked and increases by
/// exactly 1 per accepted edit. Replaying history entries `1..=v` against an
/// empty buffer reproduces the content at version `v`.
#[derive(Debug, Default)]
pub struct Document {
    path: Option<PathBuf>,
    buffer: TextBuffer,
    version: u32,
    history: HistoryLog,
    cursors: CursorTable,
}

impl Document {
    /// Create an unlinked document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file has been linked.
    pub fn is_linked(&self) -> bool {
        self.path.is_some()
    }

    /// The linked file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current version. 0 until a file is linked.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Current content as a string.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// The edit history.
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// The live cursor table.
    pub fn cursors(&self) -> &CursorTable {
        &self.cursors
    }

    /// Mutable access to the cursor table.
    pub fn cursors_mut(&mut self) -> &mut CursorTable {
        &mut self.cursors
    }

    /// Link a file, adopting `contents` as the document state.
    ///
    /// Resets the document to version 1 and records a synthetic history
    /// entry whose edit inserts the full contents, so that replaying history
    /// from the start always reproduces the current state. Existing history
    /// and cursors are dropped (re-linking is a full re-sync).
    pub fn link(&mut self, path: PathBuf, contents: String) {
        self.buffer.set_text(&contents);
        self.version = 1;
        self.history.clear();
        self.cursors.clear();

        let crc32 = checksum(&contents);
        self.history.append(HistoryEntry {
            version: self.version,
            ops: vec![EditStep::Insert(contents)],
            crc32,
            committed_at: chrono::Utc::now().timestamp_millis(),
            author: Author::User,
            user_id: SYSTEM_USER_ID,
        });
        self.path = Some(path);
    }

    /// Apply an edit and record it in history.
    ///
    /// The edit is applied atomically: a bounds failure returns the error
    /// and leaves contents, version and history exactly as they were. On
    /// success the version is incremented by 1 and the appended entry
    /// (version, ops, checksum, timestamp, attribution) is returned for
    /// broadcasting.
    pub fn apply_edit(
        &mut self,
        ops: Vec<EditStep>,
        author: Author,
        user_id: u32,
    ) -> Result<HistoryEntry> {
        if !self.is_linked() {
            return Err(CodocError::NotLinked);
        }

        let new_contents = self.buffer.apply(&ops)?;
        self.version += 1;

        let entry = HistoryEntry {
            version: self.version,
            ops,
            crc32: checksum(&new_contents),
            committed_at: chrono::Utc::now().timestamp_millis(),
            author,
            user_id,
        };
        self.history.append(entry.clone());
        Ok(entry)
    }
}
