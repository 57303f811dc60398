//! Command and event types exchanged with editing sessions.
//!
//! Inbound commands and outbound events are closed tagged unions: the
//! service matches them exhaustively, so an unknown shape can only exist at
//! the transport boundary (where it is logged and dropped), never inside the
//! engine. Wire encoding itself is the embedding transport's concern; these
//! types are serde-serializable so any tagged encoding works.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::history::HistoryEntry;
use crate::op::{Author, EditStep};
use crate::session::SessionId;

/// All commands a session can send to a document service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Command {
    /// Link the document to a file on disk. Allowed once; re-linking the
    /// same path re-reads it, linking a different path is an error.
    Link {
        /// Path of the file to link.
        path: PathBuf,
    },

    /// Apply an ordered list of edit steps to the document.
    Edit {
        /// The steps, applied left-to-right against one running cursor.
        ops: Vec<EditStep>,
        /// Claimed provenance of the edit.
        author: Author,
    },

    /// Create or move a cursor.
    NewCursor {
        /// The cursor, keyed by its client-chosen id.
        cursor: Cursor,
    },

    /// Remove a cursor.
    DeleteCursor {
        /// Id of the cursor to remove.
        id: String,
    },

    /// Fetch history entries in an inclusive version window.
    Fetch {
        /// First version to return (1-indexed).
        version_from: u32,
        /// Last version to return, inclusive.
        version_to: u32,
    },

    /// No-op used as a liveness/sync barrier; always answered with `Ok`.
    Flush,
}

/// Everything a document service can send to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Outbound {
    /// Reply to a successful link.
    Linked {
        /// Version after linking (always 1).
        version: u32,
        /// The linked path.
        path: PathBuf,
        /// Full file content at link time.
        contents: String,
    },

    /// An accepted edit, broadcast to every session including the sender.
    Ot(HistoryEntry),

    /// A cursor created or moved by another session.
    NewCursor(Cursor),

    /// A cursor removed by another session.
    DeleteCursor {
        /// Id of the removed cursor.
        id: String,
    },

    /// Reply to a history fetch.
    History {
        /// Entries in the requested window, in version order.
        entries: Vec<HistoryEntry>,
    },

    /// Snapshot sent to a newly attached session.
    Status(StatusSnapshot),

    /// Generic acknowledgement.
    Ok,

    /// A user-visible failure, e.g. an edit past the content bounds.
    Error {
        /// Human-readable description.
        message: String,
    },
}

/// Full document state for a joining session.
///
/// Empty (all fields unset) when no file is linked yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Current content, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,

    /// Current version, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Linked path, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Live cursors at join time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cursors: Vec<Cursor>,
}

/// An outbound event addressed to one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// The receiving session.
    pub session: SessionId,

    /// Echo of the originating request's reference, on direct replies and
    /// on the sender's copy of an edit broadcast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// The event itself.
    pub body: Outbound,
}
