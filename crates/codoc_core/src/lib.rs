#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Rope-backed text buffer with atomic edit application
pub mod buffer;

/// Configuration options
pub mod config;

/// Per-editor cursor and selection state
pub mod cursor;

/// Character-level diffing for filesystem reconciliation
pub mod diff;

/// The document aggregate (content, version, history, cursors)
pub mod document;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// Ordered edit history
pub mod history;

/// Edit steps, authorship and checksums
pub mod op;

/// Command and event types exchanged with sessions
pub mod protocol;

/// Session registry and outbound fan-out
pub mod session;

/// The document service: command routing and the single-queue loop
pub mod service;

/// Debounced file watching
pub mod watch;
