use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for codoc operations
#[derive(Debug, Error)]
pub enum CodocError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    // Edit application errors
    #[error("Invalid {op} past bounds: offset {at} exceeds length {len}")]
    EditOutOfBounds {
        /// The offending step kind ("skip" or "delete").
        op: &'static str,
        /// Offset the step would have reached.
        at: usize,
        /// Character length of the content at the time of the check.
        len: usize,
    },

    // Protocol sequencing errors
    #[error("Command received before a file was linked")]
    NotLinked,

    #[error("Document is already linked to '{0}'")]
    AlreadyLinked(PathBuf),

    // Watcher errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify_debouncer_full::notify::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type alias for codoc operations
pub type Result<T> = std::result::Result<T, CodocError>;
