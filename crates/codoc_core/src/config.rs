//! Configuration types for a document service.
//!
//! Configuration is persisted as TOML and loaded through the
//! [`FileSystem`](crate::fs::FileSystem) abstraction, so embedders with
//! virtual storage can supply it the same way they supply documents. A
//! missing config file means defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CodocError, Result};
use crate::fs::FileSystem;

/// `ServiceConfig` is the user-tunable part of a document service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Debounce window for filesystem change notifications, in milliseconds.
    ///
    /// Bursts of writes to the linked file within this window collapse into
    /// one reconciliation pass.
    pub watch_debounce_ms: u64,

    /// Persist the document to disk after every accepted edit.
    pub autosave: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            watch_debounce_ms: 1000,
            autosave: true,
        }
    }
}

impl ServiceConfig {
    /// The debounce window as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        if !fs.exists(path) {
            return Ok(Self::default());
        }
        let raw = fs
            .read_to_string(path)
            .map_err(|source| CodocError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&raw)
    }
}
