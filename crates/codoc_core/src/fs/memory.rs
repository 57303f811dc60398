//! In-memory filesystem for tests and virtual storage.

use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::FileSystem;

/// A filesystem backed by a shared in-memory map.
///
/// Clones share the same storage, so a test can hold one handle while the
/// service under test owns another and both observe the same files.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl InMemoryFileSystem {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, replacing any existing content.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .insert(path.into(), content.into());
    }

    /// Remove a file. Returns whether it existed.
    pub fn remove(&self, path: &Path) -> bool {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .remove(path)
            .is_some()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("No such file: {:?}", path)))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .expect("file map lock poisoned")
            .contains_key(path)
    }
}
