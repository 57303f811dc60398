//! Native filesystem implementation.

use std::fs;
use std::io::Result;
use std::path::Path;

use super::FileSystem;

/// This is a simple filesystem implementation that simply maps to std::fs methods
#[derive(Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
