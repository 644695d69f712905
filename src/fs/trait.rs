//! FileSystem trait definition

use anyhow::Result;
use std::path::Path;

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// Abstraction over the file operations the bundle pipeline performs
///
/// Writes are not transactional. A failure halfway through leaves whatever was
/// already written on disk; the output validator is what notices.
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write a file, replacing any previous content
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy a single file
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Recursively copy a directory tree into `to`, creating it if needed
    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()>;

    /// Rename a file
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Write a file, creating its parent directories first
    fn write_with_parents(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        self.write(path, contents)
    }
}
