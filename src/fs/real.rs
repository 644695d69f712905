use super::FileSystem;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).context(format!("Failed to write file {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context(format!("Failed to create directory {:?}", path))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to)
            .map(|_| ())
            .context(format!("Failed to copy {:?} to {:?}", from, to))
    }

    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()> {
        for entry in WalkDir::new(from).follow_links(true) {
            let entry = entry.context(format!("Failed to walk directory {:?}", from))?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .context("Walked entry outside of source directory")?;
            let target = to.join(relative);

            if entry.file_type().is_dir() {
                self.create_dir_all(&target)?;
            } else {
                self.copy_file(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).context(format!("Failed to rename {:?} to {:?}", from, to))
    }
}
