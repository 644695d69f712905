use super::{FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
}

/// In-memory file system used by unit and pipeline tests
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, MockEntry>>,
    root: PathBuf,
    read_only: RwLock<Vec<PathBuf>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            root,
            read_only: RwLock::new(Vec::new()),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();
        Self::ensure_parents(&mut files, &path);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.files
            .write()
            .unwrap()
            .retain(|p, _| !p.starts_with(&path));
    }

    /// Makes every write under `path` fail with a permission error
    pub fn deny_writes(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.read_only.write().unwrap().push(path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self
            .read_only
            .read()
            .unwrap()
            .iter()
            .any(|denied| path.starts_with(denied))
        {
            return Err(anyhow::Error::new(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("Permission denied: {:?}", path),
            )));
        }
        Ok(())
    }

    fn ensure_parents(files: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files.read().unwrap().contains_key(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.file_type == FileType::File)
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let path = self.normalize_path(path);
        self.check_writable(&path)?;
        let parent_exists = path
            .parent()
            .map(|p| self.is_dir(p))
            .unwrap_or(true);
        if !parent_exists {
            return Err(anyhow!("Parent directory does not exist: {:?}", path));
        }
        self.add_file(&path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = self.normalize_path(path);
        self.check_writable(&path)?;
        self.add_dir(&path);
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self.read_to_string(from)?;
        self.write(to, &content)
    }

    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()> {
        let from = self.normalize_path(from);
        let to = self.normalize_path(to);
        if !self.is_dir(&from) {
            return Err(anyhow!("Directory not found: {:?}", from));
        }
        self.check_writable(&to)?;

        let entries: Vec<(PathBuf, MockEntry)> = self
            .files
            .read()
            .unwrap()
            .iter()
            .filter(|(p, _)| p.starts_with(&from))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();

        self.add_dir(&to);
        for (path, entry) in entries {
            let target = to.join(path.strip_prefix(&from)?);
            match entry.content {
                Some(content) => self.add_file(&target, &content),
                None => self.add_dir(&target),
            }
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = self.normalize_path(from);
        let to = self.normalize_path(to);
        self.check_writable(&to)?;
        let content = self.read_to_string(&from)?;
        self.remove(&from);
        self.add_file(&to, &content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", "hello");

        assert!(fs.exists(Path::new("/mock/test.txt")));
        assert!(fs.is_file(Path::new("/mock/test.txt")));
    }

    #[test]
    fn test_parent_directories_created() {
        let fs = MockFileSystem::new();
        fs.add_file("a/b/c/file.txt", "content");

        assert!(fs.is_dir(Path::new("/mock/a")));
        assert!(fs.is_dir(Path::new("/mock/a/b/c")));
        assert!(fs.is_file(Path::new("/mock/a/b/c/file.txt")));
    }

    #[test]
    fn test_write_requires_parent() {
        let fs = MockFileSystem::new();
        assert!(fs.write(Path::new("/mock/missing/file.txt"), "x").is_err());

        fs.write_with_parents(Path::new("/mock/missing/file.txt"), "x")
            .unwrap();
        assert_eq!(
            fs.read_to_string(Path::new("/mock/missing/file.txt")).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_copy_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("public/favicon.ico", "icon");
        fs.add_file("public/img/logo.svg", "<svg/>");

        fs.copy_dir(Path::new("public"), Path::new("out/public"))
            .unwrap();

        assert_eq!(
            fs.read_to_string(Path::new("/mock/out/public/img/logo.svg"))
                .unwrap(),
            "<svg/>"
        );
        assert!(fs.is_file(Path::new("/mock/public/favicon.ico")));
    }

    #[test]
    fn test_rename_moves_content() {
        let fs = MockFileSystem::new();
        fs.add_file("next.config.js", "module.exports = {}");

        fs.rename(
            Path::new("next.config.js"),
            Path::new("next.config.original.js"),
        )
        .unwrap();

        assert!(!fs.exists(Path::new("/mock/next.config.js")));
        assert!(fs.is_file(Path::new("/mock/next.config.original.js")));
    }

    #[test]
    fn test_deny_writes() {
        let fs = MockFileSystem::new();
        fs.deny_writes("locked");

        let err = fs.create_dir_all(Path::new("locked/dir")).unwrap_err();
        assert!(err.to_string().contains("Permission denied"));
    }
}
