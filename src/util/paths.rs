//! Lexical path helpers
//!
//! None of these touch the file system, so resolvers built on them stay pure.

use std::path::{Component, Path, PathBuf};

/// Collapses `.` and `..` components and drops trailing separators.
///
/// `..` at the root is discarded, the same way POSIX resolves `/..`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Path of `to` relative to `from`. Both sides are normalized first.
///
/// ```
/// use apphosting_adapter::util::relative_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     relative_path(Path::new("/app"), Path::new("/app/dist/browser")),
///     PathBuf::from("dist/browser")
/// );
/// assert_eq!(
///     relative_path(Path::new("/app/web"), Path::new("/app/dist")),
///     PathBuf::from("../dist")
/// );
/// ```
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize_path(from);
    let to = normalize_path(to);

    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from_parts.len() {
        out.push("..");
    }
    for part in &to_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

/// Renders a path with forward slashes, for commands written into the descriptor
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replacen("//", "/", 1)
}
