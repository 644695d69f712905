//! Output path resolution for manifest-driven builds
//!
//! Pure path arithmetic: nothing here reads or writes the file system, so the
//! same manifest always resolves to the same options.

use super::{BUNDLE_DIR, DESCRIPTOR_FILE};
use crate::error::{AdapterError, Result};
use crate::manifest::OutputPaths;
use crate::util::{normalize_path, relative_path};
use std::path::{Path, PathBuf};
use url::Url;

/// Server entrypoint file name for manifest-driven builds
pub const SERVER_ENTRYPOINT: &str = "server.mjs";

/// Directory used for the server when the build produced none
pub const DEFAULT_SERVER_DIR: &str = "server";

/// Absolute locations of every bundle artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBundleOptions {
    pub bundle_descriptor_path: PathBuf,
    pub server_file_path: PathBuf,
    pub browser_directory: PathBuf,
    /// True iff the build produced no server output
    pub needs_server_generated: bool,
}

impl OutputBundleOptions {
    /// Directory holding the descriptor
    pub fn bundle_directory(&self) -> &Path {
        self.bundle_descriptor_path
            .parent()
            .unwrap_or(&self.bundle_descriptor_path)
    }
}

/// Maps a manifest's output paths onto the canonical bundle layout
///
/// `build_root` is the directory the adapter runs in; the descriptor always
/// lands in `<build_root>/.apphosting/bundle.yaml`.
pub fn populate_output_bundle_options(
    build_root: &Path,
    output_paths: &OutputPaths,
) -> Result<OutputBundleOptions> {
    let base_directory = file_url_to_path(&output_paths.root)?;
    let browser_relative = relative_path(&base_directory, &file_url_to_path(&output_paths.browser)?);

    let (server_relative, needs_server_generated) = match &output_paths.server {
        Some(server) => (
            relative_path(&base_directory, &file_url_to_path(server)?),
            false,
        ),
        None => (PathBuf::from(DEFAULT_SERVER_DIR), true),
    };

    Ok(OutputBundleOptions {
        bundle_descriptor_path: normalize_path(
            &build_root.join(BUNDLE_DIR).join(DESCRIPTOR_FILE),
        ),
        server_file_path: normalize_path(
            &base_directory.join(server_relative).join(SERVER_ENTRYPOINT),
        ),
        browser_directory: normalize_path(&base_directory.join(browser_relative)),
        needs_server_generated,
    })
}

/// Converts a `file://` URL to a path. Plain absolute paths are accepted as-is.
pub fn file_url_to_path(raw: &str) -> Result<PathBuf> {
    if let Ok(url) = Url::parse(raw) {
        if url.scheme() == "file" {
            return url
                .to_file_path()
                .map(|p| normalize_path(&p))
                .map_err(|_| AdapterError::InvalidOutputPath {
                    url: raw.to_string(),
                });
        }
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        Err(AdapterError::InvalidOutputPath {
            url: raw.to_string(),
        })
    }
}
