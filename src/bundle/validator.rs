//! Post-build bundle validation
//!
//! The last step of every pipeline. A bundle is deployable only when each rule
//! finds its artifact on disk; the wrapped tool's exit code does not count.

use super::OutputBundleOptions;
use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use std::path::PathBuf;
use tracing::{debug, info};

/// One required artifact of a bundle
pub trait BundleRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the missing path, or `None` when the artifact exists
    fn check(&self, fs: &dyn FileSystem, opts: &OutputBundleOptions) -> Option<PathBuf>;
}

pub struct BrowserDirectoryRule;

impl BundleRule for BrowserDirectoryRule {
    fn name(&self) -> &'static str {
        "BrowserDirectory"
    }

    fn check(&self, fs: &dyn FileSystem, opts: &OutputBundleOptions) -> Option<PathBuf> {
        (!fs.is_dir(&opts.browser_directory)).then(|| opts.browser_directory.clone())
    }
}

pub struct ServerEntrypointRule;

impl BundleRule for ServerEntrypointRule {
    fn name(&self) -> &'static str {
        "ServerEntrypoint"
    }

    fn check(&self, fs: &dyn FileSystem, opts: &OutputBundleOptions) -> Option<PathBuf> {
        (!fs.is_file(&opts.server_file_path)).then(|| opts.server_file_path.clone())
    }
}

pub struct DescriptorRule;

impl BundleRule for DescriptorRule {
    fn name(&self) -> &'static str {
        "Descriptor"
    }

    fn check(&self, fs: &dyn FileSystem, opts: &OutputBundleOptions) -> Option<PathBuf> {
        (!fs.is_file(&opts.bundle_descriptor_path)).then(|| opts.bundle_descriptor_path.clone())
    }
}

/// The framework's own build directory (e.g. `.next`)
pub struct BuildDirectoryRule {
    pub directory: PathBuf,
}

impl BundleRule for BuildDirectoryRule {
    fn name(&self) -> &'static str {
        "BuildDirectory"
    }

    fn check(&self, fs: &dyn FileSystem, _opts: &OutputBundleOptions) -> Option<PathBuf> {
        (!fs.is_dir(&self.directory)).then(|| self.directory.clone())
    }
}

pub struct BundleValidator {
    rules: Vec<Box<dyn BundleRule>>,
}

impl BundleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn BundleRule>>) -> Self {
        Self { rules }
    }

    /// Default rules plus a check on the native build directory
    pub fn with_build_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.rules.insert(
            0,
            Box::new(BuildDirectoryRule {
                directory: directory.into(),
            }),
        );
        self
    }

    /// Runs every rule and reports all missing artifacts at once
    pub fn validate(&self, fs: &dyn FileSystem, opts: &OutputBundleOptions) -> Result<()> {
        let mut missing = Vec::new();
        for rule in &self.rules {
            match rule.check(fs, opts) {
                Some(path) => {
                    debug!(rule = rule.name(), path = %path.display(), "Bundle artifact missing");
                    missing.push(path);
                }
                None => debug!(rule = rule.name(), "Bundle artifact present"),
            }
        }

        if !missing.is_empty() {
            return Err(AdapterError::IncompleteBundle { missing });
        }

        info!(
            bundle = %opts.bundle_directory().display(),
            "Output directory has expected structure"
        );
        Ok(())
    }
}

impl Default for BundleValidator {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(BrowserDirectoryRule),
                Box::new(ServerEntrypointRule),
                Box::new(DescriptorRule),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::path::Path;

    fn opts() -> OutputBundleOptions {
        OutputBundleOptions {
            bundle_descriptor_path: PathBuf::from("/app/.apphosting/bundle.yaml"),
            server_file_path: PathBuf::from("/app/server/server.mjs"),
            browser_directory: PathBuf::from("/app/dist/browser"),
            needs_server_generated: true,
        }
    }

    fn complete_bundle() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir("/app/dist/browser");
        fs.add_file("/app/server/server.mjs", "");
        fs.add_file("/app/.apphosting/bundle.yaml", "version: v1\n");
        fs
    }

    fn missing_paths(result: Result<()>) -> Vec<PathBuf> {
        match result {
            Err(AdapterError::IncompleteBundle { missing }) => missing,
            other => panic!("Expected IncompleteBundle, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_bundle_passes() {
        let fs = complete_bundle();
        BundleValidator::new().validate(&fs, &opts()).unwrap();
    }

    #[test]
    fn test_each_missing_artifact_is_named() {
        for path in [
            "/app/dist/browser",
            "/app/server/server.mjs",
            "/app/.apphosting/bundle.yaml",
        ] {
            let fs = complete_bundle();
            fs.remove(path);

            let missing = missing_paths(BundleValidator::new().validate(&fs, &opts()));
            assert_eq!(missing, vec![PathBuf::from(path)]);
        }
    }

    #[test]
    fn test_all_missing_artifacts_reported_together() {
        let fs = MockFileSystem::new();
        let missing = missing_paths(BundleValidator::new().validate(&fs, &opts()));
        assert_eq!(missing.len(), 3);
    }

    #[test]
    fn test_server_path_must_be_a_file() {
        let fs = complete_bundle();
        fs.remove("/app/server/server.mjs");
        fs.add_dir("/app/server/server.mjs");

        let missing = missing_paths(BundleValidator::new().validate(&fs, &opts()));
        assert_eq!(missing, vec![PathBuf::from("/app/server/server.mjs")]);
    }

    #[test]
    fn test_build_directory_rule() {
        let fs = complete_bundle();
        let validator = BundleValidator::new().with_build_directory("/app/.next");

        let missing = missing_paths(validator.validate(&fs, &opts()));
        assert_eq!(missing, vec![PathBuf::from("/app/.next")]);

        fs.add_dir("/app/.next");
        validator.validate(&fs, &opts()).unwrap();
        assert!(fs.is_dir(Path::new("/app/.next")));
    }
}
