//! Error taxonomy for the adapter pipeline
//!
//! Every failure the pipeline can hit maps to one variant here. Nothing is
//! retried: an `AdapterError` aborts the run with a non-zero exit code. Build
//! tool warnings never become an `AdapterError`, they are only logged.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to find valid JSON object from build output: {output}")]
    ManifestNotFound { output: String },

    #[error("Invalid build manifest: {reason}\nManifest: {manifest}")]
    InvalidManifest { reason: String, manifest: String },

    #[error("Build manifest is missing the required outputPaths.browser entry")]
    MissingBrowserPath,

    #[error("Build manifest path is not a valid file URL or absolute path: {url}")]
    InvalidOutputPath { url: String },

    #[error("Currently, only the following builders are supported: {}. Found: {builder}", .allowed.join(","))]
    UnsupportedBuilder {
        builder: String,
        allowed: Vec<String>,
    },

    #[error("Unable to determine the application to deploy (found applications: [{}])", .applications.join(", "))]
    AmbiguousApplication { applications: Vec<String> },

    #[error("No output from the build command, expecting a build manifest")]
    NoBuildOutput,

    #[error("Build command `{command}` failed: {status}")]
    BuildFailed { command: String, status: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Adapter package.json file does not exist at {}", .path.display())]
    AdapterPackageMissing { path: PathBuf },

    #[error("Adapter package.json at {} is invalid: {reason}", .path.display())]
    InvalidAdapterPackage { path: PathBuf, reason: String },

    #[error("Failed to load framework config {}: {reason}", .path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("Invalid framework config override in {}: {reason}", .path.display())]
    InvalidConfigOverride { path: PathBuf, reason: String },

    #[error("Output directory is not of expected structure, missing: {}", format_paths(.missing))]
    IncompleteBundle { missing: Vec<PathBuf> },

    #[error("Failed to serialize {what}: {reason}")]
    Serialization { what: String, reason: String },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AdapterError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AdapterError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps an `anyhow` error coming out of the [`FileSystem`](crate::fs::FileSystem) seam.
    pub fn from_fs(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        let source = match err.downcast::<io::Error>() {
            Ok(io_err) => io_err,
            Err(other) => io::Error::new(io::ErrorKind::Other, format!("{:#}", other)),
        };
        AdapterError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
