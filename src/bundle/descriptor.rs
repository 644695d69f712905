//! Deployment descriptor (`bundle.yaml`)
//!
//! The descriptor tells the hosting platform how to start the app. Its shape
//! is an on-disk contract:
//!
//! ```yaml
//! version: v1
//! runConfig:
//!   runCommand: node server/server.mjs
//!   environmentVariables:
//!     - variable: SSR_PORT
//!       value: "8080"
//!       availability:
//!         - RUNTIME
//! metadata:
//!   adapterPackageName: "@apphosting/adapter-angular"
//!   adapterVersion: 17.2.0
//!   framework: angular
//!   frameworkVersion: 17.3.2
//! ```
//!
//! It is rebuilt from scratch on every run and overwrites whatever was there.

use super::OutputBundleOptions;
use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use crate::util::paths::{relative_path, to_slash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DESCRIPTOR_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Angular,
    #[serde(rename = "nextjs")]
    NextJs,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Angular => "angular",
            Framework::NextJs => "nextjs",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "BUILD")]
    Build,
    #[serde(rename = "RUNTIME")]
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarConfig {
    pub variable: String,
    pub value: String,
    pub availability: Vec<Availability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub run_command: String,
    pub environment_variables: Vec<EnvVarConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterMetadata {
    pub adapter_package_name: String,
    pub adapter_version: String,
    pub framework: String,
    pub framework_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAppFiles {
    pub include: Vec<String>,
}

/// Files the platform must ship alongside the server (Next.js standalone output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFiles {
    pub server_app: ServerAppFiles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBundleConfig {
    pub version: String,
    pub run_config: RunConfig,
    pub metadata: AdapterMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_files: Option<OutputFiles>,
}

/// Identity of the adapter itself, read from its `package.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdapterPackage {
    pub name: String,
    pub version: String,
}

impl AdapterPackage {
    /// # Errors
    ///
    /// `AdapterPackageMissing` if the file does not exist (the adapter is
    /// misinstalled), `InvalidAdapterPackage` if it lacks `name`/`version`.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        if !fs.exists(path) {
            return Err(AdapterError::AdapterPackageMissing {
                path: path.to_path_buf(),
            });
        }
        let content = fs
            .read_to_string(path)
            .map_err(|e| AdapterError::from_fs(path, e))?;
        serde_json::from_str(&content).map_err(|e| AdapterError::InvalidAdapterPackage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn metadata(&self, framework: Framework, framework_version: &str) -> AdapterMetadata {
        AdapterMetadata {
            adapter_package_name: self.name.clone(),
            adapter_version: self.version.clone(),
            framework: framework.as_str().to_string(),
            framework_version: framework_version.to_string(),
        }
    }
}

/// A compatibility shim: one env var forced for one exact framework release
struct EnvVarShim {
    framework: Framework,
    version: &'static str,
    variable: &'static str,
    value: &'static str,
    availability: &'static [Availability],
}

/// Known framework defects worked around through the environment.
/// Matching is on the exact version string; add rows, not code paths.
const ENV_VAR_SHIMS: &[EnvVarShim] = &[
    // Angular 17.3.2 ignores PORT for SSR and listens on SSR_PORT instead
    EnvVarShim {
        framework: Framework::Angular,
        version: "17.3.2",
        variable: "SSR_PORT",
        value: "8080",
        availability: &[Availability::Runtime],
    },
];

/// Environment overrides required by `framework` at `version`, in table order
pub fn env_var_overrides(framework: Framework, version: &str) -> Vec<EnvVarConfig> {
    ENV_VAR_SHIMS
        .iter()
        .filter(|shim| shim.framework == framework && shim.version == version)
        .map(|shim| EnvVarConfig {
            variable: shim.variable.to_string(),
            value: shim.value.to_string(),
            availability: shim.availability.to_vec(),
        })
        .collect()
}

/// `node <server path relative to cwd>`
pub fn run_command(cwd: &Path, server_file_path: &Path) -> String {
    format!("node {}", to_slash(&relative_path(cwd, server_file_path)))
}

/// Builds the descriptor for a resolved bundle
pub fn assemble_descriptor(
    opts: &OutputBundleOptions,
    cwd: &Path,
    framework: Framework,
    framework_version: &str,
    package: &AdapterPackage,
) -> OutputBundleConfig {
    OutputBundleConfig {
        version: DESCRIPTOR_VERSION.to_string(),
        run_config: RunConfig {
            run_command: run_command(cwd, &opts.server_file_path),
            environment_variables: env_var_overrides(framework, framework_version),
        },
        metadata: package.metadata(framework, framework_version),
        output_files: None,
    }
}

/// Serializes the descriptor to YAML at `path`, creating parent directories
pub fn write_descriptor(
    fs: &dyn FileSystem,
    path: &Path,
    descriptor: &OutputBundleConfig,
) -> Result<()> {
    let yaml = serde_yaml::to_string(descriptor).map_err(|e| AdapterError::Serialization {
        what: "bundle descriptor".to_string(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), "Writing bundle descriptor:\n{}", yaml);

    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .map_err(|e| AdapterError::from_fs(parent, e))?;
    }
    fs.write(path, &yaml)
        .map_err(|e| AdapterError::from_fs(path, e))?;

    info!(
        path = %path.display(),
        run_command = %descriptor.run_config.run_command,
        env_overrides = descriptor.run_config.environment_variables.len(),
        "Wrote bundle descriptor"
    );
    Ok(())
}

pub fn read_descriptor(fs: &dyn FileSystem, path: &Path) -> Result<OutputBundleConfig> {
    let content = fs
        .read_to_string(path)
        .map_err(|e| AdapterError::from_fs(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| AdapterError::Serialization {
        what: format!("bundle descriptor {}", path.display()),
        reason: e.to_string(),
    })
}

impl OutputBundleConfig {
    /// Server directory the platform must ship, relative to the build root
    pub fn with_server_app(mut self, build_root: &Path, app_dir: &Path) -> Self {
        let include = to_slash(&relative_path(build_root, app_dir));
        self.output_files = Some(OutputFiles {
            server_app: ServerAppFiles {
                include: vec![include],
            },
        });
        self
    }

    pub fn env_var(&self, variable: &str) -> Option<&EnvVarConfig> {
        self.run_config
            .environment_variables
            .iter()
            .find(|e| e.variable == variable)
    }
}

/// Descriptor location for a build root
pub fn descriptor_path(build_root: &Path) -> PathBuf {
    build_root.join(super::BUNDLE_DIR).join(super::DESCRIPTOR_FILE)
}
