//! Next.js config loading
//!
//! The config is loaded by Next itself (`next/dist/server/config`) so that
//! every config flavour Next accepts (CJS, ESM, TypeScript, functions) is read
//! exactly as the real build will read it.

use super::{DEFAULT_CONFIG_FILE, DEFAULT_DIST_DIR};
use crate::build::{CommandRunner, Invocation};
use crate::error::{AdapterError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const LOADER_SCRIPT: &str = include_str!("../../../assets/next_config_loader.cjs");

/// The parts of a resolved Next.js config the adapter cares about
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextConfig {
    #[serde(default = "default_config_file")]
    pub config_file_name: String,

    #[serde(default = "default_dist_dir")]
    pub dist_dir: String,

    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub images: Option<Value>,
}

fn default_config_file() -> String {
    DEFAULT_CONFIG_FILE.to_string()
}

fn default_dist_dir() -> String {
    DEFAULT_DIST_DIR.to_string()
}

impl Default for NextConfig {
    fn default() -> Self {
        Self {
            config_file_name: default_config_file(),
            dist_dir: default_dist_dir(),
            output: None,
            images: None,
        }
    }
}

impl NextConfig {
    pub fn is_standalone(&self) -> bool {
        self.output.as_deref() == Some("standalone")
    }

    /// Top-level view used to verify forced override keys
    pub fn as_value(&self) -> Value {
        serde_json::json!({
            "configFileName": self.config_file_name,
            "distDir": self.dist_dir,
            "output": self.output,
            "images": self.images,
        })
    }
}

/// Loads the resolved Next.js config of a project
pub trait ConfigLoader: Send + Sync {
    fn load(&self, project_dir: &Path) -> Result<NextConfig>;
}

/// Loads the config with `node`, using the `next` package installed in the project
pub struct NodeConfigLoader {
    runner: Arc<dyn CommandRunner>,
}

impl NodeConfigLoader {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl ConfigLoader for NodeConfigLoader {
    fn load(&self, project_dir: &Path) -> Result<NextConfig> {
        let invocation = Invocation::new("node", project_dir)
            .args(["-e", LOADER_SCRIPT])
            .arg(project_dir.to_string_lossy())
            .env("NEXT_TELEMETRY_DISABLED", "1");

        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| AdapterError::ConfigLoad {
                path: project_dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        let config: NextConfig = output.json().map_err(|e| AdapterError::ConfigLoad {
            path: project_dir.to_path_buf(),
            reason: format!("{:#}", e),
        })?;

        debug!(
            config_file = %config.config_file_name,
            dist_dir = %config.dist_dir,
            output = ?config.output,
            "Loaded Next.js config"
        );
        Ok(config)
    }
}
