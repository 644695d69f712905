//! Configuration management
//!
//! Settings are loaded from environment variables with sensible defaults, the
//! same variables the hosting platform's build environment sets. CLI flags may
//! override individual fields afterwards.
//!
//! # Environment Variables
//!
//! - `FRAMEWORK_VERSION`: framework release driving env-var shims and metadata - default: "unspecified"
//! - `MONOREPO_COMMAND`: monorepo task runner (e.g. `nx`); presence selects the monorepo layout
//! - `MONOREPO_PROJECT`: project to build inside the monorepo
//! - `MONOREPO_BUILD_ARGS`: comma-separated extra arguments for the build command
//! - `GOOGLE_BUILDABLE`: project directory inside a monorepo - default: current directory
//! - `APPHOSTING_ADAPTER_PACKAGE`: path to the adapter's `package.json` - default: `<exe dir>/../package.json`
//! - `APPHOSTING_LOG_LEVEL` / `APPHOSTING_LOG_JSON`: logging, see [`crate::util::logging`]

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_FRAMEWORK_VERSION: &str = "unspecified";
const DEFAULT_BUILD_COMMAND: &str = "npm";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MONOREPO_COMMAND is set to '{0}' but MONOREPO_PROJECT is missing")]
    MissingProject(String),

    #[error("Project directory does not exist: {0}")]
    ProjectDirectoryNotFound(PathBuf),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Framework release string, e.g. "17.3.2"
    pub framework_version: String,

    /// Monorepo task runner, `None` for standalone projects
    pub monorepo_command: Option<String>,

    pub monorepo_project: Option<String>,

    pub monorepo_build_args: Vec<String>,

    /// Directory the build runs in
    pub project_directory: PathBuf,

    /// Location of the adapter's own package identity file
    pub adapter_package_json: PathBuf,

    pub log_level: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_env_in(&cwd)
    }
}

impl AdapterConfig {
    /// Reads the environment, resolving relative paths against `root`
    pub fn from_env_in(root: &Path) -> Self {
        let framework_version = env::var("FRAMEWORK_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FRAMEWORK_VERSION.to_string());

        let monorepo_command = env::var("MONOREPO_COMMAND")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let monorepo_project = env::var("MONOREPO_PROJECT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let monorepo_build_args = env::var("MONOREPO_BUILD_ARGS")
            .map(|v| split_build_args(&v))
            .unwrap_or_default();

        let project_directory = env::var("GOOGLE_BUILDABLE")
            .ok()
            .filter(|v| !v.trim().is_empty() && monorepo_command.is_some())
            .map(|v| root.join(v))
            .unwrap_or_else(|| root.to_path_buf());

        let adapter_package_json = env::var("APPHOSTING_ADAPTER_PACKAGE")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_adapter_package_json);

        let log_level = env::var("APPHOSTING_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            framework_version,
            monorepo_command,
            monorepo_project,
            monorepo_build_args,
            project_directory,
            adapter_package_json,
            log_level,
        }
    }
}

fn split_build_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `<dir of executable>/../package.json`, the layout of an npm-installed binary
fn default_adapter_package_json() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join("..").join("package.json"))
        .unwrap_or_else(|| PathBuf::from("package.json"))
}

impl AdapterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the monorepo settings are inconsistent, the
    /// project directory is missing or the log level is unknown
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(command) = &self.monorepo_command {
            if self.monorepo_project.is_none() {
                return Err(ConfigError::MissingProject(command.clone()));
            }
        }

        if !self.project_directory.is_dir() {
            return Err(ConfigError::ProjectDirectoryNotFound(
                self.project_directory.clone(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn is_monorepo(&self) -> bool {
        self.monorepo_command.is_some()
    }

    /// Derives the build invocation for this project layout
    pub fn build_options(&self) -> BuildOptions {
        match (&self.monorepo_command, &self.monorepo_project) {
            (Some(command), Some(project)) => {
                let mut build_args = vec!["run".to_string(), format!("{}:build", project)];
                build_args.extend(self.monorepo_build_args.iter().cloned());
                BuildOptions {
                    build_command: command.clone(),
                    build_args,
                    project_directory: self.project_directory.clone(),
                    project_name: Some(project.clone()),
                }
            }
            _ => BuildOptions {
                build_command: DEFAULT_BUILD_COMMAND.to_string(),
                build_args: vec!["run".to_string(), "build".to_string()],
                project_directory: self.project_directory.clone(),
                project_name: None,
            },
        }
    }
}

/// How the wrapped framework build is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub build_command: String,
    pub build_args: Vec<String>,
    pub project_directory: PathBuf,
    pub project_name: Option<String>,
}

impl BuildOptions {
    /// True when the build goes through Nx, whose project config replaces angular.json
    pub fn is_nx(&self) -> bool {
        self.build_command == "nx"
    }

    pub fn display_command(&self) -> String {
        std::iter::once(self.build_command.as_str())
            .chain(self.build_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for key in [
            "FRAMEWORK_VERSION",
            "MONOREPO_COMMAND",
            "MONOREPO_PROJECT",
            "MONOREPO_BUILD_ARGS",
            "GOOGLE_BUILDABLE",
            "APPHOSTING_ADAPTER_PACKAGE",
            "APPHOSTING_LOG_LEVEL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AdapterConfig::default();

        assert_eq!(config.framework_version, "unspecified");
        assert!(config.monorepo_command.is_none());
        assert_eq!(config.log_level, "info");
        assert!(!config.is_monorepo());
    }

    #[test]
    #[serial]
    fn test_blank_framework_version_falls_back() {
        clear_env();
        env::set_var("FRAMEWORK_VERSION", "  ");
        let config = AdapterConfig::default();
        clear_env();

        assert_eq!(config.framework_version, DEFAULT_FRAMEWORK_VERSION);
    }

    #[test]
    #[serial]
    fn test_monorepo_from_env() {
        clear_env();
        env::set_var("MONOREPO_COMMAND", "nx");
        env::set_var("MONOREPO_PROJECT", "web");
        env::set_var("MONOREPO_BUILD_ARGS", "--configuration=production, --verbose");
        let config = AdapterConfig::default();
        clear_env();

        let opts = config.build_options();
        assert!(opts.is_nx());
        assert_eq!(opts.project_name.as_deref(), Some("web"));
        assert_eq!(
            opts.build_args,
            vec!["run", "web:build", "--configuration=production", "--verbose"]
        );
        assert_eq!(
            opts.display_command(),
            "nx run web:build --configuration=production --verbose"
        );
    }

    #[test]
    #[serial]
    fn test_buildable_resolves_against_root() {
        clear_env();
        env::set_var("MONOREPO_COMMAND", "nx");
        env::set_var("MONOREPO_PROJECT", "web");
        env::set_var("GOOGLE_BUILDABLE", "apps/web");
        let config = AdapterConfig::from_env_in(Path::new("/repo"));
        clear_env();

        assert_eq!(config.project_directory, PathBuf::from("/repo/apps/web"));
        assert_eq!(config.build_options().project_directory, PathBuf::from("/repo/apps/web"));
    }

    #[test]
    #[serial]
    fn test_buildable_ignored_without_monorepo() {
        clear_env();
        env::set_var("GOOGLE_BUILDABLE", "apps/web");
        let config = AdapterConfig::from_env_in(Path::new("/repo"));
        clear_env();

        assert_eq!(config.project_directory, PathBuf::from("/repo"));
    }

    #[test]
    fn test_standalone_build_options() {
        let temp = TempDir::new().unwrap();
        let config = AdapterConfig {
            framework_version: "18.0.0".to_string(),
            monorepo_command: None,
            monorepo_project: None,
            monorepo_build_args: vec![],
            project_directory: temp.path().to_path_buf(),
            adapter_package_json: temp.path().join("package.json"),
            log_level: "info".to_string(),
        };

        let opts = config.build_options();
        assert_eq!(opts.display_command(), "npm run build");
        assert!(!opts.is_nx());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_project() {
        let temp = TempDir::new().unwrap();
        let config = AdapterConfig {
            framework_version: "18.0.0".to_string(),
            monorepo_command: Some("nx".to_string()),
            monorepo_project: None,
            monorepo_build_args: vec![],
            project_directory: temp.path().to_path_buf(),
            adapter_package_json: temp.path().join("package.json"),
            log_level: "info".to_string(),
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingProject(cmd)) if cmd == "nx"
        ));
    }

    #[test]
    fn test_validate_bad_log_level() {
        let temp = TempDir::new().unwrap();
        let config = AdapterConfig {
            framework_version: "18.0.0".to_string(),
            monorepo_command: None,
            monorepo_project: None,
            monorepo_build_args: vec![],
            project_directory: temp.path().to_path_buf(),
            adapter_package_json: temp.path().join("package.json"),
            log_level: "loud".to_string(),
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }
}
