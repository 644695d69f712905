//! Next.js config override
//!
//! The user's config file is moved aside to `next.config.original.<ext>` and
//! replaced by a generated module that imports it and applies a
//! [`ConfigOverride`]. The override itself is a JSON object model; the wrapper
//! only interprets it, so the same override always produces the same config.

use super::config::{ConfigLoader, NextConfig};
use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First line of every generated wrapper
pub const GENERATED_MARKER: &str = "// @generated by apphosting-adapter";

const OVERRIDE_BODY: &str = include_str!("../../../assets/next_config_override.js");

/// A nested key set only when the user left all `unless_set` keys alone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultedKey {
    pub path: Vec<String>,
    pub value: Value,
    pub unless_set: Vec<Vec<String>>,
}

/// Settings merged over the user's config
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigOverride {
    /// Top-level keys replaced unconditionally
    pub forced: Map<String, Value>,
    pub defaults: Vec<DefaultedKey>,
}

fn key_path(path: &[&str]) -> Vec<String> {
    path.iter().map(|k| k.to_string()).collect()
}

impl ConfigOverride {
    /// Standalone server output, and unoptimized images unless the user
    /// configured image handling
    pub fn hosting() -> Self {
        let mut forced = Map::new();
        forced.insert("output".to_string(), json!("standalone"));

        Self {
            forced,
            defaults: vec![DefaultedKey {
                path: key_path(&["images", "unoptimized"]),
                value: json!(true),
                unless_set: vec![
                    key_path(&["images", "unoptimized"]),
                    key_path(&["images", "loader"]),
                ],
            }],
        }
    }

    /// Forced keys whose loaded value differs, as `key: expected, got`
    pub fn violations(&self, loaded: &Value) -> Vec<String> {
        self.forced
            .iter()
            .filter_map(|(key, expected)| {
                let actual = loaded.get(key).unwrap_or(&Value::Null);
                (actual != expected).then(|| format!("{}: expected {}, got {}", key, expected, actual))
            })
            .collect()
    }
}

/// How the generated wrapper imports the original config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    CommonJs,
    EsModule,
}

impl ModuleFormat {
    /// `.mjs`/`.ts` are always ESM; `.js` follows the package's `"type"`
    pub fn detect(fs: &dyn FileSystem, root: &Path, config_file_name: &str) -> Self {
        match Path::new(config_file_name)
            .extension()
            .and_then(|e| e.to_str())
        {
            Some("mjs") | Some("mts") | Some("ts") => ModuleFormat::EsModule,
            Some("cjs") | Some("cts") => ModuleFormat::CommonJs,
            _ if package_is_esm(fs, root) => ModuleFormat::EsModule,
            _ => ModuleFormat::CommonJs,
        }
    }
}

fn package_is_esm(fs: &dyn FileSystem, root: &Path) -> bool {
    fs.read_to_string(&root.join("package.json"))
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .and_then(|pkg| pkg.get("type").and_then(Value::as_str).map(|t| t == "module"))
        .unwrap_or(false)
}

/// `next.config.mjs` -> `next.config.original.mjs`
pub fn original_config_file_name(config_file_name: &str) -> String {
    match config_file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}.original.{}", stem, ext),
        None => format!("{}.original", config_file_name),
    }
}

fn import_specifier(original_file_name: &str) -> String {
    // TypeScript configs cannot import a `.ts` specifier
    match original_file_name.strip_suffix(".ts") {
        Some(stem) => format!("./{}", stem),
        None => format!("./{}", original_file_name),
    }
}

/// Source of the module that replaces the user's config
pub fn render_wrapper(
    format: ModuleFormat,
    original_file_name: &str,
    config_override: &ConfigOverride,
) -> Result<String> {
    let override_json =
        serde_json::to_string_pretty(config_override).map_err(|e| AdapterError::Serialization {
            what: "config override".to_string(),
            reason: e.to_string(),
        })?;
    let specifier = import_specifier(original_file_name);

    let (import, export) = match format {
        ModuleFormat::EsModule => (
            format!("import originalConfig from {:?};", specifier),
            "export default config;",
        ),
        ModuleFormat::CommonJs => (
            format!("const originalConfig = require({:?});", specifier),
            "module.exports = config;",
        ),
    };

    Ok(format!(
        "{marker}. The original config is in ./{original}\n{import}\n\nconst fahOverride = {json};\n\n{body}\n{export}\n",
        marker = GENERATED_MARKER,
        original = original_file_name,
        import = import,
        json = override_json,
        body = OVERRIDE_BODY.trim_end(),
        export = export,
    ))
}

/// Where the override put things
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideOutcome {
    pub config_path: PathBuf,
    pub original_path: PathBuf,
    /// False when the original had already been moved aside by an earlier run
    pub moved_original: bool,
}

pub fn is_generated_wrapper(content: &str) -> bool {
    content.starts_with(GENERATED_MARKER)
}

/// Moves the user's config aside and writes the wrapper in its place
///
/// Re-running regenerates the wrapper but never wraps a wrapper: a config that
/// already carries [`GENERATED_MARKER`] keeps its preserved original.
///
/// # Errors
///
/// `InvalidConfigOverride` naming the original when the config is a wrapper
/// whose original is gone.
pub fn override_next_config(
    fs: &dyn FileSystem,
    root: &Path,
    config_file_name: &str,
    config_override: &ConfigOverride,
) -> Result<OverrideOutcome> {
    let config_path = root.join(config_file_name);
    let original_file_name = original_config_file_name(config_file_name);
    let original_path = root.join(&original_file_name);

    let current = fs
        .read_to_string(&config_path)
        .map_err(|e| AdapterError::from_fs(&config_path, e))?;

    let moved_original = if is_generated_wrapper(&current) {
        if !fs.is_file(&original_path) {
            return Err(AdapterError::InvalidConfigOverride {
                path: original_path,
                reason: format!(
                    "{} is a generated wrapper but the original config is missing",
                    config_file_name
                ),
            });
        }
        debug!(path = %original_path.display(), "Config already overridden, regenerating wrapper");
        false
    } else {
        fs.rename(&config_path, &original_path)
            .map_err(|e| AdapterError::from_fs(&config_path, e))?;
        true
    };

    let format = ModuleFormat::detect(fs, root, config_file_name);
    let wrapper = render_wrapper(format, &original_file_name, config_override)?;
    fs.write(&config_path, &wrapper)
        .map_err(|e| AdapterError::from_fs(&config_path, e))?;

    info!(
        config = %config_path.display(),
        original = %original_path.display(),
        ?format,
        "Overrode Next.js config"
    );
    Ok(OverrideOutcome {
        config_path,
        original_path,
        moved_original,
    })
}

/// Reloads the overridden config through Next's loader
///
/// # Errors
///
/// `InvalidConfigOverride` naming the config file when either file is
/// missing, the loader rejects the result, or a forced key did not stick.
pub fn validate_next_config_override(
    fs: &dyn FileSystem,
    loader: &dyn ConfigLoader,
    root: &Path,
    project_dir: &Path,
    config_file_name: &str,
    config_override: &ConfigOverride,
) -> Result<NextConfig> {
    let config_path = root.join(config_file_name);
    let original_path = root.join(original_config_file_name(config_file_name));

    for path in [&original_path, &config_path] {
        if !fs.is_file(path) {
            return Err(AdapterError::InvalidConfigOverride {
                path: path.clone(),
                reason: "file is missing after override".to_string(),
            });
        }
    }

    let loaded = loader
        .load(project_dir)
        .map_err(|e| AdapterError::InvalidConfigOverride {
            path: config_path.clone(),
            reason: e.to_string(),
        })?;

    let violations = config_override.violations(&loaded.as_value());
    if !violations.is_empty() {
        return Err(AdapterError::InvalidConfigOverride {
            path: config_path,
            reason: violations.join("; "),
        });
    }

    debug!(config = %config_path.display(), "Config override validated");
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::sync::Mutex;

    struct FixedLoader(Mutex<Option<Result<NextConfig>>>);

    impl FixedLoader {
        fn ok(config: NextConfig) -> Self {
            Self(Mutex::new(Some(Ok(config))))
        }

        fn err(reason: &str) -> Self {
            Self(Mutex::new(Some(Err(AdapterError::ConfigLoad {
                path: PathBuf::from("/app"),
                reason: reason.to_string(),
            }))))
        }
    }

    impl ConfigLoader for FixedLoader {
        fn load(&self, _project_dir: &Path) -> Result<NextConfig> {
            self.0.lock().unwrap().take().expect("loaded once")
        }
    }

    fn standalone_config() -> NextConfig {
        NextConfig {
            output: Some("standalone".to_string()),
            ..NextConfig::default()
        }
    }

    #[test]
    fn test_original_file_names() {
        assert_eq!(original_config_file_name("next.config.js"), "next.config.original.js");
        assert_eq!(original_config_file_name("next.config.mjs"), "next.config.original.mjs");
        assert_eq!(original_config_file_name("next.config.ts"), "next.config.original.ts");
    }

    #[test]
    fn test_module_format_detection() {
        let fs = MockFileSystem::new();
        let root = Path::new("/app");
        assert_eq!(ModuleFormat::detect(&fs, root, "next.config.js"), ModuleFormat::CommonJs);
        assert_eq!(ModuleFormat::detect(&fs, root, "next.config.mjs"), ModuleFormat::EsModule);
        assert_eq!(ModuleFormat::detect(&fs, root, "next.config.ts"), ModuleFormat::EsModule);

        fs.add_file("/app/package.json", r#"{"name": "web", "type": "module"}"#);
        assert_eq!(ModuleFormat::detect(&fs, root, "next.config.js"), ModuleFormat::EsModule);
    }

    #[test]
    fn test_render_esm_wrapper() {
        let wrapper =
            render_wrapper(ModuleFormat::EsModule, "next.config.original.mjs", &ConfigOverride::hosting())
                .unwrap();

        assert!(is_generated_wrapper(&wrapper));
        assert!(wrapper.contains(r#"import originalConfig from "./next.config.original.mjs";"#));
        assert!(wrapper.contains(r#""output": "standalone""#));
        assert!(wrapper.contains("unlessSet"));
        assert!(wrapper.trim_end().ends_with("export default config;"));
    }

    #[test]
    fn test_render_cjs_and_ts_wrappers() {
        let cjs =
            render_wrapper(ModuleFormat::CommonJs, "next.config.original.js", &ConfigOverride::hosting())
                .unwrap();
        assert!(cjs.contains(r#"const originalConfig = require("./next.config.original.js");"#));
        assert!(cjs.contains("module.exports = config;"));

        let ts =
            render_wrapper(ModuleFormat::EsModule, "next.config.original.ts", &ConfigOverride::hosting())
                .unwrap();
        assert!(ts.contains(r#"from "./next.config.original";"#));
    }

    #[test]
    fn test_override_moves_original_aside() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/next.config.js", "module.exports = { reactStrictMode: true };");

        let outcome =
            override_next_config(&fs, Path::new("/app"), "next.config.js", &ConfigOverride::hosting())
                .unwrap();

        assert!(outcome.moved_original);
        assert_eq!(
            fs.read_to_string(Path::new("/app/next.config.original.js")).unwrap(),
            "module.exports = { reactStrictMode: true };"
        );
        let wrapper = fs.read_to_string(Path::new("/app/next.config.js")).unwrap();
        assert!(is_generated_wrapper(&wrapper));
    }

    #[test]
    fn test_override_is_idempotent() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/next.config.mjs", "export default {};");
        let root = Path::new("/app");

        override_next_config(&fs, root, "next.config.mjs", &ConfigOverride::hosting()).unwrap();
        let first = fs.read_to_string(Path::new("/app/next.config.mjs")).unwrap();

        let second_run =
            override_next_config(&fs, root, "next.config.mjs", &ConfigOverride::hosting()).unwrap();
        assert!(!second_run.moved_original);
        assert_eq!(fs.read_to_string(Path::new("/app/next.config.mjs")).unwrap(), first);
        assert_eq!(
            fs.read_to_string(Path::new("/app/next.config.original.mjs")).unwrap(),
            "export default {};"
        );
    }

    #[test]
    fn test_wrapper_without_original_is_rejected() {
        let fs = MockFileSystem::new();
        let wrapper =
            render_wrapper(ModuleFormat::CommonJs, "next.config.original.js", &ConfigOverride::hosting())
                .unwrap();
        fs.add_file("/app/next.config.js", &wrapper);

        match override_next_config(&fs, Path::new("/app"), "next.config.js", &ConfigOverride::hosting()) {
            Err(AdapterError::InvalidConfigOverride { path, reason }) => {
                assert_eq!(path, PathBuf::from("/app/next.config.original.js"));
                assert!(reason.contains("original config is missing"));
            }
            other => panic!("Expected InvalidConfigOverride, got {:?}", other),
        }
        assert_eq!(fs.read_to_string(Path::new("/app/next.config.js")).unwrap(), wrapper);
        assert!(!fs.exists(Path::new("/app/next.config.original.js")));
    }

    #[test]
    fn test_violations() {
        let hosting = ConfigOverride::hosting();
        assert!(hosting.violations(&standalone_config().as_value()).is_empty());

        let violations = hosting.violations(&NextConfig::default().as_value());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("output"));
    }

    #[test]
    fn test_validate_accepts_standalone_config() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/next.config.js", "module.exports = {};");
        let root = Path::new("/app");
        override_next_config(&fs, root, "next.config.js", &ConfigOverride::hosting()).unwrap();

        let loaded = validate_next_config_override(
            &fs,
            &FixedLoader::ok(standalone_config()),
            root,
            root,
            "next.config.js",
            &ConfigOverride::hosting(),
        )
        .unwrap();
        assert!(loaded.is_standalone());
    }

    #[test]
    fn test_validate_reports_loader_failure_with_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/next.config.js", "module.exports = {");
        let root = Path::new("/app");
        override_next_config(&fs, root, "next.config.js", &ConfigOverride::hosting()).unwrap();

        match validate_next_config_override(
            &fs,
            &FixedLoader::err("SyntaxError: Unexpected end of input"),
            root,
            root,
            "next.config.js",
            &ConfigOverride::hosting(),
        ) {
            Err(AdapterError::InvalidConfigOverride { path, reason }) => {
                assert_eq!(path, PathBuf::from("/app/next.config.js"));
                assert!(reason.contains("SyntaxError"));
            }
            other => panic!("Expected InvalidConfigOverride, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_standalone_output() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/next.config.js", "module.exports = {};");
        let root = Path::new("/app");
        override_next_config(&fs, root, "next.config.js", &ConfigOverride::hosting()).unwrap();

        assert!(matches!(
            validate_next_config_override(
                &fs,
                &FixedLoader::ok(NextConfig::default()),
                root,
                root,
                "next.config.js",
                &ConfigOverride::hosting(),
            ),
            Err(AdapterError::InvalidConfigOverride { .. })
        ));
    }

    #[test]
    fn test_validate_requires_preserved_original() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/next.config.js", "module.exports = {};");

        match validate_next_config_override(
            &fs,
            &FixedLoader::ok(standalone_config()),
            Path::new("/app"),
            Path::new("/app"),
            "next.config.js",
            &ConfigOverride::hosting(),
        ) {
            Err(AdapterError::InvalidConfigOverride { path, .. }) => {
                assert_eq!(path, PathBuf::from("/app/next.config.original.js"));
            }
            other => panic!("Expected InvalidConfigOverride, got {:?}", other),
        }
    }
}
