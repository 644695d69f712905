//! Route-override injection into the standalone routes manifest
//!
//! Every response gets an `x-fah-adapter` header identifying the adapter, and
//! routes covered by middleware get `x-fah-middleware: true`. Both are header
//! rules appended to `routes-manifest.json` after the build.

use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub const ADAPTER_HEADER: &str = "x-fah-adapter";
pub const MIDDLEWARE_HEADER: &str = "x-fah-middleware";

const ALL_ROUTES_SOURCE: &str = "/:path*";
const ALL_ROUTES_REGEX: &str = "^(?:/((?:[^/]+?)(?:/(?:[^/]+?))*))?(?:/)?$";

/// A `headers` entry of the routes manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    pub source: String,
    pub regex: String,
    pub key: String,
    pub value: String,
}

impl HeaderRule {
    fn to_value(&self) -> Value {
        json!({
            "source": self.source,
            "headers": [{ "key": self.key, "value": self.value }],
            "regex": self.regex,
        })
    }

    /// True when `entry` sets this header for the same source, whatever its value
    fn matches(&self, entry: &Value) -> bool {
        entry.get("source").and_then(Value::as_str) == Some(self.source.as_str())
            && entry
                .get("headers")
                .and_then(Value::as_array)
                .map(|headers| {
                    headers
                        .iter()
                        .any(|h| h.get("key").and_then(Value::as_str) == Some(self.key.as_str()))
                })
                .unwrap_or(false)
    }

    /// True when `entry` is exactly this rule
    fn is_current(&self, entry: &Value) -> bool {
        *entry == self.to_value()
    }
}

#[derive(Debug, Default, Deserialize)]
struct MiddlewareManifest {
    #[serde(default)]
    middleware: BTreeMap<String, MiddlewareEntry>,
}

#[derive(Debug, Deserialize)]
struct MiddlewareEntry {
    #[serde(default)]
    matchers: Vec<MiddlewareMatcher>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MiddlewareMatcher {
    regexp: String,
    #[serde(default)]
    original_source: Option<String>,
}

/// Header rules for an adapter version and an optional middleware manifest
pub fn route_overrides(adapter_version: &str, middleware_manifest: Option<&str>) -> Result<Vec<HeaderRule>> {
    let mut rules = vec![HeaderRule {
        source: ALL_ROUTES_SOURCE.to_string(),
        regex: ALL_ROUTES_REGEX.to_string(),
        key: ADAPTER_HEADER.to_string(),
        value: format!("nextjs-{}", adapter_version),
    }];

    if let Some(content) = middleware_manifest {
        let manifest: MiddlewareManifest =
            serde_json::from_str(content).map_err(|e| AdapterError::Serialization {
                what: "middleware manifest".to_string(),
                reason: e.to_string(),
            })?;
        for matcher in manifest.middleware.into_values().flat_map(|m| m.matchers) {
            rules.push(HeaderRule {
                source: matcher.original_source.unwrap_or_else(|| matcher.regexp.clone()),
                regex: matcher.regexp,
                key: MIDDLEWARE_HEADER.to_string(),
                value: "true".to_string(),
            });
        }
    }
    Ok(rules)
}

/// Appends the adapter's header rules to `<app>/<distDir>/routes-manifest.json`
///
/// Rules already present are not added again; an entry for the same source
/// and header with a stale value is replaced.
pub fn add_route_overrides(
    fs: &dyn FileSystem,
    app_path: &Path,
    dist_dir: &str,
    adapter_version: &str,
) -> Result<usize> {
    let dist = app_path.join(dist_dir);
    let routes_path = dist.join("routes-manifest.json");
    let middleware_path = dist.join("server").join("middleware-manifest.json");

    let middleware = if fs.is_file(&middleware_path) {
        Some(
            fs.read_to_string(&middleware_path)
                .map_err(|e| AdapterError::from_fs(&middleware_path, e))?,
        )
    } else {
        debug!(path = %middleware_path.display(), "No middleware manifest");
        None
    };
    let rules = route_overrides(adapter_version, middleware.as_deref())?;

    let content = fs
        .read_to_string(&routes_path)
        .map_err(|e| AdapterError::from_fs(&routes_path, e))?;
    let mut manifest: Value =
        serde_json::from_str(&content).map_err(|e| AdapterError::Serialization {
            what: format!("routes manifest {}", routes_path.display()),
            reason: e.to_string(),
        })?;

    let Some(object) = manifest.as_object_mut() else {
        return Err(AdapterError::Serialization {
            what: format!("routes manifest {}", routes_path.display()),
            reason: "expected a JSON object".to_string(),
        });
    };
    let headers = object
        .entry("headers")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(headers) = headers.as_array_mut() else {
        return Err(AdapterError::Serialization {
            what: format!("routes manifest {}", routes_path.display()),
            reason: "`headers` is not an array".to_string(),
        });
    };

    let mut added = 0;
    for rule in &rules {
        if headers.iter().any(|entry| rule.is_current(entry)) {
            continue;
        }
        let before = headers.len();
        headers.retain(|entry| !rule.matches(entry));
        if headers.len() < before {
            debug!(source = %rule.source, key = %rule.key, "Replacing stale header rule");
        }
        headers.push(rule.to_value());
        added += 1;
    }

    let serialized =
        serde_json::to_string_pretty(&manifest).map_err(|e| AdapterError::Serialization {
            what: "routes manifest".to_string(),
            reason: e.to_string(),
        })?;
    fs.write(&routes_path, &serialized)
        .map_err(|e| AdapterError::from_fs(&routes_path, e))?;

    info!(path = %routes_path.display(), added, "Injected route overrides");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    const ROUTES: &str = r#"{"version":3,"pages404":true,"basePath":"","redirects":[],"headers":[],"dynamicRoutes":[]}"#;
    const MIDDLEWARE: &str = r#"{
        "version": 3,
        "middleware": {
            "/": {
                "files": ["server/edge-runtime-webpack.js", "server/middleware.js"],
                "name": "middleware",
                "page": "/",
                "matchers": [
                    {"regexp": "^(?:\\/(_next\\/data\\/[^/]{1,}))?\\/about(?:\\/((?:[^\\/#\\?]+?)(?:\\/(?:[^\\/#\\?]+?))*))?(.json)?[\\/#\\?]?$", "originalSource": "/about/:path*"}
                ]
            }
        },
        "functions": {},
        "sortedMiddleware": ["/"]
    }"#;

    fn headers(fs: &MockFileSystem) -> Vec<Value> {
        let content = fs
            .read_to_string(Path::new("/app/.next/standalone/.next/routes-manifest.json"))
            .unwrap();
        let manifest: Value = serde_json::from_str(&content).unwrap();
        manifest["headers"].as_array().unwrap().clone()
    }

    #[test]
    fn test_adapter_header_added() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/.next/standalone/.next/routes-manifest.json", ROUTES);

        let added =
            add_route_overrides(&fs, Path::new("/app/.next/standalone"), ".next", "14.0.1").unwrap();

        assert_eq!(added, 1);
        let headers = headers(&fs);
        assert_eq!(headers[0]["source"], "/:path*");
        assert_eq!(headers[0]["headers"][0]["key"], "x-fah-adapter");
        assert_eq!(headers[0]["headers"][0]["value"], "nextjs-14.0.1");
    }

    #[test]
    fn test_middleware_header_per_matcher() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/.next/standalone/.next/routes-manifest.json", ROUTES);
        fs.add_file(
            "/app/.next/standalone/.next/server/middleware-manifest.json",
            MIDDLEWARE,
        );

        add_route_overrides(&fs, Path::new("/app/.next/standalone"), ".next", "14.0.1").unwrap();

        let headers = headers(&fs);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[1]["source"], "/about/:path*");
        assert_eq!(headers[1]["headers"][0]["key"], "x-fah-middleware");
        assert_eq!(headers[1]["headers"][0]["value"], "true");
        assert!(headers[1]["regex"].as_str().unwrap().contains("about"));
    }

    #[test]
    fn test_injection_is_idempotent() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/.next/standalone/.next/routes-manifest.json", ROUTES);
        fs.add_file(
            "/app/.next/standalone/.next/server/middleware-manifest.json",
            MIDDLEWARE,
        );
        let app = Path::new("/app/.next/standalone");

        assert_eq!(add_route_overrides(&fs, app, ".next", "14.0.1").unwrap(), 2);
        assert_eq!(add_route_overrides(&fs, app, ".next", "14.0.1").unwrap(), 0);
        assert_eq!(headers(&fs).len(), 2);
    }

    #[test]
    fn test_stale_adapter_header_replaced() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/.next/standalone/.next/routes-manifest.json", ROUTES);
        let app = Path::new("/app/.next/standalone");

        add_route_overrides(&fs, app, ".next", "14.0.1").unwrap();
        assert_eq!(add_route_overrides(&fs, app, ".next", "14.0.3").unwrap(), 1);

        let headers = headers(&fs);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0]["headers"][0]["value"], "nextjs-14.0.3");
    }

    #[test]
    fn test_user_headers_preserved() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/app/.next/standalone/.next/routes-manifest.json",
            r#"{"headers":[{"source":"/api/:path*","headers":[{"key":"x-api","value":"1"}],"regex":"^/api"}]}"#,
        );

        add_route_overrides(&fs, Path::new("/app/.next/standalone"), ".next", "14.0.1").unwrap();

        let headers = headers(&fs);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0]["headers"][0]["key"], "x-api");
    }

    #[test]
    fn test_missing_routes_manifest_is_io_error() {
        let fs = MockFileSystem::new();
        assert!(matches!(
            add_route_overrides(&fs, Path::new("/app/.next/standalone"), ".next", "14.0.1"),
            Err(AdapterError::Io { .. })
        ));
    }

    #[test]
    fn test_empty_middleware_manifest() {
        let rules =
            route_overrides("1.0.0", Some(r#"{"version":3,"middleware":{},"functions":{}}"#)).unwrap();
        assert_eq!(rules.len(), 1);
    }
}
