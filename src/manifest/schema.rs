//! BuildManifest schema
//!
//! Output paths are file URLs (`file:///app/dist/browser/`), as emitted by the
//! Angular application builder.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where the build tool placed its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub root: String,
    pub browser: String,
    /// Absent for client-side rendered builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// A build diagnostic; the builder emits plain strings or `{ "text": ... }` objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Diagnostic {
    Text(String),
    Message { text: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Text(text) | Diagnostic::Message { text } => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildManifest {
    pub output_paths: OutputPaths,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl BuildManifest {
    pub fn is_client_only(&self) -> bool {
        self.output_paths.server.is_none()
    }
}

/// Parses and validates an extracted manifest string
///
/// # Errors
///
/// - `MissingBrowserPath` when `outputPaths.browser` is absent
/// - `InvalidManifest` for malformed JSON or any other schema violation
pub fn parse_build_manifest(raw: &str) -> Result<BuildManifest> {
    let value: Value = serde_json::from_str(raw).map_err(|e| AdapterError::InvalidManifest {
        reason: e.to_string(),
        manifest: raw.to_string(),
    })?;

    let has_browser = value
        .get("outputPaths")
        .and_then(|paths| paths.get("browser"))
        .map(|browser| !browser.is_null())
        .unwrap_or(false);
    if value.get("outputPaths").is_some() && !has_browser {
        return Err(AdapterError::MissingBrowserPath);
    }

    serde_json::from_value(value).map_err(|e| AdapterError::InvalidManifest {
        reason: e.to_string(),
        manifest: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_only_manifest() {
        let manifest = parse_build_manifest(
            r#"{"outputPaths":{"root":"file:///app/","browser":"file:///app/dist/browser/"},"errors":[],"warnings":[]}"#,
        )
        .unwrap();

        assert!(manifest.is_client_only());
        assert_eq!(manifest.output_paths.root, "file:///app/");
        assert!(manifest.errors.is_empty());
    }

    #[test]
    fn test_parse_ssr_manifest_with_diagnostics() {
        let manifest = parse_build_manifest(
            r#"{"errors":["bad import"],"warnings":[{"text":"budget exceeded"}],"outputPaths":{"root":"file:///app/dist/","browser":"file:///app/dist/browser/","server":"file:///app/dist/server/"}}"#,
        )
        .unwrap();

        assert!(!manifest.is_client_only());
        assert_eq!(manifest.errors[0].to_string(), "bad import");
        assert_eq!(manifest.warnings[0].to_string(), "budget exceeded");
    }

    #[test]
    fn test_missing_browser_is_structural() {
        let err = parse_build_manifest(
            r#"{"outputPaths":{"root":"file:///app/"},"errors":[],"warnings":[]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::MissingBrowserPath));
    }

    #[test]
    fn test_missing_output_paths_is_invalid() {
        let err = parse_build_manifest(r#"{"errors":[],"warnings":[]}"#).unwrap_err();
        match err {
            AdapterError::InvalidManifest { reason, manifest } => {
                assert!(reason.contains("outputPaths"));
                assert!(manifest.contains("errors"));
            }
            other => panic!("Expected InvalidManifest, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_invalid() {
        assert!(matches!(
            parse_build_manifest("{not json}"),
            Err(AdapterError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn test_wrong_types_are_invalid() {
        assert!(matches!(
            parse_build_manifest(
                r#"{"outputPaths":{"root":"file:///app/","browser":"file:///app/b/"},"errors":"none","warnings":[]}"#
            ),
            Err(AdapterError::InvalidManifest { .. })
        ));
    }
}
