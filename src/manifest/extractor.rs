//! Manifest extraction from console output
//!
//! Monorepo task runners such as Nx cannot be fully silenced, so the build
//! tool's JSON manifest shows up between other console output. The extractor
//! takes everything from the first `{` to the last `}`. This is best-effort: it
//! assumes the manifest is the only brace-delimited structure framing the tail
//! of the output.

use crate::error::{AdapterError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Returns the embedded manifest with ANSI escapes and line breaks removed
///
/// # Errors
///
/// `ManifestNotFound` carrying the raw output when there is no `{`...`}` pair
/// or the last `}` comes before the first `{`.
pub fn extract_manifest_output(output: &str) -> Result<String> {
    let start = output.find('{');
    let end = output.rfind('}');

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) if start <= end => (start, end),
        _ => {
            return Err(AdapterError::ManifestNotFound {
                output: output.to_string(),
            })
        }
    };

    let stripped = strip_ansi(&output[start..=end]);
    Ok(collapse_line_breaks(&stripped))
}

/// Removes ANSI/VT100 escape sequences (colors, cursor movement, OSC links)
pub fn strip_ansi(text: &str) -> String {
    static ANSI_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = ANSI_REGEX.get_or_init(|| {
        Regex::new(
            r"[\x1B\x{9B}][\[\]()#;?]*(?:(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-nq-uy=><~]))",
        )
        .expect("valid ANSI regex")
    });
    re.replace_all(text, "").into_owned()
}

fn collapse_line_breaks(text: &str) -> String {
    text.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const MANIFEST: &str = r#"{"outputPaths":{"root":"file:///app/","browser":"file:///app/dist/browser/"},"errors":[],"warnings":[]}"#;

    fn parse(extracted: &str) -> Value {
        serde_json::from_str(extracted).unwrap()
    }

    #[test]
    fn test_plain_manifest() {
        let extracted = extract_manifest_output(MANIFEST).unwrap();
        assert_eq!(extracted, MANIFEST);
    }

    #[test]
    fn test_manifest_in_noise() {
        let output = format!(
            "> nx run web:build\n\nCompiling...\n{}\n\n NX   Successfully ran target build\n",
            MANIFEST
        );
        let extracted = extract_manifest_output(&output).unwrap();
        assert_eq!(parse(&extracted), parse(MANIFEST));
    }

    #[test]
    fn test_manifest_with_ansi_colors() {
        let output = format!(
            "\u{1b}[1m\u{1b}[32m>\u{1b}[39m\u{1b}[22m build\n{{\"outputPaths\":{{\"root\":\"file:///app/\",\u{1b}[2m\"browser\":\"file:///app/dist/browser/\"\u{1b}[22m}},\"errors\":[],\"warnings\":[]}}\u{1b}[0m\n"
        );
        let extracted = extract_manifest_output(&output).unwrap();
        assert!(!extracted.contains('\u{1b}'));
        assert_eq!(parse(&extracted), parse(MANIFEST));
    }

    #[test]
    fn test_manifest_with_hard_wraps() {
        let output = "noise\n{\"outputPaths\":{\"root\":\"file:///app/\",\r\n\"browser\":\"file:///app/dist/bro\nwser/\"},\n\"errors\":[],\"warnings\":[]}\n";
        let extracted = extract_manifest_output(output).unwrap();
        assert_eq!(parse(&extracted), parse(MANIFEST));
    }

    #[test]
    fn test_nested_objects_survive() {
        let value = json!({
            "outputPaths": {"root": "file:///w/", "browser": "file:///w/b/", "server": "file:///w/s/"},
            "errors": ["e1"],
            "warnings": [{"text": "w1"}]
        });
        let output = format!("\u{1b}[33mwarning\u{1b}[0m before\n{}\ntrailer", value);
        let extracted = extract_manifest_output(&output).unwrap();
        assert_eq!(parse(&extracted), value);
    }

    #[test]
    fn test_no_braces() {
        let err = extract_manifest_output("Build failed: no output").unwrap_err();
        match err {
            AdapterError::ManifestNotFound { output } => {
                assert_eq!(output, "Build failed: no output")
            }
            other => panic!("Expected ManifestNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_only_opening_brace() {
        assert!(matches!(
            extract_manifest_output("{ unterminated"),
            Err(AdapterError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_inverted_braces() {
        assert!(matches!(
            extract_manifest_output("} then {"),
            Err(AdapterError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_output() {
        assert!(matches!(
            extract_manifest_output(""),
            Err(AdapterError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_strip_ansi_osc_link() {
        let text = "\u{1b}]8;;https://angular.dev\u{7}docs\u{1b}]8;;\u{7}";
        assert_eq!(strip_ansi(text), "docs");
    }
}
