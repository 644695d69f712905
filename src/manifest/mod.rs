//! Build manifest handling
//!
//! The Angular application builder prints a JSON manifest describing where it
//! placed its output. Under monorepo task runners the manifest arrives wrapped
//! in banner text, colors and hard line wraps, so it is first cut out of the
//! console text and then validated against [`BuildManifest`].

pub mod extractor;
pub mod schema;

pub use extractor::{extract_manifest_output, strip_ansi};
pub use schema::{parse_build_manifest, BuildManifest, Diagnostic, OutputPaths};
