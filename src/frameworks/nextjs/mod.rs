//! Next.js support
//!
//! Next builds its own server in standalone mode, so nothing is synthesized.
//! Instead the user's config is overridden to force standalone output before
//! the build, and the standalone tree is completed afterwards.

pub mod config;
pub mod output;
pub mod overrides;
pub mod routes;

pub use config::{ConfigLoader, NextConfig, NodeConfigLoader};
pub use output::{copy_resources, populate_next_output_bundle_options, NextOutputBundleOptions};
pub use overrides::{
    override_next_config, validate_next_config_override, ConfigOverride, OverrideOutcome,
};
pub use routes::add_route_overrides;

/// Config file name Next reports when the project has none
pub const DEFAULT_CONFIG_FILE: &str = "next.config.js";

pub const DEFAULT_DIST_DIR: &str = ".next";

/// Environment for the wrapped `next build`
pub const BUILD_ENV: &[(&str, &str)] = &[
    ("NEXT_PRIVATE_STANDALONE", "true"),
    ("NEXT_TELEMETRY_DISABLED", "1"),
];
