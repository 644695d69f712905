//! apphosting-adapter - build output normalization for hosted web frameworks
//!
//! Runs a framework's production build and turns whatever it produced into a
//! canonical bundle: a server entrypoint, the browser assets and a versioned
//! deployment descriptor at `.apphosting/bundle.yaml`.
//!
//! # Core Concepts
//!
//! - **Build manifest**: JSON the Angular application builder prints about its
//!   output locations, cut out of noisy console output
//! - **Bundle options**: absolute locations of every bundle artifact, derived
//!   from the manifest (Angular) or from directory conventions (Next.js)
//! - **Descriptor**: the `v1` document telling the platform how to run the app
//! - **Config override**: Next.js configs are wrapped to force standalone output
//!
//! # Example Usage
//!
//! ```no_run
//! use apphosting_adapter::config::AdapterConfig;
//! use apphosting_adapter::pipeline::{AngularPipeline, PipelineContext};
//! use std::path::PathBuf;
//!
//! let root = PathBuf::from("/workspace");
//! let ctx = PipelineContext::system(AdapterConfig::from_env_in(&root), root);
//! let opts = AngularPipeline::new(&ctx).run()?;
//! println!("Descriptor written to {}", opts.bundle_descriptor_path.display());
//! # Ok::<(), apphosting_adapter::AdapterError>(())
//! ```
//!
//! # Project Structure
//!
//! - [`manifest`]: manifest extraction and schema
//! - [`bundle`]: path resolution, server synthesis, descriptor, validation
//! - [`frameworks`]: Angular builder checks, Next.js overrides and layout
//! - [`pipeline`]: the sequential per-framework pipelines

// Public modules
pub mod build;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod frameworks;
pub mod fs;
pub mod manifest;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod util;

// Re-export key types for convenient access
pub use bundle::{OutputBundleConfig, OutputBundleOptions};
pub use config::{AdapterConfig, BuildOptions, ConfigError};
pub use error::{AdapterError, Result};
pub use manifest::{extract_manifest_output, parse_build_manifest, BuildManifest};
pub use pipeline::{AngularPipeline, NextJsPipeline, PipelineContext};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
