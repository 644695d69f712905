//! Utility modules
//!
//! - Structured logging setup and configuration
//! - Lexical path arithmetic used by the output path resolvers

pub mod logging;
pub mod paths;

pub use logging::{init_from_env, init_logging, LoggingConfig};
pub use paths::{normalize_path, relative_path};
