//! Structured logging setup
//!
//! Initializes the `tracing` subscriber once per process. Logs always go to
//! stderr: stdout belongs to command output such as `describe`.
//!
//! # Example
//!
//! ```no_run
//! use apphosting_adapter::util::logging;
//!
//! logging::init_from_env();
//!
//! use tracing::{info, warn};
//! info!("Adapter started");
//! warn!(version = "unspecified", "Framework version not provided");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., apphosting_adapter::bundle) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations, for build environments that ingest logs
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }
}

/// Parses a log level from a string, falling back to INFO
///
/// ```
/// use apphosting_adapter::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("INFO"), Level::INFO);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the logging system. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            if let Ok(directive) = format!("apphosting_adapter={}", config.level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// Builds a logging configuration from `APPHOSTING_LOG_LEVEL` and `APPHOSTING_LOG_JSON`
pub fn config_from_env() -> LoggingConfig {
    let level_str = env::var("APPHOSTING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let use_json = env::var("APPHOSTING_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    if use_json {
        LoggingConfig {
            level: parse_level(&level_str),
            ..LoggingConfig::production()
        }
    } else {
        LoggingConfig::with_level(parse_level(&level_str))
    }
}

/// Initializes logging from environment variables
pub fn init_from_env() {
    init_logging(config_from_env());
}
