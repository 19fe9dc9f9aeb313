//! Structured logging setup for protogate
//!
//! Logs go to stderr so that `--format json|yaml` output on stdout stays
//! machine readable. `RUST_LOG` takes precedence over the configured level
//! when it is set.
//!
//! # Example
//!
//! ```no_run
//! use protogate::util::logging;
//!
//! // With environment: PROTOGATE_LOG_LEVEL=debug PROTOGATE_LOG_JSON=true
//! logging::init_from_env();
//!
//! tracing::info!(folder = "users", "Rebuilding folder");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Crates whose chatter is capped at `warn` unless `RUST_LOG` says otherwise
const NOISY_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "bollard"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for protogate's own events
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., protogate::registry) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
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

    /// JSON output with source locations, for CI log collectors
    pub fn json(level: Level) -> Self {
        Self {
            level,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Level from CLI flags: explicit `--log-level` wins, then `-v`, then `-q`,
    /// then `PROTOGATE_LOG_LEVEL`
    pub fn level_from_flags(log_level: Option<&str>, verbose: bool, quiet: bool) -> Level {
        if let Some(level_str) = log_level {
            parse_level(level_str)
        } else if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            parse_level(&env_level())
        }
    }
}

/// Parses a log level, case-insensitively; unknown values fall back to INFO
///
/// ```
/// use protogate::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
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

fn directive(text: &str) -> Directive {
    text.parse().expect("valid filter directive")
}

fn env_level() -> String {
    env::var("PROTOGATE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Reads `PROTOGATE_LOG_JSON`; anything but `true`/`1` is false
pub fn json_from_env() -> bool {
    env::var("PROTOGATE_LOG_JSON")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false)
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter.add_directive(directive(&format!("protogate={}", config.level)));
            for target in NOISY_TARGETS {
                filter = filter.add_directive(directive(&format!("{}=warn", target)));
            }
        }

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

/// Initializes logging from `PROTOGATE_LOG_LEVEL` and `PROTOGATE_LOG_JSON`
pub fn init_from_env() {
    let level = parse_level(&env_level());
    let config = if json_from_env() {
        LoggingConfig::json(level)
    } else {
        LoggingConfig::with_level(level)
    };
    init_logging(config);
}
