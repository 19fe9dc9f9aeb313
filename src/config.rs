//! Configuration management for protogate
//!
//! Settings load from environment variables with defaults; CLI flags
//! override individual values afterwards.
//!
//! # Environment Variables
//!
//! - `PROTOGATE_TAG_PREFIX`: Prefix of every image tag - default: "grpc-gateway-"
//! - `PROTOGATE_COMPILER`: Protocol compiler command line - default: "buf generate"
//! - `PROTOGATE_COMPILE_TIMEOUT`: Compiler timeout in seconds - default: "300"
//! - `PROTOGATE_PUBLISH_TIMEOUT`: Timeout of each image build/push/tag call in seconds - default: "1800"
//! - `PROTOGATE_DOCKERFILE`: Dockerfile relative to the repository - default: "Dockerfile"
//! - `PROTOGATE_TEMPLATE_DIR`: Template assets relative to the repository - default: "template"
//! - `PROTOGATE_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use protogate::ProtogateConfig;
//!
//! let config = ProtogateConfig::default();
//! config.validate().expect("Invalid configuration");
//! let compiler = config.compiler().expect("compiler command");
//! ```

use crate::generator::CommandCompiler;
use crate::pipeline::{ProjectLayout, Timeouts};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TAG_PREFIX: &str = "grpc-gateway-";
const DEFAULT_COMPILER: &str = "buf generate";
const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 1800;
const DEFAULT_DOCKERFILE: &str = "Dockerfile";
const DEFAULT_TEMPLATE_DIR: &str = "template";
const DEFAULT_LOG_LEVEL: &str = "info";

const MAX_COMPILE_TIMEOUT_SECS: u64 = 3600;
const MAX_PUBLISH_TIMEOUT_SECS: u64 = 7200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtogateConfig {
    pub tag_prefix: String,

    /// Compiler program and arguments, whitespace separated
    pub compiler: String,

    pub compile_timeout_secs: u64,

    pub publish_timeout_secs: u64,

    pub dockerfile: PathBuf,

    pub template_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ProtogateConfig {
    /// Loads `PROTOGATE_*` variables, falling back to defaults
    fn default() -> Self {
        let tag_prefix =
            env::var("PROTOGATE_TAG_PREFIX").unwrap_or_else(|_| DEFAULT_TAG_PREFIX.to_string());

        let compiler =
            env::var("PROTOGATE_COMPILER").unwrap_or_else(|_| DEFAULT_COMPILER.to_string());

        let compile_timeout_secs = env::var("PROTOGATE_COMPILE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_COMPILE_TIMEOUT_SECS);

        let publish_timeout_secs = env::var("PROTOGATE_PUBLISH_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PUBLISH_TIMEOUT_SECS);

        let dockerfile = env::var("PROTOGATE_DOCKERFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOCKERFILE));

        let template_dir = env::var("PROTOGATE_TEMPLATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_DIR));

        let log_level = env::var("PROTOGATE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            tag_prefix,
            compiler,
            compile_timeout_secs,
            publish_timeout_secs,
            dockerfile,
            template_dir,
            log_level,
        }
    }
}

impl ProtogateConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for out-of-range timeouts, an empty compiler
    /// command, a tag prefix Docker would reject, or an unknown log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_timeout(
            "Compile timeout",
            self.compile_timeout_secs,
            MAX_COMPILE_TIMEOUT_SECS,
        )?;
        check_timeout(
            "Publish timeout",
            self.publish_timeout_secs,
            MAX_PUBLISH_TIMEOUT_SECS,
        )?;

        if self.compiler.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Compiler command cannot be empty".to_string(),
            ));
        }

        check_tag_prefix(&self.tag_prefix)?;

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout {
            dockerfile: self.dockerfile.clone(),
            template_dir: self.template_dir.clone(),
            ..ProjectLayout::default()
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            compile: Duration::from_secs(self.compile_timeout_secs),
            publish: Duration::from_secs(self.publish_timeout_secs),
        }
    }

    pub fn compiler(&self) -> Result<CommandCompiler, ConfigError> {
        CommandCompiler::from_command_line(&self.compiler).map_err(|e| ConfigError::ParseError {
            field: "PROTOGATE_COMPILER".to_string(),
            error: e.to_string(),
        })
    }
}

fn check_timeout(name: &str, secs: u64, max: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must be at least 1 second",
            name
        )));
    }
    if secs > max {
        return Err(ConfigError::ValidationFailed(format!(
            "{} cannot exceed {} seconds",
            name, max
        )));
    }
    Ok(())
}

/// The prefix starts every tag, so it must itself be a valid tag start
fn check_tag_prefix(prefix: &str) -> Result<(), ConfigError> {
    let mut chars = prefix.chars();
    let valid_first = chars
        .next()
        .map_or(true, |c| c.is_ascii_alphanumeric() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !valid_first || !valid_rest {
        return Err(ConfigError::ValidationFailed(format!(
            "Invalid tag prefix: '{}'",
            prefix
        )));
    }
    Ok(())
}

impl fmt::Display for ProtogateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Protogate Configuration:")?;
        writeln!(f, "  Tag Prefix: {}", self.tag_prefix)?;
        writeln!(f, "  Compiler: {}", self.compiler)?;
        writeln!(f, "  Compile Timeout: {}s", self.compile_timeout_secs)?;
        writeln!(f, "  Publish Timeout: {}s", self.publish_timeout_secs)?;
        writeln!(f, "  Dockerfile: {}", self.dockerfile.display())?;
        writeln!(f, "  Template Dir: {}", self.template_dir.display())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
