//! Error types for library construction and configuration.
//!
//! Validation findings are never errors: an invalid script is an ordinary
//! [`ValidationResult`](ahkforge_types::ValidationResult). These types cover
//! the exceptional cases that stop a pipeline from being built at all.

use std::path::PathBuf;

use thiserror::Error;

/// A rule could not be turned into a usable matcher.
#[derive(Debug, Clone, Error)]
pub enum RuleError {
    #[error("rule '{id}': invalid pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{0}' is registered more than once")]
    DuplicateId(String),

    #[error("rule '{id}': rewrite needs capture group '{group}'")]
    MissingGroup { id: String, group: &'static str },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("max_passes must be at least 1")]
    ZeroPasses,

    #[error(transparent)]
    Rule(#[from] RuleError),
}
