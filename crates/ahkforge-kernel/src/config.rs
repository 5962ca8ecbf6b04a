//! Configuration loading.
//!
//! Layered the usual way: built-in defaults, then the TOML file, then
//! environment variables. The default file lives at
//! `$XDG_CONFIG_HOME/ahkforge/config.toml`; a missing default file is not an
//! error, a missing file named explicitly is.
//!
//! ```toml
//! [sanitize]
//! max_passes = 3
//! single_instance = true
//!
//! [[sanitize.rules]]
//! id = "local-send-mode"
//! pattern = '(?i)^\s*SendMode\s*,\s*Input\s*$'
//! replace = "SendMode('Input')"
//! hint = "SendMode takes a quoted mode in v2"
//!
//! [generation]
//! endpoint = "https://api.llama.com/v1/chat/completions"
//! model = "Llama-3.3-70B-Instruct"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::paths;
use crate::rules::CustomRule;

/// Overrides `sanitize.max_passes`.
pub const ENV_MAX_PASSES: &str = "AHKFORGE_MAX_PASSES";
/// Overrides `generation.endpoint`.
pub const ENV_API_URL: &str = "LLAMA_API_URL";
/// Overrides `generation.model`.
pub const ENV_MODEL: &str = "LLAMA_MODEL";
/// Overrides `generation.temperature`.
pub const ENV_TEMPERATURE: &str = "LLAMA_TEMPERATURE";

pub const DEFAULT_MAX_PASSES: usize = 3;
pub const DEFAULT_REQUIRES: &str = "#Requires AutoHotkey v2.0";
pub const DEFAULT_MODEL: &str = "Llama-3.3-70B-Instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sanitize: SanitizeConfig,
    pub generation: GenerationConfig,
}

/// Sanitization pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Upper bound on detect/convert passes.
    pub max_passes: usize,
    /// Add `#SingleInstance Force` to the inserted header.
    pub single_instance: bool,
    /// Directive inserted when a script declares no target version.
    pub requires_directive: String,
    /// Extra rules, evaluated before the built-in table.
    pub rules: Vec<CustomRule>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            single_instance: false,
            requires_directive: DEFAULT_REQUIRES.to_string(),
            rules: Vec::new(),
        }
    }
}

impl SanitizeConfig {
    /// Lines inserted at the top of a script without a `#Requires` directive.
    pub fn header(&self) -> Vec<&str> {
        let mut header = vec![self.requires_directive.as_str()];
        if self.single_instance {
            header.push("#SingleInstance Force");
        }
        header
    }
}

/// Settings for building model requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Endpoint URL; decides the API flavor and payload shape.
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Config {
    /// Load configuration: file (explicit or default location), then
    /// environment overrides, then validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = paths::config_file();
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), rules = config.sanitize.rules.len(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Taking the lookup as a parameter keeps this testable without touching
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_PASSES) {
            self.sanitize.max_passes = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_MAX_PASSES,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_API_URL) {
            self.generation.endpoint = value;
        }
        if let Some(value) = lookup(ENV_MODEL) {
            self.generation.model = value;
        }
        if let Some(value) = lookup(ENV_TEMPERATURE) {
            self.generation.temperature = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_TEMPERATURE,
                value,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sanitize.max_passes == 0 {
            return Err(ConfigError::ZeroPasses);
        }
        Ok(())
    }

    /// Where [`Config::load`] looks when no path is given.
    pub fn default_path() -> PathBuf {
        paths::config_file()
    }
}
