//! ahkforge-kernel: validation and legacy-syntax repair for AutoHotkey v2 scripts.
//!
//! This crate provides:
//!
//! - **Rules**: an ordered library of v1 → v2 patterns, detect-only or rewriting
//! - **Validator**: permissive brace, paren and quote balance checking
//! - **Detector / Converter**: find and rewrite legacy syntax line by line
//! - **Pipeline**: header insertion, bounded detect/convert loop, final verdict
//! - **Cache**: verdicts keyed by path and modification time
//! - **Generation**: payload building and response parsing for model output
//!
//! Everything here is synchronous and performs no I/O apart from reading a
//! config file on request. Invalid scripts are data, not errors.

pub mod cache;
pub mod config;
pub mod converter;
pub mod detector;
pub mod error;
pub mod generation;
pub mod paths;
pub mod pipeline;
pub mod rules;
pub mod validator;

use std::sync::LazyLock;

pub use ahkforge_types::{
    ConversionRecord, ScriptText, ValidationResult, Violation, ViolationKind,
};
pub use cache::{CacheEntry, CacheStats, ValidationCache};
pub use config::{Config, GenerationConfig, SanitizeConfig};
pub use error::{ConfigError, RuleError};
pub use pipeline::{Sanitized, Sanitizer};
pub use rules::PatternLibrary;
pub use validator::validate;

static STANDARD: LazyLock<Result<Sanitizer, RuleError>> = LazyLock::new(Sanitizer::standard);

/// Sanitize with the built-in rules and default settings.
///
/// The standard sanitizer is built once per process. The error case only
/// arises if a built-in pattern fails to compile.
pub fn sanitize(text: &ScriptText) -> Result<Sanitized, RuleError> {
    STANDARD
        .as_ref()
        .map(|sanitizer| sanitizer.sanitize(text))
        .map_err(Clone::clone)
}
