//! Sanitization pipeline.
//!
//! ```text
//! text ─► ensure #Requires ─► ┌ detect ─► convert ┐ ≤ max_passes ─► detect (residual) ─► validate
//!                             └───────────────────┘
//! ```
//!
//! Residual legacy syntax becomes `Unconvertible` warnings. Only the
//! structural validator decides validity.

use std::collections::BTreeSet;
use std::sync::Arc;

use ahkforge_types::{ConversionRecord, ScriptText, ValidationResult, Violation, ViolationKind};
use tracing::{debug, warn};

use crate::config::SanitizeConfig;
use crate::converter::convert;
use crate::detector::detect;
use crate::error::RuleError;
use crate::rules::PatternLibrary;
use crate::validator;

/// First line of the annotation header when conversions were applied.
pub const CONVERSIONS_HEADER: &str = "; Auto conversions:";
/// Annotation line added when residual legacy syntax remains.
pub const RESIDUAL_WARNING: &str =
    "; WARNING: Residual legacy syntax could not be auto-converted fully. Review manually.";
/// Prefix of the annotation line added when the script is still invalid.
pub const VALIDATION_FAILED: &str = "; VALIDATION FAILED (auto conversion attempted) ->";

/// Output of [`Sanitizer::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: ScriptText,
    pub result: ValidationResult,
    /// Every rewrite across all passes, in application order.
    pub records: Vec<ConversionRecord>,
}

impl Sanitized {
    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }

    /// Whether sanitization changed anything, including the inserted header.
    pub fn changed_from(&self, original: &ScriptText) -> bool {
        &self.text != original
    }

    /// Distinct ids of the rules that fired, sorted.
    pub fn applied_rules(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.rule.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One line per conversion record.
    pub fn change_summary(&self) -> String {
        self.records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The sanitized text with a comment header naming the applied rules and
    /// flagging residual legacy syntax or a failed validation.
    pub fn annotated(&self) -> ScriptText {
        let mut header = Vec::new();
        let already_failed = self
            .text
            .lines()
            .iter()
            .any(|line| line.starts_with(VALIDATION_FAILED));
        if !self.is_valid() && !already_failed {
            let errors: Vec<String> = self.result.errors().map(ToString::to_string).collect();
            header.push(format!("{VALIDATION_FAILED} {}", errors.join(" | ")));
        }
        let applied = self.applied_rules();
        if !applied.is_empty() {
            header.push(format!("{CONVERSIONS_HEADER} {}", applied.join(", ")));
        }
        if self.result.has_warnings() {
            header.push(RESIDUAL_WARNING.to_string());
        }
        header.retain(|h| !self.text.lines().contains(h));
        self.text.prepend(&header)
    }
}

/// Whether a line declares the target AutoHotkey version.
fn is_requires_directive(line: &str) -> bool {
    let mut words = line.split_whitespace();
    matches!(
        (words.next(), words.next()),
        (Some(directive), Some(target))
            if directive.eq_ignore_ascii_case("#Requires") && target.eq_ignore_ascii_case("AutoHotkey")
    )
}

fn is_single_instance_directive(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("#SingleInstance"))
}

/// Detector/converter loop plus final validation.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    library: Arc<PatternLibrary>,
    config: SanitizeConfig,
}

impl Sanitizer {
    pub fn new(library: Arc<PatternLibrary>, config: SanitizeConfig) -> Self {
        Self { library, config }
    }

    /// Built-in rules and default settings.
    pub fn standard() -> Result<Self, RuleError> {
        Ok(Self::new(
            Arc::new(PatternLibrary::standard()?),
            SanitizeConfig::default(),
        ))
    }

    /// Custom rules from `config` ahead of the built-in table.
    pub fn from_config(config: SanitizeConfig) -> Result<Self, RuleError> {
        let library = PatternLibrary::with_custom(&config.rules)?;
        Ok(Self::new(Arc::new(library), config))
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn config(&self) -> &SanitizeConfig {
        &self.config
    }

    /// Structural validation only, no conversion.
    pub fn validate(&self, text: &ScriptText) -> ValidationResult {
        validator::validate(text)
    }

    /// Structural validation plus legacy findings, without rewriting.
    ///
    /// Findings stay `LegacyDetected` and never block; the verdict matches
    /// [`Sanitizer::validate`].
    pub fn check(&self, text: &ScriptText) -> ValidationResult {
        let findings = detect(text, &self.library);
        self.compose(validator::validate(text), findings, &[])
    }

    /// Insert the configured header unless the script already declares a
    /// target version. A v1 declaration counts; the `requires-v1` rule
    /// rewrites it later.
    fn ensure_header(&self, text: &ScriptText) -> ScriptText {
        if text.lines().iter().any(|line| is_requires_directive(line)) {
            return text.clone();
        }

        let has_single_instance = text.lines().iter().any(|line| is_single_instance_directive(line));
        let header: Vec<&str> = self
            .config
            .header()
            .into_iter()
            .filter(|line| !(has_single_instance && is_single_instance_directive(line)))
            .collect();
        text.prepend(&header)
    }

    /// Run the full pipeline on one script.
    pub fn sanitize(&self, text: &ScriptText) -> Sanitized {
        if text.is_blank() {
            return Sanitized {
                text: text.clone(),
                result: ValidationResult::valid(),
                records: Vec::new(),
            };
        }

        let mut working = self.ensure_header(text);
        let mut records = Vec::new();
        let mut exhausted = false;

        for pass in 1..=self.config.max_passes {
            let found = detect(&working, &self.library);
            if found.is_empty() {
                debug!(pass, "no legacy syntax left");
                break;
            }

            let conversion = convert(&working, &self.library);
            debug!(
                pass,
                detected = found.len(),
                converted = conversion.records.len(),
                "sanitize pass"
            );
            working = conversion.text;
            if conversion.records.is_empty() {
                break;
            }
            records.extend(conversion.records);
            exhausted = pass == self.config.max_passes;
        }

        let residual: Vec<Violation> = detect(&working, &self.library)
            .into_iter()
            .map(|v| v.reclassify(ViolationKind::Unconvertible))
            .collect();
        if !residual.is_empty() {
            if exhausted {
                warn!(passes = self.config.max_passes, "pass limit reached while converting");
            }
            warn!(count = residual.len(), "residual legacy syntax left unconverted");
        }

        let result = self.compose(validator::validate(&working), residual, &records);
        Sanitized {
            text: working,
            result,
            records,
        }
    }

    /// Structural errors first, then warnings, then one line per conversion.
    fn compose(
        &self,
        structural: ValidationResult,
        findings: Vec<Violation>,
        records: &[ConversionRecord],
    ) -> ValidationResult {
        let mut messages = structural.messages;
        messages.extend(findings.iter().map(|v| {
            let hint = self.library.hint(&v.rule);
            if hint.is_empty() {
                format!("warning: {v}")
            } else {
                format!("warning: {v} (hint: {hint})")
            }
        }));
        messages.extend(records.iter().map(|r| format!("converted: {r}")));

        let mut violations = structural.violations;
        violations.extend(findings);
        ValidationResult::new(violations, messages)
    }
}
