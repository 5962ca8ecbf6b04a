//! ValidationResult: the verdict for one script.

use serde::{Deserialize, Serialize};

use crate::violation::{Violation, ViolationKind};

/// Final verdict for a script.
///
/// `is_valid` is derived from `violations` at construction: it is false iff
/// at least one blocking (structural) violation is present. Messages are
/// whatever the producer wants a user to read, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ValidationResult {
    pub is_valid: bool,
    pub messages: Vec<String>,
    pub violations: Vec<Violation>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationResult {
    /// A valid result with nothing to report.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            messages: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Build a result, deriving validity from the violations.
    pub fn new(violations: Vec<Violation>, messages: Vec<String>) -> Self {
        let is_valid = !violations.iter().any(Violation::is_blocking);
        Self {
            is_valid,
            messages,
            violations,
        }
    }

    /// Violations that make the script invalid.
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_blocking())
    }

    /// Non-blocking findings (unconvertible legacy syntax).
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::Unconvertible)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}
