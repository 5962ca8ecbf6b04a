//! Violations reported by the detector and the structural validator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of problem a violation describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Legacy (v1) syntax matched a pattern-library rule.
    LegacyDetected,
    /// Unbalanced delimiters or an unmatched quote. The only blocking kind.
    StructuralImbalance,
    /// Legacy syntax left over after conversion. Reported, never blocking.
    Unconvertible,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::LegacyDetected => "legacy-detected",
            ViolationKind::StructuralImbalance => "structural-imbalance",
            ViolationKind::Unconvertible => "unconvertible",
        }
    }

    /// Whether this kind makes a script invalid.
    pub fn is_blocking(&self) -> bool {
        matches!(self, ViolationKind::StructuralImbalance)
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding.
///
/// `line` is 1-based. Line `0` marks a finding about the script as a whole,
/// which is how cumulative delimiter imbalance is reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Violation {
    pub line: usize,
    /// The matched substring: the legacy construct, the offending line for
    /// quote problems, or the opening delimiter for an imbalance.
    pub matched: String,
    /// Rule identifier.
    pub rule: String,
    pub kind: ViolationKind,
    /// Net open-minus-close count for delimiter imbalance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imbalance: Option<i64>,
}

impl Violation {
    /// A legacy construct found by the detector.
    pub fn legacy(line: usize, matched: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            line,
            matched: matched.into(),
            rule: rule.into(),
            kind: ViolationKind::LegacyDetected,
            imbalance: None,
        }
    }

    /// Cumulative imbalance of a delimiter pair, named by its opening character.
    pub fn delimiter_imbalance(open: char, rule: impl Into<String>, net: i64) -> Self {
        Self {
            line: 0,
            matched: open.to_string(),
            rule: rule.into(),
            kind: ViolationKind::StructuralImbalance,
            imbalance: Some(net),
        }
    }

    /// A line with an odd number of unescaped quote characters.
    pub fn unmatched_quote(line: usize, text: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            line,
            matched: text.into(),
            rule: rule.into(),
            kind: ViolationKind::StructuralImbalance,
            imbalance: None,
        }
    }

    /// The same finding under a different kind.
    pub fn reclassify(self, kind: ViolationKind) -> Self {
        Self { kind, ..self }
    }

    pub fn is_blocking(&self) -> bool {
        self.kind.is_blocking()
    }
}

fn closing_for(open: &str) -> &'static str {
    match open {
        "{" => "}",
        "(" => ")",
        "[" => "]",
        _ => "?",
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(net) = self.imbalance {
            return if net > 0 {
                write!(f, "unbalanced '{}': {} unclosed", self.matched, net)
            } else {
                write!(
                    f,
                    "unbalanced '{}': {} extra '{}'",
                    self.matched,
                    net.unsigned_abs(),
                    closing_for(&self.matched)
                )
            };
        }

        let what = match self.kind {
            ViolationKind::LegacyDetected => "legacy syntax",
            ViolationKind::StructuralImbalance => "unmatched quote",
            ViolationKind::Unconvertible => "unconvertible legacy syntax",
        };
        write!(
            f,
            "line {}: {} [{}]: {}",
            self.line,
            what,
            self.rule,
            self.matched.trim()
        )
    }
}
