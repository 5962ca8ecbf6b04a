//! ConversionRecord: one rewrite applied by the converter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single line rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ConversionRecord {
    /// 1-based line number in the text the converter was given.
    pub line: usize,
    pub before: String,
    pub after: String,
    /// Identifier of the rule that produced the rewrite.
    pub rule: String,
}

impl ConversionRecord {
    pub fn new(
        line: usize,
        before: impl Into<String>,
        after: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            line,
            before: before.into(),
            after: after.into(),
            rule: rule.into(),
        }
    }
}

impl fmt::Display for ConversionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} [{}]: {} -> {}",
            self.line,
            self.rule,
            self.before.trim(),
            self.after.trim()
        )
    }
}
