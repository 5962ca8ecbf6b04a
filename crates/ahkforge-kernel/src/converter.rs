//! Auto-converter: rewrites legacy lines with the library's rules.
//!
//! Each line runs through every rule in order and each rule sees the output
//! of the rules before it. Converted output is v2 call or assignment syntax,
//! which no rule matches, so a span is never rewritten twice and running the
//! converter on its own output changes nothing.

use ahkforge_types::{ConversionRecord, ScriptText, Violation, ViolationKind};
use tracing::trace;

use crate::rules::{PatternLibrary, Rule, RuleAction};
use crate::validator::is_comment;

/// Output of one conversion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: ScriptText,
    /// One record per rewrite, in line order.
    pub records: Vec<ConversionRecord>,
    /// Matches of detect-only rules, reported as `Unconvertible`.
    pub unconvertible: Vec<Violation>,
}

impl Conversion {
    pub fn changed(&self) -> bool {
        !self.records.is_empty()
    }
}

/// What a matching rule did to a line.
enum Outcome {
    Rewritten(String),
    /// Detect-only match; carries the matched text.
    Unconvertible(String),
}

/// Apply one rule to a line. `None` when the rule does not match.
fn apply_rule(rule: &Rule, line: &str) -> Option<Outcome> {
    let caps = rule.pattern().captures(line)?;
    let whole = caps.get(0)?;

    Some(match rule.action() {
        RuleAction::Replace(rewrite) => {
            let replacement = rewrite.apply(&caps);
            Outcome::Rewritten(format!(
                "{}{}{}",
                &line[..whole.start()],
                replacement,
                &line[whole.end()..]
            ))
        }
        RuleAction::DetectOnly => Outcome::Unconvertible(whole.as_str().trim().to_string()),
    })
}

/// Run one conversion pass over the whole text.
pub fn convert(text: &ScriptText, library: &PatternLibrary) -> Conversion {
    let mut lines = Vec::with_capacity(text.len());
    let mut records = Vec::new();
    let mut unconvertible = Vec::new();

    for (number, line) in text.numbered() {
        if is_comment(line) {
            lines.push(line.to_string());
            continue;
        }

        let mut current = line.to_string();
        for rule in library.rules() {
            match apply_rule(rule, &current) {
                Some(Outcome::Rewritten(rewritten)) if rewritten != current => {
                    trace!(line = number, rule = rule.id(), "rewrote");
                    records.push(ConversionRecord::new(number, &current, &rewritten, rule.id()));
                    current = rewritten;
                }
                Some(Outcome::Unconvertible(matched)) => {
                    unconvertible.push(
                        Violation::legacy(number, matched, rule.id())
                            .reclassify(ViolationKind::Unconvertible),
                    );
                }
                Some(Outcome::Rewritten(_)) | None => {}
            }
        }
        lines.push(current);
    }

    Conversion {
        text: text.with_lines(lines),
        records,
        unconvertible,
    }
}
