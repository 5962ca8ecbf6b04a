//! Human and JSON rendering of results.

use std::path::PathBuf;

use ahkforge_kernel::rules::Rule;
use ahkforge_types::{ConversionRecord, ValidationResult};
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::TextDiff;

/// Terminal styling, a no-op when color is off.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn ok(&self, text: &str) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bad(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn warn(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn note(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn verdict(&self, valid: bool) -> String {
        if valid {
            self.ok("VALID  ")
        } else {
            self.bad("INVALID")
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub path: PathBuf,
    pub valid: bool,
    pub cached: bool,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub path: PathBuf,
    pub valid: bool,
    pub changed: bool,
    pub written: bool,
    pub records: Vec<ConversionRecord>,
    pub result: ValidationResult,
    /// Sanitized text, included when it was not written back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub valid: bool,
    pub text: String,
    pub records: Vec<ConversionRecord>,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleRow {
    pub id: String,
    pub convertible: bool,
    pub example: String,
    pub hint: String,
}

impl From<&Rule> for RuleRow {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id().to_string(),
            convertible: rule.is_convertible(),
            example: rule.example().to_string(),
            hint: rule.hint().to_string(),
        }
    }
}

/// JSON envelope for multi-file commands.
#[derive(Debug, Clone, Serialize)]
pub struct Summary<T> {
    pub valid: bool,
    pub files: Vec<T>,
}

impl<T> Summary<T> {
    pub fn new(files: Vec<T>, valid: impl Fn(&T) -> bool) -> Self {
        Self {
            valid: files.iter().all(valid),
            files,
        }
    }
}

/// Pipeline messages, colored by their prefix and indented.
pub fn render_messages(p: Painter, messages: &[String]) -> String {
    messages
        .iter()
        .map(|m| {
            let painted = match m.split_once(": ") {
                Some(("error", rest)) => format!("{}: {rest}", p.bad("error")),
                Some(("warning", rest)) => format!("{}: {rest}", p.warn("warning")),
                Some(("converted", rest)) => format!("{}: {rest}", p.note("converted")),
                _ => m.clone(),
            };
            format!("  {painted}\n")
        })
        .collect()
}

pub fn render_check(p: Painter, report: &CheckReport) -> String {
    let cached = if report.cached {
        format!(" {}", p.dim("(cached)"))
    } else {
        String::new()
    };
    format!(
        "{} {}{cached}\n{}",
        p.verdict(report.valid),
        report.path.display(),
        render_messages(p, &report.result.messages)
    )
}

pub fn render_fix(p: Painter, report: &FixReport, diff: Option<&str>) -> String {
    let status = match (report.changed, report.written) {
        (false, _) => p.dim("unchanged"),
        (true, true) => p.note("written"),
        (true, false) => p.warn("would change"),
    };
    let mut out = format!(
        "{} {} {status}\n{}",
        p.verdict(report.valid),
        report.path.display(),
        render_messages(p, &report.result.messages)
    );
    if let Some(diff) = diff {
        out.push_str(&paint_diff(p, diff));
    }
    out
}

pub fn render_rules<'a>(p: Painter, rules: impl IntoIterator<Item = &'a Rule>) -> String {
    rules
        .into_iter()
        .map(|rule| {
            let kind = if rule.is_convertible() {
                p.ok("convert")
            } else {
                p.warn("detect ")
            };
            let mut line = format!("{kind} {:<28} {}", rule.id(), p.dim(rule.example()));
            if !rule.hint().is_empty() {
                line.push_str(&format!("\n        {}", rule.hint()));
            }
            line.push('\n');
            line
        })
        .collect()
}

/// Unified diff between the file on disk and its sanitized form.
pub fn unified_diff(name: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(2)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

fn paint_diff(p: Painter, diff: &str) -> String {
    diff.lines()
        .map(|line| {
            let painted = if line.starts_with("+++") || line.starts_with("---") {
                p.dim(line)
            } else if line.starts_with('+') {
                p.ok(line)
            } else if line.starts_with('-') {
                p.bad(line)
            } else if line.starts_with("@@") {
                p.note(line)
            } else {
                line.to_string()
            };
            format!("{painted}\n")
        })
        .collect()
}
