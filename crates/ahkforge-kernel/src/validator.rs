//! Structural validator.
//!
//! Catches the mistakes that make a script fail to load at all: unbalanced
//! braces and parentheses across the file, and lines with an unmatched
//! quote. Each line is looked at on its own; continuation sections, block
//! comments and multi-line strings are not modeled. When in doubt the
//! validator says "valid".

use ahkforge_types::{ScriptText, ValidationResult, Violation};

/// Starts a whole-line comment.
pub const COMMENT_MARKER: char = ';';
/// Starts a directive line (`#Requires`, `#SingleInstance`, ...).
pub const DIRECTIVE_MARKER: char = '#';
/// AutoHotkey's escape character.
pub const ESCAPE_CHAR: char = '`';

/// Rule id for cumulative `{`/`}` imbalance.
pub const UNBALANCED_BRACES: &str = "unbalanced-braces";
/// Rule id for cumulative `(`/`)` imbalance.
pub const UNBALANCED_PARENS: &str = "unbalanced-parens";
/// Rule id for a line with an odd number of unescaped quotes.
pub const UNMATCHED_QUOTE: &str = "unmatched-quote";

/// Whether a line is a whole-line comment.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

/// Whether a line is a directive.
pub fn is_directive(line: &str) -> bool {
    line.trim_start().starts_with(DIRECTIVE_MARKER)
}

/// Delimiter and quote counts for one line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LineCounts {
    braces: i64,
    parens: i64,
    double_quotes: usize,
    single_quotes: usize,
}

impl LineCounts {
    fn scan(line: &str) -> Self {
        let mut counts = Self::default();
        let mut escaped = false;

        for ch in line.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                ESCAPE_CHAR => escaped = true,
                '{' => counts.braces += 1,
                '}' => counts.braces -= 1,
                '(' => counts.parens += 1,
                ')' => counts.parens -= 1,
                '"' => counts.double_quotes += 1,
                '\'' => counts.single_quotes += 1,
                _ => {}
            }
        }
        counts
    }

    fn has_unmatched_quote(&self) -> bool {
        self.double_quotes % 2 == 1 || self.single_quotes % 2 == 1
    }
}

/// Check a script's structure. Only structural violations are produced.
pub fn validate(text: &ScriptText) -> ValidationResult {
    let mut braces = 0i64;
    let mut parens = 0i64;
    let mut violations = Vec::new();

    for (number, line) in text.numbered() {
        if line.trim().is_empty() || is_comment(line) || is_directive(line) {
            continue;
        }

        let counts = LineCounts::scan(line);
        braces += counts.braces;
        parens += counts.parens;

        if counts.has_unmatched_quote() {
            violations.push(Violation::unmatched_quote(number, line.trim(), UNMATCHED_QUOTE));
        }
    }

    if braces != 0 {
        violations.push(Violation::delimiter_imbalance('{', UNBALANCED_BRACES, braces));
    }
    if parens != 0 {
        violations.push(Violation::delimiter_imbalance('(', UNBALANCED_PARENS, parens));
    }

    let messages = violations.iter().map(|v| format!("error: {v}")).collect();
    ValidationResult::new(violations, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahkforge_types::ViolationKind;
    use rstest::rstest;

    fn check(source: &str) -> ValidationResult {
        validate(&ScriptText::new(source))
    }

    #[test]
    fn empty_input_is_valid() {
        let result = check("");
        assert!(result.is_valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn missing_close_brace_reports_net_one() {
        let result = check("F1::{\n  MsgBox('test')\n");
        assert!(!result.is_valid);
        assert_eq!(result.violations.len(), 1);

        let v = &result.violations[0];
        assert_eq!(v.kind, ViolationKind::StructuralImbalance);
        assert_eq!(v.rule, UNBALANCED_BRACES);
        assert_eq!(v.matched, "{");
        assert_eq!(v.imbalance, Some(1));
        assert_eq!(result.messages, vec!["error: unbalanced '{': 1 unclosed"]);
    }

    #[test]
    fn extra_close_paren_is_negative() {
        let result = check("x := (1 + 2))");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].imbalance, Some(-1));
        assert_eq!(result.violations[0].rule, UNBALANCED_PARENS);
    }

    #[test]
    fn imbalance_is_cumulative_across_lines() {
        let result = check("F1::{\n  MsgBox('a')\n}\nF2::\n{\n  Send('b')\n}");
        assert!(result.is_valid, "{:?}", result.messages);
    }

    #[rstest]
    #[case::plain("MsgBox('hi)")]
    #[case::double("MsgBox(\"hi)")]
    #[case::three_singles("MsgBox('it's')")]
    fn odd_quote_count_flags_line(#[case] line: &str) {
        let result = check(line);
        assert!(!result.is_valid);
        assert_eq!(result.violations[0].rule, UNMATCHED_QUOTE);
        assert_eq!(result.violations[0].line, 1);
    }

    #[rstest]
    #[case::escaped_single("MsgBox('it`'s')")]
    #[case::escaped_double("MsgBox(\"say `\"hi`\"\")")]
    #[case::both_paired("MsgBox('a' . \"b\")")]
    fn escaped_or_paired_quotes_pass(#[case] line: &str) {
        let result = check(line);
        assert!(result.is_valid, "{:?}", result.messages);
    }

    #[test]
    fn quote_inside_other_quote_is_still_counted() {
        let result = check("MsgBox(\"it's\")");
        assert!(!result.is_valid);
    }

    #[rstest]
    #[case::comment("; unbalanced { here")]
    #[case::indented_comment("    ; MsgBox('oops")]
    #[case::directive("#Include <lib(>")]
    #[case::blank("   ")]
    fn skipped_lines_never_count(#[case] line: &str) {
        let result = check(line);
        assert!(result.is_valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn quote_violation_names_line_and_text() {
        let result = check("MsgBox('ok')\n  Send('oops)\n");
        let v = &result.violations[0];
        assert_eq!(v.line, 2);
        assert_eq!(v.matched, "Send('oops)");
        assert_eq!(
            result.messages[0],
            "error: line 2: unmatched quote [unmatched-quote]: Send('oops)"
        );
    }

    #[test]
    fn escaped_brace_is_not_counted() {
        assert!(check("Send('`{')").is_valid);
    }
}
