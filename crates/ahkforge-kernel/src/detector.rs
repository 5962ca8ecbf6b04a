//! Legacy-syntax detector.

use ahkforge_types::{ScriptText, Violation};

use crate::rules::PatternLibrary;
use crate::validator::is_comment;

/// Find every (line, rule) pair where a rule matches.
///
/// Results are ordered by line, then by rule order in the library. Comment
/// lines are skipped; directives are not, since some rules target removed
/// directives.
pub fn detect(text: &ScriptText, library: &PatternLibrary) -> Vec<Violation> {
    text.numbered()
        .filter(|(_, line)| !is_comment(line))
        .flat_map(move |(number, line)| {
            library.rules().iter().filter_map(move |rule| {
                rule.pattern()
                    .find(line)
                    .map(|m| Violation::legacy(number, m.as_str().trim(), rule.id()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahkforge_types::ViolationKind;

    fn library() -> PatternLibrary {
        PatternLibrary::standard().unwrap()
    }

    #[test]
    fn hotkey_msgbox_is_flagged_once() {
        let found = detect(&ScriptText::new("^j::MsgBox, Hello World"), &library());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 1);
        assert_eq!(found[0].rule, "msgbox-command");
        assert_eq!(found[0].kind, ViolationKind::LegacyDetected);
        assert_eq!(found[0].matched, "^j::MsgBox, Hello World");
    }

    #[test]
    fn clean_v2_has_no_findings() {
        let source = "#Requires AutoHotkey v2.0\n^j::MsgBox('Hello')\nF1::\n{\n  Send('{Escape}')\n}\n";
        assert!(detect(&ScriptText::new(source), &library()).is_empty());
    }

    #[test]
    fn comments_are_skipped() {
        let found = detect(&ScriptText::new("; MsgBox, old style\n  ;Sleep, 10"), &library());
        assert!(found.is_empty());
    }

    #[test]
    fn removed_directives_are_examined() {
        let found = detect(&ScriptText::new("#NoEnv"), &library());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule, "removed-directive");
    }

    #[test]
    fn ordered_by_line_then_rule() {
        let source = "Sleep, 10\nStringReplace, out, in, a, b, All\nGosub, Label";
        let found = detect(&ScriptText::new(source), &library());
        let pairs: Vec<_> = found.iter().map(|v| (v.line, v.rule.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (1, "sleep-command"),
                (2, "string-replace-all"),
                (2, "string-command"),
                (3, "gosub-command"),
            ]
        );
    }
}
