//! End-to-end tests for the sanitization pipeline.

use std::sync::Arc;

use ahkforge_kernel::converter::convert;
use ahkforge_kernel::detector::detect;
use ahkforge_kernel::rules::{CustomRule, PatternLibrary};
use ahkforge_kernel::{
    Config, SanitizeConfig, Sanitizer, ScriptText, ValidationCache, ViolationKind, sanitize,
    validate,
};
use rstest::rstest;

fn library() -> PatternLibrary {
    PatternLibrary::standard().expect("standard rules compile")
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn hotkey_msgbox_is_converted_and_valid() {
    let input = ScriptText::new("^j::MsgBox, Hello World");

    let found = detect(&input, &library());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].line, 1);
    assert_eq!(found[0].kind, ViolationKind::LegacyDetected);

    let out = sanitize(&input).unwrap();
    assert!(out.is_valid());
    assert!(out.result.violations.is_empty());
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.text.line(2), Some("^j::MsgBox('Hello World')"));
}

#[test]
fn missing_close_brace_is_invalid() {
    let out = sanitize(&ScriptText::new("F1::{\n  MsgBox('test')\n")).unwrap();

    assert!(!out.is_valid());
    assert_eq!(out.result.violations.len(), 1);
    let v = &out.result.violations[0];
    assert_eq!(v.kind, ViolationKind::StructuralImbalance);
    assert_eq!(v.matched, "{");
    assert_eq!(v.imbalance, Some(1));
}

#[test]
fn unconvertible_command_warns_without_blocking() {
    let out = sanitize(&ScriptText::new("F3::\n{\n  Gosub, ShowMenu\n}\n")).unwrap();

    assert!(out.is_valid());
    assert!(out.records.is_empty());
    assert_eq!(out.result.warnings().count(), 1);
    assert!(
        out.result
            .messages
            .iter()
            .any(|m| m.contains("unconvertible") && m.contains("gosub-command")),
        "{:#?}",
        out.result.messages
    );
}

#[test]
fn empty_input_is_trivially_valid() {
    let out = sanitize(&ScriptText::new("")).unwrap();
    assert!(out.is_valid());
    assert!(out.text.is_empty());
    assert!(out.records.is_empty());
    assert!(validate(&ScriptText::new("")).violations.is_empty());
}

// =============================================================================
// RULE TABLE PROPERTIES
// =============================================================================

#[test]
fn every_example_is_detected_by_its_rule() {
    let lib = library();
    for rule in lib.rules() {
        let found = detect(&ScriptText::new(rule.example()), &lib);
        assert!(
            found.iter().any(|v| v.rule == rule.id()),
            "{} not detected in its example {:?}: {found:?}",
            rule.id(),
            rule.example()
        );
    }
}

#[test]
fn converted_examples_no_longer_match_their_rule() {
    let lib = library();
    for rule in lib.convertible() {
        let out = convert(&ScriptText::new(rule.example()), &lib);
        let converted = out.text.to_string();
        assert!(!out.records.is_empty(), "{} did not convert", rule.id());
        assert!(
            !rule.pattern().is_match(&converted),
            "{} still matches its own output {converted:?}",
            rule.id()
        );
    }
}

#[test]
fn converted_examples_are_structurally_valid() {
    let lib = library();
    for rule in lib.convertible() {
        let out = convert(&ScriptText::new(rule.example()), &lib);
        let result = validate(&out.text);
        assert!(result.is_valid, "{}: {:?}", rule.id(), result.messages);
    }
}

#[rstest]
#[case::msgbox("MsgBox, Done")]
#[case::nested_hotkey("#IfWinActive\n^s::\n  Send, ^s\n  Sleep, 50\n  ToolTip, Saved\nreturn")]
#[case::mixed("#NoEnv\nSetBatchLines, -1\nSoundGet, m, Master, Mute\nStringLen, n, m\nGosub, Foo")]
#[case::already_v2("#Requires AutoHotkey v2.0\nF1::MsgBox('ok')")]
fn sanitize_is_idempotent(#[case] source: &str) {
    let first = sanitize(&ScriptText::new(source)).unwrap();
    let second = sanitize(&first.text).unwrap();
    assert!(second.records.is_empty(), "{:#?}", second.records);
    assert_eq!(second.text, first.text);
}

// =============================================================================
// RENDERED OUTPUT
// =============================================================================

const LEGACY_SCRIPT: &str = "#NoEnv
^j::MsgBox, Hello World
F2::
{
    SoundSet, +1, , Mute
    Sleep, 100
}";

#[test]
fn legacy_script_text() {
    let out = sanitize(&ScriptText::new(LEGACY_SCRIPT)).unwrap();
    insta::assert_snapshot!(out.text.to_string(), @r"
    #Requires AutoHotkey v2.0
    ; #NoEnv (removed in v2)
    ^j::MsgBox('Hello World')
    F2::
    {
        SoundSetMute(-1)
        Sleep(100)
    }
    ");
}

#[test]
fn legacy_script_change_summary() {
    let out = sanitize(&ScriptText::new(LEGACY_SCRIPT)).unwrap();
    insta::assert_snapshot!(out.change_summary(), @r"
    line 2 [removed-directive]: #NoEnv -> ; #NoEnv (removed in v2)
    line 3 [msgbox-command]: ^j::MsgBox, Hello World -> ^j::MsgBox('Hello World')
    line 6 [sound-set-mute]: SoundSet, +1, , Mute -> SoundSetMute(-1)
    line 7 [sleep-command]: Sleep, 100 -> Sleep(100)
    ");
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn custom_rule_from_config_runs_first() {
    let config = Config::from_toml(
        r#"
[sanitize]
max_passes = 2

[[sanitize.rules]]
id = "send-mode-input"
pattern = '(?i)^(?P<lead>\s*)SendMode\s*,\s*Input\s*$'
replace = "${lead}SendMode('Input')"
hint = "quote the mode"
"#,
    )
    .unwrap();
    let sanitizer = Sanitizer::from_config(config.sanitize).unwrap();

    let out = sanitizer.sanitize(&ScriptText::new("SendMode, Input\nSendMode, Event"));
    assert_eq!(out.text.line(2), Some("SendMode('Input')"));
    assert_eq!(out.records[0].rule, "send-mode-input");

    // The built-in fallback still flags the form the custom rule skips.
    let warning = out.result.warnings().next().unwrap();
    assert_eq!(warning.rule, "legacy-command");
    assert_eq!(warning.line, 3);
}

#[test]
fn detect_only_custom_rule_warns() {
    let custom = CustomRule {
        id: "no-dllcall".into(),
        pattern: r"\bDllCall\(".into(),
        example: "DllCall(\"Sleep\", \"UInt\", 10)".into(),
        hint: "avoid raw DllCall in generated scripts".into(),
        replace: None,
    };
    let library = PatternLibrary::with_custom(&[custom]).unwrap();
    let sanitizer = Sanitizer::new(Arc::new(library), SanitizeConfig::default());

    let out = sanitizer.sanitize(&ScriptText::new("DllCall(\"Sleep\", \"UInt\", 10)"));
    assert!(out.is_valid());
    assert!(
        out.result
            .messages
            .iter()
            .any(|m| m.contains("no-dllcall") && m.contains("avoid raw DllCall"))
    );
}

// =============================================================================
// CACHE
// =============================================================================

#[test]
fn cache_tracks_file_modification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hotkeys.ahk");
    std::fs::write(&path, "F1::{\n").unwrap();

    let cache = ValidationCache::new();
    let check = |cache: &ValidationCache| {
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        cache.get_or_insert_with(&path, modified, || {
            let source = std::fs::read_to_string(&path).unwrap();
            sanitize(&ScriptText::new(&source)).unwrap().result
        })
    };

    let (first, cached) = check(&cache);
    assert!(!first.is_valid);
    assert!(!cached);

    let (again, cached) = check(&cache);
    assert!(cached);
    assert_eq!(again, first);

    // A put with a different timestamp replaces the entry.
    let stale = cache.entry(&path).unwrap().modified;
    let newer = stale + std::time::Duration::from_secs(5);
    cache.put(&path, newer, validate(&ScriptText::new("F1::{\n}\n")));
    assert!(cache.get(&path, stale).is_none());
    assert!(cache.get(&path, newer).unwrap().is_valid);
}
