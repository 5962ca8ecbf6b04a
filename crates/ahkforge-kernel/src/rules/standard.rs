//! The built-in rule table.
//!
//! Order matters. Within a family the exact forms come first (`SoundSet, +1,
//! , Mute`) and the catch-all detect-only rule for the family comes last, so
//! anything the exact forms convert is gone before the fallback looks.

use super::{ArgKind, ArgShape, RuleDef, Rewrite};

/// Command position: optional indentation and an optional hotkey or
/// hotstring label (`^j::`), captured as `lead` so rewrites can keep it.
macro_rules! command {
    ($body:literal) => {
        concat!(r#"(?i)^(?P<lead>\s*(?:[^\s;'"(]+?::\s*)?)"#, $body)
    };
}

const REPLACE_ARGS: &[ArgKind] = &[ArgKind::Var, ArgKind::Text, ArgKind::Text];
const SPLIT_ARGS: &[ArgKind] = &[ArgKind::Var, ArgKind::Text, ArgKind::Text];
const LEN_ARGS: &[ArgKind] = &[ArgKind::Var];
const PARSE_ARGS: &[ArgKind] = &[ArgKind::Var, ArgKind::Text, ArgKind::Text];
const TIMER_ARGS: &[ArgKind] = &[ArgKind::Var, ArgKind::Text];

/// Every built-in rule, in evaluation order.
pub fn standard_rules() -> Vec<RuleDef> {
    vec![
        // Directives
        RuleDef::convert(
            "requires-v1",
            r"(?i)^(?P<lead>\s*)#Requires\s+AutoHotkey\s+v1[\w.]*(?P<rest>.*)$",
            "#Requires AutoHotkey v1.1",
            "target v2 with #Requires AutoHotkey v2.0",
            Rewrite::template("${lead}#Requires AutoHotkey v2.0${rest}"),
        ),
        RuleDef::convert(
            "removed-directive",
            r"(?i)^(?P<lead>\s*)(?P<directive>#(?:NoEnv|CommentFlag|Delimiter|DerefChar|EscapeChar|MaxMem|AllowSameLineComments))\b(?P<rest>.*)$",
            "#NoEnv",
            "this directive does not exist in v2; delete it",
            Rewrite::template("${lead}; ${directive}${rest} (removed in v2)"),
        ),
        RuleDef::convert(
            "removed-command",
            command!(r"(?P<stmt>SetBatchLines\b.*)$"),
            "SetBatchLines, -1",
            "v2 always runs at full speed; delete SetBatchLines",
            Rewrite::CommentOut,
        ),
        // Sound
        RuleDef::convert(
            "sound-set-mute",
            command!(r"SoundSet\s*,\s*\+1\s*,\s*(?:Master)?\s*,\s*(?:Mute|Toggle)\b.*$"),
            "SoundSet, +1, , Mute",
            "toggle mute with SoundSetMute(-1)",
            Rewrite::template("${lead}SoundSetMute(-1)"),
        ),
        RuleDef::convert(
            "sound-set-mute-state",
            command!(r"SoundSet\s*,\s*(?P<state>[01])\s*,\s*(?:Master)?\s*,\s*Mute\b.*$"),
            "SoundSet, 1, , Mute",
            "set mute with SoundSetMute(1) or SoundSetMute(0)",
            Rewrite::template("${lead}SoundSetMute(${state})"),
        ),
        RuleDef::convert(
            "sound-get-mute",
            command!(r"SoundGet\s*,\s*(?P<out>\w+)\s*,\s*(?:Master)?\s*,\s*Mute\b.*$"),
            "SoundGet, muted, Master, Mute",
            "read mute state with var := SoundGetMute()",
            Rewrite::template("${lead}${out} := SoundGetMute()"),
        ),
        RuleDef::convert(
            "sound-get-volume",
            command!(r"SoundGet\s*,\s*(?P<out>\w+)\s*(?:,\s*(?:Master)?\s*(?:,\s*Volume)?\s*)?$"),
            "SoundGet, level, Master, Volume",
            "read volume with var := SoundGetVolume()",
            Rewrite::template("${lead}${out} := SoundGetVolume()"),
        ),
        RuleDef::convert(
            "sound-set-volume-relative",
            command!(r"SoundSet\s*,\s*(?P<value>[+-]\d+(?:\.\d+)?)\s*(?:,\s*(?:Master)?\s*(?:,\s*Volume)?\s*)?$"),
            "SoundSet, +10",
            "relative volume changes pass a signed string: SoundSetVolume('+10')",
            Rewrite::template("${lead}SoundSetVolume('${value}')"),
        ),
        RuleDef::convert(
            "sound-set-volume",
            command!(r"SoundSet\s*,\s*(?P<value>\d+(?:\.\d+)?)\s*(?:,\s*(?:Master)?\s*(?:,\s*Volume)?\s*)?$"),
            "SoundSet, 50",
            "set volume with SoundSetVolume(percent)",
            Rewrite::template("${lead}SoundSetVolume(${value})"),
        ),
        // Strings
        RuleDef::convert(
            "string-replace-all",
            command!(r"StringReplace\s*,\s*(?P<out>\w+)\s*,(?P<args>.*?),\s*(?:All|A|1)\s*$"),
            "StringReplace, clean, raw, foo, bar, All",
            "use out := StrReplace(haystack, needle, replacement)",
            Rewrite::call("StrReplace", ArgShape::Positional(REPLACE_ARGS)),
        ),
        RuleDef::convert(
            "string-split",
            command!(r"StringSplit\s*,\s*(?P<out>\w+)\s*,(?P<args>.*)$"),
            "StringSplit, parts, line, |",
            "use arr := StrSplit(text, delimiters); arrays replace pseudo-arrays",
            Rewrite::call("StrSplit", ArgShape::Positional(SPLIT_ARGS)),
        ),
        RuleDef::convert(
            "string-len",
            command!(r"StringLen\s*,\s*(?P<out>\w+)\s*,(?P<args>.*)$"),
            "StringLen, length, name",
            "use n := StrLen(text)",
            Rewrite::call("StrLen", ArgShape::Positional(LEN_ARGS)),
        ),
        // Loops
        RuleDef::convert(
            "loop-parse",
            command!(r"Loop\s*,\s*Parse\s*,(?P<args>.*)$"),
            "Loop, Parse, list, |",
            "write Loop Parse var, delimiters",
            Rewrite::statement("Loop Parse", ArgShape::Positional(PARSE_ARGS)),
        ),
        RuleDef::convert(
            "loop-files",
            command!(r"Loop\s*,\s*Files\s*,(?P<args>.*)$"),
            "Loop, Files, C:\\logs\\*.txt",
            "write Loop Files pattern, mode",
            Rewrite::statement("Loop Files", ArgShape::Each(ArgKind::Text)),
        ),
        RuleDef::convert(
            "loop-read",
            command!(r"Loop\s*,\s*Read\s*,(?P<args>.*)$"),
            "Loop, Read, input.txt",
            "write Loop Read input, output",
            Rewrite::statement("Loop Read", ArgShape::Each(ArgKind::Text)),
        ),
        // Comma commands with a direct function form
        RuleDef::convert(
            "msgbox-command",
            command!(r"MsgBox\s*,(?P<args>.*)$"),
            "MsgBox, Hello World",
            "call MsgBox(text, title, options)",
            Rewrite::call("MsgBox", ArgShape::MsgBox),
        ),
        RuleDef::convert(
            "traytip-command",
            command!(r"TrayTip\s*,(?P<args>.*)$"),
            "TrayTip, Reminder, Stand up",
            "call TrayTip(text, title, options); text comes first in v2",
            Rewrite::call("TrayTip", ArgShape::TrayTip),
        ),
        RuleDef::convert(
            "send-command",
            command!(r"(?P<cmd>Send|SendInput|SendEvent|SendPlay)\s*,(?P<args>.*)$"),
            "Send, {Escape}",
            "call Send('keys') with the keys quoted",
            Rewrite::same_name(ArgShape::Whole),
        ),
        RuleDef::convert(
            "sleep-command",
            command!(r"Sleep\s*,(?P<args>.*)$"),
            "Sleep, 100",
            "call Sleep(ms)",
            Rewrite::call("Sleep", ArgShape::Each(ArgKind::Expr)),
        ),
        RuleDef::convert(
            "run-command",
            command!(r"(?P<cmd>Run|RunWait)\s*,(?P<args>.*)$"),
            "Run, notepad.exe",
            "call Run('target') with the target quoted",
            Rewrite::same_name(ArgShape::Each(ArgKind::Text)),
        ),
        RuleDef::convert(
            "click-command",
            command!(r"Click\s*,(?P<args>.*)$"),
            "Click, 100, 200",
            "call Click(x, y)",
            Rewrite::call("Click", ArgShape::Each(ArgKind::Text)),
        ),
        RuleDef::convert(
            "window-command",
            command!(r"(?P<cmd>WinActivate|WinClose|WinMinimize|WinMaximize|WinRestore|WinHide|WinShow|WinKill|WinWaitActive|WinWaitClose|WinWait)\s*,(?P<args>.*)$"),
            "WinActivate, Untitled - Notepad",
            "call the window function with a quoted WinTitle",
            Rewrite::same_name(ArgShape::Each(ArgKind::Text)),
        ),
        RuleDef::convert(
            "tooltip-command",
            command!(r"ToolTip\s*,(?P<args>.*)$"),
            "ToolTip, Saved",
            "call ToolTip(text, x, y)",
            Rewrite::call("ToolTip", ArgShape::Each(ArgKind::Text)),
        ),
        RuleDef::convert(
            "set-timer-off",
            command!(r"SetTimer\s*,\s*(?P<target>\w+)\s*,\s*(?:Off|Delete)\s*(?P<comment>\s;.*)?$"),
            "SetTimer, CheckWindow, Off",
            "stop a timer with SetTimer(function, 0)",
            Rewrite::template("${lead}SetTimer(${target}, 0)${comment}"),
        ),
        RuleDef::convert(
            "set-timer-on",
            command!(r"SetTimer\s*,\s*(?P<target>\w+)\s*,\s*On\s*(?P<comment>\s;.*)?$"),
            "SetTimer, CheckWindow, On",
            "resume a timer with SetTimer(function); the old period is kept",
            Rewrite::template("${lead}SetTimer(${target})${comment}"),
        ),
        RuleDef::convert(
            "set-timer-command",
            command!(r"SetTimer\s*,(?P<args>.*)$"),
            "SetTimer, CheckWindow, 1000",
            "call SetTimer(function, period) with a function reference",
            Rewrite::call("SetTimer", ArgShape::Positional(TIMER_ARGS)),
        ),
        RuleDef::convert(
            "file-append-command",
            command!(r"FileAppend\s*,(?P<args>.*)$"),
            "FileAppend, %line%, log.txt",
            "call FileAppend(text, filename)",
            Rewrite::call("FileAppend", ArgShape::Each(ArgKind::Text)),
        ),
        // Legacy forms without a mechanical rewrite
        RuleDef::detect(
            "sound-command",
            command!(r"Sound(?:Set|Get)\s*,.*$"),
            "SoundSet, 1, Wave, Mute",
            "v2 splits SoundSet/SoundGet into SoundSetVolume, SoundSetMute and friends with component and device arguments",
        ),
        RuleDef::detect(
            "string-command",
            command!(r"String(?:Replace|Split|Len|Left|Right|Mid|TrimLeft|TrimRight|GetPos|Lower|Upper)\s*,.*$"),
            "StringLeft, prefix, name, 3",
            "use SubStr, InStr, StrReplace, StrLower or StrUpper",
        ),
        RuleDef::detect(
            "if-win-command",
            command!(r"IfWin(?:Not)?(?:Active|Exist)\b.*$"),
            "IfWinActive, ahk_class Notepad",
            "use if WinActive(...) or if WinExist(...)",
        ),
        RuleDef::detect(
            "if-command",
            command!(r"If(?:Equal|NotEqual|Less|LessOrEqual|Greater|GreaterOrEqual|InString|NotInString|Exist|NotExist|MsgBox)\b.*$"),
            "IfEqual, count, 10",
            "use an if expression: if (count = 10)",
        ),
        RuleDef::detect(
            "win-move-command",
            command!(r"WinMove\s*,.*$"),
            "WinMove, A, , 0, 0",
            "WinMove takes X, Y, Width, Height before WinTitle in v2",
        ),
        RuleDef::detect(
            "file-select-command",
            command!(r"FileSelect(?:File|Folder)\s*,.*$"),
            "FileSelectFile, chosen",
            "use chosen := FileSelect(options, root, title, filter) or DirSelect",
        ),
        RuleDef::detect(
            "transform-command",
            command!(r"Transform\s*,.*$"),
            "Transform, result, Abs, -5",
            "Transform is gone; use the matching function such as Abs() or Chr()",
        ),
        RuleDef::detect(
            "set-format-command",
            command!(r"SetFormat\s*,.*$"),
            "SetFormat, Float, 0.2",
            "SetFormat is gone; use Format() where output is produced",
        ),
        RuleDef::detect(
            "gosub-command",
            command!(r"Gosub\b.*$"),
            "Gosub, ShowMenu",
            "turn the label into a function and call it",
        ),
        RuleDef::detect(
            "gui-command",
            command!(r"Gui\s*,.*$"),
            "Gui, Add, Text,, Hello",
            "use the Gui object: g := Gui(), g.Add('Text',, 'Hello')",
        ),
        RuleDef::detect(
            "legacy-command",
            command!(r"(?:ControlSend|ControlClick|ControlGetText|ControlSetText|WinGetTitle|WinGetClass|WinGetPos|WinSet|FileRead|FileDelete|FileCopy|FileMove|FileCreateDir|FileRemoveDir|RegRead|RegWrite|RegDelete|EnvGet|EnvSet|FormatTime|InputBox|Menu|PixelGetColor|PixelSearch|ImageSearch|KeyWait|Process|Random|SetTitleMatchMode|SetKeyDelay|SetMouseDelay|SendRaw|SendMode|CoordMode|DetectHiddenWindows|Hotkey|GuiControl|SplitPath|GetKeyState|MouseMove|MouseClick|MouseGetPos|Input)\s*,.*$"),
            "FileRead, contents, notes.txt",
            "call the v2 function form; output variables become return values",
        ),
        RuleDef::detect(
            "legacy-assignment",
            r"(?i)^\s*(?P<out>[A-Za-z_]\w*)\s*=[^=].*$",
            "greeting = Hello there",
            "use := with a quoted string: greeting := 'Hello there'",
        ),
        // v1 names called like functions, anywhere on the line
        RuleDef::detect(
            "sound-set-function",
            r"(?i)\bSoundSet\s*\(",
            "SoundSet(50)",
            "SoundSet does not exist in v2; call SoundSetVolume or SoundSetMute",
        ),
        RuleDef::detect(
            "sound-get-function",
            r"(?i)\bSoundGet\s*\(",
            "m := SoundGet('Mute')",
            "SoundGet does not exist in v2; call SoundGetVolume or SoundGetMute",
        ),
        RuleDef::detect(
            "string-function",
            r"(?i)\bString(?:Replace|Split|Len|Left|Right|Mid|TrimLeft|TrimRight|GetPos|Lower|Upper)\s*\(",
            "x := StringLen(s)",
            "use the v2 names: StrLen, StrReplace, StrSplit, SubStr, InStr, StrLower or StrUpper",
        ),
        RuleDef::detect(
            "sound-get-mute-args",
            r"(?i)\bSoundGetMute\s*\(\s*[^)\s]",
            "m := SoundGetMute(1)",
            "SoundGetMute() takes no parameters; call it with empty parens",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PatternLibrary;
    use rstest::rstest;

    #[test]
    fn every_example_matches_its_rule() {
        let lib = PatternLibrary::standard().unwrap();
        for rule in lib.rules() {
            assert!(
                rule.pattern().is_match(rule.example()),
                "{} does not match its example {:?}",
                rule.id(),
                rule.example()
            );
        }
    }

    #[test]
    fn hotkey_label_is_command_position() {
        let lib = PatternLibrary::standard().unwrap();
        let rule = lib.get("msgbox-command").unwrap();
        let caps = rule.pattern().captures("^j::MsgBox, Hello").unwrap();
        assert_eq!(&caps["lead"], "^j::");
    }

    #[test]
    fn v2_calls_are_not_command_position() {
        let lib = PatternLibrary::standard().unwrap();
        for line in [
            "MsgBox('Hello')",
            "Send('{Escape}')",
            "x := StrLen(name)",
            "Loop Parse list, '|'",
            "SoundSetVolume(50)",
            "SoundSetMute(-1)",
            "muted := SoundGetMute()",
            "level := SoundGetVolume()",
            "clean := StrReplace(raw, 'foo', 'bar')",
            "SetTimer(CheckWindow, 0)",
            "^j:: ; SetBatchLines, -1 (removed in v2)",
            "if (x == 1)",
        ] {
            let hits: Vec<_> = lib
                .rules()
                .iter()
                .filter(|rule| rule.pattern().is_match(line))
                .map(|rule| rule.id())
                .collect();
            assert!(hits.is_empty(), "{line:?} matched {hits:?}");
        }
    }

    #[test]
    fn rule_table_has_expected_order_anchors() {
        let ids: Vec<_> = standard_rules().into_iter().map(|def| def.id).collect();
        let pos = |id: &str| ids.iter().position(|i| i == id).unwrap();

        assert!(pos("sound-set-mute") < pos("sound-command"));
        assert!(pos("string-replace-all") < pos("string-command"));
        assert!(pos("window-command") < pos("legacy-command"));
        assert!(pos("set-timer-off") < pos("set-timer-command"));
        assert!(pos("legacy-assignment") < pos("sound-set-function"));
        assert_eq!(ids.last().unwrap(), "sound-get-mute-args");
    }

    #[rstest]
    #[case::sound_set("SoundSet(50)", "sound-set-function")]
    #[case::sound_get("m := SoundGet('Mute')", "sound-get-function")]
    #[case::string_len("x := StringLen(s)", "string-function")]
    #[case::string_in_hotkey("^k::Clipboard := StringReplace(Clipboard, 'a', 'b')", "string-function")]
    #[case::mute_with_args("m := SoundGetMute(1)", "sound-get-mute-args")]
    fn function_style_v1_names_are_flagged(#[case] line: &str, #[case] id: &str) {
        let lib = PatternLibrary::standard().unwrap();
        let hits: Vec<_> = lib
            .rules()
            .iter()
            .filter(|rule| rule.pattern().is_match(line))
            .map(|rule| rule.id())
            .collect();
        assert_eq!(hits, vec![id]);
    }
}
