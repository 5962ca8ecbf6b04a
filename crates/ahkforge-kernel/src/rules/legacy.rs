//! Legacy command parameters → v2 call arguments.
//!
//! v1 commands take comma-separated parameters whose text is literal unless
//! wrapped in `%var%` or forced into an expression with a leading `% `. v2
//! has only expressions, so every parameter has to be re-spelled: literal
//! text becomes a quoted string, `%var%` becomes the bare variable, and
//! forced expressions lose their `%` marker.
//!
//! None of this is a parser. Splitting and quoting are heuristics tuned for
//! the shapes generated scripts actually contain.

/// Escape character shared by v1 and v2.
const ESCAPE: char = '`';

/// How a single legacy parameter is re-spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Literal text (with optional `%var%` references) → string expression.
    Text,
    /// Numeric or expression parameter → expression, `%`s removed.
    Expr,
    /// Variable or function name → bare identifier.
    Var,
}

impl ArgKind {
    pub(crate) fn convert(self, param: &str) -> String {
        match self {
            ArgKind::Text => text_arg(param),
            ArgKind::Expr => expr_arg(param),
            ArgKind::Var => var_arg(param),
        }
    }
}

/// How a legacy parameter list maps onto call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// The whole remainder is one text parameter; commas are literal.
    Whole,
    /// Every parameter converts the same way.
    Each(ArgKind),
    /// Parameters convert by position; extras are treated as text.
    Positional(&'static [ArgKind]),
    /// `MsgBox`: v1 `Options, Title, Text[, Timeout]` or a single text.
    MsgBox,
    /// `TrayTip`: v1 `Title, Text[, Seconds, Options]` → v2 `Text, Title[, Options]`.
    TrayTip,
}

impl ArgShape {
    /// Convert raw parameter text into v2 arguments, trailing omissions dropped.
    pub(crate) fn render(&self, raw: &str) -> Vec<String> {
        let mut args = match self {
            ArgShape::Whole => whole_text(raw),
            ArgShape::Each(kind) => split_params(raw)
                .iter()
                .map(|param| kind.convert(param))
                .collect(),
            ArgShape::Positional(kinds) => split_params(raw)
                .iter()
                .enumerate()
                .map(|(idx, param)| kinds.get(idx).copied().unwrap_or(ArgKind::Text).convert(param))
                .collect(),
            ArgShape::MsgBox => msgbox_args(raw),
            ArgShape::TrayTip => traytip_args(raw),
        };

        while args.last().is_some_and(String::is_empty) {
            args.pop();
        }
        args
    }
}

fn whole_text(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![text_arg(trimmed)]
    }
}

fn msgbox_args(raw: &str) -> Vec<String> {
    let params = split_params(raw);
    if params.len() < 3 || !is_integer(&params[0]) {
        return whole_text(raw);
    }

    let options = match params.get(3).filter(|timeout| !timeout.is_empty()) {
        Some(timeout) => format!("'{} T{}'", params[0], timeout.trim_matches('%')),
        None => params[0].clone(),
    };
    vec![text_arg(&params[2]), text_arg(&params[1]), options]
}

fn traytip_args(raw: &str) -> Vec<String> {
    let params = split_params(raw);
    let Some(title) = params.first() else {
        return Vec::new();
    };

    let text = params.get(1).map(|t| text_arg(t)).unwrap_or_default();
    let mut args = vec![text, text_arg(title)];
    if let Some(options) = params.get(3).filter(|o| !o.is_empty()) {
        args.push(expr_arg(options));
    }
    args
}

/// Where the structure of a parameter string lies.
struct Layout {
    /// Byte offsets of top-level commas.
    commas: Vec<usize>,
    /// Byte offset where an inline comment (including its leading whitespace) starts.
    comment: Option<usize>,
}

/// Scan parameter text for top-level commas and an inline comment.
///
/// A quote only opens a string where an expression could start (after a
/// comma, `(`, `%`, `.`, `=` or at the beginning), so apostrophes inside
/// literal text such as `Don't` are left alone. A `;` starts a comment only
/// when it follows whitespace, as in v1.
fn layout(raw: &str) -> Layout {
    let mut commas = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    let mut prev_significant: Option<char> = None;

    for (idx, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
        } else if let Some(q) = quote {
            if ch == ESCAPE {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
        } else {
            match ch {
                ESCAPE => escaped = true,
                '"' | '\''
                    if matches!(prev_significant, None | Some(',' | '(' | '%' | '.' | '=' | ':')) =>
                {
                    quote = Some(ch);
                }
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => commas.push(idx),
                ';' if prev.is_some_and(char::is_whitespace) => {
                    let start = raw[..idx].trim_end().len();
                    return Layout {
                        commas,
                        comment: Some(start),
                    };
                }
                _ => {}
            }
        }

        prev = Some(ch);
        if !ch.is_whitespace() {
            prev_significant = Some(ch);
        }
    }

    Layout {
        commas,
        comment: None,
    }
}

/// Split `raw` into code and a trailing inline comment (with its leading whitespace).
pub(crate) fn split_inline_comment(raw: &str) -> (&str, &str) {
    match layout(raw).comment {
        Some(start) => raw.split_at(start),
        None => (raw, ""),
    }
}

/// Split parameter text on top-level commas. Each piece is trimmed and
/// trailing empty pieces are dropped.
pub(crate) fn split_params(raw: &str) -> Vec<String> {
    let layout = layout(raw);
    let end = layout.comment.unwrap_or(raw.len());

    let mut params = Vec::with_capacity(layout.commas.len() + 1);
    let mut start = 0;
    for comma in layout.commas.into_iter().filter(|&c| c < end) {
        params.push(raw[start..comma].trim().to_string());
        start = comma + 1;
    }
    params.push(raw[start..end].trim().to_string());

    while params.last().is_some_and(String::is_empty) {
        params.pop();
    }
    params
}

/// `% expr` forces expression mode in v1.
fn forced_expression(param: &str) -> Option<&str> {
    let rest = param.strip_prefix('%')?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

fn is_quoted(param: &str) -> bool {
    let mut chars = param.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('"' | '\'')), Some(last)) => first == last && param.len() >= 2,
        _ => false,
    }
}

fn is_integer(param: &str) -> bool {
    !param.is_empty() && param.chars().all(|c| c.is_ascii_digit())
}

fn is_number(param: &str) -> bool {
    let unsigned = param.strip_prefix(['+', '-']).unwrap_or(param);
    if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    match unsigned.split_once('.') {
        Some((whole, frac)) => is_integer(whole) && is_integer(frac),
        None => is_integer(unsigned),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Quote literal text as a v2 single-quoted string.
///
/// v1-only escapes (`` `, `` and `` `% ``) are unnecessary inside a v2 string
/// and are dropped. Embedded single quotes are escaped with a backtick, and a
/// dangling backtick at the end is doubled so it cannot eat the closing quote.
fn quote_literal(text: &str) -> String {
    let mut body = text
        .replace("`,", ",")
        .replace("`%", "%")
        .replace('\'', "`'");
    let dangling = body.chars().rev().take_while(|&ch| ch == ESCAPE).count();
    if dangling % 2 == 1 {
        body.push(ESCAPE);
    }
    format!("'{body}'")
}

/// Byte offset of the next `%` not preceded by the escape character.
fn find_unescaped_percent(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == '%' {
            return Some(idx);
        }
    }
    None
}

/// Literal text with `%var%` references → concatenated v2 expression.
pub(crate) fn text_arg(param: &str) -> String {
    let param = param.trim();
    if param.is_empty() {
        return String::new();
    }
    if let Some(expr) = forced_expression(param) {
        return expr.to_string();
    }
    if is_quoted(param) || is_number(param) {
        return param.to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut rest = param;

    while let Some(open) = find_unescaped_percent(rest) {
        let after = &rest[open + 1..];
        match after.find('%') {
            Some(close) if is_identifier(&after[..close]) => {
                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    parts.push(quote_literal(&literal));
                    literal.clear();
                }
                parts.push(after[..close].to_string());
                rest = &after[close + 1..];
            }
            _ => {
                literal.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(quote_literal(&literal));
    }

    parts.join(" ")
}

/// Expression parameter: `%var%` → `var`, `% expr` → `expr`.
pub(crate) fn expr_arg(param: &str) -> String {
    let param = param.trim();
    if let Some(expr) = forced_expression(param) {
        return expr.to_string();
    }
    match param.strip_prefix('%').and_then(|p| p.strip_suffix('%')) {
        Some(name) if is_identifier(name) => name.to_string(),
        _ => param.to_string(),
    }
}

/// Name parameter: surrounding `%` stripped.
pub(crate) fn var_arg(param: &str) -> String {
    param.trim().trim_matches('%').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_single_quoted() {
        assert_eq!(text_arg("Hello World"), "'Hello World'");
    }

    #[test]
    fn variables_are_concatenated() {
        assert_eq!(text_arg("Hello %name%!"), "'Hello ' name '!'");
        assert_eq!(text_arg("%name%"), "name");
    }

    #[test]
    fn forced_expression_drops_marker() {
        assert_eq!(text_arg("% \"a\" . b"), "\"a\" . b");
        assert_eq!(expr_arg("% delay * 2"), "delay * 2");
    }

    #[test]
    fn quoted_and_numeric_pass_through() {
        assert_eq!(text_arg("\"already quoted\""), "\"already quoted\"");
        assert_eq!(text_arg("'single'"), "'single'");
        assert_eq!(text_arg("100"), "100");
        assert_eq!(text_arg("-2.5"), "-2.5");
        assert_eq!(text_arg("0xFF"), "0xFF");
    }

    #[test]
    fn apostrophes_are_escaped() {
        assert_eq!(text_arg("Don't panic"), "'Don`'t panic'");
    }

    #[test]
    fn v1_escapes_are_unwrapped() {
        assert_eq!(text_arg("a`, b"), "'a, b'");
        assert_eq!(text_arg("100`%"), "'100%'");
    }

    #[test]
    fn lone_percent_stays_literal() {
        assert_eq!(text_arg("50% off"), "'50% off'");
    }

    #[test]
    fn split_respects_quotes_parens_and_escapes() {
        assert_eq!(split_params(" a, \"b, c\", d"), vec!["a", "\"b, c\"", "d"]);
        assert_eq!(split_params(" % Func(1, 2), x"), vec!["% Func(1, 2)", "x"]);
        assert_eq!(split_params(" list, `,"), vec!["list", "`,"]);
    }

    #[test]
    fn split_keeps_middle_omissions_and_drops_trailing() {
        assert_eq!(split_params(" notepad.exe, , Max"), vec!["notepad.exe", "", "Max"]);
        assert_eq!(split_params(" a, b, ,"), vec!["a", "b"]);
    }

    #[test]
    fn apostrophe_in_text_does_not_open_string() {
        assert_eq!(split_params(" Don't, stop"), vec!["Don't", "stop"]);
    }

    #[test]
    fn inline_comment_is_split_off() {
        assert_eq!(split_inline_comment(" ^c ; copy"), (" ^c", " ; copy"));
        assert_eq!(split_inline_comment(" a;b"), (" a;b", ""));
        assert_eq!(split_inline_comment(" a `; b"), (" a `; b", ""));
    }

    #[test]
    fn msgbox_single_text_keeps_commas() {
        assert_eq!(ArgShape::MsgBox.render(" Hello, World"), vec!["'Hello, World'"]);
    }

    #[test]
    fn msgbox_options_form_is_reordered() {
        assert_eq!(
            ArgShape::MsgBox.render(" 4, Confirm, Continue?"),
            vec!["'Continue?'", "'Confirm'", "4"]
        );
        assert_eq!(
            ArgShape::MsgBox.render(" 64, Info, Done, 5"),
            vec!["'Done'", "'Info'", "'64 T5'"]
        );
    }

    #[test]
    fn traytip_swaps_title_and_text() {
        assert_eq!(
            ArgShape::TrayTip.render(" Reminder, Stand up"),
            vec!["'Stand up'", "'Reminder'"]
        );
        assert_eq!(
            ArgShape::TrayTip.render(" Title, Body, 10, 1"),
            vec!["'Body'", "'Title'", "1"]
        );
    }

    #[test]
    fn positional_kinds_apply_in_order() {
        const SHAPE: ArgShape = ArgShape::Positional(&[ArgKind::Var, ArgKind::Text]);
        assert_eq!(SHAPE.render(" CheckWindow, 1000"), vec!["CheckWindow", "1000"]);
        assert_eq!(SHAPE.render(" %fn%, Off"), vec!["fn", "'Off'"]);
    }

    #[test]
    fn empty_parameters_render_nothing() {
        assert!(ArgShape::Whole.render("  ").is_empty());
        assert!(ArgShape::Each(ArgKind::Text).render("").is_empty());
    }
}
