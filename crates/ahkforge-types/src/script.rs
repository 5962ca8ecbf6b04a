//! ScriptText: an ordered, immutable sequence of script lines.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Script source split into lines.
///
/// Stages never mutate a `ScriptText`; they build a new one with
/// [`ScriptText::with_lines`] or [`ScriptText::prepend`]. Lines never carry
/// their terminator or a byte order mark. Both are remembered, along with a
/// trailing newline, so `to_string()` gives back the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ScriptText {
    lines: Vec<String>,
    #[serde(default)]
    trailing_newline: bool,
    #[serde(default)]
    crlf: bool,
    #[serde(default)]
    bom: bool,
}

const BOM: char = '\u{feff}';

impl ScriptText {
    /// Split source text into lines.
    pub fn new(source: &str) -> Self {
        let (bom, source) = match source.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        if source.is_empty() {
            return Self {
                bom,
                ..Self::default()
            };
        }

        // The first terminator decides the style for the whole file.
        let crlf = source
            .find('\n')
            .is_some_and(|idx| source[..idx].ends_with('\r'));
        let trailing_newline = source.ends_with('\n');
        let body = source.strip_suffix('\n').unwrap_or(source);
        let lines = body
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();

        Self {
            lines,
            trailing_newline,
            crlf,
            bom,
        }
    }

    /// Build from already-split lines, without a trailing newline.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// All lines, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Line by 1-based number.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Iterate `(line_number, text)` pairs with 1-based numbering.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.as_str()))
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when there are no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when every line is whitespace (or there are none).
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// Whether the source ended with a newline.
    pub fn has_trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    /// Whether lines end in `\r\n`.
    pub fn is_crlf(&self) -> bool {
        self.crlf
    }

    /// Whether the source started with a UTF-8 byte order mark.
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// A new script with the same shape (terminators, BOM) but different lines.
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: self.trailing_newline,
            crlf: self.crlf,
            bom: self.bom,
        }
    }

    /// A new script with `header` lines in front of the existing ones.
    pub fn prepend<S: AsRef<str>>(&self, header: &[S]) -> Self {
        let lines = header
            .iter()
            .map(|line| line.as_ref().to_string())
            .chain(self.lines.iter().cloned())
            .collect();
        self.with_lines(lines)
    }
}

impl fmt::Display for ScriptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eol = if self.crlf { "\r\n" } else { "\n" };
        if self.bom {
            f.write_char(BOM)?;
        }
        f.write_str(&self.lines.join(eol))?;
        if self.trailing_newline && !self.lines.is_empty() {
            f.write_str(eol)?;
        }
        Ok(())
    }
}

impl From<&str> for ScriptText {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for ScriptText {
    fn from(source: String) -> Self {
        Self::new(&source)
    }
}
