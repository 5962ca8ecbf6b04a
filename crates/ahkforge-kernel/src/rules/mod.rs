//! Pattern library: the legacy-syntax rules.
//!
//! A rule is a regex plus an action. Detection runs every rule; conversion
//! runs the ones that know how to rewrite what they match. The library is
//! ordered and that order is load-bearing: custom rules come first, then the
//! standard table, which lists specific forms before the broad fallbacks
//! that catch whatever the specific forms could not convert.
//!
//! Rules are declared as [`RuleDef`]s and compiled into a [`PatternLibrary`].
//! Compilation checks that patterns parse, that ids are unique, and that
//! every rewrite has the capture groups it reads.

mod legacy;
mod standard;

use std::borrow::Cow;
use std::collections::HashSet;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

pub use legacy::{ArgKind, ArgShape};
pub use standard::standard_rules;

/// How a convertible rule produces its replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// A regex replacement template (`$name` / `${name}` references).
    Template(Cow<'static, str>),

    /// `[out := ]Function(args)`, preserving the `lead` group (indentation
    /// and hotkey label) and any inline comment after the arguments.
    ///
    /// `function: None` reuses the matched `cmd` group as the function name.
    Call {
        function: Option<&'static str>,
        shape: ArgShape,
    },

    /// A control-flow statement such as `Loop Parse var, ','`.
    Statement { head: &'static str, shape: ArgShape },

    /// `; <stmt> (removed in v2)`, keeping `lead`. After a hotkey label the
    /// comment gets a separating space, since `;` only starts a comment at
    /// the start of a line or after whitespace.
    CommentOut,
}

impl Rewrite {
    pub fn template(template: impl Into<Cow<'static, str>>) -> Self {
        Rewrite::Template(template.into())
    }

    pub fn call(function: &'static str, shape: ArgShape) -> Self {
        Rewrite::Call {
            function: Some(function),
            shape,
        }
    }

    /// A call named by whatever the `cmd` group matched.
    pub fn same_name(shape: ArgShape) -> Self {
        Rewrite::Call {
            function: None,
            shape,
        }
    }

    pub fn statement(head: &'static str, shape: ArgShape) -> Self {
        Rewrite::Statement { head, shape }
    }

    fn required_groups(&self) -> &'static [&'static str] {
        match self {
            Rewrite::Template(_) => &[],
            Rewrite::CommentOut => &["lead", "stmt"],
            Rewrite::Call { function: None, .. } => &["lead", "cmd", "args"],
            Rewrite::Call { .. } | Rewrite::Statement { .. } => &["lead", "args"],
        }
    }

    /// Text that replaces the whole match.
    pub(crate) fn apply(&self, caps: &Captures<'_>) -> String {
        match self {
            Rewrite::Template(template) => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                out
            }
            Rewrite::Call { function, shape } => {
                let lead = group(caps, "lead");
                let name = match *function {
                    Some(name) => name,
                    None => group(caps, "cmd"),
                };
                let (code, comment) = legacy::split_inline_comment(group(caps, "args"));
                let args = shape.render(code).join(", ");
                let assign = caps
                    .name("out")
                    .map(|out| format!("{} := ", out.as_str()))
                    .unwrap_or_default();
                format!("{lead}{assign}{name}({args}){comment}")
            }
            Rewrite::Statement { head, shape } => {
                let lead = group(caps, "lead");
                let (code, comment) = legacy::split_inline_comment(group(caps, "args"));
                let (code, brace) = split_open_brace(code);
                let args = shape.render(code).join(", ");
                if args.is_empty() {
                    format!("{lead}{head}{brace}{comment}")
                } else {
                    format!("{lead}{head} {args}{brace}{comment}")
                }
            }
            Rewrite::CommentOut => {
                let lead = group(caps, "lead");
                let gap = if lead.is_empty() || lead.ends_with(char::is_whitespace) {
                    ""
                } else {
                    " "
                };
                format!("{lead}{gap}; {} (removed in v2)", group(caps, "stmt"))
            }
        }
    }
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}

/// Peel a same-line opening brace off a statement's parameters.
fn split_open_brace(code: &str) -> (&str, &'static str) {
    let trimmed = code.trim_end();
    match trimmed.strip_suffix('{') {
        Some(rest) if rest.is_empty() || rest.ends_with(char::is_whitespace) => (rest, " {"),
        _ => (code, ""),
    }
}

/// What a rule does with its matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Report only; there is no reliable mechanical rewrite.
    DetectOnly,
    /// Report and rewrite.
    Replace(Rewrite),
}

/// Declaration of a rule before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub id: Cow<'static, str>,
    pub pattern: Cow<'static, str>,
    /// A legacy line this rule must match.
    pub example: Cow<'static, str>,
    /// Advice for a human when the match survives conversion.
    pub hint: Cow<'static, str>,
    pub action: RuleAction,
}

impl RuleDef {
    pub fn convert(
        id: impl Into<Cow<'static, str>>,
        pattern: impl Into<Cow<'static, str>>,
        example: impl Into<Cow<'static, str>>,
        hint: impl Into<Cow<'static, str>>,
        rewrite: Rewrite,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            example: example.into(),
            hint: hint.into(),
            action: RuleAction::Replace(rewrite),
        }
    }

    pub fn detect(
        id: impl Into<Cow<'static, str>>,
        pattern: impl Into<Cow<'static, str>>,
        example: impl Into<Cow<'static, str>>,
        hint: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            example: example.into(),
            hint: hint.into(),
            action: RuleAction::DetectOnly,
        }
    }

    /// Compile the pattern and check the rewrite's capture groups.
    pub fn compile(self) -> Result<Rule, RuleError> {
        let pattern = Regex::new(&self.pattern).map_err(|source| RuleError::InvalidPattern {
            id: self.id.to_string(),
            source,
        })?;

        if let RuleAction::Replace(rewrite) = &self.action {
            for &required in rewrite.required_groups() {
                if !pattern.capture_names().flatten().any(|name| name == required) {
                    return Err(RuleError::MissingGroup {
                        id: self.id.to_string(),
                        group: required,
                    });
                }
            }
        }

        Ok(Rule {
            id: self.id.into_owned(),
            pattern,
            example: self.example.into_owned(),
            hint: self.hint.into_owned(),
            action: self.action,
        })
    }
}

/// A user-defined rule loaded from configuration.
///
/// With `replace` set, the rule rewrites its match using a regex replacement
/// template; without it, the rule only detects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: String,
    pub pattern: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub replace: Option<String>,
}

impl From<&CustomRule> for RuleDef {
    fn from(custom: &CustomRule) -> Self {
        let action = match &custom.replace {
            Some(template) => RuleAction::Replace(Rewrite::template(template.clone())),
            None => RuleAction::DetectOnly,
        };
        Self {
            id: custom.id.clone().into(),
            pattern: custom.pattern.clone().into(),
            example: custom.example.clone().into(),
            hint: custom.hint.clone().into(),
            action,
        }
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    pattern: Regex,
    example: String,
    hint: String,
    action: RuleAction,
}

impl Rule {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn action(&self) -> &RuleAction {
        &self.action
    }

    pub fn is_convertible(&self) -> bool {
        matches!(self.action, RuleAction::Replace(_))
    }
}

/// Ordered, immutable collection of compiled rules.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    rules: Vec<Rule>,
}

impl PatternLibrary {
    /// The built-in rule table.
    pub fn standard() -> Result<Self, RuleError> {
        Self::from_defs(standard_rules())
    }

    /// Custom rules ahead of the built-in table.
    pub fn with_custom(custom: &[CustomRule]) -> Result<Self, RuleError> {
        Self::from_defs(custom.iter().map(RuleDef::from).chain(standard_rules()))
    }

    /// Compile definitions in order. Ids must be unique.
    pub fn from_defs(defs: impl IntoIterator<Item = RuleDef>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::new();

        for def in defs {
            if !seen.insert(def.id.clone()) {
                return Err(RuleError::DuplicateId(def.id.into_owned()));
            }
            rules.push(def.compile()?);
        }

        Ok(Self { rules })
    }

    /// All rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Hint for a rule id, empty when unknown.
    pub fn hint(&self, id: &str) -> &str {
        self.get(id).map_or("", Rule::hint)
    }

    pub fn convertible(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.is_convertible())
    }

    pub fn detect_only(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| !rule.is_convertible())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> PatternLibrary {
        PatternLibrary::standard().expect("standard rules compile")
    }

    #[test]
    fn standard_ids_are_unique() {
        let lib = library();
        let ids: HashSet<_> = lib.rules().iter().map(Rule::id).collect();
        assert_eq!(ids.len(), lib.len());
    }

    #[test]
    fn every_rule_has_example_and_hint() {
        for rule in library().rules() {
            assert!(!rule.example().is_empty(), "{} has no example", rule.id());
            assert!(!rule.hint().is_empty(), "{} has no hint", rule.id());
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let def = RuleDef::detect("dup", "x", "x", "hint");
        let err = PatternLibrary::from_defs([def.clone(), def]).unwrap_err();
        assert!(matches!(err, RuleError::DuplicateId(id) if id == "dup"));
    }

    #[test]
    fn invalid_pattern_names_rule() {
        let err = PatternLibrary::from_defs([RuleDef::detect("broken", "(", "", "")]).unwrap_err();
        assert!(err.to_string().starts_with("rule 'broken': invalid pattern"));
    }

    #[test]
    fn call_rewrite_requires_groups() {
        let def = RuleDef::convert(
            "no-args",
            r"^MsgBox,",
            "MsgBox,",
            "hint",
            Rewrite::call("MsgBox", ArgShape::Whole),
        );
        let err = def.compile().unwrap_err();
        assert!(matches!(err, RuleError::MissingGroup { group: "lead", .. }));
    }

    #[test]
    fn custom_rules_come_first() {
        let custom = CustomRule {
            id: "my-rule".into(),
            pattern: r"^\s*Foo\b".into(),
            example: "Foo".into(),
            hint: "rename Foo".into(),
            replace: Some("Bar".into()),
        };
        let lib = PatternLibrary::with_custom(&[custom]).unwrap();
        assert_eq!(lib.rules()[0].id(), "my-rule");
        assert!(lib.rules()[0].is_convertible());
        assert_eq!(lib.len(), library().len() + 1);
    }

    #[test]
    fn custom_rule_cannot_shadow_builtin_id() {
        let custom = CustomRule {
            id: "msgbox-command".into(),
            pattern: "x".into(),
            example: String::new(),
            hint: String::new(),
            replace: None,
        };
        assert!(PatternLibrary::with_custom(&[custom]).is_err());
    }

    #[test]
    fn statement_keeps_open_brace() {
        assert_eq!(split_open_brace(" list, | {"), (" list, | ", " {"));
        assert_eq!(split_open_brace(" a{"), (" a{", ""));
    }
}
