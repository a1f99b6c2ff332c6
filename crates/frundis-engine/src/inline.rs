//! Turning inline atoms into plain text.

use frundis_parser::ast::{ArgRef, Inline};
use std::collections::HashMap;

/// Problems found while interpolating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineIssue {
    UndefinedVariable(String),
    /// A parameter escape outside of a user macro body, in source form.
    StrayParameter(String),
}

impl InlineIssue {
    pub fn message(&self) -> String {
        match self {
            InlineIssue::UndefinedVariable(name) => format!("undefined variable `{name}`"),
            InlineIssue::StrayParameter(escape) => {
                format!("`{escape}` outside of a user macro definition")
            }
        }
    }
}

/// Interpolate inline atoms: escapes become their substitution, variables
/// their value (`.#dv` definitions first, then the environment). Undefined
/// variables and stray parameters expand to nothing.
pub fn interpolate(
    inlines: &[Inline],
    vars: &HashMap<String, String>,
) -> (String, Vec<InlineIssue>) {
    let mut text = String::new();
    let mut issues = Vec::new();
    for inline in inlines {
        match inline {
            Inline::Text(s) => text.push_str(s),
            Inline::Escape(code) => text.push_str(code.substitution()),
            Inline::VarEscape(name) => match lookup_var(name, vars) {
                Some(value) => text.push_str(&value),
                None => issues.push(InlineIssue::UndefinedVariable(name.clone())),
            },
            other => issues.push(InlineIssue::StrayParameter(parameter_source(other))),
        }
    }
    (text, issues)
}

pub fn lookup_var(name: &str, vars: &HashMap<String, String>) -> Option<String> {
    vars.get(name).cloned().or_else(|| std::env::var(name).ok())
}

/// Source form of a parameter escape.
pub fn parameter_source(inline: &Inline) -> String {
    match inline {
        Inline::ArgEscape(ArgRef::Index(n)) => format!("\\${n}"),
        Inline::ArgEscape(ArgRef::Rest) => "\\$@".to_string(),
        Inline::NamedArgEscape(name) => format!("\\$[{name}]"),
        Inline::NamedFlagEscape(name) => format!("\\$?[{name}]"),
        _ => String::new(),
    }
}

const PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '»', '…', '\'', '"',
];

/// Closing punctuation that attaches to the preceding word.
pub fn is_punctuation(arg: &[Inline]) -> bool {
    match arg {
        [Inline::Text(s)] => !s.is_empty() && s.chars().all(|c| PUNCTUATION.contains(&c)),
        _ => false,
    }
}

/// Split a trailing punctuation argument off `args`, keeping at least
/// `keep` arguments on the left.
pub fn split_punct(args: &[Vec<Inline>], keep: usize) -> (&[Vec<Inline>], Option<&[Inline]>) {
    match args.split_last() {
        Some((last, rest)) if rest.len() >= keep && is_punctuation(last) => (rest, Some(last)),
        _ => (args, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frundis_parser::ast::EscapeCode;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.into())
    }

    #[test]
    fn test_escapes_and_variables() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "frundis".to_string());
        let inlines = vec![
            text("a"),
            Inline::Escape(EscapeCode::Nbsp),
            Inline::VarEscape("name".into()),
            Inline::Escape(EscapeCode::ZeroWidth),
            Inline::Escape(EscapeCode::Backslash),
        ];
        let (out, issues) = interpolate(&inlines, &vars);
        assert_eq!(out, "a\u{a0}frundis\\");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_undefined_variable() {
        let inlines = vec![text("x"), Inline::VarEscape("FRUNDIS_SURELY_UNSET_VAR".into())];
        let (out, issues) = interpolate(&inlines, &HashMap::new());
        assert_eq!(out, "x");
        assert_eq!(
            issues,
            vec![InlineIssue::UndefinedVariable("FRUNDIS_SURELY_UNSET_VAR".into())]
        );
    }

    #[test]
    fn test_stray_parameter() {
        let inlines = vec![
            Inline::ArgEscape(ArgRef::Index(2)),
            Inline::NamedFlagEscape("v".into()),
        ];
        let (out, issues) = interpolate(&inlines, &HashMap::new());
        assert_eq!(out, "");
        assert_eq!(
            issues,
            vec![
                InlineIssue::StrayParameter("\\$2".into()),
                InlineIssue::StrayParameter("\\$?[v]".into()),
            ]
        );
        assert_eq!(issues[0].message(), "`\\$2` outside of a user macro definition");
    }

    #[test]
    fn test_split_punct() {
        let args = vec![vec![text("word")], vec![text(").")]];
        let (words, punct) = split_punct(&args, 1);
        assert_eq!(words.len(), 1);
        assert_eq!(punct, Some(&[text(").")][..]));

        let lone = vec![vec![text(".")]];
        assert_eq!(split_punct(&lone, 1), (&lone[..], None));
        assert!(!is_punctuation(&[text("a.")]));
        assert!(!is_punctuation(&[Inline::Escape(EscapeCode::ZeroWidth), text(".")]));
    }
}
