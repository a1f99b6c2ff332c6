//! Leading `-name [value]` options of a macro call.
//!
//! Options come first; the first argument that is not an option ends them.
//! An option is an argument made of a single literal text starting with
//! `-`, so `\&-x` is a positional argument.

use frundis_parser::Inline;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptKind {
    Flag,
    /// Takes the next argument as its value.
    Value,
}

/// Known options of a macro.
pub type OptionSpec = [(&'static str, OptKind)];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    flags: HashSet<String>,
    values: HashMap<String, Vec<Inline>>,
}

impl Options {
    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn value(&self, name: &str) -> Option<&[Inline]> {
        self.values.get(name).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionIssue {
    Unknown(String),
    MissingValue(String),
}

impl OptionIssue {
    pub fn message(&self) -> String {
        match self {
            OptionIssue::Unknown(name) => format!("unknown option `-{name}`"),
            OptionIssue::MissingValue(name) => format!("option `-{name}` requires an argument"),
        }
    }
}

/// Name of the option an argument spells, if it is one.
pub fn option_name(arg: &[Inline]) -> Option<&str> {
    match arg {
        [Inline::Text(s)] if s.len() > 1 && s.starts_with('-') => Some(&s[1..]),
        _ => None,
    }
}

/// Parse leading options, returning them with the remaining positional
/// arguments and the problems found. Unknown options are skipped.
pub fn parse_options<'a>(
    args: &'a [Vec<Inline>],
    lookup: impl Fn(&str) -> Option<OptKind>,
) -> (Options, &'a [Vec<Inline>], Vec<OptionIssue>) {
    let mut options = Options::default();
    let mut issues = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let Some(name) = option_name(&args[i]) else {
            break;
        };
        match lookup(name) {
            Some(OptKind::Flag) => {
                options.flags.insert(name.to_string());
                i += 1;
            }
            Some(OptKind::Value) => match args.get(i + 1) {
                Some(value) => {
                    options.values.insert(name.to_string(), value.clone());
                    i += 2;
                }
                None => {
                    issues.push(OptionIssue::MissingValue(name.to_string()));
                    i += 1;
                }
            },
            None => {
                issues.push(OptionIssue::Unknown(name.to_string()));
                i += 1;
            }
        }
    }

    (options, &args[i..], issues)
}

/// Lookup function over a fixed option table.
pub fn from_spec(spec: &'static OptionSpec) -> impl Fn(&str) -> Option<OptKind> {
    move |name| spec.iter().find(|(n, _)| *n == name).map(|(_, kind)| *kind)
}

/// Whether `format` is one of the comma-separated `formats`.
pub fn format_matches(formats: &str, format: &str) -> bool {
    formats.split(',').map(str::trim).any(|f| f == format)
}
