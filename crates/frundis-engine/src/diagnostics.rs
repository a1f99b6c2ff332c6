//! Non-fatal diagnostics.
//!
//! Everything wrong with a document that does not prevent producing output
//! ends up here: bad options, unbalanced scopes, unknown ids. The sink
//! drops exact duplicates, so the same problem seen by both passes is only
//! reported once, and it can be muted while the engine synthesizes calls
//! the author did not write.

use std::collections::HashSet;
use std::fmt;

/// How a frame was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Via {
    /// Expansion of a user macro.
    Macro(String),
    /// `.If` inclusion.
    Include,
}

/// One step of the chain of calls leading to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub via: Via,
    pub file: String,
    pub line: usize,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.via {
            Via::Macro(name) => {
                write!(f, "in user macro `{}` called at {}:{}", name, self.file, self.line)
            }
            Via::Include => write!(f, "in file included at {}:{}", self.file, self.line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    /// Macro being processed, if any.
    pub macro_name: Option<String>,
    pub message: String,
    /// Innermost first.
    pub call_sites: Vec<CallSite>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.file, self.line)?;
        if let Some(name) = &self.macro_name {
            write!(f, " {name}:")?;
        }
        write!(f, " {}", self.message)?;
        for site in &self.call_sites {
            write!(f, " ({site})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
    seen: HashSet<String>,
    quiet: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Returns whether it was kept: muted diagnostics
    /// and exact duplicates of an earlier one are dropped.
    pub fn report(&mut self, diagnostic: Diagnostic) -> bool {
        if self.quiet > 0 {
            return false;
        }
        let rendered = diagnostic.to_string();
        if !self.seen.insert(rendered.clone()) {
            return false;
        }
        log::warn!("{rendered}");
        self.list.push(diagnostic);
        true
    }

    pub fn mute(&mut self) {
        self.quiet += 1;
    }

    pub fn unmute(&mut self) {
        self.quiet = self.quiet.saturating_sub(1);
    }

    pub fn is_muted(&self) -> bool {
        self.quiet > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Messages only, in report order.
    pub fn messages(&self) -> Vec<&str> {
        self.list.iter().map(|d| d.message.as_str()).collect()
    }
}
