//! User macros: `.#de name` ... `.#.` definitions and their expansion.
//!
//! A definition's body is stored as parsed blocks. Its signature (highest
//! positional parameter, use of `\$@`, named options) is discovered from
//! the parameter escapes found in the body when the definition ends. A call
//! substitutes its arguments into a copy of the body, or reuses the stored
//! body as is when it has no parameters, and processes the result in a new
//! frame.

use crate::context::{Context, Frame};
use crate::diagnostics::{CallSite, Via};
use crate::options::{parse_options, OptKind, Options};
use crate::renderer::Renderer;
use crate::EngineError;
use frundis_parser::ast::{push_inline, ArgRef, Block, Inline, Macro, TextBlock};
use std::rc::Rc;

/// A definition being captured.
#[derive(Debug, Clone)]
pub struct PendingDefinition {
    pub name: String,
    pub body: Vec<Block>,
    pub file: Rc<str>,
    pub line: usize,
    /// Defined for another format: captured, then dropped.
    pub ignore: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Highest `\$n` used.
    pub arity: usize,
    pub uses_rest: bool,
    pub options: Vec<(String, OptKind)>,
    /// Names used both as `\$[name]` and `\$?[name]`.
    pub conflicts: Vec<String>,
}

impl Signature {
    pub fn has_parameters(&self) -> bool {
        self.arity > 0 || self.uses_rest || !self.options.is_empty()
    }

    pub fn option_kind(&self, name: &str) -> Option<OptKind> {
        self.options.iter().find(|(n, _)| n == name).map(|(_, kind)| *kind)
    }
}

/// Scan a body for parameter escapes.
pub fn discover(body: &[Block]) -> Signature {
    let mut sig = Signature::default();
    for inline in body.iter().flat_map(Block::inlines) {
        match inline {
            Inline::ArgEscape(ArgRef::Index(n)) => sig.arity = sig.arity.max(*n),
            Inline::ArgEscape(ArgRef::Rest) => sig.uses_rest = true,
            Inline::NamedArgEscape(name) => record_option(&mut sig, name, OptKind::Value),
            Inline::NamedFlagEscape(name) => record_option(&mut sig, name, OptKind::Flag),
            _ => {}
        }
    }
    sig
}

fn record_option(sig: &mut Signature, name: &str, kind: OptKind) {
    match sig.option_kind(name) {
        None => sig.options.push((name.to_string(), kind)),
        Some(existing) if existing != kind && !sig.conflicts.iter().any(|c| c == name) => {
            sig.conflicts.push(name.to_string());
        }
        Some(_) => {}
    }
}

#[derive(Debug)]
pub struct UserMacroDef {
    pub name: String,
    pub body: Rc<[Block]>,
    pub signature: Signature,
    pub file: Rc<str>,
    pub line: usize,
    pub ignore: bool,
}

impl UserMacroDef {
    pub fn new(pending: PendingDefinition) -> Self {
        let signature = discover(&pending.body);
        Self {
            name: pending.name,
            body: Rc::from(pending.body),
            signature,
            file: pending.file,
            line: pending.line,
            ignore: pending.ignore,
        }
    }
}

/// Result of substituting call arguments into a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub blocks: Vec<Block>,
    /// Positional parameters used by the body but absent from the call.
    pub missing: Vec<usize>,
}

/// Substitute call arguments into a copy of `body`.
///
/// `\$@` stands for the positional arguments beyond `arity`. As a whole
/// macro argument it splices them as separate arguments; elsewhere they are
/// joined with spaces. A missing positional argument is replaced by its
/// escape in literal form.
pub fn substitute(
    body: &[Block],
    positional: &[Vec<Inline>],
    arity: usize,
    options: &Options,
) -> Substitution {
    let rest = positional.get(arity..).unwrap_or(&[]);
    let mut sub = Substitution {
        blocks: Vec::with_capacity(body.len()),
        missing: Vec::new(),
    };

    for block in body {
        let new_block = match block {
            Block::Macro(m) => {
                let mut args = Vec::with_capacity(m.args.len());
                for arg in &m.args {
                    if let [Inline::ArgEscape(ArgRef::Rest)] = arg.as_slice() {
                        args.extend(rest.iter().cloned());
                    } else {
                        let missing = &mut sub.missing;
                        args.push(substitute_inlines(arg, positional, rest, options, missing));
                    }
                }
                Block::Macro(Macro {
                    name: m.name.clone(),
                    args,
                    line: m.line,
                })
            }
            Block::Text(t) => Block::Text(TextBlock {
                text: substitute_inlines(&t.text, positional, rest, options, &mut sub.missing),
                line: t.line,
            }),
        };
        sub.blocks.push(new_block);
    }

    sub.missing.sort_unstable();
    sub.missing.dedup();
    sub
}

fn substitute_inlines(
    inlines: &[Inline],
    positional: &[Vec<Inline>],
    rest: &[Vec<Inline>],
    options: &Options,
    missing: &mut Vec<usize>,
) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::ArgEscape(ArgRef::Index(n)) => match n
                .checked_sub(1)
                .and_then(|i| positional.get(i))
            {
                Some(arg) => arg.iter().cloned().for_each(|i| push_inline(&mut out, i)),
                None => {
                    missing.push(*n);
                    push_inline(&mut out, Inline::Text(format!("\\${n}")));
                }
            },
            Inline::ArgEscape(ArgRef::Rest) => {
                for (i, arg) in rest.iter().enumerate() {
                    if i > 0 {
                        push_inline(&mut out, Inline::Text(" ".into()));
                    }
                    arg.iter().cloned().for_each(|i| push_inline(&mut out, i));
                }
            }
            Inline::NamedArgEscape(name) => {
                if let Some(value) = options.value(name) {
                    value.iter().cloned().for_each(|i| push_inline(&mut out, i));
                }
            }
            Inline::NamedFlagEscape(name) => {
                let value = if options.flag(name) { "1" } else { "" };
                push_inline(&mut out, Inline::Text(value.into()));
            }
            other => push_inline(&mut out, other.clone()),
        }
    }
    out
}

impl Context {
    /// Process a call to a user macro.
    pub(crate) fn expand_user_macro(
        &mut self,
        r: &mut dyn Renderer,
        def: Rc<UserMacroDef>,
        call: &Macro,
    ) -> Result<(), EngineError> {
        if def.ignore {
            return Ok(());
        }
        if self.state.macro_depth >= self.config().max_depth {
            self.error(format!("too much depth expanding `{}`: recursive macro?", def.name));
            self.state.overflow = true;
            return Ok(());
        }

        let sig = &def.signature;
        let (options, positional) = if sig.options.is_empty() {
            (Options::default(), call.args.as_slice())
        } else {
            let (options, positional, issues) =
                parse_options(&call.args, |name| sig.option_kind(name));
            for issue in issues {
                self.error(issue.message());
            }
            (options, positional)
        };
        if positional.len() > sig.arity && !sig.uses_rest {
            self.error(format!(
                "too many arguments: `{}` takes {}, got {}",
                def.name,
                sig.arity,
                positional.len()
            ));
        }

        let body = if sig.has_parameters() {
            let sub = substitute(&def.body, positional, sig.arity, &options);
            for n in sub.missing {
                self.error(format!("missing argument \\${n} in call to `{}`", def.name));
            }
            Rc::from(sub.blocks)
        } else {
            Rc::clone(&def.body)
        };

        log::trace!("expanding user macro `{}` at line {}", def.name, call.line);
        let call_site = CallSite {
            via: Via::Macro(def.name.clone()),
            file: self.current_file().to_string(),
            line: call.line,
        };
        let mut frame = Frame::new(Rc::clone(&def.file), body, Some(call_site));
        frame.user_macro = Some(def.name.clone());

        self.state.macro_depth += 1;
        let result = self.run_frame(r, frame);
        self.state.macro_depth -= 1;
        if self.state.macro_depth == 0 {
            self.state.overflow = false;
        }
        result
    }

    /// End the definition being captured and register it.
    pub(crate) fn finish_definition(&mut self) {
        let Some(pending) = self.state.defining.take() else {
            return;
        };
        if pending.name.is_empty() || pending.name.starts_with('#') {
            return;
        }
        let def = UserMacroDef::new(pending);
        for name in &def.signature.conflicts {
            let message = format!("`{name}` used both as a named argument and as a flag");
            self.error_at(&def.file, def.line, Some("#de"), message);
        }
        log::debug!("defined user macro `{}` ({} blocks)", def.name, def.body.len());
        self.state.user_macros.insert(def.name.clone(), Rc::new(def));
    }
}
