//! Block and inline syntax tree for frundis.
//!
//! A document is a flat list of [`Block`]s. Nesting (lists, display blocks,
//! markup spans) is not represented here: it is a property of the macro
//! calls and is tracked by the engine's scope stacks while processing.

use frundis_lexer::LexerError;
pub use frundis_lexer::{ArgRef, EscapeCode};
use serde::Serialize;

/// The smallest content atom inside a macro argument or a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Inline {
    /// Literal text.
    Text(String),

    /// `\&`, `\e` or `\~`.
    Escape(EscapeCode),

    /// `\$1` .. `\$9` or `\$@`, only meaningful in a user macro body.
    ArgEscape(ArgRef),

    /// `\$[name]`: value of a named option of a user macro call.
    NamedArgEscape(String),

    /// `\$?[name]`: whether a named flag was given to a user macro call.
    NamedFlagEscape(String),

    /// `\*[name]`: a variable defined with `.#dv`, or an environment variable.
    VarEscape(String),
}

impl Inline {
    /// Whether this atom is replaced by user macro argument substitution.
    pub fn is_parameter(&self) -> bool {
        matches!(
            self,
            Inline::ArgEscape(_) | Inline::NamedArgEscape(_) | Inline::NamedFlagEscape(_)
        )
    }
}

/// Append an inline, merging adjacent literal text.
pub fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text(new) = &inline {
        if let Some(Inline::Text(last)) = inlines.last_mut() {
            last.push_str(new);
            return;
        }
    }
    inlines.push(inline);
}

/// A dot-macro call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Macro {
    pub name: String,
    pub args: Vec<Vec<Inline>>,
    pub line: usize,
}

/// A maximal run of text lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub text: Vec<Inline>,
    pub line: usize,
}

/// The unit of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "block")]
pub enum Block {
    Macro(Macro),
    Text(TextBlock),
}

impl Block {
    pub fn line(&self) -> usize {
        match self {
            Block::Macro(m) => m.line,
            Block::Text(t) => t.line,
        }
    }

    /// Name of the macro, if this block is a macro call.
    pub fn macro_name(&self) -> Option<&str> {
        match self {
            Block::Macro(m) => Some(&m.name),
            Block::Text(_) => None,
        }
    }

    /// Every inline atom of the block, arguments in order.
    pub fn inlines(&self) -> Box<dyn Iterator<Item = &Inline> + '_> {
        match self {
            Block::Macro(m) => Box::new(m.args.iter().flatten()),
            Block::Text(t) => Box::new(t.text.iter()),
        }
    }

    /// The same block with its line number zeroed, for structural comparison.
    pub fn without_line(&self) -> Block {
        let mut block = self.clone();
        match &mut block {
            Block::Macro(m) => m.line = 0,
            Block::Text(t) => t.line = 0,
        }
        block
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// Recoverable problems reported by the scanner.
    pub warnings: Vec<LexerError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_inline_merges_text() {
        let mut v = Vec::new();
        push_inline(&mut v, Inline::Text("a".into()));
        push_inline(&mut v, Inline::Text("b".into()));
        push_inline(&mut v, Inline::Escape(EscapeCode::Nbsp));
        push_inline(&mut v, Inline::Text("c".into()));
        assert_eq!(
            v,
            vec![
                Inline::Text("ab".into()),
                Inline::Escape(EscapeCode::Nbsp),
                Inline::Text("c".into()),
            ]
        );
    }

    #[test]
    fn test_block_inlines_flattens_arguments() {
        let block = Block::Macro(Macro {
            name: "Sm".into(),
            args: vec![
                vec![Inline::Text("a".into())],
                vec![Inline::ArgEscape(ArgRef::Index(1))],
            ],
            line: 3,
        });
        assert_eq!(block.inlines().count(), 2);
        assert!(block.inlines().any(Inline::is_parameter));
        assert_eq!(block.without_line().line(), 0);
    }
}
