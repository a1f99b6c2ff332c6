//! frundis Parser
//!
//! Parses a token stream into a flat sequence of blocks: macro calls with
//! their arguments, and runs of text. Each argument and each text run is a
//! list of inline atoms (literal text and escapes).
//!
//! A canonical printer turns blocks back into frundis source, such that
//! re-parsing the printed text yields the same blocks.

pub mod ast;
pub mod parser;
pub mod printer;

pub use ast::{Block, Document, Inline, Macro, TextBlock};
pub use parser::Parser;
pub use printer::print_blocks;

/// Parser error with position information.
///
/// Only raised when the token stream does not follow the block grammar,
/// which means the scanner and the parser disagree. Malformed source is
/// reported through [`Document::warnings`] instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
