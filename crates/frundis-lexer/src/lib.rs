//! frundis Lexer
//!
//! Tokenizes frundis source into a stream of tokens.
//! Handles dot-macro lines, whitespace and quote delimited arguments,
//! text lines, comments, line continuation and the inline escapes
//! (`\&`, `\e`, `\~`, `\*[var]`, `\$1`, `\$@`, `\$[opt]`, `\$?[flag]`).
//!
//! Malformed input never aborts scanning: a warning is recorded and an
//! `Illegal` token takes the place of the bad construct.
//!
//! # Example
//!
//! ```
//! use frundis_lexer::Scanner;
//!
//! let (tokens, warnings) = Scanner::tokenize("");
//! assert_eq!(tokens.len(), 1); // Just EOF
//! assert!(warnings.is_empty());
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{ArgRef, EscapeCode, Span, Token, TokenKind};

/// Lexer warning with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
