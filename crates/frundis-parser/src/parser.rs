//! Document parser for frundis.
//!
//! Consumes the token stream of `frundis-lexer` and groups it into blocks:
//! one `Macro` per macro-name token (arguments split on `ArgEnd`, ended by
//! `MacroEnd`), and one `TextBlock` per maximal run of text and escape
//! tokens. Comments, continuation markers and illegal tokens (already
//! reported by the scanner) are dropped.

use crate::ast::{push_inline, Block, Document, Inline, Macro, TextBlock};
use crate::ParseError;
use frundis_lexer::{Scanner, Span, Token, TokenKind};

/// frundis document parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser for the given tokens.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::new(0, 0, 1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self { tokens, pos: 0 }
    }

    /// Parse source text into a document.
    pub fn parse(source: &str) -> Result<Document, ParseError> {
        let (tokens, warnings) = Scanner::tokenize(source);
        let mut parser = Parser::new(tokens);
        let blocks = parser.parse_blocks()?;
        Ok(Document { blocks, warnings })
    }

    /// Parse the whole token stream into blocks.
    pub fn parse_blocks(&mut self) -> Result<Vec<Block>, ParseError> {
        let mut blocks = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::MacroName(_) => blocks.push(self.parse_macro()?),
                TokenKind::Comment(_) => self.advance(),
                TokenKind::MacroEnd | TokenKind::ArgEnd => {
                    return Err(self.error("argument delimiter outside of a macro line"));
                }
                _ => {
                    if let Some(block) = self.parse_text_block() {
                        blocks.push(block);
                    }
                }
            }
        }

        Ok(blocks)
    }

    // =========================================================================
    // Macros
    // =========================================================================

    /// Parse `.Name arg arg ...` up to `MacroEnd` or `Eof`.
    fn parse_macro(&mut self) -> Result<Block, ParseError> {
        let token = self.peek().clone();
        let TokenKind::MacroName(name) = token.kind else {
            return Err(self.error("expected macro name"));
        };
        self.advance();

        let mut args = Vec::new();
        let mut current: Vec<Inline> = Vec::new();
        let mut in_arg = false;

        loop {
            let kind = self.peek().kind.clone();
            match kind {
                TokenKind::MacroEnd => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::ArgEnd => {
                    self.advance();
                    args.push(Self::argument(std::mem::take(&mut current)));
                    in_arg = false;
                }
                TokenKind::Comment(_) | TokenKind::ExtendLine => self.advance(),
                TokenKind::Illegal(_) => {
                    self.advance();
                    in_arg = true;
                }
                TokenKind::MacroName(_) => {
                    return Err(self.error("macro name inside a macro line"));
                }
                other => {
                    self.advance();
                    if let Some(inline) = Self::inline_of(other) {
                        push_inline(&mut current, inline);
                        in_arg = true;
                    }
                }
            }
        }

        if in_arg {
            args.push(Self::argument(current));
        }

        Ok(Block::Macro(Macro {
            name,
            args,
            line: token.span.line,
        }))
    }

    /// An argument whose tokens were all dropped reads as `""`.
    fn argument(inlines: Vec<Inline>) -> Vec<Inline> {
        if inlines.is_empty() {
            vec![Inline::Text(String::new())]
        } else {
            inlines
        }
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Collect consecutive text tokens, starting at the line of the first
    /// one even when it is dropped. Returns `None` when the run held
    /// nothing but dropped tokens.
    fn parse_text_block(&mut self) -> Option<Block> {
        let line = self.peek().span.line;
        let mut text = Vec::new();

        loop {
            let kind = self.peek().kind.clone();
            match kind {
                TokenKind::Comment(_) | TokenKind::ExtendLine | TokenKind::Illegal(_) => {
                    self.advance();
                }
                TokenKind::Eof
                | TokenKind::MacroName(_)
                | TokenKind::MacroEnd
                | TokenKind::ArgEnd => break,
                other => {
                    self.advance();
                    if let Some(inline) = Self::inline_of(other) {
                        push_inline(&mut text, inline);
                    }
                }
            }
        }

        if text.is_empty() {
            None
        } else {
            Some(Block::Text(TextBlock { text, line }))
        }
    }

    fn inline_of(kind: TokenKind) -> Option<Inline> {
        match kind {
            TokenKind::Text(s) => Some(Inline::Text(s)),
            TokenKind::Escape(code) => Some(Inline::Escape(code)),
            TokenKind::VarEscape(name) => Some(Inline::VarEscape(name)),
            TokenKind::ArgEscape(arg) => Some(Inline::ArgEscape(arg)),
            TokenKind::NamedArgEscape(name) => Some(Inline::NamedArgEscape(name)),
            TokenKind::NamedFlagEscape(name) => Some(Inline::NamedFlagEscape(name)),
            _ => None,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        // The scanner always ends the stream with Eof.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> ParseError {
        let span = self.peek().span;
        ParseError {
            message: message.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArgRef, EscapeCode};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Block> {
        Parser::parse(source).unwrap().blocks
    }

    fn first_macro(blocks: &[Block]) -> &Macro {
        match &blocks[0] {
            Block::Macro(m) => m,
            other => panic!("Expected macro, got {other:?}"),
        }
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.into())
    }

    // =========================================================================
    // Basic structure
    // =========================================================================

    #[test]
    fn test_empty_document() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_single_macro() {
        let blocks = parse(".Sh Introduction\n");
        let m = first_macro(&blocks);
        assert_eq!(m.name, "Sh");
        assert_eq!(m.args, vec![vec![text("Introduction")]]);
        assert_eq!(m.line, 1);
    }

    #[test]
    fn test_text_lines_form_one_block() {
        let blocks = parse("first line\nsecond line\n\nafter blank\n");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Text(t) => {
                assert_eq!(t.text, vec![text("first line\nsecond line\n\nafter blank\n")]);
                assert_eq!(t.line, 1);
            }
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_macro_splits_text_runs() {
        let blocks = parse("one\n.P\ntwo\n");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].macro_name(), Some("P"));
        assert_eq!(blocks[2].line(), 3);
    }

    #[test]
    fn test_arguments_with_escapes() {
        let blocks = parse(".Sm \\&-x a\\~b\n");
        let m = first_macro(&blocks);
        assert_eq!(
            m.args,
            vec![
                vec![Inline::Escape(EscapeCode::ZeroWidth), text("-x")],
                vec![text("a"), Inline::Escape(EscapeCode::Nbsp), text("b")],
            ]
        );
    }

    #[test]
    fn test_parameter_escapes() {
        let blocks = parse("Hello, \\$1!\n");
        match &blocks[0] {
            Block::Text(t) => assert_eq!(
                t.text,
                vec![
                    text("Hello, "),
                    Inline::ArgEscape(ArgRef::Index(1)),
                    text("!\n"),
                ]
            ),
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_quoted_argument_is_kept() {
        let blocks = parse(".Lk url \"\"\n");
        assert_eq!(first_macro(&blocks).args, vec![vec![text("url")], vec![text("")]]);
    }

    #[test]
    fn test_comments_are_dropped() {
        let blocks = parse(".\\\" header comment\n.P\\\" trailing\n");
        assert_eq!(blocks.len(), 1);
        assert!(first_macro(&blocks).args.is_empty());
    }

    #[test]
    fn test_continued_macro_line() {
        let blocks = parse(".Sh a \\\n  b\ntext\n");
        assert_eq!(first_macro(&blocks).args, vec![vec![text("a")], vec![text("b")]]);
        assert_eq!(blocks[1].line(), 3);
    }

    #[test]
    fn test_warnings_are_collected() {
        let doc = Parser::parse("bad \\q escape\n").unwrap();
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn test_illegal_only_argument_reads_as_empty() {
        let blocks = parse(".Sm \\q \"\\q\" x\n");
        assert_eq!(
            first_macro(&blocks).args,
            vec![vec![text("")], vec![text("")], vec![text("x")]]
        );
    }

    #[test]
    fn test_leading_continuation_keeps_dot_line_as_text() {
        let blocks = parse("\\\n.P\n.Sh x\n");
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            Block::Text(t) => {
                assert_eq!(t.text, vec![text(".P\n")]);
                assert_eq!(t.line, 1);
            }
            other => panic!("Expected text, got {other:?}"),
        }
        assert_eq!(blocks[1].line(), 3);
    }

    // =========================================================================
    // Desynchronization
    // =========================================================================

    #[test]
    fn test_stray_arg_end_is_fatal() {
        let span = Span::new(0, 0, 1, 1);
        let tokens = vec![
            Token::new(TokenKind::ArgEnd, span),
            Token::new(TokenKind::Eof, span),
        ];
        let err = Parser::new(tokens).parse_blocks().unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_nested_macro_name_is_fatal() {
        let span = Span::new(0, 0, 2, 1);
        let tokens = vec![
            Token::new(TokenKind::MacroName("Sh".into()), span),
            Token::new(TokenKind::MacroName("P".into()), span),
            Token::new(TokenKind::Eof, span),
        ];
        assert!(Parser::new(tokens).parse_blocks().is_err());
    }
}
