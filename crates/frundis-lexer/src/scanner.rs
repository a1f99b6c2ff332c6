use std::collections::VecDeque;

use crate::token::{ArgRef, EscapeCode, Span, Token, TokenKind};
use crate::LexerError;

/// Scanner state. One state per position class of the line grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the first character of a line.
    BlockStart,
    /// Just after the leading `.` of a macro line.
    MacroName,
    /// Between macro arguments.
    NewArgument,
    /// Inside a `"`-delimited argument.
    QuotedArgument,
    /// Inside a whitespace-delimited argument.
    ArgumentContinuation,
    /// Just after the closing quote of a quoted argument.
    ArgumentEnd,
    /// On a `.\"` line.
    CommentLine,
    /// Inside a text line.
    TextBlock,
    /// Input exhausted; only `Eof` remains.
    End,
}

/// frundis source scanner.
///
/// A pull-based state machine: every call to [`Scanner::next_token`] runs
/// state transitions until at least one token is ready. A single transition
/// may produce several tokens (pending text followed by an escape, for
/// instance), so produced tokens go through a small queue.
///
/// Warnings for malformed input are accumulated, never returned as errors:
/// scanning always reaches `Eof`.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Width of the previous line, for positions reported right after a newline.
    prev_line_width: usize,
    state: State,
    pending: VecDeque<Token>,
    warnings: Vec<LexerError>,
    /// Whether the current argument produced any token yet.
    arg_has_content: bool,
    eof_emitted: bool,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.replace("\r\n", "\n").chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            prev_line_width: 0,
            state: State::BlockStart,
            pending: VecDeque::new(),
            warnings: Vec::new(),
            arg_has_content: false,
            eof_emitted: false,
        }
    }

    /// Tokenize the entire source, returning the tokens (ending with `Eof`)
    /// and the warnings reported along the way.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexerError>) {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, scanner.warnings)
    }

    /// Produce the next token. Returns `Eof` forever once input is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
            if self.state == State::End {
                self.eof_emitted = true;
                let span = Span::new(self.pos, self.pos, self.line, self.column);
                return Token::new(TokenKind::Eof, span);
            }
            self.step();
        }
    }

    /// Warnings reported so far.
    pub fn warnings(&self) -> &[LexerError] {
        &self.warnings
    }

    /// Whether `Eof` has been handed out.
    pub fn is_done(&self) -> bool {
        self.eof_emitted
    }

    fn step(&mut self) {
        match self.state {
            State::BlockStart => self.scan_block_start(),
            State::MacroName => self.scan_macro_name(),
            State::NewArgument => self.scan_new_argument(),
            State::QuotedArgument => self.scan_quoted_argument(),
            State::ArgumentContinuation => self.scan_argument(),
            State::ArgumentEnd => {
                self.emit_empty(TokenKind::ArgEnd);
                self.state = State::NewArgument;
            }
            State::CommentLine => self.scan_comment_line(),
            State::TextBlock => self.scan_text_line(),
            State::End => {}
        }
    }

    // --- Line starts ---

    /// Decide between a macro line and a text line. Leading blanks are
    /// skipped only when a `.` follows them; text keeps its indentation.
    fn scan_block_start(&mut self) {
        if self.is_at_end() {
            self.state = State::End;
            return;
        }

        let mut look = self.pos;
        while look < self.chars.len() && matches!(self.chars[look], ' ' | '\t') {
            look += 1;
        }

        if look < self.chars.len() && self.chars[look] == '.' {
            while self.pos <= look {
                self.advance();
            }
            if self.peek() == '\\' && self.peek_next() == '"' {
                self.state = State::CommentLine;
            } else {
                self.state = State::MacroName;
            }
        } else {
            self.state = State::TextBlock;
        }
    }

    fn scan_macro_name(&mut self) {
        self.skip_blanks();
        let start = self.mark();

        let mut name = String::new();
        while !self.is_at_end() && !self.peek().is_whitespace() && self.peek() != '\\' {
            name.push(self.peek());
            self.advance();
        }

        if !name.is_empty() {
            self.emit(TokenKind::MacroName(name), start);
            self.arg_has_content = false;
            self.state = State::NewArgument;
            return;
        }

        if self.peek() == '\\' && self.peek_next() == '"' {
            self.state = State::CommentLine;
            return;
        }

        // A lone `.` line is a no-op; anything else lacks a name.
        if !self.is_at_end() && self.peek() != '\n' {
            self.warn("missing macro name after `.`".into());
        }
        self.skip_line();
        self.state = if self.is_at_end() {
            State::End
        } else {
            State::BlockStart
        };
    }

    fn scan_comment_line(&mut self) {
        let start = self.mark();
        // Skip `\"`
        self.advance();
        self.advance();

        let mut content = String::new();
        while !self.is_at_end() && self.peek() != '\n' {
            content.push(self.peek());
            self.advance();
        }
        self.emit(TokenKind::Comment(content), start);

        if !self.is_at_end() {
            self.advance(); // newline
        }
        self.state = State::BlockStart;
    }

    // --- Macro arguments ---

    fn scan_new_argument(&mut self) {
        self.skip_blanks();

        match self.peek_opt() {
            None => {
                self.emit_empty(TokenKind::MacroEnd);
                self.state = State::End;
            }
            Some('\n') => {
                self.emit_empty(TokenKind::MacroEnd);
                self.advance();
                self.state = State::BlockStart;
            }
            Some('"') => {
                self.advance();
                self.arg_has_content = false;
                self.state = State::QuotedArgument;
            }
            Some('\\') if self.peek_next() == '\n' => {
                // Continuation: the next line's leading blanks collapse into
                // the separator before the next argument.
                let start = self.mark();
                self.advance();
                self.advance();
                self.emit(TokenKind::ExtendLine, start);
            }
            Some('\\') if self.peek_next() == '"' => self.scan_comment(),
            Some(_) => {
                self.arg_has_content = false;
                self.state = State::ArgumentContinuation;
            }
        }
    }

    /// Whitespace-delimited argument.
    fn scan_argument(&mut self) {
        let mut start = self.mark();
        let mut text = String::new();

        loop {
            match self.peek_opt() {
                None | Some(' ') | Some('\t') | Some('\n') => break,
                Some('\\') if matches!(self.peek_next(), '\n' | '"') => break,
                Some('\\') => {
                    self.flush_text(&mut text, start);
                    self.scan_escape();
                    start = self.mark();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        self.flush_text(&mut text, start);
        self.emit_empty(TokenKind::ArgEnd);
        self.state = State::NewArgument;
    }

    /// `"`-delimited argument. A doubled `""` is a literal quote.
    fn scan_quoted_argument(&mut self) {
        let mut start = self.mark();
        let mut text = String::new();

        loop {
            match self.peek_opt() {
                None | Some('\n') => {
                    self.unterminated_quote(&mut text, start);
                    return;
                }
                Some('"') if self.peek_next() == '"' => {
                    text.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    if text.is_empty() && !self.arg_has_content {
                        // `""` is an empty argument, not a missing one.
                        self.emit(TokenKind::Text(String::new()), start);
                    }
                    self.flush_text(&mut text, start);
                    self.state = State::ArgumentEnd;
                    return;
                }
                Some('\\') if self.peek_next() == '\n' => {
                    self.flush_text(&mut text, start);
                    let mark = self.mark();
                    self.advance();
                    self.advance();
                    self.emit(TokenKind::ExtendLine, mark);
                    start = self.mark();
                }
                Some('\\') if self.peek_next() == '"' => {
                    self.unterminated_quote(&mut text, start);
                    return;
                }
                Some('\\') => {
                    self.flush_text(&mut text, start);
                    self.scan_escape();
                    start = self.mark();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    fn unterminated_quote(&mut self, text: &mut String, start: (usize, usize, usize)) {
        self.warn("unterminated quoted argument".into());
        self.flush_text(text, start);
        self.emit_empty(TokenKind::Illegal("\"".into()));
        self.emit_empty(TokenKind::ArgEnd);
        self.state = State::NewArgument;
    }

    // --- Text lines ---

    fn scan_text_line(&mut self) {
        let mut start = self.mark();
        let mut text = String::new();

        loop {
            match self.peek_opt() {
                None => {
                    self.flush_text(&mut text, start);
                    self.state = State::End;
                    return;
                }
                Some('\n') => {
                    text.push('\n');
                    self.advance();
                    self.flush_text(&mut text, start);
                    self.state = State::BlockStart;
                    return;
                }
                Some('\\') if self.peek_next() == '\n' => {
                    // Joined with the next line, which stays text even if it
                    // starts with a dot.
                    self.flush_text(&mut text, start);
                    let mark = self.mark();
                    self.advance();
                    self.advance();
                    self.emit(TokenKind::ExtendLine, mark);
                    start = self.mark();
                }
                Some('\\') if self.peek_next() == '"' => {
                    self.flush_text(&mut text, start);
                    self.scan_comment();
                    start = self.mark();
                }
                Some('\\') => {
                    self.flush_text(&mut text, start);
                    self.scan_escape();
                    start = self.mark();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    // --- Escapes ---

    /// `\"` comment running to the end of the line (newline excluded).
    fn scan_comment(&mut self) {
        let start = self.mark();
        self.advance();
        self.advance();
        let mut content = String::new();
        while !self.is_at_end() && self.peek() != '\n' {
            content.push(self.peek());
            self.advance();
        }
        self.emit(TokenKind::Comment(content), start);
    }

    /// Scan an escape starting at a backslash. Newline and comment escapes
    /// are handled by the callers, which know the surrounding state.
    fn scan_escape(&mut self) {
        let start = self.mark();
        self.advance(); // consume backslash

        let Some(c) = self.peek_opt() else {
            self.warn("backslash at end of input".into());
            self.emit(TokenKind::Illegal("\\".into()), start);
            return;
        };
        if c == '\n' {
            self.warn("backslash at end of line".into());
            self.emit(TokenKind::Illegal("\\".into()), start);
            return;
        }
        self.advance();

        if let Some(code) = EscapeCode::from_char(c) {
            self.emit(TokenKind::Escape(code), start);
            return;
        }

        match c {
            '*' => match self.bracketed_name("interpolation") {
                Some(name) => self.emit(TokenKind::VarEscape(name), start),
                None => self.emit(TokenKind::Illegal("\\*".into()), start),
            },
            '$' => self.scan_argument_escape(start),
            _ => {
                self.warn(format!("unknown escape sequence `\\{c}`"));
                self.emit(TokenKind::Illegal(format!("\\{c}")), start);
            }
        }
    }

    /// `\$1`, `\$@`, `\$[name]` and `\$?[name]`, after the `$`.
    fn scan_argument_escape(&mut self, start: (usize, usize, usize)) {
        match self.peek_opt() {
            Some(d @ '1'..='9') => {
                self.advance();
                let n = d.to_digit(10).unwrap_or(1) as usize;
                self.emit(TokenKind::ArgEscape(ArgRef::Index(n)), start);
            }
            Some('@') => {
                self.advance();
                self.emit(TokenKind::ArgEscape(ArgRef::Rest), start);
            }
            Some('[') => match self.bracketed_name("named argument") {
                Some(name) => self.emit(TokenKind::NamedArgEscape(name), start),
                None => self.emit(TokenKind::Illegal("\\$".into()), start),
            },
            Some('?') => {
                self.advance();
                match self.bracketed_name("named flag") {
                    Some(name) => self.emit(TokenKind::NamedFlagEscape(name), start),
                    None => self.emit(TokenKind::Illegal("\\$?".into()), start),
                }
            }
            _ => {
                self.warn("invalid argument escape: expected digit, `@`, `[` or `?`".into());
                self.emit(TokenKind::Illegal("\\$".into()), start);
            }
        }
    }

    /// Read `[name]`. Stops at end of line without consuming the newline.
    fn bracketed_name(&mut self, what: &str) -> Option<String> {
        if self.peek_opt() != Some('[') {
            self.warn(format!("invalid {what} escape: expected `[`"));
            return None;
        }
        self.advance();

        let mut name = String::new();
        loop {
            match self.peek_opt() {
                None | Some('\n') => {
                    self.warn(format!("unterminated {what} escape"));
                    return None;
                }
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
            }
        }

        if name.is_empty() {
            self.warn(format!("empty name in {what} escape"));
            return None;
        }
        Some(name)
    }

    // --- Helpers ---

    fn mark(&self) -> (usize, usize, usize) {
        (self.pos, self.line, self.column)
    }

    fn emit(&mut self, kind: TokenKind, start: (usize, usize, usize)) {
        if !matches!(
            kind,
            TokenKind::MacroName(_)
                | TokenKind::Comment(_)
                | TokenKind::MacroEnd
                | TokenKind::ArgEnd
                | TokenKind::ExtendLine
        ) {
            self.arg_has_content = true;
        }
        let (pos, line, column) = start;
        let span = Span::new(pos, self.pos, line, column);
        self.pending.push_back(Token::new(kind, span));
    }

    fn emit_empty(&mut self, kind: TokenKind) {
        let mark = self.mark();
        self.emit(kind, mark);
    }

    fn flush_text(&mut self, text: &mut String, start: (usize, usize, usize)) {
        if !text.is_empty() {
            self.emit(TokenKind::Text(std::mem::take(text)), start);
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek_opt(), Some(' ') | Some('\t')) {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
        if !self.is_at_end() {
            self.advance();
        }
    }

    fn peek_opt(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> char {
        self.peek_opt().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_opt() {
            self.pos += 1;
            if c == '\n' {
                self.prev_line_width = self.column;
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Record a warning at the current position. When the newline was just
    /// consumed the position belongs to the previous line's end.
    fn warn(&mut self, message: String) {
        let (line, column) =
            if self.column == 1 && self.pos > 0 && self.chars[self.pos - 1] == '\n' {
                (self.line - 1, self.prev_line_width)
            } else {
                (self.line, self.column)
            };
        self.warnings.push(LexerError {
            message,
            line,
            column,
        });
    }
}
