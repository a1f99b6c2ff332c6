use serde::Serialize;

/// A position in source text, tracking line and column for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Literal escapes: `\&`, `\e` and `\~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EscapeCode {
    /// `\&`: zero-width, used to protect a leading dot or dash.
    ZeroWidth,
    /// `\e`: a literal backslash.
    Backslash,
    /// `\~`: a non-breaking space.
    Nbsp,
}

impl EscapeCode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '&' => Some(EscapeCode::ZeroWidth),
            'e' => Some(EscapeCode::Backslash),
            '~' => Some(EscapeCode::Nbsp),
            _ => None,
        }
    }

    /// The character following the backslash in source form.
    pub fn as_char(self) -> char {
        match self {
            EscapeCode::ZeroWidth => '&',
            EscapeCode::Backslash => 'e',
            EscapeCode::Nbsp => '~',
        }
    }

    /// The literal text this escape stands for.
    pub fn substitution(self) -> &'static str {
        match self {
            EscapeCode::ZeroWidth => "",
            EscapeCode::Backslash => "\\",
            EscapeCode::Nbsp => "\u{a0}",
        }
    }
}

/// A positional parameter reference inside a user macro body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArgRef {
    /// `\$1` .. `\$9`
    Index(usize),
    /// `\$@`: every argument past the macro's declared arity.
    Rest,
}

/// Token classification for frundis source.
///
/// Data-carrying variants embed their value directly.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Name following a leading `.` on a line.
    MacroName(String),
    /// Literal text, either in a macro argument or in a text line.
    Text(String),
    Escape(EscapeCode),
    /// `\*[name]`
    VarEscape(String),
    /// `\$1`, `\$@`
    ArgEscape(ArgRef),
    /// `\$[name]`
    NamedArgEscape(String),
    /// `\$?[name]`
    NamedFlagEscape(String),
    /// `\"` comment, or a whole `.\"` comment line.
    Comment(String),
    MacroEnd,
    ArgEnd,
    /// Backslash-newline continuation.
    ExtendLine,
    /// Malformed input already reported as a warning.
    Illegal(String),
    Eof,
}

/// A token produced by the frundis scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }
}
