use std::fmt;

mod scanner;

pub mod error;

pub use scanner::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    /// An identifier that the scanner was told to treat as a keyword
    Reserved,
    Number,
    /// A double-quoted string, quotes included in the spelling
    Str,
    Operator,
    /// One of `( ) [ ] { } , ;`
    Delimiter,
}

impl TokenKind {
    /// Whether a token of this kind can stand on its own as an expression operand
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::Reserved | TokenKind::Number | TokenKind::Str
        )
    }
}

/// A location in the scanned source. Lines and columns start at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, spelling: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            position,
        }
    }

    /// Returns whether this token is spelled exactly like the grammar literal `spelling`.
    /// String tokens compare by their unquoted content.
    pub fn is_literal(&self, spelling: &str) -> bool {
        match self.kind {
            TokenKind::Str => unquote(&self.spelling) == spelling,
            _ => self.spelling == spelling,
        }
    }

    /// Returns whether this token belongs to the reserved token class `name`.
    ///
    /// `IDENTIFIER`, `NUMBER` and `STRING` name the corresponding token kinds, any other name is
    /// a keyword that must have been scanned as [`TokenKind::Reserved`].
    pub fn is_reserved(&self, name: &str) -> bool {
        match name {
            "IDENTIFIER" | "IDENT" => self.kind == TokenKind::Identifier,
            "NUMBER" => self.kind == TokenKind::Number,
            "STRING" => self.kind == TokenKind::Str,
            _ => self.kind == TokenKind::Reserved && self.spelling.eq_ignore_ascii_case(name),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.spelling)
    }
}

/// Strips the surrounding quotes of a string spelling and resolves its escapes.
pub fn unquote(spelling: &str) -> String {
    let inner = spelling
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(spelling);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// The token source consumed by the grammar parser, the precedence parser and generated parsers.
///
/// A lexer exposes a window over the remaining tokens: `nth(0)` is the current token, and
/// `advance` consumes it.
pub trait Lexer {
    /// Returns the token `n` positions after the current one, if any
    fn nth(&self, n: usize) -> Option<&Token>;

    /// Consumes and returns the current token
    fn advance(&mut self) -> Option<Token>;

    /// Position of the current token, or of the end of input once exhausted
    fn position(&self) -> Position;

    fn current(&self) -> Option<&Token> {
        self.nth(0)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn current_spelling(&self) -> Option<&str> {
        self.current().map(|t| t.spelling.as_str())
    }

    /// Returns whether the current token is an operator or delimiter spelled `spelling`
    fn at_punct(&self, spelling: &str) -> bool {
        matches!(
            self.current(),
            Some(t) if matches!(t.kind, TokenKind::Operator | TokenKind::Delimiter)
                && t.spelling == spelling
        )
    }
}

impl<L: Lexer + ?Sized> Lexer for &mut L {
    fn nth(&self, n: usize) -> Option<&Token> {
        L::nth(self, n)
    }

    fn advance(&mut self) -> Option<Token> {
        L::advance(self)
    }

    fn position(&self) -> Position {
        L::position(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unquote_escapes() {
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
        assert_eq!(unquote(r#""tab\there""#), "tab\there");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn reserved_classes() {
        let p = Position::default();
        assert!(Token::new(TokenKind::Identifier, "x", p).is_reserved("IDENTIFIER"));
        assert!(Token::new(TokenKind::Number, "1", p).is_reserved("NUMBER"));
        assert!(Token::new(TokenKind::Reserved, "return", p).is_reserved("RETURN"));
        assert!(!Token::new(TokenKind::Identifier, "return", p).is_reserved("RETURN"));
        assert!(Token::new(TokenKind::Str, "\"hi\"", p).is_literal("hi"));
    }
}
