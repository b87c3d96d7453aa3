use std::collections::HashSet;

use logos::Logos;

use super::error::{ScanError, ScanErrorKind};
use super::{Lexer, Position, Token, TokenKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
enum RawToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // a string that runs into the end of the line without its closing quote
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedStr,

    #[regex(r"::=|::|<<=|>>=|\*\*|\+\+|--|->|=>|==|!=|<=|>=|&&|\|\||<<|>>|\+=|-=|\*=|/=|%=|&=|\|=|\^=")]
    #[regex(r"[-+*/%=<>!&|^~?:.@#$]")]
    Operator,

    #[regex(r"[()\[\]{},;]")]
    Delimiter,
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Identifier => TokenKind::Identifier,
            RawToken::Number => TokenKind::Number,
            RawToken::Str | RawToken::UnterminatedStr => TokenKind::Str,
            RawToken::Operator => TokenKind::Operator,
            RawToken::Delimiter => TokenKind::Delimiter,
        }
    }
}

/// Eagerly tokenized source text, implementing [`Lexer`].
///
/// Identifiers whose lowercase spelling is in the reserved-word set are reported as
/// [`TokenKind::Reserved`].
#[derive(Debug, Clone)]
pub struct Scanner {
    tokens: Vec<Token>,
    cursor: usize,
    end: Position,
}

impl Scanner {
    pub fn new(input: &str) -> Result<Self, ScanError> {
        Self::with_reserved(input, std::iter::empty::<&str>())
    }

    pub fn with_reserved<I, S>(input: &str, reserved: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reserved: HashSet<String> = reserved
            .into_iter()
            .map(|w| w.as_ref().to_ascii_lowercase())
            .collect();
        let lines = LineIndex::new(input);
        let mut tokens = Vec::new();
        let mut raw = RawToken::lexer(input);

        while let Some(next) = raw.next() {
            let span = raw.span();
            let position = lines.position(span.start);
            let kind = match next {
                Ok(RawToken::UnterminatedStr) => {
                    return Err(ScanError::new(position, ScanErrorKind::UnterminatedString))
                }
                Ok(RawToken::Identifier) if reserved.contains(&raw.slice().to_ascii_lowercase()) => {
                    TokenKind::Reserved
                }
                Ok(kind) => TokenKind::from(kind),
                Err(()) => {
                    let c = input[span.start..].chars().next().unwrap_or('\0');
                    return Err(ScanError::new(position, ScanErrorKind::UnexpectedChar(c)));
                }
            };
            tokens.push(Token::new(kind, raw.slice(), position));
        }

        Ok(Self {
            tokens,
            cursor: 0,
            end: lines.position(input.len()),
        })
    }

    /// Returns the tokens that have not been consumed yet
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.cursor..]
    }
}

impl Lexer for Scanner {
    fn nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.cursor + n)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(token)
    }

    fn position(&self) -> Position {
        self.current().map_or(self.end, |t| t.position)
    }
}

/// Byte offsets of the start of every line, used to turn spans into line/column positions.
struct LineIndex<'a> {
    input: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(input: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { input, starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = self.input[self.starts[line]..offset].chars().count() + 1;
        Position::new(offset, line as u32 + 1, column as u32)
    }
}
