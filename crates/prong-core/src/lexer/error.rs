use thiserror::Error;

use super::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{loc}: {kind}")]
pub struct ScanError {
    /// location in the source of the tokenizer error
    pub loc: Position,
    pub kind: ScanErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
}

impl ScanError {
    pub fn new(loc: Position, kind: ScanErrorKind) -> Self {
        Self { loc, kind }
    }
}
