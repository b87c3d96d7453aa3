use thiserror::Error;

use crate::lexer::{Lexer, Position};
use crate::prelude::ScanError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Structural defects of a grammar, found while merging or computing FIRST sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("left recursion detected in rule `{0}`")]
    LeftRecursion(String),
    #[error("ambiguous grammar: `{label}` can start more than one alternative in rule `{rule}`")]
    AmbiguousGrammar { label: String, rule: String },
    #[error("empty alternative must appear last, in rule `{rule}`")]
    MalformedAlternation { rule: String },
    #[error("no definition for rule `{0}`")]
    UndefinedRule(String),
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),
    #[error("grammar defines no rules")]
    EmptyGrammar,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{position}: operator `{spelling}` is not implemented")]
    UnimplementedOperator { spelling: String, position: Position },
    #[error("{position}: expected {expected}, found {found}")]
    Syntax {
        expected: String,
        found: String,
        position: Position,
    },
    #[error("{position}: {message}")]
    Custom { message: String, position: Position },
}

impl ParseError {
    /// Builds a syntax error reporting that `expected` was wanted where the lexer currently
    /// stands.
    pub fn expected<L: Lexer + ?Sized>(lexer: &L, expected: impl Into<String>) -> Self {
        let found = match lexer.current() {
            Some(t) => t.to_string(),
            None => "end of input".to_string(),
        };
        Self::Syntax {
            expected: expected.into(),
            found,
            position: lexer.position(),
        }
    }

    pub fn unimplemented<L: Lexer + ?Sized>(lexer: &L, spelling: impl Into<String>) -> Self {
        Self::UnimplementedOperator {
            spelling: spelling.into(),
            position: lexer.position(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::UnimplementedOperator { position, .. }
            | ParseError::Syntax { position, .. }
            | ParseError::Custom { position, .. } => *position,
        }
    }
}
