use std::fmt;

use crate::lexer::{Token, TokenKind};

use super::{Arity, ExprActions, Operator};

/// Expression tree built by [`TreeBuilder`].
///
/// Operands keep their kind and spelling only, so two trees parsed from differently laid out
/// sources compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Atom {
        kind: TokenKind,
        spelling: String,
    },
    Unary {
        op: Operator,
        operand: Box<Expr>,
    },
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn atom(kind: TokenKind, spelling: impl Into<String>) -> Self {
        Self::Atom {
            kind,
            spelling: spelling.into(),
        }
    }

    /// Opcode of the outermost operator, `None` for an operand
    pub fn opcode(&self) -> Option<u32> {
        match self {
            Expr::Atom { .. } => None,
            Expr::Unary { op, .. } | Expr::Binary { op, .. } => Some(op.opcode),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom { spelling, .. } => f.write_str(spelling),
            Expr::Unary { op, operand } => match op.arity {
                Arity::Postfix => write!(f, "({operand}{})", op.spelling),
                _ => write!(f, "({}{operand})", op.spelling),
            },
            Expr::Binary { op, lhs, rhs } => match (&op.arity, rhs) {
                (Arity::Bracket { close } | Arity::ParamList { close }, Some(rhs)) => {
                    write!(f, "{lhs}{}{rhs}{close}", op.spelling)
                }
                (Arity::Bracket { close } | Arity::ParamList { close }, None) => {
                    write!(f, "{lhs}{}{close}", op.spelling)
                }
                (Arity::Cast, Some(rhs)) => write!(f, "(({lhs}) {rhs})"),
                (_, Some(rhs)) => write!(f, "({lhs} {} {rhs})", op.spelling),
                (_, None) => write!(f, "({lhs} {})", op.spelling),
            },
        }
    }
}

/// Builds [`Expr`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder;

impl ExprActions for TreeBuilder {
    type Node = Expr;

    fn token_action(&mut self, token: &Token) -> Expr {
        Expr::atom(token.kind, token.spelling.clone())
    }

    fn unary_action(&mut self, op: &Operator, operand: Expr) -> Expr {
        Expr::Unary {
            op: op.clone(),
            operand: Box::new(operand),
        }
    }

    fn binary_action(&mut self, op: &Operator, lhs: Expr, rhs: Option<Expr>) -> Expr {
        Expr::Binary {
            op: op.clone(),
            lhs: Box::new(lhs),
            rhs: rhs.map(Box::new),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::opcode;
    use crate::expr::{OperatorTable, PrecedenceParser};
    use crate::lexer::Scanner;

    fn parse(input: &str) -> Expr {
        let table = OperatorTable::standard();
        let scanner = Scanner::new(input).unwrap();
        PrecedenceParser::new(scanner, &table, TreeBuilder)
            .parse()
            .unwrap()
    }

    #[test]
    fn layout_does_not_matter() {
        assert_eq!(parse("a+b*c"), parse("a +\n  b * c"));
        assert_ne!(parse("a+b*c"), parse("(a+b)*c"));
    }

    #[test]
    fn opcodes() {
        assert_eq!(parse("-x").opcode(), Some(opcode::NEG));
        assert_eq!(parse("x - y").opcode(), Some(opcode::SUB));
        assert_eq!(parse("(T) x").opcode(), Some(opcode::CAST));
        assert_eq!(parse("x").opcode(), None);
    }

    #[test]
    fn structure() {
        let Expr::Binary { op, lhs, rhs } = parse("f()") else {
            panic!("expected a call");
        };
        assert_eq!(op.opcode, opcode::CALL);
        assert_eq!(*lhs, Expr::atom(TokenKind::Identifier, "f"));
        assert!(rhs.is_none());
    }
}
