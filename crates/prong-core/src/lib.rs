mod error;
pub mod expr;
pub mod grammar;
pub mod lexer;
pub mod runtime;

pub mod prelude {
    pub use crate::error::{Error, GrammarError, ParseError};
    pub use crate::expr::{Arity, Expr, ExprActions, Operator, OperatorTable, PrecedenceParser, TreeBuilder};
    pub use crate::grammar::{
        merge, merge_all, CompiledGrammar, FirstSet, FirstSetResolver, FirstSets, Grammar, Label,
        MacroArg, MacroCall, MacroKind, Node, Rule, RuleTable,
    };
    pub use crate::lexer::error::{ScanError, ScanErrorKind};
    pub use crate::lexer::{Lexer, Position, Scanner, Token, TokenKind};
    pub use crate::runtime::{SyntaxElement, SyntaxNode};
}
