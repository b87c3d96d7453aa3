//! Left-factoring grammar compiler.
//!
//! Grammars are written as BNF-like rules, merged into a deterministic decision tree, checked for
//! left recursion and ambiguity through their FIRST sets, and compiled by [`grammar!`] into a
//! recursive descent parser. Expressions embedded in grammars are handled by an
//! operator-precedence parser.
pub use prong_codegen::grammar;
pub use prong_core::prelude::*;
pub use prong_core::{expr, grammar, lexer, runtime};
