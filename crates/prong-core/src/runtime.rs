//! Support code for the parsers generated by `prong::grammar!`.
//!
//! Generated parsers are direct-coded recursive descent: every rule becomes a method that
//! inspects the current token through the predicates below and builds a [`SyntaxNode`].

use std::fmt;

use crate::error::ParseError;
use crate::expr::{Expr, OperatorTable, PrecedenceParser, TreeBuilder};
use crate::lexer::{Lexer, Token, TokenKind};

/// The syntax tree built by generated parsers: one node per rule invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub rule: &'static str,
    pub children: Vec<SyntaxElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement {
    Token(Token),
    Node(SyntaxNode),
    /// An expression parsed by `precedence(n)`
    Expr(Expr),
    /// The rendered action block of the alternative that was taken
    Action(&'static str),
}

impl SyntaxNode {
    pub fn new(rule: &'static str) -> Self {
        Self {
            rule,
            children: Vec::new(),
        }
    }

    /// Child nodes, in order
    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> + '_ {
        self.children.iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(n),
            _ => None,
        })
    }

    /// Returns the first child node built by `rule`
    pub fn find(&self, rule: &str) -> Option<&SyntaxNode> {
        self.nodes().find(|n| n.rule == rule)
    }

    /// All tokens under this node, in source order
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        for child in &self.children {
            match child {
                SyntaxElement::Token(t) => out.push(t),
                SyntaxElement::Node(n) => n.collect_tokens(out),
                SyntaxElement::Expr(_) | SyntaxElement::Action(_) => (),
            }
        }
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.rule)?;
        for child in &self.children {
            write!(f, " {child}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for SyntaxElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxElement::Token(t) => f.write_str(&t.spelling),
            SyntaxElement::Node(n) => write!(f, "{n}"),
            SyntaxElement::Expr(e) => write!(f, "{e}"),
            SyntaxElement::Action(a) => write!(f, "{{ {a} }}"),
        }
    }
}

/// A single-token expectation, as named in `lookahead(...)` and `recover(...)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect<'a> {
    Literal(&'a str),
    Reserved(&'a str),
}

impl Expect<'_> {
    pub fn matches(&self, token: &Token) -> bool {
        match *self {
            Expect::Literal(s) => token.is_literal(s),
            Expect::Reserved(name) => token.is_reserved(name),
        }
    }
}

pub fn at_literal<L: Lexer + ?Sized>(lexer: &L, spelling: &str) -> bool {
    lexer.current().is_some_and(|t| t.is_literal(spelling))
}

pub fn at_reserved<L: Lexer + ?Sized>(lexer: &L, name: &str) -> bool {
    lexer.current().is_some_and(|t| t.is_reserved(name))
}

/// Returns whether the next tokens match `expected`, one token each
pub fn at_lookahead<L: Lexer + ?Sized>(lexer: &L, expected: &[Expect<'_>]) -> bool {
    expected
        .iter()
        .enumerate()
        .all(|(i, e)| lexer.nth(i).is_some_and(|t| e.matches(t)))
}

/// Returns whether the current token can start an expression. Keywords never do, so that a
/// `precedence(n)` branch does not shadow a later branch starting with a keyword.
pub fn at_expression<L: Lexer + ?Sized>(lexer: &L, operators: &OperatorTable) -> bool {
    lexer.current().is_some_and(|t| match t.kind {
        TokenKind::Delimiter => t.spelling == "(" || operators.nud(&t.spelling).is_some(),
        TokenKind::Operator => operators.nud(&t.spelling).is_some(),
        TokenKind::Reserved => false,
        TokenKind::Identifier | TokenKind::Number | TokenKind::Str => true,
    })
}

pub fn expect_literal<L: Lexer + ?Sized>(lexer: &mut L, spelling: &str) -> Result<Token, ParseError> {
    if at_literal(&*lexer, spelling) {
        if let Some(token) = lexer.advance() {
            return Ok(token);
        }
    }

    Err(ParseError::expected(&*lexer, format!("`{spelling}`")))
}

pub fn expect_reserved<L: Lexer + ?Sized>(lexer: &mut L, name: &str) -> Result<Token, ParseError> {
    if at_reserved(&*lexer, name) {
        if let Some(token) = lexer.advance() {
            return Ok(token);
        }
    }

    Err(ParseError::expected(&*lexer, name))
}

/// Parses an expression whose operators bind at least as tightly as `min_bp`
pub fn expression<L: Lexer>(
    lexer: &mut L,
    operators: &OperatorTable,
    min_bp: u32,
) -> Result<Expr, ParseError> {
    PrecedenceParser::new(lexer, operators, TreeBuilder).expression(min_bp)
}

/// Skips tokens up to, not including, the first one matching any of `anchors`. Returns the
/// skipped tokens.
pub fn recover<L: Lexer + ?Sized>(lexer: &mut L, anchors: &[Expect<'_>]) -> Vec<Token> {
    let mut skipped = Vec::new();
    while let Some(token) = lexer.current() {
        if anchors.iter().any(|a| a.matches(token)) {
            break;
        }
        skipped.extend(lexer.advance());
    }

    skipped
}

pub fn fail<L: Lexer + ?Sized>(lexer: &L, message: &str) -> ParseError {
    ParseError::Custom {
        message: message.to_owned(),
        position: lexer.position(),
    }
}

/// Reports that none of `labels` was found
pub fn expected<L: Lexer + ?Sized>(lexer: &L, labels: &[&str]) -> ParseError {
    let expected = match labels {
        [] => "end of input".to_owned(),
        [one] => (*one).to_owned(),
        [init @ .., last] => format!("one of {}, {last}", init.join(", ")),
    };

    ParseError::expected(lexer, expected)
}

pub fn expect_end<L: Lexer + ?Sized>(lexer: &L) -> Result<(), ParseError> {
    match lexer.current() {
        None => Ok(()),
        Some(_) => Err(ParseError::expected(lexer, "end of input")),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::Scanner;

    #[test]
    fn predicates() {
        let scanner = Scanner::with_reserved(r#"let x = "s""#, ["let"]).unwrap();
        assert!(at_literal(&scanner, "let"));
        assert!(at_reserved(&scanner, "LET"));
        assert!(!at_reserved(&scanner, "IDENT"));
        assert!(at_lookahead(
            &scanner,
            &[Expect::Reserved("LET"), Expect::Reserved("IDENT"), Expect::Literal("=")]
        ));
        assert!(!at_lookahead(
            &scanner,
            &[Expect::Reserved("LET"), Expect::Literal("=")]
        ));
    }

    #[test]
    fn expects() {
        let mut scanner = Scanner::new("a = 1").unwrap();
        assert_eq!(expect_reserved(&mut scanner, "IDENT").unwrap().spelling, "a");
        let err = expect_literal(&mut scanner, ":").unwrap_err();
        assert_eq!(err.to_string(), "1:3: expected `:`, found `=`");
        expect_literal(&mut scanner, "=").unwrap();
        assert!(expect_end(&scanner).is_err());
        expect_reserved(&mut scanner, "NUMBER").unwrap();
        assert!(expect_end(&scanner).is_ok());
    }

    #[test]
    fn expressions() {
        let operators = OperatorTable::standard();
        let mut scanner = Scanner::new("a + b * c ;").unwrap();
        assert!(at_expression(&scanner, &operators));
        assert_eq!(
            expression(&mut scanner, &operators, 0).unwrap().to_string(),
            "(a + (b * c))"
        );
        assert!(!at_expression(&scanner, &operators));

        let mut scanner = Scanner::new("a + b * c").unwrap();
        assert_eq!(
            expression(&mut scanner, &operators, 12).unwrap().to_string(),
            "a"
        );
        let scanner = Scanner::with_reserved("return x", ["return"]).unwrap();
        assert!(!at_expression(&scanner, &operators));
    }

    #[test]
    fn recovery() {
        let mut scanner = Scanner::new("x y + ; z").unwrap();
        let skipped = recover(&mut scanner, &[Expect::Literal(";")]);
        assert_eq!(skipped.len(), 3);
        assert_eq!(scanner.current_spelling(), Some(";"));

        let skipped = recover(&mut scanner, &[Expect::Literal("}")]);
        assert_eq!(skipped.len(), 2);
        assert!(scanner.current().is_none());
    }

    #[test]
    fn messages() {
        let scanner = Scanner::new("?").unwrap();
        assert_eq!(
            expected(&scanner, &["`a`", "`b`", "IDENT"]).to_string(),
            "1:1: expected one of `a`, `b`, IDENT, found `?`"
        );
        assert_eq!(
            fail(&scanner, "no statement").to_string(),
            "1:1: no statement"
        );
    }

    #[test]
    fn display() {
        let mut node = SyntaxNode::new("assign");
        let scanner = Scanner::new("x").unwrap();
        node.children
            .push(SyntaxElement::Token(scanner.current().unwrap().clone()));
        let mut inner = SyntaxNode::new("value");
        inner.children.push(SyntaxElement::Action("(1 + 2)"));
        node.children.push(SyntaxElement::Node(inner));
        assert_eq!(node.to_string(), "(assign x (value { (1 + 2) }))");
        assert_eq!(node.find("value").map(|n| n.rule), Some("value"));
        assert_eq!(node.tokens().len(), 1);
    }
}
