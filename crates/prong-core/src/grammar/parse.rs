//! Parser for grammar source text:
//!
//! ```text
//! grammar     := rule*
//! rule        := IDENT "::=" alternation ";"
//! alternation := sequence ("|" sequence)*
//! sequence    := element* action?
//! element     := STRING | MACRO "(" args ")" | IDENT | "<empty>"
//!              | "(" alternation ")" | "[" alternation "]"
//! action      := "{" expression "}"
//! ```

use crate::error::{Error, ParseError};
use crate::expr::{OperatorTable, PrecedenceParser, TreeBuilder};
use crate::lexer::{unquote, Lexer, Scanner, TokenKind};

use super::{MacroArg, MacroCall, MacroKind, Node, Rule, RuleTable};

/// Parses grammar source text into its rules.
pub fn parse_rules(src: &str) -> Result<RuleTable, Error> {
    let scanner = Scanner::new(src)?;
    GrammarParser::new(scanner).parse()
}

pub struct GrammarParser<L> {
    lexer: L,
    /// operators allowed in action blocks
    operators: OperatorTable,
}

impl<L: Lexer> GrammarParser<L> {
    pub fn new(lexer: L) -> Self {
        Self::with_operators(lexer, OperatorTable::standard())
    }

    pub fn with_operators(lexer: L, operators: OperatorTable) -> Self {
        Self { lexer, operators }
    }

    pub fn parse(&mut self) -> Result<RuleTable, Error> {
        let mut rules = RuleTable::new();
        while self.lexer.current().is_some() {
            let rule = self.rule()?;
            rules.push(rule)?;
        }

        Ok(rules)
    }

    fn rule(&mut self) -> Result<Rule, ParseError> {
        let target = match self.lexer.current() {
            Some(t) if t.kind == TokenKind::Identifier => t.spelling.clone(),
            _ => return Err(ParseError::expected(&self.lexer, "a rule name")),
        };
        self.lexer.advance();
        self.expect("::=")?;
        let body = self.alternation()?;
        self.expect(";")?;

        Ok(Rule::new(target, body))
    }

    fn alternation(&mut self) -> Result<Node, ParseError> {
        let mut alternatives = vec![self.sequence()?];
        while self.lexer.at_punct("|") {
            self.lexer.advance();
            alternatives.push(self.sequence()?);
        }

        Ok(Node::alternative(alternatives))
    }

    fn sequence(&mut self) -> Result<Node, ParseError> {
        let mut elements = Vec::new();
        loop {
            if self.lexer.at_punct("{") {
                elements.push(self.action()?);
                break;
            }

            match self.element()? {
                Some(element) => elements.push(element),
                None => break,
            }
        }

        Ok(Node::sequence(elements))
    }

    /// Parses the next element, or returns `None` at the end of a sequence
    fn element(&mut self) -> Result<Option<Node>, ParseError> {
        let Some(token) = self.lexer.current() else {
            return Ok(None);
        };

        let node = match token.kind {
            TokenKind::Str => {
                let node = Node::literal(unquote(&token.spelling));
                self.lexer.advance();
                node
            }
            TokenKind::Identifier => {
                let name = token.spelling.clone();
                match MacroKind::from_name(&name) {
                    Some(kind) if self.at_nth(1, "(") => self.macro_call(kind)?,
                    _ => {
                        self.lexer.advance();
                        if is_reserved_name(&name) {
                            Node::Reserved(name)
                        } else {
                            Node::NonTerminal(name)
                        }
                    }
                }
            }
            TokenKind::Delimiter if token.spelling == "(" => {
                self.lexer.advance();
                let group = self.alternation()?;
                self.expect(")")?;
                group
            }
            TokenKind::Delimiter if token.spelling == "[" => {
                self.lexer.advance();
                let optional = self.alternation()?;
                self.expect("]")?;
                Node::alternative([optional, Node::Empty])
            }
            TokenKind::Operator if token.spelling == "<" => {
                self.lexer.advance();
                match self.lexer.current() {
                    Some(t) if t.kind == TokenKind::Identifier && t.spelling == "empty" => {
                        self.lexer.advance();
                    }
                    _ => return Err(ParseError::expected(&self.lexer, "`empty`")),
                }
                self.expect(">")?;
                Node::Empty
            }
            _ => return Ok(None),
        };

        Ok(Some(node))
    }

    fn macro_call(&mut self, kind: MacroKind) -> Result<Node, ParseError> {
        let position = self.lexer.position();
        self.lexer.advance();
        self.expect("(")?;

        let mut args = Vec::new();
        while !self.lexer.at_punct(")") {
            if !args.is_empty() {
                self.expect(",")?;
            }

            let arg = match self.lexer.current() {
                Some(t) if t.kind == TokenKind::Identifier => MacroArg::Name(t.spelling.clone()),
                Some(t) if t.kind == TokenKind::Str => MacroArg::Str(unquote(&t.spelling)),
                Some(t) if t.kind == TokenKind::Number => MacroArg::Number(t.spelling.clone()),
                _ => return Err(ParseError::expected(&self.lexer, "a macro argument")),
            };
            self.lexer.advance();
            args.push(arg);
        }
        self.expect(")")?;

        let binding_power = match args.as_slice() {
            [MacroArg::Number(n)] => n.parse::<u32>().ok(),
            _ => None,
        };
        if kind == MacroKind::Precedence && binding_power.is_none() {
            return Err(ParseError::Custom {
                message: "`precedence` takes a single binding power".to_owned(),
                position,
            });
        }

        Ok(Node::MacroCall(MacroCall::new(kind, args)))
    }

    fn action(&mut self) -> Result<Node, ParseError> {
        self.expect("{")?;
        let expr =
            PrecedenceParser::new(&mut self.lexer, &self.operators, TreeBuilder).parse()?;
        self.expect("}")?;

        Ok(Node::Action(expr))
    }

    fn at_nth(&self, n: usize, spelling: &str) -> bool {
        self.lexer.nth(n).is_some_and(|t| {
            matches!(t.kind, TokenKind::Operator | TokenKind::Delimiter) && t.spelling == spelling
        })
    }

    fn expect(&mut self, spelling: &str) -> Result<(), ParseError> {
        if self.lexer.at_punct(spelling) {
            self.lexer.advance();
            Ok(())
        } else {
            Err(ParseError::expected(&self.lexer, format!("`{spelling}`")))
        }
    }
}

/// Token classes and keywords are written in capitals
fn is_reserved_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
