use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

use super::{Arity, ExprActions, OperatorTable};

/// Precedence-climbing parser over a token source.
///
/// The parser owns its cursor (the lexer), so an instance can run several parses one after the
/// other, but never two at once.
pub struct PrecedenceParser<'t, L, A> {
    lexer: L,
    table: &'t OperatorTable,
    actions: A,
}

/// Spelling of a token that may name an operator. Identifiers, numbers and strings never do.
fn operator_spelling(token: &Token) -> Option<&str> {
    match token.kind {
        TokenKind::Operator | TokenKind::Delimiter | TokenKind::Reserved => {
            Some(token.spelling.as_str())
        }
        _ => None,
    }
}

impl<'t, L: Lexer, A: ExprActions> PrecedenceParser<'t, L, A> {
    pub fn new(lexer: L, table: &'t OperatorTable, actions: A) -> Self {
        Self {
            lexer,
            table,
            actions,
        }
    }

    pub fn lexer(&self) -> &L {
        &self.lexer
    }

    pub fn into_lexer(self) -> L {
        self.lexer
    }

    /// Parses a full expression, with every registered operator allowed
    pub fn parse(&mut self) -> Result<A::Node, ParseError> {
        self.expression(0)
    }

    /// Parses an expression whose infix operators all bind at least as tightly as `min_bp`
    pub fn expression(&mut self, min_bp: u32) -> Result<A::Node, ParseError> {
        let table = self.table;
        let mut left = self.unary_expression()?;

        loop {
            let Some(token) = self.lexer.current() else {
                break;
            };
            let Some(spelling) = operator_spelling(token) else {
                break;
            };
            let Some(op) = table.led(spelling) else {
                if token.kind == TokenKind::Operator && !table.is_known(spelling) {
                    return Err(ParseError::unimplemented(&self.lexer, spelling));
                }
                break;
            };
            if op.binding_power < min_bp {
                break;
            }

            self.lexer.advance();
            left = match op.arity {
                Arity::Binary => {
                    let rhs = self.expression(op.binding_power.saturating_add(1))?;
                    self.actions.binary_action(op, left, Some(rhs))
                }
                Arity::BinaryRight => {
                    let rhs = self.expression(op.binding_power)?;
                    self.actions.binary_action(op, left, Some(rhs))
                }
                Arity::Postfix | Arity::Prefix => self.actions.unary_action(op, left),
                Arity::Bracket { ref close } => {
                    let inner = self.expression(0)?;
                    self.expect(close)?;
                    self.actions.binary_action(op, left, Some(inner))
                }
                Arity::ParamList { ref close } => {
                    if self.lexer.at_punct(close) {
                        self.lexer.advance();
                        self.actions.binary_action(op, left, None)
                    } else {
                        let inner = self.expression(0)?;
                        self.expect(close)?;
                        self.actions.binary_action(op, left, Some(inner))
                    }
                }
                Arity::Cast => {
                    let rhs = self.expression(op.binding_power)?;
                    self.actions.binary_action(op, left, Some(rhs))
                }
            };
        }

        Ok(left)
    }

    fn unary_expression(&mut self) -> Result<A::Node, ParseError> {
        let table = self.table;
        let Some(token) = self.lexer.current() else {
            return Err(ParseError::expected(&self.lexer, "expression"));
        };

        if token.kind == TokenKind::Delimiter && token.spelling == "(" {
            return self.parenthesized();
        }

        if let Some(op) = operator_spelling(token).and_then(|s| table.nud(s)) {
            self.lexer.advance();
            let operand = self.expression(op.binding_power)?;
            return Ok(self.actions.unary_action(op, operand));
        }

        match token.kind {
            kind if kind.is_operand() => {
                let token = token.clone();
                self.lexer.advance();
                Ok(self.actions.token_action(&token))
            }
            TokenKind::Operator => {
                let spelling = token.spelling.clone();
                Err(ParseError::unimplemented(&self.lexer, spelling))
            }
            _ => Err(ParseError::expected(&self.lexer, "expression")),
        }
    }

    /// Parses `( sub )`, then decides whether the parentheses were a cast of what follows.
    fn parenthesized(&mut self) -> Result<A::Node, ParseError> {
        self.expect("(")?;

        // only a single-token sub-expression can spell a primitive type
        let single_token = match (self.lexer.nth(0), self.lexer.nth(1)) {
            (Some(t), Some(close))
                if t.kind.is_operand()
                    && close.kind == TokenKind::Delimiter
                    && close.spelling == ")" =>
            {
                Some(t.spelling.clone())
            }
            _ => None,
        };

        let sub = self.expression(0)?;
        self.expect(")")?;

        let table = self.table;
        match table.cast_operator() {
            Some(cast) if self.is_cast(single_token.as_deref()) => {
                let operand = self.expression(cast.binding_power)?;
                Ok(self.actions.binary_action(cast, sub, Some(operand)))
            }
            _ => Ok(sub),
        }
    }

    /// Cast heuristic, applied right after a closing parenthesis: an operand or a prefix
    /// operator must be the start of a cast operand. `+` and `-` may also be binary, so they
    /// only make a cast when the parentheses enclose a primitive type.
    fn is_cast(&self, enclosed: Option<&str>) -> bool {
        let Some(token) = self.lexer.current() else {
            return false;
        };

        if token.kind.is_operand() && self.table.nud(&token.spelling).is_none() {
            return true;
        }

        match operator_spelling(token) {
            Some("+" | "-") => enclosed.is_some_and(|t| self.table.is_primitive_type(t)),
            Some(s) => self.table.nud(s).is_some(),
            None => false,
        }
    }

    fn expect(&mut self, spelling: &str) -> Result<Token, ParseError> {
        if self.lexer.at_punct(spelling) {
            if let Some(token) = self.lexer.advance() {
                return Ok(token);
            }
        }

        Err(ParseError::expected(&self.lexer, format!("`{spelling}`")))
    }
}

#[cfg(test)]
mod test {
    use crate::expr::{opcode, Expr, OperatorTable, TreeBuilder};
    use crate::lexer::{Lexer, Scanner};
    use crate::prelude::ParseError;

    use super::*;

    fn parse_with(table: &OperatorTable, input: &str) -> Result<Expr, ParseError> {
        let scanner = Scanner::with_reserved(input, ["int", "true", "false"]).unwrap();
        let mut parser = PrecedenceParser::new(scanner, table, TreeBuilder);
        let expr = parser.parse()?;
        assert!(parser.lexer().current().is_none(), "trailing input");
        Ok(expr)
    }

    fn parse(input: &str) -> String {
        parse_with(&OperatorTable::standard(), input)
            .unwrap()
            .to_string()
    }

    #[test]
    fn precedence() {
        assert_eq!(parse("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parse("1 * 2 + 3"), "((1 * 2) + 3)");
        assert_eq!(parse("a || b && c == d"), "(a || (b && (c == d)))");
    }

    #[test]
    fn associativity() {
        assert_eq!(parse("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(parse("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
        assert_eq!(parse("a = b = c"), "(a = (b = c))");
    }

    #[test]
    fn unary_and_postfix() {
        assert_eq!(parse("-a * b"), "((-a) * b)");
        assert_eq!(parse("!a.b"), "(!(a . b))");
        assert_eq!(parse("i++ + 1"), "((i++) + 1)");
    }

    #[test]
    fn brackets_and_calls() {
        assert_eq!(parse("a[i + 1]"), "a[(i + 1)]");
        assert_eq!(parse("f()"), "f()");
        assert_eq!(parse("f(a, b)(c)"), "f((a , b))(c)");
        assert_eq!(parse("m[0][1]"), "m[0][1]");
    }

    #[test]
    fn grouping() {
        assert_eq!(parse("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(parse("((a))"), "a");
    }

    #[test]
    fn casts() {
        assert_eq!(parse("(int) x"), "((int) x)");
        assert_eq!(parse("(int) x + 1"), "(((int) x) + 1)");
        assert_eq!(parse("(x) - 2"), "(x - 2)");
        assert_eq!(parse("(int) -x"), "((int) (-x))");
        assert_eq!(parse("(Foo) !b"), "((Foo) (!b))");
        assert_eq!(parse("(f)(x)"), "f(x)");
    }

    #[test]
    fn casts_need_a_cast_operator() {
        let mut table = OperatorTable::new();
        table.binary("-", opcode::SUB, 1).prefix("-", opcode::NEG, 2);
        let scanner = Scanner::with_reserved("(int) x", ["int"]).unwrap();
        let mut parser = PrecedenceParser::new(scanner, &table, TreeBuilder);
        // without a cast operator `(int)` is a group, and `x` is left over
        assert_eq!(parser.parse().unwrap().to_string(), "int");
        assert_eq!(parser.lexer().current_spelling(), Some("x"));
    }

    #[test]
    fn maximum_binding_power() {
        let mut table = OperatorTable::new();
        table.binary("+", opcode::ADD, u32::MAX);
        assert_eq!(parse_with(&table, "1 + 2").unwrap().to_string(), "(1 + 2)");
    }

    #[test]
    fn reserved_operands() {
        assert_eq!(parse("true && x"), "(true && x)");
    }

    #[test]
    fn unimplemented_operator() {
        let err = parse_with(&OperatorTable::standard(), "a @ b").unwrap_err();
        assert!(matches!(err, ParseError::UnimplementedOperator { ref spelling, .. } if spelling == "@"));

        let err = parse_with(&OperatorTable::standard(), "@a").unwrap_err();
        assert!(matches!(err, ParseError::UnimplementedOperator { ref spelling, .. } if spelling == "@"));
    }

    #[test]
    fn syntax_errors() {
        let err = parse_with(&OperatorTable::standard(), "a[1").unwrap_err();
        match err {
            ParseError::Syntax {
                expected, found, ..
            } => {
                assert_eq!(expected, "`]`");
                assert_eq!(found, "end of input");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = parse_with(&OperatorTable::standard(), "1 +").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { ref expected, .. } if expected == "expression"));

        let err = parse_with(&OperatorTable::standard(), "(a b").unwrap_err();
        assert_eq!(err.position().column, 4);
    }

    #[test]
    fn terminators_end_expressions() {
        let table = OperatorTable::standard();
        let scanner = Scanner::new("a + b : c").unwrap();
        let mut parser = PrecedenceParser::new(scanner, &table, TreeBuilder);
        assert_eq!(parser.parse().unwrap().to_string(), "(a + b)");
        assert_eq!(parser.lexer().current_spelling(), Some(":"));
    }

    #[test]
    fn sequential_parses() {
        let table = OperatorTable::standard();
        let scanner = Scanner::new("a * b ; c - d").unwrap();
        let mut parser = PrecedenceParser::new(scanner, &table, TreeBuilder);
        assert_eq!(parser.parse().unwrap().to_string(), "(a * b)");
        let mut scanner = parser.into_lexer();
        scanner.advance();
        let mut parser = PrecedenceParser::new(scanner, &table, TreeBuilder);
        assert_eq!(parser.expression(0).unwrap().to_string(), "(c - d)");
    }
}
