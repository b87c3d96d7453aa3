//! Operator-precedence parsing for the expression language embedded in grammar actions.
//!
//! The parser is driven by an [`OperatorTable`] and builds its output through an
//! [`ExprActions`] implementation, so it does not depend on a particular expression tree.
//! [`TreeBuilder`] builds the default [`Expr`] tree.

use std::collections::{HashMap, HashSet};

use crate::lexer::Token;

mod parser;
mod tree;

pub use parser::PrecedenceParser;
pub use tree::{Expr, TreeBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arity {
    /// `op x`
    Prefix,
    /// `x op`
    Postfix,
    /// left-associative `x op y`
    Binary,
    /// right-associative `x op y`
    BinaryRight,
    /// `x [ y ]`, the operand between the delimiters is required
    Bracket { close: String },
    /// `x ( y )`, the operand between the delimiters is optional
    ParamList { close: String },
    /// `( T ) x`
    Cast,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operator {
    pub spelling: String,
    pub opcode: u32,
    pub binding_power: u32,
    pub arity: Arity,
}

impl Operator {
    pub fn new(spelling: impl Into<String>, opcode: u32, binding_power: u32, arity: Arity) -> Self {
        Self {
            spelling: spelling.into(),
            opcode,
            binding_power,
            arity,
        }
    }
}

/// Callbacks used by the [`PrecedenceParser`] to build its result.
pub trait ExprActions {
    type Node;

    /// Builds an operand out of an identifier, literal or reserved word
    fn token_action(&mut self, token: &Token) -> Self::Node;

    /// Applies a prefix or postfix operator
    fn unary_action(&mut self, op: &Operator, operand: Self::Node) -> Self::Node;

    /// Applies a binary, bracket, parameter list or cast operator. `rhs` is `None` only for a
    /// parameter list closed right away.
    fn binary_action(
        &mut self,
        op: &Operator,
        lhs: Self::Node,
        rhs: Option<Self::Node>,
    ) -> Self::Node;
}

impl<A: ExprActions + ?Sized> ExprActions for &mut A {
    type Node = A::Node;

    fn token_action(&mut self, token: &Token) -> Self::Node {
        A::token_action(self, token)
    }

    fn unary_action(&mut self, op: &Operator, operand: Self::Node) -> Self::Node {
        A::unary_action(self, op, operand)
    }

    fn binary_action(
        &mut self,
        op: &Operator,
        lhs: Self::Node,
        rhs: Option<Self::Node>,
    ) -> Self::Node {
        A::binary_action(self, op, lhs, rhs)
    }
}

/// Opcodes of the operators registered by [`OperatorTable::standard`].
pub mod opcode {
    pub const COMMA: u32 = 1;
    pub const ASSIGN: u32 = 2;
    pub const ADD_ASSIGN: u32 = 3;
    pub const SUB_ASSIGN: u32 = 4;
    pub const MUL_ASSIGN: u32 = 5;
    pub const DIV_ASSIGN: u32 = 6;
    pub const REM_ASSIGN: u32 = 7;
    pub const OR: u32 = 8;
    pub const AND: u32 = 9;
    pub const BIT_OR: u32 = 10;
    pub const BIT_XOR: u32 = 11;
    pub const BIT_AND: u32 = 12;
    pub const EQ: u32 = 13;
    pub const NE: u32 = 14;
    pub const LT: u32 = 15;
    pub const GT: u32 = 16;
    pub const LE: u32 = 17;
    pub const GE: u32 = 18;
    pub const SHL: u32 = 19;
    pub const SHR: u32 = 20;
    pub const ADD: u32 = 21;
    pub const SUB: u32 = 22;
    pub const MUL: u32 = 23;
    pub const DIV: u32 = 24;
    pub const REM: u32 = 25;
    pub const POW: u32 = 26;
    pub const NEG: u32 = 27;
    pub const PLUS: u32 = 28;
    pub const NOT: u32 = 29;
    pub const BIT_NOT: u32 = 30;
    pub const POST_INC: u32 = 31;
    pub const POST_DEC: u32 = 32;
    pub const INDEX: u32 = 33;
    pub const CALL: u32 = 34;
    pub const MEMBER: u32 = 35;
    pub const CAST: u32 = 36;
}

/// Spellings that `( T )` must enclose for a following `+` or `-` to be read as a cast.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "bool", "byte", "char", "short", "int", "long", "float", "double",
];

/// Prefix (`nud`) and infix/postfix (`led`) operators, keyed by spelling.
///
/// Operators are registered once, before parsing starts. Spellings registered as terminators end
/// an expression silently in operator position instead of being reported as unimplemented.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    nud: HashMap<String, Operator>,
    led: HashMap<String, Operator>,
    cast: Option<Operator>,
    primitive_types: HashSet<String>,
    terminators: HashSet<String>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(&mut self, spelling: &str, opcode: u32, binding_power: u32) -> &mut Self {
        self.nud.insert(
            spelling.to_owned(),
            Operator::new(spelling, opcode, binding_power, Arity::Prefix),
        );
        self
    }

    pub fn postfix(&mut self, spelling: &str, opcode: u32, binding_power: u32) -> &mut Self {
        self.add_led(Operator::new(spelling, opcode, binding_power, Arity::Postfix))
    }

    pub fn binary(&mut self, spelling: &str, opcode: u32, binding_power: u32) -> &mut Self {
        self.add_led(Operator::new(spelling, opcode, binding_power, Arity::Binary))
    }

    pub fn binary_right(&mut self, spelling: &str, opcode: u32, binding_power: u32) -> &mut Self {
        self.add_led(Operator::new(
            spelling,
            opcode,
            binding_power,
            Arity::BinaryRight,
        ))
    }

    pub fn bracket(
        &mut self,
        open: &str,
        close: &str,
        opcode: u32,
        binding_power: u32,
    ) -> &mut Self {
        let arity = Arity::Bracket {
            close: close.to_owned(),
        };
        self.add_led(Operator::new(open, opcode, binding_power, arity))
    }

    pub fn param_list(
        &mut self,
        open: &str,
        close: &str,
        opcode: u32,
        binding_power: u32,
    ) -> &mut Self {
        let arity = Arity::ParamList {
            close: close.to_owned(),
        };
        self.add_led(Operator::new(open, opcode, binding_power, arity))
    }

    /// Enables `( T ) x` casts. The operand of a cast is parsed at `binding_power`.
    pub fn cast(&mut self, opcode: u32, binding_power: u32) -> &mut Self {
        self.cast = Some(Operator::new("()", opcode, binding_power, Arity::Cast));
        self
    }

    pub fn primitive_types<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primitive_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn terminator(&mut self, spelling: &str) -> &mut Self {
        self.terminators.insert(spelling.to_owned());
        self
    }

    fn add_led(&mut self, op: Operator) -> &mut Self {
        self.led.insert(op.spelling.clone(), op);
        self
    }

    pub fn nud(&self, spelling: &str) -> Option<&Operator> {
        self.nud.get(spelling)
    }

    pub fn led(&self, spelling: &str) -> Option<&Operator> {
        self.led.get(spelling)
    }

    pub fn cast_operator(&self) -> Option<&Operator> {
        self.cast.as_ref()
    }

    pub fn is_primitive_type(&self, spelling: &str) -> bool {
        self.primitive_types.contains(spelling)
    }

    /// Returns whether `spelling` means anything to this table
    pub fn is_known(&self, spelling: &str) -> bool {
        self.nud.contains_key(spelling)
            || self.led.contains_key(spelling)
            || self.terminators.contains(spelling)
    }

    /// A C-like operator set, loosest binding first:
    ///
    /// | bp | operators |
    /// |----|-----------|
    /// | 1  | `,` |
    /// | 2  | `=` `+=` `-=` `*=` `/=` `%=` (right) |
    /// | 3..7 | `\|\|` `&&` `\|` `^` `&` |
    /// | 8  | `==` `!=` |
    /// | 9  | `<` `>` `<=` `>=` |
    /// | 10 | `<<` `>>` |
    /// | 11 | `+` `-` |
    /// | 12 | `*` `/` `%` |
    /// | 13 | `**` (right) |
    /// | 14 | prefix `-` `+` `!` `~`, casts |
    /// | 15 | postfix `++` `--` |
    /// | 16 | `[]` `()` `.` |
    pub fn standard() -> Self {
        use opcode::*;

        let mut table = Self::new();
        table
            .binary(",", COMMA, 1)
            .binary_right("=", ASSIGN, 2)
            .binary_right("+=", ADD_ASSIGN, 2)
            .binary_right("-=", SUB_ASSIGN, 2)
            .binary_right("*=", MUL_ASSIGN, 2)
            .binary_right("/=", DIV_ASSIGN, 2)
            .binary_right("%=", REM_ASSIGN, 2)
            .binary("||", OR, 3)
            .binary("&&", AND, 4)
            .binary("|", BIT_OR, 5)
            .binary("^", BIT_XOR, 6)
            .binary("&", BIT_AND, 7)
            .binary("==", EQ, 8)
            .binary("!=", NE, 8)
            .binary("<", LT, 9)
            .binary(">", GT, 9)
            .binary("<=", LE, 9)
            .binary(">=", GE, 9)
            .binary("<<", SHL, 10)
            .binary(">>", SHR, 10)
            .binary("+", ADD, 11)
            .binary("-", SUB, 11)
            .binary("*", MUL, 12)
            .binary("/", DIV, 12)
            .binary("%", REM, 12)
            .binary_right("**", POW, 13)
            .prefix("-", NEG, 14)
            .prefix("+", PLUS, 14)
            .prefix("!", NOT, 14)
            .prefix("~", BIT_NOT, 14)
            .cast(CAST, 14)
            .postfix("++", POST_INC, 15)
            .postfix("--", POST_DEC, 15)
            .bracket("[", "]", INDEX, 16)
            .param_list("(", ")", CALL, 16)
            .binary(".", MEMBER, 16)
            .primitive_types(PRIMITIVE_TYPES.iter().copied())
            .terminator(":")
            .terminator("?")
            .terminator("=>")
            .terminator("->")
            .terminator("::");
        table
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_table_lookups() {
        let table = OperatorTable::standard();
        assert_eq!(table.led("+").map(|op| op.binding_power), Some(11));
        assert_eq!(table.nud("-").map(|op| op.opcode), Some(opcode::NEG));
        assert_eq!(table.led("**").map(|op| &op.arity), Some(&Arity::BinaryRight));
        assert!(table.nud("*").is_none());
        assert!(table.is_primitive_type("int"));
        assert!(table.is_known(":"));
        assert!(!table.is_known("@"));
    }
}
