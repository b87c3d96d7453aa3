use std::fmt;

use crate::expr::Expr;

/// The escape-hatch macros a grammar may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MacroKind {
    /// `lookahead(A, B, ...)`: guard on the next few tokens, consumes nothing
    Lookahead,
    /// `recover(A, ...)`: skip tokens until one of the arguments is found
    Recover,
    /// `error("message")`: fail with a custom message
    Error,
    /// `precedence(n)`: parse an embedded expression with a minimum binding power of `n`
    Precedence,
}

impl MacroKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lookahead" => Some(Self::Lookahead),
            "recover" => Some(Self::Recover),
            "error" => Some(Self::Error),
            "precedence" => Some(Self::Precedence),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Lookahead => "lookahead",
            Self::Recover => "recover",
            Self::Error => "error",
            Self::Precedence => "precedence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MacroArg {
    Name(String),
    /// unquoted content of a string argument
    Str(String),
    Number(String),
}

impl fmt::Display for MacroArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroArg::Name(n) | MacroArg::Number(n) => f.write_str(n),
            MacroArg::Str(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacroCall {
    pub kind: MacroKind,
    pub args: Vec<MacroArg>,
}

impl MacroCall {
    pub fn new(kind: MacroKind, args: Vec<MacroArg>) -> Self {
        Self { kind, args }
    }

    /// The rendered call, e.g. `lookahead(IDENTIFIER, ":")`. Two calls with the same signature
    /// are interchangeable for merging and lookahead purposes.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MacroCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.name())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// A fragment of a grammar rule body.
///
/// Sequences and alternatives are right-leaning chains. A sequence of a single element is the
/// element itself, so `"a" "b"` is `Sequence { head: "a", tail: Some("b") }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Sequence {
        head: Box<Node>,
        tail: Option<Box<Node>>,
    },
    Alternative {
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Matches an exact spelling
    Literal(String),
    /// Matches a token class or keyword, written in capitals in the grammar source
    Reserved(String),
    /// Reference to another rule
    NonTerminal(String),
    MacroCall(MacroCall),
    /// A `{ expr }` block attached to an alternative
    Action(Expr),
    /// Matches zero tokens
    Empty,
}

impl Node {
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    pub fn reserved(s: impl Into<String>) -> Self {
        Self::Reserved(s.into())
    }

    pub fn non_terminal(s: impl Into<String>) -> Self {
        Self::NonTerminal(s.into())
    }

    /// Builds a canonical sequence out of `elements`: nested sequences are spliced in, `Empty`
    /// elements are dropped, and a lone element is returned as is.
    pub fn sequence(elements: impl IntoIterator<Item = Node>) -> Self {
        let mut flat = Vec::new();
        for element in elements {
            match element {
                Node::Empty => (),
                seq @ Node::Sequence { .. } => flat.extend(seq.to_seq_array().into_iter().cloned()),
                other => flat.push(other),
            }
        }

        let mut nodes = flat.into_iter().rev();
        let Some(last) = nodes.next() else {
            return Node::Empty;
        };

        nodes.fold(last, |tail, head| Node::Sequence {
            head: Box::new(head),
            tail: Some(Box::new(tail)),
        })
    }

    /// Builds a right-leaning choice out of `alternatives`, in order.
    pub fn alternative(alternatives: impl IntoIterator<Item = Node>) -> Self {
        let alternatives: Vec<Node> = alternatives.into_iter().collect();
        let mut nodes = alternatives.into_iter().rev();
        let Some(last) = nodes.next() else {
            return Node::Empty;
        };

        nodes.fold(last, |right, left| Node::Alternative {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Flattens a (possibly nested) alternative chain into its ordered list of choices.
    pub fn to_alt_array(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_alts(&mut out);
        out
    }

    fn collect_alts<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match self {
            Node::Alternative { left, right } => {
                left.collect_alts(out);
                right.collect_alts(out);
            }
            other => out.push(other),
        }
    }

    /// Flattens a sequence chain into its ordered list of elements.
    pub fn to_seq_array(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            match node {
                Node::Sequence { head, tail } => {
                    out.push(&**head);
                    current = tail.as_deref();
                }
                other => {
                    out.push(other);
                    current = None;
                }
            }
        }
        out
    }

    /// First element of a sequence. Any other node is its own head.
    pub fn head(&self) -> &Node {
        match self {
            Node::Sequence { head, .. } => head,
            other => other,
        }
    }

    /// Everything after the head of a sequence.
    pub fn tail(&self) -> Option<&Node> {
        match self {
            Node::Sequence { tail, .. } => tail.as_deref(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Head equality used to group alternatives while merging.
    ///
    /// Terminals match when they have the same variant and spelling, and macro calls when they
    /// have the same signature. A parenthesized group only matches an identical group. `Empty`
    /// and actions match nothing, not even themselves.
    pub fn matches(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Sequence { head, .. }, _) => head.matches(other.head()),
            (_, Node::Sequence { head, .. }) => self.matches(head),
            (Node::Literal(a), Node::Literal(b)) => a == b,
            (Node::Reserved(a), Node::Reserved(b)) => a == b,
            (Node::NonTerminal(a), Node::NonTerminal(b)) => a == b,
            (Node::MacroCall(a), Node::MacroCall(b)) => a == b,
            (Node::Alternative { .. }, Node::Alternative { .. }) => self == other,
            _ => false,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Sequence { head, tail } => {
                write_grouped(f, head)?;
                if let Some(tail) = tail {
                    f.write_str(" ")?;
                    match **tail {
                        Node::Alternative { .. } => write!(f, "({tail})")?,
                        _ => write!(f, "{tail}")?,
                    }
                }
                Ok(())
            }
            Node::Alternative { left, right } => {
                write_grouped(f, left)?;
                write!(f, " | {right}")
            }
            Node::Literal(s) => write!(f, "{s:?}"),
            Node::Reserved(s) | Node::NonTerminal(s) => f.write_str(s),
            Node::MacroCall(call) => write!(f, "{call}"),
            Node::Action(expr) => write!(f, "{{ {expr} }}"),
            Node::Empty => f.write_str("<empty>"),
        }
    }
}

fn write_grouped(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Alternative { .. } => write!(f, "({node})"),
        _ => write!(f, "{node}"),
    }
}

/// One production: `target ::= body ;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    target: String,
    body: Node,
}

impl Rule {
    pub fn new(target: impl Into<String>, body: Node) -> Self {
        Self {
            target: target.into(),
            body,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    /// Returns whether the body mentions the rule `name`
    pub fn references(&self, name: &str) -> bool {
        fn walk(node: &Node, name: &str) -> bool {
            match node {
                Node::Sequence { head, tail } => {
                    walk(head, name) || tail.as_deref().is_some_and(|t| walk(t, name))
                }
                Node::Alternative { left, right } => walk(left, name) || walk(right, name),
                Node::NonTerminal(n) => n == name,
                _ => false,
            }
        }

        walk(&self.body, name)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::= {} ;", self.target, self.body)
    }
}
