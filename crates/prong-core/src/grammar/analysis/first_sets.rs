use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Index;

use crate::error::GrammarError;
use crate::grammar::{MacroCall, MacroKind, Node, RuleTable};

/// One way an alternative can start: a literal spelling, a reserved token class, or a guard
/// macro that decides on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Literal(String),
    Reserved(String),
    Guard(MacroCall),
}

impl Label {
    /// Renders the label for "expected ..." messages
    pub fn describe(&self) -> String {
        match self {
            Label::Literal(s) => format!("`{s}`"),
            Label::Reserved(name) => name.clone(),
            Label::Guard(call) => call.signature(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Literal(s) | Label::Reserved(s) => f.write_str(s),
            Label::Guard(call) => write!(f, "{call}"),
        }
    }
}

/// The labels that can start a derivation, and whether it can derive the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    labels: BTreeSet<Label>,
    empty: bool,
}

impl FirstSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: Label) -> bool {
        self.labels.insert(label)
    }

    pub fn add_empty(&mut self) {
        self.empty = true;
    }

    pub fn contains_empty(&self) -> bool {
        self.empty
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> + '_ {
        self.labels.iter()
    }

    /// Number of labels, not counting the empty marker
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && !self.empty
    }

    fn singleton(label: Label) -> Self {
        let mut set = Self::new();
        set.add(label);
        set
    }

    fn nullable() -> Self {
        let mut set = Self::new();
        set.add_empty();
        set
    }
}

impl Extend<Label> for FirstSet {
    fn extend<T: IntoIterator<Item = Label>>(&mut self, iter: T) {
        self.labels.extend(iter);
    }
}

impl fmt::Display for FirstSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut sep = "";
        for label in &self.labels {
            write!(f, "{sep}{label}")?;
            sep = ", ";
        }
        if self.empty {
            write!(f, "{sep}EMPTY")?;
        }
        f.write_str("}")
    }
}

/// FIRST sets of every rule of a grammar.
#[derive(Debug, Clone, Default)]
pub struct FirstSets {
    inner: BTreeMap<String, FirstSet>,
}

impl Index<&str> for FirstSets {
    type Output = FirstSet;

    fn index(&self, index: &str) -> &Self::Output {
        match self.first(index) {
            Some(set) => set,
            None => panic!("no first set for rule `{index}`"),
        }
    }
}

impl FirstSets {
    /// Returns the first set of rule `name`
    pub fn first(&self, name: &str) -> Option<&FirstSet> {
        self.inner.get(name)
    }

    /// Computes the first set of `node`, a fragment of one of the resolved rules.
    pub fn first_of(&self, node: &Node) -> Result<FirstSet, GrammarError> {
        FirstSetResolver::seeded(self).first_of(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FirstSet)> + '_ {
        self.inner.iter().map(|(name, set)| (name.as_str(), set))
    }
}

#[derive(Debug)]
enum Resolution {
    InProgress,
    Done(FirstSet),
}

/// Memoizing FIRST set computation over a [`RuleTable`].
///
/// A rule is marked in progress while its body is resolved: reaching it again before it is done
/// means it can derive itself without consuming a token, which is reported as left recursion.
/// Alternatives are checked while their sets are merged: a label that can start two branches makes
/// the grammar ambiguous.
pub struct FirstSetResolver<'g> {
    rules: Option<&'g RuleTable>,
    seed: Option<&'g FirstSets>,
    cache: HashMap<String, Resolution>,
    /// rule whose body is being resolved
    current: String,
}

impl<'g> FirstSetResolver<'g> {
    pub fn new(rules: &'g RuleTable) -> Self {
        Self {
            rules: Some(rules),
            seed: None,
            cache: HashMap::new(),
            current: String::new(),
        }
    }

    fn seeded(sets: &'g FirstSets) -> Self {
        Self {
            rules: None,
            seed: Some(sets),
            cache: HashMap::new(),
            current: String::new(),
        }
    }

    /// Computes the first set of every rule in `rules`, then checks every choice of every rule
    /// for ambiguity.
    pub fn resolve(rules: &'g RuleTable) -> Result<FirstSets, GrammarError> {
        let mut resolver = Self::new(rules);
        for rule in rules.iter() {
            resolver.rule_first(rule.target())?;
        }

        // choices nested in sequence tails are not reached by rule resolution
        for rule in rules.iter() {
            resolver.current = rule.target().to_owned();
            resolver.check_choices(rule.body())?;
        }

        let inner = resolver
            .cache
            .into_iter()
            .filter_map(|(name, resolution)| match resolution {
                Resolution::Done(set) => Some((name, set)),
                Resolution::InProgress => None,
            })
            .collect();

        Ok(FirstSets { inner })
    }

    /// Returns the first set of rule `name`, resolving it if needed
    pub fn rule_first(&mut self, name: &str) -> Result<FirstSet, GrammarError> {
        if let Some(set) = self.seed.and_then(|s| s.first(name)) {
            return Ok(set.clone());
        }

        match self.cache.get(name) {
            Some(Resolution::Done(set)) => return Ok(set.clone()),
            Some(Resolution::InProgress) => {
                return Err(GrammarError::LeftRecursion(name.to_owned()))
            }
            None => (),
        }

        let rule = self
            .rules
            .and_then(|rules| rules.get(name))
            .ok_or_else(|| GrammarError::UndefinedRule(name.to_owned()))?;

        self.cache.insert(name.to_owned(), Resolution::InProgress);
        let outer = std::mem::replace(&mut self.current, name.to_owned());
        let first = self.first_of(rule.body());
        self.current = outer;

        let first = first?;
        self.cache
            .insert(name.to_owned(), Resolution::Done(first.clone()));
        Ok(first)
    }

    /// Computes the first set of an arbitrary node
    pub fn first_of(&mut self, node: &Node) -> Result<FirstSet, GrammarError> {
        match node {
            Node::Sequence { head, tail } => {
                let mut first = self.first_of(head)?;
                // labels shared with the tail are not a conflict, the optional head is taken greedily
                if let (true, Some(tail)) = (first.contains_empty(), tail) {
                    let rest = self.first_of(tail)?;
                    first.extend(rest.labels);
                    first.empty = rest.empty;
                }
                Ok(first)
            }
            Node::Alternative { left, right } => {
                let mut first = self.first_of(left)?;
                let other = self.first_of(right)?;
                if let Some(label) = other.iter().find(|l| first.contains(l)) {
                    return Err(self.ambiguity(label.to_string()));
                }
                if first.contains_empty() && other.contains_empty() {
                    return Err(self.ambiguity("EMPTY".to_owned()));
                }
                first.empty |= other.empty;
                first.extend(other.labels);
                Ok(first)
            }
            Node::Literal(s) => Ok(FirstSet::singleton(Label::Literal(s.clone()))),
            Node::Reserved(s) => Ok(FirstSet::singleton(Label::Reserved(s.clone()))),
            Node::NonTerminal(name) => self.rule_first(name),
            Node::MacroCall(call) => match call.kind {
                MacroKind::Lookahead | MacroKind::Precedence => {
                    Ok(FirstSet::singleton(Label::Guard(call.clone())))
                }
                MacroKind::Error | MacroKind::Recover => Ok(FirstSet::nullable()),
            },
            Node::Action(_) | Node::Empty => Ok(FirstSet::nullable()),
        }
    }

    fn check_choices(&mut self, node: &Node) -> Result<(), GrammarError> {
        match node {
            Node::Alternative { .. } => {
                self.first_of(node)?;
                for alt in node.to_alt_array() {
                    self.check_choices(alt)?;
                }
            }
            Node::Sequence { head, tail } => {
                self.check_choices(head)?;
                if let Some(tail) = tail {
                    self.check_choices(tail)?;
                }
            }
            Node::NonTerminal(name) => {
                self.rule_first(name)?;
            }
            _ => (),
        }

        Ok(())
    }

    fn ambiguity(&self, label: String) -> GrammarError {
        GrammarError::AmbiguousGrammar {
            label,
            rule: self.current.clone(),
        }
    }
}
