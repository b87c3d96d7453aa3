mod analysis;
mod ast;
mod parse;

use std::cell::OnceCell;
use std::collections::HashMap;

pub use analysis::*;
pub use ast::{MacroArg, MacroCall, MacroKind, Node, Rule};
pub use parse::{parse_rules, GrammarParser};

use crate::error::{Error, GrammarError};

/// The rules of a grammar, in the order they were written, indexed by target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the table. Targets must be unique.
    pub fn push(&mut self, rule: Rule) -> Result<(), GrammarError> {
        if self.index.contains_key(rule.target()) {
            return Err(GrammarError::DuplicateRule(rule.target().to_owned()));
        }

        self.index.insert(rule.target().to_owned(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    pub fn get(&self, target: &str) -> Option<&Rule> {
        self.index.get(target).map(|&i| &self.rules[i])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule parsing starts from when none is given: the only rule that no rule references,
    /// or the first rule when there is no single such rule.
    pub fn goal(&self) -> Option<&Rule> {
        let mut candidates = self
            .rules
            .iter()
            .filter(|r| !self.rules.iter().any(|other| other.references(r.target())));

        match (candidates.next(), candidates.next()) {
            (Some(goal), None) => Some(goal),
            _ => self.rules.first(),
        }
    }
}

/// A grammar and the analyses computed from it.
///
/// Analyses are computed on first use and cached, errors included.
#[derive(Debug)]
pub struct Grammar {
    rules: RuleTable,
    goal: Option<String>,
    merged: OnceCell<Result<RuleTable, GrammarError>>,
    first_sets: OnceCell<Result<FirstSets, GrammarError>>,
}

impl Grammar {
    /// Parses grammar source text
    pub fn parse(src: &str) -> Result<Self, Error> {
        Ok(Self::from_rules(parse_rules(src)?))
    }

    pub fn from_rules(rules: RuleTable) -> Self {
        Self {
            rules,
            goal: None,
            merged: OnceCell::new(),
            first_sets: OnceCell::new(),
        }
    }

    /// Sets the rule parsing starts from, instead of inferring it
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    /// Returns the rules as written
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Returns the left-factored rules
    pub fn merged(&self) -> Result<&RuleTable, GrammarError> {
        self.merged
            .get_or_init(|| merge_all(&self.rules))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Returns the first sets of the left-factored rules
    pub fn first_sets(&self) -> Result<&FirstSets, GrammarError> {
        self.first_sets
            .get_or_init(|| FirstSetResolver::resolve(self.merged()?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn goal(&self) -> Result<&Rule, GrammarError> {
        match &self.goal {
            Some(name) => self
                .rules
                .get(name)
                .ok_or_else(|| GrammarError::UndefinedRule(name.clone())),
            None => self.rules.goal().ok_or(GrammarError::EmptyGrammar),
        }
    }

    /// Merges the grammar and resolves its first sets, reporting the first defect found.
    pub fn compile(&self) -> Result<CompiledGrammar<'_>, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let rules = self.merged()?;
        let first_sets = self.first_sets()?;
        let goal = self.goal()?.target();

        Ok(CompiledGrammar {
            rules,
            first_sets,
            goal,
        })
    }
}

/// A grammar ready for code generation: left-factored, free of left recursion and unambiguous
/// with one token of lookahead.
#[derive(Debug, Clone, Copy)]
pub struct CompiledGrammar<'g> {
    rules: &'g RuleTable,
    first_sets: &'g FirstSets,
    goal: &'g str,
}

impl<'g> CompiledGrammar<'g> {
    /// Merged rules, in author order
    pub fn rules(&self) -> &'g RuleTable {
        self.rules
    }

    pub fn first(&self, rule: &str) -> Option<&'g FirstSet> {
        self.first_sets.first(rule)
    }

    /// First set of a fragment of one of the merged rules
    pub fn first_of(&self, node: &Node) -> Result<FirstSet, GrammarError> {
        self.first_sets.first_of(node)
    }

    pub fn goal(&self) -> &'g str {
        self.goal
    }
}
