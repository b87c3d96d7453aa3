//! Property tests for left factoring, on random choices between literal sequences.

use std::collections::BTreeSet;

use prong_core::prelude::{merge, GrammarError, Node, Rule};
use proptest::prelude::*;

type Sentence = Vec<String>;

/// Every sentence a loop-free node derives
fn language(node: &Node) -> BTreeSet<Sentence> {
    match node {
        Node::Sequence { head, tail } => {
            let heads = language(head);
            let tails = tail
                .as_deref()
                .map_or_else(|| BTreeSet::from([Vec::new()]), language);
            heads
                .iter()
                .flat_map(|h| {
                    tails
                        .iter()
                        .map(move |t| h.iter().chain(t).cloned().collect::<Sentence>())
                })
                .collect()
        }
        Node::Alternative { left, right } => {
            let mut sentences = language(left);
            sentences.extend(language(right));
            sentences
        }
        Node::Literal(s) => BTreeSet::from([vec![s.clone()]]),
        Node::Empty => BTreeSet::from([Vec::new()]),
        other => panic!("unexpected node `{other}`"),
    }
}

/// Checks that no two siblings of any choice start with matching heads
fn assert_factored(node: &Node) {
    match node {
        Node::Alternative { .. } => {
            let alternatives = node.to_alt_array();
            for (i, a) in alternatives.iter().enumerate() {
                for b in &alternatives[i + 1..] {
                    assert!(!a.matches(b), "`{a}` and `{b}` share a head in `{node}`");
                }
                assert_factored(a);
            }
        }
        Node::Sequence { head, tail } => {
            assert_factored(head);
            if let Some(tail) = tail {
                assert_factored(tail);
            }
        }
        _ => (),
    }
}

fn build_rule(alternatives: &[Vec<&str>], empty: bool) -> Rule {
    let mut nodes: Vec<Node> = alternatives
        .iter()
        .map(|seq| Node::sequence(seq.iter().map(|s| Node::literal(*s))))
        .collect();
    if empty {
        nodes.push(Node::Empty);
    }

    Rule::new("r", Node::alternative(nodes))
}

/// Factoring leaves an empty alternative before others when an alternative is a prefix of a
/// later one.
fn shadows_later_alternative(alternatives: &[Vec<&str>]) -> bool {
    alternatives
        .iter()
        .enumerate()
        .any(|(i, a)| alternatives[i + 1..].iter().any(|b| b.starts_with(a)))
}

fn word() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "c"])
}

fn choices() -> impl Strategy<Value = (Vec<Vec<&'static str>>, bool)> {
    (
        prop::collection::vec(prop::collection::vec(word(), 1..=3), 1..=5),
        any::<bool>(),
    )
}

/// A sequence element: a literal, or a parenthesized choice between literal sequences
#[derive(Debug, Clone)]
enum Element {
    Word(&'static str),
    Group(Vec<Vec<&'static str>>),
}

impl Element {
    fn node(&self) -> Node {
        match self {
            Element::Word(w) => Node::literal(*w),
            Element::Group(alternatives) => Node::alternative(
                alternatives
                    .iter()
                    .map(|seq| Node::sequence(seq.iter().map(|s| Node::literal(*s)))),
            ),
        }
    }
}

fn grouped_rules() -> impl Strategy<Value = Rule> {
    let element = prop_oneof![
        3 => word().prop_map(Element::Word),
        1 => prop::collection::vec(prop::collection::vec(word(), 1..=2), 1..=3)
            .prop_map(Element::Group),
    ];
    (
        prop::collection::vec(prop::collection::vec(element, 1..=3), 1..=4),
        any::<bool>(),
    )
        .prop_map(|(alternatives, empty)| {
            let mut nodes: Vec<Node> = alternatives
                .iter()
                .map(|seq| Node::sequence(seq.iter().map(Element::node)))
                .collect();
            if empty {
                nodes.push(Node::Empty);
            }
            Rule::new("r", Node::alternative(nodes))
        })
}

proptest! {
    #[test]
    fn merge_preserves_language((alternatives, empty) in choices()) {
        let rule = build_rule(&alternatives, empty);
        if let Ok(merged) = merge(&rule) {
            prop_assert_eq!(language(merged.body()), language(rule.body()));
        }
    }

    #[test]
    fn merged_choices_are_factored((alternatives, empty) in choices()) {
        let rule = build_rule(&alternatives, empty);
        if let Ok(merged) = merge(&rule) {
            assert_factored(merged.body());
        }
    }

    #[test]
    fn merge_is_idempotent((alternatives, empty) in choices()) {
        let rule = build_rule(&alternatives, empty);
        if let Ok(merged) = merge(&rule) {
            prop_assert_eq!(merge(&merged), Ok(merged.clone()));
        }
    }

    #[test]
    fn merge_preserves_language_with_groups(rule in grouped_rules()) {
        if let Ok(merged) = merge(&rule) {
            prop_assert_eq!(language(merged.body()), language(rule.body()));
        }
    }

    #[test]
    fn merged_groups_are_factored(rule in grouped_rules()) {
        if let Ok(merged) = merge(&rule) {
            assert_factored(merged.body());
        }
    }

    #[test]
    fn merge_with_groups_is_idempotent(rule in grouped_rules()) {
        if let Ok(merged) = merge(&rule) {
            prop_assert_eq!(merge(&merged), Ok(merged.clone()));
        }
    }

    #[test]
    fn malformed_only_when_shadowed((alternatives, empty) in choices()) {
        let rule = build_rule(&alternatives, empty);
        match merge(&rule) {
            Ok(_) => prop_assert!(!shadows_later_alternative(&alternatives)),
            Err(err) => {
                prop_assert!(shadows_later_alternative(&alternatives));
                prop_assert_eq!(err, GrammarError::MalformedAlternation { rule: "r".into() });
            }
        }
    }
}
