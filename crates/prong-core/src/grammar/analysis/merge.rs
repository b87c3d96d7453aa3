use crate::error::GrammarError;
use crate::grammar::{Node, Rule, RuleTable};

/// Left-factors the body of `rule`.
///
/// Alternatives starting with matching heads are grouped, in order of first appearance, and
/// rewritten as `head (tail1 | tail2 | ...)`, recursively, so that no two siblings of a merged
/// choice start with matching heads. The rule matches the same language afterwards, and merging
/// a merged rule changes nothing.
pub fn merge(rule: &Rule) -> Result<Rule, GrammarError> {
    let engine = MergeEngine {
        rule: rule.target(),
    };
    let body = engine.merge_node(rule.body())?;
    Ok(Rule::new(rule.target(), body))
}

/// Merges every rule of `table`, keeping their order.
pub fn merge_all(table: &RuleTable) -> Result<RuleTable, GrammarError> {
    let mut merged = RuleTable::new();
    for rule in table.iter() {
        merged.push(merge(rule)?)?;
    }

    Ok(merged)
}

struct MergeEngine<'r> {
    /// rule being merged, for error reporting
    rule: &'r str,
}

impl MergeEngine<'_> {
    fn merge_node(&self, node: &Node) -> Result<Node, GrammarError> {
        match node {
            Node::Alternative { .. } => self.merge_alternatives(node.to_alt_array()),
            Node::Sequence { head, tail } => {
                let head = self.merge_node(head)?;
                let tail = match tail {
                    Some(tail) => self.merge_node(tail)?,
                    None => Node::Empty,
                };
                Ok(Node::sequence([head, tail]))
            }
            other => Ok(other.clone()),
        }
    }

    fn merge_alternatives(&self, alternatives: Vec<&Node>) -> Result<Node, GrammarError> {
        // heads are merged before grouping: `("a" "b" | "a" "c") "x"` starts with `"a"`
        let normalized = alternatives
            .into_iter()
            .flat_map(Node::to_alt_array)
            .map(|n| self.merge_node(n))
            .collect::<Result<Vec<_>, _>>()?;

        self.factor(normalized)
    }

    /// Groups already merged alternatives by head. Previously merged groups are reopened, so
    /// that `a (b | c) | a d` becomes `a (b | c | d)`.
    fn factor(&self, alternatives: Vec<Node>) -> Result<Node, GrammarError> {
        let flat: Vec<&Node> = alternatives.iter().flat_map(Node::to_alt_array).collect();

        if let Some(pos) = flat.iter().position(|n| n.is_empty()) {
            if pos != flat.len() - 1 {
                return Err(GrammarError::MalformedAlternation {
                    rule: self.rule.to_owned(),
                });
            }
        }

        let merged = group_common_heads(&flat)
            .into_iter()
            .map(|group| self.factor_group(&group))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::alternative(merged))
    }

    fn factor_group(&self, group: &[&Node]) -> Result<Node, GrammarError> {
        match group {
            [] => Ok(Node::Empty),
            [single] => Ok((*single).clone()),
            [first, ..] => {
                let head = first.head().clone();
                let tails: Vec<Node> = group
                    .iter()
                    .map(|n| n.tail().cloned().unwrap_or(Node::Empty))
                    .collect();
                let tail = self.factor(tails)?;
                Ok(Node::sequence([head, tail]))
            }
        }
    }
}

/// Stable grouping of `nodes` by matching heads. Groups are ordered by first appearance, and
/// members keep their relative order.
fn group_common_heads<'a>(nodes: &[&'a Node]) -> Vec<Vec<&'a Node>> {
    let mut groups: Vec<Vec<&'a Node>> = Vec::new();
    for &node in nodes {
        match groups.iter_mut().find(|g| g[0].matches(node)) {
            Some(group) => group.push(node),
            None => groups.push(vec![node]),
        }
    }

    groups
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grammar::parse_rules;

    fn rule(src: &str) -> Rule {
        parse_rules(src).unwrap().iter().next().unwrap().clone()
    }

    fn assert_merges_to(src: &str, expected: &str) {
        let merged = merge(&rule(src)).unwrap();
        assert_eq!(merged, rule(expected), "got `{merged}`");
    }

    #[test]
    fn common_prefix() {
        assert_merges_to(
            r#"rhyme ::= "the" "fox" | "the" "dog" ;"#,
            r#"rhyme ::= "the" ("fox" | "dog") ;"#,
        );
    }

    #[test]
    fn nested_prefixes() {
        assert_merges_to(
            r#"rhyme ::= "the" "nutty" "squirrel" | "the" "quick" "fox" | "the" "quick" "dog" ;"#,
            r#"rhyme ::= "the" ("nutty" "squirrel" | "quick" ("fox" | "dog")) ;"#,
        );
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        assert_merges_to(
            r#"r ::= "a" "x" | "b" | "a" "y" | c | "a" ;"#,
            r#"r ::= "a" ("x" | "y" | <empty>) | "b" | c ;"#,
        );
    }

    #[test]
    fn reopens_merged_groups() {
        assert_merges_to(
            r#"r ::= "a" ("b" | "c") | "a" "d" ;"#,
            r#"r ::= "a" ("b" | "c" | "d") ;"#,
        );
    }

    #[test]
    fn parenthesized_heads() {
        assert_merges_to(
            r#"r ::= ("x" | "y") "a" | ("x" | "y") "b" | ("x" | "z") ;"#,
            r#"r ::= ("x" | "y") ("a" | "b") | "x" | "z" ;"#,
        );
    }

    #[test]
    fn heads_are_merged_before_grouping() {
        let once = merge(&rule(r#"r ::= ("a" "b" | "a" "c") "x" | "a" "d" ;"#)).unwrap();
        assert_eq!(once, rule(r#"r ::= "a" (("b" | "c") "x" | "d") ;"#), "got `{once}`");
        assert_eq!(merge(&once).unwrap(), once);
    }

    #[test]
    fn merges_inside_sequences() {
        assert_merges_to(
            r#"r ::= "(" (IDENT ":" | IDENT "=") ")" ;"#,
            r#"r ::= "(" IDENT (":" | "=") ")" ;"#,
        );
    }

    #[test]
    fn macros_merge_by_signature() {
        assert_merges_to(
            r#"r ::= lookahead(IDENT, ":") a | lookahead(IDENT, ":") b | lookahead(IDENT) c ;"#,
            r#"r ::= lookahead(IDENT, ":") (a | b) | lookahead(IDENT) c ;"#,
        );
    }

    #[test]
    fn empty_must_be_last() {
        assert_merges_to(r#"r ::= "a" | <empty> ;"#, r#"r ::= "a" | <empty> ;"#);

        let err = merge(&rule(r#"r ::= <empty> | "a" ;"#)).unwrap_err();
        assert_eq!(err, GrammarError::MalformedAlternation { rule: "r".into() });
    }

    #[test]
    fn shorter_prefix_first_is_malformed() {
        // factoring `"a"` out leaves `<empty> | "b"`
        let err = merge(&rule(r#"r ::= "a" | "a" "b" ;"#)).unwrap_err();
        assert_eq!(err, GrammarError::MalformedAlternation { rule: "r".into() });

        assert_merges_to(r#"r ::= "a" "b" | "a" ;"#, r#"r ::= "a" ("b" | <empty>) ;"#);
    }

    #[test]
    fn idempotent() {
        let once = merge(&rule(
            r#"r ::= "the" "quick" "fox" | "the" "quick" "dog" | "a" [b] | "the" ;"#,
        ))
        .unwrap();
        assert_eq!(merge(&once).unwrap(), once);
    }

    #[test]
    fn merge_all_keeps_rule_order() {
        let table = parse_rules(
            r#"
            b ::= "x" "y" | "x" "z" ;
            a ::= b ;
            "#,
        )
        .unwrap();
        let merged = merge_all(&table).unwrap();
        let names: Vec<_> = merged.iter().map(Rule::target).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(merged.get("b"), Some(&rule(r#"b ::= "x" ("y" | "z") ;"#)));
    }
}
