// SPDX-License-Identifier: MIT

//! Rule string to tree builder
//!
//! Rules are split on whitespace and divided at connective tokens:
//! - `age > 30`
//! - `age > 30 AND department = 'Sales'`
//! - `experience > 5 OR salary > 50000`
//!
//! The whole token span is searched for `AND` before `OR` is considered, so
//! `OR` only becomes the top connective of a span without any `AND` in it.
//! `a > 1 OR b > 2 AND c > 3` therefore builds `AND(OR(a > 1, b > 2), c > 3)`.
//! Parentheses are not interpreted and stay attached to their tokens.

use super::ast::{Connective, Node};

/// Build a tree from a single rule string. Never fails; malformed operands
/// surface when the tree is evaluated.
pub fn build(rule: &str) -> Node {
    let tokens: Vec<&str> = rule.split_whitespace().collect();
    let node = build_tokens(&tokens);
    log::debug!("Built rule '{}' into {}", rule, node);
    node
}

fn build_tokens(tokens: &[&str]) -> Node {
    fold_segments(tokens, Connective::And, build_or_span)
}

/// A span holding no `AND`
fn build_or_span(tokens: &[&str]) -> Node {
    fold_segments(tokens, Connective::Or, build_operand)
}

fn build_operand(tokens: &[&str]) -> Node {
    Node::operand(tokens.join(" "))
}

/// Split at every `connective` token and join the segments right to left,
/// which is the tree the first-occurrence split produces:
/// `s0 C s1 C s2` becomes `C(s0, C(s1, s2))`.
fn fold_segments(
    tokens: &[&str],
    connective: Connective,
    segment: fn(&[&str]) -> Node,
) -> Node {
    let mut segments = tokens
        .split(|token| Connective::from_token(token) == Some(connective))
        .rev();
    // `split` yields at least one (possibly empty) segment
    let last = segments.next().map_or_else(|| segment(&[]), segment);
    segments.fold(last, |right, tokens| {
        Node::operator(connective, segment(tokens), right)
    })
}

/// Build each rule and fold them left to right under `AND`.
///
/// Returns `None` when no rules are given.
pub fn combine<S: AsRef<str>>(rules: &[S]) -> Option<Node> {
    let mut iter = rules.iter();
    let first = build(iter.next()?.as_ref());

    let combined = iter.fold(first, |acc, rule| Node::and(acc, build(rule.as_ref())));
    log::debug!(
        "Combined {} rule(s) into a tree with {} operand(s)",
        rules.len(),
        combined.operand_count()
    );
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_single_operand() {
        assert_eq!(build("age > 30"), Node::operand("age > 30"));
    }

    #[test]
    fn test_build_normalizes_whitespace() {
        assert_eq!(
            build("  age    >\t30  "),
            Node::operand("age > 30")
        );
    }

    #[test]
    fn test_build_and() {
        assert_eq!(
            build("age > 30 AND department = Sales"),
            Node::and(Node::operand("age > 30"), Node::operand("department = Sales"))
        );
    }

    #[test]
    fn test_build_or() {
        assert_eq!(
            build("experience > 5 OR salary > 50000"),
            Node::or(
                Node::operand("experience > 5"),
                Node::operand("salary > 50000")
            )
        );
    }

    #[test]
    fn test_and_is_split_before_or() {
        assert_eq!(
            build("a > 1 OR b > 2 AND c > 3"),
            Node::and(
                Node::or(Node::operand("a > 1"), Node::operand("b > 2")),
                Node::operand("c > 3")
            )
        );
    }

    #[test]
    fn test_or_after_and_lands_in_right_subtree() {
        assert_eq!(
            build("a > 1 AND b > 2 OR c > 3"),
            Node::and(
                Node::operand("a > 1"),
                Node::or(Node::operand("b > 2"), Node::operand("c > 3"))
            )
        );
    }

    #[test]
    fn test_first_and_is_the_split_point() {
        assert_eq!(
            build("a > 1 AND b > 2 AND c > 3"),
            Node::and(
                Node::operand("a > 1"),
                Node::and(Node::operand("b > 2"), Node::operand("c > 3"))
            )
        );
    }

    #[test]
    fn test_lowercase_connectives_are_plain_tokens() {
        assert_eq!(
            build("a > 1 and b > 2"),
            Node::operand("a > 1 and b > 2")
        );
    }

    #[test]
    fn test_parentheses_are_kept_in_tokens() {
        assert_eq!(
            build("(age > 30 AND department = 'Sales')"),
            Node::and(
                Node::operand("(age > 30"),
                Node::operand("department = 'Sales')")
            )
        );
    }

    #[test]
    fn test_dangling_connective_yields_empty_operand() {
        assert_eq!(
            build("age > 30 AND"),
            Node::and(Node::operand("age > 30"), Node::operand(""))
        );
    }

    #[test]
    fn test_combine_empty() {
        let rules: [&str; 0] = [];
        assert_eq!(combine(&rules), None);
    }

    #[test]
    fn test_combine_single() {
        assert_eq!(combine(&["age > 30 OR x = 1"]), Some(build("age > 30 OR x = 1")));
    }

    #[test]
    fn test_combine_is_left_associative() {
        let combined = combine(&["r1 > 1", "r2 > 2", "r3 > 3"]).unwrap();
        assert_eq!(
            combined,
            Node::and(
                Node::and(build("r1 > 1"), build("r2 > 2")),
                build("r3 > 3")
            )
        );
    }

    #[test]
    fn test_combine_accepts_owned_strings() {
        let rules = vec!["a > 1".to_string(), "b OR c".to_string()];
        let combined = combine(&rules).unwrap();
        assert_eq!(combined, Node::and(build("a > 1"), build("b OR c")));
    }

    #[test]
    fn test_or_chain_nests_to_the_right() {
        assert_eq!(
            build("a > 1 OR b > 2 OR c > 3 AND d > 4"),
            Node::and(
                Node::or(
                    Node::operand("a > 1"),
                    Node::or(Node::operand("b > 2"), Node::operand("c > 3"))
                ),
                Node::operand("d > 4")
            )
        );
    }

    #[test]
    fn test_empty_rule_is_one_empty_operand() {
        assert_eq!(build("   "), Node::operand(""));
        assert_eq!(
            build("OR"),
            Node::or(Node::operand(""), Node::operand(""))
        );
    }
}
