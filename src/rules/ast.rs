// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for rule expressions
//!
//! A tree is either a single comparison (`Operand`) or a logical connective
//! joining exactly two subtrees (`Operator`). On the wire a tree is a nested
//! mapping with `type`, `value`, `left` and `right` keys.
//!
//! Combined rule sets produce trees as deep as the number of rules, so every
//! walk over a tree is either a loop or runs under `with_stack`, and JSON text
//! is read without serde_json's nesting limit.

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::RuleError;

const RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 1024 * 1024;

/// Run `f`, moving onto a fresh stack segment when the current one runs low
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}

/// Parse JSON text with no nesting limit
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// A node of a rule tree
#[derive(Debug, Deserialize)]
#[serde(try_from = "NodeRecord")]
pub enum Node {
    /// Leaf holding a condition such as `age > 30`
    Operand { condition: String },
    /// Logical connective over two subtrees
    Operator {
        connective: Connective,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Node {
    pub fn operand(condition: impl Into<String>) -> Self {
        Node::Operand {
            condition: condition.into(),
        }
    }

    pub fn operator(connective: Connective, left: Node, right: Node) -> Self {
        Node::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::operator(Connective::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::operator(Connective::Or, left, right)
    }

    /// Number of operand leaves in the tree
    pub fn operand_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::Operand { .. } => count += 1,
                Node::Operator { left, right, .. } => {
                    pending.push(left.as_ref());
                    pending.push(right.as_ref());
                }
            }
        }
        count
    }

    /// Convert the tree into its mapping form
    pub fn to_json(&self) -> serde_json::Value {
        // String-keyed maps only, so serialization cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild a tree from its mapping form
    pub fn from_json(value: serde_json::Value) -> Result<Self, RuleError> {
        Node::deserialize(serde_stacker::Deserializer::new(value)).map_err(invalid_tree)
    }

    /// Rebuild a tree from its mapping form as JSON text
    pub fn from_json_str(text: &str) -> Result<Self, RuleError> {
        from_json_slice(text.as_bytes()).map_err(invalid_tree)
    }

    /// Move operator children onto `pending` so they are dropped by the caller's loop
    fn detach_children(&mut self, pending: &mut Vec<Node>) {
        if let Node::Operator { left, right, .. } = self {
            for child in [left, right] {
                if matches!(**child, Node::Operator { .. }) {
                    pending.push(std::mem::replace(&mut **child, Node::operand(String::new())));
                }
            }
        }
    }
}

fn invalid_tree(err: serde_json::Error) -> RuleError {
    RuleError::InvalidTree(err.to_string())
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        with_stack(|| match self {
            Node::Operand { condition } => Node::operand(condition.clone()),
            Node::Operator {
                connective,
                left,
                right,
            } => Node::operator(*connective, left.as_ref().clone(), right.as_ref().clone()),
        })
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        with_stack(|| match (self, other) {
            (Node::Operand { condition: a }, Node::Operand { condition: b }) => a == b,
            (
                Node::Operator {
                    connective: c1,
                    left: l1,
                    right: r1,
                },
                Node::Operator {
                    connective: c2,
                    left: l2,
                    right: r2,
                },
            ) => c1 == c2 && l1 == l2 && r1 == r2,
            _ => false,
        })
    }
}

impl Eq for Node {}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        with_stack(|| {
            let (kind, value, left, right) = match self {
                Node::Operand { condition } => (NodeKind::Operand, condition.as_str(), None, None),
                Node::Operator {
                    connective,
                    left,
                    right,
                } => (
                    NodeKind::Operator,
                    connective.as_str(),
                    Some(left.as_ref()),
                    Some(right.as_ref()),
                ),
            };

            let mut state = serializer.serialize_struct("Node", 4)?;
            state.serialize_field("type", &kind)?;
            state.serialize_field("value", value)?;
            state.serialize_field("left", &left)?;
            state.serialize_field("right", &right)?;
            state.end()
        })
    }
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }

    /// Match a token against the connective keywords (case-sensitive)
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(Connective::And),
            "OR" => Some(Connective::Or),
            _ => None,
        }
    }
}

impl std::fmt::Display for Connective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        with_stack(|| match self {
            Node::Operand { condition } => write!(f, "{}", condition),
            Node::Operator {
                connective,
                left,
                right,
            } => write!(f, "({} {} {})", left, connective, right),
        })
    }
}

/// Node kind tag used in the mapping form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Operand,
    Operator,
}

/// Loose mapping shape of a node, as stored and transported
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub value: String,
    #[serde(default)]
    pub left: Option<Box<NodeRecord>>,
    #[serde(default)]
    pub right: Option<Box<NodeRecord>>,
}

impl Drop for NodeRecord {
    fn drop(&mut self) {
        let mut pending: Vec<Box<NodeRecord>> =
            self.left.take().into_iter().chain(self.right.take()).collect();
        while let Some(mut record) = pending.pop() {
            pending.extend(record.left.take());
            pending.extend(record.right.take());
        }
    }
}

impl TryFrom<NodeRecord> for Node {
    // Plain message; callers wrap it into `RuleError::InvalidTree`
    type Error = String;

    fn try_from(mut record: NodeRecord) -> Result<Self, Self::Error> {
        let value = std::mem::take(&mut record.value);
        match record.kind {
            NodeKind::Operand => {
                if record.left.is_some() || record.right.is_some() {
                    return Err(format!("operand '{}' must not have children", value));
                }
                Ok(Node::operand(value))
            }
            NodeKind::Operator => {
                let connective = Connective::from_token(&value)
                    .ok_or_else(|| format!("unknown connective '{}'", value))?;
                match (record.left.take(), record.right.take()) {
                    (Some(left), Some(right)) => with_stack(|| {
                        Ok(Node::operator(
                            connective,
                            Node::try_from(*left)?,
                            Node::try_from(*right)?,
                        ))
                    }),
                    _ => Err(format!(
                        "operator '{}' requires both left and right children",
                        connective
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connective_display() {
        assert_eq!(format!("{}", Connective::And), "AND");
        assert_eq!(format!("{}", Connective::Or), "OR");
    }

    #[test]
    fn test_connective_tokens_are_case_sensitive() {
        assert_eq!(Connective::from_token("AND"), Some(Connective::And));
        assert_eq!(Connective::from_token("OR"), Some(Connective::Or));
        assert_eq!(Connective::from_token("and"), None);
        assert_eq!(Connective::from_token("Or"), None);
    }

    #[test]
    fn test_operand_serializes_null_children() {
        let node = Node::operand("age > 30");
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"type": "operand", "value": "age > 30", "left": null, "right": null})
        );
        assert_eq!(node.to_json(), serde_json::to_value(&node).unwrap());
    }

    #[test]
    fn test_operator_serialization() {
        let node = Node::and(Node::operand("age > 30"), Node::operand("salary > 50000"));
        assert_eq!(
            node.to_json(),
            json!({
                "type": "operator",
                "value": "AND",
                "left": {"type": "operand", "value": "age > 30", "left": null, "right": null},
                "right": {"type": "operand", "value": "salary > 50000", "left": null, "right": null}
            })
        );
    }

    #[test]
    fn test_deserialize_with_absent_children() {
        let node = Node::from_json(json!({"type": "operand", "value": "x = 1"})).unwrap();
        assert_eq!(node, Node::operand("x = 1"));
    }

    #[test]
    fn test_round_trip() {
        let node = Node::or(
            Node::and(Node::operand("a > 1"), Node::operand("b < 2")),
            Node::operand("c = 'x'"),
        );
        let text = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_reject_operator_missing_child() {
        let result = Node::from_json(json!({
            "type": "operator",
            "value": "AND",
            "left": {"type": "operand", "value": "a > 1"},
            "right": null
        }));
        assert!(matches!(result, Err(RuleError::InvalidTree(_))));
    }

    #[test]
    fn test_reject_unknown_connective() {
        let result = Node::from_json(json!({
            "type": "operator",
            "value": "XOR",
            "left": {"type": "operand", "value": "a > 1"},
            "right": {"type": "operand", "value": "b > 1"}
        }));
        assert!(matches!(result, Err(RuleError::InvalidTree(_))));
    }

    #[test]
    fn test_reject_operand_with_child() {
        let result = Node::from_json(json!({
            "type": "operand",
            "value": "a > 1",
            "left": {"type": "operand", "value": "b > 1"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_unknown_type() {
        assert!(Node::from_json(json!({"type": "group", "value": "x"})).is_err());
    }

    #[test]
    fn test_display_and_count() {
        let node = Node::and(
            Node::or(Node::operand("a > 1"), Node::operand("b > 2")),
            Node::operand("c > 3"),
        );
        assert_eq!(node.to_string(), "((a > 1 OR b > 2) AND c > 3)");
        assert_eq!(node.operand_count(), 3);
    }

    fn chain(depth: usize) -> Node {
        (1..depth).fold(Node::operand("x > 0"), |acc, _| {
            Node::and(acc, Node::operand("x > 0"))
        })
    }

    #[test]
    fn test_deep_tree_round_trips_through_text() {
        let node = chain(5_000);
        let text = serde_json::to_string(&node).unwrap();
        let back = Node::from_json_str(&text).unwrap();
        assert_eq!(back.operand_count(), 5_000);
        assert!(back == node);
        assert!(back.clone() == node);
    }

    #[test]
    fn test_deep_mapping_with_bad_leaf_is_rejected() {
        let mut text = String::from(r#"{"type": "operand", "value": "x > 0", "left": {"type": "operand", "value": "y"}}"#);
        for _ in 0..1_000 {
            text = format!(
                r#"{{"type": "operator", "value": "OR", "left": {}, "right": {{"type": "operand", "value": "x > 0"}}}}"#,
                text
            );
        }
        let result = Node::from_json_str(&text);
        assert!(matches!(result, Err(RuleError::InvalidTree(_))));
    }

    #[test]
    fn test_trailing_text_is_rejected() {
        let result = Node::from_json_str(r#"{"type": "operand", "value": "x > 0"} extra"#);
        assert!(matches!(result, Err(RuleError::InvalidTree(_))));
    }

    #[test]
    fn test_invalid_tree_message_is_not_doubled() {
        let err = Node::from_json(json!({
            "type": "operator",
            "value": "XOR",
            "left": null,
            "right": null
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid rule tree: unknown connective 'XOR'"));
    }
}
