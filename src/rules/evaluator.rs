// SPDX-License-Identifier: MIT

//! Rule tree evaluator

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::ast::{Connective, Node};
use crate::error::RuleError;

/// Flat mapping of attribute names to values a tree is evaluated against
pub type Record = Map<String, Value>;

/// Literal side of an operand, coerced once per evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Integer(i64),
    Text(String),
}

impl Literal {
    /// All-digit tokens become integers; anything else is text with one pair
    /// of surrounding single quotes removed.
    pub fn coerce(token: &str) -> Self {
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = token.parse::<i64>() {
                return Literal::Integer(n);
            }
        }

        let text = token.strip_prefix('\'').unwrap_or(token);
        let text = text.strip_suffix('\'').unwrap_or(text);
        Literal::Text(text.to_string())
    }
}

/// Evaluate a rule tree against a record
pub fn evaluate(node: &Node, record: &Record) -> Result<bool, RuleError> {
    // Right subtrees not yet visited, with the connective joining each one
    let mut pending: Vec<(Connective, &Node)> = Vec::new();
    let mut current = node;

    loop {
        match current {
            Node::Operator {
                connective,
                left,
                right,
            } => {
                pending.push((*connective, right.as_ref()));
                current = left.as_ref();
            }
            Node::Operand { condition } => {
                let value = evaluate_operand(condition, record)?;
                // Unwind to the nearest operator whose right side still decides the result
                loop {
                    let Some((connective, right)) = pending.pop() else {
                        return Ok(value);
                    };
                    let settled = match connective {
                        Connective::And => !value,
                        Connective::Or => value,
                    };
                    if !settled {
                        current = right;
                        break;
                    }
                }
            }
        }
    }
}

fn evaluate_operand(condition: &str, record: &Record) -> Result<bool, RuleError> {
    let tokens: Vec<&str> = condition.split_whitespace().collect();
    let [attribute, comparator, literal] = tokens[..] else {
        return Err(RuleError::MalformedOperand {
            condition: condition.to_string(),
            tokens: tokens.len(),
        });
    };

    let literal = Literal::coerce(literal);
    let value = record.get(attribute).filter(|v| !v.is_null());

    let result = match comparator {
        ">" => compare(attribute, comparator, value, &literal)? == Ordering::Greater,
        "<" => compare(attribute, comparator, value, &literal)? == Ordering::Less,
        "=" => values_equal(value, &literal),
        other => {
            log::debug!("Unknown comparator '{}' in '{}'", other, condition);
            false
        }
    };

    log::trace!("'{}' -> {}", condition, result);
    Ok(result)
}

fn compare(
    attribute: &str,
    comparator: &str,
    value: Option<&Value>,
    literal: &Literal,
) -> Result<Ordering, RuleError> {
    let value = value.ok_or_else(|| {
        RuleError::unresolvable(attribute, comparator, "attribute is missing from the record")
    })?;

    let ordering = match (value, literal) {
        (Value::Number(n), Literal::Integer(rn)) => match n.as_i64() {
            Some(i) => Some(i.cmp(rn)),
            None => n.as_f64().and_then(|f| f.partial_cmp(&(*rn as f64))),
        },
        (Value::String(s), Literal::Text(rs)) => Some(s.as_str().cmp(rs.as_str())),
        _ => None,
    };

    ordering.ok_or_else(|| {
        RuleError::unresolvable(
            attribute,
            comparator,
            format!(
                "cannot order {} against {}",
                describe(value),
                describe_literal(literal)
            ),
        )
    })
}

fn values_equal(value: Option<&Value>, literal: &Literal) -> bool {
    match (value, literal) {
        (Some(Value::Number(n)), Literal::Integer(rn)) => match n.as_i64() {
            Some(i) => i == *rn,
            None => n.as_f64().is_some_and(|f| f == *rn as f64),
        },
        (Some(Value::String(s)), Literal::Text(rs)) => s == rs,
        _ => false,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe_literal(literal: &Literal) -> &'static str {
    match literal {
        Literal::Integer(_) => "an integer literal",
        Literal::Text(_) => "a text literal",
    }
}
