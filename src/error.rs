// SPDX-License-Identifier: MIT

//! Typed error handling for rule-engine-rs
//!
//! `RuleError` covers the pure build/combine/evaluate operations, `StoreError`
//! the rule persistence layer and `EngineError` everything the binary and the
//! server can run into.

use thiserror::Error;

/// Top-level error type for rule-engine-rs
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rule building and evaluation errors
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Rule persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors (invalid env vars, bad flags)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Errors raised while evaluating rules or handling rule input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Operand condition did not split into attribute, comparator and literal
    #[error("Malformed operand '{condition}': expected 3 tokens, found {tokens}")]
    MalformedOperand { condition: String, tokens: usize },

    /// Ordering comparison between values that cannot be ordered
    #[error("Cannot evaluate '{attribute} {comparator} ...': {reason}")]
    UnresolvableComparison {
        attribute: String,
        comparator: String,
        reason: String,
    },

    /// Combine was asked to merge zero rules
    #[error("No rules to combine")]
    EmptyRuleSet,

    /// Tree mapping could not be turned into a tree
    #[error("Invalid rule tree: {0}")]
    InvalidTree(String),

    /// Required request input was missing or blank
    #[error("{0}")]
    MissingInput(&'static str),
}

/// Rule persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Store file exists but holds unexpected content
    #[error("Corrupt rule store {path}: {message}")]
    Corrupt { path: String, message: String },
}

impl EngineError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl RuleError {
    pub(crate) fn unresolvable(
        attribute: &str,
        comparator: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableComparison {
            attribute: attribute.to_string(),
            comparator: comparator.to_string(),
            reason: reason.into(),
        }
    }
}
