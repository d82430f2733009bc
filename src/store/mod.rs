// SPDX-License-Identifier: MIT

//! Rule persistence
//!
//! Each stored rule keeps the rule string it was created from and the tree
//! it built, serialized as JSON text:
//! - `MemoryRuleStore` - process-local, lost on exit
//! - `JsonFileRuleStore` - rewritten to a JSON file after every insert

mod file;
mod memory;

pub use file::JsonFileRuleStore;
pub use memory::MemoryRuleStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A persisted rule row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRule {
    pub id: u64,
    pub rule_string: String,
    /// Serialized tree mapping
    pub ast_json: String,
}

/// Storage backend for rules
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Persist a rule and return the stored row with its assigned id
    async fn insert(&self, rule_string: &str, ast_json: &str) -> Result<StoredRule, StoreError>;

    /// All stored rules, ordered by id
    async fn list(&self) -> Result<Vec<StoredRule>, StoreError>;

    /// Look up a single rule
    async fn get(&self, id: u64) -> Result<Option<StoredRule>, StoreError>;
}

/// Next id after the highest stored one
fn next_id(rules: &[StoredRule]) -> u64 {
    rules.iter().map(|r| r.id).max().unwrap_or(0) + 1
}
