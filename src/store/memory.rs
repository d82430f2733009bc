// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{next_id, RuleStore, StoredRule};
use crate::error::StoreError;

#[derive(Clone)]
pub struct MemoryRuleStore {
    rules: Arc<RwLock<Vec<StoredRule>>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn insert(&self, rule_string: &str, ast_json: &str) -> Result<StoredRule, StoreError> {
        let mut rules = self.rules.write().await;
        let rule = StoredRule {
            id: next_id(&rules),
            rule_string: rule_string.to_string(),
            ast_json: ast_json.to_string(),
        };
        rules.push(rule.clone());
        Ok(rule)
    }

    async fn list(&self) -> Result<Vec<StoredRule>, StoreError> {
        let rules = self.rules.read().await;
        Ok(rules.clone())
    }

    async fn get(&self, id: u64) -> Result<Option<StoredRule>, StoreError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().find(|r| r.id == id).cloned())
    }
}
