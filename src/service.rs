// SPDX-License-Identifier: MIT

//! Rule service - joins the rule operations to a rule store
//!
//! Request-level checks (blank rule strings, empty rule lists) live here so
//! the HTTP layer and the CLI report them the same way.

use std::sync::Arc;

use crate::error::{EngineError, RuleError};
use crate::rules::{self, Node, Record};
use crate::store::{RuleStore, StoredRule};

#[derive(Clone)]
pub struct RuleService {
    store: Arc<dyn RuleStore>,
}

impl RuleService {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Build a rule and persist it together with its serialized tree
    pub async fn create_rule(&self, rule_string: &str) -> Result<Node, EngineError> {
        if rule_string.trim().is_empty() {
            return Err(RuleError::MissingInput("rule_string is required").into());
        }

        let ast = rules::build(rule_string);
        let ast_json = serde_json::to_string(&ast)?;
        let stored = self.store.insert(rule_string, &ast_json).await?;
        log::info!("Created rule {}: {}", stored.id, rule_string);

        Ok(ast)
    }

    pub async fn list_rules(&self) -> Result<Vec<StoredRule>, EngineError> {
        Ok(self.store.list().await?)
    }

    pub async fn get_rule(&self, id: u64) -> Result<Option<StoredRule>, EngineError> {
        Ok(self.store.get(id).await?)
    }

    /// Combine rules under `AND`; an empty list is an error here
    pub fn combine_rules<S: AsRef<str>>(&self, rule_strings: &[S]) -> Result<Node, RuleError> {
        rules::combine(rule_strings).ok_or(RuleError::EmptyRuleSet)
    }

    pub fn evaluate_rule(&self, ast: &Node, data: &Record) -> Result<bool, RuleError> {
        let eligible = rules::evaluate(ast, data)?;
        log::debug!("Evaluated {} -> {}", ast, eligible);
        Ok(eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRuleStore;
    use serde_json::json;

    fn service() -> RuleService {
        RuleService::new(Arc::new(MemoryRuleStore::new()))
    }

    #[tokio::test]
    async fn test_create_rule_persists_tree() {
        let service = service();
        let ast = service
            .create_rule("age > 30 AND department = 'Sales'")
            .await
            .unwrap();
        assert_eq!(ast, rules::build("age > 30 AND department = 'Sales'"));

        let stored = service.list_rules().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rule_string, "age > 30 AND department = 'Sales'");

        let persisted = Node::from_json_str(&stored[0].ast_json).unwrap();
        assert_eq!(persisted, ast);

        let fetched = service.get_rule(stored[0].id).await.unwrap().unwrap();
        assert_eq!(fetched.rule_string, stored[0].rule_string);
        assert!(service.get_rule(stored[0].id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rule_rejects_blank() {
        let result = service().create_rule("   ").await;
        assert!(matches!(
            result,
            Err(EngineError::Rule(RuleError::MissingInput(_)))
        ));
    }

    #[test]
    fn test_combine_rules_empty() {
        let rules: Vec<String> = Vec::new();
        assert_eq!(
            service().combine_rules(&rules),
            Err(RuleError::EmptyRuleSet)
        );
    }

    #[test]
    fn test_evaluate_rule() {
        let ast = rules::build("age > 30");
        let data = json!({"age": 35});
        let result = service().evaluate_rule(&ast, data.as_object().unwrap());
        assert_eq!(result, Ok(true));
    }

    #[tokio::test]
    async fn test_stored_tree_of_many_rules_reads_back() {
        let service = service();
        let rule = vec!["x > 1"; 500].join(" AND ");
        service.create_rule(&rule).await.unwrap();

        let stored = service.get_rule(1).await.unwrap().unwrap();
        let tree = Node::from_json_str(&stored.ast_json).unwrap();
        assert_eq!(tree.operand_count(), 500);
    }
}
