// SPDX-License-Identifier: MIT

//! JSON file backed rule store

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use super::{next_id, RuleStore, StoredRule};
use crate::error::StoreError;

/// Keeps rules in memory and rewrites the whole file on every insert
#[derive(Clone)]
pub struct JsonFileRuleStore {
    path: PathBuf,
    rules: Arc<RwLock<Vec<StoredRule>>>,
}

impl JsonFileRuleStore {
    /// Open a store file. A missing file starts an empty store; it is created
    /// on the first insert.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let rules = match fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!("Loaded {} rule(s) from {}", rules.len(), path.display());

        Ok(Self {
            path,
            rules: Arc::new(RwLock::new(rules)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, rules: &[StoredRule]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(rules)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl RuleStore for JsonFileRuleStore {
    async fn insert(&self, rule_string: &str, ast_json: &str) -> Result<StoredRule, StoreError> {
        let mut rules = self.rules.write().await;
        let rule = StoredRule {
            id: next_id(&rules),
            rule_string: rule_string.to_string(),
            ast_json: ast_json.to_string(),
        };
        rules.push(rule.clone());

        if let Err(e) = self.persist(&rules).await {
            rules.pop();
            log::error!("Failed to write {}: {}", self.path.display(), e);
            return Err(e);
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileRuleStore::open(dir.path().join("rules.json"))
            .await
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_reopen_reads_written_rules() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.json");

        let store = JsonFileRuleStore::open(&path).await.unwrap();
        store.insert("age > 30", r#"{"type":"operand"}"#).await.unwrap();
        store.insert("salary > 5", r#"{"type":"operand"}"#).await.unwrap();

        let reopened = JsonFileRuleStore::open(&path).await.unwrap();
        let rules = reopened.list().await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule_string, "age > 30");
        assert_eq!(rules[1].id, 2);

        let third = reopened.insert("x = 1", "{}").await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileRuleStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
