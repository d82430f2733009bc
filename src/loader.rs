// SPDX-License-Identifier: MIT

//! Rule set loader - YAML file loading and parsing
//!
//! A rule set is a named list of rule strings that are combined under `AND`:
//!
//! ```yaml
//! name: senior-sales
//! description: Senior staff in sales
//! rules:
//!   - age > 30 AND department = 'Sales'
//!   - salary > 50000 OR experience > 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::rules::{self, Node};

/// Named list of rule strings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl RuleSet {
    /// Combine every rule of the set; `None` when the set is empty
    pub fn combined(&self) -> Option<Node> {
        rules::combine(&self.rules)
    }
}

/// Loads rule sets from YAML files
pub struct RuleSetLoader;

impl RuleSetLoader {
    /// Load a rule set from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RuleSet, EngineError> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a rule set from a YAML string
    pub fn parse_yaml(content: &str) -> Result<RuleSet, EngineError> {
        let set: RuleSet = serde_yaml::from_str(content)?;
        Ok(set)
    }
}
