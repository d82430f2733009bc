// SPDX-License-Identifier: MIT

//! Server configuration
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary) and can be overridden from the command line:
//! - `RULE_ENGINE_HOST` - bind address, default `127.0.0.1`
//! - `RULE_ENGINE_PORT` - port, default `5000`
//! - `RULE_ENGINE_STORE` - JSON file for stored rules; in-memory when unset

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::EngineError;
use crate::store::{JsonFileRuleStore, MemoryRuleStore, RuleStore};

pub const HOST_VAR: &str = "RULE_ENGINE_HOST";
pub const PORT_VAR: &str = "RULE_ENGINE_PORT";
pub const STORE_VAR: &str = "RULE_ENGINE_STORE";

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            store_path: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup(HOST_VAR).filter(|v| !v.trim().is_empty()) {
            config.host = host.trim().parse().map_err(|_| {
                EngineError::config(format!("{} is not an IP address: {}", HOST_VAR, host))
            })?;
        }
        if let Some(port) = lookup(PORT_VAR).filter(|v| !v.trim().is_empty()) {
            config.port = port.trim().parse().map_err(|_| {
                EngineError::config(format!("{} is not a valid port: {}", PORT_VAR, port))
            })?;
        }
        if let Some(path) = lookup(STORE_VAR).filter(|v| !v.trim().is_empty()) {
            config.store_path = Some(PathBuf::from(path.trim()));
        }

        Ok(config)
    }

    /// Apply command line overrides
    pub fn with_overrides(
        mut self,
        host: Option<IpAddr>,
        port: Option<u16>,
        store_path: Option<PathBuf>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if store_path.is_some() {
            self.store_path = store_path;
        }
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Open the configured rule store
    pub async fn open_store(&self) -> Result<Arc<dyn RuleStore>, EngineError> {
        match &self.store_path {
            Some(path) => {
                log::info!("Using rule store file {}", path.display());
                Ok(Arc::new(JsonFileRuleStore::open(path).await?))
            }
            None => {
                log::warn!("{} not set, rules are kept in memory only", STORE_VAR);
                Ok(Arc::new(MemoryRuleStore::new()))
            }
        }
    }
}
