//! Node configuration loaded from TOML.
//!
//! ```toml
//! chain_id = 1
//! db_path = "data/simplecoin"
//! max_tx_lag_secs = 7200
//!
//! [genesis.allocations]
//! "<address>" = 100
//! ```

use crate::app::application::AppConfig;
use crate::core::genesis::{Genesis, GenesisError};
use crate::core::validation::DEFAULT_MAX_TX_LAG_SECS;
use serde::{Deserialize, Serialize};
use simplecoin_derive::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse config from {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Binds signatures to this chain.
    pub chain_id: u64,
    /// RocksDB directory for the ledger.
    pub db_path: PathBuf,
    /// How far behind the local clock a transaction timestamp may lag at
    /// admission.
    #[serde(default = "default_max_tx_lag_secs")]
    pub max_tx_lag_secs: u64,
    #[serde(default)]
    pub genesis: Genesis,
}

fn default_max_tx_lag_secs() -> u64 {
    DEFAULT_MAX_TX_LAG_SECS
}

impl NodeConfig {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::parse(&contents).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    fn parse(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e: toml::de::Error| e.message().to_string())
    }

    /// Total coins the configured genesis would allocate.
    pub fn genesis_supply(&self) -> Result<u64, GenesisError> {
        self.genesis.validate()
    }

    /// Runtime parameters for the application.
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            chain_id: self.chain_id,
            max_tx_lag_secs: self.max_tx_lag_secs,
        }
    }
}
