//! CLI configuration management

use pact_sdk::pact_types::Decimal;
use pact_sdk::{ClientSettings, GasDefaults, Network};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::CliError;

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Selected network
    #[serde(default)]
    pub network: Network,
    /// Service endpoint of a custom network
    #[serde(default)]
    pub endpoint: Option<String>,
    /// P2P endpoint of a custom network
    #[serde(default)]
    pub p2p_endpoint: Option<String>,
    /// Network id of a custom network
    #[serde(default)]
    pub network_id: Option<String>,
    /// Default gas limit
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Default gas price
    #[serde(default = "default_gas_price", with = "rust_decimal::serde::float")]
    pub gas_price: Decimal,
    /// Default time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u64,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gas_limit() -> u64 {
    GasDefaults::default().gas_limit
}

fn default_gas_price() -> Decimal {
    GasDefaults::default().gas_price
}

fn default_ttl() -> u64 {
    GasDefaults::default().ttl
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::default(),
            endpoint: None,
            p2p_endpoint: None,
            network_id: None,
            gas_limit: default_gas_limit(),
            gas_price: default_gas_price(),
            ttl: default_ttl(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pact"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load config from the default file or return default
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load config from a file; a missing or unreadable file gives defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Save config to the default file
    pub fn save(&self) -> Result<PathBuf, CliError> {
        let path = Self::config_path()
            .ok_or_else(|| CliError::Config("Cannot determine config path".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<(), CliError> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Client settings for this config
    pub fn to_settings(&self) -> ClientSettings {
        ClientSettings {
            network: self.network,
            custom_endpoint: self.endpoint.clone(),
            custom_p2p_endpoint: self.p2p_endpoint.clone(),
            custom_network_id: self.network_id.clone(),
            gas: GasDefaults {
                gas_limit: self.gas_limit,
                gas_price: self.gas_price,
                ttl: self.ttl,
            },
        }
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
