//! Client settings and network profiles

use pact_types::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SdkError;

/// Public mainnet service host
pub const MAINNET_HOST: &str = "https://api.chainweb.com";
/// Mainnet P2P host, used for mempool access
pub const MAINNET_P2P_HOST: &str = "https://us-e1.chainweb.com";
/// Public testnet service host
pub const TESTNET_HOST: &str = "https://api.testnet.chainweb.com";
/// Default address of a single-chain development server
pub const LOCAL_HOST: &str = "http://localhost:8080";

/// Network selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Public mainnet
    #[default]
    Mainnet,
    /// Public testnet
    Testnet,
    /// Single-chain development server
    Local,
    /// User-supplied endpoints
    Custom,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Local => "local",
            Network::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "local" => Ok(Network::Local),
            "custom" => Ok(Network::Custom),
            other => Err(SdkError::InvalidConfig(format!("unknown network: {}", other))),
        }
    }
}

/// How a server lays out its URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerKind {
    /// Sharded node: `{host}/chainweb/0.0/{networkId}[/chain/{chain}]{endpoint}`.
    ///
    /// `chainweb` is the root segment of the node's service API; nodes do
    /// not serve these routes under `/api/0.0`.
    Chainweb,
    /// Single-chain server: `{host}{endpoint}`
    LocalPact,
}

/// Gas values used when a command does not set its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasDefaults {
    /// Gas limit
    pub gas_limit: u64,
    /// Gas price
    #[serde(with = "rust_decimal::serde::float")]
    pub gas_price: Decimal,
    /// Time-to-live in seconds
    pub ttl: u64,
}

impl Default for GasDefaults {
    fn default() -> Self {
        Self {
            gas_limit: 1500,
            gas_price: Decimal::new(1, 8),
            ttl: 3600,
        }
    }
}

/// User-facing client settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Selected network
    pub network: Network,
    /// Service host for [`Network::Custom`]
    pub custom_endpoint: Option<String>,
    /// P2P host for [`Network::Custom`]
    pub custom_p2p_endpoint: Option<String>,
    /// Network id for [`Network::Custom`]; without one the server is
    /// treated as single-chain
    pub custom_network_id: Option<String>,
    /// Gas defaults
    pub gas: GasDefaults,
}

impl ClientSettings {
    /// Settings for a well-known network
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// Settings for a custom endpoint
    pub fn custom(endpoint: impl Into<String>, network_id: Option<String>) -> Self {
        Self {
            network: Network::Custom,
            custom_endpoint: Some(endpoint.into()),
            custom_network_id: network_id,
            ..Default::default()
        }
    }

    /// Resolve the concrete hosts and addressing mode
    pub fn resolve(&self) -> Result<NetworkProfile, SdkError> {
        let profile = match self.network {
            Network::Mainnet => NetworkProfile {
                kind: ServerKind::Chainweb,
                host: MAINNET_HOST.to_string(),
                p2p_host: Some(MAINNET_P2P_HOST.to_string()),
                network_id: Some("mainnet01".to_string()),
            },
            Network::Testnet => NetworkProfile {
                kind: ServerKind::Chainweb,
                host: TESTNET_HOST.to_string(),
                p2p_host: None,
                network_id: Some("testnet04".to_string()),
            },
            Network::Local => NetworkProfile {
                kind: ServerKind::LocalPact,
                host: LOCAL_HOST.to_string(),
                p2p_host: None,
                network_id: None,
            },
            Network::Custom => {
                let host = self
                    .custom_endpoint
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        SdkError::InvalidConfig("custom network requires an endpoint".to_string())
                    })?;
                let network_id = self
                    .custom_network_id
                    .clone()
                    .filter(|id| !id.trim().is_empty());
                NetworkProfile {
                    kind: if network_id.is_some() {
                        ServerKind::Chainweb
                    } else {
                        ServerKind::LocalPact
                    },
                    host: trim_host(host),
                    p2p_host: self.custom_p2p_endpoint.as_deref().map(trim_host),
                    network_id,
                }
            }
        };
        Ok(profile)
    }
}

fn trim_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

/// Resolved network endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    /// Addressing mode
    pub kind: ServerKind,
    /// Service host, without trailing slash
    pub host: String,
    /// P2P host for mempool access
    pub p2p_host: Option<String>,
    /// Network id
    pub network_id: Option<String>,
}

impl NetworkProfile {
    /// Name used in cache keys
    pub fn cache_name(&self) -> &str {
        self.network_id.as_deref().unwrap_or("local")
    }

    /// Build a URL on `host` for an endpoint, scoped to a chain when given
    pub fn url_on(&self, host: &str, chain: Option<&str>, endpoint: &str) -> String {
        match self.kind {
            ServerKind::LocalPact => format!("{}{}", host, endpoint),
            ServerKind::Chainweb => {
                let network_id = self.network_id.as_deref().unwrap_or_default();
                match chain {
                    Some(chain) => format!(
                        "{}/chainweb/0.0/{}/chain/{}{}",
                        host, network_id, chain, endpoint
                    ),
                    None => format!("{}/chainweb/0.0/{}{}", host, network_id, endpoint),
                }
            }
        }
    }

    /// Build a URL on the service host
    pub fn url(&self, chain: Option<&str>, endpoint: &str) -> String {
        self.url_on(&self.host, chain, endpoint)
    }

    /// Build a URL on the P2P host
    pub fn p2p_url(&self, chain: Option<&str>, endpoint: &str) -> Result<String, SdkError> {
        let host = self.p2p_host.as_deref().ok_or(SdkError::MissingP2pHost)?;
        Ok(self.url_on(host, chain, endpoint))
    }

    /// Chains assumed when discovery fails
    pub fn default_chains(&self) -> Vec<String> {
        match self.kind {
            ServerKind::Chainweb => (0..20).map(|c| c.to_string()).collect(),
            ServerKind::LocalPact => vec!["0".to_string()],
        }
    }
}
