//! # pact-sdk
//!
//! Rust SDK for Pact smart contracts on Chainweb.
//!
//! ## Features
//!
//! - **PactClient**: chain-scoped HTTP client (send, local, poll, blocks, mempool, SPV)
//! - **CommandBuilder**: metadata defaults, nonces and content-addressed commands
//! - **ChainwebQueryService**: cached module metadata and balances across chains
//! - **PayloadIndex**: lazy request-key index over block payloads
//! - **Cache**: typed access to a pluggable key-value store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pact_sdk::{Cache, ChainwebQueryService, ClientSettings, Network, PactClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ClientSettings::new(Network::Mainnet);
//!     let client = Arc::new(PactClient::connect(settings, Duration::from_secs(30)).await?);
//!
//!     // Execute read-only code
//!     let cmd = client.generate_exec_command("0", "(coin.get-balance \"alice\")", None);
//!     let command = client.build_command(cmd, vec![])?;
//!     let response = client.local(&command).await?;
//!     println!("{:?}", response.result.value());
//!
//!     // Balances on every chain
//!     let queries = ChainwebQueryService::new(client, Cache::memory());
//!     for account in queries.account_details_all_chains("coin", "alice").await? {
//!         println!("{}: {:?}", account.chain, account.balance);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod cache;
mod client;
mod error;
mod payload;
mod query;
pub mod settings;
mod transport;

// Re-export main types
pub use builder::{CommandBuilder, ContinuationStep, MetadataOptions};
pub use cache::{Cache, CacheStore, MemoryCache};
pub use client::{PactClient, SubmitOutcome, BLOCK_HEADER_ACCEPT, DISCOVERY_TIMEOUT};
pub use error::SdkError;
pub use payload::PayloadIndex;
pub use query::{ChainwebQueryService, ACCOUNT_PROBE_GAS_LIMIT};
pub use settings::{ClientSettings, GasDefaults, Network, NetworkProfile, ServerKind};
pub use transport::{HttpResponse, Method, MockTransport, RecordedRequest};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export core types for convenience
pub use pact_types;
