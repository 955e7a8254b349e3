//! Subcommand implementations

pub mod exec;
pub mod mempool;
pub mod query;

use pact_sdk::PactClient;
use serde_json::Value;
use std::sync::Arc;

use crate::{config::Config, CliError};

/// Connect to the configured network and discover its chains
pub async fn connect(config: &Config) -> Result<Arc<PactClient>, CliError> {
    let client = PactClient::connect(config.to_settings(), config.request_timeout()).await?;
    Ok(Arc::new(client))
}

/// Parse an optional `--data` argument
pub fn parse_data(data: Option<&str>) -> Result<Option<Value>, CliError> {
    data.map(serde_json::from_str).transpose().map_err(CliError::from)
}
