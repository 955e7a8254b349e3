//! Mempool commands

use clap::Subcommand;

use super::connect;
use crate::{config::Config, output::Output, CliError};

/// Mempool subcommands
#[derive(Debug, Subcommand)]
pub enum MempoolCommand {
    /// List pending request keys
    Pending {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
    },
    /// Look up pending commands
    Lookup {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Request keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

impl MempoolCommand {
    pub async fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        match self {
            MempoolCommand::Pending { chain } => pending(config, &chain, json).await,
            MempoolCommand::Lookup { chain, keys } => lookup(config, &chain, &keys, json).await,
        }
    }
}

async fn pending(config: &Config, chain: &str, json: bool) -> Result<(), CliError> {
    let client = connect(config).await?;
    let hashes = client.mempool_pending(chain).await?;
    Output::new(json)
        .field_json("pending", &hashes)
        .message(&format!("{} pending on chain {}\n{}", hashes.len(), chain, hashes.join("\n")))
        .print();
    Ok(())
}

async fn lookup(config: &Config, chain: &str, keys: &[String], json: bool) -> Result<(), CliError> {
    let client = connect(config).await?;
    let results = client.mempool_lookup(chain, keys).await?;

    let message = results
        .iter()
        .map(|(key, command)| match command {
            Some(c) => format!("{}: pending, {}", key, c.encoded()),
            None => format!("{}: missing", key),
        })
        .collect::<Vec<_>>()
        .join("\n");
    Output::new(json)
        .field_json("results", &results)
        .message(&message)
        .print();
    Ok(())
}
