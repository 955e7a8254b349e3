//! Query commands: chains, cut, header, tx, module, balance

use pact_sdk::{Cache, ChainwebQueryService};

use super::connect;
use crate::{config::Config, output::Output, CliError};

/// List the chains of the configured network
pub async fn chains(config: &Config, json: bool) -> Result<(), CliError> {
    let client = connect(config).await?;
    let chains = client.recognized_chains()?;
    let profile = client.profile();
    Output::new(json)
        .field("network", profile.cache_name())
        .field("host", &profile.host)
        .field_json("chains", &chains)
        .message(&format!(
            "{} ({}): chains {}",
            profile.cache_name(),
            profile.host,
            chains.join(", ")
        ))
        .print();
    Ok(())
}

/// Show the current height of every chain
pub async fn cut(config: &Config, json: bool) -> Result<(), CliError> {
    let client = connect(config).await?;
    let heights = client.cut_heights().await?;
    let mut rows: Vec<(&String, &u64)> = heights.iter().collect();
    rows.sort_by_key(|(chain, _)| chain.parse::<u64>().unwrap_or(u64::MAX));

    let message = rows
        .iter()
        .map(|(chain, height)| format!("chain {:>2}: {}", chain, height))
        .collect::<Vec<_>>()
        .join("\n");
    Output::new(json)
        .field_json("heights", &heights)
        .message(&message)
        .print();
    Ok(())
}

/// Show a block header
pub async fn header(config: &Config, chain: &str, hash: &str, json: bool) -> Result<(), CliError> {
    let client = connect(config).await?;
    let header = client
        .block_header(chain, hash)
        .await?
        .ok_or_else(|| CliError::InvalidInput(format!("no block {} on chain {}", hash, chain)))?;
    Output::new(json)
        .field_json("header", &header)
        .message(&format!(
            "Block {}\nHeight: {}\nParent: {}\nPayload: {}",
            header.hash, header.height, header.parent, header.payload_hash
        ))
        .print();
    Ok(())
}

/// Show the command behind a request key
pub async fn tx(
    config: &Config,
    chain: &str,
    request_key: &str,
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let queries = ChainwebQueryService::new(client, Cache::memory());
    let command = queries
        .fetch_transaction(chain, request_key)
        .await?
        .ok_or_else(|| {
            CliError::InvalidInput(format!("{} is not in a block on chain {}", request_key, chain))
        })?;
    Output::new(json)
        .field_json("command", &command)
        .message(command.encoded())
        .print();
    Ok(())
}

/// Describe modules
pub async fn module(
    config: &Config,
    chain: &str,
    names: &[String],
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let queries = ChainwebQueryService::new(client, Cache::memory());
    let modules = queries.module_metadata_batch(chain, names).await?;

    let message = modules
        .iter()
        .map(|m| {
            if m.exists {
                format!(
                    "{}: hash {}, interfaces [{}]",
                    m.name,
                    m.hash.as_deref().unwrap_or_default(),
                    m.interfaces.join(", ")
                )
            } else {
                format!("{}: not deployed", m.name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    Output::new(json)
        .field_json("modules", &modules)
        .message(&message)
        .print();
    Ok(())
}

/// Show an account balance on one chain, or on every chain
pub async fn balance(
    config: &Config,
    module: &str,
    account: &str,
    chain: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let queries = ChainwebQueryService::new(client, Cache::memory());
    let mut accounts = match chain {
        Some(chain) => queries
            .account_details(chain, module, account)
            .await?
            .into_iter()
            .collect(),
        None => queries.account_details_all_chains(module, account).await?,
    };
    accounts.retain(|a| a.exists());
    accounts.sort_by_key(|a| a.chain.parse::<u64>().unwrap_or(u64::MAX));

    let message = if accounts.is_empty() {
        format!("{} has no {} account", account, module)
    } else {
        accounts
            .iter()
            .map(|a| {
                format!(
                    "chain {:>2}: {}",
                    a.chain,
                    a.balance.map(|b| b.to_string()).unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    Output::new(json)
        .field_json("accounts", &accounts)
        .message(&message)
        .print();
    Ok(())
}
