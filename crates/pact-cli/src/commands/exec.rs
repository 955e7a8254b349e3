//! Execution commands: local, send, poll, spv

use pact_sdk::pact_types::CommandResponse;
use pact_sdk::SubmitOutcome;

use super::{connect, parse_data};
use crate::{config::Config, output::Output, CliError};

/// Execute code locally without committing it
pub async fn local(
    config: &Config,
    chain: &str,
    code: &str,
    data: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let cmd = client.generate_exec_command(chain, code, parse_data(data)?);
    let command = client.build_command(cmd, vec![])?;
    let response = client.local(&command).await?;
    print_response(&response, json);
    Ok(())
}

/// Submit unsigned code for inclusion in a block
pub async fn send(
    config: &Config,
    chain: &str,
    code: &str,
    data: Option<&str>,
    sender: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let mut cmd = client.generate_exec_command(chain, code, parse_data(data)?);
    if let Some(sender) = sender {
        cmd.meta.sender = sender.to_string();
    }
    let command = client.build_command(cmd, vec![])?;

    match client.send(&command).await? {
        SubmitOutcome::Accepted(key) => {
            Output::new(json)
                .field("request_key", &key)
                .field("chain", chain)
                .message(&format!("Submitted: {}", key))
                .print();
            Ok(())
        }
        SubmitOutcome::Rejected { body, diagnostic } => Err(CliError::InvalidInput(format!(
            "node rejected the command ({}): {}",
            diagnostic, body
        ))),
    }
}

/// Poll request keys on a chain
pub async fn poll(
    config: &Config,
    chain: &str,
    keys: &[String],
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let results = client.poll(chain, keys).await?;

    let mut message = String::new();
    for (key, response) in &results {
        let status = match response {
            Some(r) if r.is_finalized() => format!(
                "{} in block {}",
                status_of(r),
                r.block_hash().unwrap_or_default()
            ),
            Some(r) => status_of(r).to_string(),
            None => "unknown".to_string(),
        };
        message.push_str(&format!("{}: {}\n", key, status));
    }
    Output::new(json)
        .field_json("results", &results)
        .message(message.trim_end())
        .print();
    Ok(())
}

/// Fetch an SPV proof for a cross-chain continuation
pub async fn spv(
    config: &Config,
    chain: &str,
    target: &str,
    request_key: &str,
    json: bool,
) -> Result<(), CliError> {
    let client = connect(config).await?;
    let proof = client.spv_proof(chain, target, request_key).await?;
    Output::new(json)
        .field("proof", &proof)
        .field("target_chain", target)
        .message(&proof)
        .print();
    Ok(())
}

fn status_of(response: &CommandResponse) -> &'static str {
    if response.is_success() {
        "success"
    } else {
        "failure"
    }
}

fn print_response(response: &CommandResponse, json: bool) {
    let message = if response.is_success() {
        let value = response.result.data.clone().unwrap_or_default();
        format!("{}", value)
    } else {
        let error = response.result.error.clone().unwrap_or_default();
        format!("Failure: {}", error.message)
    };
    Output::new(json)
        .field("status", status_of(response))
        .field_json("result", &response.result)
        .field_json("gas", &response.gas)
        .field_json("events", &response.events)
        .message(&message)
        .print();
}
