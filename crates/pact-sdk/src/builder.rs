//! Command builder

use chrono::{SecondsFormat, Utc};
use pact_types::hash::letters_only_hash;
use pact_types::{
    ChainwebMetadata, Command, ContPayload, Decimal, ExecPayload, PactCmd, Payload, Signature,
};
use serde_json::{json, Value};

use crate::settings::GasDefaults;
use crate::SdkError;

/// Per-command overrides of the gas defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOptions {
    /// Gas limit
    pub gas_limit: Option<u64>,
    /// Gas price
    pub gas_price: Option<Decimal>,
    /// Gas payer
    pub sender: Option<String>,
    /// Time-to-live in seconds
    pub ttl: Option<u64>,
    /// Creation time in epoch seconds
    pub creation_time: Option<u64>,
}

impl MetadataOptions {
    /// Set the gas limit
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Set the gas price
    pub fn gas_price(mut self, price: Decimal) -> Self {
        self.gas_price = Some(price);
        self
    }

    /// Set the gas payer
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Set the time-to-live
    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the creation time
    pub fn creation_time(mut self, seconds: u64) -> Self {
        self.creation_time = Some(seconds);
        self
    }
}

/// Continuation of a multi-step pact
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationStep {
    /// Pact id
    pub pact_id: String,
    /// Step to execute
    pub step: u32,
    /// Roll back instead of advancing
    pub rollback: bool,
    /// SPV proof for a cross-chain step
    pub proof: Option<String>,
    /// Data readable via `read-msg`
    pub data: Option<Value>,
}

/// Builds unsigned commands for one network
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    network_id: Option<String>,
    gas: GasDefaults,
}

impl CommandBuilder {
    /// Create a builder
    pub fn new(network_id: Option<String>, gas: GasDefaults) -> Self {
        Self { network_id, gas }
    }

    /// Network id stamped on every command
    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// Public metadata for a chain, defaults filled in
    pub fn generate_metadata(&self, chain: &str, options: MetadataOptions) -> ChainwebMetadata {
        ChainwebMetadata {
            chain_id: chain.to_string(),
            sender: options.sender.unwrap_or_default(),
            gas_limit: options.gas_limit.unwrap_or(self.gas.gas_limit),
            gas_price: options.gas_price.unwrap_or(self.gas.gas_price),
            ttl: options.ttl.unwrap_or(self.gas.ttl),
            creation_time: options.creation_time.unwrap_or_else(now_seconds),
        }
    }

    /// Code execution command with default metadata and no signers
    pub fn generate_exec_command(&self, chain: &str, code: &str, data: Option<Value>) -> PactCmd {
        self.command(
            chain,
            Payload::Exec(ExecPayload {
                code: code.to_string(),
                data: data.unwrap_or_else(|| json!({})),
            }),
        )
    }

    /// Continuation command with default metadata and no signers
    pub fn generate_cont_command(&self, chain: &str, step: ContinuationStep) -> PactCmd {
        self.command(
            chain,
            Payload::Cont(ContPayload {
                pact_id: step.pact_id,
                rollback: step.rollback,
                step: step.step,
                proof: step.proof,
                data: step.data.unwrap_or_else(|| json!({})),
            }),
        )
    }

    /// Freeze a command: encode it and compute its request key
    pub fn build_command(&self, cmd: PactCmd, sigs: Vec<Signature>) -> Result<Command, SdkError> {
        Ok(Command::build(cmd, sigs)?)
    }

    fn command(&self, chain: &str, payload: Payload) -> PactCmd {
        PactCmd {
            network_id: self.network_id.clone(),
            payload,
            signers: Vec::new(),
            meta: self.generate_metadata(chain, MetadataOptions::default()),
            nonce: generate_nonce(),
        }
    }
}

/// Fresh nonce: the current timestamp hashed and stripped to letters.
/// Busts caches; it is not a security token.
pub fn generate_nonce() -> String {
    letters_only_hash(&Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn now_seconds() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CommandBuilder {
        CommandBuilder::new(Some("testnet04".to_string()), GasDefaults::default())
    }

    #[test]
    fn test_generate_metadata_defaults() {
        let meta = builder().generate_metadata("2", MetadataOptions::default());
        assert_eq!(meta.chain_id, "2");
        assert_eq!(meta.gas_limit, 1500);
        assert_eq!(meta.gas_price, Decimal::new(1, 8));
        assert_eq!(meta.ttl, 3600);
        assert!(meta.creation_time > 1_600_000_000);
        assert!(meta.sender.is_empty());
    }

    #[test]
    fn test_generate_metadata_overrides() {
        let options = MetadataOptions::default()
            .gas_limit(150_000)
            .sender("alice")
            .ttl(600)
            .creation_time(42);
        let meta = builder().generate_metadata("0", options);
        assert_eq!(meta.gas_limit, 150_000);
        assert_eq!(meta.sender, "alice");
        assert_eq!(meta.ttl, 600);
        assert_eq!(meta.creation_time, 42);
    }

    #[test]
    fn test_generate_exec_command() {
        let cmd = builder().generate_exec_command("1", "(+ 1 2)", None);
        assert_eq!(cmd.network_id.as_deref(), Some("testnet04"));
        assert!(cmd.signers.is_empty());
        assert!(cmd.nonce.chars().all(|c| c.is_ascii_alphabetic()));
        match cmd.payload {
            Payload::Exec(exec) => assert_eq!(exec.data, json!({})),
            Payload::Cont(_) => panic!("expected exec payload"),
        }
    }

    #[test]
    fn test_generate_cont_command() {
        let cmd = builder().generate_cont_command(
            "1",
            ContinuationStep {
                pact_id: "pid".to_string(),
                step: 1,
                rollback: false,
                proof: Some("proof".to_string()),
                data: None,
            },
        );
        match cmd.payload {
            Payload::Cont(cont) => {
                assert_eq!(cont.step, 1);
                assert_eq!(cont.proof.as_deref(), Some("proof"));
            }
            Payload::Exec(_) => panic!("expected cont payload"),
        }
    }

    #[test]
    fn test_build_command_is_deterministic() {
        let b = builder();
        let cmd = b.generate_exec_command("0", "(+ 1 2)", None);
        let first = b.build_command(cmd.clone(), vec![]).unwrap();
        let second = b.build_command(cmd, vec![]).unwrap();
        assert_eq!(first.hash(), second.hash());
    }
}
