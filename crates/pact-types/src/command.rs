//! Pact command types
//!
//! A [`PactCmd`] is the unsigned body of a command. Building a [`Command`]
//! freezes it: the body is encoded to canonical JSON once, and the request
//! key is the hash of exactly those bytes. The encoded string travels on the
//! wire unchanged, so the node recomputes the same key.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TypesError, TypesResult};
use crate::hash::hash_encoded;

/// Public metadata attached to every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainwebMetadata {
    /// Target chain
    pub chain_id: String,
    /// Gas payer account
    #[serde(default)]
    pub sender: String,
    /// Maximum gas units
    pub gas_limit: u64,
    /// Price per gas unit
    #[serde(with = "rust_decimal::serde::float")]
    pub gas_price: Decimal,
    /// Time-to-live in seconds
    pub ttl: u64,
    /// Creation time, whole seconds since the Unix epoch
    pub creation_time: u64,
}

/// A capability granted by a signer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Qualified capability name, e.g. `coin.TRANSFER`
    pub name: String,
    /// Capability arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

/// A signer entry: public key and the capabilities it scopes its signature to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    /// Public key (hex)
    pub pub_key: String,
    /// Signature scheme, defaults to ED25519 on the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Address, when it differs from the public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    /// Capability list
    #[serde(default)]
    pub clist: Vec<Capability>,
}

impl Signer {
    /// Unscoped signer for a public key
    pub fn new(pub_key: impl Into<String>) -> Self {
        Self {
            pub_key: pub_key.into(),
            scheme: None,
            addr: None,
            clist: Vec::new(),
        }
    }

    /// Add a capability
    pub fn with_capability(mut self, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.clist.push(Capability {
            name: name.into(),
            args,
        });
        self
    }
}

/// Code execution payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecPayload {
    /// Pact code
    pub code: String,
    /// JSON data readable via `read-msg`
    #[serde(default)]
    pub data: Value,
}

/// Continuation payload, resuming a multi-step pact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContPayload {
    /// Id of the pact being continued
    pub pact_id: String,
    /// Roll back instead of advancing
    pub rollback: bool,
    /// Step to execute
    pub step: u32,
    /// SPV proof for cross-chain continuations
    #[serde(default)]
    pub proof: Option<String>,
    /// JSON data readable via `read-msg`
    #[serde(default)]
    pub data: Value,
}

/// Command payload: exactly one of exec or continuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Payload {
    /// Execute code
    Exec(ExecPayload),
    /// Continue a pact
    Cont(ContPayload),
}

/// Unsigned command body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PactCmd {
    /// Network id; `None` for single-chain development servers
    pub network_id: Option<String>,
    /// Payload
    pub payload: Payload,
    /// Signers
    #[serde(default)]
    pub signers: Vec<Signer>,
    /// Public metadata
    pub meta: ChainwebMetadata,
    /// Nonce
    pub nonce: String,
}

impl PactCmd {
    /// Canonical JSON encoding. Field order is fixed by the struct layout,
    /// so equal commands always encode to the same bytes.
    pub fn encode(&self) -> TypesResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Target chain
    pub fn chain_id(&self) -> &str {
        &self.meta.chain_id
    }
}

/// An opaque, pre-computed signature over a request key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature bytes (hex)
    pub sig: String,
}

impl Signature {
    /// Wrap a signature string
    pub fn new(sig: impl Into<String>) -> Self {
        Self { sig: sig.into() }
    }
}

/// Wire form of a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCommand {
    /// Request key
    pub hash: String,
    /// Signatures
    #[serde(default)]
    pub sigs: Vec<Signature>,
    /// Encoded command body
    pub cmd: String,
}

/// A hashed, immutable command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireCommand", into = "WireCommand")]
pub struct Command {
    hash: String,
    sigs: Vec<Signature>,
    encoded: String,
    cmd: PactCmd,
}

impl Command {
    /// Encode and hash a command body.
    ///
    /// Signatures sign the resulting hash, so they travel next to it and do
    /// not contribute to it.
    pub fn build(cmd: PactCmd, sigs: Vec<Signature>) -> TypesResult<Self> {
        let encoded = cmd.encode()?;
        let hash = hash_encoded(encoded.as_bytes());
        Ok(Self {
            hash,
            sigs,
            encoded,
            cmd,
        })
    }

    /// Decode a wire command. The declared hash is kept as-is; call
    /// [`Command::verify_hash`] to check it.
    pub fn from_wire(wire: WireCommand) -> TypesResult<Self> {
        let cmd: PactCmd = serde_json::from_str(&wire.cmd)?;
        Ok(Self {
            hash: wire.hash,
            sigs: wire.sigs,
            encoded: wire.cmd,
            cmd,
        })
    }

    /// Wire form
    pub fn to_wire(&self) -> WireCommand {
        WireCommand {
            hash: self.hash.clone(),
            sigs: self.sigs.clone(),
            cmd: self.encoded.clone(),
        }
    }

    /// Recompute the hash of the encoded body and compare it to the declared one
    pub fn verify_hash(&self) -> TypesResult<()> {
        let actual = hash_encoded(self.encoded.as_bytes());
        if actual != self.hash {
            return Err(TypesError::HashMismatch {
                expected: self.hash.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Request key
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Signatures
    pub fn sigs(&self) -> &[Signature] {
        &self.sigs
    }

    /// Decoded command body
    pub fn cmd(&self) -> &PactCmd {
        &self.cmd
    }

    /// Encoded command body, exactly as hashed
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Target chain
    pub fn chain_id(&self) -> &str {
        self.cmd.chain_id()
    }
}

impl TryFrom<WireCommand> for Command {
    type Error = TypesError;

    fn try_from(wire: WireCommand) -> Result<Self, Self::Error> {
        Command::from_wire(wire)
    }
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        WireCommand {
            hash: command.hash,
            sigs: command.sigs,
            cmd: command.encoded,
        }
    }
}
