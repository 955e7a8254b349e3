//! Block payload index
//!
//! A payload arrives as encoded (transaction, output) pairs. Decoding them
//! is the expensive part, so it happens at most once, on the blocking pool,
//! the first time a transaction is looked up.

use pact_types::hash::base64url_decode;
use pact_types::{BlockPayload, Command, CommandResponse, WireCommand};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::SdkError;

struct DecodedPayload {
    commands: Vec<Command>,
    outputs: Vec<CommandResponse>,
    positions: HashMap<String, usize>,
}

/// Lazily decoded view of a block payload, indexed by request key
pub struct PayloadIndex {
    payload: Arc<BlockPayload>,
    decoded: OnceCell<DecodedPayload>,
    decode_passes: AtomicUsize,
}

impl PayloadIndex {
    /// Wrap an undecoded payload
    pub fn new(payload: BlockPayload) -> Self {
        Self {
            payload: Arc::new(payload),
            decoded: OnceCell::new(),
            decode_passes: AtomicUsize::new(0),
        }
    }

    /// The raw payload
    pub fn payload(&self) -> &BlockPayload {
        &self.payload
    }

    /// Whether the bulk decode has run
    pub fn is_decoded(&self) -> bool {
        self.decoded.initialized()
    }

    /// Number of bulk decode passes started
    pub fn decode_passes(&self) -> usize {
        self.decode_passes.load(Ordering::SeqCst)
    }

    /// Transaction with the given request key
    pub async fn transaction(&self, request_key: &str) -> Result<Option<Command>, SdkError> {
        let decoded = self.decoded().await?;
        Ok(decoded
            .positions
            .get(request_key)
            .map(|&i| decoded.commands[i].clone()))
    }

    /// Output of the transaction with the given request key
    pub async fn output(&self, request_key: &str) -> Result<Option<CommandResponse>, SdkError> {
        let decoded = self.decoded().await?;
        Ok(decoded
            .positions
            .get(request_key)
            .map(|&i| decoded.outputs[i].clone()))
    }

    /// All transactions, in block order
    pub async fn transactions(&self) -> Result<Vec<Command>, SdkError> {
        Ok(self.decoded().await?.commands.clone())
    }

    async fn decoded(&self) -> Result<&DecodedPayload, SdkError> {
        self.decoded
            .get_or_try_init(|| async {
                self.decode_passes.fetch_add(1, Ordering::SeqCst);
                let payload = Arc::clone(&self.payload);
                tokio::task::spawn_blocking(move || decode_payload(&payload))
                    .await
                    .map_err(|e| SdkError::Protocol(format!("payload decode aborted: {}", e)))
                    .and_then(|decoded| decoded)
            })
            .await
    }
}

fn decode_payload(payload: &BlockPayload) -> Result<DecodedPayload, SdkError> {
    debug!(
        "Decoding {} transactions of payload {}",
        payload.len(),
        payload.payload_hash
    );
    let mut commands = Vec::with_capacity(payload.len());
    let mut outputs = Vec::with_capacity(payload.len());
    let mut positions = HashMap::with_capacity(payload.len());

    for (i, (encoded_tx, encoded_output)) in payload.transactions.iter().enumerate() {
        let wire: WireCommand = decode_json(encoded_tx)
            .map_err(|e| SdkError::Protocol(format!("transaction {}: {}", i, e)))?;
        let command = Command::from_wire(wire)?;
        command.verify_hash()?;

        let output: CommandResponse = decode_json(encoded_output)
            .map_err(|e| SdkError::Protocol(format!("output {}: {}", i, e)))?;

        positions.insert(command.hash().to_string(), i);
        commands.push(command);
        outputs.push(output);
    }

    Ok(DecodedPayload {
        commands,
        outputs,
        positions,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(encoded: &str) -> Result<T, String> {
    let bytes = base64url_decode(encoded).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}
