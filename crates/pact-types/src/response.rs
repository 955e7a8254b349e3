//! Command execution results

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cacheable::Cacheable;
use crate::command::{ChainwebMetadata, Command};
use crate::de::opt_string_or_number;
use crate::value::{PactValue, RefSpec};

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Execution succeeded
    Success,
    /// Execution failed
    Failure,
}

/// Structured execution error reported by the node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PactError {
    /// Error message
    #[serde(default)]
    pub message: String,
    /// Call stack, innermost frame first
    #[serde(default)]
    pub call_stack: Vec<String>,
    /// Free-form diagnostic info
    #[serde(default)]
    pub info: Option<String>,
    /// Error kind, e.g. `TxFailure`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Status
    pub status: ResultStatus,
    /// Returned value (raw JSON), on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error, on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PactError>,
}

impl CommandResult {
    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Decoded return value
    pub fn value(&self) -> Option<PactValue> {
        self.data.as_ref().map(PactValue::from_json)
    }
}

/// Block metadata, populated once the command is included in a block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Block creation time (microseconds since epoch)
    #[serde(default)]
    pub block_time: Option<u64>,
    /// Block height
    #[serde(default)]
    pub block_height: Option<u64>,
    /// Block hash
    #[serde(default)]
    pub block_hash: Option<String>,
    /// Parent block hash
    #[serde(default)]
    pub prev_block_hash: Option<String>,
    /// Public metadata of the executed command
    #[serde(default)]
    pub public_meta: Option<ChainwebMetadata>,
}

/// Origin of a cross-chain yield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    /// Chain allowed to resume the pact
    pub target_chain_id: String,
    /// Hash of the yielding module
    pub module_hash: String,
}

/// Value yielded between pact steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Yield {
    /// Yielded data
    #[serde(default)]
    pub data: Value,
    /// Cross-chain provenance, when the yield targets another chain
    #[serde(default)]
    pub provenance: Option<Provenance>,
}

/// The defpact invocation being continued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationCall {
    /// Qualified defpact name
    pub def: String,
    /// Invocation arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Continuation state of a multi-step pact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    /// Pact id
    pub pact_id: String,
    /// Step just executed
    pub step: u32,
    /// Total steps
    pub step_count: u32,
    /// Whether the step executed (private pacts may skip)
    #[serde(default)]
    pub executed: Option<bool>,
    /// Whether the step can be rolled back
    #[serde(default)]
    pub step_has_rollback: bool,
    /// Continued invocation
    pub continuation: ContinuationCall,
    /// Yielded value
    #[serde(default, rename = "yield")]
    pub yielded: Option<Yield>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPactEvent {
    name: String,
    #[serde(default)]
    params: Vec<Value>,
    module: RefSpec,
    #[serde(default)]
    module_hash: String,
}

/// An event emitted during execution. Parameters are decoded once, when the
/// event is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPactEvent", rename_all = "camelCase")]
pub struct PactEvent {
    /// Event name
    pub name: String,
    /// Decoded parameters
    pub params: Vec<PactValue>,
    /// Emitting module
    pub module: RefSpec,
    /// Hash of the emitting module
    pub module_hash: String,
}

impl PactEvent {
    /// Build an event from raw JSON parameters
    pub fn new(name: impl Into<String>, params: &[Value], module: RefSpec, module_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(PactValue::from_json).collect(),
            module,
            module_hash: module_hash.into(),
        }
    }

    /// Qualified name, e.g. `coin.TRANSFER`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

impl From<RawPactEvent> for PactEvent {
    fn from(raw: RawPactEvent) -> Self {
        PactEvent::new(raw.name, &raw.params, raw.module, raw.module_hash)
    }
}

/// Response to a polled or locally executed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// Request key
    #[serde(default)]
    pub req_key: Option<String>,
    /// Execution result
    pub result: CommandResult,
    /// Transaction id (the node emits a number, some gateways a string)
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub tx_id: Option<String>,
    /// Gas consumed
    #[serde(default)]
    pub gas: Option<u64>,
    /// Hash of the transaction logs
    #[serde(default)]
    pub logs: Option<String>,
    /// Block metadata
    #[serde(default, rename = "metaData", alias = "metadata")]
    pub metadata: Option<ResponseMetadata>,
    /// Continuation state
    #[serde(default)]
    pub continuation: Option<Continuation>,
    /// Emitted events
    #[serde(default)]
    pub events: Vec<PactEvent>,
    /// The command that produced this response, when executed locally
    #[serde(skip)]
    pub source_command: Option<Command>,
}

impl CommandResponse {
    /// Failure response built on the client side, for when the node's reply
    /// could not be read at all
    pub fn synthesized_failure(message: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            req_key: None,
            result: CommandResult {
                status: ResultStatus::Failure,
                data: None,
                error: Some(PactError {
                    message: message.into(),
                    call_stack: Vec::new(),
                    info: Some(info.into()),
                    kind: None,
                }),
            },
            tx_id: None,
            gas: None,
            logs: None,
            metadata: None,
            continuation: None,
            events: Vec::new(),
            source_command: None,
        }
    }

    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// Hash of the including block, once finalized
    pub fn block_hash(&self) -> Option<&str> {
        self.metadata.as_ref()?.block_hash.as_deref()
    }

    /// Whether the command has been included in a block
    pub fn is_finalized(&self) -> bool {
        self.block_hash().is_some()
    }

    /// Chain the command ran on, from block metadata or the source command
    pub fn chain_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.public_meta.as_ref())
            .map(|m| m.chain_id.as_str())
            .or_else(|| self.source_command.as_ref().map(Command::chain_id))
    }

    /// Key under which a response is cached
    pub fn cache_key_for(request_key: &str) -> String {
        format!("command-response@{}", request_key)
    }
}

impl Cacheable for CommandResponse {
    fn cache_key(&self) -> String {
        match &self.req_key {
            Some(key) => Self::cache_key_for(key),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn finalized_response() -> Value {
        json!({
            "gas": 123,
            "result": { "status": "success", "data": { "decimal": "12.5" } },
            "reqKey": "rk1",
            "logs": "wsATyGqckuIvlm89hhd2j4t6RMkCrcwJe_oeCYr7Th8",
            "events": [{
                "params": ["alice", "bob", 1.5],
                "name": "TRANSFER",
                "module": { "namespace": null, "name": "coin" },
                "moduleHash": "rE7DU8jlQL9x_MPYuniZJf5ICBTAEHAIFQCB4blofP4"
            }],
            "metaData": {
                "publicMeta": {
                    "creationTime": 1700000000,
                    "ttl": 28800,
                    "gasLimit": 2500,
                    "chainId": "1",
                    "gasPrice": 1.0e-8,
                    "sender": "alice"
                },
                "blockTime": 1700000012345678u64,
                "prevBlockHash": "prev",
                "blockHeight": 4000000,
                "blockHash": "bh1"
            },
            "continuation": null,
            "txId": 987654
        })
    }

    #[test]
    fn test_deserialize_finalized() {
        let resp: CommandResponse = serde_json::from_value(finalized_response()).unwrap();
        assert!(resp.is_success());
        assert!(resp.is_finalized());
        assert_eq!(resp.block_hash(), Some("bh1"));
        assert_eq!(resp.chain_id(), Some("1"));
        assert_eq!(resp.tx_id.as_deref(), Some("987654"));
        assert_eq!(resp.gas, Some(123));
        assert_eq!(
            resp.result.value().and_then(|v| v.as_decimal()),
            Some(Decimal::new(125, 1))
        );
    }

    #[test]
    fn test_event_params_decoded() {
        let resp: CommandResponse = serde_json::from_value(finalized_response()).unwrap();
        let event = &resp.events[0];
        assert_eq!(event.qualified_name(), "coin.TRANSFER");
        assert_eq!(event.params[0], PactValue::String("alice".to_string()));
        assert_eq!(event.params[2].as_decimal(), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn test_deserialize_pending_local() {
        let resp: CommandResponse = serde_json::from_value(json!({
            "result": { "status": "success", "data": 3 },
            "reqKey": "rk2",
            "gas": 5
        }))
        .unwrap();
        assert!(!resp.is_finalized());
        assert!(resp.events.is_empty());
        assert_eq!(resp.chain_id(), None);
    }

    #[test]
    fn test_deserialize_failure() {
        let resp: CommandResponse = serde_json::from_value(json!({
            "result": {
                "status": "failure",
                "error": {
                    "callStack": ["<interactive>:0:0: (+ 1 \"a\")"],
                    "type": "EvalError",
                    "message": "Invalid arguments",
                    "info": ""
                }
            },
            "reqKey": "rk3",
            "txId": null
        }))
        .unwrap();
        assert!(!resp.is_success());
        let err = resp.result.error.unwrap();
        assert_eq!(err.message, "Invalid arguments");
        assert_eq!(err.kind.as_deref(), Some("EvalError"));
        assert_eq!(err.call_stack.len(), 1);
        assert_eq!(resp.tx_id, None);
    }

    #[test]
    fn test_continuation_with_yield() {
        let cont: Continuation = serde_json::from_value(json!({
            "pactId": "pid",
            "step": 0,
            "stepCount": 2,
            "executed": null,
            "stepHasRollback": false,
            "continuation": { "def": "coin.transfer-crosschain", "args": ["a", "b"] },
            "yield": {
                "data": { "amount": 1.0 },
                "provenance": { "targetChainId": "2", "moduleHash": "mh" }
            }
        }))
        .unwrap();
        let provenance = cont.yielded.unwrap().provenance.unwrap();
        assert_eq!(provenance.target_chain_id, "2");
        assert_eq!(cont.continuation.args.len(), 2);
    }

    #[test]
    fn test_synthesized_failure() {
        let resp = CommandResponse::synthesized_failure("<html>bad gateway</html>", "expected value");
        assert!(!resp.is_success());
        let err = resp.result.error.unwrap();
        assert_eq!(err.message, "<html>bad gateway</html>");
        assert_eq!(err.info.as_deref(), Some("expected value"));
    }

    #[test]
    fn test_cache_key() {
        let resp: CommandResponse = serde_json::from_value(finalized_response()).unwrap();
        assert_eq!(resp.cache_key(), "command-response@rk1");
    }

    #[test]
    fn test_cache_roundtrip_keeps_events() {
        let resp: CommandResponse = serde_json::from_value(finalized_response()).unwrap();
        let cached = serde_json::to_value(&resp).unwrap();
        let back: CommandResponse = serde_json::from_value(cached).unwrap();
        assert_eq!(back, resp);
    }
}
