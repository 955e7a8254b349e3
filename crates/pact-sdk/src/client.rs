//! PactClient - chain-scoped HTTP client

use parking_lot::RwLock;
use pact_types::hash::hash_encoded;
use pact_types::{BlockHeader, BlockPayload, Command, CommandResponse, PactCmd, Signature, WireCommand};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::builder::{CommandBuilder, ContinuationStep};
use crate::settings::{ClientSettings, NetworkProfile};
use crate::transport::{HttpResponse, Transport};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Accept header that makes the node encode headers as JSON objects
pub const BLOCK_HEADER_ACCEPT: &str = "application/json;blockheader-encoding=object";

/// Timeout of the chain discovery request
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of submitting a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The node accepted the command under this request key
    Accepted(String),
    /// The node's answer did not contain a request key
    Rejected {
        /// Raw response body
        body: String,
        /// Why the body was not accepted
        diagnostic: String,
    },
}

impl SubmitOutcome {
    /// Request key, if accepted
    pub fn request_key(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Accepted(key) => Some(key),
            SubmitOutcome::Rejected { .. } => None,
        }
    }
}

struct ClientState {
    settings: ClientSettings,
    profile: NetworkProfile,
    chains: Option<Vec<String>>,
}

/// Client for a Pact/Chainweb network
pub struct PactClient {
    transport: Arc<dyn Transport>,
    state: RwLock<ClientState>,
}

impl PactClient {
    /// Create a client over a transport. Chain discovery runs in
    /// [`PactClient::initialize`].
    pub fn new(transport: Arc<dyn Transport>, settings: ClientSettings) -> Result<Self, SdkError> {
        let profile = settings.resolve()?;
        Ok(Self {
            transport,
            state: RwLock::new(ClientState {
                settings,
                profile,
                chains: None,
            }),
        })
    }

    /// Create a client with the HTTP transport and discover chains
    #[cfg(feature = "http")]
    pub async fn connect(settings: ClientSettings, timeout: Duration) -> Result<Self, SdkError> {
        let client = Self::new(Arc::new(HttpTransport::new(timeout)?), settings)?;
        client.initialize().await?;
        Ok(client)
    }

    // ==================== Settings ====================

    /// Current settings
    pub fn settings(&self) -> ClientSettings {
        self.state.read().settings.clone()
    }

    /// Resolved network profile
    pub fn profile(&self) -> NetworkProfile {
        self.state.read().profile.clone()
    }

    /// Network id of the current profile
    pub fn network_id(&self) -> Option<String> {
        self.state.read().profile.network_id.clone()
    }

    /// Network name used in cache keys
    pub fn cache_network(&self) -> String {
        self.state.read().profile.cache_name().to_string()
    }

    /// Discover the chain set once; later calls return the memoized list
    pub async fn initialize(&self) -> Result<Vec<String>, SdkError> {
        if let Some(chains) = self.state.read().chains.clone() {
            return Ok(chains);
        }
        let profile = self.profile();
        let chains = self.discover_chains().await;
        info!(
            "Initialized {} ({}) with {} chains",
            profile.host,
            profile.cache_name(),
            chains.len()
        );

        let mut state = self.state.write();
        // Settings may have changed while discovery was in flight
        if state.profile == profile {
            state.chains = Some(chains.clone());
        }
        Ok(chains)
    }

    /// Switch settings and re-run discovery
    pub async fn update_settings(&self, settings: ClientSettings) -> Result<Vec<String>, SdkError> {
        let profile = settings.resolve()?;
        {
            let mut state = self.state.write();
            state.settings = settings;
            state.profile = profile;
            state.chains = None;
        }
        self.initialize().await
    }

    /// Chains found by discovery
    pub fn recognized_chains(&self) -> Result<Vec<String>, SdkError> {
        self.state.read().chains.clone().ok_or(SdkError::NotInitialized)
    }

    /// Ask the node for its current cut. Falls back to the profile's
    /// default chain set on timeout, error or an empty answer.
    pub async fn discover_chains(&self) -> Vec<String> {
        let profile = self.profile();
        let url = profile.url(None, "/cut");
        debug!("Discovering chains at {}", url);

        let cut = match tokio::time::timeout(DISCOVERY_TIMEOUT, self.transport.get(&url, None)).await {
            Ok(Ok(response)) => response
                .error_for_status()
                .and_then(|r| r.json::<Value>())
                .and_then(|body| parse_cut(&body)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SdkError::Transport("chain discovery timed out".to_string())),
        };

        match cut {
            Ok(heights) if !heights.is_empty() => sort_chains(heights.into_keys().collect()),
            Ok(_) => {
                warn!("Node reported no chains, using defaults");
                profile.default_chains()
            }
            Err(e) => {
                warn!("Chain discovery failed, using defaults: {}", e);
                profile.default_chains()
            }
        }
    }

    // ==================== Command Building ====================

    /// Command builder for the current network and gas defaults
    pub fn command_builder(&self) -> CommandBuilder {
        let state = self.state.read();
        CommandBuilder::new(state.profile.network_id.clone(), state.settings.gas.clone())
    }

    /// Code execution command for a chain
    pub fn generate_exec_command(&self, chain: &str, code: &str, data: Option<Value>) -> PactCmd {
        self.command_builder().generate_exec_command(chain, code, data)
    }

    /// Continuation command for a chain
    pub fn generate_cont_command(&self, chain: &str, step: ContinuationStep) -> PactCmd {
        self.command_builder().generate_cont_command(chain, step)
    }

    /// Hash a command body
    pub fn build_command(&self, cmd: PactCmd, sigs: Vec<Signature>) -> Result<Command, SdkError> {
        self.command_builder().build_command(cmd, sigs)
    }

    // ==================== Execution ====================

    /// Submit a command for inclusion in a block
    pub async fn send(&self, command: &Command) -> Result<SubmitOutcome, SdkError> {
        let url = self.url(Some(command.chain_id()), "/pact/api/v1/send");
        debug!("send {} on chain {}", command.hash(), command.chain_id());

        let body = json!({ "cmds": [command.to_wire()] });
        let response = self.transport.post_json(&url, &body).await?;
        Ok(parse_submit(response))
    }

    /// Execute a command without committing it. A reply that is not a
    /// command response becomes a synthesized failure carrying the body.
    pub async fn local(&self, command: &Command) -> Result<CommandResponse, SdkError> {
        let url = self.url(Some(command.chain_id()), "/pact/api/v1/local");
        debug!("local {} on chain {}", command.hash(), command.chain_id());

        let body = serde_json::to_value(command.to_wire())?;
        let response = self.transport.post_json(&url, &body).await?;
        let mut result = match serde_json::from_str::<CommandResponse>(&response.body) {
            Ok(result) if response.is_success() => result,
            Ok(_) => CommandResponse::synthesized_failure(
                response.body.clone(),
                format!("HTTP {}", response.status),
            ),
            Err(e) => CommandResponse::synthesized_failure(response.body.clone(), e.to_string()),
        };
        result.source_command = Some(command.clone());
        Ok(result)
    }

    /// Poll request keys. Every requested key appears in the result;
    /// keys the node does not know map to `None`.
    pub async fn poll(
        &self,
        chain: &str,
        request_keys: &[String],
    ) -> Result<BTreeMap<String, Option<CommandResponse>>, SdkError> {
        let url = self.url(Some(chain), "/pact/api/v1/poll");
        debug!("poll {} keys on chain {}", request_keys.len(), chain);

        let response = self
            .transport
            .post_json(&url, &json!({ "requestKeys": request_keys }))
            .await?
            .error_for_status()?;
        let found: Map<String, Value> = response.json()?;

        // A key may be requested more than once; every copy sees the answer
        request_keys
            .iter()
            .map(|key| -> Result<_, SdkError> {
                let entry = match found.get(key) {
                    Some(value) => Some(
                        serde_json::from_value(value.clone())
                            .map_err(|e| SdkError::Protocol(format!("poll {}: {}", key, e)))?,
                    ),
                    None => None,
                };
                Ok((key.clone(), entry))
            })
            .collect()
    }

    /// Poll a single request key
    pub async fn poll_one(
        &self,
        chain: &str,
        request_key: &str,
    ) -> Result<Option<CommandResponse>, SdkError> {
        let mut results = self.poll(chain, &[request_key.to_string()]).await?;
        Ok(results.remove(request_key).flatten())
    }

    // ==================== Blocks ====================

    /// Current block height of every chain
    pub async fn cut_heights(&self) -> Result<BTreeMap<String, u64>, SdkError> {
        let url = self.url(None, "/cut");
        debug!("cut {}", url);
        let body: Value = self.transport.get(&url, None).await?.error_for_status()?.json()?;
        parse_cut(&body)
    }

    /// Block header by hash
    pub async fn block_header(
        &self,
        chain: &str,
        block_hash: &str,
    ) -> Result<Option<BlockHeader>, SdkError> {
        let url = self.url(Some(chain), &format!("/header/{}?t=json", block_hash));
        debug!("header {} on chain {}", block_hash, chain);

        let response = self.transport.get(&url, Some(BLOCK_HEADER_ACCEPT)).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    /// Block headers in a height range
    pub async fn block_headers(
        &self,
        chain: &str,
        min_height: u64,
        max_height: Option<u64>,
    ) -> Result<Vec<BlockHeader>, SdkError> {
        let query = match max_height {
            Some(max) => format!("?minheight={}&maxheight={}&t=json", min_height, max),
            None => format!("?minheight={}&t=json", min_height),
        };
        let url = self.url(Some(chain), &format!("/header{}", query));
        debug!("headers from {} on chain {}", min_height, chain);

        let body: Value = self
            .transport
            .get(&url, Some(BLOCK_HEADER_ACCEPT))
            .await?
            .error_for_status()?
            .json()?;
        let items = body
            .get("items")
            .cloned()
            .ok_or_else(|| SdkError::Protocol("header page without items".to_string()))?;
        serde_json::from_value(items).map_err(|e| SdkError::Protocol(e.to_string()))
    }

    /// Block payload with outputs
    pub async fn block_payload(
        &self,
        chain: &str,
        payload_hash: &str,
    ) -> Result<Option<BlockPayload>, SdkError> {
        let url = self.url(Some(chain), &format!("/payload/{}/outputs", payload_hash));
        debug!("payload {} on chain {}", payload_hash, chain);

        let response = self.transport.get(&url, None).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    // ==================== Mempool ====================

    /// Request keys pending in a chain's mempool
    pub async fn mempool_pending(&self, chain: &str) -> Result<Vec<String>, SdkError> {
        let url = self.profile().p2p_url(Some(chain), "/mempool/getPending")?;
        debug!("mempool pending on chain {}", chain);

        let body: Value = self
            .transport
            .post_json(&url, &json!({}))
            .await?
            .error_for_status()?
            .json()?;
        let hashes = body
            .get("hashes")
            .cloned()
            .ok_or_else(|| SdkError::Protocol("pending answer without hashes".to_string()))?;
        serde_json::from_value(hashes).map_err(|e| SdkError::Protocol(e.to_string()))
    }

    /// Look up pending commands. Each returned command must hash to the key
    /// it was requested under.
    pub async fn mempool_lookup(
        &self,
        chain: &str,
        request_keys: &[String],
    ) -> Result<BTreeMap<String, Option<Command>>, SdkError> {
        let url = self.profile().p2p_url(Some(chain), "/mempool/lookup")?;
        debug!("mempool lookup {} keys on chain {}", request_keys.len(), chain);

        let entries: Vec<Value> = self
            .transport
            .post_json(&url, &json!(request_keys))
            .await?
            .error_for_status()?
            .json()?;
        if entries.len() != request_keys.len() {
            return Err(SdkError::Protocol(format!(
                "mempool lookup returned {} entries for {} keys",
                entries.len(),
                request_keys.len()
            )));
        }

        request_keys
            .iter()
            .zip(entries)
            .map(|(key, entry)| -> Result<_, SdkError> {
                Ok((key.clone(), parse_lookup_entry(key, &entry)?))
            })
            .collect()
    }

    // ==================== SPV ====================

    /// SPV proof that a command on `chain` can be continued on `target_chain`
    pub async fn spv_proof(
        &self,
        chain: &str,
        target_chain: &str,
        request_key: &str,
    ) -> Result<String, SdkError> {
        let url = self.url(Some(chain), "/pact/spv");
        debug!("spv {} from chain {} to {}", request_key, chain, target_chain);

        let response = self
            .transport
            .post_json(
                &url,
                &json!({ "targetChainId": target_chain, "requestKey": request_key }),
            )
            .await?
            .error_for_status()?;
        Ok(response.body.trim().trim_matches('"').to_string())
    }

    fn url(&self, chain: Option<&str>, endpoint: &str) -> String {
        self.state.read().profile.url(chain, endpoint)
    }
}

fn parse_submit(response: HttpResponse) -> SubmitOutcome {
    if !response.is_success() {
        let diagnostic = format!("HTTP {}", response.status);
        return SubmitOutcome::Rejected {
            body: response.body,
            diagnostic,
        };
    }
    let key = serde_json::from_str::<Value>(&response.body)
        .map_err(|e| e.to_string())
        .and_then(|body| {
            body.get("requestKeys")
                .and_then(|keys| keys.get(0))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| "response carries no request key".to_string())
        });
    match key {
        Ok(key) => SubmitOutcome::Accepted(key),
        Err(diagnostic) => SubmitOutcome::Rejected {
            body: response.body,
            diagnostic,
        },
    }
}

fn parse_cut(body: &Value) -> Result<BTreeMap<String, u64>, SdkError> {
    let hashes = body
        .get("hashes")
        .and_then(Value::as_object)
        .ok_or_else(|| SdkError::Protocol("cut without hashes".to_string()))?;
    hashes
        .iter()
        .map(|(chain, entry)| -> Result<_, SdkError> {
            let height = entry
                .get("height")
                .and_then(Value::as_u64)
                .ok_or_else(|| SdkError::Protocol(format!("cut entry for chain {}", chain)))?;
            Ok((chain.clone(), height))
        })
        .collect()
}

fn sort_chains(mut chains: Vec<String>) -> Vec<String> {
    chains.sort_by_key(|c| (c.parse::<u64>().unwrap_or(u64::MAX), c.clone()));
    chains
}

fn parse_lookup_entry(key: &str, entry: &Value) -> Result<Option<Command>, SdkError> {
    if entry.get("tag").and_then(Value::as_str) != Some("Pending") {
        return Ok(None);
    }
    let wire: WireCommand = match entry.get("contents") {
        Some(Value::String(text)) => serde_json::from_str(text),
        Some(other) => serde_json::from_value(other.clone()),
        None => return Err(SdkError::Protocol(format!("pending entry {} without contents", key))),
    }
    .map_err(|e| SdkError::Protocol(format!("mempool entry {}: {}", key, e)))?;

    let command = Command::from_wire(wire)?;
    let actual = hash_encoded(command.encoded().as_bytes());
    if actual != key {
        return Err(SdkError::HashMismatch {
            expected: key.to_string(),
            actual,
        });
    }
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Network;
    use crate::transport::MockTransport;

    #[test]
    fn test_sort_chains_numeric() {
        let chains = sort_chains(vec!["10".into(), "2".into(), "0".into(), "1".into()]);
        assert_eq!(chains, vec!["0", "1", "2", "10"]);
    }

    #[test]
    fn test_parse_submit() {
        let ok = parse_submit(HttpResponse::new(200, r#"{"requestKeys":["rk"]}"#));
        assert_eq!(ok.request_key(), Some("rk"));

        let rejected = parse_submit(HttpResponse::new(200, "Validation failed"));
        assert!(matches!(rejected, SubmitOutcome::Rejected { .. }));

        let bad_status = parse_submit(HttpResponse::new(400, "invalid gas"));
        match bad_status {
            SubmitOutcome::Rejected { body, diagnostic } => {
                assert_eq!(body, "invalid gas");
                assert_eq!(diagnostic, "HTTP 400");
            }
            SubmitOutcome::Accepted(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_parse_cut() {
        let cut = parse_cut(&json!({
            "hashes": { "0": { "height": 10, "hash": "a" }, "1": { "height": 11, "hash": "b" } },
            "height": 21
        }))
        .unwrap();
        assert_eq!(cut.get("1"), Some(&11));
        assert!(parse_cut(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_recognized_chains_requires_initialize() {
        let client = PactClient::new(
            Arc::new(MockTransport::new()),
            ClientSettings::new(Network::Testnet),
        )
        .unwrap();
        assert!(matches!(
            client.recognized_chains(),
            Err(SdkError::NotInitialized)
        ));
        client.initialize().await.unwrap();
        assert_eq!(client.recognized_chains().unwrap().len(), 20);
    }
}
