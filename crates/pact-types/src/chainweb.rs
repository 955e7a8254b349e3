//! Chainweb block header and payload types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cacheable::Cacheable;
use crate::de::string_or_number;

/// Block header, as returned with object encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Chain id (the node emits a number)
    #[serde(deserialize_with = "string_or_number")]
    pub chain_id: String,
    /// Mining nonce
    #[serde(deserialize_with = "string_or_number")]
    pub nonce: String,
    /// Creation time (microseconds since epoch)
    pub creation_time: u64,
    /// Parent block hash
    pub parent: String,
    /// Difficulty target
    pub target: String,
    /// Hash of the block payload
    pub payload_hash: String,
    /// Accumulated weight
    pub weight: String,
    /// Block height
    pub height: u64,
    /// Chainweb version tag, e.g. `mainnet01`
    pub chainweb_version: String,
    /// Start of the difficulty epoch
    pub epoch_start: u64,
    /// Feature flags
    #[serde(default)]
    pub feature_flags: Value,
    /// Block hash
    pub hash: String,
}

impl BlockHeader {
    /// Key under which a header is cached
    pub fn cache_key_for(block_hash: &str) -> String {
        format!("block-header@{}", block_hash)
    }
}

impl Cacheable for BlockHeader {
    fn cache_key(&self) -> String {
        Self::cache_key_for(&self.hash)
    }
}

/// Block payload with outputs. Transactions stay encoded; see the payload
/// index in the SDK for the decoded view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    /// Payload hash
    pub payload_hash: String,
    /// Merkle root of the transactions
    #[serde(default)]
    pub transactions_hash: Option<String>,
    /// Merkle root of the outputs
    #[serde(default)]
    pub outputs_hash: Option<String>,
    /// Encoded miner data
    #[serde(default)]
    pub miner_data: Option<String>,
    /// Encoded coinbase output
    #[serde(default)]
    pub coinbase: Option<String>,
    /// Encoded (transaction, output) pairs, in block order
    #[serde(default)]
    pub transactions: Vec<(String, String)>,
}

impl BlockPayload {
    /// Key under which a payload is cached
    pub fn cache_key_for(payload_hash: &str) -> String {
        format!("block-payload@{}", payload_hash)
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the block carries no transactions
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl Cacheable for BlockPayload {
    fn cache_key(&self) -> String {
        Self::cache_key_for(&self.payload_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_object_encoding() {
        let header: BlockHeader = serde_json::from_value(json!({
            "nonce": "7489273561873589",
            "creationTime": 1700000000000000u64,
            "parent": "parentHash",
            "adjacents": { "5": "a", "10": "b" },
            "target": "target",
            "payloadHash": "payloadHash",
            "chainId": 3,
            "weight": "weight",
            "height": 4200000,
            "chainwebVersion": "mainnet01",
            "epochStart": 1699999000000000u64,
            "featureFlags": 0,
            "hash": "blockHash"
        }))
        .unwrap();
        assert_eq!(header.chain_id, "3");
        assert_eq!(header.height, 4_200_000);
        assert_eq!(header.cache_key(), "block-header@blockHash");
    }

    #[test]
    fn test_payload_pairs() {
        let payload: BlockPayload = serde_json::from_value(json!({
            "transactions": [["tx1", "out1"], ["tx2", "out2"]],
            "minerData": "md",
            "transactionsHash": "th",
            "outputsHash": "oh",
            "payloadHash": "ph",
            "coinbase": "cb"
        }))
        .unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.transactions[1].0, "tx2");
        assert_eq!(payload.cache_key(), "block-payload@ph");
    }

    #[test]
    fn test_empty_payload() {
        let payload: BlockPayload = serde_json::from_value(json!({ "payloadHash": "ph" })).unwrap();
        assert!(payload.is_empty());
    }
}
