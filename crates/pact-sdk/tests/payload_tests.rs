//! Block payload index tests for pact-sdk

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pact_sdk::pact_types::{BlockPayload, Command};
use pact_sdk::{ClientSettings, MockTransport, Network, PactClient, PayloadIndex};
use serde_json::json;
use std::sync::Arc;

fn encode(value: &serde_json::Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

fn command(code: &str) -> Command {
    let client = PactClient::new(
        Arc::new(MockTransport::new()),
        ClientSettings::new(Network::Testnet),
    )
    .unwrap();
    let cmd = client.generate_exec_command("0", code, None);
    client.build_command(cmd, vec![]).unwrap()
}

fn block(commands: &[&Command]) -> BlockPayload {
    let transactions = commands
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let tx = serde_json::to_value(c.to_wire()).unwrap();
            let output = json!({
                "reqKey": c.hash(),
                "result": { "status": "success", "data": i },
                "txId": i,
                "gas": 100
            });
            (encode(&tx), encode(&output))
        })
        .collect();
    BlockPayload {
        payload_hash: "ph".to_string(),
        transactions_hash: Some("th".to_string()),
        outputs_hash: Some("oh".to_string()),
        miner_data: None,
        coinbase: None,
        transactions,
    }
}

// ==================== Lazy Index Tests ====================

#[tokio::test]
async fn test_lookup_after_single_pass() {
    let t1 = command("(+ 1 1)");
    let t2 = command("(+ 2 2)");
    let index = PayloadIndex::new(block(&[&t1, &t2]));
    assert!(!index.is_decoded());
    assert_eq!(index.decode_passes(), 0);

    let found = index.transaction(t2.hash()).await.unwrap().unwrap();
    assert_eq!(found, t2);
    assert!(index.is_decoded());
    assert_eq!(index.decode_passes(), 1);

    assert_eq!(index.transaction(t1.hash()).await.unwrap().unwrap(), t1);
    assert_eq!(index.decode_passes(), 1);
}

#[tokio::test]
async fn test_unknown_key_does_not_redecode() {
    let t1 = command("(+ 1 1)");
    let index = PayloadIndex::new(block(&[&t1]));

    assert!(index.transaction("unknown").await.unwrap().is_none());
    assert!(index.transaction("unknown").await.unwrap().is_none());
    assert_eq!(index.decode_passes(), 1);
}

#[tokio::test]
async fn test_concurrent_first_access_decodes_once() {
    let t1 = command("(+ 1 1)");
    let t2 = command("(+ 2 2)");
    let index = Arc::new(PayloadIndex::new(block(&[&t1, &t2])));

    let (a, b) = tokio::join!(index.transaction(t1.hash()), index.transaction(t2.hash()));
    assert_eq!(a.unwrap().unwrap(), t1);
    assert_eq!(b.unwrap().unwrap(), t2);
    assert_eq!(index.decode_passes(), 1);
}

#[tokio::test]
async fn test_output_matches_transaction() {
    let t1 = command("(+ 1 1)");
    let t2 = command("(+ 2 2)");
    let index = PayloadIndex::new(block(&[&t1, &t2]));

    let output = index.output(t2.hash()).await.unwrap().unwrap();
    assert_eq!(output.req_key.as_deref(), Some(t2.hash()));
    assert_eq!(output.tx_id.as_deref(), Some("1"));
    assert_eq!(index.transactions().await.unwrap().len(), 2);
}
