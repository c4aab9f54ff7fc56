//! Integration test: a full overlay on localhost, driven over JSON-RPC.
//!
//! Exercises the complete message lifecycle:
//! 1. Launch registry, routers and users
//! 2. Check every service answers `status`
//! 3. Ask a user to send a message to another user
//! 4. Verify delivery and the sender's diagnostics
//! 5. Verify each relay on the circuit saw only its own hop
//!
//! Each test uses its own port range so tests can run in parallel.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use veil_node::{launch_network, NetworkConfig};
use veil_transport::{RpcClient, TransportError};

fn config(base: u16, router_count: u32) -> NetworkConfig {
    NetworkConfig {
        registry_port: base,
        router_base_port: base + 100,
        user_base_port: base + 200,
        router_count,
        user_count: 2,
        ..NetworkConfig::default()
    }
}

#[tokio::test]
#[ignore]
async fn message_delivered_over_tcp() {
    // =========================================================
    // Step 1: Launch the overlay
    // =========================================================
    let config = config(25100, 6);
    let network = launch_network(&config).await.expect("launch network");
    let client = RpcClient::localhost();

    // =========================================================
    // Step 2: Every service is live
    // =========================================================
    let status = client
        .call(config.registry_port, "status", Value::Null)
        .await
        .expect("registry status");
    assert_eq!(status, "live");
    for id in 0..6u16 {
        let status = client
            .call(config.router_base_port + id, "status", Value::Null)
            .await
            .expect("router status");
        assert_eq!(status, "live");
    }

    let registry = client
        .call(config.registry_port, "get_node_registry", Value::Null)
        .await
        .expect("registry");
    assert_eq!(registry["nodes"].as_array().map(Vec::len), Some(6));

    // =========================================================
    // Step 3: User 0 sends to user 1
    // =========================================================
    let sender_port = config.user_base_port;
    let recipient_port = config.user_base_port + 1;
    let ack = client
        .call(
            sender_port,
            "send_message",
            json!({ "message": "hello over the overlay", "destination_user_id": 1 }),
        )
        .await
        .expect("send_message");
    assert_eq!(ack["result"], "success");

    // =========================================================
    // Step 4: Delivery and sender diagnostics
    // =========================================================
    let received = client
        .call(recipient_port, "get_last_received_message", Value::Null)
        .await
        .expect("last received");
    assert_eq!(received["result"], "hello over the overlay");

    let sent = client
        .call(sender_port, "get_last_sent_message", Value::Null)
        .await
        .expect("last sent");
    assert_eq!(sent["result"], "hello over the overlay");

    let circuit = client
        .call(sender_port, "get_last_circuit", Value::Null)
        .await
        .expect("last circuit");
    let path: Vec<u16> = circuit["result"]
        .as_array()
        .expect("circuit array")
        .iter()
        .filter_map(Value::as_u64)
        .filter_map(|id| u16::try_from(id).ok())
        .collect();
    assert_eq!(path.len(), 3);

    // =========================================================
    // Step 5: Each relay forwarded to the next hop only
    // =========================================================
    let expected_next: Vec<u64> = path
        .iter()
        .skip(1)
        .map(|id| u64::from(config.router_base_port + id))
        .chain(std::iter::once(u64::from(recipient_port)))
        .collect();

    for (id, next) in path.iter().zip(&expected_next) {
        let port = config.router_base_port + id;
        let destination = client
            .call(port, "get_last_message_destination", Value::Null)
            .await
            .expect("destination");
        assert_eq!(destination["result"].as_u64(), Some(*next));

        let source = client
            .call(port, "get_last_message_source", Value::Null)
            .await
            .expect("source");
        assert_eq!(source["result"].as_u64(), Some(u64::from(*id)));
    }

    // The exit relay's decrypted payload is the plaintext.
    let exit_port = config.router_base_port + path[2];
    let decrypted = client
        .call(exit_port, "get_last_received_decrypted_message", Value::Null)
        .await
        .expect("decrypted");
    let plaintext = STANDARD
        .decode(decrypted["result"].as_str().expect("base64 string"))
        .expect("decode");
    assert_eq!(plaintext, b"hello over the overlay");

    network.shutdown();
}

#[tokio::test]
#[ignore]
async fn send_fails_with_too_few_routers() {
    let config = config(25400, 2);
    let network = launch_network(&config).await.expect("launch network");

    let result = RpcClient::localhost()
        .call(
            config.user_base_port,
            "send_message",
            json!({ "message": "nope", "destination_user_id": 1 }),
        )
        .await;
    assert!(matches!(
        result,
        Err(TransportError::Remote { code: -32020, .. })
    ));

    let received = RpcClient::localhost()
        .call(config.user_base_port + 1, "get_last_received_message", Value::Null)
        .await
        .expect("last received");
    assert!(received["result"].is_null());

    network.shutdown();
}

#[tokio::test]
#[ignore]
async fn relay_rejects_garbage_payload() {
    let config = config(25700, 3);
    let network = launch_network(&config).await.expect("launch network");

    let garbage = STANDARD.encode([0u8; 200]);
    let result = RpcClient::localhost()
        .call(
            config.router_base_port,
            "message",
            json!({ "message": garbage }),
        )
        .await;
    assert!(matches!(
        result,
        Err(TransportError::Remote { code: -32022, .. })
    ));

    // Private keys stay hidden unless configured.
    let key = RpcClient::localhost()
        .call(config.router_base_port, "get_private_key", Value::Null)
        .await;
    assert!(matches!(
        key,
        Err(TransportError::Remote { code: -32601, .. })
    ));

    network.shutdown();
}
