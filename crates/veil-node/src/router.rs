//! Onion router service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::info;
use veil_crypto::x25519::X25519StaticSecret;
use veil_onion::{HopRecord, NodeAddress, RelayProcessor, WrappedMessage};
use veil_transport::{RpcError, RpcHandler};
use veil_types::messages::MessageBody;
use veil_types::{NodeId, RelayIdentity};

use crate::config::NetworkConfig;
use crate::forward::TcpForwarder;
use crate::registry::RegistryClient;
use crate::{diagnostic, parse_params, success, NodeError, Result};

/// One relay of the overlay, reachable at `router_base_port + node_id`.
pub struct RouterNode {
    relay: RelayProcessor,
    forwarder: TcpForwarder,
    expose_private_keys: bool,
}

impl RouterNode {
    /// Create a router with a freshly generated key pair.
    pub fn new(node_id: NodeId, config: &NetworkConfig) -> Self {
        Self::with_secret(node_id, X25519StaticSecret::random(), config)
    }

    pub fn with_secret(
        node_id: NodeId,
        secret: X25519StaticSecret,
        config: &NetworkConfig,
    ) -> Self {
        Self {
            relay: RelayProcessor::new(node_id, secret),
            forwarder: TcpForwarder::new(config.client()),
            expose_private_keys: config.expose_private_keys,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.relay.node_id()
    }

    /// What this router publishes to the registry.
    pub fn identity(&self) -> RelayIdentity {
        RelayIdentity::from_key_bytes(self.node_id(), self.relay.public_key().as_bytes())
    }

    /// Publish this router's identity.
    pub async fn register(&self, registry: &RegistryClient) -> Result<()> {
        registry.register(&self.identity()).await?;
        info!(node_id = self.node_id(), "Router registered with registry");
        Ok(())
    }

    /// Unwrap one layer of `payload` and forward the rest.
    pub async fn handle_message(&self, payload: Vec<u8>) -> Result<NodeAddress> {
        let next_hop = self
            .relay
            .process(WrappedMessage::from_bytes(payload), &self.forwarder)
            .await?;
        Ok(next_hop)
    }

    pub async fn last_message(&self) -> HopRecord {
        self.relay.last_message().await
    }
}

fn encode_opt(bytes: Option<Vec<u8>>) -> Value {
    bytes.map_or(Value::Null, |b| Value::from(STANDARD.encode(b)))
}

impl RpcHandler for RouterNode {
    async fn handle(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "status" => Ok(Value::from("live")),
            "message" => {
                let body: MessageBody = parse_params(params)?;
                let payload = body
                    .to_bytes()
                    .map_err(|e| RpcError::from(&NodeError::from(e)))?;
                self.handle_message(payload)
                    .await
                    .map_err(|e| RpcError::from(&e))?;
                Ok(success())
            }
            "get_last_received_encrypted_message" => {
                diagnostic(encode_opt(self.last_message().await.encrypted))
            }
            "get_last_received_decrypted_message" => {
                diagnostic(encode_opt(self.last_message().await.decrypted))
            }
            "get_last_message_destination" => {
                let destination = self.last_message().await.destination.map(NodeAddress::get);
                diagnostic(destination)
            }
            "get_last_message_source" => diagnostic(self.last_message().await.source),
            "get_private_key" if self.expose_private_keys => {
                let key = STANDARD.encode(self.relay.private_key_bytes());
                diagnostic(key)
            }
            _ => Err(RpcError::method_not_found(method)),
        }
    }
}
