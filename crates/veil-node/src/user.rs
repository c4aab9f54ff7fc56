//! User service: message sender and final recipient.
//!
//! Sending runs the whole sender side of the protocol:
//!
//! ```text
//! get_node_registry -> select circuit -> wrap -> forward to circuit[0]
//! ```
//!
//! Receiving is the end of the path. The exit relay delivers the plaintext
//! through the same `message` call relays use, so users and relays share one
//! envelope.

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use veil_onion::{CircuitSelector, Forwarder, NodeAddress, OnionEncryptor, RegistrySnapshot};
use veil_transport::{RpcError, RpcHandler};
use veil_types::messages::{MessageBody, SendMessageBody};
use veil_types::{NodeId, PortLayout, UserId};

use crate::config::NetworkConfig;
use crate::forward::TcpForwarder;
use crate::registry::RegistryClient;
use crate::{diagnostic, parse_params, success, NodeError, Result};

#[derive(Clone, Debug, Default)]
struct UserRecord {
    last_received: Option<Vec<u8>>,
    last_sent: Option<String>,
    last_circuit: Option<Vec<NodeId>>,
}

/// A user of the overlay, reachable at `user_base_port + user_id`.
pub struct UserNode<F = TcpForwarder> {
    user_id: UserId,
    layout: PortLayout,
    registry: RegistryClient,
    selector: CircuitSelector,
    encryptor: OnionEncryptor,
    forwarder: F,
    last: RwLock<UserRecord>,
}

impl UserNode<TcpForwarder> {
    pub fn new(user_id: UserId, config: &NetworkConfig) -> Self {
        let registry = RegistryClient::new(config.client(), config.registry_port);
        Self::with_forwarder(user_id, config, registry, TcpForwarder::new(config.sender_client()))
    }
}

impl<F: Forwarder> UserNode<F> {
    pub fn with_forwarder(
        user_id: UserId,
        config: &NetworkConfig,
        registry: RegistryClient,
        forwarder: F,
    ) -> Self {
        let layout = config.layout();
        Self {
            user_id,
            layout,
            registry,
            selector: CircuitSelector::default(),
            encryptor: OnionEncryptor::new(layout),
            forwarder,
            last: RwLock::new(UserRecord::default()),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Send `message` to user `destination` through a fresh random circuit.
    ///
    /// Returns the circuit's relay ids in path order.
    pub async fn send_message(&self, message: &str, destination: UserId) -> Result<Vec<NodeId>> {
        let snapshot = RegistrySnapshot::from(self.registry.fetch().await?);
        let circuit = self.selector.select(&snapshot)?;
        let recipient = NodeAddress::new(self.layout.user_address(destination))?;
        let onion = self.encryptor.wrap(message.as_bytes(), recipient, &circuit)?;

        let path = circuit.node_ids();
        {
            let mut last = self.last.write().await;
            last.last_sent = Some(message.to_string());
            last.last_circuit = Some(path.clone());
        }

        debug!(
            user_id = self.user_id,
            entry = %onion.entry,
            size = onion.message.len(),
            "Sending onion"
        );
        self.forwarder
            .forward(onion.entry, onion.message.into_bytes())
            .await?;

        info!(user_id = self.user_id, destination, "Message sent");
        Ok(path)
    }

    /// Record a message delivered by an exit relay.
    pub async fn receive(&self, payload: Vec<u8>) {
        info!(user_id = self.user_id, size = payload.len(), "Message received");
        self.last.write().await.last_received = Some(payload);
    }

    pub async fn last_received_message(&self) -> Option<Vec<u8>> {
        self.last.read().await.last_received.clone()
    }

    pub async fn last_sent_message(&self) -> Option<String> {
        self.last.read().await.last_sent.clone()
    }

    /// Relay ids of the last circuit used, in path order.
    pub async fn last_circuit(&self) -> Option<Vec<NodeId>> {
        self.last.read().await.last_circuit.clone()
    }
}

impl<F: Forwarder + 'static> RpcHandler for UserNode<F> {
    async fn handle(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "status" => Ok(Value::from("live")),
            "message" => {
                let body: MessageBody = parse_params(params)?;
                let payload = body
                    .to_bytes()
                    .map_err(|e| RpcError::from(&NodeError::from(e)))?;
                self.receive(payload).await;
                Ok(success())
            }
            "send_message" => {
                let body: SendMessageBody = parse_params(params)?;
                self.send_message(&body.message, body.destination_user_id)
                    .await
                    .map_err(|e| RpcError::from(&e))?;
                Ok(success())
            }
            "get_last_received_message" => {
                let message = self
                    .last_received_message()
                    .await
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
                diagnostic(message)
            }
            "get_last_sent_message" => diagnostic(self.last_sent_message().await),
            "get_last_circuit" => diagnostic(self.last_circuit().await),
            _ => Err(RpcError::method_not_found(method)),
        }
    }
}
