//! Delivery of payloads to the next hop over the transport.

use tracing::debug;
use veil_onion::{Forwarder, NodeAddress, OnionError};
use veil_transport::{RpcClient, TransportError};
use veil_types::messages::MessageBody;

/// Sends payloads to `message` on the node at the next-hop port.
///
/// Whatever went wrong downstream, the caller only sees
/// [`OnionError::ForwardFailed`] with a fixed reason.
#[derive(Clone, Debug)]
pub struct TcpForwarder {
    client: RpcClient,
}

impl TcpForwarder {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }
}

impl Forwarder for TcpForwarder {
    async fn forward(&self, next_hop: NodeAddress, payload: Vec<u8>) -> veil_onion::Result<()> {
        let port = next_hop.port().ok_or_else(|| {
            OnionError::ForwardFailed(format!("next hop {next_hop} is not a port"))
        })?;

        let body = serde_json::to_value(MessageBody::from_bytes(&payload))
            .map_err(|e| OnionError::ForwardFailed(e.to_string()))?;

        match self.client.call(port, "message", body).await {
            Ok(_) => {
                debug!(port, size = payload.len(), "Payload delivered to next hop");
                Ok(())
            }
            Err(TransportError::Remote { .. }) => Err(OnionError::ForwardFailed(
                "next hop rejected message".into(),
            )),
            Err(_) => Err(OnionError::ForwardFailed(format!(
                "next hop {next_hop} unreachable"
            ))),
        }
    }
}
