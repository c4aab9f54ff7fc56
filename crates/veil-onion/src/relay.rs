//! Per-hop processing, run identically by every relay.
//!
//! ## States
//!
//! ```text
//! RECEIVED --unwrap_layer--> UNWRAPPED --Forwarder::forward--> FORWARDED
//! ```
//!
//! A relay never learns its position in the path: the inner payload is
//! forwarded as opaque bytes whether it is another layer or the plaintext
//! for the final recipient. Any failure before forwarding means no forward
//! happens at all.

use std::future::Future;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use veil_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use veil_types::NodeId;

use crate::address::NodeAddress;
use crate::layer::{self, OpenedLayer, WrappedMessage};
use crate::Result;

/// Delivers a payload to the next hop.
///
/// Implementations return [`OnionError::ForwardFailed`](crate::OnionError::ForwardFailed)
/// when the hop is unreachable or rejects the payload. The call completes
/// only once the next hop has answered.
pub trait Forwarder: Send + Sync {
    fn forward(
        &self,
        next_hop: NodeAddress,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// What a relay saw of the last message it handled. Diagnostic only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HopRecord {
    /// The message as received.
    pub encrypted: Option<Vec<u8>>,
    /// The inner payload, if the layer opened.
    pub decrypted: Option<Vec<u8>>,
    /// The relay that handled it (always this relay).
    pub source: Option<NodeId>,
    /// The parsed next hop, if the layer opened.
    pub destination: Option<NodeAddress>,
}

/// Unwraps one layer per message and forwards the rest.
pub struct RelayProcessor {
    node_id: NodeId,
    secret: X25519StaticSecret,
    last: RwLock<HopRecord>,
}

impl RelayProcessor {
    pub fn new(node_id: NodeId, secret: X25519StaticSecret) -> Self {
        Self {
            node_id,
            secret,
            last: RwLock::new(HopRecord::default()),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// The key senders wrap this relay's layers to.
    pub fn public_key(&self) -> X25519PublicKey {
        self.secret.public_key()
    }

    /// Raw private key bytes, for the diagnostics endpoint.
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Open the outermost layer without forwarding anything.
    pub fn unwrap_layer(&self, message: &WrappedMessage) -> Result<OpenedLayer> {
        layer::open_layer(&self.secret, message)
    }

    /// Unwrap one layer of `message` and forward the remainder.
    ///
    /// Returns the next-hop address after the forward call has completed.
    pub async fn process<F: Forwarder>(
        &self,
        message: WrappedMessage,
        forwarder: &F,
    ) -> Result<NodeAddress> {
        let unwrapped = self.unwrap_layer(&message);

        {
            let mut last = self.last.write().await;
            *last = HopRecord {
                encrypted: Some(message.into_bytes()),
                decrypted: unwrapped.as_ref().ok().map(|l| l.inner.clone()),
                source: Some(self.node_id),
                destination: unwrapped.as_ref().ok().map(|l| l.next_hop),
            };
        }

        let OpenedLayer { next_hop, inner } = match unwrapped {
            Ok(opened) => opened,
            Err(e) => {
                warn!(node_id = self.node_id, error = %e, "Dropping message");
                return Err(e);
            }
        };

        debug!(
            node_id = self.node_id,
            next_hop = %next_hop,
            size = inner.len(),
            "Forwarding layer"
        );

        forwarder.forward(next_hop, inner).await?;
        Ok(next_hop)
    }

    /// Snapshot of the last message this relay handled.
    pub async fn last_message(&self) -> HopRecord {
        self.last.read().await.clone()
    }
}
