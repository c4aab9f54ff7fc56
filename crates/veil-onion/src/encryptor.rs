//! Sender-side onion construction.
//!
//! Layers are built from the innermost relay outwards. Each layer must carry
//! the address of the hop after it, and walking backwards from the
//! destination is the only order in which every such address is already
//! known when its layer is sealed:
//!
//! ```text
//! current = (destination, plaintext)
//! for relay in circuit.reverse():
//!     current = (address_of(relay), seal_layer(relay.pk, current.address, current.payload))
//! send current.payload to circuit[0]
//! ```

use tracing::debug;
use veil_crypto::x25519::X25519PublicKey;
use veil_types::{NodeId, PortLayout, RelayIdentity};

use crate::address::NodeAddress;
use crate::circuit::Circuit;
use crate::layer::{self, WrappedMessage};
use crate::{OnionError, Result};

/// A fully wrapped message, ready for its entry relay.
#[derive(Clone, Debug)]
pub struct WrappedOnion {
    /// The outermost layer.
    pub message: WrappedMessage,
    /// Address of the entry relay (`circuit[0]`).
    pub entry: NodeAddress,
    /// Relay ids in the order their layers were applied, innermost first.
    pub layer_order: Vec<NodeId>,
}

/// Builds onions for circuits whose relays live at `layout` addresses.
#[derive(Clone, Debug, Default)]
pub struct OnionEncryptor {
    layout: PortLayout,
}

impl OnionEncryptor {
    pub fn new(layout: PortLayout) -> Self {
        Self { layout }
    }

    /// Network address of a relay.
    pub fn address_of(&self, relay: &RelayIdentity) -> Result<NodeAddress> {
        NodeAddress::new(self.layout.router_address(relay.node_id))
    }

    /// Wrap `plaintext` for delivery to `destination` through `circuit`.
    ///
    /// Fails before producing any output if a relay key is malformed, so a
    /// partially built onion never leaves the sender.
    pub fn wrap(
        &self,
        plaintext: &[u8],
        destination: NodeAddress,
        circuit: &Circuit,
    ) -> Result<WrappedOnion> {
        let mut current_address = destination;
        let mut current_payload = plaintext.to_vec();
        let mut layer_order = Vec::with_capacity(circuit.hop_count());

        for relay in circuit.relays().iter().rev() {
            let relay_pk = relay_public_key(relay)?;
            let wrapped = layer::seal_layer(&relay_pk, current_address, &current_payload)?;

            current_payload = wrapped.into_bytes();
            current_address = self.address_of(relay)?;
            layer_order.push(relay.node_id);
        }

        debug!(
            layers = layer_order.len(),
            entry_relay = circuit.entry().node_id,
            exit_relay = circuit.exit().node_id,
            entry = %current_address,
            size = current_payload.len(),
            "Wrapped onion"
        );

        Ok(WrappedOnion {
            message: WrappedMessage::from_bytes(current_payload),
            entry: current_address,
            layer_order,
        })
    }
}

/// Decode the X25519 key a relay published to the registry.
pub fn relay_public_key(relay: &RelayIdentity) -> Result<X25519PublicKey> {
    let bytes = relay
        .key_bytes()
        .map_err(|e| OnionError::KeyFormat(format!("relay {}: {e}", relay.node_id)))?;
    X25519PublicKey::from_slice(&bytes)
        .map_err(|e| OnionError::KeyFormat(format!("relay {}: {e}", relay.node_id)))
}
