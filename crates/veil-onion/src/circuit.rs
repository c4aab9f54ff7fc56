//! Circuits: the ordered relay path for one message.
//!
//! Position 0 is the entry relay and carries the outermost layer; the last
//! position carries the innermost layer, adjacent to the destination. A
//! circuit is built for one message and dropped afterwards.

use std::collections::HashSet;

use veil_types::{NodeId, RelayIdentity};

use crate::{OnionError, Result};

/// An ordered path of distinct relays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circuit {
    relays: Vec<RelayIdentity>,
}

impl Circuit {
    /// Create a circuit from relays in path order.
    ///
    /// Fails on an empty path or when a relay id repeats.
    pub fn new(relays: Vec<RelayIdentity>) -> Result<Self> {
        if relays.is_empty() {
            return Err(OnionError::EmptyCircuit);
        }
        let mut seen = HashSet::with_capacity(relays.len());
        for relay in &relays {
            if !seen.insert(relay.node_id) {
                return Err(OnionError::DuplicateRelay(relay.node_id));
            }
        }
        Ok(Self { relays })
    }

    /// The relays in path order.
    pub fn relays(&self) -> &[RelayIdentity] {
        &self.relays
    }

    /// Number of hops (and of layers the sender applies).
    pub fn hop_count(&self) -> usize {
        self.relays.len()
    }

    /// The entry relay, which receives the fully wrapped message.
    pub fn entry(&self) -> &RelayIdentity {
        &self.relays[0]
    }

    /// The last relay, which hands the plaintext to the destination.
    pub fn exit(&self) -> &RelayIdentity {
        &self.relays[self.relays.len() - 1]
    }

    /// Relay ids in path order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.relays.iter().map(|r| r.node_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(node_id: NodeId) -> RelayIdentity {
        RelayIdentity::from_key_bytes(node_id, &[node_id as u8; 32])
    }

    #[test]
    fn test_circuit_order() {
        let circuit = Circuit::new(vec![relay(2), relay(1), relay(3)]).expect("circuit");
        assert_eq!(circuit.hop_count(), 3);
        assert_eq!(circuit.entry().node_id, 2);
        assert_eq!(circuit.exit().node_id, 3);
        assert_eq!(circuit.node_ids(), vec![2, 1, 3]);
    }

    #[test]
    fn test_rejects_duplicates() {
        let result = Circuit::new(vec![relay(1), relay(2), relay(1)]);
        assert!(matches!(result, Err(OnionError::DuplicateRelay(1))));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(Circuit::new(vec![]), Err(OnionError::EmptyCircuit)));
    }
}
