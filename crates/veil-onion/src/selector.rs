//! Circuit selection from a registry snapshot.
//!
//! ## Policy
//!
//! Draw one relay uniformly at random from the whole snapshot, keep it only
//! if its id is not already in the circuit, and repeat until the circuit is
//! full. There is no cap on draws: with at least `hops` distinct relays the
//! loop terminates almost surely, in expected O(hops) draws when the
//! snapshot is much larger than the circuit.

use std::collections::HashSet;

use rand::Rng;
use tracing::debug;
use veil_types::{NodeRegistry, RelayIdentity};

use crate::circuit::Circuit;
use crate::{OnionError, Result, CIRCUIT_HOPS};

/// The relays known to the registry at one point in time, in registration
/// order.
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot {
    relays: Vec<RelayIdentity>,
}

impl RegistrySnapshot {
    /// Create a snapshot from identities in registration order.
    pub fn from_identities(relays: Vec<RelayIdentity>) -> Self {
        Self { relays }
    }

    /// Return all relays.
    pub fn all(&self) -> &[RelayIdentity] {
        &self.relays
    }

    /// Return the number of entries.
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Return whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Number of distinct relay ids.
    pub fn distinct_count(&self) -> usize {
        self.relays
            .iter()
            .map(|r| r.node_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

impl From<NodeRegistry> for RegistrySnapshot {
    fn from(registry: NodeRegistry) -> Self {
        Self::from_identities(registry.nodes)
    }
}

/// Picks fresh circuits of a fixed length.
#[derive(Clone, Debug)]
pub struct CircuitSelector {
    hops: usize,
}

impl CircuitSelector {
    /// A selector producing circuits of `hops` relays.
    pub fn new(hops: usize) -> Self {
        Self { hops }
    }

    /// Select a circuit using the thread-local RNG.
    pub fn select(&self, snapshot: &RegistrySnapshot) -> Result<Circuit> {
        self.select_with_rng(snapshot, &mut rand::thread_rng())
    }

    /// Select a circuit by rejection sampling with the given RNG.
    ///
    /// Returned relays are in acceptance order, which is the path order.
    pub fn select_with_rng<R: Rng + ?Sized>(
        &self,
        snapshot: &RegistrySnapshot,
        rng: &mut R,
    ) -> Result<Circuit> {
        let available = snapshot.all();

        if available.len() < self.hops {
            return Err(OnionError::InsufficientRelays {
                need: self.hops,
                have: available.len(),
            });
        }

        // Duplicate registrations could otherwise make the loop below spin
        // forever.
        let distinct = snapshot.distinct_count();
        if distinct < self.hops {
            return Err(OnionError::InsufficientRelays {
                need: self.hops,
                have: distinct,
            });
        }

        let mut selected: Vec<RelayIdentity> = Vec::with_capacity(self.hops);
        let mut seen: HashSet<u32> = HashSet::with_capacity(self.hops);
        let mut draws: usize = 0;

        while selected.len() < self.hops {
            let candidate = &available[rng.gen_range(0..available.len())];
            draws += 1;
            if seen.insert(candidate.node_id) {
                selected.push(candidate.clone());
            }
        }

        debug!(
            hops = self.hops,
            draws,
            snapshot = available.len(),
            "Selected circuit"
        );

        Circuit::new(selected)
    }
}

impl Default for CircuitSelector {
    fn default() -> Self {
        Self::new(CIRCUIT_HOPS)
    }
}
