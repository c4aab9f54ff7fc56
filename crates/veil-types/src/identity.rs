//! Relay identities as published by the registry.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{NodeId, TypesError};

/// A registered relay: its id and its X25519 public key.
///
/// `pub_key` is the standard base64 encoding of the raw 32-byte key. It is
/// kept in text form because that is what the registry stores and serves;
/// decoding happens where the key is used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayIdentity {
    pub node_id: NodeId,
    pub pub_key: String,
}

impl RelayIdentity {
    /// Build an identity from raw public key bytes.
    pub fn from_key_bytes(node_id: NodeId, key: &[u8]) -> Self {
        Self {
            node_id,
            pub_key: STANDARD.encode(key),
        }
    }

    /// Decode `pub_key` back to raw bytes.
    pub fn key_bytes(&self) -> Result<Vec<u8>, TypesError> {
        STANDARD
            .decode(&self.pub_key)
            .map_err(|e| TypesError::Base64 {
                field: "pub_key",
                reason: e.to_string(),
            })
    }
}

/// Body of `get_node_registry`: every registered relay, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistry {
    pub nodes: Vec<RelayIdentity>,
}
