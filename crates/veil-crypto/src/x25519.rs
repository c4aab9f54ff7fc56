//! X25519 key agreement (RFC 7748).
//!
//! Every relay holds one long-lived [`X25519StaticSecret`]. Its public half
//! is what the registry publishes and what senders wrap layer keys to.
//! Senders also use a throwaway static secret as the ephemeral key of each
//! wrap.

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// Size of an X25519 public key, secret key, or shared secret.
pub const KEY_SIZE: usize = 32;

/// A relay's long-lived secret.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct X25519StaticSecret(StaticSecret);

/// The public half of an [`X25519StaticSecret`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey([u8; KEY_SIZE]);

/// Output of [`X25519StaticSecret::diffie_hellman`]. Wiped on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret([u8; KEY_SIZE]);

impl X25519StaticSecret {
    pub fn random() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    /// Restore a secret from its raw (unclamped) bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(PublicKey::from(&self.0).to_bytes())
    }

    pub fn diffie_hellman(&self, peer: &X25519PublicKey) -> SharedSecret {
        let shared = self.0.diffie_hellman(&PublicKey::from(peer.0));
        SharedSecret(shared.to_bytes())
    }
}

impl X25519PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key published in text form, rejecting anything but 32 bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes = data.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: data.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}
