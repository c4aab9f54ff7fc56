//! Wire layout of a single onion layer.
//!
//! ```text
//! WrappedMessage = wrapped_key (WRAPPED_KEY_LEN) || body
//! wrapped_key    = ECIES(relay_pk, layer_key)
//! body           = nonce || ChaCha20-Poly1305(layer_key, next_hop_prefix || inner) || tag
//! ```
//!
//! `inner` is opaque: another `WrappedMessage` or, for the innermost layer,
//! the plaintext. Nothing here distinguishes the two.

use veil_crypto::chacha20::{self, SymmetricKey};
use veil_crypto::ecies::{self, WrappedKey};
use veil_crypto::x25519::{X25519PublicKey, X25519StaticSecret};

use crate::address::{NodeAddress, ADDRESS_PREFIX_LEN};
use crate::{OnionError, Result};

/// Length of the wrapped layer key at the front of every message.
///
/// All relays and every sender must agree on it; it follows from wrapping a
/// ChaCha20 key with ECIES-X25519.
pub const WRAPPED_KEY_LEN: usize = ecies::WRAPPED_KEY_SIZE;

/// One serialized layer as carried by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedMessage(Vec<u8>);

impl WrappedMessage {
    /// Wrap received bytes. No validation happens until [`split`](Self::split).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into `(wrapped_key, body)` at [`WRAPPED_KEY_LEN`].
    pub fn split(&self) -> Result<(&[u8], &[u8])> {
        if self.0.len() < WRAPPED_KEY_LEN {
            return Err(OnionError::MalformedMessage(format!(
                "{} bytes is shorter than the {WRAPPED_KEY_LEN}-byte wrapped key",
                self.0.len()
            )));
        }
        Ok(self.0.split_at(WRAPPED_KEY_LEN))
    }
}

/// One layer after it has been opened by its relay.
#[derive(Debug, PartialEq, Eq)]
pub struct OpenedLayer {
    /// Where the inner payload goes next.
    pub next_hop: NodeAddress,
    /// Opaque remainder, forwarded unchanged.
    pub inner: Vec<u8>,
}

/// Build one layer for the relay owning `relay_pk`.
///
/// A fresh layer key is generated on every call.
pub fn seal_layer(
    relay_pk: &X25519PublicKey,
    next_hop: NodeAddress,
    inner: &[u8],
) -> Result<WrappedMessage> {
    let layer_key = SymmetricKey::random();

    let mut plaintext = Vec::with_capacity(ADDRESS_PREFIX_LEN + inner.len());
    plaintext.extend_from_slice(&next_hop.to_prefix());
    plaintext.extend_from_slice(inner);

    let body = chacha20::seal(&layer_key, &plaintext)
        .map_err(|e| OnionError::Encryption(e.to_string()))?;
    let wrapped_key = ecies::wrap_key(relay_pk, &layer_key)
        .map_err(|e| OnionError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(WRAPPED_KEY_LEN + body.len());
    out.extend_from_slice(wrapped_key.as_bytes());
    out.extend_from_slice(&body);
    Ok(WrappedMessage(out))
}

/// Open the outermost layer of `message` with `secret`.
pub fn open_layer(secret: &X25519StaticSecret, message: &WrappedMessage) -> Result<OpenedLayer> {
    let (wrapped_key, body) = message.split()?;

    let wrapped_key = WrappedKey::from_slice(wrapped_key)
        .map_err(|e| OnionError::MalformedMessage(e.to_string()))?;
    let layer_key =
        ecies::unwrap_key(secret, &wrapped_key).map_err(|e| OnionError::Decryption(e.to_string()))?;

    let mut plaintext =
        chacha20::open(&layer_key, body).map_err(|e| OnionError::Decryption(e.to_string()))?;

    let next_hop = NodeAddress::from_prefix(&plaintext)?;
    let inner = plaintext.split_off(ADDRESS_PREFIX_LEN);

    Ok(OpenedLayer { next_hop, inner })
}
