//! ECIES-X25519-ChaCha20-BLAKE3 wrapping of layer keys.
//!
//! A sender wraps each layer's [`SymmetricKey`] to the public key of the
//! relay that layer is built for. Only that relay's static secret recovers
//! it.
//!
//! ```text
//! wrap(relay_pk, layer_key):
//!   eph_sk, eph_pk = fresh X25519 key pair
//!   ikm   = X25519(eph_sk, relay_pk) || eph_pk || relay_pk
//!   key   = BLAKE3-derive("Veil v1 layer-key-wrap", ikm)
//!   nonce = BLAKE3-derive("Veil v1 layer-key-nonce", ikm)[..12]
//!   out   = eph_pk || ChaCha20-Poly1305(key, nonce, layer_key, aad = eph_pk)
//! ```
//!
//! The output length is fixed at [`WRAPPED_KEY_SIZE`] bytes.

use crate::blake3::{self, contexts};
use crate::chacha20::{self, SymmetricKey};
use crate::x25519::{self, X25519PublicKey, X25519StaticSecret};
use crate::{CryptoError, Result};

/// Size of the ephemeral public key at the front of a wrapped key.
pub const EPH_PK_SIZE: usize = x25519::KEY_SIZE;

/// Bytes wrapping adds on top of the key itself.
pub const OVERHEAD: usize = EPH_PK_SIZE + chacha20::TAG_SIZE;

/// Ciphertext length for a plaintext of `plaintext_len` bytes.
pub const fn ciphertext_len(plaintext_len: usize) -> usize {
    plaintext_len + OVERHEAD
}

/// Length of a wrapped [`SymmetricKey`].
pub const WRAPPED_KEY_SIZE: usize = ciphertext_len(chacha20::KEY_SIZE);

/// A layer key sealed to one relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedKey([u8; WRAPPED_KEY_SIZE]);

impl WrappedKey {
    /// Parse exactly [`WRAPPED_KEY_SIZE`] bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes = data.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: WRAPPED_KEY_SIZE,
            actual: data.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; WRAPPED_KEY_SIZE] {
        &self.0
    }

    fn ephemeral_pk(&self) -> [u8; EPH_PK_SIZE] {
        let mut pk = [0u8; EPH_PK_SIZE];
        pk.copy_from_slice(&self.0[..EPH_PK_SIZE]);
        pk
    }
}

/// AEAD key and nonce shared by wrapper and unwrapper.
struct WrapKeys {
    key: [u8; chacha20::KEY_SIZE],
    nonce: [u8; chacha20::NONCE_SIZE],
}

impl WrapKeys {
    fn derive(
        dh: &[u8; x25519::KEY_SIZE],
        eph_pk: &[u8; EPH_PK_SIZE],
        relay_pk: &X25519PublicKey,
    ) -> Self {
        let mut ikm = [0u8; 3 * x25519::KEY_SIZE];
        ikm[..32].copy_from_slice(dh);
        ikm[32..64].copy_from_slice(eph_pk);
        ikm[64..].copy_from_slice(relay_pk.as_bytes());

        let key = blake3::derive_key(contexts::LAYER_KEY_WRAP, &ikm);
        let nonce_seed = blake3::derive_key(contexts::LAYER_KEY_NONCE, &ikm);
        let mut nonce = [0u8; chacha20::NONCE_SIZE];
        nonce.copy_from_slice(&nonce_seed[..chacha20::NONCE_SIZE]);

        Self { key, nonce }
    }
}

/// Wrap `layer_key` to `relay_pk` under a fresh ephemeral key.
pub fn wrap_key(relay_pk: &X25519PublicKey, layer_key: &SymmetricKey) -> Result<WrappedKey> {
    wrap_key_with_ephemeral(relay_pk, layer_key, &X25519StaticSecret::random())
}

/// Wrap with a caller-chosen ephemeral secret. Reusing one leaks nothing
/// about the key but links the outputs; only tests should call this.
pub fn wrap_key_with_ephemeral(
    relay_pk: &X25519PublicKey,
    layer_key: &SymmetricKey,
    ephemeral: &X25519StaticSecret,
) -> Result<WrappedKey> {
    let eph_pk = ephemeral.public_key().to_bytes();
    let dh = ephemeral.diffie_hellman(relay_pk);
    let keys = WrapKeys::derive(dh.as_bytes(), &eph_pk, relay_pk);

    let sealed = chacha20::encrypt(&keys.key, &keys.nonce, layer_key.as_bytes(), &eph_pk)?;

    let mut out = [0u8; WRAPPED_KEY_SIZE];
    out[..EPH_PK_SIZE].copy_from_slice(&eph_pk);
    out[EPH_PK_SIZE..].copy_from_slice(&sealed);
    Ok(WrappedKey(out))
}

/// Recover a layer key with the relay's static secret.
pub fn unwrap_key(relay_sk: &X25519StaticSecret, wrapped: &WrappedKey) -> Result<SymmetricKey> {
    let eph_pk = wrapped.ephemeral_pk();
    let dh = relay_sk.diffie_hellman(&X25519PublicKey::from_bytes(eph_pk));
    let keys = WrapKeys::derive(dh.as_bytes(), &eph_pk, &relay_sk.public_key());

    let key_bytes = chacha20::decrypt(&keys.key, &keys.nonce, &wrapped.0[EPH_PK_SIZE..], &eph_pk)
        .map_err(|_| CryptoError::Ecies("layer key is not wrapped to this relay".into()))?;
    SymmetricKey::from_slice(&key_bytes)
}
