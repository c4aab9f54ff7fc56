//! # veil-crypto
//!
//! Cryptographic primitives for the Veil onion overlay.
//!
//! The suite is fixed; every relay and every sender must agree on it because
//! the size of a wrapped layer key depends on it.
//!
//! ## Modules
//!
//! - [`blake3`] - Domain-separated BLAKE3 key derivation
//! - [`x25519`] - X25519 key agreement (RFC 7748)
//! - [`chacha20`] - ChaCha20-Poly1305 AEAD (RFC 8439) and per-layer symmetric keys
//! - [`ecies`] - ECIES-X25519-ChaCha20-BLAKE3, used to wrap layer keys

pub mod blake3;
pub mod chacha20;
pub mod ecies;
pub mod x25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AEAD decryption failed (authentication tag mismatch).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    AeadEncryption,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// ECIES encryption/decryption failed.
    #[error("ECIES error: {0}")]
    Ecies(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
