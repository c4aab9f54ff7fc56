//! ChaCha20-Poly1305 AEAD encryption (RFC 8439).
//!
//! Layer bodies are sealed with a fresh [`SymmetricKey`] and a random nonce
//! that travels in front of the ciphertext:
//!
//! ```text
//! sealed = nonce (12) || ciphertext || tag (16)
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// Bytes [`seal`] adds on top of the plaintext.
pub const SEALED_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// A single-use symmetric key for one onion layer.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Restore a key from its serialized form.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = data.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: data.len(),
        })?;
        Ok(Self { bytes })
    }

    /// The serialized form (raw 32 bytes).
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

/// Encrypt data with ChaCha20-Poly1305.
///
/// Returns the ciphertext with the 16-byte tag appended. The nonce must never
/// be reused with the same key.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadEncryption)
}

/// Decrypt data with ChaCha20-Poly1305.
///
/// Fails if the tag does not authenticate `ciphertext` and `aad`.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecryption)
}

/// Seal `plaintext` under `key` with a random nonce: `nonce || ciphertext || tag`.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = encrypt(key.as_bytes(), &nonce, plaintext, &[])?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a value produced by [`seal`].
pub fn open(key: &SymmetricKey, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < SEALED_OVERHEAD {
        return Err(CryptoError::InvalidInput(format!(
            "sealed data too short: {} bytes, need at least {SEALED_OVERHEAD}",
            sealed.len()
        )));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(nonce_bytes);
    decrypt(key.as_bytes(), &nonce, ciphertext, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let plaintext = b"Hello, Veil!";
        let aad = b"associated data";

        let ciphertext = encrypt(&key, &nonce, plaintext, aad).expect("encrypt");
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);
        let decrypted = decrypt(&key, &nonce, &ciphertext, aad).expect("decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_aad_fails() {
        let key = [0x01u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];

        let ciphertext = encrypt(&key, &nonce, b"test", b"aad1").expect("encrypt");
        assert!(decrypt(&key, &nonce, &ciphertext, b"aad2").is_err());
    }

    #[test]
    fn test_seal_layout() {
        let key = SymmetricKey::random();
        let sealed = seal(&key, b"layer body").expect("seal");
        assert_eq!(sealed.len(), b"layer body".len() + SEALED_OVERHEAD);
        assert_eq!(open(&key, &sealed).expect("open"), b"layer body");
    }

    #[test]
    fn test_seal_uses_fresh_nonce() {
        let key = SymmetricKey::random();
        let a = seal(&key, b"same").expect("seal");
        let b = seal(&key, b"same").expect("seal");
        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let sealed = seal(&SymmetricKey::random(), b"test").expect("seal");
        assert!(matches!(
            open(&SymmetricKey::random(), &sealed),
            Err(CryptoError::AeadDecryption)
        ));
    }

    #[test]
    fn test_open_tampered_fails() {
        let key = SymmetricKey::random();
        let mut sealed = seal(&key, b"test").expect("seal");
        if let Some(byte) = sealed.last_mut() {
            *byte ^= 0xFF;
        }
        assert!(open(&key, &sealed).is_err());
    }

    #[test]
    fn test_open_too_short() {
        let key = SymmetricKey::random();
        assert!(matches!(
            open(&key, &[0u8; SEALED_OVERHEAD - 1]),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_symmetric_key_from_slice() {
        let key = SymmetricKey::random();
        let restored = SymmetricKey::from_slice(key.as_bytes()).expect("restore");
        assert_eq!(key.as_bytes(), restored.as_bytes());
        assert!(SymmetricKey::from_slice(&[0u8; 16]).is_err());
    }
}
