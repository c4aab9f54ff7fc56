//! Domain-separated BLAKE3 key derivation.
//!
//! Every derived key in Veil goes through [`derive_key`] with one of the
//! registered [`contexts`].

/// Registered BLAKE3 context strings.
pub mod contexts {
    /// AEAD key protecting a wrapped layer key.
    pub const LAYER_KEY_WRAP: &str = "Veil v1 layer-key-wrap";
    /// Nonce seed for the same AEAD.
    pub const LAYER_KEY_NONCE: &str = "Veil v1 layer-key-nonce";

    pub const ALL_CONTEXTS: &[&str] = &[LAYER_KEY_WRAP, LAYER_KEY_NONCE];
}

/// Derive 32 bytes from `key_material` in BLAKE3's KDF mode.
///
/// `context` must be one of [`contexts::ALL_CONTEXTS`].
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    debug_assert!(is_registered_context(context), "unregistered context {context}");
    ::blake3::derive_key(context, key_material)
}

pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_versioned() {
        for ctx in contexts::ALL_CONTEXTS {
            assert!(ctx.starts_with("Veil v1 "), "{ctx}");
        }
    }

    #[test]
    fn test_contexts_separate_outputs() {
        let ikm = [0x42u8; 96];
        assert_eq!(
            derive_key(contexts::LAYER_KEY_WRAP, &ikm),
            derive_key(contexts::LAYER_KEY_WRAP, &ikm)
        );
        assert_ne!(
            derive_key(contexts::LAYER_KEY_WRAP, &ikm),
            derive_key(contexts::LAYER_KEY_NONCE, &ikm)
        );
    }

    #[test]
    fn test_unregistered_context() {
        assert!(is_registered_context("Veil v1 layer-key-nonce"));
        assert!(!is_registered_context("Veil v1 made-up"));
    }
}
