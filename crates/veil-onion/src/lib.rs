//! # veil-onion
//!
//! The onion circuit protocol:
//!
//! - [`selector`] - Registry snapshots and random circuit selection
//! - [`circuit`] - The ordered, duplicate-free relay path for one message
//! - [`address`] - Next-hop addresses and their fixed-width prefix encoding
//! - [`layer`] - Wire layout of one layer and the seal/open helpers
//! - [`encryptor`] - Sender-side construction of the full onion
//! - [`relay`] - Per-hop decrypt-and-forward processing
//!
//! ## Wire Layout
//!
//! | Field | Size |
//! |---|---|
//! | wrapped key (ECIES of the layer key) | 80 bytes |
//! | body nonce | 12 bytes |
//! | body ciphertext (`prefix ‖ inner`) | 10 + inner bytes |
//! | body tag | 16 bytes |

pub mod address;
pub mod circuit;
pub mod encryptor;
pub mod layer;
pub mod relay;
pub mod selector;

pub use address::NodeAddress;
pub use circuit::Circuit;
pub use encryptor::{OnionEncryptor, WrappedOnion};
pub use layer::WrappedMessage;
pub use relay::{Forwarder, HopRecord, RelayProcessor};
pub use selector::{CircuitSelector, RegistrySnapshot};

/// Number of relays in a circuit.
pub const CIRCUIT_HOPS: usize = 3;

/// Error types for onion routing operations.
#[derive(Debug, thiserror::Error)]
pub enum OnionError {
    /// Not enough distinct relays available to construct a circuit.
    #[error("insufficient relays: need {need}, have {have}")]
    InsufficientRelays { need: usize, have: usize },

    /// The same relay appears twice in a circuit.
    #[error("relay {0} appears more than once in the circuit")]
    DuplicateRelay(u32),

    /// A circuit with no relays.
    #[error("circuit has no relays")]
    EmptyCircuit,

    /// A relay public key could not be decoded.
    #[error("malformed relay key: {0}")]
    KeyFormat(String),

    /// Building a layer failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The layer key or body did not open under this relay's key.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The message violates the layer wire layout.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The next-hop prefix is not a valid address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The next hop could not be reached or rejected the payload.
    #[error("forward failed: {0}")]
    ForwardFailed(String),
}

/// Convenience result type for onion routing operations.
pub type Result<T> = std::result::Result<T, OnionError>;
