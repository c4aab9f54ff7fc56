//! # veil-node
//!
//! The three services of a Veil overlay, built on [`veil_onion`] and served
//! over [`veil_transport`]:
//!
//! - [`registry`] - Directory of relay identities
//! - [`router`] - An onion router wrapping a [`RelayProcessor`](veil_onion::RelayProcessor)
//! - [`user`] - Sender and final recipient of messages
//! - [`network`] - Launches a complete local overlay
//!
//! ## Startup Order
//!
//! ```text
//! registry --> routers (each registers itself) --> users
//! ```

pub mod config;
pub mod forward;
pub mod network;
pub mod registry;
pub mod router;
pub mod user;

use serde::Serialize;
use serde_json::Value;
use veil_onion::OnionError;
use veil_transport::rpc::{self, RpcError};
use veil_transport::TransportError;
use veil_types::messages::ResultBody;
use veil_types::TypesError;

pub use config::NetworkConfig;
pub use network::{launch_network, NetworkHandle};

/// Error types for node operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Onion protocol failure.
    #[error(transparent)]
    Onion(#[from] OnionError),

    /// Talking to another node failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request or response body did not have the expected shape.
    #[error("invalid payload: {0}")]
    Payload(String),
}

impl From<TypesError> for NodeError {
    fn from(e: TypesError) -> Self {
        Self::Payload(e.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}

/// Convenience result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;

/// JSON-RPC error reported to the caller for an onion failure.
pub fn onion_rpc_error(e: &OnionError) -> RpcError {
    let detail = e.to_string();
    let (code, name) = match e {
        OnionError::InsufficientRelays { .. } => (rpc::INSUFFICIENT_RELAYS, "INSUFFICIENT_RELAYS"),
        OnionError::KeyFormat(_) => (rpc::KEY_FORMAT, "KEY_FORMAT"),
        OnionError::Decryption(_) => (rpc::DECRYPTION_FAILED, "DECRYPTION_FAILED"),
        OnionError::MalformedMessage(_) => (rpc::MALFORMED_MESSAGE, "MALFORMED_MESSAGE"),
        OnionError::InvalidAddress(_) => (rpc::INVALID_ADDRESS, "INVALID_ADDRESS"),
        OnionError::ForwardFailed(_) => (rpc::FORWARD_FAILED, "FORWARD_FAILED"),
        OnionError::DuplicateRelay(_) | OnionError::EmptyCircuit | OnionError::Encryption(_) => {
            return RpcError::internal_error(&detail);
        }
    };
    RpcError::new(code, name, Some(&detail))
}

impl From<&NodeError> for RpcError {
    fn from(e: &NodeError) -> Self {
        match e {
            NodeError::Onion(inner) => onion_rpc_error(inner),
            NodeError::Transport(inner) => RpcError::internal_error(&inner.to_string()),
            NodeError::Payload(detail) => RpcError::invalid_params(detail),
        }
    }
}

/// Parse RPC params into a request body.
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(
    params: Value,
) -> std::result::Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Serialize an RPC result.
pub(crate) fn to_result<T: Serialize>(value: &T) -> std::result::Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Wrap a diagnostic value as `{"result": ...}`.
pub(crate) fn diagnostic<T: Serialize>(result: T) -> std::result::Result<Value, RpcError> {
    to_result(&ResultBody { result })
}

/// `{"result": "success"}`, the acknowledgement every mutating call returns.
pub(crate) fn success() -> Value {
    serde_json::json!({ "result": "success" })
}
