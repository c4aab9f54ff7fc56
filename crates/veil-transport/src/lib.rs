//! # veil-transport
//!
//! Request/response transport between Veil nodes.
//!
//! Every node (registry, onion router, user) serves a TCP listener speaking
//! line-delimited JSON-RPC 2.0:
//!
//! - [`rpc`] - Request, response and error objects
//! - [`server`] - Accept loop dispatching to an [`RpcHandler`]
//! - [`client`] - One-shot calls with a timeout
//!
//! ```text
//! client                          server
//!   | {"jsonrpc":"2.0","id":7,...}\n |
//!   | -----------------------------> |  RpcHandler::handle
//!   | {"jsonrpc":"2.0","id":7,...}\n |
//!   | <----------------------------- |
//! ```

pub mod client;
pub mod rpc;
pub mod server;

pub use client::RpcClient;
pub use rpc::{RpcError, RpcRequest, RpcResponse};
pub use server::{RpcHandler, RpcServer};

/// Error types for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// I/O error (socket, stream read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer could not be reached or closed the connection early.
    #[error("connection error: {0}")]
    Connection(String),

    /// The peer did not answer within the configured timeout.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The peer answered with a JSON-RPC error.
    #[error("remote error {code}: {message}")]
    Remote { code: i32, message: String },

    /// Internal error (should not occur in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenience result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
