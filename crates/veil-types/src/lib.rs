//! # veil-types
//!
//! Shared types exchanged between the registry, onion routers and users.

pub mod identity;
pub mod layout;
pub mod messages;

pub use identity::{NodeRegistry, RelayIdentity};
pub use layout::PortLayout;

/// Relay node identifier (unique, stable, assigned at launch).
pub type NodeId = u32;

/// User identifier.
pub type UserId = u32;

/// Errors decoding shared wire types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// A base64 field failed to decode.
    #[error("invalid base64 in {field}: {reason}")]
    Base64 { field: &'static str, reason: String },
}
