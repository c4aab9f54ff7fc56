//! Request bodies carried by the transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{TypesError, UserId};

/// Body of `message`: one opaque payload, base64-encoded.
///
/// Relays and users receive the same shape; neither can tell from the
/// envelope whether the payload is another layer or final plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    /// Wrap raw payload bytes.
    pub fn from_bytes(payload: &[u8]) -> Self {
        Self {
            message: STANDARD.encode(payload),
        }
    }

    /// Recover the raw payload bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        STANDARD
            .decode(&self.message)
            .map_err(|e| TypesError::Base64 {
                field: "message",
                reason: e.to_string(),
            })
    }
}

/// Body of `send_message` on a user node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageBody {
    pub message: String,
    pub destination_user_id: UserId,
}

/// Generic single-value diagnostic response, `{"result": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBody<T> {
    pub result: T,
}
