//! Relay message payloads.
//!
//! The downstream consumer (a game-server integration) expects JSON of the
//! shape `{"type": <integer channel code>, "data": <channel-specific payload>}`.
//! That schema is owned externally; this module only guarantees syntactically
//! valid JSON and offers constructors for the channel codes the consumer is
//! known to understand.

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Channel code for a remote console command (`data` is the command string).
pub const CHANNEL_RCON: u8 = 0;

/// Channel code for an in-game chat line (`data` carries cid/team/message).
pub const CHANNEL_CHAT: u8 = 1;

/// Channel code asking the server to resend the map (`data` is unused).
pub const CHANNEL_RESEND_MAP: u8 = 2;

/// A message in the downstream consumer's envelope format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Integer channel code interpreted by the consumer.
    #[serde(rename = "type")]
    pub channel: u8,
    /// Channel-specific payload, passed through opaquely.
    pub data: Value,
}

impl RelayMessage {
    /// Build a remote console command message.
    pub fn rcon(command: &str) -> Self {
        Self {
            channel: CHANNEL_RCON,
            data: Value::String(command.to_string()),
        }
    }

    /// Build an in-game chat message.
    ///
    /// `cid` -1 addresses all clients; `team` -2 is the consumer's code for
    /// a server-wide chat line.
    pub fn chat(cid: i64, team: i64, text: &str) -> Self {
        Self {
            channel: CHANNEL_CHAT,
            data: json!({ "cid": cid, "team": team, "message": text }),
        }
    }

    /// Build a resend-map request.
    pub fn resend_map() -> Self {
        Self {
            channel: CHANNEL_RESEND_MAP,
            data: Value::Null,
        }
    }

    /// Serialize the message to its JSON wire form.
    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The payload published when the user supplies none: an rcon broadcast.
pub fn default_payload() -> Result<String, RelayError> {
    RelayMessage::rcon("broadcast Hello, World!").to_json()
}

/// Check that a user-supplied payload is a well-formed JSON object.
///
/// The schema itself is not enforced here; the consumer owns it.
///
/// # Errors
///
/// Returns [`RelayError::Json`] for unparseable text and
/// [`RelayError::InvalidArgument`] for JSON that is not an object.
pub fn validate_payload(payload: &str) -> Result<(), RelayError> {
    let value: Value = serde_json::from_str(payload)?;
    if !value.is_object() {
        return Err(RelayError::InvalidArgument(format!(
            "message must be a JSON object, got: {}",
            payload
        )));
    }
    Ok(())
}
