// WebSocket frame types for the PairChat relay.
//
// Frames are UTF-8 JSON text. Outbound frames are not tagged with a `type`
// field; clients tell them apart by their keys (`user_id`/`message` for chat,
// `action` for control, `error` for errors).

use serde::{Deserialize, Serialize};

use crate::types::ParticipantId;

/// Client -> Server: a chat message typed by the connected participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundFrame {
    pub message: String,
}

/// Control actions pushed by the relay outside the normal chat flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// The participant's history was cleared; the client should reload.
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

/// Server -> Client frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OutboundFrame {
    /// A chat message, either replayed from history or delivered live.
    Chat { user_id: ParticipantId, message: String },

    /// A control notification such as `{"action": "refresh"}`.
    Control { action: ControlAction },

    /// A recoverable or terminal error for this connection.
    Error { error: ErrorBody },
}

impl OutboundFrame {
    pub fn chat(sender: ParticipantId, message: impl Into<String>) -> Self {
        Self::Chat { user_id: sender, message: message.into() }
    }

    pub const fn refresh() -> Self {
        Self::Control { action: ControlAction::Refresh }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Error {
            error: ErrorBody { code: code.into(), message: message.into(), retryable },
        }
    }
}

pub fn decode_inbound(raw: &str) -> Result<InboundFrame, serde_json::Error> {
    serde_json::from_str::<InboundFrame>(raw)
}

pub fn encode_outbound(frame: &OutboundFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

pub fn decode_outbound(raw: &str) -> Result<OutboundFrame, serde_json::Error> {
    serde_json::from_str::<OutboundFrame>(raw)
}
