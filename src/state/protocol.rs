//! Wire protocol.
//!
//! Every frame is a JSON object with a `type` discriminator and a `payload`:
//!
//! ```text
//! {"type":"SyncState","payload":{"history":[7,52],"currentNumber":52,"currentAnnouncement":"..."}}
//! {"type":"CallNumber","payload":{"number":81,"announcement":"...","history":[7,52,81]}}
//! {"type":"ResetGame","payload":{}}
//! {"type":"ChatMessage","payload":{"id":"...","sender":"Ana","text":"hi","isSystem":false}}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chat::ChatMessage;
use super::game::GameState;

/// Frame encode/decode failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    /// Full-state snapshot, host to a newly joined peer.
    #[serde(rename_all = "camelCase")]
    SyncState {
        history: Vec<u8>,
        current_number: Option<u8>,
        current_announcement: String,
    },

    /// A draw, an announcement update, or (with no number) the end of the game.
    /// `history` is the host's full sequence and is authoritative.
    CallNumber {
        number: Option<u8>,
        announcement: String,
        history: Vec<u8>,
    },

    ResetGame {},

    ChatMessage(ChatMessage),
}

impl Message {
    /// Snapshot of the given state.
    pub fn sync_state(state: &GameState) -> Self {
        Self::SyncState {
            history: state.called_numbers.clone(),
            current_number: state.current_number,
            current_announcement: state.current_announcement.clone(),
        }
    }

    /// Call message reflecting the given state.
    pub fn call_number(state: &GameState) -> Self {
        Self::CallNumber {
            number: state.current_number,
            announcement: state.current_announcement.clone(),
            history: state.called_numbers.clone(),
        }
    }

    pub fn reset() -> Self {
        Self::ResetGame {}
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyncState { .. } => "SyncState",
            Self::CallNumber { .. } => "CallNumber",
            Self::ResetGame {} => "ResetGame",
            Self::ChatMessage(_) => "ChatMessage",
        }
    }

    /// Messages only the host may originate.
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, Self::ChatMessage(_))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
