//! Chat log and relay.
//!
//! Peers only have a channel to the host, so chat is a star: a peer sends to
//! the host, the host appends once and re-broadcasts to everyone else.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::broadcast::{BroadcastReport, Broadcaster};
use super::peer::{PeerId, PeerRegistry};
use super::protocol::Message;

/// Default number of chat entries kept.
pub const DEFAULT_CHAT_RETENTION: usize = 40;

/// Sender name for system lines.
pub const SYSTEM_SENDER: &str = "System";

/// A chat entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub is_system: bool,
}

impl ChatMessage {
    /// A line typed by a person.
    pub fn user(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: sender.into(),
            text: text.into(),
            is_system: false,
        }
    }

    /// A generated line.
    pub fn system(text: impl Into<String>) -> Self {
        Self::system_from(SYSTEM_SENDER, text)
    }

    /// A generated line attributed to someone, e.g. a win claim.
    pub fn system_from(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_system: true,
            ..Self::user(sender, text)
        }
    }
}

/// Capped, ordered chat log. Oldest entries fall off the front.
#[derive(Debug, Clone)]
pub struct ChatLog {
    entries: VecDeque<ChatMessage>,
    retention: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_RETENTION)
    }
}

impl ChatLog {
    pub fn new(retention: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(retention),
            retention: retention.max(1),
        }
    }

    /// Append a message. Returns false if its ID is already in the window.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if self.contains(&message.id) {
            debug!(id = %message.id, "duplicate chat message");
            return false;
        }
        if self.entries.len() == self.retention {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|m| m.id == id)
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ChatMessage> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }
}

/// Append a message locally and broadcast it to every open peer except its
/// origin.
///
/// A message already in the log is neither appended nor relayed again, which
/// keeps echoes from looping.
pub fn relay(
    log: &mut ChatLog,
    broadcaster: &mut Broadcaster,
    registry: &mut PeerRegistry,
    message: ChatMessage,
    origin: Option<&PeerId>,
) -> Option<BroadcastReport> {
    if !log.push(message.clone()) {
        return None;
    }
    Some(broadcaster.broadcast(registry, &Message::ChatMessage(message), origin))
}
