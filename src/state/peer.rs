//! Peer registry.
//!
//! Tracks the participant channels attached to the host. A channel is first
//! registered as pending when the transport hands it over, and becomes a live
//! [`PeerClient`] once it reports itself open. Only open peers receive
//! broadcasts.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Opaque transport-assigned channel handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport failure on a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel {0} is closed")]
    Closed(PeerId),

    #[error("channel {0} is not registered")]
    Unknown(PeerId),

    #[error("write to channel {peer} failed: {reason}")]
    Write { peer: PeerId, reason: String },
}

/// A reliable, ordered message channel to one peer.
pub trait PeerChannel: Send {
    fn id(&self) -> &PeerId;

    /// Queue one text frame for delivery.
    fn send(&self, frame: &str) -> Result<(), ChannelError>;
}

/// A joined participant.
pub struct PeerClient {
    pub id: PeerId,

    /// Logical join order (1 = first peer to open)
    pub joined_at: u64,

    /// Wall-clock time the channel opened
    pub connected_at: DateTime<Utc>,

    pub open: bool,

    /// Frames successfully written
    pub frames_sent: u64,

    channel: Box<dyn PeerChannel>,
}

impl fmt::Debug for PeerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerClient")
            .field("id", &self.id)
            .field("joined_at", &self.joined_at)
            .field("connected_at", &self.connected_at)
            .field("open", &self.open)
            .field("frames_sent", &self.frames_sent)
            .finish()
    }
}

impl PeerClient {
    fn new(channel: Box<dyn PeerChannel>, joined_at: u64) -> Self {
        Self {
            id: channel.id().clone(),
            joined_at,
            connected_at: Utc::now(),
            open: true,
            frames_sent: 0,
            channel,
        }
    }

    /// Write a frame, closing the client on failure.
    pub fn send(&mut self, frame: &str) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed(self.id.clone()));
        }
        match self.channel.send(frame) {
            Ok(()) => {
                self.frames_sent += 1;
                Ok(())
            }
            Err(err) => {
                self.open = false;
                Err(err)
            }
        }
    }
}

/// Registry of peer channels. The host holds the only instance.
#[derive(Default)]
pub struct PeerRegistry {
    /// Channels handed over but not open yet
    pending: HashMap<PeerId, Box<dyn PeerChannel>>,

    /// Joined peers by ID
    clients: HashMap<PeerId, PeerClient>,

    /// Logical clock for join order
    clock: u64,
}

impl fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("clients", &self.clients)
            .field("clock", &self.clock)
            .finish()
    }
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a channel whose open handshake has not completed.
    pub fn on_connect(&mut self, channel: Box<dyn PeerChannel>) {
        let id = channel.id().clone();
        if self.clients.contains_key(&id) {
            warn!(peer = %id, "ignoring duplicate connection for joined peer");
            return;
        }
        if self.pending.insert(id.clone(), channel).is_some() {
            warn!(peer = %id, "replacing pending channel with a newer connection");
        } else {
            debug!(peer = %id, "channel pending");
        }
    }

    /// Promote a pending channel once it reports open.
    ///
    /// Returns false for unknown or already-joined channels.
    pub fn on_join(&mut self, id: &PeerId) -> bool {
        let Some(channel) = self.pending.remove(id) else {
            if self.clients.contains_key(id) {
                debug!(peer = %id, "peer already joined");
            } else {
                warn!(peer = %id, "open reported for unknown channel");
            }
            return false;
        };

        self.clock += 1;
        let client = PeerClient::new(channel, self.clock);
        info!(peer = %id, joined_at = client.joined_at, "peer joined");
        self.clients.insert(id.clone(), client);
        true
    }

    /// Register and open a channel in one step.
    pub fn join(&mut self, channel: Box<dyn PeerChannel>) -> bool {
        let id = channel.id().clone();
        self.on_connect(channel);
        self.on_join(&id)
    }

    /// Drop a channel.
    ///
    /// Leaves for channels that never finished opening, or that are already
    /// gone, are absorbed.
    pub fn on_leave(&mut self, id: &PeerId) -> Option<PeerClient> {
        if self.pending.remove(id).is_some() {
            debug!(peer = %id, "pending channel closed before opening");
            return None;
        }
        let client = self.clients.remove(id);
        match &client {
            Some(c) => info!(peer = %id, frames_sent = c.frames_sent, "peer left"),
            None => debug!(peer = %id, "leave for unknown peer"),
        }
        client
    }

    /// Write a frame to one peer.
    pub fn send(&mut self, id: &PeerId, frame: &str) -> Result<(), ChannelError> {
        self.clients
            .get_mut(id)
            .ok_or_else(|| ChannelError::Unknown(id.clone()))?
            .send(frame)
    }

    /// Open peers in join order.
    pub fn open_channels(&self) -> Vec<PeerId> {
        let mut open: Vec<&PeerClient> = self.clients.values().filter(|c| c.open).collect();
        open.sort_by_key(|c| c.joined_at);
        open.into_iter().map(|c| c.id.clone()).collect()
    }

    pub fn get(&self, id: &PeerId) -> Option<&PeerClient> {
        self.clients.get(id)
    }

    pub fn is_open(&self, id: &PeerId) -> bool {
        self.clients.get(id).is_some_and(|c| c.open)
    }

    pub fn is_pending(&self, id: &PeerId) -> bool {
        self.pending.contains_key(id)
    }

    /// Count open peers.
    pub fn open_count(&self) -> usize {
        self.clients.values().filter(|c| c.open).count()
    }

    /// Count tracked channels, pending included.
    pub fn total_count(&self) -> usize {
        self.clients.len() + self.pending.len()
    }
}
