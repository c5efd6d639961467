//! Fan-out to peer channels.
//!
//! Each open channel is an independent sink. A failed write closes that peer
//! and turns into a leave once the fan-out finishes; it never stops delivery to
//! the peers after it.

use tracing::{debug, warn};

use super::peer::{ChannelError, PeerId, PeerRegistry};
use super::protocol::Message;

/// Who got a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<PeerId>,
    /// Peers whose write failed; already removed from the registry.
    pub dropped: Vec<PeerId>,
}

impl BroadcastReport {
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.dropped.is_empty()
    }
}

/// Message fan-out.
#[derive(Debug, Default)]
pub struct Broadcaster {
    /// Messages fanned out so far
    broadcasts: u64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts
    }

    /// Send to every open peer except `except`.
    pub fn broadcast(
        &mut self,
        registry: &mut PeerRegistry,
        message: &Message,
        except: Option<&PeerId>,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(err) => {
                warn!(kind = message.kind(), error = %err, "dropping unencodable message");
                return report;
            }
        };

        for id in registry.open_channels() {
            if except == Some(&id) {
                continue;
            }
            match registry.send(&id, &frame) {
                Ok(()) => report.delivered.push(id),
                Err(err) => {
                    warn!(peer = %id, error = %err, "write failed, dropping peer");
                    report.dropped.push(id);
                }
            }
        }

        for id in &report.dropped {
            registry.on_leave(id);
        }

        self.broadcasts += 1;
        debug!(
            kind = message.kind(),
            delivered = report.delivered.len(),
            dropped = report.dropped.len(),
            "broadcast"
        );
        report
    }

    /// Send to a single peer. A failed write removes the peer.
    pub fn send_to(
        &mut self,
        registry: &mut PeerRegistry,
        id: &PeerId,
        message: &Message,
    ) -> Result<(), ChannelError> {
        let frame = message.encode().map_err(|err| ChannelError::Write {
            peer: id.clone(),
            reason: err.to_string(),
        })?;
        registry.send(id, &frame).inspect_err(|err| {
            warn!(peer = %id, error = %err, "write failed, dropping peer");
            registry.on_leave(id);
        })
    }
}
