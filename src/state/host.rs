//! Host session.
//!
//! The host owns the authoritative game, the peer registry and its own chat
//! log. Every mutation of the game is committed and broadcast inside the same
//! call, and every message is built from the state as it is at send time.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::broadcast::{BroadcastReport, Broadcaster};
use super::chat::{self, ChatLog, ChatMessage};
use super::game::{GameMachine, GameState, Rejected};
use super::peer::{PeerChannel, PeerId, PeerRegistry};
use super::protocol::{Message, ProtocolError};
use super::status::GameStatus;
use crate::announce::CollaboratorRequest;
use crate::config::SessionConfig;

#[derive(Debug)]
pub struct Host {
    config: SessionConfig,
    game: GameMachine,
    peers: PeerRegistry,
    broadcaster: Broadcaster,
    chat: ChatLog,
    /// Draws since the last flavor request
    draws_since_flavor: u32,
}

impl Host {
    pub fn new(config: SessionConfig) -> Self {
        let game = match config.seed {
            Some(seed) => GameMachine::seeded(seed),
            None => GameMachine::new(),
        };
        Self {
            chat: ChatLog::new(config.chat_retention),
            config,
            game,
            peers: PeerRegistry::new(),
            broadcaster: Broadcaster::new(),
            draws_since_flavor: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        self.game.state()
    }

    pub fn status(&self) -> GameStatus {
        self.game.status()
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    fn broadcast(&mut self, message: &Message) -> BroadcastReport {
        self.broadcaster.broadcast(&mut self.peers, message, None)
    }

    /// Draw a number and tell everyone.
    ///
    /// The returned requests are for the announcer; nothing here waits on them.
    pub fn draw(&mut self) -> Result<Vec<CollaboratorRequest>, Rejected> {
        let outcome = self.game.draw()?;
        info!(
            number = outcome.number,
            called = self.game.state().called_count(),
            "number drawn"
        );

        // One frame per draw. The last one carries the terminal call and the
        // full history, which already includes the final number.
        self.broadcast(&Message::call_number(self.game.state()));

        let mut requests = Vec::new();
        if outcome.exhausted {
            info!("all numbers drawn");
        } else {
            requests.push(CollaboratorRequest::Announce {
                number: outcome.number,
                language: self.config.language.clone(),
            });
        }

        self.draws_since_flavor += 1;
        let every = self.config.chat_flavor_every;
        if every > 0 && self.draws_since_flavor >= every {
            self.draws_since_flavor = 0;
            requests.push(CollaboratorRequest::ChatFlavor {
                history: self.game.state().called_numbers.clone(),
            });
        }

        Ok(requests)
    }

    /// Start automatic draws at the configured interval.
    pub fn start_automatic(&mut self, now: Instant) -> Result<bool, Rejected> {
        let interval = self.config.draw_interval();
        self.start_automatic_every(interval, now)
    }

    /// Start automatic draws. Starting while running is a no-op.
    pub fn start_automatic_every(
        &mut self,
        interval: Duration,
        now: Instant,
    ) -> Result<bool, Rejected> {
        let started = self.game.start_automatic(interval, now)?;
        if started {
            info!(interval_ms = interval.as_millis() as u64, "automatic draws started");
        }
        Ok(started)
    }

    pub fn stop_automatic(&mut self) -> bool {
        let stopped = self.game.stop_automatic();
        if stopped {
            info!("automatic draws stopped");
        }
        stopped
    }

    /// Clear the game and tell everyone. Automatic draws stop first.
    pub fn reset(&mut self) -> BroadcastReport {
        self.game.reset();
        self.draws_since_flavor = 0;
        info!("game reset");
        self.broadcast(&Message::reset())
    }

    /// Fire an automatic draw if one is due.
    pub fn tick(&mut self, now: Instant) -> Vec<CollaboratorRequest> {
        if !self.game.is_due(now) {
            return Vec::new();
        }
        self.game.reschedule(now);
        match self.draw() {
            Ok(requests) => requests,
            Err(err) => {
                debug!(error = %err, "automatic draw skipped");
                Vec::new()
            }
        }
    }

    /// When the next automatic draw fires.
    pub fn next_due(&self) -> Option<Instant> {
        self.game.next_due()
    }

    /// A transport handed over a channel that has not opened yet.
    pub fn on_connect(&mut self, channel: Box<dyn PeerChannel>) {
        self.peers.on_connect(channel);
    }

    /// A channel opened: register it and send the joiner a snapshot.
    ///
    /// Only the joiner gets the snapshot; everyone else is already in sync.
    pub fn on_join(&mut self, id: &PeerId) -> bool {
        if !self.peers.on_join(id) {
            return false;
        }
        let snapshot = Message::sync_state(self.game.state());
        self.broadcaster
            .send_to(&mut self.peers, id, &snapshot)
            .is_ok()
    }

    pub fn on_leave(&mut self, id: &PeerId) {
        self.peers.on_leave(id);
    }

    /// Handle a frame received from a peer.
    ///
    /// Chat is appended and relayed to the other peers. Game messages from
    /// peers are ignored; only the host decides what has been drawn.
    pub fn on_frame(&mut self, from: &PeerId, frame: &str) -> Result<(), ProtocolError> {
        if !self.peers.is_open(from) {
            debug!(peer = %from, "frame from peer that is not open");
            return Ok(());
        }
        let message = Message::decode(frame)?;
        if message.is_authoritative() {
            warn!(peer = %from, kind = message.kind(), "ignoring game message from peer");
            return Ok(());
        }
        if let Message::ChatMessage(message) = message {
            chat::relay(
                &mut self.chat,
                &mut self.broadcaster,
                &mut self.peers,
                message,
                Some(from),
            );
        }
        Ok(())
    }

    /// Post chat typed on the host.
    pub fn send_chat(&mut self, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage::user(self.config.host_name.clone(), text);
        chat::relay(
            &mut self.chat,
            &mut self.broadcaster,
            &mut self.peers,
            message.clone(),
            None,
        );
        message
    }

    /// Apply an announcer reply for `number`.
    ///
    /// A missing reply keeps the last text. A stale one is dropped.
    pub fn apply_announcement(&mut self, number: u8, text: Option<String>) -> bool {
        let Some(text) = text else {
            debug!(number, "no announcement this cycle");
            return false;
        };
        if !self.game.apply_announcement(number, text) {
            return false;
        }
        self.broadcast(&Message::call_number(self.game.state()));
        true
    }

    /// Relay a flavor line from the announcer as a system chat message.
    pub fn apply_chat_flavor(&mut self, text: Option<String>) -> Option<ChatMessage> {
        let text = text.filter(|t| !t.trim().is_empty())?;
        let message = ChatMessage::system(text);
        chat::relay(
            &mut self.chat,
            &mut self.broadcaster,
            &mut self.peers,
            message.clone(),
            None,
        );
        Some(message)
    }
}
