//! Participant side of a session.
//!
//! A participant keeps a read-only mirror of the host's game, its own ticket
//! and a chat log. The mirror only changes in response to host messages; the
//! ticket only changes when the participant marks a called number.

use tracing::{debug, warn};

use super::chat::{ChatLog, ChatMessage, DEFAULT_CHAT_RETENTION};
use super::game::{is_valid_history, GameState};
use super::protocol::{Message, ProtocolError};
use super::ticket::{MarkOutcome, Position, Ticket};
use super::win::{self, WinVerdict};
use crate::config::SessionConfig;

/// What an inbound message did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Replaced by a snapshot
    Synced,
    /// Adopted a call (`None` = game over)
    Called(Option<u8>),
    /// Older than what we already have
    Stale,
    /// History failed validation
    Invalid,
    Reset,
    /// Chat appended (false for a duplicate)
    Chat(bool),
}

/// Result of a mark attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkReport {
    pub outcome: MarkOutcome,
    pub verdict: WinVerdict,
    /// Set when this mark raised the verdict; send it to the host to claim.
    pub claim: Option<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct Participant {
    name: String,
    state: GameState,
    ticket: Ticket,
    chat: ChatLog,
    /// Best verdict already claimed this game
    claimed: WinVerdict,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_ticket(name, Ticket::generate(), DEFAULT_CHAT_RETENTION)
    }

    /// A participant using the session's chat retention.
    pub fn from_config(name: impl Into<String>, config: &SessionConfig) -> Self {
        Self::with_ticket(name, Ticket::generate(), config.chat_retention)
    }

    pub fn with_ticket(name: impl Into<String>, ticket: Ticket, chat_retention: usize) -> Self {
        Self {
            name: name.into(),
            state: GameState::new(),
            ticket,
            chat: ChatLog::new(chat_retention),
            claimed: WinVerdict::NoWin,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Decode and apply a frame from the host.
    pub fn handle_frame(&mut self, frame: &str) -> Result<Applied, ProtocolError> {
        Ok(self.apply(Message::decode(frame)?))
    }

    /// Apply a host message.
    pub fn apply(&mut self, message: Message) -> Applied {
        match message {
            Message::SyncState {
                history,
                current_number,
                current_announcement,
            } => {
                if !is_valid_history(&history) {
                    warn!(len = history.len(), "rejecting snapshot with invalid history");
                    return Applied::Invalid;
                }
                self.state.replace(history, current_number, current_announcement);
                Applied::Synced
            }
            Message::CallNumber {
                number,
                announcement,
                history,
            } => {
                if !is_valid_history(&history) {
                    warn!(len = history.len(), "rejecting call with invalid history");
                    return Applied::Invalid;
                }
                if history.len() < self.state.called_count() {
                    debug!(
                        incoming = history.len(),
                        local = self.state.called_count(),
                        "ignoring stale call"
                    );
                    return Applied::Stale;
                }
                // The carried history is the truth, whatever we had before
                self.state.replace(history, number, announcement);
                Applied::Called(number)
            }
            Message::ResetGame {} => {
                self.state.clear();
                self.claimed = WinVerdict::NoWin;
                Applied::Reset
            }
            Message::ChatMessage(message) => Applied::Chat(self.chat.push(message)),
        }
    }

    /// Current verdict for the ticket against the mirrored history.
    pub fn verdict(&self) -> WinVerdict {
        win::evaluate(&self.ticket, &self.state.called_numbers)
    }

    /// Toggle a cell.
    pub fn toggle(&mut self, pos: Position) -> MarkReport {
        let outcome = self.ticket.toggle(pos, &self.state.called_numbers);
        self.report(outcome)
    }

    /// Mark a value wherever it sits on the ticket.
    pub fn mark_value(&mut self, value: u8) -> MarkReport {
        let outcome = self.ticket.mark_value(value, &self.state.called_numbers);
        self.report(outcome)
    }

    fn report(&mut self, outcome: MarkOutcome) -> MarkReport {
        let verdict = self.verdict();
        let claim = if verdict > self.claimed {
            self.claimed = verdict;
            let text = match verdict {
                WinVerdict::FullHouse => format!("{} claims a full house!", self.name),
                _ => format!("{} claims a row!", self.name),
            };
            Some(ChatMessage::system_from(self.name.clone(), text))
        } else {
            None
        };
        MarkReport {
            outcome,
            verdict,
            claim,
        }
    }

    /// Replace the ticket, e.g. for a new game after a reset.
    pub fn regenerate_ticket(&mut self) {
        self.ticket = Ticket::generate();
        self.claimed = WinVerdict::NoWin;
    }

    /// Append a chat message locally and encode it for the host.
    pub fn compose(&mut self, message: ChatMessage) -> Result<String, ProtocolError> {
        let frame = Message::ChatMessage(message.clone()).encode()?;
        self.chat.push(message);
        Ok(frame)
    }

    /// Compose a chat line typed by this participant.
    pub fn compose_chat(&mut self, text: impl Into<String>) -> Result<String, ProtocolError> {
        let message = ChatMessage::user(self.name.clone(), text);
        self.compose(message)
    }
}
