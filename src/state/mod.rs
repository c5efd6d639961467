//! Session state.
//!
//! - `ticket` - Ticket layout, generation and marking
//! - `win` - Row and full-house evaluation
//! - `status` - Game status machine
//! - `game` - Draw pool, automatic drawing, authoritative game state
//! - `peer` - Peer channels and the registry of open ones
//! - `protocol` - Wire messages
//! - `broadcast` - Fan-out to open peers
//! - `chat` - Chat messages, bounded log and relay
//! - `host` - The host session tying the above together
//! - `participant` - A participant's mirror, ticket and chat
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── Host ─────────────────────────────┐
//! │                                                               │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐       │
//! │  │ GameMachine  │   │ PeerRegistry │   │   ChatLog    │       │
//! │  │              │   │              │   │              │       │
//! │  │ GameState    │   │ pending →    │   │ id-deduped,  │       │
//! │  │ DrawPool     │   │   channel    │   │ bounded      │       │
//! │  │ AutoDraw     │   │ open →       │   │              │       │
//! │  │ StatusMachine│   │   PeerClient │   │              │       │
//! │  └──────┬───────┘   └──────▲───────┘   └──────┬───────┘       │
//! │         │                  │                  │               │
//! │         └──────▶ Broadcaster (encode once) ◀──┘               │
//! └────────────────────────────┬──────────────────────────────────┘
//!                              │ SyncState / CallNumber /
//!                              │ ResetGame / ChatMessage
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//!      ┌───────────────┐               ┌───────────────┐
//!      │  Participant  │      ...      │  Participant  │
//!      │ mirror GameState              │ mirror GameState
//!      │ Ticket → verdict              │ Ticket → verdict
//!      └───────────────┘               └───────────────┘
//!
//!   Idle ──draw──▶ Stopped ◀──stop── Running ──90th draw──▶ Exhausted
//!     ▲              └──────start──────▲                         │
//!     └────────────────── reset (from anywhere) ─────────────────┘
//! ```

pub mod broadcast;
pub mod chat;
pub mod game;
pub mod host;
pub mod participant;
pub mod peer;
pub mod protocol;
pub mod status;
pub mod ticket;
pub mod win;

// Re-export commonly used types
pub use broadcast::{BroadcastReport, Broadcaster};
pub use chat::{ChatLog, ChatMessage, DEFAULT_CHAT_RETENTION, SYSTEM_SENDER};
pub use game::{
    DrawOutcome, DrawPool, GameMachine, GameState, Rejected, MAX_NUMBER, TERMINAL_ANNOUNCEMENT,
};
pub use host::Host;
pub use participant::{Applied, MarkReport, Participant};
pub use peer::{ChannelError, PeerChannel, PeerClient, PeerId, PeerRegistry};
pub use protocol::{Message, ProtocolError};
pub use status::{GameEvent, GameStatus, InvalidTransition, StatusMachine};
pub use ticket::{Cell, MarkOutcome, MarkRejection, Position, Ticket, TicketError};
pub use win::WinVerdict;
