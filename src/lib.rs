//! Housie Session Library
//!
//! Keeps a host and any number of participants in agreement about a housie
//! game: which numbers have been called, in what order, and what the host
//! last announced. Participants carry their own ticket and decide for
//! themselves whether they have won.
//!
//! # Overview
//!
//! - **Ticket Model** - 3x9 tickets with fifteen numbers, column bands and
//!   marks that only stick to called numbers.
//!
//! - **Win Evaluator** - Row and full-house verdicts from marked, called cells.
//!
//! - **Game State Machine** - Host-owned draws, automatic drawing and reset,
//!   with validated status transitions.
//!
//! - **Peer Registry and Broadcaster** - Open channels in join order, one
//!   encode per broadcast, failed writes drop the peer.
//!
//! - **Chat Relay** - Star relay through the host with a bounded, deduplicated
//!   log on every node.
//!
//! # Design Principles
//!
//! 1. **The host is the only writer** - Participants replace their mirror with
//!    whatever history the host sends.
//!
//! 2. **Every message carries the full history** - A lost or reordered message
//!    never leaves a participant permanently behind.
//!
//! 3. **No transport here** - The state types work on any [`state::PeerChannel`];
//!    [`runtime`] drives them on tokio.
//!
//! # Example
//!
//! ```rust
//! use housie_session::config::SessionConfig;
//! use housie_session::state::{Host, Participant, PeerId};
//! use housie_session::runtime::LocalChannel;
//!
//! let mut host = Host::new(SessionConfig::default());
//! let (channel, mut frames) = LocalChannel::pair("ana");
//! host.on_connect(Box::new(channel));
//! host.on_join(&PeerId::new("ana"));
//!
//! host.draw().unwrap();
//!
//! let mut ana = Participant::new("Ana");
//! while let Ok(frame) = frames.try_recv() {
//!     ana.handle_frame(&frame).unwrap();
//! }
//! assert_eq!(ana.state().called_numbers, host.state().called_numbers);
//! ```

pub mod announce;
pub mod config;
pub mod runtime;
pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
