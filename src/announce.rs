//! Text-generation collaborator.
//!
//! Announcements and chat flavor come from an outside service. Calls are
//! advisory: the game has already moved on by the time a reply lands, and a
//! failed or slow reply just means no new text this cycle.

use futures::future::{self, BoxFuture, FutureExt};

/// Work the host wants from the collaborator after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorRequest {
    /// Announcement text for a freshly drawn number.
    Announce { number: u8, language: String },

    /// A flavor chat line for the history so far.
    ChatFlavor { history: Vec<u8> },
}

/// Source of announcement and chat text.
pub trait Announcer: Send + Sync + 'static {
    fn announce(&self, number: u8, language: &str) -> BoxFuture<'static, anyhow::Result<String>>;

    /// A chat line reacting to the history, if the service has one.
    fn chat_flavor(&self, history: &[u8]) -> BoxFuture<'static, anyhow::Result<Option<String>>>;
}

/// Offline announcer using the traditional calls where one exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainAnnouncer;

impl PlainAnnouncer {
    pub fn call_for(number: u8) -> String {
        let nickname = match number {
            1 => Some("Kelly's eye"),
            7 => Some("Lucky seven"),
            11 => Some("Legs eleven"),
            22 => Some("Two little ducks"),
            44 => Some("Droopy drawers"),
            66 => Some("Clickety click"),
            88 => Some("Two fat ladies"),
            90 => Some("Top of the shop"),
            _ => None,
        };
        match nickname {
            Some(nickname) => format!("{nickname}, number {number}"),
            None => format!("Number {number}"),
        }
    }
}

impl Announcer for PlainAnnouncer {
    fn announce(&self, number: u8, _language: &str) -> BoxFuture<'static, anyhow::Result<String>> {
        future::ready(Ok(Self::call_for(number))).boxed()
    }

    fn chat_flavor(&self, _history: &[u8]) -> BoxFuture<'static, anyhow::Result<Option<String>>> {
        future::ready(Ok(None)).boxed()
    }
}
