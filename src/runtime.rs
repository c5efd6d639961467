//! Host event loop.
//!
//! One task owns the [`Host`] and handles, one at a time: commands from the
//! transport and the local UI, the automatic-draw deadline, and announcer
//! replies. Announcer calls run in their own tasks so a slow service never
//! holds up the loop.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::announce::{Announcer, CollaboratorRequest};
use crate::state::game::{GameState, Rejected};
use crate::state::host::Host;
use crate::state::peer::{ChannelError, PeerChannel, PeerId};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("host event loop has stopped")]
    Stopped,

    #[error(transparent)]
    Rejected(#[from] Rejected),
}

/// Input to the host loop.
pub enum HostCommand {
    /// Transport handed over a channel that is still opening
    Connect(Box<dyn PeerChannel>),
    /// Channel finished opening
    Open(PeerId),
    /// Frame received from a peer
    Frame { from: PeerId, frame: String },
    /// Channel closed
    Close(PeerId),
    Draw(oneshot::Sender<Result<(), Rejected>>),
    StartAutomatic(oneshot::Sender<Result<bool, Rejected>>),
    StopAutomatic,
    Reset,
    Chat(String),
    Snapshot(oneshot::Sender<GameState>),
    Shutdown,
}

enum Reply {
    Announcement { number: u8, text: Option<String> },
    Flavor(Option<String>),
}

/// Cloneable handle for feeding the host loop.
#[derive(Clone)]
pub struct HostHandle {
    commands: mpsc::UnboundedSender<HostCommand>,
}

impl HostHandle {
    pub fn send(&self, command: HostCommand) -> Result<(), RuntimeError> {
        self.commands.send(command).map_err(|_| RuntimeError::Stopped)
    }

    pub fn connect(&self, channel: Box<dyn PeerChannel>) -> Result<(), RuntimeError> {
        self.send(HostCommand::Connect(channel))
    }

    pub fn open(&self, id: PeerId) -> Result<(), RuntimeError> {
        self.send(HostCommand::Open(id))
    }

    pub fn frame(&self, from: PeerId, frame: String) -> Result<(), RuntimeError> {
        self.send(HostCommand::Frame { from, frame })
    }

    pub fn close(&self, id: PeerId) -> Result<(), RuntimeError> {
        self.send(HostCommand::Close(id))
    }

    pub async fn draw(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(HostCommand::Draw(tx))?;
        Ok(rx.await.map_err(|_| RuntimeError::Stopped)??)
    }

    pub async fn start_automatic(&self) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(HostCommand::StartAutomatic(tx))?;
        Ok(rx.await.map_err(|_| RuntimeError::Stopped)??)
    }

    pub fn stop_automatic(&self) -> Result<(), RuntimeError> {
        self.send(HostCommand::StopAutomatic)
    }

    pub fn reset(&self) -> Result<(), RuntimeError> {
        self.send(HostCommand::Reset)
    }

    pub fn chat(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.send(HostCommand::Chat(text.into()))
    }

    /// Current game state as the loop sees it.
    pub async fn snapshot(&self) -> Result<GameState, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(HostCommand::Snapshot(tx))?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(HostCommand::Shutdown)
    }
}

/// Spawn the host loop. The join handle yields the host back after shutdown.
pub fn spawn_host(host: Host, announcer: Arc<dyn Announcer>) -> (HostHandle, JoinHandle<Host>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_host(host, announcer, rx));
    (HostHandle { commands: tx }, task)
}

/// Run the host loop until `Shutdown` or until every handle is dropped.
pub async fn run_host(
    mut host: Host,
    announcer: Arc<dyn Announcer>,
    mut commands: mpsc::UnboundedReceiver<HostCommand>,
) -> Host {
    let (reply_tx, mut replies) = mpsc::unbounded_channel();
    let timeout = host.config().announce_timeout();
    info!("host loop started");

    loop {
        let deadline = host.next_due();
        let requests = tokio::select! {
            command = commands.recv() => match command {
                Some(HostCommand::Shutdown) | None => break,
                Some(command) => handle_command(&mut host, command),
            },
            Some(reply) = replies.recv() => {
                apply_reply(&mut host, reply);
                Vec::new()
            }
            _ = sleep_until_due(deadline) => host.tick(Instant::now().into_std()),
        };

        for request in requests {
            dispatch(request, &announcer, timeout, reply_tx.clone());
        }
    }

    info!("host loop stopped");
    host
}

fn handle_command(host: &mut Host, command: HostCommand) -> Vec<CollaboratorRequest> {
    match command {
        HostCommand::Connect(channel) => host.on_connect(channel),
        HostCommand::Open(id) => {
            host.on_join(&id);
        }
        HostCommand::Frame { from, frame } => {
            if let Err(err) = host.on_frame(&from, &frame) {
                warn!(peer = %from, error = %err, "bad frame");
            }
        }
        HostCommand::Close(id) => host.on_leave(&id),
        HostCommand::Draw(respond) => {
            let (result, requests) = match host.draw() {
                Ok(requests) => (Ok(()), requests),
                Err(err) => (Err(err), Vec::new()),
            };
            let _ = respond.send(result);
            return requests;
        }
        HostCommand::StartAutomatic(respond) => {
            let _ = respond.send(host.start_automatic(Instant::now().into_std()));
        }
        HostCommand::StopAutomatic => {
            host.stop_automatic();
        }
        HostCommand::Reset => {
            host.reset();
        }
        HostCommand::Chat(text) => {
            host.send_chat(text);
        }
        HostCommand::Snapshot(respond) => {
            let _ = respond.send(host.state().clone());
        }
        // Handled by the loop
        HostCommand::Shutdown => {}
    }
    Vec::new()
}

fn apply_reply(host: &mut Host, reply: Reply) {
    match reply {
        Reply::Announcement { number, text } => {
            host.apply_announcement(number, text);
        }
        Reply::Flavor(text) => {
            host.apply_chat_flavor(text);
        }
    }
}

async fn sleep_until_due(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(due) => time::sleep_until(Instant::from_std(due)).await,
        None => std::future::pending().await,
    }
}

fn dispatch(
    request: CollaboratorRequest,
    announcer: &Arc<dyn Announcer>,
    timeout: Duration,
    replies: mpsc::UnboundedSender<Reply>,
) {
    match request {
        CollaboratorRequest::Announce { number, language } => {
            let call = announcer.announce(number, &language);
            tokio::spawn(async move {
                let text = match time::timeout(timeout, call).await {
                    Ok(Ok(text)) => Some(text),
                    Ok(Err(err)) => {
                        warn!(number, error = %err, "announcement failed");
                        None
                    }
                    Err(_) => {
                        warn!(number, "announcement timed out");
                        None
                    }
                };
                let _ = replies.send(Reply::Announcement { number, text });
            });
        }
        CollaboratorRequest::ChatFlavor { history } => {
            let call = announcer.chat_flavor(&history);
            tokio::spawn(async move {
                let text = match time::timeout(timeout, call).await {
                    Ok(Ok(text)) => text,
                    Ok(Err(err)) => {
                        debug!(error = %err, "chat flavor failed");
                        None
                    }
                    Err(_) => {
                        debug!("chat flavor timed out");
                        None
                    }
                };
                let _ = replies.send(Reply::Flavor(text));
            });
        }
    }
}

/// In-process channel backed by an unbounded mpsc queue.
pub struct LocalChannel {
    id: PeerId,
    tx: mpsc::UnboundedSender<String>,
}

impl LocalChannel {
    /// A channel plus the receiving end the peer reads from.
    pub fn pair(id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: PeerId::new(id),
                tx,
            },
            rx,
        )
    }
}

impl PeerChannel for LocalChannel {
    fn id(&self) -> &PeerId {
        &self.id
    }

    fn send(&self, frame: &str) -> Result<(), ChannelError> {
        self.tx
            .send(frame.to_string())
            .map_err(|_| ChannelError::Closed(self.id.clone()))
    }
}
