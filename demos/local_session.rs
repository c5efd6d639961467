//! Host and two participants in one process.
//!
//! Run with `cargo run --example local_session`. Set `HOUSIE_DRAW_INTERVAL_MS`
//! to speed the draws up or slow them down.

use std::sync::Arc;
use std::time::Duration;

use housie_session::announce::PlainAnnouncer;
use housie_session::config::SessionConfig;
use housie_session::runtime::{spawn_host, HostHandle, LocalChannel};
use housie_session::state::{Applied, Host, Participant, PeerId, WinVerdict};
use tokio::sync::mpsc;
use tracing::info;

async fn play(
    name: &str,
    config: SessionConfig,
    handle: HostHandle,
    mut frames: mpsc::UnboundedReceiver<String>,
) {
    let mut participant = Participant::from_config(name, &config);
    let peer = PeerId::new(name);

    while let Some(frame) = frames.recv().await {
        let applied = match participant.handle_frame(&frame) {
            Ok(applied) => applied,
            Err(err) => {
                info!(player = name, error = %err, "dropping frame");
                continue;
            }
        };
        let Applied::Called(Some(number)) = applied else {
            continue;
        };

        let report = participant.mark_value(number);
        if let Some(claim) = report.claim {
            info!(player = name, text = %claim.text, "claim");
            if let Ok(frame) = participant.compose(claim) {
                let _ = handle.frame(peer.clone(), frame);
            }
        }
        if report.verdict == WinVerdict::FullHouse {
            break;
        }
    }
    info!(
        player = name,
        marked = participant.ticket().marked_count(),
        verdict = participant.verdict().as_str(),
        "finished"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = SessionConfig::from_env();
    if std::env::var("HOUSIE_DRAW_INTERVAL_MS").is_err() {
        config.draw_interval_ms = 50;
    }
    config.validate()?;

    let (handle, task) = spawn_host(Host::new(config.clone()), Arc::new(PlainAnnouncer));

    let mut players = Vec::new();
    for name in ["ana", "ben"] {
        let (channel, frames) = LocalChannel::pair(name);
        handle.connect(Box::new(channel))?;
        handle.open(PeerId::new(name))?;
        players.push(tokio::spawn(play(name, config.clone(), handle.clone(), frames)));
    }

    handle.chat("Eyes down!")?;
    handle.start_automatic().await?;

    let first = futures::future::select_all(players).await;
    first.0?;

    handle.stop_automatic()?;
    let state = handle.snapshot().await?;
    info!(called = state.called_count(), status = %state.status, "game stopped");

    handle.shutdown()?;
    let host = task.await?;
    for message in host.chat().iter() {
        info!(sender = %message.sender, text = %message.text, "chat");
    }
    Ok(())
}
