use crate::state::PlayerView;
use dioxus::prelude::*;
use playdeck_core::{PlayerEvent, PlayerHandle};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "playdeck::bridge";

/// DOM id of the lyric line at `index`
#[must_use]
pub fn lyric_line_id(index: usize) -> String {
    format!("lyric-line-{index}")
}

/// Bridge the player engine to Dioxus signals.
///
/// State snapshots come from the engine's watch channel; one-shot events
/// (line changes, share, errors) come from its broadcast channel.
pub fn use_player_bridge(handle: &PlayerHandle, view: PlayerView) {
    let state_handle = handle.clone();
    use_future(move || {
        let mut rx = state_handle.state_receiver();
        let mut playback = view.playback;
        async move {
            playback.set(rx.borrow_and_update().clone());
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                playback.set(snapshot);
            }
            info!(target: LOG_TARGET, "Player state channel closed");
        }
    });

    let event_handle = handle.clone();
    use_future(move || {
        let mut rx = event_handle.subscribe();
        async move {
            loop {
                match rx.recv().await {
                    Ok(event) => handle_player_event(event, view),
                    Err(RecvError::Closed) => {
                        info!(target: LOG_TARGET, "Player event channel closed");
                        break;
                    }
                    Err(RecvError::Lagged(n)) => {
                        info!(target: LOG_TARGET, "Missed {} player events", n);
                    }
                }
            }
        }
    });
}

fn handle_player_event(event: PlayerEvent, mut view: PlayerView) {
    match event {
        PlayerEvent::ActiveLineChanged { index } => {
            scroll_line_into_view(index);
        }
        PlayerEvent::PlaybackStarted { position } => {
            debug!(target: LOG_TARGET, "Playback started at {:?}", position);
            view.error.set(None);
        }
        PlayerEvent::ShareRequested { text } => {
            info!(target: LOG_TARGET, "Sharing: {text}");
            view.share_text.set(Some(text));
        }
        PlayerEvent::Error { message } => {
            warn!(target: LOG_TARGET, "Player error: {message}");
            view.error.set(Some(message));
        }
        PlayerEvent::Stopped => {
            info!(target: LOG_TARGET, "Player stopped");
        }
        // Carried by the state snapshot
        PlayerEvent::PlaybackPaused { .. }
        | PlayerEvent::PositionChanged { .. }
        | PlayerEvent::SeekOccurred { .. }
        | PlayerEvent::DragStarted
        | PlayerEvent::DragEnded { .. }
        | PlayerEvent::LikeChanged { .. }
        | PlayerEvent::ShuffleChanged { .. }
        | PlayerEvent::RepeatChanged { .. } => {}
    }
}

/// Smoothly center the active lyric line in its scroll container
fn scroll_line_into_view(index: usize) {
    let line_id = lyric_line_id(index);
    let script = format!(
        r#"(function() {{
            const line = document.getElementById("{line_id}");
            if (line) line.scrollIntoView({{ behavior: "smooth", block: "center" }});
        }})();"#
    );
    let _ = document::eval(&script);
}
