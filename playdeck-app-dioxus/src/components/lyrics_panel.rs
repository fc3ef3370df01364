use super::log_send_error;
use crate::bridge::lyric_line_id;
use crate::engine_thread::EngineThread;
use crate::state::PlayerView;
use dioxus::prelude::*;
use playdeck_core::{Lyrics, PlayerCommand};

/// Scrolling lyric list with the active line highlighted.
///
/// Scrolling itself is driven by the bridge when the active line changes.
/// Clicking a line jumps playback to its timestamp.
#[component]
pub fn LyricsPanel() -> Element {
    let engine = use_context::<EngineThread>();
    let view = use_context::<PlayerView>();
    let lyrics = use_context::<Lyrics>();

    let (active, position) = {
        let playback = view.playback.read();
        (playback.lyric_index, playback.position)
    };

    if lyrics.is_empty() {
        return rsx! {
            div {
                class: "lyrics empty",
                "No lyrics"
            }
        };
    }

    rsx! {
        div {
            class: "lyrics",

            for (index, line) in lyrics.lines().iter().enumerate() {
                {
                    let class = match active {
                        Some(current) if current == index => "lyric-line active",
                        Some(current) if index < current => "lyric-line past",
                        _ => "lyric-line",
                    };
                    let progress = if active == Some(index) {
                        lyrics.line_progress(index, position)
                    } else {
                        0.0
                    };
                    let handle = engine.handle().clone();
                    let time = line.time;

                    rsx! {
                        div {
                            key: "{index}",
                            id: lyric_line_id(index),
                            class: "{class}",
                            style: "--line-progress: {progress};",
                            onclick: move |_| log_send_error(handle.send(PlayerCommand::SeekTo(time))),
                            "{line.text}"
                        }
                    }
                }
            }
        }
    }
}
