use super::log_send_error;
use crate::engine_thread::EngineThread;
use crate::state::PlayerView;
use dioxus::prelude::*;

/// Shuffle, play/pause, repeat and share buttons.
#[component]
pub fn Transport() -> Element {
    let engine = use_context::<EngineThread>();
    let view = use_context::<PlayerView>();

    let (is_playing, is_shuffle, is_repeat) = {
        let playback = view.playback.read();
        (playback.is_playing, playback.is_shuffle, playback.is_repeat)
    };
    let share_text = view.share_text.read().clone();
    let error = view.error.read().clone();

    let handle = engine.handle().clone();
    let on_shuffle = move |_: MouseEvent| log_send_error(handle.toggle_shuffle());

    let handle = engine.handle().clone();
    let on_play = move |_: MouseEvent| log_send_error(handle.toggle_play());

    let handle = engine.handle().clone();
    let on_repeat = move |_: MouseEvent| log_send_error(handle.toggle_repeat());

    let handle = engine.handle().clone();
    let on_share = move |_: MouseEvent| log_send_error(handle.share());

    rsx! {
        div {
            class: "transport",

            button {
                class: if is_shuffle { "icon-button active" } else { "icon-button" },
                title: "Shuffle",
                onclick: on_shuffle,
                "\u{292E}"
            }
            button {
                class: "play-button",
                title: if is_playing { "Pause" } else { "Play" },
                onclick: on_play,
                if is_playing { "\u{275A}\u{275A}" } else { "\u{25B6}" }
            }
            button {
                class: if is_repeat { "icon-button active" } else { "icon-button" },
                title: "Repeat",
                onclick: on_repeat,
                "\u{21BB}"
            }
            button {
                class: "icon-button",
                title: "Share",
                onclick: on_share,
                "\u{2197}"
            }
        }

        if let Some(text) = share_text {
            div { class: "toast", "{text}" }
        }
        if let Some(message) = error {
            div { class: "toast error", "{message}" }
        }
    }
}
