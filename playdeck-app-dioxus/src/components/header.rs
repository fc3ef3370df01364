use super::log_send_error;
use crate::engine_thread::EngineThread;
use crate::state::PlayerView;
use dioxus::prelude::*;
use playdeck_core::TrackInfo;

/// Album art, title and artist, with the like toggle.
#[component]
pub fn Header() -> Element {
    let engine = use_context::<EngineThread>();
    let view = use_context::<PlayerView>();
    let track = use_context::<TrackInfo>();

    let is_liked = view.playback.read().is_liked;

    let handle = engine.handle().clone();
    let on_like = move |_: MouseEvent| log_send_error(handle.toggle_like());

    rsx! {
        div {
            class: "header",

            if track.cover_uri.is_empty() {
                div { class: "cover cover-placeholder" }
            } else {
                img {
                    class: "cover",
                    src: "{track.cover_uri}",
                    alt: "{track.title}",
                }
            }

            div {
                class: "track-meta",
                div { class: "track-title", "{track.title}" }
                div { class: "track-artist", "{track.artist}" }
            }

            button {
                class: if is_liked { "icon-button like active" } else { "icon-button like" },
                title: if is_liked { "Unlike" } else { "Like" },
                onclick: on_like,
                if is_liked { "\u{2665}" } else { "\u{2661}" }
            }
        }
    }
}
