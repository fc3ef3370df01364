use super::log_send_error;
use crate::engine_thread::EngineThread;
use crate::state::PlayerView;
use dioxus::prelude::*;
use playdeck_core::{PlayerHandle, TrackGeometry};
use serde::Deserialize;
use tracing::warn;

/// DOM id of the clickable progress track
const TRACK_ID: &str = "progress-track";

/// Track bounds returned from JavaScript measurement.
#[derive(Debug, Deserialize)]
struct MeasuredTrack {
    left: f64,
    width: f64,
}

/// Measure the progress track in client coordinates
async fn measure_track() -> Option<TrackGeometry> {
    let js_measure = format!(
        r#"
            const track = document.getElementById("{TRACK_ID}");
            if (!track) return null;
            const rect = track.getBoundingClientRect();
            return {{ left: rect.left, width: rect.width }};
        "#
    );

    match document::eval(&js_measure).await {
        Ok(value) => match serde_json::from_value::<Option<MeasuredTrack>>(value) {
            Ok(measured) => measured.map(|m| TrackGeometry::new(m.left, m.width)),
            Err(e) => {
                warn!("Failed to parse progress track bounds: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to measure progress track: {}", e);
            None
        }
    }
}

/// Release the scrub, if one is in progress
fn end_drag(mut pressed: Signal<bool>, handle: &PlayerHandle) {
    if pressed() {
        pressed.set(false);
        log_send_error(handle.drag_end());
    }
}

/// Elapsed and total time around a track that seeks on click and scrubs on drag.
#[component]
pub fn ProgressBar() -> Element {
    let engine = use_context::<EngineThread>();
    let view = use_context::<PlayerView>();

    // Bounds from the last measurement, reused while scrubbing
    let mut geometry = use_signal(|| None::<TrackGeometry>);
    let mut pressed = use_signal(|| false);

    let handle = engine.handle().clone();
    let on_click = move |evt: MouseEvent| {
        let x = evt.client_coordinates().x;
        let handle = handle.clone();
        spawn(async move {
            if let Some(track) = measure_track().await {
                geometry.set(Some(track));
                log_send_error(handle.click_seek(x, track));
            }
        });
    };

    let handle = engine.handle().clone();
    let on_mouse_down = move |evt: MouseEvent| {
        let x = evt.client_coordinates().x;
        pressed.set(true);
        log_send_error(handle.drag_start());

        let handle = handle.clone();
        spawn(async move {
            if let Some(track) = measure_track().await {
                geometry.set(Some(track));
                log_send_error(handle.drag_move(x, track));
            }
        });
    };

    let handle = engine.handle().clone();
    let on_mouse_move = move |evt: MouseEvent| {
        if !pressed() {
            return;
        }
        if let Some(track) = geometry() {
            log_send_error(handle.drag_move(evt.client_coordinates().x, track));
        }
    };

    let handle = engine.handle().clone();
    let on_mouse_up = move |_: MouseEvent| end_drag(pressed, &handle);

    let handle = engine.handle().clone();
    let on_mouse_leave = move |_: MouseEvent| end_drag(pressed, &handle);

    let elapsed = view.elapsed_label();
    let total = view.duration_label();
    let percent = view.progress_percent();
    let dragging = view.playback.read().is_dragging;

    rsx! {
        div {
            class: "progress",

            span { class: "progress-time", "{elapsed}" }

            div {
                id: TRACK_ID,
                class: if dragging { "progress-track dragging" } else { "progress-track" },
                onclick: on_click,
                onmousedown: on_mouse_down,
                onmousemove: on_mouse_move,
                onmouseup: on_mouse_up,
                onmouseleave: on_mouse_leave,

                div {
                    class: "progress-fill",
                    style: "width: {percent}%;",
                }
                div {
                    class: "progress-thumb",
                    style: "left: {percent}%;",
                }
            }

            span { class: "progress-time", "{total}" }
        }
    }
}
