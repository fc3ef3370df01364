use dioxus::prelude::*;
use playdeck_core::{DurationExt, PlaybackState};

/// View-side mirror of the player, updated by the engine bridge.
#[derive(Clone, Copy)]
pub struct PlayerView {
    /// Latest state snapshot published by the engine
    pub playback: Signal<PlaybackState>,
    /// Text from the most recent share request
    pub share_text: Signal<Option<String>>,
    /// Last audio error, cleared by the next successful start
    pub error: Signal<Option<String>>,
}

impl PlayerView {
    #[must_use]
    pub fn new(initial: PlaybackState) -> Self {
        Self {
            playback: Signal::new(initial),
            share_text: Signal::new(None),
            error: Signal::new(None),
        }
    }

    /// Elapsed time as `m:ss`
    #[must_use]
    pub fn elapsed_label(&self) -> String {
        self.playback.read().position.format_clock()
    }

    /// Total length as `m:ss`
    #[must_use]
    pub fn duration_label(&self) -> String {
        self.playback.read().duration.format_clock()
    }

    /// Progress as a CSS percentage
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.playback.read().progress_fraction() * 100.0
    }
}
