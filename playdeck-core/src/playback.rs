use std::path::PathBuf;
use std::time::Duration;

/// Transport state of the player.
///
/// There is no terminal state: tearing the view down forces `Paused` and
/// releases the audio output, but that is cleanup rather than a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Paused,
    Playing,
}

/// Everything the view needs to render the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    /// Whether audio is playing and the clock is running
    pub is_playing: bool,
    /// Elapsed time, always within `[0, duration]`
    pub position: Duration,
    /// Active lyric line (None only when the track has no lyrics)
    pub lyric_index: Option<usize>,
    /// True while the user is scrubbing the progress bar
    pub is_dragging: bool,
    pub is_liked: bool,
    pub is_shuffle: bool,
    pub is_repeat: bool,
    /// Total track duration, fixed for the loaded track
    pub duration: Duration,
}

impl PlaybackState {
    /// State at mount: paused at the start of the track
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            is_playing: false,
            position: Duration::ZERO,
            lyric_index: None,
            is_dragging: false,
            is_liked: false,
            is_shuffle: false,
            is_repeat: false,
            duration,
        }
    }

    #[must_use]
    pub const fn play_state(&self) -> PlayState {
        if self.is_playing {
            PlayState::Playing
        } else {
            PlayState::Paused
        }
    }

    /// Whether the playback clock may advance the position
    #[must_use]
    pub const fn clock_should_tick(&self) -> bool {
        self.is_playing && !self.is_dragging
    }

    /// Position as a fraction of the duration, for drawing the progress bar
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Static description of the loaded track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    /// Album art, anything an `<img src>` accepts
    pub cover_uri: String,
    /// Audio file handed to the audio output
    pub audio_path: PathBuf,
    pub duration: Duration,
}

impl TrackInfo {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        cover_uri: impl Into<String>,
        audio_path: impl Into<PathBuf>,
        duration: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            cover_uri: cover_uri.into(),
            audio_path: audio_path.into(),
            duration,
        }
    }
}
