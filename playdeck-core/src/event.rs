use crate::seek::TrackGeometry;
use std::time::Duration;

/// Events emitted by the player engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback started or resumed
    PlaybackStarted { position: Duration },
    /// Playback was paused
    PlaybackPaused { position: Duration },
    /// The position moved (clock tick, audio feedback, seek or wrap)
    PositionChanged { position: Duration },
    /// The user repositioned playback by clicking or dragging
    SeekOccurred { position: Duration },
    /// The user started scrubbing the progress bar
    DragStarted,
    /// The user let go of the progress bar
    DragEnded { position: Duration },
    /// A different lyric line became active; the view should bring it into view
    ActiveLineChanged { index: usize },
    LikeChanged { liked: bool },
    ShuffleChanged { shuffle: bool },
    RepeatChanged { repeat: bool },
    /// The user asked to share what is playing
    ShareRequested { text: String },
    /// The audio output failed; state was left as it was
    Error { message: String },
    /// The player was torn down and its audio released
    Stopped,
}

/// User intents and external updates handled by the player engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    TogglePlay,
    Pause,
    /// Click on the progress track at pointer `x`
    ClickSeek { x: f64, track: TrackGeometry },
    /// Jump straight to a position
    SeekTo(Duration),
    DragStart,
    /// Pointer moved while the button is held
    DragMove { x: f64, track: TrackGeometry },
    /// Pointer released or left the track
    DragEnd,
    ToggleLike,
    ToggleShuffle,
    ToggleRepeat,
    Share,
    /// Authoritative position reported by the audio source
    AudioPosition(Duration),
    /// Tear the player down
    Shutdown,
}
