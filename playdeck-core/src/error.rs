use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it with your track details and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Lyrics errors
    #[error("Failed to parse LRC: {reason}")]
    LrcParseError { reason: String },

    // Playback errors
    #[error("Audio output error: {0}")]
    Audio(#[from] AudioError),

    #[error("Player engine is no longer running")]
    EngineStopped,

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failures reported by an [`AudioOutput`](crate::audio::AudioOutput).
///
/// All of these are local and recoverable: the player keeps its previous
/// state and the user can simply try again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("Audio device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("Failed to open audio source {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Playback failed to start: {reason}")]
    StartFailed { reason: String },

    #[error("Seek to {position:?} failed: {reason}")]
    SeekFailed { position: Duration, reason: String },

    #[error("Audio output has already been released")]
    Released,
}

pub type Result<T> = std::result::Result<T, CoreError>;
