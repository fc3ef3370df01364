pub mod audio;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod lyrics;
pub mod paths;
pub mod playback;
pub mod player;
pub mod seek;
pub mod time;

pub use audio::{AudioOutput, PositionFeed, SilentOutput};
pub use clock::{PlaybackClock, DEFAULT_TICK_INTERVAL};
pub use config::{
    LoggingConfig, LyricEntry, PlaybackConfig, PlaydeckConfig, TrackConfig, CONFIG_TEMPLATE,
};
pub use engine::{EngineMailbox, PlayerEngine, PlayerHandle};
pub use error::{AudioError, CoreError};
pub use event::{PlayerCommand, PlayerEvent};
pub use lyrics::{BeforeFirstLine, LyricLine, LyricSync, Lyrics, LyricsMetadata};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::{PlayState, PlaybackState, TrackInfo};
pub use player::Player;
pub use seek::{seek_fraction, seek_time, TrackGeometry};
pub use time::DurationExt;

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
