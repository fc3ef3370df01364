use crate::clock::PlaybackClock;
use crate::error::{CoreError, Result};
use crate::lyrics::{BeforeFirstLine, LyricLine, Lyrics};
use crate::playback::TrackInfo;
use crate::time::duration_from_secs_f64;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// How far an LRC `[length:]` tag may drift from `duration_secs` before warning
const LENGTH_MISMATCH_TOLERANCE: Duration = Duration::from_secs(1);

/// Default playback clock step in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaydeckConfig {
    pub track: TrackConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The single track shown and played by the app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Album art, any URI the webview can load
    #[serde(default)]
    pub cover_uri: String,
    /// Relative paths are resolved against the config directory
    #[serde(default)]
    pub audio_path: PathBuf,
    #[serde(default)]
    pub duration_secs: f64,
    /// LRC file; takes precedence over inline `lyrics`
    #[serde(default)]
    pub lyrics_path: Option<PathBuf>,
    #[serde(default)]
    pub lyrics: Vec<LyricEntry>,
}

/// One inline lyric line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricEntry {
    /// Seconds from the start of the track
    pub time: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub before_first_line: BeforeFirstLine,
}

const fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            before_first_line: BeforeFirstLine::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `~/.config/playdeck/playdeck.log`
    #[serde(default)]
    pub enabled: bool,
}

impl PlaydeckConfig {
    /// Get the configuration directory path (~/.config/playdeck/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/playdeck/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template on
    /// first run, or an error if the file cannot be read or parsed.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from a TOML string
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] on TOML syntax or type errors.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Collect every required field that is missing or empty
    ///
    /// Title and artist may be left blank when an LRC file is set; its
    /// `[ti:]` and `[ar:]` tags fill them in.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let tags_available = self.track.lyrics_path.is_some();

        if self.track.title.trim().is_empty() && !tags_available {
            missing.push("track.title".to_string());
        }
        if self.track.artist.trim().is_empty() && !tags_available {
            missing.push("track.artist".to_string());
        }
        if self.track.audio_path.as_os_str().is_empty() {
            missing.push("track.audio_path".to_string());
        }
        if !(self.track.duration_secs.is_finite() && self.track.duration_secs > 0.0) {
            missing.push("track.duration_secs".to_string());
        }

        missing
    }

    /// Check required fields and value ranges
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigMissingField`] for the first missing field,
    /// or [`CoreError::ConfigInvalid`] for an out-of-range value.
    pub fn validate(&self) -> Result<()> {
        if let Some(field) = self.missing_fields().into_iter().next() {
            return Err(CoreError::ConfigMissingField { field });
        }
        if Duration::try_from_secs_f64(self.track.duration_secs).is_err() {
            return Err(CoreError::ConfigInvalid {
                message: "track.duration_secs is too large".to_string(),
            });
        }
        if self.playback.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "playback.tick_interval_ms must be greater than 0".to_string(),
            });
        }
        if let Some(entry) = self
            .track
            .lyrics
            .iter()
            .find(|entry| !entry.time.is_finite() || entry.time < 0.0)
        {
            return Err(CoreError::ConfigInvalid {
                message: format!("track.lyrics entry {:?} has a negative time", entry.text),
            });
        }
        Ok(())
    }

    /// Track length
    #[must_use]
    pub fn duration(&self) -> Duration {
        duration_from_secs_f64(self.track.duration_secs)
    }

    /// Build the track description, resolving the audio path against `base_dir`
    ///
    /// Blank title and artist fields are taken from the lyrics' ID tags.
    #[must_use]
    pub fn track_info(&self, base_dir: &Path, lyrics: &Lyrics) -> TrackInfo {
        let metadata = lyrics.metadata();
        let duration = self.duration();

        if let Some(length) = metadata.length {
            if length.max(duration) - length.min(duration) > LENGTH_MISMATCH_TOLERANCE {
                warn!("Lyrics length {length:?} does not match track.duration_secs {duration:?}");
            }
        }

        TrackInfo::new(
            fill_blank(&self.track.title, metadata.title.as_deref()),
            fill_blank(&self.track.artist, metadata.artist.as_deref()),
            self.track.cover_uri.clone(),
            resolve_path(base_dir, &self.track.audio_path),
            duration,
        )
    }

    /// Load lyrics from `lyrics_path` if set, otherwise from the inline lines
    ///
    /// # Errors
    ///
    /// Returns an error if the LRC file cannot be read or contains no timed lines.
    pub fn load_lyrics(&self, base_dir: &Path) -> Result<Lyrics> {
        if let Some(path) = &self.track.lyrics_path {
            let path = resolve_path(base_dir, path);
            let content = fs::read_to_string(&path)?;
            return Lyrics::parse_lrc(&content);
        }

        Ok(Lyrics::new(self.track.lyrics.iter().map(|entry| {
            LyricLine::new(duration_from_secs_f64(entry.time), entry.text.clone())
        })))
    }

    /// Playback clock with the configured step
    #[must_use]
    pub fn clock(&self) -> PlaybackClock {
        PlaybackClock::new(Duration::from_millis(self.playback.tick_interval_ms))
    }
}

fn fill_blank(configured: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) if configured.trim().is_empty() => tag.to_string(),
        _ => configured.to_string(),
    }
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Template written on first run
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# Playdeck Configuration
# ~/.config/playdeck/config.toml

[track]
# Required
title = ""
artist = ""
# Audio file to play; relative paths are resolved against this directory
audio_path = ""
# Track length in seconds
duration_secs = 0
# Album art: an https:// URL or a file:// URI
cover_uri = ""
# Optional: LRC file with time-synced lyrics (takes precedence over inline lines)
# lyrics_path = "lyrics.lrc"

# Inline lyric lines, in seconds from the start of the track
# [[track.lyrics]]
# time = 0.0
# text = "First line"
#
# [[track.lyrics]]
# time = 4.5
# text = "Second line"

[playback]
# Clock step used while the audio output does not report its own position
tick_interval_ms = "#,
    DEFAULT_TICK_INTERVAL_MS,
    r#"
# Line highlighted before the first timestamp: "last_line" or "first_line"
before_first_line = "last_line"

[logging]
# Also write logs to ~/.config/playdeck/playdeck.log
enabled = false
"#
);
