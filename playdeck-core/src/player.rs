use crate::audio::{AudioOutput, PositionFeed};
use crate::clock::PlaybackClock;
use crate::error::AudioError;
use crate::event::PlayerEvent;
use crate::lyrics::{BeforeFirstLine, LyricSync, Lyrics};
use crate::playback::{PlaybackState, TrackInfo};
use crate::seek::{seek_time, TrackGeometry};
use crate::time::DurationExt;
use std::mem;
use std::time::Duration;
use tracing::{debug, warn};

const LOG_TARGET: &str = "playdeck::player";

/// Player state machine bound to one audio output.
///
/// All mutations are synchronous. Each call records the events it caused;
/// the owner drains them with [`Player::drain_events`] after every call. The
/// lyric index is always recomputed in the same call that moved the position.
///
/// The audio output is released exactly once, either through
/// [`Player::release`] or when the player is dropped.
pub struct Player<A: AudioOutput> {
    track: TrackInfo,
    state: PlaybackState,
    sync: LyricSync,
    clock: PlaybackClock,
    audio: A,
    released: bool,
    events: Vec<PlayerEvent>,
}

impl<A: AudioOutput> Player<A> {
    /// Mount a player paused at the start of `track`
    pub fn new(
        track: TrackInfo,
        lyrics: Lyrics,
        policy: BeforeFirstLine,
        clock: PlaybackClock,
        audio: A,
    ) -> Self {
        let sync = LyricSync::new(lyrics, policy);
        let mut state = PlaybackState::new(track.duration);
        state.lyric_index = sync.current();

        Self {
            track,
            state,
            sync,
            clock,
            audio,
            released: false,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub const fn track(&self) -> &TrackInfo {
        &self.track
    }

    #[must_use]
    pub const fn lyrics(&self) -> &Lyrics {
        self.sync.lyrics()
    }

    #[must_use]
    pub const fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        mem::take(&mut self.events)
    }

    /// Take the audio output's position notifications, if it has any
    pub fn take_position_feed(&mut self) -> Option<PositionFeed> {
        self.audio.take_position_feed()
    }

    /// Flip between playing and paused.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio output fails to start; the player stays
    /// paused.
    pub fn toggle_play(&mut self) -> Result<(), AudioError> {
        if self.state.is_playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Start playback. Does nothing if already playing.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio output fails to start or was released.
    pub fn play(&mut self) -> Result<(), AudioError> {
        if self.state.is_playing {
            return Ok(());
        }
        if self.released {
            return self.fail(AudioError::Released);
        }
        if let Err(e) = self.audio.play() {
            return self.fail(e);
        }

        self.state.is_playing = true;
        self.emit(PlayerEvent::PlaybackStarted {
            position: self.state.position,
        });
        Ok(())
    }

    /// Pause playback. Does nothing if already paused.
    pub fn pause(&mut self) {
        if !self.state.is_playing {
            return;
        }
        self.audio.pause();
        self.state.is_playing = false;
        self.emit(PlayerEvent::PlaybackPaused {
            position: self.state.position,
        });
    }

    /// One clock period elapsed.
    ///
    /// Ignored unless playing and not dragging. When the audio output knows
    /// its own position that position wins over the fixed increment.
    pub fn tick(&mut self) {
        if self.released || !self.state.clock_should_tick() {
            return;
        }

        if self.audio.is_finished() {
            self.wrap_to_start();
        } else if let Some(position) = self.audio.position() {
            self.follow_audio(position);
        } else {
            let next = self.clock.advance(self.state.position, self.state.duration);
            self.set_position(next);
        }
    }

    /// Position reported by the audio source.
    ///
    /// Ignored while the user is dragging, since the pointer owns the position
    /// then.
    pub fn apply_audio_position(&mut self, position: Duration) {
        if self.released || self.state.is_dragging {
            return;
        }
        self.follow_audio(position);
    }

    /// Jump to `position`, clamped to the track.
    ///
    /// # Errors
    ///
    /// Returns an error if the audio output cannot seek; position and lyric
    /// line are left unchanged.
    pub fn seek_to(&mut self, position: Duration) -> Result<(), AudioError> {
        if self.released {
            return self.fail(AudioError::Released);
        }

        let position = position.min(self.state.duration);
        if let Err(e) = self.audio.seek(position) {
            return self.fail(e);
        }

        self.set_position(position);
        self.emit(PlayerEvent::SeekOccurred { position });
        Ok(())
    }

    /// Click on the progress track.
    ///
    /// # Errors
    ///
    /// See [`Player::seek_to`].
    pub fn click_seek(&mut self, x: f64, track: TrackGeometry) -> Result<(), AudioError> {
        self.seek_to(seek_time(x, track, self.state.duration))
    }

    /// Pointer pressed on the progress track
    pub fn drag_start(&mut self) {
        if self.released || self.state.is_dragging {
            return;
        }
        self.state.is_dragging = true;
        self.emit(PlayerEvent::DragStarted);
    }

    /// Pointer moved; only applies while a drag is in progress.
    ///
    /// # Errors
    ///
    /// See [`Player::seek_to`].
    pub fn drag_move(&mut self, x: f64, track: TrackGeometry) -> Result<(), AudioError> {
        if !self.state.is_dragging {
            return Ok(());
        }
        self.seek_to(seek_time(x, track, self.state.duration))
    }

    /// Pointer released or left the track
    pub fn drag_end(&mut self) {
        if !self.state.is_dragging {
            return;
        }
        self.state.is_dragging = false;
        self.emit(PlayerEvent::DragEnded {
            position: self.state.position,
        });
    }

    pub fn toggle_like(&mut self) {
        self.state.is_liked = !self.state.is_liked;
        self.emit(PlayerEvent::LikeChanged {
            liked: self.state.is_liked,
        });
    }

    pub fn toggle_shuffle(&mut self) {
        self.state.is_shuffle = !self.state.is_shuffle;
        self.emit(PlayerEvent::ShuffleChanged {
            shuffle: self.state.is_shuffle,
        });
    }

    pub fn toggle_repeat(&mut self) {
        self.state.is_repeat = !self.state.is_repeat;
        self.emit(PlayerEvent::RepeatChanged {
            repeat: self.state.is_repeat,
        });
    }

    /// Build the share text for what is playing, e.g. `Song by Artist @ 1:05`
    pub fn share(&mut self) -> String {
        let text = format!(
            "{} by {} @ {}",
            self.track.title,
            self.track.artist,
            self.state.position.format_clock()
        );
        self.emit(PlayerEvent::ShareRequested { text: text.clone() });
        text
    }

    /// Stop playback and release the audio output.
    ///
    /// Safe to call more than once; only the first call has an effect.
    pub fn release(&mut self) {
        if self.released {
            return;
        }

        self.pause();
        self.state.is_dragging = false;
        self.audio.release();
        self.released = true;

        debug!(target: LOG_TARGET, "Audio output released");
        self.emit(PlayerEvent::Stopped);
    }

    fn follow_audio(&mut self, position: Duration) {
        let duration = self.state.duration;
        if self.state.is_playing && !duration.is_zero() && position >= duration {
            self.wrap_to_start();
        } else {
            self.set_position(position);
        }
    }

    /// Loop back to the start, keeping the audio in step
    fn wrap_to_start(&mut self) {
        if let Err(e) = self.audio.seek(Duration::ZERO) {
            warn!(target: LOG_TARGET, "Failed to rewind audio at end of track: {e}");
            self.emit(PlayerEvent::Error {
                message: e.to_string(),
            });
        }
        self.set_position(Duration::ZERO);
    }

    fn set_position(&mut self, position: Duration) {
        let position = position.min(self.state.duration);
        if position != self.state.position {
            self.state.position = position;
            self.emit(PlayerEvent::PositionChanged { position });
        }

        if let Some(index) = self.sync.update(position) {
            self.state.lyric_index = Some(index);
            self.emit(PlayerEvent::ActiveLineChanged { index });
        }
    }

    fn fail(&mut self, err: AudioError) -> Result<(), AudioError> {
        warn!(target: LOG_TARGET, "Audio output error: {err}");
        self.emit(PlayerEvent::Error {
            message: err.to_string(),
        });
        Err(err)
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.events.push(event);
    }
}

impl<A: AudioOutput> Drop for Player<A> {
    fn drop(&mut self) {
        self.release();
    }
}
