//! Audio output abstraction.

use crate::error::AudioError;
use std::time::Duration;
use tokio::sync::mpsc;

/// Push-style position notifications from an audio output
pub type PositionFeed = mpsc::UnboundedReceiver<Duration>;

/// A single playable audio resource owned by one player.
///
/// The player treats the output as opaque: it does not decode anything, it
/// only starts, pauses and repositions it. Implementations are not required
/// to be `Send`, so that device handles bound to one thread can be used.
///
/// Implementations should:
///
/// - Make `pause` and `release` infallible and idempotent
/// - Report the device position from `position` when they know it, which
///   makes it the source of truth over the fixed-step clock
/// - Fail every call after `release` with [`AudioError::Released`]
pub trait AudioOutput {
    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot start playing.
    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Move the playback position.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be repositioned.
    fn seek(&mut self, position: Duration) -> Result<(), AudioError>;

    /// Current device position, if the output tracks one.
    fn position(&self) -> Option<Duration> {
        None
    }

    /// Whether the source has played through to its end.
    fn is_finished(&self) -> bool {
        false
    }

    /// Hand over the position-changed notification stream, at most once.
    fn take_position_feed(&mut self) -> Option<PositionFeed> {
        None
    }

    /// Stop playback and free the underlying device.
    fn release(&mut self);
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn play(&mut self) -> Result<(), AudioError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        (**self).seek(position)
    }

    fn position(&self) -> Option<Duration> {
        (**self).position()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn take_position_feed(&mut self) -> Option<PositionFeed> {
        (**self).take_position_feed()
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// Output with no device behind it.
///
/// Accepts every call and reports no position, so the playback clock drives
/// the view on its own. Used when the audio file or device is unavailable.
#[derive(Debug, Default)]
pub struct SilentOutput {
    released: bool,
}

impl SilentOutput {
    #[must_use]
    pub const fn new() -> Self {
        Self { released: false }
    }
}

impl AudioOutput for SilentOutput {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.released {
            return Err(AudioError::Released);
        }
        Ok(())
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: Duration) -> Result<(), AudioError> {
        if self.released {
            return Err(AudioError::Released);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{AudioOutput, PositionFeed};
    use crate::error::AudioError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Calls observed by a [`RecordingOutput`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Play,
        Pause,
        Seek(Duration),
        FeedDetached,
        Release,
    }

    #[derive(Debug, Default)]
    pub struct Recorder {
        pub calls: Vec<Call>,
        pub fail_play: bool,
        pub fail_seek: bool,
        pub position: Option<Duration>,
    }

    /// Test double that records calls and can be told to fail.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingOutput {
        pub recorder: Arc<Mutex<Recorder>>,
        feed: Arc<Mutex<Option<PositionFeed>>>,
        feed_tx: Option<mpsc::UnboundedSender<Duration>>,
    }

    impl RecordingOutput {
        pub fn new() -> Self {
            Self::default()
        }

        /// Output that pushes positions through a feed, plus its sender
        pub fn with_feed() -> (Self, mpsc::UnboundedSender<Duration>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let output = Self {
                feed: Arc::new(Mutex::new(Some(rx))),
                feed_tx: Some(tx.clone()),
                ..Self::default()
            };
            (output, tx)
        }

        pub fn calls(&self) -> Vec<Call> {
            self.recorder.lock().unwrap().calls.clone()
        }

        pub fn set_fail_play(&self, fail: bool) {
            self.recorder.lock().unwrap().fail_play = fail;
        }

        pub fn set_fail_seek(&self, fail: bool) {
            self.recorder.lock().unwrap().fail_seek = fail;
        }

        pub fn set_position(&self, position: Option<Duration>) {
            self.recorder.lock().unwrap().position = position;
        }

        fn record(&self, call: Call) {
            self.recorder.lock().unwrap().calls.push(call);
        }
    }

    impl AudioOutput for RecordingOutput {
        fn play(&mut self) -> Result<(), AudioError> {
            if self.recorder.lock().unwrap().fail_play {
                return Err(AudioError::StartFailed {
                    reason: "device busy".to_string(),
                });
            }
            self.record(Call::Play);
            Ok(())
        }

        fn pause(&mut self) {
            self.record(Call::Pause);
        }

        fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
            if self.recorder.lock().unwrap().fail_seek {
                return Err(AudioError::SeekFailed {
                    position,
                    reason: "not seekable".to_string(),
                });
            }
            self.record(Call::Seek(position));
            Ok(())
        }

        fn position(&self) -> Option<Duration> {
            self.recorder.lock().unwrap().position
        }

        fn take_position_feed(&mut self) -> Option<PositionFeed> {
            self.feed.lock().unwrap().take()
        }

        fn release(&mut self) {
            if let Some(tx) = self.feed_tx.take() {
                if tx.is_closed() {
                    self.record(Call::FeedDetached);
                }
            }
            self.record(Call::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_output_accepts_calls() {
        let mut output = SilentOutput::new();
        assert!(output.play().is_ok());
        output.pause();
        assert!(output.seek(Duration::from_secs(3)).is_ok());
        assert_eq!(output.position(), None);
        assert!(output.take_position_feed().is_none());
        assert!(output.play().is_ok());
    }

    #[test]
    fn test_silent_output_rejects_after_release() {
        let mut output = SilentOutput::new();
        output.play().unwrap();
        output.release();

        assert_eq!(output.play(), Err(AudioError::Released));
        assert_eq!(output.seek(Duration::ZERO), Err(AudioError::Released));

        // Releasing twice is harmless
        output.release();
    }

    #[test]
    fn test_boxed_output_delegates() {
        let mut output: Box<dyn AudioOutput> = Box::new(SilentOutput::new());
        assert!(output.play().is_ok());
        output.release();
        assert_eq!(output.play(), Err(AudioError::Released));
    }
}
