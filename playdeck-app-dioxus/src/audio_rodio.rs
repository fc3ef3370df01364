//! `rodio`-backed audio output.

use playdeck_core::{AudioError, AudioOutput};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const LOG_TARGET: &str = "playdeck::audio";

/// Plays one audio file through the default output device.
///
/// Owns the device stream, so it must stay on the thread that opened it.
pub struct RodioOutput {
    path: PathBuf,
    sink: Sink,
    // Dropping the stream silences the sink
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    released: bool,
}

impl RodioOutput {
    /// Open the default device and queue `path`, paused at the start.
    ///
    /// # Errors
    ///
    /// Returns an error if no output device is available or the file cannot
    /// be opened or decoded.
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::DeviceUnavailable {
                reason: e.to_string(),
            })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| AudioError::DeviceUnavailable {
            reason: e.to_string(),
        })?;
        sink.pause();
        sink.append(decode(path)?);

        info!(target: LOG_TARGET, "Opened audio source {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            sink,
            _stream: stream,
            _stream_handle: stream_handle,
            released: false,
        })
    }

    /// Queue the file again once the previous pass has played out
    fn reload_if_drained(&self) -> Result<(), AudioError> {
        if self.sink.empty() {
            debug!(target: LOG_TARGET, "Source drained, reloading {}", self.path.display());
            self.sink.append(decode(&self.path)?);
        }
        Ok(())
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.released {
            return Err(AudioError::Released);
        }
        self.reload_if_drained()
            .map_err(|e| AudioError::StartFailed {
                reason: e.to_string(),
            })?;
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        if !self.released {
            self.sink.pause();
        }
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        if self.released {
            return Err(AudioError::Released);
        }
        self.reload_if_drained()?;
        self.sink
            .try_seek(position)
            .map_err(|e| AudioError::SeekFailed {
                position,
                reason: e.to_string(),
            })
    }

    fn position(&self) -> Option<Duration> {
        if self.released || self.sink.empty() {
            None
        } else {
            Some(self.sink.get_pos())
        }
    }

    fn is_finished(&self) -> bool {
        !self.released && self.sink.empty()
    }

    fn release(&mut self) {
        if !self.released {
            self.sink.stop();
            self.released = true;
            info!(target: LOG_TARGET, "Released audio device");
        }
    }
}

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
    let source_error = |reason: String| AudioError::SourceUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| source_error(e.to_string()))?;
    Decoder::new(BufReader::new(file)).map_err(|e| source_error(e.to_string()))
}
