//! Dedicated thread that owns the audio device and runs the player engine.

use crate::audio_rodio::RodioOutput;
use playdeck_core::{
    AudioOutput, BeforeFirstLine, EngineMailbox, Lyrics, PlaybackClock, Player, PlayerEngine,
    PlayerHandle, SilentOutput, TrackInfo,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::{error, info, warn};

const LOG_TARGET: &str = "playdeck::engine_thread";

/// Everything the engine thread needs to build its player
pub struct EngineSetup {
    pub track: TrackInfo,
    pub lyrics: Lyrics,
    pub policy: BeforeFirstLine,
    pub clock: PlaybackClock,
}

/// Shared owner of the running engine thread.
///
/// Cloned into the UI context so that unmounting the view can stop the
/// engine and wait for the audio device to be released.
#[derive(Clone)]
pub struct EngineThread {
    handle: PlayerHandle,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl EngineThread {
    /// Spawn the engine thread.
    ///
    /// The audio output is opened on the new thread because the device
    /// stream cannot move between threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn(
        setup: EngineSetup,
        handle: PlayerHandle,
        mailbox: EngineMailbox,
    ) -> std::io::Result<Self> {
        let thread = std::thread::Builder::new()
            .name("playdeck-engine".to_string())
            .spawn(move || run_engine(setup, mailbox))?;

        Ok(Self {
            handle,
            thread: Arc::new(Mutex::new(Some(thread))),
        })
    }

    #[must_use]
    pub const fn handle(&self) -> &PlayerHandle {
        &self.handle
    }

    /// Stop the engine and wait for it to release the audio device.
    /// Safe to call more than once.
    pub fn stop(&self) {
        self.handle.shutdown();

        let thread = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!(target: LOG_TARGET, "Player engine thread panicked");
            } else {
                info!(target: LOG_TARGET, "Player engine thread stopped");
            }
        }
    }
}

fn run_engine(setup: EngineSetup, mailbox: EngineMailbox) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(target: LOG_TARGET, "Failed to create engine runtime: {e}");
            return;
        }
    };

    let audio = open_audio(&setup.track);
    let player = Player::new(setup.track, setup.lyrics, setup.policy, setup.clock, audio);

    runtime.block_on(PlayerEngine::new(player, mailbox).run());
}

/// Open the track's audio file, falling back to a silent output so the
/// lyrics and controls keep working without sound
fn open_audio(track: &TrackInfo) -> Box<dyn AudioOutput> {
    match RodioOutput::open(&track.audio_path) {
        Ok(output) => Box::new(output),
        Err(e) => {
            warn!(target: LOG_TARGET, "{e}; continuing without sound");
            Box::new(SilentOutput::new())
        }
    }
}
