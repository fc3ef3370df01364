use crate::audio::{AudioOutput, PositionFeed};
use crate::error::{CoreError, Result};
use crate::event::{PlayerCommand, PlayerEvent};
use crate::playback::PlaybackState;
use crate::player::Player;
use crate::seek::TrackGeometry;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const LOG_TARGET: &str = "playdeck::engine";

/// Buffered events per subscriber before it starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Cloneable handle for talking to a running [`PlayerEngine`].
///
/// Commands are queued and applied by the engine one at a time, so callers
/// never observe a half-applied update.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
    state: watch::Receiver<PlaybackState>,
    cancel_token: CancellationToken,
}

/// Engine side of the channels created by [`PlayerHandle::new`].
///
/// Everything in here is `Send`, so the handle can be created on one thread
/// and the engine built around a thread-bound audio output on another.
#[derive(Debug)]
pub struct EngineMailbox {
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
    state: watch::Sender<PlaybackState>,
    cancel_token: CancellationToken,
}

impl PlayerHandle {
    /// Create a handle and the mailbox for the engine it will drive.
    ///
    /// # Arguments
    /// * `initial` - State to report until the engine publishes its own
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    #[must_use]
    pub fn new(
        initial: PlaybackState,
        cancel_token: Option<CancellationToken>,
    ) -> (Self, EngineMailbox) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(initial);
        let cancel_token = cancel_token.unwrap_or_default();

        let handle = Self {
            commands: command_tx,
            events: event_tx.clone(),
            state: state_rx,
            cancel_token: cancel_token.clone(),
        };
        let mailbox = EngineMailbox {
            commands: command_rx,
            events: event_tx,
            state: state_tx,
            cancel_token,
        };
        (handle, mailbox)
    }

    /// Subscribe to player events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Latest published state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// Watch the published state for changes
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    /// Queue a command for the engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::EngineStopped)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn toggle_play(&self) -> Result<()> {
        self.send(PlayerCommand::TogglePlay)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn click_seek(&self, x: f64, track: TrackGeometry) -> Result<()> {
        self.send(PlayerCommand::ClickSeek { x, track })
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn drag_start(&self) -> Result<()> {
        self.send(PlayerCommand::DragStart)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn drag_move(&self, x: f64, track: TrackGeometry) -> Result<()> {
        self.send(PlayerCommand::DragMove { x, track })
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn drag_end(&self) -> Result<()> {
        self.send(PlayerCommand::DragEnd)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn toggle_like(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleLike)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleShuffle)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn toggle_repeat(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleRepeat)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn share(&self) -> Result<()> {
        self.send(PlayerCommand::Share)
    }

    /// Feed an authoritative position from an external audio source.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EngineStopped`] if the engine has exited.
    pub fn report_position(&self, position: Duration) -> Result<()> {
        self.send(PlayerCommand::AudioPosition(position))
    }

    /// Signal the engine to tear the player down
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Get the cancellation token shared with the engine
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Actor that owns a [`Player`] and serializes every mutation.
///
/// The engine multiplexes user commands, the playback clock and the audio
/// position feed in a single loop. The clock timer only exists while the
/// player is playing and not being dragged. On exit the position feed is
/// detached before the audio output is released.
pub struct PlayerEngine<A: AudioOutput> {
    player: Player<A>,
    mailbox: EngineMailbox,
}

impl<A: AudioOutput> PlayerEngine<A> {
    #[must_use]
    pub const fn new(player: Player<A>, mailbox: EngineMailbox) -> Self {
        Self { player, mailbox }
    }

    /// Run until cancelled, told to shut down, or every handle is dropped.
    pub async fn run(mut self) {
        info!(
            target: LOG_TARGET,
            "Player engine started: {} - {}",
            self.player.track().artist,
            self.player.track().title
        );

        let mut feed = self.player.take_position_feed();
        let mut ticker: Option<Interval> = None;
        self.publish();

        loop {
            self.sync_ticker(&mut ticker);

            tokio::select! {
                () = self.mailbox.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Player engine shutting down gracefully");
                    break;
                }
                command = self.mailbox.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => {
                        info!(target: LOG_TARGET, "Player engine shutting down");
                        break;
                    }
                    Some(command) => self.handle(command),
                },
                () = next_tick(&mut ticker) => self.player.tick(),
                position = next_position(&mut feed) => match position {
                    Some(position) => self.player.apply_audio_position(position),
                    None => {
                        debug!(target: LOG_TARGET, "Audio position feed closed");
                        feed = None;
                    }
                },
            }

            self.publish();
        }

        // Detach position feedback before the output goes away
        drop(feed);
        drop(ticker);
        self.player.release();
        self.publish();
    }

    /// Create or drop the clock timer to match the player state
    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        if self.player.state().clock_should_tick() {
            if ticker.is_none() {
                *ticker = Some(self.player.clock().ticker());
            }
        } else if ticker.take().is_some() {
            debug!(target: LOG_TARGET, "Playback clock stopped");
        }
    }

    fn handle(&mut self, command: PlayerCommand) {
        debug!(target: LOG_TARGET, "Handling {command:?}");

        let result = match command {
            PlayerCommand::TogglePlay => self.player.toggle_play(),
            PlayerCommand::Pause => {
                self.player.pause();
                Ok(())
            }
            PlayerCommand::ClickSeek { x, track } => self.player.click_seek(x, track),
            PlayerCommand::SeekTo(position) => self.player.seek_to(position),
            PlayerCommand::DragStart => {
                self.player.drag_start();
                Ok(())
            }
            PlayerCommand::DragMove { x, track } => self.player.drag_move(x, track),
            PlayerCommand::DragEnd => {
                self.player.drag_end();
                Ok(())
            }
            PlayerCommand::ToggleLike => {
                self.player.toggle_like();
                Ok(())
            }
            PlayerCommand::ToggleShuffle => {
                self.player.toggle_shuffle();
                Ok(())
            }
            PlayerCommand::ToggleRepeat => {
                self.player.toggle_repeat();
                Ok(())
            }
            PlayerCommand::Share => {
                let text = self.player.share();
                info!(target: LOG_TARGET, "Share requested: {text}");
                Ok(())
            }
            PlayerCommand::AudioPosition(position) => {
                self.player.apply_audio_position(position);
                Ok(())
            }
            // Handled by the run loop
            PlayerCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            // Already surfaced as a PlayerEvent::Error by the player
            debug!(target: LOG_TARGET, "Command failed: {e}");
        }
    }

    /// Broadcast pending events, then the new state if it changed
    fn publish(&mut self) {
        for event in self.player.drain_events() {
            // No subscribers is not an error
            let _ = self.mailbox.events.send(event);
        }

        let current = self.player.state();
        self.mailbox.state.send_if_modified(|published| {
            if published == current {
                false
            } else {
                published.clone_from(current);
                true
            }
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_position(feed: &mut Option<PositionFeed>) -> Option<Duration> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingOutput};
    use crate::clock::PlaybackClock;
    use crate::lyrics::{BeforeFirstLine, LyricLine, Lyrics};
    use crate::playback::TrackInfo;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;

    fn start(output: RecordingOutput) -> (PlayerHandle, JoinHandle<()>) {
        let track = TrackInfo::new(
            "Song",
            "Artist",
            "cover.jpg",
            "song.mp3",
            Duration::from_secs(260),
        );
        let lyrics = Lyrics::new([
            LyricLine::new(Duration::from_secs(0), "A"),
            LyricLine::new(Duration::from_secs(5), "B"),
            LyricLine::new(Duration::from_secs(10), "C"),
        ]);
        let player = Player::new(
            track,
            lyrics,
            BeforeFirstLine::LastLine,
            PlaybackClock::default(),
            output,
        );
        let (handle, mailbox) = PlayerHandle::new(player.state().clone(), None);
        let task = tokio::spawn(PlayerEngine::new(player, mailbox).run());
        (handle, task)
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_ticks_while_playing() {
        let (handle, _task) = start(RecordingOutput::new());

        handle.toggle_play().unwrap();
        sleep(Duration::from_millis(1050)).await;

        let state = handle.state();
        assert!(state.is_playing);
        assert_eq!(state.position, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_clock() {
        let (handle, _task) = start(RecordingOutput::new());

        handle.toggle_play().unwrap();
        sleep(Duration::from_millis(550)).await;
        handle.pause().unwrap();
        sleep(Duration::from_secs(2)).await;

        let state = handle.state();
        assert!(!state.is_playing);
        assert_eq!(state.position, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_while_paused_is_noop() {
        let output = RecordingOutput::new();
        let (handle, _task) = start(output.clone());
        let mut rx = handle.subscribe();
        let mut state_rx = handle.state_receiver();

        handle.pause().unwrap();
        sleep(Duration::from_millis(1)).await;

        assert!(rx.try_recv().is_err());
        assert!(!state_rx.has_changed().unwrap());
        assert!(!handle.state().is_playing);
        assert!(output.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_suspended_while_dragging() {
        let (handle, _task) = start(RecordingOutput::new());

        handle.toggle_play().unwrap();
        handle.drag_start().unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.state().position, Duration::ZERO);
        assert!(handle.state().is_dragging);

        handle.drag_end().unwrap();
        sleep(Duration::from_millis(250)).await;
        assert_eq!(handle.state().position, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_seek_broadcasts_events_in_order() {
        let (handle, _task) = start(RecordingOutput::new());
        let mut rx = handle.subscribe();

        handle
            .click_seek(12.5, TrackGeometry::new(0.0, 400.0))
            .unwrap();

        let position = Duration::from_millis(8125);
        assert_eq!(
            rx.recv().await.unwrap(),
            PlayerEvent::PositionChanged { position }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            PlayerEvent::ActiveLineChanged { index: 1 }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            PlayerEvent::SeekOccurred { position }
        );
        assert_eq!(handle.state().lyric_index, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_feed_updates_state() {
        let (output, feed_tx) = RecordingOutput::with_feed();
        let (handle, _task) = start(output);

        feed_tx.send(Duration::from_secs(12)).unwrap();
        sleep(Duration::from_millis(1)).await;

        let state = handle.state();
        assert_eq!(state.position, Duration::from_secs(12));
        assert_eq!(state.lyric_index, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reported_position_updates_state() {
        let (handle, _task) = start(RecordingOutput::new());

        handle.report_position(Duration::from_secs(6)).unwrap();
        sleep(Duration::from_millis(1)).await;

        assert_eq!(handle.state().position, Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_failure_reports_error() {
        let output = RecordingOutput::new();
        output.set_fail_play(true);
        let (handle, _task) = start(output);
        let mut rx = handle.subscribe();

        handle.toggle_play().unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            PlayerEvent::Error { .. }
        ));
        assert!(!handle.state().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_detaches_feed_before_release() {
        let (output, _feed_tx) = RecordingOutput::with_feed();
        let (handle, task) = start(output.clone());
        let mut rx = handle.subscribe();

        handle.toggle_play().unwrap();
        sleep(Duration::from_millis(10)).await;
        handle.shutdown();
        task.await.unwrap();

        assert_eq!(
            output.calls(),
            [Call::Play, Call::Pause, Call::FeedDetached, Call::Release]
        );
        assert!(!handle.state().is_playing);

        let mut saw_stopped = false;
        while let Ok(event) = rx.try_recv() {
            saw_stopped |= event == PlayerEvent::Stopped;
        }
        assert!(saw_stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_stops_engine() {
        let output = RecordingOutput::new();
        let (handle, task) = start(output.clone());

        drop(handle);
        task.await.unwrap();

        assert_eq!(output.calls(), [Call::Release]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_shutdown_fails() {
        let (handle, task) = start(RecordingOutput::new());

        handle.send(PlayerCommand::Shutdown).unwrap();
        task.await.unwrap();

        assert!(matches!(
            handle.toggle_play(),
            Err(CoreError::EngineStopped)
        ));
    }
}
