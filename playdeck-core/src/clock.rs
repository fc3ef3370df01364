//! Fixed-period playback clock.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Default tick period, also used as the per-tick increment
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Advances the playback position on a fixed schedule when no audio output
/// reports an authoritative position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    interval: Duration,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl PlaybackClock {
    /// Clock that moves the position by one tick period per tick.
    ///
    /// A zero period is bumped to one millisecond so the timer never spins.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Position after one tick.
    ///
    /// Passing the end of the track loops back to the start instead of
    /// pausing.
    #[must_use]
    pub fn advance(&self, position: Duration, duration: Duration) -> Duration {
        let next = position.saturating_add(self.interval);
        if next > duration {
            Duration::ZERO
        } else {
            next
        }
    }

    /// Timer that fires once per period, first one period from now.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
