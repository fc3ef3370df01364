//! Pointer-to-time math for the progress track.

use std::time::Duration;

/// Horizontal extent of the progress track in the same coordinate space as
/// the pointer (usually client pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGeometry {
    pub left: f64,
    pub width: f64,
}

impl TrackGeometry {
    #[must_use]
    pub const fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

/// Fraction of the track under the pointer, clamped to `[0, 1]`.
///
/// A degenerate track (zero, negative or non-finite width) and a non-finite
/// pointer both map to the start.
#[must_use]
pub fn seek_fraction(x: f64, track: TrackGeometry) -> f64 {
    if !x.is_finite() || !track.left.is_finite() || !track.width.is_finite() || track.width <= 0.0
    {
        return 0.0;
    }
    ((x - track.left) / track.width).clamp(0.0, 1.0)
}

/// Track time under the pointer, never past `duration`
#[must_use]
pub fn seek_time(x: f64, track: TrackGeometry, duration: Duration) -> Duration {
    Duration::try_from_secs_f64(seek_fraction(x, track) * duration.as_secs_f64())
        .map_or(duration, |time| time.min(duration))
}
