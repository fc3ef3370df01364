//! Time and duration conversion utilities.
//!
//! Playback positions are carried as [`Duration`] everywhere in the crate;
//! these helpers convert at the edges (config floats, UI labels) with
//! explicit saturation instead of panicking casts.

use std::time::Duration;

/// Extension trait for Duration display.
pub trait DurationExt {
    /// Format as a `m:ss` clock label, e.g. `4:20` for 260 seconds.
    ///
    /// Fractional seconds are truncated; minutes are not wrapped into hours.
    fn format_clock(&self) -> String;
}

impl DurationExt for Duration {
    fn format_clock(&self) -> String {
        let secs = self.as_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// Build a duration from fractional seconds.
///
/// Negative and NaN inputs map to zero, values too large to represent
/// saturate at [`Duration::MAX`].
#[must_use]
pub fn duration_from_secs_f64(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(Duration::ZERO.format_clock(), "0:00");
        assert_eq!(Duration::from_secs(260).format_clock(), "4:20");
        assert_eq!(Duration::from_millis(65_900).format_clock(), "1:05");
        assert_eq!(Duration::from_secs(3725).format_clock(), "62:05");
    }

    #[test]
    fn test_duration_from_secs_f64() {
        assert_eq!(duration_from_secs_f64(1.5), Duration::from_millis(1500));
        assert_eq!(duration_from_secs_f64(0.0), Duration::ZERO);
    }

    #[test]
    fn test_duration_from_secs_f64_invalid_inputs() {
        assert_eq!(duration_from_secs_f64(-3.0), Duration::ZERO);
        assert_eq!(duration_from_secs_f64(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs_f64(f64::INFINITY), Duration::MAX);
    }
}
