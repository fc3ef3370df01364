use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the last line counts as "being sung" when estimating progress
const LAST_LINE_DURATION: Duration = Duration::from_secs(5);

/// A single timestamped lyric line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Offset from the start of the track
    pub time: Duration,
    pub text: String,
}

impl LyricLine {
    pub fn new(time: Duration, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// Which line is active while the position is still before the first timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeforeFirstLine {
    /// Highlight the last line, the way the player always behaved
    #[default]
    LastLine,
    /// Highlight the first line
    FirstLine,
}

/// Metadata from LRC ID tags
///
/// `title` and `artist` fill in blank track fields; `length` is checked
/// against the configured duration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricsMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub length: Option<Duration>,
    pub offset_ms: i64, // can be negative
}

/// Immutable, time-ordered lyric sequence for one track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lyrics {
    lines: Vec<LyricLine>,
    metadata: LyricsMetadata,
}

impl Lyrics {
    /// Build lyrics from lines in any order.
    ///
    /// Lines are stably sorted by time, so lines sharing a timestamp keep
    /// their relative order.
    pub fn new(lines: impl IntoIterator<Item = LyricLine>) -> Self {
        let mut lines: Vec<LyricLine> = lines.into_iter().collect();
        lines.sort_by_key(|line| line.time);
        Self {
            lines,
            metadata: LyricsMetadata::default(),
        }
    }

    /// Parse an LRC document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LrcParseError`] if the input has no timed lines.
    pub fn parse_lrc(input: &str) -> Result<Self> {
        let mut metadata = LyricsMetadata::default();
        let mut lines = Vec::new();

        for raw in input.lines() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            if let Some((tag, value)) = parse_id_tag(raw) {
                match tag.to_ascii_lowercase().as_str() {
                    "ti" => metadata.title = Some(value.to_string()),
                    "ar" => metadata.artist = Some(value.to_string()),
                    "length" => metadata.length = parse_timestamp(value),
                    "offset" => {
                        if let Ok(offset) = value.parse::<i64>() {
                            metadata.offset_ms = offset;
                        }
                    }
                    _ => {}
                }
                continue;
            }

            let (timestamps, text) = split_timestamps(raw);
            if timestamps.is_empty() {
                continue;
            }
            let text = strip_word_timing(text);
            lines.extend(
                timestamps
                    .into_iter()
                    .map(|time| LyricLine::new(time, text.clone())),
            );
        }

        if lines.is_empty() {
            return Err(CoreError::LrcParseError {
                reason: "no timed lyric lines found".to_string(),
            });
        }

        // The offset tag may come after the lines it applies to
        if metadata.offset_ms != 0 {
            for line in &mut lines {
                line.time = apply_offset(line.time, metadata.offset_ms);
            }
        }

        let mut lyrics = Self::new(lines);
        lyrics.metadata = metadata;
        Ok(lyrics)
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub const fn metadata(&self) -> &LyricsMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    /// Index of the line active at `position`.
    ///
    /// This is the greatest `i` with `lines[i].time <= position`. When no line
    /// has started yet, `policy` decides. Returns `None` only for empty lyrics.
    #[must_use]
    pub fn active_index(&self, position: Duration, policy: BeforeFirstLine) -> Option<usize> {
        let started = self.lines.partition_point(|line| line.time <= position);
        match started {
            0 if self.lines.is_empty() => None,
            0 => match policy {
                BeforeFirstLine::LastLine => Some(self.lines.len() - 1),
                BeforeFirstLine::FirstLine => Some(0),
            },
            n => Some(n - 1),
        }
    }

    /// Fraction (0.0 to 1.0) of the line at `index` already elapsed.
    ///
    /// A line ends where the next one starts; the last line is given a fixed
    /// five second window.
    #[must_use]
    pub fn line_progress(&self, index: usize, position: Duration) -> f32 {
        let Some(line) = self.lines.get(index) else {
            return 0.0;
        };
        if position < line.time {
            return 0.0;
        }

        let end = self.lines.get(index + 1).map_or_else(
            || line.time.saturating_add(LAST_LINE_DURATION),
            |next| next.time,
        );
        let span = end.saturating_sub(line.time);
        if span.is_zero() || position >= end {
            return 1.0;
        }

        let elapsed = position.saturating_sub(line.time);
        (elapsed.as_secs_f32() / span.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Tracks the active lyric line and reports each change exactly once.
///
/// This is the pure half of the synchronizer: it never touches the view.
/// Callers turn a reported change into an "active line changed" event and the
/// presentation layer decides how to bring that line into view.
#[derive(Debug, Clone)]
pub struct LyricSync {
    lyrics: Lyrics,
    policy: BeforeFirstLine,
    current: Option<usize>,
}

impl LyricSync {
    /// Start synchronizing at position zero.
    #[must_use]
    pub fn new(lyrics: Lyrics, policy: BeforeFirstLine) -> Self {
        let current = lyrics.active_index(Duration::ZERO, policy);
        Self {
            lyrics,
            policy,
            current,
        }
    }

    #[must_use]
    pub const fn lyrics(&self) -> &Lyrics {
        &self.lyrics
    }

    #[must_use]
    pub const fn policy(&self) -> BeforeFirstLine {
        self.policy
    }

    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    /// Recompute the active line for `position`.
    ///
    /// Returns the new index only if it differs from the previous one.
    pub fn update(&mut self, position: Duration) -> Option<usize> {
        let next = self.lyrics.active_index(position, self.policy);
        if next == self.current {
            return None;
        }
        self.current = next;
        next
    }
}

/// Parse an ID tag like [ti:Title] or [offset:+250]
fn parse_id_tag(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let content = &rest[..end];
    let (tag, value) = content.split_once(':')?;

    // Timestamps like [01:23.45] also contain a colon
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some((tag, value.trim()))
}

/// Split leading `[mm:ss.xx]` timestamps from the lyric text.
fn split_timestamps(line: &str) -> (Vec<Duration>, &str) {
    let mut timestamps = Vec::new();
    let mut remaining = line;

    while let Some(rest) = remaining.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            break;
        };
        let Some(time) = parse_timestamp(&rest[..end]) else {
            break;
        };
        timestamps.push(time);
        remaining = &rest[end + 1..];
    }

    (timestamps, remaining.trim())
}

/// Parse `mm:ss`, `mm:ss.xx` or `mm:ss:xx` (hundredths)
fn parse_timestamp(s: &str) -> Option<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.as_slice() {
        [minutes, seconds] => {
            let minutes = parse_digits(minutes)?;
            Duration::from_secs(minutes.checked_mul(60)?).checked_add(parse_seconds(seconds)?)
        }
        [minutes, seconds, hundredths] => {
            let minutes = parse_digits(minutes)?;
            let seconds = parse_digits(seconds)?;
            let hundredths = parse_digits(hundredths)?;
            let millis = minutes
                .checked_mul(60_000)?
                .checked_add(seconds.checked_mul(1000)?)?
                .checked_add(hundredths.checked_mul(10)?)?;
            Some(Duration::from_millis(millis))
        }
        _ => None,
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse `ss` or `ss.fff`, keeping millisecond precision without going
/// through floating point.
fn parse_seconds(s: &str) -> Option<Duration> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let secs = parse_digits(whole)?;
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut millis = 0;
    let mut scale = 100;
    for digit in frac.bytes().take(3) {
        millis += u64::from(digit - b'0') * scale;
        scale /= 10;
    }

    Duration::from_secs(secs).checked_add(Duration::from_millis(millis))
}

/// Remove enhanced-LRC word timestamps (`<mm:ss.xx>`) from a line.
fn strip_word_timing(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) if parse_timestamp(&tail[1..end]).is_some() => {
                out.push(' ');
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply a millisecond offset to a timestamp (can be negative)
fn apply_offset(time: Duration, offset_ms: i64) -> Duration {
    let offset = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        time.saturating_add(offset)
    } else {
        time.saturating_sub(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Lyrics {
        Lyrics::new([
            LyricLine::new(Duration::from_secs(0), "A"),
            LyricLine::new(Duration::from_secs(5), "B"),
            LyricLine::new(Duration::from_secs(10), "C"),
        ])
    }

    fn late_start() -> Lyrics {
        Lyrics::new([
            LyricLine::new(Duration::from_secs(5), "First"),
            LyricLine::new(Duration::from_secs(10), "Second"),
            LyricLine::new(Duration::from_secs(15), "Third"),
        ])
    }

    #[test]
    fn test_active_index_examples() {
        let lyrics = abc();
        let policy = BeforeFirstLine::default();

        assert_eq!(lyrics.active_index(Duration::from_secs(7), policy), Some(1));
        assert_eq!(lyrics.active_index(Duration::from_secs(10), policy), Some(2));
        assert_eq!(lyrics.active_index(Duration::ZERO, policy), Some(0));
    }

    #[test]
    fn test_active_index_boundaries() {
        let lyrics = abc();
        let policy = BeforeFirstLine::default();

        assert_eq!(lyrics.active_index(Duration::from_millis(4999), policy), Some(0));
        assert_eq!(lyrics.active_index(Duration::from_secs(5), policy), Some(1));
        assert_eq!(lyrics.active_index(Duration::from_secs(500), policy), Some(2));
    }

    #[test]
    fn test_active_index_before_first_line_defaults_to_last() {
        let lyrics = late_start();
        assert_eq!(
            lyrics.active_index(Duration::from_secs(2), BeforeFirstLine::LastLine),
            Some(2)
        );
    }

    #[test]
    fn test_active_index_before_first_line_first_policy() {
        let lyrics = late_start();
        assert_eq!(
            lyrics.active_index(Duration::from_secs(2), BeforeFirstLine::FirstLine),
            Some(0)
        );
        // Policy only matters before the first line
        assert_eq!(
            lyrics.active_index(Duration::from_secs(12), BeforeFirstLine::FirstLine),
            Some(1)
        );
    }

    #[test]
    fn test_active_index_empty_lyrics() {
        let lyrics = Lyrics::default();
        assert_eq!(
            lyrics.active_index(Duration::from_secs(3), BeforeFirstLine::LastLine),
            None
        );
    }

    #[test]
    fn test_active_index_duplicate_timestamps_picks_greatest() {
        let lyrics = Lyrics::new([
            LyricLine::new(Duration::from_secs(0), "A"),
            LyricLine::new(Duration::from_secs(5), "B1"),
            LyricLine::new(Duration::from_secs(5), "B2"),
            LyricLine::new(Duration::from_secs(10), "C"),
        ]);
        assert_eq!(
            lyrics.active_index(Duration::from_secs(5), BeforeFirstLine::LastLine),
            Some(2)
        );
    }

    #[test]
    fn test_active_line_has_started_for_whole_track() {
        let lyrics = abc();
        let mut position = Duration::ZERO;
        while position <= Duration::from_secs(260) {
            let index = lyrics
                .active_index(position, BeforeFirstLine::LastLine)
                .unwrap();
            assert!(lyrics.lines()[index].time <= position);
            position += Duration::from_millis(100);
        }
    }

    #[test]
    fn test_active_index_is_monotonic() {
        let lyrics = abc();
        let mut previous = 0;
        let mut position = Duration::ZERO;
        while position <= Duration::from_secs(20) {
            let index = lyrics
                .active_index(position, BeforeFirstLine::LastLine)
                .unwrap();
            assert!(index >= previous, "index went backwards at {position:?}");
            previous = index;
            position += Duration::from_millis(100);
        }
        assert_eq!(previous, 2);
    }

    #[test]
    fn test_new_sorts_lines() {
        let lyrics = Lyrics::new([
            LyricLine::new(Duration::from_secs(10), "C"),
            LyricLine::new(Duration::from_secs(0), "A"),
            LyricLine::new(Duration::from_secs(5), "B"),
        ]);
        let texts: Vec<_> = lyrics.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["A", "B", "C"]);
    }

    #[test]
    fn test_line_progress() {
        let lyrics = late_start();

        assert!(lyrics.line_progress(0, Duration::from_secs(2)).abs() < f32::EPSILON);
        assert!(lyrics.line_progress(0, Duration::from_secs(5)).abs() < f32::EPSILON);
        assert!((lyrics.line_progress(0, Duration::from_millis(7500)) - 0.5).abs() < 0.01);
        assert!((lyrics.line_progress(0, Duration::from_secs(10)) - 1.0).abs() < f32::EPSILON);
        // Last line uses the fixed window
        assert!((lyrics.line_progress(2, Duration::from_millis(17_500)) - 0.5).abs() < 0.01);
        assert!(lyrics.line_progress(9, Duration::from_secs(1)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sync_reports_each_change_once() {
        let mut sync = LyricSync::new(abc(), BeforeFirstLine::LastLine);
        assert_eq!(sync.current(), Some(0));

        assert_eq!(sync.update(Duration::from_secs(1)), None);
        assert_eq!(sync.update(Duration::from_secs(5)), Some(1));
        assert_eq!(sync.update(Duration::from_secs(6)), None);
        assert_eq!(sync.update(Duration::from_secs(11)), Some(2));
        assert_eq!(sync.update(Duration::from_secs(2)), Some(0));
        assert_eq!(sync.current(), Some(0));
    }

    #[test]
    fn test_sync_starts_on_fallback_before_first_line() {
        let sync = LyricSync::new(late_start(), BeforeFirstLine::LastLine);
        assert_eq!(sync.current(), Some(2));

        let sync = LyricSync::new(late_start(), BeforeFirstLine::FirstLine);
        assert_eq!(sync.current(), Some(0));
    }

    #[test]
    fn test_parse_simple_lrc() {
        let result = Lyrics::parse_lrc("[00:12.34]Hello world").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.lines()[0].time, Duration::from_millis(12340));
        assert_eq!(result.lines()[0].text, "Hello world");
    }

    #[test]
    fn test_parse_multiple_lines() {
        let input = r"
[00:05.00]First line
[00:10.00]Second line

[00:15.00]Third line
";
        let result = Lyrics::parse_lrc(input).unwrap();
        let texts: Vec<_> = result.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["First line", "Second line", "Third line"]);
    }

    #[test]
    fn test_parse_id_tags() {
        let input = r"
[ti:Song Title]
[ar:Artist Name]
[al:Album Name]
[length: 04:20]
[00:05.00]Lyrics here
";
        let result = Lyrics::parse_lrc(input).unwrap();
        let metadata = result.metadata();
        assert_eq!(metadata.title.as_deref(), Some("Song Title"));
        assert_eq!(metadata.artist.as_deref(), Some("Artist Name"));
        assert_eq!(metadata.length, Some(Duration::from_secs(260)));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_parse_skips_overflowing_timestamp() {
        let result = Lyrics::parse_lrc("[00:00.00]ok\n[01:18446744073709551615]boom").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.lines()[0].text, "ok");
    }

    #[test]
    fn test_parse_ignores_overflowing_length_tag() {
        let result = Lyrics::parse_lrc("[length:1:18446744073709551615.5]\n[00:01.00]x").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.metadata().length, None);
    }

    #[test]
    fn test_parse_offset() {
        let result = Lyrics::parse_lrc("[offset:500]\n[00:10.00]Test").unwrap();
        assert_eq!(result.lines()[0].time, Duration::from_millis(10500));
    }

    #[test]
    fn test_parse_negative_offset_saturates() {
        let result = Lyrics::parse_lrc("[00:00.20]Early\n[00:10.00]Test\n[offset:-500]").unwrap();
        assert_eq!(result.lines()[0].time, Duration::ZERO);
        assert_eq!(result.lines()[1].time, Duration::from_millis(9500));
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let result = Lyrics::parse_lrc("[00:15.00][00:05.00]Repeated lyric").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.lines()[0].time, Duration::from_secs(5));
        assert_eq!(result.lines()[1].time, Duration::from_secs(15));
        assert!(result.lines().iter().all(|l| l.text == "Repeated lyric"));
    }

    #[test]
    fn test_parse_alternative_timestamp_formats() {
        let result = Lyrics::parse_lrc("[00:12:34]Hundredths\n[01:02]Whole seconds").unwrap();
        assert_eq!(result.lines()[0].time, Duration::from_millis(12340));
        assert_eq!(result.lines()[1].time, Duration::from_secs(62));
    }

    #[test]
    fn test_parse_strips_word_timing() {
        let result = Lyrics::parse_lrc("[00:12.34] <00:12.34> Hello <00:13.00> world").unwrap();
        assert_eq!(result.lines()[0].text, "Hello world");
    }

    #[test]
    fn test_parse_keeps_non_timestamp_angle_brackets() {
        let result = Lyrics::parse_lrc("[00:01.00]a <b> c").unwrap();
        assert_eq!(result.lines()[0].text, "a <b> c");
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let result = Lyrics::parse_lrc("[00:05.00]你好世界").unwrap();
        assert_eq!(result.lines()[0].text, "你好世界");
    }

    #[test]
    fn test_parse_without_timed_lines_fails() {
        let err = Lyrics::parse_lrc("[ti:Only a title]\nplain text").unwrap_err();
        assert!(matches!(err, CoreError::LrcParseError { .. }));
    }
}
