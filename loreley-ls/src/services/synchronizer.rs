//! Playback synchronization queries
//!
//! Pure, non-suspending lookups against parsed lyrics: which line is active
//! at a playback position, and how far through it playback has progressed.

use crate::models::{LyricLine, LyricsData};

/// Fallback line duration when neither a following line nor syllable timing
/// bounds the current line (ms)
const DEFAULT_LINE_DURATION_MS: u64 = 5000;

/// Index of the line active at `time_ms`
///
/// Returns the largest `i` such that `lines[i].start_time_ms <= time_ms`,
/// or `-1` when playback is before the first line. O(log N).
pub fn find_line_index(data: &LyricsData, time_ms: u64) -> isize {
    let after = data
        .lines
        .partition_point(|line| line.start_time_ms <= time_ms);
    after as isize - 1
}

/// Progress through `line` at `time_ms`, in `[0.0, 1.0]`
///
/// The line's end is the next line's start when known, else the end of its
/// last syllable, else a fixed five-second window. A degenerate line whose
/// end does not lie after its start is always complete.
pub fn line_progress(line: &LyricLine, next_line: Option<&LyricLine>, time_ms: u64) -> f64 {
    let end = match next_line {
        Some(next) => next.start_time_ms,
        None => match line.last_syllable_end_ms() {
            Some(last_end) => line.start_time_ms + last_end,
            None => line.start_time_ms + DEFAULT_LINE_DURATION_MS,
        },
    };

    if end <= line.start_time_ms {
        return 1.0;
    }

    let elapsed = time_ms.saturating_sub(line.start_time_ms) as f64;
    let span = (end - line.start_time_ms) as f64;
    (elapsed / span).clamp(0.0, 1.0)
}
