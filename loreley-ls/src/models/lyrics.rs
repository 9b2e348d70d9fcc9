//! Structured lyric model produced by the parsers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One timed syllable within a line
///
/// `start_time_ms` is relative to the owning line's start. The final syllable
/// of a line has duration 0 (its end is unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllable {
    /// Offset from the owning line's start time (ms)
    pub start_time_ms: u64,
    /// Syllable duration (ms); 0 when unknown
    pub duration_ms: u64,
    /// Syllable text
    pub text: String,
}

/// One lyric line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Absolute time from track start (ms)
    pub start_time_ms: u64,
    /// Line text with all tag markers removed
    pub text: String,
    /// Per-syllable timing, when the source carried enhanced markers
    #[serde(default)]
    pub syllables: Option<Vec<Syllable>>,
    /// Textual variant index at this timestamp: 0 primary, 1 translation,
    /// 2 romanization, ...
    #[serde(default)]
    pub layer: u32,
}

impl LyricLine {
    pub fn new(start_time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_time_ms,
            text: text.into(),
            syllables: None,
            layer: 0,
        }
    }

    /// End of the last syllable relative to the line start, if syllables exist
    pub fn last_syllable_end_ms(&self) -> Option<u64> {
        self.syllables
            .as_ref()
            .and_then(|s| s.last())
            .map(|s| s.start_time_ms + s.duration_ms)
    }
}

/// Parsed lyrics: ordered lines plus `[key:value]` metadata
///
/// Lines are sorted non-decreasingly by `start_time_ms`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsData {
    pub lines: Vec<LyricLine>,
    pub metadata: HashMap<String, String>,
}

impl LyricsData {
    /// Whether any line carries a non-zero timestamp or syllable timing
    pub fn is_synced(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.start_time_ms > 0 || l.syllables.is_some())
    }
}
