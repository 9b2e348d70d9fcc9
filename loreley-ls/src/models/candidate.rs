//! Scored lyric candidates returned by providers

use serde::{Deserialize, Serialize};

/// Source name for caller-supplied .lrc file content
pub const LOCAL_SOURCE: &str = "Local File";
/// Source name for lyrics embedded in the file's tags
pub const EMBEDDED_SOURCE: &str = "Embedded (ID3)";

/// Synthetic score for local file lyrics; outranks everything remote
pub const LOCAL_SYNTHETIC_SCORE: i32 = 101;
/// Synthetic score for embedded lyrics; outranks remote, yields to local
pub const EMBEDDED_SYNTHETIC_SCORE: i32 = 100;

/// One lyric search result from one source for one track
///
/// Providers populate everything except `score`, which the scorer fills in
/// downstream. A candidate with empty `lyric_text` is invalid and must never
/// be emitted by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricCandidate {
    /// Provider-stable opaque id (synthetic for local/embedded lyrics)
    pub id: String,
    /// Provider name
    pub source: String,
    /// Raw lyric text (LRC, enhanced LRC, or plain)
    pub lyric_text: String,
    /// Candidate track title as reported by the provider
    pub title: String,
    /// Candidate artist string as reported by the provider
    pub artist: String,
    /// Candidate album, possibly empty
    #[serde(default)]
    pub album: String,
    /// Candidate duration in milliseconds; 0 means unknown
    #[serde(default)]
    pub duration_ms: u64,
    /// Relevance score, computed by the scorer (0 until scored)
    #[serde(default)]
    pub score: i32,
}

impl LyricCandidate {
    /// Synthesize a candidate for caller-supplied local .lrc content
    ///
    /// The id is derived from the persistence key so that persisted
    /// selections of local lyrics survive restarts.
    pub fn local(persistence_key: &str, lyric_text: String) -> Self {
        Self {
            id: format!("local:{}", persistence_key),
            source: LOCAL_SOURCE.to_string(),
            lyric_text,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            duration_ms: 0,
            score: LOCAL_SYNTHETIC_SCORE,
        }
    }

    /// Synthesize a candidate for lyrics embedded in the file's tags
    pub fn embedded(persistence_key: &str, lyric_text: String) -> Self {
        Self {
            id: format!("embedded:{}", persistence_key),
            source: EMBEDDED_SOURCE.to_string(),
            lyric_text,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            duration_ms: 0,
            score: EMBEDDED_SYNTHETIC_SCORE,
        }
    }
}
