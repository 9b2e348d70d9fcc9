//! Remote lyric providers
//!
//! Each provider is a typed adapter over one remote lyrics API: raw wire
//! fields are projected into `LyricCandidate` at the adapter boundary and no
//! untyped value escapes. Providers never panic; network and parse failures
//! surface as `ProviderError` and are downgraded to empty batches by the
//! aggregator.

pub mod lrclib;
pub mod netease;
pub mod qq_music;

pub use lrclib::LrclibProvider;
pub use netease::NeteaseProvider;
pub use qq_music::QqMusicProvider;

use crate::models::{LyricCandidate, SongInformation};
use async_trait::async_trait;
use thiserror::Error;

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One remote lyrics source
///
/// Implementations must only emit candidates with non-empty `lyric_text`,
/// `title`, `artist` and `source`; `score` is filled downstream.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Stable provider name, used as candidate source and in logs
    fn name(&self) -> &'static str;

    /// Search for lyric candidates matching the track
    async fn search(
        &self,
        song: &SongInformation,
        limit: usize,
    ) -> Result<Vec<LyricCandidate>, ProviderError>;
}

/// Prioritized (title, artist) query pairs for a track
///
/// The aggregator attaches resolved queries as parallel alias lists;
/// providers iterate them in order and stop at the first pair that yields
/// results. Without aliases the track's own metadata forms the only pair.
pub(crate) fn query_pairs(song: &SongInformation) -> Vec<(String, String)> {
    if let Some(aliases) = &song.search_aliases {
        if !aliases.titles.is_empty() && aliases.titles.len() == aliases.artists.len() {
            return aliases
                .titles
                .iter()
                .cloned()
                .zip(aliases.artists.iter().cloned())
                .collect();
        }
    }
    vec![(song.title.clone(), song.primary_artist().to_string())]
}

/// Keyword string for a (title, artist) pair
pub(crate) fn search_keyword(title: &str, artist: &str) -> String {
    if artist.is_empty() {
        title.to_string()
    } else {
        format!("{} {}", title, artist)
    }
}
