//! Track descriptor driving a lyrics load request

use serde::{Deserialize, Serialize};

/// Alternate query forms attached by the query resolver
///
/// Title and artist aliases are independent lists; the scorer evaluates every
/// combination against a candidate and keeps the best score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAliases {
    pub titles: Vec<String>,
    pub artists: Vec<String>,
}

/// Input descriptor for a track whose lyrics should be resolved
///
/// Constructed by the caller, consumed once per load request. The aggregator
/// attaches `search_aliases` during resolution; everything else is read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongInformation {
    /// Track title (required, non-empty)
    pub title: String,
    /// Ordered artist list; the first entry is the primary artist
    #[serde(default)]
    pub artists: Vec<String>,
    /// Album name, possibly empty
    #[serde(default)]
    pub album: String,
    /// Track duration in milliseconds; 0 means unknown
    #[serde(default)]
    pub duration_ms: u64,
    /// Opaque identifier of where the track came from
    #[serde(default)]
    pub source_id: String,
    /// Stable per-file key for the persistence store
    #[serde(default)]
    pub persistence_id: Option<String>,
    /// International Standard Recording Code (12 characters)
    #[serde(default)]
    pub isrc: Option<String>,
    /// Lyric text already embedded in the file's tags, if any
    #[serde(default)]
    pub embedded_lyrics: Option<String>,
    /// Alternate query forms; populated during aggregation
    #[serde(default)]
    pub search_aliases: Option<SearchAliases>,
}

impl SongInformation {
    /// Create a descriptor with the required fields only
    pub fn new(title: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            title: title.into(),
            artists,
            album: String::new(),
            duration_ms: 0,
            source_id: String::new(),
            persistence_id: None,
            isrc: None,
            embedded_lyrics: None,
            search_aliases: None,
        }
    }

    /// Primary artist, or the empty string when no artists are known
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }

    /// Stable key for remembering selections across sessions
    ///
    /// Prefers the caller-supplied persistence id; otherwise derived from
    /// title and the joined artist list.
    pub fn persistence_key(&self) -> String {
        match &self.persistence_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{}|{}", self.title, self.artists.join(",")),
        }
    }

    /// Key for caching query-level search results
    pub fn search_key(&self, limit: usize) -> String {
        format!(
            "SEARCH:{}|{}|LIMIT:{}",
            self.title,
            self.primary_artist(),
            limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_key_prefers_persistence_id() {
        let mut song = SongInformation::new("Title", vec!["A".to_string(), "B".to_string()]);
        assert_eq!(song.persistence_key(), "Title|A,B");

        song.persistence_id = Some("file-42".to_string());
        assert_eq!(song.persistence_key(), "file-42");
    }

    #[test]
    fn test_empty_persistence_id_falls_back() {
        let mut song = SongInformation::new("Title", vec!["A".to_string()]);
        song.persistence_id = Some(String::new());
        assert_eq!(song.persistence_key(), "Title|A");
    }

    #[test]
    fn test_search_key_shape() {
        let song = SongInformation::new("Song", vec!["Artist".to_string()]);
        assert_eq!(song.search_key(10), "SEARCH:Song|Artist|LIMIT:10");
    }

    #[test]
    fn test_primary_artist_empty_when_no_artists() {
        let song = SongInformation::new("Song", vec![]);
        assert_eq!(song.primary_artist(), "");
    }
}
