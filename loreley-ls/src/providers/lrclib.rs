//! LRCLIB lyrics adapter
//!
//! Single-step protocol: a keyword search returns candidates with the lyric
//! text inlined (`syncedLyrics` preferred, `plainLyrics` fallback).

use super::{query_pairs, search_keyword, LyricsProvider, ProviderError};
use crate::models::{LyricCandidate, SongInformation};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://lrclib.net/api";
const USER_AGENT: &str = "Loreley/0.1.0 (https://github.com/loreley/loreley)";

/// One search result entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntry {
    id: i64,
    track_name: String,
    artist_name: String,
    #[serde(default)]
    album_name: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    synced_lyrics: Option<String>,
    #[serde(default)]
    plain_lyrics: Option<String>,
}

impl SearchEntry {
    /// Usable lyric text: synced preferred, plain as fallback
    fn lyric_text(&self) -> Option<&str> {
        self.synced_lyrics
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.plain_lyrics
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
            })
    }
}

/// LRCLIB-style lyrics provider
pub struct LrclibProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl LrclibProvider {
    pub fn new(base_url: Option<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn search_entries(&self, keyword: &str) -> Result<Vec<SearchEntry>, ProviderError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", keyword)])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(status.as_u16(), status.to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "LRCLIB"
    }

    async fn search(
        &self,
        song: &SongInformation,
        limit: usize,
    ) -> Result<Vec<LyricCandidate>, ProviderError> {
        for (title, artist) in query_pairs(song) {
            let keyword = search_keyword(&title, &artist);
            let entries = self.search_entries(&keyword).await?;

            let candidates: Vec<LyricCandidate> = entries
                .into_iter()
                .filter_map(|entry| {
                    let lyric_text = entry.lyric_text()?.to_string();
                    Some(LyricCandidate {
                        id: entry.id.to_string(),
                        source: self.name().to_string(),
                        lyric_text,
                        title: entry.track_name,
                        artist: entry.artist_name,
                        album: entry.album_name.unwrap_or_default(),
                        duration_ms: entry
                            .duration
                            .map(|secs| (secs * 1000.0) as u64)
                            .unwrap_or(0),
                        score: 0,
                    })
                })
                .take(limit)
                .collect();

            if !candidates.is_empty() {
                return Ok(candidates);
            }
        }

        Ok(Vec::new())
    }
}
