//! Netease Cloud Music lyrics adapter
//!
//! Two-step protocol: a track search returning song metadata, then a lyric
//! fetch per song id returning raw LRC text.

use super::{query_pairs, search_keyword, LyricsProvider, ProviderError};
use crate::models::{LyricCandidate, SongInformation};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://music.163.com/api";
const USER_AGENT: &str = "Loreley/0.1.0 (https://github.com/loreley/loreley)";
const OK_CODE: i64 = 200;

/// Track search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    code: i64,
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: i64,
    name: String,
    /// Artist credits
    #[serde(default)]
    ar: Vec<Artist>,
    /// Album
    al: Option<Album>,
    /// Duration in milliseconds
    #[serde(default)]
    dt: u64,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    name: String,
}

/// Lyric fetch response
#[derive(Debug, Deserialize)]
struct LyricResponse {
    code: i64,
    lrc: Option<Lrc>,
}

#[derive(Debug, Deserialize)]
struct Lrc {
    lyric: Option<String>,
}

/// Netease-style lyrics provider
pub struct NeteaseProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl NeteaseProvider {
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

    async fn search_songs(&self, keyword: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        let url = format!("{}/cloudsearch/pc", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("s", keyword),
                ("type", "1"),
                ("offset", "0"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(status.as_u16(), status.to_string()));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if parsed.code != OK_CODE {
            return Err(ProviderError::Api(0, format!("search code {}", parsed.code)));
        }

        Ok(parsed.result.map(|r| r.songs).unwrap_or_default())
    }

    async fn fetch_lyric(&self, song_id: i64) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/song/lyric", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("id", song_id.to_string().as_str()),
                ("lv", "-1"),
                ("kv", "-1"),
                ("tv", "-1"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(status.as_u16(), status.to_string()));
        }

        let parsed: LyricResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if parsed.code != OK_CODE {
            return Ok(None);
        }

        Ok(parsed
            .lrc
            .and_then(|l| l.lyric)
            .filter(|text| !text.trim().is_empty()))
    }
}

#[async_trait]
impl LyricsProvider for NeteaseProvider {
    fn name(&self) -> &'static str {
        "Netease"
    }

    async fn search(
        &self,
        song: &SongInformation,
        limit: usize,
    ) -> Result<Vec<LyricCandidate>, ProviderError> {
        for (title, artist) in query_pairs(song) {
            let keyword = search_keyword(&title, &artist);
            let songs = self.search_songs(&keyword, limit).await?;
            if songs.is_empty() {
                continue;
            }

            let mut candidates = Vec::new();
            for hit in songs.into_iter().take(limit) {
                match self.fetch_lyric(hit.id).await {
                    Ok(Some(lyric_text)) => {
                        candidates.push(LyricCandidate {
                            id: hit.id.to_string(),
                            source: self.name().to_string(),
                            lyric_text,
                            title: hit.name,
                            artist: hit
                                .ar
                                .iter()
                                .map(|a| a.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", "),
                            album: hit.al.map(|a| a.name).unwrap_or_default(),
                            duration_ms: hit.dt,
                            score: 0,
                        });
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            provider = self.name(),
                            song_id = hit.id,
                            error = %e,
                            "Lyric fetch failed for search hit; skipping"
                        );
                    }
                }
            }

            if !candidates.is_empty() {
                return Ok(candidates);
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let raw = r#"{
            "code": 200,
            "result": {
                "songs": [
                    {
                        "id": 12345,
                        "name": "Test Song",
                        "ar": [{"name": "Artist A"}, {"name": "Artist B"}],
                        "al": {"name": "Test Album"},
                        "dt": 201000
                    }
                ]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.code, 200);
        let songs = parsed.result.unwrap().songs;
        assert_eq!(songs[0].id, 12345);
        assert_eq!(songs[0].ar.len(), 2);
        assert_eq!(songs[0].dt, 201000);
    }

    #[test]
    fn test_empty_result_tolerated() {
        let raw = r#"{"code": 200}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_lyric_response_parsing() {
        let raw = r#"{"code": 200, "lrc": {"lyric": "[00:01.00]Line"}}"#;
        let parsed: LyricResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.lrc.unwrap().lyric.unwrap(), "[00:01.00]Line");
    }
}
