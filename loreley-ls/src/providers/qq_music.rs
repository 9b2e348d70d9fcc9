//! QQ Music lyrics adapter
//!
//! Two-step protocol: a keyword search, then a lyric fetch per `songmid`.
//! The lyric endpoint answers with a JSONP-wrapped payload whose `lyric`
//! field is base64-encoded LRC text.

use super::{query_pairs, search_keyword, LyricsProvider, ProviderError};
use crate::models::{LyricCandidate, SongInformation};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://c.y.qq.com";
const USER_AGENT: &str = "Loreley/0.1.0 (https://github.com/loreley/loreley)";
const REFERER: &str = "https://y.qq.com/";

/// Keyword search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    code: i64,
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    song: Option<SongList>,
}

#[derive(Debug, Deserialize)]
struct SongList {
    #[serde(default)]
    list: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    songmid: String,
    songname: String,
    #[serde(default)]
    singer: Vec<Singer>,
    #[serde(default)]
    albumname: String,
    /// Duration in seconds
    #[serde(default)]
    interval: u64,
}

#[derive(Debug, Deserialize)]
struct Singer {
    name: String,
}

/// Lyric fetch payload, after the JSONP wrapper is stripped
#[derive(Debug, Deserialize)]
struct LyricPayload {
    #[serde(default)]
    retcode: i64,
    lyric: Option<String>,
}

/// QQ-Music-style lyrics provider
pub struct QqMusicProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl QqMusicProvider {
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
        let url = format!("{}/soso/fcgi-bin/client_search_cp", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("Referer", REFERER)
            .query(&[
                ("w", keyword),
                ("n", &limit.to_string()),
                ("format", "json"),
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

        if parsed.code != 0 {
            return Err(ProviderError::Api(0, format!("search code {}", parsed.code)));
        }

        Ok(parsed
            .data
            .and_then(|d| d.song)
            .map(|s| s.list)
            .unwrap_or_default())
    }

    async fn fetch_lyric(&self, songmid: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/lyric/fcgi-bin/fcg_query_lyric_new.fcg", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("Referer", REFERER)
            .query(&[("songmid", songmid), ("format", "json"), ("nobase64", "0")])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(status.as_u16(), status.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let json = strip_jsonp(&body);
        let payload: LyricPayload =
            serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;

        if payload.retcode != 0 {
            return Ok(None);
        }

        let Some(encoded) = payload.lyric else {
            return Ok(None);
        };

        let decoded = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::Parse(format!("lyric base64: {}", e)))?;
        let text = String::from_utf8(decoded)
            .map_err(|e| ProviderError::Parse(format!("lyric utf-8: {}", e)))?;

        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }
}

/// Strip a JSONP callback wrapper, if present
///
/// `MusicJsonCallback({...})` becomes `{...}`; plain JSON passes through.
fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close && !trimmed.starts_with('{') => {
            &trimmed[open + 1..close]
        }
        _ => trimmed,
    }
}

#[async_trait]
impl LyricsProvider for QqMusicProvider {
    fn name(&self) -> &'static str {
        "QQ Music"
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
                match self.fetch_lyric(&hit.songmid).await {
                    Ok(Some(lyric_text)) => {
                        candidates.push(LyricCandidate {
                            id: hit.songmid.clone(),
                            source: self.name().to_string(),
                            lyric_text,
                            title: hit.songname,
                            artist: hit
                                .singer
                                .iter()
                                .map(|s| s.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", "),
                            album: hit.albumname,
                            // interval is in seconds; candidates carry ms
                            duration_ms: hit.interval * 1000,
                            score: 0,
                        });
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            provider = self.name(),
                            songmid = %hit.songmid,
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
