//! Recording registry client (ISRC → recordings)
//!
//! Resolves an International Standard Recording Code to the titles and
//! primary artists of the recordings registered under it. The wire format is
//! the public MusicBrainz `recording?query=isrc:<isrc>&fmt=json` shape; the
//! trait seam lets tests substitute a scripted registry.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const USER_AGENT: &str = "Loreley/0.1.0 (https://github.com/loreley/loreley)";
const RATE_LIMIT_MS: u64 = 1000; // 1 request per second

/// Recording registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One recording registered under an ISRC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHit {
    /// Recording title
    pub title: String,
    /// Primary artist name
    pub artist: String,
}

/// Read-only ISRC lookup interface
#[async_trait]
pub trait RecordingRegistry: Send + Sync {
    /// Look up the recordings registered under `isrc`
    async fn recordings_by_isrc(&self, isrc: &str) -> Result<Vec<RecordingHit>, RegistryError>;
}

/// Recording search response
#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: String,
}

/// Rate limiter enforcing the registry's 1 request/second etiquette
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// MusicBrainz-backed recording registry
pub struct MusicBrainzRegistry {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl MusicBrainzRegistry {
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a registry client against a custom base URL (mirrors, tests)
    pub fn with_base_url(base_url: String) -> Result<Self, RegistryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }
}

#[async_trait]
impl RecordingRegistry for MusicBrainzRegistry {
    async fn recordings_by_isrc(&self, isrc: &str) -> Result<Vec<RecordingHit>, RegistryError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/recording", self.base_url);

        tracing::debug!(isrc = %isrc, url = %url, "Querying recording registry");

        let response = self
            .http_client
            .get(&url)
            .query(&[("query", format!("isrc:{}", isrc)), ("fmt", "json".to_string())])
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api(status.as_u16(), error_text));
        }

        let parsed: RecordingSearchResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Parse(e.to_string()))?;

        let hits: Vec<RecordingHit> = parsed
            .recordings
            .into_iter()
            .filter_map(|rec| {
                let artist = rec.artist_credit.first()?.name.clone();
                Some(RecordingHit {
                    title: rec.title,
                    artist,
                })
            })
            .collect();

        tracing::info!(isrc = %isrc, hits = hits.len(), "Recording registry lookup complete");

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let registry = MusicBrainzRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "count": 2,
            "recordings": [
                {
                    "id": "a1",
                    "title": "Original Title",
                    "artist-credit": [{"name": "Artist One", "artist": {"id": "x", "name": "Artist One"}}]
                },
                {
                    "id": "a2",
                    "title": "No Credit"
                }
            ]
        }"#;
        let parsed: RecordingSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.recordings.len(), 2);
        assert_eq!(parsed.recordings[0].title, "Original Title");
        assert_eq!(parsed.recordings[0].artist_credit[0].name, "Artist One");
        assert!(parsed.recordings[1].artist_credit.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200); // short interval for the test

        let start = Instant::now();
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
    }
}
