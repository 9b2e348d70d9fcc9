//! Shared test fixtures: scripted providers, registries and stores
#![allow(dead_code)]

use async_trait::async_trait;
use loreley_common::events::EventBus;
use loreley_ls::db::LyricsStore;
use loreley_ls::models::{LyricCandidate, SongInformation};
use loreley_ls::providers::{LyricsProvider, ProviderError};
use loreley_ls::services::recording_registry::{RecordingHit, RecordingRegistry, RegistryError};
use loreley_ls::services::{Aggregator, QueryResolver, SelectionController};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Registry that knows nothing
pub struct EmptyRegistry;

#[async_trait]
impl RecordingRegistry for EmptyRegistry {
    async fn recordings_by_isrc(&self, _isrc: &str) -> Result<Vec<RecordingHit>, RegistryError> {
        Ok(Vec::new())
    }
}

/// Provider returning a fixed candidate list after a fixed delay
pub struct StaticProvider {
    name: &'static str,
    delay_ms: u64,
    candidates: Vec<LyricCandidate>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(
        name: &'static str,
        delay_ms: u64,
        candidates: Vec<LyricCandidate>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            delay_ms,
            candidates,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LyricsProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(
        &self,
        _song: &SongInformation,
        _limit: usize,
    ) -> Result<Vec<LyricCandidate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        Ok(self.candidates.clone())
    }
}

/// In-memory store backed by a fresh SQLite database
pub async fn memory_store() -> LyricsStore {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    loreley_ls::db::init_tables(&pool).await.unwrap();
    LyricsStore::new(pool)
}

/// Controller wired to the given providers and store
pub fn controller_with(
    providers: Vec<Arc<dyn LyricsProvider>>,
    store: LyricsStore,
    event_bus: EventBus,
) -> Arc<SelectionController> {
    let resolver = QueryResolver::new(Arc::new(EmptyRegistry));
    let aggregator = Aggregator::new(resolver, providers);
    Arc::new(SelectionController::new(store, aggregator, event_bus))
}

/// Candidate with a small valid LRC body
pub fn lrc_candidate(id: &str, title: &str, artist: &str) -> LyricCandidate {
    LyricCandidate {
        id: id.to_string(),
        source: "Test".to_string(),
        lyric_text: format!("[00:01.00]{} first line\n[00:03.00]{} second line", id, id),
        title: title.to_string(),
        artist: artist.to_string(),
        album: String::new(),
        duration_ms: 0,
        score: 0,
    }
}

/// Candidate that also names an album (worth +20 against a matching song)
pub fn lrc_candidate_with_album(
    id: &str,
    title: &str,
    artist: &str,
    album: &str,
) -> LyricCandidate {
    let mut candidate = lrc_candidate(id, title, artist);
    candidate.album = album.to_string();
    candidate
}

/// Track descriptor with a title and one artist
pub fn song(title: &str, artist: &str) -> SongInformation {
    SongInformation::new(title, vec![artist.to_string()])
}
