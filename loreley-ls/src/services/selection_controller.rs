//! Lyrics selection controller
//!
//! Owns the load pipeline: local file content beats embedded tags beats a
//! persisted user selection beats the query-level search cache beats a fresh
//! provider search. During a search, partial batches stream in and the best
//! candidate is auto-promoted until a lock-quality selection is reached.
//! Every published state change is broadcast on the event bus as an
//! immutable snapshot.
//!
//! All mutable state lives behind one mutex and is only touched from the
//! controller's own execution context; provider work happens on spawned
//! tasks and rejoins through the aggregator's callback.

use super::aggregator::Aggregator;
use crate::db::{LyricsStore, PersistenceRecord};
use crate::models::{LyricCandidate, LyricsData, SongInformation};
use crate::parsers::parse_enhanced;
use chrono::Utc;
use loreley_common::events::{EventBus, LoreleyEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Auto-selection floor: candidates at or below never auto-select
const AUTO_SELECT_FLOOR: i32 = 45;
/// Lock threshold: a published selection at or above stops auto-promotion
const LOCK_THRESHOLD: i32 = 70;
/// Default per-provider result limit
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Options for one load request
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Raw .lrc content supplied by an external collaborator (e.g. a
    /// sidecar file next to the audio); outranks everything else
    pub local_lrc_content: Option<String>,
    /// Per-provider result limit
    pub limit: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            local_lrc_content: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Mutable controller state, guarded by one mutex
struct ControllerState {
    current_lyrics: Option<Arc<LyricsData>>,
    last_results: Vec<LyricCandidate>,
    current_song_key: String,
    active_token: Option<Uuid>,
    selected_id: Option<String>,
    selected_score: i32,
    locked: bool,
    cancel: Option<CancellationToken>,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            current_lyrics: None,
            last_results: Vec::new(),
            current_song_key: String::new(),
            active_token: None,
            selected_id: None,
            selected_score: i32::MIN,
            locked: false,
            cancel: None,
        }
    }
}

/// Selection controller
pub struct SelectionController {
    store: LyricsStore,
    aggregator: Aggregator,
    event_bus: EventBus,
    state: Mutex<ControllerState>,
}

impl SelectionController {
    pub fn new(store: LyricsStore, aggregator: Aggregator, event_bus: EventBus) -> Self {
        Self {
            store,
            aggregator,
            event_bus,
            state: Mutex::new(ControllerState::new()),
        }
    }

    /// Load lyrics for a track
    ///
    /// Returns true when a candidate was published for this request; false
    /// when nothing was found or a newer request superseded this one.
    pub async fn load(&self, song: &SongInformation, options: LoadOptions) -> bool {
        let persistence_key = song.persistence_key();
        let search_key = song.search_key(options.limit);
        let token = Uuid::new_v4();
        let cancel = CancellationToken::new();

        {
            let mut state = self.lock_state();
            if let Some(previous) = state.cancel.take() {
                previous.cancel();
            }
            state.current_song_key = persistence_key.clone();
            state.active_token = Some(token);
            state.last_results.clear();
            state.current_lyrics = None;
            state.selected_id = None;
            state.selected_score = i32::MIN;
            state.locked = false;
            state.cancel = Some(cancel.clone());
        }

        tracing::info!(
            key = %persistence_key,
            request = %token,
            title = %song.title,
            "Lyrics load started"
        );

        let local = options
            .local_lrc_content
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| LyricCandidate::local(&persistence_key, t.clone()));
        let embedded = song
            .embedded_lyrics
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| LyricCandidate::embedded(&persistence_key, t.clone()));

        let persisted = self.read_record(&persistence_key).await;
        let has_user_selection = persisted
            .as_ref()
            .map(|r| r.selected_id.is_some())
            .unwrap_or(false);

        // Priority 1: local .lrc content, unless the user chose otherwise.
        if let Some(local) = &local {
            if !has_user_selection {
                let mut results = vec![local.clone()];
                results.extend(embedded.clone());
                if self.publish_results(token, &persistence_key, results, 0) {
                    return true;
                }
            }
        }

        // Priority 2: lyrics embedded in the file's tags.
        if let Some(embedded) = &embedded {
            if !has_user_selection
                && self.publish_results(token, &persistence_key, vec![embedded.clone()], 0)
            {
                return true;
            }
        }

        // Priority 3: a persisted user selection.
        if let Some(record) = persisted.filter(|r| r.selected_id.is_some()) {
            let mut results = record.results.clone();
            // Front-insert embedded first so local ends up in front of it.
            for synthetic in [&embedded, &local].into_iter().flatten() {
                if !results.iter().any(|c| c.id == synthetic.id) {
                    results.insert(0, synthetic.clone());
                }
            }
            if !results.is_empty() {
                let selected_index = record
                    .selected_id
                    .as_deref()
                    .and_then(|id| results.iter().position(|c| c.id == id))
                    .unwrap_or(0);
                tracing::info!(key = %persistence_key, "Publishing persisted selection");
                if self.publish_results(token, &persistence_key, results, selected_index) {
                    return true;
                }
            }
        }

        // Priority 4: a cached search for the same query.
        if let Some(cached) = self.read_record(&search_key).await {
            if !cached.results.is_empty() {
                tracing::info!(key = %search_key, "Publishing cached search results");
                if self.publish_results(token, &persistence_key, cached.results, 0) {
                    return true;
                }
            }
        }

        // Priority 5: fresh provider search with streaming auto-promotion.
        self.event_bus.emit_lossy(LoreleyEvent::SearchStarted {
            request_id: token,
            track_key: persistence_key.clone(),
            timestamp: Utc::now(),
        });

        let mut search_song = song.clone();
        let mut on_partial = |batch: &[LyricCandidate]| {
            self.absorb_batch(token, &persistence_key, batch);
        };
        let final_results = self
            .aggregator
            .search(&mut search_song, options.limit, &cancel, Some(&mut on_partial))
            .await;

        self.finish_search(
            token,
            &persistence_key,
            &search_key,
            local,
            embedded,
            final_results,
        )
        .await
    }

    /// Select a candidate from the last results by index
    ///
    /// Parses the candidate, publishes it, and (by default) persists the
    /// choice so later loads of the same track restore it. A user selection
    /// also stops any in-flight auto-promotion.
    pub async fn select(&self, index: usize, save: bool) -> bool {
        let (token, key, candidate, results) = {
            let state = self.lock_state();
            let Some(candidate) = state.last_results.get(index).cloned() else {
                tracing::warn!(
                    index,
                    available = state.last_results.len(),
                    "Selection index out of range"
                );
                return false;
            };
            (
                state.active_token.unwrap_or_else(Uuid::new_v4),
                state.current_song_key.clone(),
                candidate,
                state.last_results.clone(),
            )
        };

        {
            let mut state = self.lock_state();
            if !publish_candidate(&mut state, &self.event_bus, token, &key, &candidate) {
                return false;
            }
            // A deliberate user choice must not be displaced by a
            // late-arriving higher score.
            state.locked = true;
        }

        if save && !key.is_empty() && !candidate.id.is_empty() {
            let record = PersistenceRecord {
                results,
                selected_id: Some(candidate.id.clone()),
            };
            self.write_record(&key, &record).await;
            self.event_bus.emit_lossy(LoreleyEvent::SelectionSaved {
                track_key: key,
                candidate_id: candidate.id,
                timestamp: Utc::now(),
            });
        }

        true
    }

    /// Currently published lyrics snapshot
    pub fn current_lyrics(&self) -> Option<Arc<LyricsData>> {
        self.lock_state().current_lyrics.clone()
    }

    /// Results of the most recent load, best first
    pub fn last_search_results(&self) -> Vec<LyricCandidate> {
        self.lock_state().last_results.clone()
    }

    /// Persistence key of the track currently loaded
    pub fn current_song_key(&self) -> String {
        self.lock_state().current_song_key.clone()
    }

    /// Look up the persisted selection for a track without loading it
    pub async fn cached_selection(&self, song: &SongInformation) -> Option<LyricCandidate> {
        let record = self.read_record(&song.persistence_key()).await?;
        record.selected().cloned()
    }

    /// Subscribe to published state changes
    pub fn subscribe(&self) -> broadcast::Receiver<LoreleyEvent> {
        self.event_bus.subscribe()
    }

    /// Absorb one scored provider batch (runs on the load task)
    ///
    /// Stale batches (token advanced by a newer load) are dropped without
    /// touching state. New candidates are merged by id, the merged list is
    /// re-sorted, and the top candidate is promoted when it clears the
    /// thresholds and no lock is in place.
    fn absorb_batch(&self, token: Uuid, key: &str, batch: &[LyricCandidate]) {
        let mut state = self.lock_state();
        if state.active_token != Some(token) {
            tracing::debug!(request = %token, "Dropping stale provider batch");
            return;
        }

        self.event_bus.emit_lossy(LoreleyEvent::ProviderBatch {
            request_id: token,
            provider: batch
                .first()
                .map(|c| c.source.clone())
                .unwrap_or_default(),
            candidates: batch.len(),
            best_score: batch.first().map(|c| c.score),
            timestamp: Utc::now(),
        });

        for candidate in batch {
            if !state.last_results.iter().any(|c| c.id == candidate.id) {
                state.last_results.push(candidate.clone());
            }
        }
        state
            .last_results
            .sort_by_key(|c| std::cmp::Reverse(c.score));

        if state.locked {
            return;
        }
        let Some(top) = state.last_results.first().cloned() else {
            return;
        };
        if top.score <= AUTO_SELECT_FLOOR || top.score <= state.selected_score {
            return;
        }

        if publish_candidate(&mut state, &self.event_bus, token, key, &top)
            && state.selected_score >= LOCK_THRESHOLD
        {
            state.locked = true;
            tracing::info!(
                key = %key,
                score = state.selected_score,
                candidate = %top.id,
                "Selection locked"
            );
            self.event_bus.emit_lossy(LoreleyEvent::SelectionLocked {
                request_id: token,
                track_key: key.to_string(),
                candidate_id: top.id,
                score: state.selected_score,
                timestamp: Utc::now(),
            });
        }
    }

    /// Final bookkeeping after the aggregator returns
    async fn finish_search(
        &self,
        token: Uuid,
        persistence_key: &str,
        search_key: &str,
        local: Option<LyricCandidate>,
        embedded: Option<LyricCandidate>,
        final_results: Vec<LyricCandidate>,
    ) -> bool {
        let (results, published) = {
            let mut state = self.lock_state();
            if state.active_token != Some(token) {
                tracing::debug!(request = %token, "Load superseded before completion");
                return false;
            }

            // Merge anything the streaming callback has not seen yet, then
            // put synthetic candidates in front with their fixed scores.
            for candidate in final_results {
                if !state.last_results.iter().any(|c| c.id == candidate.id) {
                    state.last_results.push(candidate);
                }
            }
            state
                .last_results
                .sort_by_key(|c| std::cmp::Reverse(c.score));
            for synthetic in [embedded, local].into_iter().flatten() {
                if !state.last_results.iter().any(|c| c.id == synthetic.id) {
                    state.last_results.insert(0, synthetic);
                }
            }

            if state.last_results.is_empty() {
                tracing::warn!(key = %persistence_key, "Lyrics search produced no candidates");
                return false;
            }

            let published = if state.locked {
                state.selected_id.is_some()
            } else {
                let top = state.last_results[0].clone();
                if state.selected_id.as_deref() == Some(top.id.as_str()) {
                    true
                } else {
                    publish_candidate(&mut state, &self.event_bus, token, persistence_key, &top)
                }
            };

            (state.last_results.clone(), published)
        };

        self.event_bus.emit_lossy(LoreleyEvent::SearchCompleted {
            request_id: token,
            track_key: persistence_key.to_string(),
            total: results.len(),
            timestamp: Utc::now(),
        });

        let search_record = PersistenceRecord {
            results: results.clone(),
            selected_id: None,
        };
        self.write_record(search_key, &search_record).await;

        let persistence_record = PersistenceRecord {
            selected_id: Some(results[0].id.clone()),
            results,
        };
        self.write_record(persistence_key, &persistence_record).await;

        published
    }

    /// Publish a prepared result list and the candidate at `index`
    ///
    /// State is only committed when the candidate actually publishes, so a
    /// caller can fall through to the next priority on failure.
    fn publish_results(
        &self,
        token: Uuid,
        key: &str,
        results: Vec<LyricCandidate>,
        index: usize,
    ) -> bool {
        let mut state = self.lock_state();
        if state.active_token != Some(token) {
            return false;
        }
        let Some(candidate) = results.get(index).cloned() else {
            return false;
        };
        if !publish_candidate(&mut state, &self.event_bus, token, key, &candidate) {
            return false;
        }
        state.last_results = results;
        true
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state poisoned")
    }

    /// Read a record, degrading store failures to a miss
    async fn read_record(&self, key: &str) -> Option<PersistenceRecord> {
        match self.store.get_record(key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Persistence read failed; continuing");
                None
            }
        }
    }

    /// Write a record, logging and suppressing store failures
    async fn write_record(&self, key: &str, record: &PersistenceRecord) {
        if let Err(e) = self.store.put_record(key, record).await {
            tracing::warn!(key = %key, error = %e, "Persistence write failed; continuing");
        }
    }
}

/// Parse and publish one candidate into the controller state
///
/// Returns false (leaving published state untouched) when the candidate's
/// text yields neither lines nor metadata.
fn publish_candidate(
    state: &mut ControllerState,
    event_bus: &EventBus,
    token: Uuid,
    key: &str,
    candidate: &LyricCandidate,
) -> bool {
    let mut parsed = parse_enhanced(&candidate.lyric_text);
    if parsed.lines.is_empty() && parsed.metadata.is_empty() {
        tracing::warn!(
            candidate = %candidate.id,
            source = %candidate.source,
            "Candidate text is not parseable lyrics"
        );
        return false;
    }

    parsed
        .metadata
        .insert("source".to_string(), candidate.source.clone());
    parsed
        .metadata
        .insert("score".to_string(), candidate.score.to_string());
    if !candidate.title.is_empty() {
        parsed
            .metadata
            .entry("ti".to_string())
            .or_insert_with(|| candidate.title.clone());
    }
    if !candidate.artist.is_empty() {
        parsed
            .metadata
            .entry("ar".to_string())
            .or_insert_with(|| candidate.artist.clone());
    }

    let line_count = parsed.lines.len();
    state.current_lyrics = Some(Arc::new(parsed));
    state.selected_id = Some(candidate.id.clone());
    state.selected_score = candidate.score;

    tracing::info!(
        key = %key,
        candidate = %candidate.id,
        source = %candidate.source,
        score = candidate.score,
        lines = line_count,
        "Lyrics published"
    );
    event_bus.emit_lossy(LoreleyEvent::LyricsPublished {
        request_id: token,
        track_key: key.to_string(),
        source: candidate.source.clone(),
        score: candidate.score,
        lines: line_count,
        timestamp: Utc::now(),
    });

    true
}
