//! Alternate query resolution
//!
//! Expands a track descriptor into an ordered list of (title, artist) query
//! pairs: registry recordings for the track's ISRC first (deduplicated,
//! language-prioritized), with the track's own metadata prepended whenever
//! the registry looks like it disagrees with the user's tags (manual
//! override detection).
//!
//! Concurrent lookups of the same ISRC are coalesced through a process-wide
//! cache of in-flight cells; each ISRC hits the registry at most once per
//! process.

use super::recording_registry::{RecordingHit, RecordingRegistry};
use super::similarity::similarity;
use crate::models::SongInformation;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Similarity floor below which the registry titles are considered a
/// mismatch with the user's tags
const OVERRIDE_SIMILARITY_THRESHOLD: f64 = 0.8;

/// One search query pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub title: String,
    pub artist: String,
}

/// Process-wide ISRC result cache
///
/// The outer mutex only guards the get-or-insert of a cell; the registry
/// call itself runs inside the cell so concurrent callers await the same
/// in-flight lookup.
static ISRC_CACHE: Lazy<Mutex<HashMap<String, Arc<OnceCell<Vec<RecordingHit>>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Query resolver over a recording registry
pub struct QueryResolver {
    registry: Arc<dyn RecordingRegistry>,
}

impl QueryResolver {
    pub fn new(registry: Arc<dyn RecordingRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the ordered query pairs for a track
    ///
    /// Always returns at least one pair; registry failures degrade to the
    /// track's own metadata.
    pub async fn resolve_queries(&self, song: &SongInformation) -> Vec<ResolvedQuery> {
        let fallback = ResolvedQuery {
            title: song.title.clone(),
            artist: song.primary_artist().to_string(),
        };

        let hits = match song.isrc.as_deref().filter(|i| !i.is_empty()) {
            Some(isrc) => self.lookup_coalesced(isrc).await,
            None => Vec::new(),
        };

        let mut queries = dedup_queries(hits);
        sort_by_language_priority(&mut queries);

        // Manual override detection: when the user's title resembles none of
        // the registry titles, the user's tags lead the query order.
        let best_similarity = queries
            .iter()
            .map(|q| similarity(&song.title, &q.title))
            .fold(0.0_f64, f64::max);

        if queries.is_empty() || best_similarity < OVERRIDE_SIMILARITY_THRESHOLD {
            if !queries.contains(&fallback) {
                tracing::debug!(
                    title = %song.title,
                    best_similarity,
                    "Registry titles diverge from track tags; prepending original query"
                );
                queries.insert(0, fallback);
            }
        }

        queries
    }

    /// Fetch registry hits for an ISRC through the process-wide cache
    async fn lookup_coalesced(&self, isrc: &str) -> Vec<RecordingHit> {
        let cell = {
            let mut cache = ISRC_CACHE.lock().expect("ISRC cache poisoned");
            Arc::clone(cache.entry(isrc.to_string()).or_default())
        };

        let registry = Arc::clone(&self.registry);
        let isrc_owned = isrc.to_string();
        cell.get_or_init(|| async move {
            match registry.recordings_by_isrc(&isrc_owned).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(
                        isrc = %isrc_owned,
                        error = %e,
                        "Recording registry lookup failed; continuing without alternates"
                    );
                    Vec::new()
                }
            }
        })
        .await
        .clone()
    }
}

/// Drop duplicate (title, artist) pairs, keeping first occurrence order
fn dedup_queries(hits: Vec<RecordingHit>) -> Vec<ResolvedQuery> {
    let mut seen = std::collections::HashSet::new();
    hits.into_iter()
        .filter_map(|hit| {
            let key = format!("{}|{}", hit.title, hit.artist);
            seen.insert(key).then_some(ResolvedQuery {
                title: hit.title,
                artist: hit.artist,
            })
        })
        .collect()
}

/// Stable sort by descending language priority
fn sort_by_language_priority(queries: &mut [ResolvedQuery]) {
    queries.sort_by_key(|q| std::cmp::Reverse(language_priority(&q.title)));
}

/// Language priority of a title
///
/// CJK ideographs without kana read as Chinese (3); any kana reads as
/// Japanese (2); everything else is 1.
fn language_priority(text: &str) -> u8 {
    let has_kana = text.chars().any(is_kana);
    if has_kana {
        return 2;
    }
    if text.chars().any(is_cjk_ideograph) {
        return 3;
    }
    1
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}
