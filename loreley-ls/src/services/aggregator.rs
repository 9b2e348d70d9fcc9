//! Multi-provider search aggregation
//!
//! Fans a search out to every registered provider concurrently, scores each
//! provider's batch as it completes, streams the scored batches to an
//! optional callback, and returns the merged result sorted by score.
//!
//! Per-provider error isolation: a failing provider contributes an empty
//! batch and never aborts the search. The partial callback runs on the
//! caller's task, so callers may mutate their own state from it without
//! extra synchronization.

use super::query_resolver::QueryResolver;
use super::scorer;
use crate::models::{LyricCandidate, SearchAliases, SongInformation};
use crate::providers::LyricsProvider;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Callback invoked with each provider's scored batch, in completion order
pub type PartialCallback<'a> = &'a mut (dyn FnMut(&[LyricCandidate]) + Send);

/// Concurrent search across all registered providers
pub struct Aggregator {
    resolver: QueryResolver,
    providers: Vec<Arc<dyn LyricsProvider>>,
}

impl Aggregator {
    pub fn new(resolver: QueryResolver, providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self {
            resolver,
            providers,
        }
    }

    /// Registered provider count
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Search all providers for the track
    ///
    /// Resolves alternate queries first and attaches them to `song` so both
    /// the providers and the scorer see the same expansion. The returned
    /// sequence is sorted by score descending with stable tie-breaking on
    /// arrival order. Cancelling the token abandons outstanding providers
    /// and returns what has arrived so far.
    pub async fn search(
        &self,
        song: &mut SongInformation,
        limit: usize,
        cancel: &CancellationToken,
        mut on_partial: Option<PartialCallback<'_>>,
    ) -> Vec<LyricCandidate> {
        let queries = self.resolver.resolve_queries(song).await;
        song.search_aliases = Some(SearchAliases {
            titles: queries.iter().map(|q| q.title.clone()).collect(),
            artists: queries.iter().map(|q| q.artist.clone()).collect(),
        });

        let (tx, mut rx) = mpsc::channel::<(&'static str, Vec<LyricCandidate>)>(
            self.providers.len().max(1),
        );

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let song_snapshot = song.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let name = provider.name();
                let batch = tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(provider = name, "Provider search cancelled");
                        Vec::new()
                    }
                    result = provider.search(&song_snapshot, limit) => match result {
                        Ok(candidates) => candidates,
                        Err(e) => {
                            tracing::warn!(
                                provider = name,
                                error = %e,
                                "Provider search failed; contributing empty batch"
                            );
                            Vec::new()
                        }
                    },
                };
                let _ = tx.send((name, batch)).await;
            });
        }
        drop(tx);

        let mut merged: Vec<LyricCandidate> = Vec::new();
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => None,
                msg = rx.recv() => msg,
            };
            let Some((name, mut batch)) = received else {
                break;
            };

            // Drop candidates that violate the provider contract rather
            // than let them reach selection.
            batch.retain(|c| !c.lyric_text.is_empty());
            for candidate in &mut batch {
                candidate.score = scorer::score(song, candidate);
            }
            batch.sort_by_key(|c| std::cmp::Reverse(c.score));

            tracing::debug!(
                provider = name,
                candidates = batch.len(),
                best = batch.first().map(|c| c.score),
                "Provider batch scored"
            );

            if let Some(callback) = on_partial.as_mut() {
                callback(&batch);
            }
            merged.extend(batch);
        }

        if cancel.is_cancelled() {
            tracing::debug!("Search cancelled before completion");
        }

        merged.sort_by_key(|c| std::cmp::Reverse(c.score));
        merged
    }
}
