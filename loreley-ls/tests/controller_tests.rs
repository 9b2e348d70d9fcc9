//! Selection controller integration tests
//!
//! Exercises the full load pipeline with scripted providers and an
//! in-memory store: priority order, streaming auto-promotion with lock,
//! request supersession, selection persistence and the search cache.

mod helpers;

use helpers::*;
use loreley_common::events::{EventBus, LoreleyEvent};
use loreley_ls::db::PersistenceRecord;
use loreley_ls::models::{EMBEDDED_SOURCE, LOCAL_SOURCE};
use loreley_ls::providers::LyricsProvider;
use loreley_ls::services::selection_controller::LoadOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

/// Drain every event currently buffered on a receiver
fn drain(rx: &mut tokio::sync::broadcast::Receiver<LoreleyEvent>) -> Vec<LoreleyEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    events
}

fn published_scores(events: &[LoreleyEvent]) -> Vec<i32> {
    events
        .iter()
        .filter_map(|e| match e {
            LoreleyEvent::LyricsPublished { score, .. } => Some(*score),
            _ => None,
        })
        .collect()
}

/// Streaming auto-promotion with lock-in.
///
/// Candidates score 42 / 50 / 62 / 70 / 90 against the song below and
/// arrive in that order. Expected published scores: none for 42 (at or
/// below the selection floor), then 50, 62, 70; 70 locks, so the
/// later-arriving 90 is ignored.
#[tokio::test]
async fn test_auto_promotion_locks_and_ignores_later_better() {
    let mut track = song("AAAAAAAAAA", "Artist");
    track.album = "Album".to_string();

    let providers: Vec<Arc<dyn LyricsProvider>> = vec![
        StaticProvider::new("p42", 0, vec![lrc_candidate("c42", "AAABBBBBBB", "Artist")]),
        StaticProvider::new("p50", 80, vec![lrc_candidate("c50", "AAAAABBBBB", "Artist")]),
        StaticProvider::new("p62", 160, vec![lrc_candidate("c62", "AAAAAAAABB", "Artist")]),
        StaticProvider::new("p70", 240, vec![lrc_candidate("c70", "AAAAAAAAAA", "Artist")]),
        StaticProvider::new(
            "p90",
            320,
            vec![lrc_candidate_with_album("c90", "AAAAAAAAAA", "Artist", "Album")],
        ),
    ];

    let event_bus = EventBus::new(64);
    let controller = controller_with(providers, memory_store().await, event_bus);
    let mut rx = controller.subscribe();

    let published = controller.load(&track, LoadOptions::default()).await;
    assert!(published);

    let events = drain(&mut rx);
    assert_eq!(published_scores(&events), vec![50, 62, 70]);

    let locked: Vec<i32> = events
        .iter()
        .filter_map(|e| match e {
            LoreleyEvent::SelectionLocked { score, .. } => Some(*score),
            _ => None,
        })
        .collect();
    assert_eq!(locked, vec![70]);

    // The published selection stays at the locked candidate even though a
    // higher-scoring one arrived afterwards.
    let lyrics = controller.current_lyrics().unwrap();
    assert_eq!(lyrics.metadata.get("score").map(String::as_str), Some("70"));

    // The merged result list still ranks the late arrival first.
    let results = controller.last_search_results();
    assert_eq!(results[0].id, "c90");
    assert_eq!(results[0].score, 90);
}

/// A candidate at the selection floor is not auto-selected mid-stream but
/// is still published as best-effort once the search completes.
#[tokio::test]
async fn test_floor_score_publishes_only_after_completion() {
    // Title at edit distance 5 of 8 scores exactly 45 with an exact artist.
    let providers: Vec<Arc<dyn LyricsProvider>> = vec![StaticProvider::new(
        "floor",
        0,
        vec![lrc_candidate("c45", "AAABBBBB", "Artist")],
    )];

    let event_bus = EventBus::new(64);
    let controller = controller_with(providers, memory_store().await, event_bus);
    let mut rx = controller.subscribe();

    let published = controller.load(&song("AAAAAAAA", "Artist"), LoadOptions::default()).await;
    assert!(published);

    let events = drain(&mut rx);
    assert_eq!(published_scores(&events), vec![45]);

    // The publish happened at completion, after the provider batch event.
    let batch_pos = events
        .iter()
        .position(|e| matches!(e, LoreleyEvent::ProviderBatch { .. }))
        .unwrap();
    let publish_pos = events
        .iter()
        .position(|e| matches!(e, LoreleyEvent::LyricsPublished { .. }))
        .unwrap();
    assert!(publish_pos > batch_pos);
}

#[tokio::test]
async fn test_embedded_lyrics_publish_without_search() {
    let provider = StaticProvider::new("remote", 0, vec![lrc_candidate("r", "Title", "Artist")]);
    let providers: Vec<Arc<dyn LyricsProvider>> = vec![provider.clone()];

    let controller = controller_with(providers, memory_store().await, EventBus::new(16));

    let mut track = song("Title", "Artist");
    track.embedded_lyrics = Some("[00:01.00]From the tags".to_string());

    assert!(controller.load(&track, LoadOptions::default()).await);

    let lyrics = controller.current_lyrics().unwrap();
    assert_eq!(
        lyrics.metadata.get("source").map(String::as_str),
        Some(EMBEDDED_SOURCE)
    );
    assert_eq!(lyrics.metadata.get("score").map(String::as_str), Some("100"));
    assert_eq!(provider.call_count(), 0, "no provider search expected");
}

#[tokio::test]
async fn test_local_file_beats_embedded() {
    let controller = controller_with(Vec::new(), memory_store().await, EventBus::new(16));

    let mut track = song("Title", "Artist");
    track.embedded_lyrics = Some("[00:01.00]From the tags".to_string());

    let options = LoadOptions {
        local_lrc_content: Some("[00:01.00]From the sidecar".to_string()),
        ..Default::default()
    };
    assert!(controller.load(&track, options).await);

    let lyrics = controller.current_lyrics().unwrap();
    assert_eq!(
        lyrics.metadata.get("source").map(String::as_str),
        Some(LOCAL_SOURCE)
    );

    // Both synthetic candidates are offered in the result list.
    let results = controller.last_search_results();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source, LOCAL_SOURCE);
    assert_eq!(results[1].source, EMBEDDED_SOURCE);
}

#[tokio::test]
async fn test_persisted_selection_beats_embedded() {
    let store = memory_store().await;
    let chosen = lrc_candidate("chosen", "Title", "Artist");
    store
        .put_record(
            "Title|Artist",
            &PersistenceRecord {
                results: vec![lrc_candidate("other", "Title", "Artist"), chosen.clone()],
                selected_id: Some("chosen".to_string()),
            },
        )
        .await
        .unwrap();

    let controller = controller_with(Vec::new(), store, EventBus::new(16));

    let mut track = song("Title", "Artist");
    track.embedded_lyrics = Some("[00:01.00]From the tags".to_string());

    assert!(controller.load(&track, LoadOptions::default()).await);

    let lyrics = controller.current_lyrics().unwrap();
    assert_eq!(
        lyrics.metadata.get("source").map(String::as_str),
        Some("Test"),
        "the persisted selection wins over embedded lyrics"
    );

    // The embedded candidate is still offered at the front of the list.
    let results = controller.last_search_results();
    assert_eq!(results[0].source, EMBEDDED_SOURCE);
}

#[tokio::test]
async fn test_select_round_trips_through_persistence() {
    let store = memory_store().await;
    let providers: Vec<Arc<dyn LyricsProvider>> = vec![StaticProvider::new(
        "p",
        0,
        vec![
            lrc_candidate("best", "AAAAABBBBB", "Artist"),
            lrc_candidate("second", "AAABBBBBBB", "Artist"),
        ],
    )];
    let controller = controller_with(providers, store, EventBus::new(64));

    let track = song("AAAAAAAAAA", "Artist");
    assert!(controller.load(&track, LoadOptions::default()).await);

    // Results are score-ordered; pick the lower-ranked candidate.
    let results = controller.last_search_results();
    assert_eq!(results[0].id, "best");
    assert_eq!(results[1].id, "second");
    assert!(controller.select(1, true).await);

    let cached = controller.cached_selection(&track).await.unwrap();
    assert_eq!(cached.id, "second");

    // A fresh load of the same track restores the user's choice.
    assert!(controller.load(&track, LoadOptions::default()).await);
    let lyrics = controller.current_lyrics().unwrap();
    assert_eq!(
        lyrics.metadata.get("ti").map(String::as_str),
        Some("AAABBBBBBB")
    );
}

#[tokio::test]
async fn test_select_out_of_range_returns_false() {
    let controller = controller_with(Vec::new(), memory_store().await, EventBus::new(16));
    assert!(!controller.select(0, true).await);
    assert!(controller.current_lyrics().is_none());
}

#[tokio::test]
async fn test_no_candidates_fails_load() {
    let providers: Vec<Arc<dyn LyricsProvider>> =
        vec![StaticProvider::new("empty", 0, Vec::new())];
    let controller = controller_with(providers, memory_store().await, EventBus::new(16));

    assert!(!controller.load(&song("Unknown", "Nobody"), LoadOptions::default()).await);
    assert!(controller.current_lyrics().is_none());
    assert!(controller.last_search_results().is_empty());
}

#[tokio::test]
async fn test_search_cache_short_circuits_providers() {
    let store = memory_store().await;
    store
        .put_record(
            "SEARCH:Cached Song|Artist|LIMIT:10",
            &PersistenceRecord {
                results: vec![lrc_candidate("cached", "Cached Song", "Artist")],
                selected_id: None,
            },
        )
        .await
        .unwrap();

    let provider = StaticProvider::new("remote", 0, vec![lrc_candidate("r", "X", "Y")]);
    let providers: Vec<Arc<dyn LyricsProvider>> = vec![provider.clone()];
    let controller = controller_with(providers, store, EventBus::new(16));

    assert!(controller.load(&song("Cached Song", "Artist"), LoadOptions::default()).await);
    assert_eq!(provider.call_count(), 0);
    assert_eq!(controller.last_search_results()[0].id, "cached");
}

#[tokio::test]
async fn test_newer_load_supersedes_older() {
    let providers: Vec<Arc<dyn LyricsProvider>> = vec![StaticProvider::new(
        "slow",
        400,
        vec![lrc_candidate("slow", "First Song", "Artist")],
    )];
    let controller = controller_with(providers, memory_store().await, EventBus::new(64));

    let first = song("First Song", "Artist");
    let first_load = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.load(&first, LoadOptions::default()).await })
    };

    // Give the first load time to start searching, then supersede it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut second = song("Second Song", "Artist");
    second.embedded_lyrics = Some("[00:01.00]Second song line".to_string());
    assert!(controller.load(&second, LoadOptions::default()).await);

    assert!(!first_load.await.unwrap(), "superseded load reports false");

    assert_eq!(controller.current_song_key(), "Second Song|Artist");
    let lyrics = controller.current_lyrics().unwrap();
    assert_eq!(
        lyrics.metadata.get("source").map(String::as_str),
        Some(EMBEDDED_SOURCE)
    );
    assert_eq!(controller.last_search_results().len(), 1);
}

#[tokio::test]
async fn test_search_results_persisted_under_both_keys() {
    let store = memory_store().await;
    let providers: Vec<Arc<dyn LyricsProvider>> = vec![StaticProvider::new(
        "p",
        0,
        vec![lrc_candidate("only", "AAAAAAAAAA", "Artist")],
    )];
    let controller = controller_with(providers, store.clone(), EventBus::new(64));

    assert!(controller.load(&song("AAAAAAAAAA", "Artist"), LoadOptions::default()).await);

    let search_record = store
        .get_record("SEARCH:AAAAAAAAAA|Artist|LIMIT:10")
        .await
        .unwrap()
        .expect("search cache written");
    assert!(search_record.selected_id.is_none());
    assert_eq!(search_record.results.len(), 1);

    let track_record = store
        .get_record("AAAAAAAAAA|Artist")
        .await
        .unwrap()
        .expect("persistence record written");
    assert_eq!(track_record.selected_id.as_deref(), Some("only"));
}
