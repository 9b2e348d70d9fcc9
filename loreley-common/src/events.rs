//! Event types for the Loreley event system
//!
//! Provides the shared event definitions and the EventBus used to fan state
//! changes out to subscribers (SSE clients, tests, future services).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Loreley event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All lyric-state changes flow through this central enum so
/// consumers get exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoreleyEvent {
    /// A lyrics search was dispatched to the providers
    ///
    /// Triggers:
    /// - SSE: show "searching" indicator
    SearchStarted {
        /// Load request this search belongs to
        request_id: Uuid,
        /// Persistence key of the track being resolved
        track_key: String,
        /// When the search started
        timestamp: DateTime<Utc>,
    },

    /// One provider finished and contributed a scored batch
    ///
    /// Triggers:
    /// - SSE: update per-provider progress
    ProviderBatch {
        /// Load request this batch belongs to
        request_id: Uuid,
        /// Provider name (e.g. "Netease", "LRCLIB")
        provider: String,
        /// Number of candidates in the batch
        candidates: usize,
        /// Best score in the batch (None for an empty batch)
        best_score: Option<i32>,
        /// When the batch arrived
        timestamp: DateTime<Utc>,
    },

    /// All providers completed for a search
    SearchCompleted {
        /// Load request this search belongs to
        request_id: Uuid,
        /// Persistence key of the track being resolved
        track_key: String,
        /// Total merged candidate count
        total: usize,
        /// When the search completed
        timestamp: DateTime<Utc>,
    },

    /// New lyrics were published as the current selection
    ///
    /// Triggers:
    /// - SSE: swap the displayed lyrics
    LyricsPublished {
        /// Load request that produced this selection
        request_id: Uuid,
        /// Persistence key of the track
        track_key: String,
        /// Source of the published candidate (provider or "Local File" /
        /// "Embedded (ID3)")
        source: String,
        /// Relevance score of the published candidate
        score: i32,
        /// Number of parsed lyric lines
        lines: usize,
        /// When the lyrics were published
        timestamp: DateTime<Utc>,
    },

    /// The current selection reached lock quality; auto-promotion stopped
    SelectionLocked {
        /// Load request that locked
        request_id: Uuid,
        /// Persistence key of the track
        track_key: String,
        /// Locked candidate id
        candidate_id: String,
        /// Score at lock time
        score: i32,
        /// When the lock occurred
        timestamp: DateTime<Utc>,
    },

    /// A selection was written to the persistence store
    SelectionSaved {
        /// Persistence key the record was stored under
        track_key: String,
        /// Selected candidate id
        candidate_id: String,
        /// When the record was saved
        timestamp: DateTime<Utc>,
    },
}

impl LoreleyEvent {
    /// Event type name for SSE event framing and logging
    pub fn event_type(&self) -> &'static str {
        match self {
            LoreleyEvent::SearchStarted { .. } => "SearchStarted",
            LoreleyEvent::ProviderBatch { .. } => "ProviderBatch",
            LoreleyEvent::SearchCompleted { .. } => "SearchCompleted",
            LoreleyEvent::LyricsPublished { .. } => "LyricsPublished",
            LoreleyEvent::SelectionLocked { .. } => "SelectionLocked",
            LoreleyEvent::SelectionSaved { .. } => "SelectionSaved",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LoreleyEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Events beyond the capacity are dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LoreleyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LoreleyEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<LoreleyEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Used for events where a missing subscriber is acceptable.
    pub fn emit_lossy(&self, event: LoreleyEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
