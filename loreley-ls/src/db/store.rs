//! Key-value persistence for candidate lists and selections
//!
//! Values are JSON `{"results": [...], "selectedId": ...}` records keyed by
//! either a per-track persistence key or a `SEARCH:`-prefixed query key.
//! The store is deliberately dumb: get and put, no iteration, no TTL.

use crate::models::LyricCandidate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

/// Persistence store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Stored state for one key: the candidates last seen plus the selected id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceRecord {
    pub results: Vec<LyricCandidate>,
    #[serde(rename = "selectedId")]
    pub selected_id: Option<String>,
}

impl PersistenceRecord {
    /// The candidate the stored selection points at, if any
    pub fn selected(&self) -> Option<&LyricCandidate> {
        let id = self.selected_id.as_deref()?;
        self.results.iter().find(|c| c.id == id)
    }
}

/// SQLite-backed key-value store
#[derive(Clone)]
pub struct LyricsStore {
    pool: SqlitePool,
}

impl LyricsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the raw JSON value under a key
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM lyrics_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Store a raw JSON value under a key (upsert)
    pub async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO lyrics_store (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch and decode the record under a key
    ///
    /// A record that fails to decode is treated as absent; old or corrupt
    /// entries must not poison a load.
    pub async fn get_record(&self, key: &str) -> Result<Option<PersistenceRecord>, StoreError> {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable persistence record");
                Ok(None)
            }
        }
    }

    /// Encode and store the record under a key
    pub async fn put_record(
        &self,
        key: &str,
        record: &PersistenceRecord,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.put(key, &raw).await
    }
}
