//! Database access for the lyrics service

pub mod store;

pub use store::{LyricsStore, PersistenceRecord, StoreError};

use loreley_common::Result;
use sqlx::SqlitePool;

/// Initialize lyrics-service tables
///
/// One key-value table holds both per-track persistence records and
/// query-level search caches; the `SEARCH:` key prefix keeps the families
/// disjoint.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lyrics_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (lyrics_store)");

    Ok(())
}
