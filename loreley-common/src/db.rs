//! Shared SQLite pool initialization

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize a database connection pool for the given file path
///
/// Creates the parent directory if needed and opens the database in
/// read-write-create mode. Table creation is owned by the service crates.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    Ok(pool)
}
