use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

/// Handle to the episode library. Cheap to clone; every clone shares the
/// same connection pool. Opened once per process and passed to whoever
/// needs it.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InstanceLocked` if another process has the
    /// database locked (SQLITE_BUSY, SQLITE_LOCKED, SQLITE_CANTOPEN).
    /// Returns `DatabaseError::Migration` if the schema could not be created.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to release
        // before returning SQLITE_BUSY, so concurrent ingestions of the same
        // feed serialize instead of failing. Using pragma() ensures all
        // connections in the pool inherit the setting.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000");

        // SQLite is single-writer; 5 connections covers peak concurrent
        // readers (ingest transactions + listing queries).
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            // Migration errors could also be lock-related
            let error_string = e.to_string().to_lowercase();
            if error_string.contains("database is locked")
                || error_string.contains("database table is locked")
                || error_string.contains("sqlite_busy")
                || error_string.contains("sqlite_locked")
            {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        Ok(db)
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// If any step fails the whole migration rolls back, leaving the database
    /// in its previous consistent state. All statements use `IF NOT EXISTS`,
    /// so re-running on an existing database is a no-op.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Episodes, deduplicated store-wide by guid
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS podcasts (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                audio_url TEXT NOT NULL,
                guid TEXT UNIQUE NOT NULL,
                feed_url TEXT NOT NULL,
                pub_date INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Subscribed feed URLs, one row per distinct feed
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rss_sources (
                id INTEGER PRIMARY KEY,
                url TEXT UNIQUE NOT NULL,
                last_updated INTEGER
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Backs the recent-episodes listing
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_podcasts_pub_date ON podcasts(pub_date DESC)",
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_podcasts_feed_url ON podcasts(feed_url)")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
