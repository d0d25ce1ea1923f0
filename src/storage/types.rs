use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process has the episode library locked
    #[error("Another process appears to be using the podcast library. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Episode fields extracted from a validated feed, ready for persistence.
///
/// Transient: only lives between validation and the upsert that writes it.
/// `pub_date` is always resolved by the caller (entry timestamp, or the
/// ingestion timestamp when the feed omitted one).
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub pub_date: i64,
}

/// Episode row as stored.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Episode {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub guid: String,
    pub feed_url: String,
    /// Unix epoch seconds
    pub pub_date: i64,
}

/// Feed source row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct FeedSource {
    pub id: i64,
    pub url: String,
    /// Unix epoch seconds of the last successful ingestion, if any
    pub last_updated: Option<i64>,
}
