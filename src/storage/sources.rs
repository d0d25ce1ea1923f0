use super::schema::Database;
use super::types::{DatabaseError, FeedSource};

impl Database {
    // ========================================================================
    // Feed Source Operations
    // ========================================================================

    /// All subscribed feed sources, in insertion order.
    pub async fn list_sources(&self) -> Result<Vec<FeedSource>, DatabaseError> {
        let sources = sqlx::query_as::<_, FeedSource>(
            r#"
            SELECT id, url, last_updated
            FROM rss_sources
            ORDER BY id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sources)
    }

    /// Look up a single source by feed URL.
    pub async fn source_for_url(&self, url: &str) -> Result<Option<FeedSource>, DatabaseError> {
        let source = sqlx::query_as::<_, FeedSource>(
            "SELECT id, url, last_updated FROM rss_sources WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(source)
    }
}
