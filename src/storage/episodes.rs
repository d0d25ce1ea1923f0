use super::schema::Database;
use super::types::{DatabaseError, Episode, EpisodeRecord};

impl Database {
    // ========================================================================
    // Episode Operations
    // ========================================================================

    /// Complete one ingestion pass atomically: upsert every episode keyed by
    /// guid, then upsert the source row with the ingestion timestamp.
    ///
    /// All writes share a single transaction. If any upsert fails the whole
    /// pass rolls back, so the source timestamp never advances past a
    /// half-written batch.
    ///
    /// A guid collision replaces the prior row's fields in place
    /// (last-write-wins), including `feed_url` when the episode was last seen
    /// in a different feed. Surrogate ids are stable across replacements.
    ///
    /// # Returns
    ///
    /// The number of episode rows written (inserted or replaced).
    pub async fn complete_ingest(
        &self,
        feed_url: &str,
        episodes: &[EpisodeRecord],
        ingested_at: i64,
    ) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0usize;

        for episode in episodes {
            sqlx::query(
                r#"
                INSERT INTO podcasts (title, description, audio_url, guid, feed_url, pub_date)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(guid) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    audio_url = excluded.audio_url,
                    feed_url = excluded.feed_url,
                    pub_date = excluded.pub_date
            "#,
            )
            .bind(&episode.title)
            .bind(&episode.description)
            .bind(&episode.audio_url)
            .bind(&episode.guid)
            .bind(feed_url)
            .bind(episode.pub_date)
            .execute(&mut *tx)
            .await?;

            written += 1;
        }

        sqlx::query(
            r#"
            INSERT INTO rss_sources (url, last_updated)
            VALUES (?, ?)
            ON CONFLICT(url) DO UPDATE SET last_updated = excluded.last_updated
        "#,
        )
        .bind(feed_url)
        .bind(ingested_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(written)
    }

    /// Most recent episodes across all feeds, newest first.
    pub async fn recent_episodes(&self, limit: i64) -> Result<Vec<Episode>, DatabaseError> {
        let episodes = sqlx::query_as::<_, Episode>(
            r#"
            SELECT id, title, description, audio_url, guid, feed_url, pub_date
            FROM podcasts
            ORDER BY pub_date DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(episodes)
    }

    /// All episodes last seen in the given feed, newest first.
    pub async fn episodes_for_feed(&self, feed_url: &str) -> Result<Vec<Episode>, DatabaseError> {
        let episodes = sqlx::query_as::<_, Episode>(
            r#"
            SELECT id, title, description, audio_url, guid, feed_url, pub_date
            FROM podcasts
            WHERE feed_url = ?
            ORDER BY pub_date DESC, id DESC
        "#,
        )
        .bind(feed_url)
        .fetch_all(&self.pool)
        .await?;

        Ok(episodes)
    }

    /// Total number of stored episodes.
    pub async fn episode_count(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM podcasts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
