use chrono::Utc;
use thiserror::Error;

use crate::feed::fetch::{self, FetchError};
use crate::feed::validator;
use crate::storage::{Database, DatabaseError, EpisodeRecord};
use crate::util::validate_url;

/// Errors that can end an ingestion attempt.
///
/// All of these are per-feed: a caller looping over several feeds is
/// expected to log the failure and continue with the next one.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The feed URL failed validation (bad scheme, private address, etc.)
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),
    /// The feed could not be fetched within the timeout and size bounds
    #[error("feed is unreachable: {0}")]
    Unreachable(#[from] FetchError),
    /// The response fetched fine but is not a podcast feed
    #[error("not a valid podcast feed: {detail}")]
    InvalidFeed { detail: String },
    /// The write transaction failed; nothing was committed
    #[error("failed to store episodes: {0}")]
    Storage(#[from] DatabaseError),
}

/// Outcome of re-ingesting one stored source during [`refresh_all`].
#[derive(Debug)]
pub struct RefreshOutcome {
    pub feed_url: String,
    pub result: Result<usize, IngestError>,
}

/// Fetch a feed, validate it, and persist its episodes.
///
/// Episodes are upserted by guid and the source row's `last_updated` is
/// bumped, all within one transaction — a failure mid-batch leaves the
/// store untouched.
///
/// # Returns
///
/// The number of episode rows written.
pub async fn ingest(
    db: &Database,
    client: &reqwest::Client,
    feed_url: &str,
) -> Result<usize, IngestError> {
    validate_url(feed_url).map_err(|e| IngestError::InvalidUrl(e.to_string()))?;
    ingest_feed(db, client, feed_url).await
}

/// Ingestion without the URL policy check. Used for stored sources (vetted
/// when first ingested) and for tests against a local mock server.
pub(crate) async fn ingest_feed(
    db: &Database,
    client: &reqwest::Client,
    feed_url: &str,
) -> Result<usize, IngestError> {
    let bytes = fetch::fetch_bytes(client, feed_url).await?;

    let validation = validator::validate(&bytes);
    if !validation.valid {
        return Err(IngestError::InvalidFeed {
            detail: validation
                .detail
                .unwrap_or_else(|| "failed podcast validation".to_owned()),
        });
    }

    let now = Utc::now().timestamp();
    let episodes: Vec<EpisodeRecord> = validation
        .entries
        .into_iter()
        .filter_map(|entry| {
            // The validator already excludes these; double-check before the
            // rows reach storage
            if entry.guid.is_empty() || entry.audio_url.is_empty() {
                tracing::warn!(feed = %feed_url, "skipping entry without guid or audio enclosure");
                return None;
            }
            Some(EpisodeRecord {
                guid: entry.guid,
                title: entry.title,
                description: entry.summary,
                audio_url: entry.audio_url,
                pub_date: entry.published.unwrap_or(now),
            })
        })
        .collect();

    let written = db.complete_ingest(feed_url, &episodes, now).await?;
    tracing::info!(feed = %feed_url, episodes = written, "feed ingested");
    Ok(written)
}

/// Re-ingest every stored feed source, collecting a per-feed outcome.
///
/// One feed's failure never aborts the batch; outcomes come back in the
/// store's listing order.
pub async fn refresh_all(
    db: &Database,
    client: &reqwest::Client,
) -> Result<Vec<RefreshOutcome>, DatabaseError> {
    let sources = db.list_sources().await?;
    let mut outcomes = Vec::with_capacity(sources.len());

    for source in sources {
        let result = ingest_feed(db, client, &source.url).await;
        if let Err(e) = &result {
            tracing::warn!(feed = %source.url, error = %e, "refresh failed");
        }
        outcomes.push(RefreshOutcome {
            feed_url: source.url,
            result,
        });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PODCAST_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Mock Cast</title>
    <item>
      <guid>ep-1</guid>
      <title>Episode One</title>
      <description>First.</description>
      <enclosure url="https://cdn.example.com/ep1.mp3" type="audio/mpeg" length="1"/>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
      <guid>ep-2</guid>
      <title>Episode Two</title>
      <description>Second.</description>
      <enclosure url="https://cdn.example.com/ep2.mp3" type="audio/mpeg" length="1"/>
      <pubDate>Mon, 08 Jan 2024 00:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const NO_AUDIO_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Text Only</title>
    <item><guid>post-1</guid><title>A Post</title></item>
  </channel>
</rss>"#;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn mock_feed_route(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_ingest_writes_episodes() {
        let server = MockServer::start().await;
        mock_feed_route(&server, "/feed.xml", PODCAST_RSS).await;

        let db = test_db().await;
        let client = reqwest::Client::new();
        let feed_url = format!("{}/feed.xml", server.uri());

        let written = ingest_feed(&db, &client, &feed_url).await.unwrap();
        assert_eq!(written, 2);

        let episodes = db.recent_episodes(10).await.unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].guid, "ep-2", "newest first");
        assert_eq!(episodes[0].feed_url, feed_url);
        assert_eq!(episodes[0].audio_url, "https://cdn.example.com/ep2.mp3");

        let sources = db.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].last_updated.is_some());
    }

    #[tokio::test]
    async fn test_ingest_twice_is_idempotent() {
        let server = MockServer::start().await;
        mock_feed_route(&server, "/feed.xml", PODCAST_RSS).await;

        let db = test_db().await;
        let client = reqwest::Client::new();
        let feed_url = format!("{}/feed.xml", server.uri());

        ingest_feed(&db, &client, &feed_url).await.unwrap();
        let first = db.recent_episodes(10).await.unwrap();

        let written = ingest_feed(&db, &client, &feed_url).await.unwrap();
        assert_eq!(written, 2);
        let second = db.recent_episodes(10).await.unwrap();

        assert_eq!(first, second, "unchanged feed must not change rows");
        assert_eq!(db.list_sources().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shared_guid_across_feeds_last_write_wins() {
        let server = MockServer::start().await;
        let original = PODCAST_RSS;
        let renamed = PODCAST_RSS.replace("Episode One", "Episode One (Remastered)");
        mock_feed_route(&server, "/a.xml", original).await;
        mock_feed_route(&server, "/b.xml", &renamed).await;

        let db = test_db().await;
        let client = reqwest::Client::new();

        ingest_feed(&db, &client, &format!("{}/a.xml", server.uri()))
            .await
            .unwrap();
        ingest_feed(&db, &client, &format!("{}/b.xml", server.uri()))
            .await
            .unwrap();

        let episodes = db.recent_episodes(10).await.unwrap();
        assert_eq!(episodes.len(), 2, "shared guids deduplicate store-wide");

        let ep1 = episodes.iter().find(|e| e.guid == "ep-1").unwrap();
        assert_eq!(ep1.title, "Episode One (Remastered)");
        assert_eq!(ep1.feed_url, format!("{}/b.xml", server.uri()));
    }

    #[tokio::test]
    async fn test_unreachable_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let db = test_db().await;
        let client = reqwest::Client::new();

        let result = ingest_feed(&db, &client, &format!("{}/gone.xml", server.uri())).await;
        match result.unwrap_err() {
            IngestError::Unreachable(FetchError::HttpStatus(404)) => {}
            e => panic!("expected Unreachable(HttpStatus(404)), got {:?}", e),
        }

        // Nothing persisted
        assert!(db.list_sources().await.unwrap().is_empty());
        assert_eq!(db.episode_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_podcast_feed_is_invalid() {
        let server = MockServer::start().await;
        mock_feed_route(&server, "/blog.xml", NO_AUDIO_RSS).await;

        let db = test_db().await;
        let client = reqwest::Client::new();

        let result = ingest_feed(&db, &client, &format!("{}/blog.xml", server.uri())).await;
        match result.unwrap_err() {
            IngestError::InvalidFeed { detail } => {
                assert_eq!(detail, "no entry carries an audio enclosure");
            }
            e => panic!("expected InvalidFeed, got {:?}", e),
        }

        assert!(db.list_sources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_feed_carries_parser_detail() {
        let server = MockServer::start().await;
        mock_feed_route(&server, "/junk", "<definitely not xml").await;

        let db = test_db().await;
        let client = reqwest::Client::new();

        let result = ingest_feed(&db, &client, &format!("{}/junk", server.uri())).await;
        match result.unwrap_err() {
            IngestError::InvalidFeed { detail } => assert!(!detail.is_empty()),
            e => panic!("expected InvalidFeed, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_missing_pub_date_defaults_to_ingestion_time() {
        let undated = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Undated Cast</title>
    <item>
      <guid>ep-1</guid>
      <title>No date</title>
      <enclosure url="https://cdn.example.com/ep.mp3" type="audio/mpeg" length="1"/>
    </item>
  </channel>
</rss>"#;
        let server = MockServer::start().await;
        mock_feed_route(&server, "/undated.xml", undated).await;

        let db = test_db().await;
        let client = reqwest::Client::new();

        let before = Utc::now().timestamp();
        ingest_feed(&db, &client, &format!("{}/undated.xml", server.uri()))
            .await
            .unwrap();
        let after = Utc::now().timestamp();

        let episodes = db.recent_episodes(1).await.unwrap();
        assert!(episodes[0].pub_date >= before && episodes[0].pub_date <= after);
    }

    #[tokio::test]
    async fn test_public_ingest_rejects_loopback_url() {
        let server = MockServer::start().await;
        mock_feed_route(&server, "/feed.xml", PODCAST_RSS).await;

        let db = test_db().await;
        let client = reqwest::Client::new();

        let result = ingest(&db, &client, &format!("{}/feed.xml", server.uri())).await;
        assert!(matches!(result.unwrap_err(), IngestError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_refresh_all_continues_past_failures() {
        let server = MockServer::start().await;
        mock_feed_route(&server, "/good.xml", PODCAST_RSS).await;
        // /dead.xml has no mock and 404s

        let db = test_db().await;
        let client = reqwest::Client::new();

        let good = format!("{}/good.xml", server.uri());
        let dead = format!("{}/dead.xml", server.uri());

        // Seed both sources; the dead one via an empty ingest pass
        ingest_feed(&db, &client, &good).await.unwrap();
        db.complete_ingest(&dead, &[], 0).await.unwrap();

        let outcomes = refresh_all(&db, &client).await.unwrap();
        assert_eq!(outcomes.len(), 2);

        let good_outcome = outcomes.iter().find(|o| o.feed_url == good).unwrap();
        assert_eq!(*good_outcome.result.as_ref().unwrap(), 2);

        let dead_outcome = outcomes.iter().find(|o| o.feed_url == dead).unwrap();
        assert!(dead_outcome.result.is_err());
    }

    #[tokio::test]
    async fn test_refresh_all_with_no_sources() {
        let db = test_db().await;
        let client = reqwest::Client::new();
        let outcomes = refresh_all(&db, &client).await.unwrap();
        assert!(outcomes.is_empty());
    }
}
