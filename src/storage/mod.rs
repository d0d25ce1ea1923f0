//! Persistent episode library backed by SQLite.
//!
//! Two tables: `podcasts` (episodes, deduplicated store-wide by guid) and
//! `rss_sources` (subscribed feed URLs). Both use insert-or-replace upserts
//! keyed by their UNIQUE column, and one ingestion pass writes both inside a
//! single transaction.

mod episodes;
mod schema;
mod sources;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, Episode, EpisodeRecord, FeedSource};
