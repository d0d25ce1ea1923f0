//! Podcast feed discovery, validation, and ingestion.
//!
//! The pipeline has three operations:
//!
//! - [`discover`] - fetch a web page, collect candidate feed URLs, and return
//!   the ones that validate as podcast feeds
//! - [`validate`] - decide whether raw bytes are a podcast feed and extract
//!   its episodes
//! - [`ingest`] - fetch a feed, re-validate it, and persist its episodes
//!   atomically
//!
//! Network and parse failures are per-URL: they shrink the result set or
//! come back as typed errors, and never abort work on other URLs.

pub mod candidates;
mod discovery;
mod fetch;
mod ingest;
mod validator;

pub use discovery::discover;
pub use fetch::FetchError;
pub use ingest::{ingest, refresh_all, IngestError, RefreshOutcome};
pub use validator::{validate, FeedValidation, ParsedEntry};
