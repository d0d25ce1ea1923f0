use feed_rs::model::Entry;
use feed_rs::parser;

/// A feed entry that qualifies as a podcast episode: it carries a stable
/// identifier and a playable audio enclosure.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub guid: String,
    pub title: String,
    pub summary: String,
    /// First enclosure whose declared media type starts with `audio/`
    pub audio_url: String,
    /// Unix epoch seconds, absent when the feed omits a timestamp
    pub published: Option<i64>,
}

/// Outcome of podcast validation over raw feed bytes.
///
/// An unparseable document is a normal negative result (`valid = false`,
/// parser detail in `detail`), never an error.
#[derive(Debug)]
pub struct FeedValidation {
    pub valid: bool,
    /// Entries that qualify as episodes. Entries missing a guid or an audio
    /// enclosure are excluded without invalidating the feed.
    pub entries: Vec<ParsedEntry>,
    /// Why the feed was rejected, when it was
    pub detail: Option<String>,
}

impl FeedValidation {
    fn rejected(detail: impl Into<String>) -> Self {
        Self {
            valid: false,
            entries: Vec::new(),
            detail: Some(detail.into()),
        }
    }
}

/// Decide whether raw bytes constitute a podcast feed.
///
/// A feed is valid only if it parses as RSS/Atom, has at least one entry,
/// and at least one entry carries an `audio/*` enclosure.
pub fn validate(feed_bytes: &[u8]) -> FeedValidation {
    let feed = match parser::parse(feed_bytes) {
        Ok(feed) => feed,
        Err(e) => return FeedValidation::rejected(e.to_string()),
    };

    if feed.entries.is_empty() {
        return FeedValidation::rejected("feed has no entries");
    }

    let has_audio = feed.entries.iter().any(|e| first_audio_enclosure(e).is_some());
    if !has_audio {
        return FeedValidation::rejected("no entry carries an audio enclosure");
    }

    let entries = feed.entries.into_iter().filter_map(parse_entry).collect();

    FeedValidation {
        valid: true,
        entries,
        detail: None,
    }
}

/// Extract episode fields from one entry, or `None` when it lacks a guid or
/// a qualifying enclosure.
fn parse_entry(entry: Entry) -> Option<ParsedEntry> {
    let guid = entry.id.trim().to_owned();
    if guid.is_empty() {
        return None;
    }

    let audio_url = first_audio_enclosure(&entry)?;

    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let summary = entry.summary.map(|s| s.content).unwrap_or_default();
    let published = entry.published.or(entry.updated).map(|dt| dt.timestamp());

    Some(ParsedEntry {
        guid,
        title,
        summary,
        audio_url,
        published,
    })
}

/// First enclosure on the entry whose declared media type starts with
/// `audio/`.
fn first_audio_enclosure(entry: &Entry) -> Option<String> {
    // RSS <enclosure> and media:content both land in the media objects
    for media in &entry.media {
        for content in &media.content {
            let is_audio = content
                .content_type
                .as_ref()
                .map(|mime| mime.to_string().starts_with("audio/"))
                .unwrap_or(false);
            if is_audio {
                if let Some(url) = &content.url {
                    return Some(url.to_string());
                }
            }
        }
    }

    // Atom feeds expose enclosures as rel="enclosure" links
    entry
        .links
        .iter()
        .find(|link| {
            link.rel.as_deref() == Some("enclosure")
                && link
                    .media_type
                    .as_deref()
                    .map(|t| t.starts_with("audio/"))
                    .unwrap_or(false)
        })
        .map(|link| link.href.clone())
}
