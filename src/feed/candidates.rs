//! Candidate feed URLs for a web page: explicit `<link>` tags first, then
//! well-known path guesses.

/// Paths probed on every page, in this order, after any explicit links.
const GUESSED_PATHS: [&str; 4] = ["/feed", "/rss", "/podcast.xml", "/episodes.xml"];

/// Collect candidate feed URLs for a page.
///
/// Scans the HTML for `<link>` tags whose `type` attribute names an RSS, XML,
/// or Atom media type, resolves each `href` against `page_url`, then appends
/// the well-known path guesses. The result is deduplicated in first-seen
/// order, so explicit links always come before the guesses.
///
/// Pure: no network access, no validation of what the URLs point at.
pub fn generate(page_url: &str, page_html: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for href in feed_link_hrefs(page_html) {
        push_unique(&mut candidates, resolve_url(href, page_url));
    }

    let base = page_url.trim_end_matches('/');
    for path in GUESSED_PATHS {
        push_unique(&mut candidates, format!("{base}{path}"));
    }

    candidates
}

fn push_unique(candidates: &mut Vec<String>, url: String) {
    if !candidates.iter().any(|c| c == &url) {
        candidates.push(url);
    }
}

/// Scans HTML for `<link>` tags with a feed-like `type` attribute and
/// returns their `href` values in document order.
///
/// Uses simple string scanning (no HTML parser dependency). Handles attribute
/// ordering variations and both quote styles. Scanning positions are found in
/// an ASCII-lowercased copy, which is byte-compatible with the original, so
/// href values keep their case.
fn feed_link_hrefs(html: &str) -> Vec<&str> {
    let html_lower = html.to_ascii_lowercase();
    let mut hrefs = Vec::new();
    let mut search_from = 0;

    while let Some(link_start) = html_lower[search_from..].find("<link") {
        let abs_start = search_from + link_start;
        let remaining = &html_lower[abs_start..];

        let tag_end = match remaining.find('>') {
            Some(pos) => pos,
            None => break,
        };

        let tag_lower = &remaining[..=tag_end];

        if is_feed_type(tag_lower) {
            // Extract href from the original (non-lowered) HTML to preserve URL case
            let original_tag = &html[abs_start..abs_start + tag_end + 1];
            if let Some(href) = extract_attr_value(original_tag, "href") {
                hrefs.push(href);
            }
        }

        search_from = abs_start + tag_end + 1;
    }

    hrefs
}

/// Checks if a lowercased `<link>` tag declares a feed-like `type` attribute.
fn is_feed_type(tag_lower: &str) -> bool {
    match extract_attr_value(tag_lower, "type") {
        Some(value) => {
            value.contains("rss") || value.contains("xml") || value.contains("atom")
        }
        None => false,
    }
}

/// Extracts the value of an attribute from a tag string (case-preserving).
fn extract_attr_value<'a>(tag: &'a str, attr_name: &str) -> Option<&'a str> {
    let tag_lower = tag.to_ascii_lowercase();
    let attr_prefix = format!("{attr_name}=");

    let attr_start = tag_lower.find(&attr_prefix)?;
    let value_start = attr_start + attr_prefix.len();

    if value_start >= tag.len() {
        return None;
    }

    let rest = &tag[value_start..];
    let quote = rest.as_bytes().first()?;

    if *quote != b'"' && *quote != b'\'' {
        return None;
    }

    let quote_char = *quote as char;
    let inner = &rest[1..];
    let end = inner.find(quote_char)?;

    Some(&inner[..end])
}

/// Resolves a potentially relative URL against a base URL.
fn resolve_url(href: &str, base_url: &str) -> String {
    // Already absolute
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_owned();
    }

    // Protocol-relative: normalize through the URL parser
    if href.starts_with("//") {
        let with_scheme = format!("https:{}", href);
        if let Ok(parsed) = url::Url::parse(&with_scheme) {
            return parsed.to_string();
        }
    }

    // Relative URL: resolve against base
    if let Ok(base) = url::Url::parse(base_url) {
        if let Ok(resolved) = base.join(href) {
            return resolved.to_string();
        }
    }

    // Fallback: return as-is
    href.to_owned()
}
