use crate::feed::candidates;
use crate::feed::fetch;
use crate::feed::validator;
use crate::util::validate_url;

/// Discover confirmed podcast feed URLs reachable from a web page.
///
/// Fetches the page, generates candidate feed URLs (explicit `<link>` tags
/// plus well-known path guesses), probes each candidate, and returns the
/// ones that validate as podcast feeds, in candidate order.
///
/// Never fails: an unreachable page, a rejected URL, or a page without any
/// valid feed all yield an empty list. Per-candidate failures are logged and
/// skipped; they never abort the remaining candidates.
pub async fn discover(client: &reqwest::Client, page_url: &str) -> Vec<String> {
    if let Err(e) = validate_url(page_url) {
        tracing::warn!(url = %page_url, error = %e, "rejecting discovery request");
        return Vec::new();
    }

    discover_impl(client, page_url, true).await
}

/// Discovery without the URL policy checks, for exercising the pipeline
/// against a local mock server.
#[cfg(test)]
pub(crate) async fn discover_candidates(client: &reqwest::Client, page_url: &str) -> Vec<String> {
    discover_impl(client, page_url, false).await
}

async fn discover_impl(
    client: &reqwest::Client,
    page_url: &str,
    enforce_url_policy: bool,
) -> Vec<String> {
    let html = match fetch::fetch_bytes(client, page_url).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(url = %page_url, error = %e, "failed to fetch page");
            return Vec::new();
        }
    };

    let mut confirmed = Vec::new();
    for candidate in candidates::generate(page_url, &html) {
        if enforce_url_policy {
            if let Err(e) = validate_url(&candidate) {
                tracing::debug!(url = %candidate, error = %e, "candidate rejected by URL policy");
                continue;
            }
        }
        if probe_candidate(client, &candidate).await {
            confirmed.push(candidate);
        }
    }

    tracing::info!(url = %page_url, confirmed = confirmed.len(), "discovery finished");
    confirmed
}

/// Fetch one candidate and check whether it is a podcast feed. Any failure
/// just disqualifies this candidate.
async fn probe_candidate(client: &reqwest::Client, candidate: &str) -> bool {
    let bytes = match fetch::fetch_bytes(client, candidate).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(url = %candidate, error = %e, "candidate fetch failed");
            return false;
        }
    };

    let validation = validator::validate(&bytes);
    if !validation.valid {
        tracing::debug!(
            url = %candidate,
            detail = validation.detail.as_deref().unwrap_or(""),
            "candidate is not a podcast feed"
        );
    }
    validation.valid
}
