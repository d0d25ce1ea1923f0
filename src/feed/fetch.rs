use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

pub(crate) const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Responses past this size are rejected without being buffered.
pub(crate) const MAX_FEED_SIZE: usize = 15_000_000;

/// Errors that can occur while fetching a page or feed.
///
/// All variants are recoverable: the caller skips the affected URL and
/// moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the 10-second timeout
    #[error("request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the size ceiling
    #[error("response too large")]
    TooLarge,
}

/// Fetch a URL and return its body, bounded by [`FETCH_TIMEOUT`] and
/// [`MAX_FEED_SIZE`]. No retries: a failed fetch is terminal for this
/// attempt.
pub(crate) async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, MAX_FEED_SIZE).await
}

/// Reads a response body with a size limit using stream-based reading, so an
/// oversized response is rejected before it is fully buffered.
pub(crate) async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
