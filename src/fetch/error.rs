//! Error types for the fetch module.
//!
//! Expected network failure modes are structured errors, not panics: the
//! pipeline converts them into per-item failure results.

use thiserror::Error;

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed to fetch.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

// Note: no `From<reqwest::Error>` impl on purpose. Every variant carries the
// URL for context, which the source error does not provide; the helper
// constructors are the intended construction path.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_includes_url() {
        let error = FetchError::timeout("https://example.com/a");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/a"));
    }

    #[test]
    fn test_http_status_display_includes_status_and_url() {
        let error = FetchError::http_status("https://example.com/a", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "expected '503' in: {msg}");
        assert!(msg.contains("https://example.com/a"), "expected URL in: {msg}");
    }

    #[test]
    fn test_invalid_url_display() {
        let error = FetchError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "expected input in: {msg}");
    }
}
