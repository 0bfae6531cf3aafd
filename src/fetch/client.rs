//! HTTP client wrapper for fetching article pages.
//!
//! The client is created once and shared by all concurrent pipeline workers,
//! taking advantage of connection pooling. Transient server errors are
//! retried internally per the configured [`RetryPolicy`]; everything else
//! maps to a terminal [`FetchError`].

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total per-request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Identifying User-Agent sent with every request.
const USER_AGENT: &str = concat!(
    "coinbrief/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/fierce/coinbrief)"
);

/// HTTP client for fetching page text with internal transient-error retry.
///
/// # Example
///
/// ```no_run
/// use coinbrief::fetch::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let html = client.fetch_text("https://example.com/article").await?;
/// println!("fetched {} bytes", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts and retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retry_policy(RetryPolicy::default())
    }

    /// Creates a new HTTP client with a custom retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_retry_policy(retry_policy: RetryPolicy) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            retry_policy,
        }
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Fetches a URL and returns the response body as text.
    ///
    /// Transient server statuses (500, 502, 503, 504) are retried with
    /// exponential backoff up to the policy's budget. Network errors,
    /// timeouts and other statuses are terminal for this call.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status after any retries
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        // Validate up front so a garbage URL never reaches the wire
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut attempt: u32 = 1;

        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "fetch succeeded");
                    return Ok(body);
                }
                Err(e) => {
                    let failure_type = classify_error(&e);
                    match self.retry_policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next,
                        } => {
                            warn!(
                                attempt,
                                next_attempt = next,
                                delay_ms = delay.as_millis(),
                                error = %e,
                                "transient fetch failure; backing off"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(attempt, %reason, error = %e, "fetch failed");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Performs a single GET attempt.
    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        response.text().await.map_err(|e| map_request_error(url, e))
    }
}

/// Maps a reqwest error to the appropriate fetch error variant.
fn map_request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}
