//! Retry logic with exponential backoff for transient fetch failures.
//!
//! A failed fetch is classified into a [`FailureType`]; the [`RetryPolicy`]
//! then decides whether another attempt is worthwhile. Only a small set of
//! transient server statuses is retryable — network errors, timeouts and
//! client errors are terminal for the current call, because the pipeline
//! reports them as per-item failures instead of spinning on a dead host.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::FetchError;

/// Default retry budget beyond the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default base delay for exponential backoff.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);

/// Default maximum delay cap.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Maximum jitter added to delays.
const MAX_JITTER: Duration = Duration::from_millis(100);

/// HTTP statuses treated as transient server failures.
const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Classification of fetch failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary server-side failure that may succeed on retry.
    Transient,
    /// Failure that won't succeed on retry within this call.
    ///
    /// Covers client errors, unexpected statuses, network errors and
    /// timeouts — the caller surfaces these as item failures.
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the fetch after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the fetch.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for fetch retry behavior with exponential backoff.
///
/// Delay formula: `min(base_delay * 2^(attempt-1), max_delay) + jitter`.
/// With defaults the retry delays are roughly 300 ms then 600 ms.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries beyond the initial attempt.
    max_retries: u32,
    /// Base delay for the first retry.
    base_delay: Duration,
    /// Maximum delay cap.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Creates a policy with a custom retry budget, defaults elsewhere.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Returns the configured retry budget.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Determines whether to retry after a failed attempt.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "terminal failure - retry would not help".to_string(),
            };
        }

        // attempt 1 is the initial try; retries are attempts 2..=1+max_retries
        if attempt > self.max_retries {
            debug!(attempt, max_retries = self.max_retries, "retry budget exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("retry budget ({}) exhausted", self.max_retries),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the delay for a retry with exponential backoff and jitter.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt - 1);
        let delay_ms = base_ms * 2.0_f64.powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + calculate_jitter()
    }
}

/// Generates random jitter between 0 and `MAX_JITTER`.
///
/// Jitter prevents a thundering herd when concurrent fetches against the
/// same host fail and retry at the same moment.
fn calculate_jitter() -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Classifies a fetch error into a failure type for retry decisions.
///
/// Only the transient server statuses (500, 502, 503, 504) are retryable;
/// everything else — including timeouts and connection errors — is terminal
/// for the current fetch call.
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { status, .. } if RETRYABLE_STATUSES.contains(status) => {
            FailureType::Transient
        }
        FetchError::HttpStatus { .. }
        | FetchError::Timeout { .. }
        | FetchError::Network { .. }
        | FetchError::InvalidUrl { .. } => FailureType::Permanent,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(300));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_classify_retryable_server_statuses() {
        for status in [500, 502, 503, 504] {
            let error = FetchError::http_status("http://example.com", status);
            assert_eq!(
                classify_error(&error),
                FailureType::Transient,
                "status {status} should be transient"
            );
        }
    }

    #[test]
    fn test_classify_client_errors_permanent() {
        for status in [400, 403, 404, 410, 429] {
            let error = FetchError::http_status("http://example.com", status);
            assert_eq!(
                classify_error(&error),
                FailureType::Permanent,
                "status {status} should be permanent"
            );
        }
    }

    #[test]
    fn test_classify_unlisted_server_status_permanent() {
        // 501 Not Implemented is not in the forcelist
        let error = FetchError::http_status("http://example.com", 501);
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_classify_timeout_permanent() {
        let error = FetchError::timeout("http://example.com");
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_classify_invalid_url_permanent() {
        let error = FetchError::invalid_url("not-a-url");
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    #[test]
    fn test_should_retry_transient_within_budget() {
        let policy = RetryPolicy::default();

        // Attempts 1 and 2 may retry (budget is 2 retries)
        let decision = policy.should_retry(FailureType::Transient, 1);
        assert!(matches!(decision, RetryDecision::Retry { attempt: 2, .. }));

        let decision = policy.should_retry(FailureType::Transient, 2);
        assert!(matches!(decision, RetryDecision::Retry { attempt: 3, .. }));
    }

    #[test]
    fn test_should_retry_exhausted_after_budget() {
        let policy = RetryPolicy::default();

        // Attempt 3 is the last permitted attempt; its failure is terminal
        let decision = policy.should_retry(FailureType::Transient, 3);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("exhausted"));
        }
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy::default();

        let first = policy.calculate_delay(1);
        let second = policy.calculate_delay(2);

        // ~300ms + jitter vs ~600ms + jitter
        assert!(first >= Duration::from_millis(300));
        assert!(first <= Duration::from_millis(400));
        assert!(second >= Duration::from_millis(600));
        assert!(second <= Duration::from_millis(700));
    }

    #[test]
    fn test_delay_respects_max_cap() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(2));
        let delay = policy.calculate_delay(6);
        assert!(delay <= Duration::from_millis(2100));
    }

    #[test]
    fn test_jitter_within_bounds() {
        for _ in 0..100 {
            let jitter = calculate_jitter();
            assert!(jitter <= MAX_JITTER, "jitter {} exceeds max", jitter.as_millis());
        }
    }
}
