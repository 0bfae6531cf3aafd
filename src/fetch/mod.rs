//! Article fetching over HTTP.
//!
//! This module provides the [`HttpClient`] used by the pipeline to retrieve
//! raw page markup, together with the retry policy and error taxonomy for
//! expected network failure modes.

mod client;
mod error;
mod retry;

pub use client::HttpClient;
pub use error::FetchError;
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error,
};
