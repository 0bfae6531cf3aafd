//! Error types for the analyze module.

use thiserror::Error;

/// Errors that can occur during summarization or classification.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The analysis endpoint could not be reached.
    #[error("analysis request failed: {source}")]
    Network {
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("analysis API returned {status}: {message}")]
    Api {
        /// HTTP status code from the endpoint.
        status: u16,
        /// Response body, truncated for logging.
        message: String,
    },

    /// The response body did not contain a usable completion.
    #[error("malformed analysis response: {message}")]
    InvalidResponse {
        /// What was wrong with the response.
        message: String,
    },

    /// The model answered with a label outside the candidate set.
    #[error("classifier returned unknown label: {label:?}")]
    UnknownLabel {
        /// The rejected answer.
        label: String,
    },

    /// Required configuration is missing from the environment.
    #[error("missing configuration: {name} is not set")]
    MissingConfig {
        /// The environment variable name.
        name: String,
    },
}

impl AnalysisError {
    /// Creates a network error from a reqwest error.
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    /// Creates an API error from a status and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates an unknown-label error.
    pub fn unknown_label(label: impl Into<String>) -> Self {
        Self::UnknownLabel {
            label: label.into(),
        }
    }

    /// Creates a missing-configuration error.
    pub fn missing_config(name: impl Into<String>) -> Self {
        Self::MissingConfig { name: name.into() }
    }
}
