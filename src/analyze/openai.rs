//! OpenAI-compatible chat completions client for analysis.
//!
//! Both operations are single-turn chat completions with temperature 0, so
//! repeated runs over the same article give the same summary and label. The
//! base URL is configurable, which also lets tests point the analyzer at a
//! mock server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::error::AnalysisError;
use super::{Analyzer, match_label};

/// Default OpenAI-compatible endpoint base.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default model when none is configured.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Request timeout for analysis calls in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Maximum article characters sent to the model per call.
const INPUT_CHAR_LIMIT: usize = 1024;

/// Completion cap for summaries; the prompt asks for 100-200 words.
const SUMMARY_MAX_TOKENS: u32 = 300;

/// Completion cap for classification; the answer is a single label.
const CLASSIFY_MAX_TOKENS: u32 = 10;

/// Maximum error-body characters kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

/// Connection settings for the analysis endpoint.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Bearer token for the endpoint.
    pub api_key: String,
    /// Endpoint base URL, without the `/chat/completions` suffix.
    pub api_base: String,
    /// Model identifier to request.
    pub model: String,
}

impl AnalyzerConfig {
    /// Builds a config with default endpoint and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Reads the config from the environment.
    ///
    /// `OPENAI_API_KEY` is required; `COINBRIEF_API_BASE` and
    /// `COINBRIEF_MODEL` override the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingConfig`] when the API key is unset.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AnalysisError::missing_config("OPENAI_API_KEY"))?;

        let api_base = std::env::var("COINBRIEF_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let model =
            std::env::var("COINBRIEF_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            api_base,
            model,
        })
    }

    /// Overrides the endpoint base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Overrides the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// [`Analyzer`] backed by an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiAnalyzer {
    client: Client,
    config: AnalyzerConfig,
}

impl OpenAiAnalyzer {
    /// Creates an analyzer for the given endpoint configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: AnalyzerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, config }
    }

    /// Sends one chat completion and returns the assistant message content.
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, AnalysisError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            // Temperature 0 keeps repeated analysis of the same text stable
            temperature: 0.0,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(AnalysisError::network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = truncate_chars(&body, ERROR_BODY_LIMIT);
            warn!(status = status.as_u16(), "analysis API error");
            return Err(AnalysisError::api(status.as_u16(), message));
        }

        let parsed: ChatResponse = response.json().await.map_err(AnalysisError::network)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AnalysisError::invalid_response("response contained no choices"))?;

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AnalysisError::invalid_response("completion was empty"));
        }

        debug!(bytes = content.len(), "completion received");
        Ok(content)
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn summarize(&self, text: &str) -> Result<String, AnalysisError> {
        let excerpt = truncate_chars(text, INPUT_CHAR_LIMIT);
        let prompt = format!(
            "Summarize the following article in 100 to 200 words of plain prose. \
             Respond with the summary only.\n\n{excerpt}"
        );
        self.complete(prompt, SUMMARY_MAX_TOKENS).await
    }

    async fn classify(
        &self,
        text: &str,
        candidates: &[&str],
    ) -> Result<String, AnalysisError> {
        let excerpt = truncate_chars(text, INPUT_CHAR_LIMIT);
        let labels = candidates.join(", ");
        let prompt = format!(
            "Which of these topics best matches the following article: {labels}? \
             Respond with exactly one topic from the list and nothing else.\n\n{excerpt}"
        );

        let answer = self.complete(prompt, CLASSIFY_MAX_TOKENS).await?;
        match_label(&answer, candidates).ok_or_else(|| AnalysisError::unknown_label(answer))
    }
}

/// Truncates on a char boundary at most `limit` characters in.
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnalyzerConfig::new("sk-test");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_config_builder_overrides() {
        let config = AnalyzerConfig::new("sk-test")
            .with_api_base("http://localhost:9999/v1")
            .with_model("test-model");
        assert_eq!(config.api_base, "http://localhost:9999/v1");
        assert_eq!(config.model, "test-model");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte chars must not be split
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn test_chat_request_serializes_temperature() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: "hi".to_string(),
            }],
            temperature: 0.0,
            max_tokens: 300,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_chat_response_deserializes() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Bitcoin"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Bitcoin");
    }

    // Live request/response behavior is covered with a mock server in
    // tests/analyze_integration.rs
}
