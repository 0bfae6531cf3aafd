//! Article analysis: summarization and topic classification.
//!
//! The pipeline talks to the analyzer through the [`Analyzer`] trait so tests
//! can substitute a deterministic stub. The production implementation,
//! [`OpenAiAnalyzer`], calls an OpenAI-compatible chat completions endpoint.
//!
//! Classification is a closed-set decision: the model must pick one of
//! [`CANDIDATE_LABELS`], and anything else is rejected rather than passed
//! through, so downstream consumers can rely on the label vocabulary.

mod error;
mod openai;

pub use error::AnalysisError;
pub use openai::{AnalyzerConfig, OpenAiAnalyzer};

use async_trait::async_trait;

/// The fixed label set for topic classification.
pub const CANDIDATE_LABELS: [&str; 4] = ["Bitcoin", "Ethereum", "Tether", "Other"];

/// Summarization and classification over extracted article text.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Produces a short prose summary of the article body.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the backing service fails or returns an
    /// unusable response.
    async fn summarize(&self, text: &str) -> Result<String, AnalysisError>;

    /// Assigns one label from `candidates` to the article body.
    ///
    /// The pipeline always passes [`CANDIDATE_LABELS`]; the trait takes the
    /// set explicitly so implementations stay reusable.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the backing service fails, returns an
    /// unusable response, or answers with a label outside the candidate set.
    async fn classify(&self, text: &str, candidates: &[&str])
    -> Result<String, AnalysisError>;
}

/// Maps a model answer onto the canonical candidate label, ignoring case
/// and surrounding whitespace or punctuation the model may add.
pub(crate) fn match_label(answer: &str, candidates: &[&str]) -> Option<String> {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '.' || c == '"' || c == '\'' || c == '`');
    candidates
        .iter()
        .find(|label| label.eq_ignore_ascii_case(cleaned))
        .map(ToString::to_string)
}
