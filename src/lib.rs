//! Coinbrief Core Library
//!
//! This library fetches web articles, extracts their readable text, and
//! analyzes them (summary plus topic classification) in batches.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - HTTP client with transient-error retry
//! - [`extract`] - Readability extraction with a DOM fallback
//! - [`analyze`] - Summarization and classification via a chat endpoint
//! - [`pipeline`] - Per-URL fetch → extract → analyze pipeline
//! - [`batch`] - Local batch coordination over a bounded worker pool
//! - [`db`] - Database connection and schema management
//! - [`queue`] - SQLite-backed task broker for the distributed variant
//! - [`server`] - HTTP front end for batch processing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analyze;
pub mod batch;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod queue;
pub mod server;

// Re-export commonly used types
pub use analyze::{Analyzer, AnalyzerConfig, CANDIDATE_LABELS, OpenAiAnalyzer};
pub use batch::{BatchError, BatchProcessor, DEFAULT_WORKERS};
pub use db::Database;
pub use extract::{ExtractedArticle, extract_article};
pub use fetch::{
    DEFAULT_MAX_RETRIES, FailureType, FetchError, HttpClient, RetryDecision, RetryPolicy,
    classify_error,
};
pub use pipeline::{ItemProcessor, ItemResult};
pub use queue::{Task, TaskQueue, TaskStatus, Worker};
