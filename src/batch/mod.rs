//! Local batch coordination over a bounded worker pool.
//!
//! URLs are processed concurrently with at most `workers` pipelines in
//! flight. Results are collected in completion order, not submission order;
//! every submitted URL contributes exactly one entry because the pipeline
//! itself is total.

use futures_util::StreamExt;
use thiserror::Error;
use tracing::{info, instrument};

use crate::pipeline::{ItemProcessor, ItemResult};

/// Default size of the worker pool.
pub const DEFAULT_WORKERS: usize = 5;

/// Errors from batch validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// The submitted batch contained no URLs.
    #[error("batch contains no URLs")]
    EmptyBatch,
}

/// Runs item pipelines for a batch of URLs with bounded concurrency.
#[derive(Clone)]
pub struct BatchProcessor {
    processor: ItemProcessor,
    workers: usize,
}

impl BatchProcessor {
    /// Creates a batch processor with the default pool size.
    #[must_use]
    pub fn new(processor: ItemProcessor) -> Self {
        Self {
            processor,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Creates a batch processor with a custom pool size.
    ///
    /// A pool size of zero is clamped to one.
    #[must_use]
    pub fn with_workers(processor: ItemProcessor, workers: usize) -> Self {
        Self {
            processor,
            workers: workers.max(1),
        }
    }

    /// Returns the configured pool size.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Processes every URL in the batch and returns one result per URL.
    ///
    /// Results arrive in completion order. Per-URL failures are entries in
    /// the output, never errors from this call.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::EmptyBatch`] if `urls` is empty.
    #[instrument(skip_all, fields(urls = urls.len(), workers = self.workers))]
    pub async fn run(&self, urls: &[String]) -> Result<Vec<ItemResult>, BatchError> {
        if urls.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let futures: Vec<_> = urls.iter().map(|url| self.processor.process(url)).collect();
        let results: Vec<ItemResult> = futures_util::stream::iter(futures)
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            total = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            "batch complete"
        );

        Ok(results)
    }
}
