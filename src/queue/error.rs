//! Error types for task queue operations.

use thiserror::Error;

/// Errors that can occur during task queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Task not found.
    #[error("task not found: id {0}")]
    TaskNotFound(i64),

    /// No batch exists with the given id.
    #[error("unknown batch: {0}")]
    BatchNotFound(String),

    /// A batch was submitted with no URLs.
    #[error("batch contains no URLs")]
    EmptyBatch,

    /// A stored task result could not be serialized or parsed.
    #[error("invalid task result payload: {0}")]
    ResultPayload(#[from] serde_json::Error),
}
