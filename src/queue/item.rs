//! Task types and status definitions for the distributed broker.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pipeline::ItemResult;

/// Status of a broker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be claimed (includes tasks scheduled for retry).
    Pending,
    /// Currently held by a worker.
    Running,
    /// Finished with a stored item result.
    Completed,
    /// Exhausted its retry budget without producing a result.
    Failed,
}

impl TaskStatus {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid task status: {s}")),
        }
    }
}

/// A single per-URL task in the broker.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    /// Unique identifier.
    pub id: i64,
    /// Batch this task belongs to.
    pub batch_id: String,
    /// The URL to process.
    pub url: String,
    /// Current status (stored as text, parsed via `status()`).
    #[sqlx(rename = "status")]
    pub status_str: String,
    /// Number of claims so far; the first claim makes this 1.
    pub attempt: i64,
    /// Earliest claim time for a scheduled retry, or None.
    pub not_before: Option<String>,
    /// Serialized item result once the task settles.
    pub result: Option<String>,
    /// Last error message from a failed attempt.
    pub last_error: Option<String>,
    /// When the task was created.
    pub created_at: String,
    /// When the task was last updated.
    pub updated_at: String,
}

impl Task {
    /// Returns the parsed status enum.
    ///
    /// Falls back to `Pending` if the status string is invalid.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status_str.parse().unwrap_or(TaskStatus::Pending)
    }

    /// Parses the stored item result, if the task has settled with one.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the stored payload is not valid JSON
    /// for an item result.
    pub fn item_result(&self) -> Result<Option<ItemResult>, serde_json::Error> {
        self.result
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task {{ id: {}, batch: {}, url: {}, status: {}, attempt: {} }}",
            self.id,
            self.batch_id,
            self.url,
            self.status(),
            self.attempt
        )
    }
}
