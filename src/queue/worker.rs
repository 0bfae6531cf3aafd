//! Worker loop that claims and processes broker tasks.

use std::time::Duration;

use tracing::{debug, error, info, instrument};

use super::{Result, Task, TaskQueue};
use crate::pipeline::ItemProcessor;

/// Default pause between claim attempts when the queue is empty.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Claims tasks from the broker and runs the item pipeline on them.
///
/// The pipeline itself is total, so a returned result — success or failure —
/// always completes the task. Only an attempt that breaks before returning
/// (a panic in processing, surfacing as a join error) feeds the task retry
/// mechanism.
pub struct Worker {
    queue: TaskQueue,
    processor: ItemProcessor,
    poll_interval: Duration,
}

impl Worker {
    /// Creates a worker over the given broker and pipeline.
    #[must_use]
    pub fn new(queue: TaskQueue, processor: ItemProcessor) -> Self {
        Self {
            queue,
            processor,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the idle poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs the worker until the process is stopped.
    ///
    /// Recovers tasks left running by a crashed worker before entering the
    /// claim loop.
    ///
    /// # Errors
    ///
    /// Returns [`super::QueueError`] if a broker operation fails.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<()> {
        let recovered = self.queue.reset_running().await?;
        if recovered > 0 {
            info!(recovered, "recovered tasks from a previous session");
        }

        info!("worker started");
        loop {
            match self.queue.claim().await? {
                Some(task) => self.process_task(task).await?,
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    /// Processes claimable tasks until the queue has none left right now.
    ///
    /// Tasks waiting out a retry delay are not claimable and remain in the
    /// queue when this returns.
    ///
    /// # Returns
    ///
    /// The number of tasks processed.
    ///
    /// # Errors
    ///
    /// Returns [`super::QueueError`] if a broker operation fails.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> Result<u64> {
        let mut processed = 0;
        while let Some(task) = self.queue.claim().await? {
            self.process_task(task).await?;
            processed += 1;
        }
        debug!(processed, "queue drained");
        Ok(processed)
    }

    /// Runs one claimed task and settles it in the broker.
    ///
    /// The pipeline runs in its own spawned task so a panic is contained as
    /// a join error instead of taking the worker down.
    async fn process_task(&self, task: Task) -> Result<()> {
        debug!(id = task.id, url = %task.url, attempt = task.attempt, "processing task");

        let processor = self.processor.clone();
        let url = task.url.clone();
        let handle = tokio::spawn(async move { processor.process(&url).await });

        match handle.await {
            Ok(result) => self.queue.complete(task.id, &result).await,
            Err(e) => {
                error!(id = task.id, error = %e, "task attempt broke before returning");
                self.queue.retry_or_fail(&task, &e.to_string()).await?;
                Ok(())
            }
        }
    }
}
