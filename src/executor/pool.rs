//! Worker pool batch executor
//!
//! Dispatches every submitted task across a bounded set of concurrent
//! slots, enforces each task's deadline from its own dispatch time, and
//! streams results back in completion order. A fault in one task never
//! prevents the others from producing their own result.

use anyhow::{bail, Result};
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;
use tracing::{info, warn};

use super::isolation::IsolationStrategy;
use crate::models::{BatchSummary, TaskResult, TestTask};
use crate::utils::Timer;

/// Batch executor with a fixed number of concurrent execution slots
pub struct BatchExecutor {
    max_workers: usize,
    timeout_per_test: Duration,
    strategy: Arc<dyn IsolationStrategy>,
}

impl BatchExecutor {
    /// Configuration errors are rejected here, before any dispatch.
    pub fn new(
        max_workers: usize,
        timeout_per_test: Duration,
        strategy: Arc<dyn IsolationStrategy>,
    ) -> Result<Self> {
        if max_workers < 1 {
            bail!("max_workers must be at least 1, got {max_workers}");
        }
        if timeout_per_test.is_zero() {
            bail!("timeout_per_test must be positive");
        }

        Ok(Self {
            max_workers,
            timeout_per_test,
            strategy,
        })
    }

    /// Enqueue every task and return the completion stream: a finite,
    /// non-restartable sequence ordered by completion time, not
    /// submission time. At most `max_workers` tasks run at any instant;
    /// the rest queue on the semaphore.
    pub fn submit_all(&self, tasks: Vec<TestTask>) -> mpsc::Receiver<TaskResult> {
        let (tx, rx) = mpsc::channel(tasks.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        for task in tasks {
            let tx = tx.clone();
            let semaphore = semaphore.clone();
            let strategy = self.strategy.clone();
            let timeout_per_test = self.timeout_per_test;

            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();

                let identifier = task.identifier();
                let dispatched_at = Utc::now();

                let execution = AssertUnwindSafe(strategy.execute(&task)).catch_unwind();
                let result = match timeout(timeout_per_test, execution).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(panic)) => {
                        warn!("Task {} panicked", identifier);
                        TaskResult::errored(
                            &identifier,
                            dispatched_at,
                            Utc::now(),
                            0,
                            0,
                            format!("task panicked: {}", panic_message(&panic)),
                        )
                    }
                    Err(_) => {
                        warn!(
                            "Task {} abandoned after {:.1}s timeout",
                            identifier,
                            timeout_per_test.as_secs_f64()
                        );
                        TaskResult::errored(
                            &identifier,
                            dispatched_at,
                            Utc::now(),
                            0,
                            0,
                            format!(
                                "timed out after {:.1}s",
                                timeout_per_test.as_secs_f64()
                            ),
                        )
                    }
                };

                // Receiver dropped means the caller abandoned the batch
                let _ = tx.send(result).await;
            });
        }

        rx
    }

    /// Run a whole batch to completion and aggregate its results.
    pub async fn run_batch(&self, tasks: Vec<TestTask>) -> BatchSummary {
        let total = tasks.len();
        info!(
            "Running {} tests ({} isolation, max {} concurrent, {:.0}s timeout each)",
            total,
            self.strategy.name(),
            self.max_workers,
            self.timeout_per_test.as_secs_f64()
        );

        let timer = Timer::start("batch");
        let mut rx = self.submit_all(tasks);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = rx.recv().await {
            info!("  {result}");
            results.push(result);
        }

        let summary = BatchSummary::from_results(results, timer.elapsed());
        info!(
            "Batch completed in {:.2}s - {}/{} successful, speedup {:.2}x",
            summary.wall_clock_seconds, summary.successful, summary.total, summary.speedup_factor
        );

        summary
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
