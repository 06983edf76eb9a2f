//! Task result and batch summary models
//!
//! Defines per-test outcomes and the aggregate statistics derived from a
//! completed batch.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Outcome of one executed task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Every activity completed
    Success,
    /// An activity failed; later activities were not attempted
    Failed,
    /// Fault, timeout, or setup problem outside any single activity
    Errored,
}

impl TaskStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TaskStatus::Success => "✓",
            TaskStatus::Failed => "✗",
            TaskStatus::Errored => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "SUCCESS"),
            TaskStatus::Failed => write!(f, "FAILED"),
            TaskStatus::Errored => write!(f, "ERROR"),
        }
    }
}

/// Result of a single test execution. Immutable once built; exactly one
/// exists per submitted task, synthesized on fault or timeout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    pub test_file: String,
    pub status: TaskStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub activities_executed: u32,
    pub activities_failed: u32,
    pub error_message: Option<String>,
    pub screenshots_captured: Vec<String>,
}

impl TaskResult {
    fn build(
        test_file: impl Into<String>,
        status: TaskStatus,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        activities_executed: u32,
        activities_failed: u32,
        error_message: Option<String>,
        screenshots_captured: Vec<String>,
    ) -> Self {
        let duration_seconds = (end_time - start_time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            test_file: test_file.into(),
            status,
            start_time,
            end_time,
            duration_seconds,
            activities_executed,
            activities_failed,
            error_message,
            screenshots_captured,
        }
    }

    pub fn success(
        test_file: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        activities_executed: u32,
        screenshots_captured: Vec<String>,
    ) -> Self {
        Self::build(
            test_file,
            TaskStatus::Success,
            start_time,
            end_time,
            activities_executed,
            0,
            None,
            screenshots_captured,
        )
    }

    pub fn failed(
        test_file: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        activities_executed: u32,
        activities_failed: u32,
        message: impl Into<String>,
        screenshots_captured: Vec<String>,
    ) -> Self {
        Self::build(
            test_file,
            TaskStatus::Failed,
            start_time,
            end_time,
            activities_executed,
            activities_failed,
            Some(message.into()),
            screenshots_captured,
        )
    }

    pub fn errored(
        test_file: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        activities_executed: u32,
        activities_failed: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::build(
            test_file,
            TaskStatus::Errored,
            start_time,
            end_time,
            activities_executed,
            activities_failed,
            Some(message.into()),
            Vec::new(),
        )
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{:.2}s] {}/{} activities",
            self.status.symbol(),
            self.test_file,
            self.duration_seconds,
            self.activities_executed,
            self.activities_executed + self.activities_failed
        )?;
        if let Some(msg) = &self.error_message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Aggregate statistics for a completed batch. Result order is completion
/// order, not submission order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errored: usize,
    pub wall_clock_seconds: f64,
    pub sequential_estimate_seconds: f64,
    pub speedup_factor: f64,
    pub time_saved_seconds: f64,
    pub results: Vec<TaskResult>,
}

impl BatchSummary {
    /// Fold completed results and the measured batch wall clock into a
    /// summary. Pure; an empty batch yields speedup 1.0 and zero savings.
    pub fn from_results(results: Vec<TaskResult>, wall_clock: Duration) -> Self {
        let total = results.len();
        let successful = results
            .iter()
            .filter(|r| r.status == TaskStatus::Success)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .count();
        let errored = results
            .iter()
            .filter(|r| r.status == TaskStatus::Errored)
            .count();

        let wall_clock_seconds = wall_clock.as_secs_f64();
        let sequential_estimate_seconds: f64 = results.iter().map(|r| r.duration_seconds).sum();

        let (speedup_factor, time_saved_seconds) = if total == 0 {
            (1.0, 0.0)
        } else if wall_clock_seconds > 0.0 {
            (
                sequential_estimate_seconds / wall_clock_seconds,
                sequential_estimate_seconds - wall_clock_seconds,
            )
        } else {
            (1.0, sequential_estimate_seconds)
        };

        Self {
            total,
            successful,
            failed,
            errored,
            wall_clock_seconds,
            sequential_estimate_seconds,
            speedup_factor,
            time_saved_seconds,
            results,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_successful(&self) -> bool {
        self.successful == self.total
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch of {} tests", self.total)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Success: {} | Failed: {} | Error: {}",
            self.total, self.successful, self.failed, self.errored
        )?;
        writeln!(
            f,
            "Wall clock: {:.2}s | Sequential estimate: {:.2}s | Speedup: {:.2}x | Saved: {:.2}s",
            self.wall_clock_seconds,
            self.sequential_estimate_seconds,
            self.speedup_factor,
            self.time_saved_seconds
        )
    }
}
