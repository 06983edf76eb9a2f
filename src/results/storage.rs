//! Results storage and retrieval
//!
//! Persists each batch as a timestamped JSON artifact and reads saved
//! runs back for inspection and export.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{BatchSummary, TaskResult};

/// Durable artifact for one completed batch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// When the artifact was written
    pub timestamp: DateTime<Utc>,

    /// Aggregate statistics
    pub summary: StoredSummary,

    /// Every individual result, in completion order. Each entry carries
    /// its own `test_file`; position is not meaningful.
    pub test_results: Vec<TaskResult>,
}

/// Aggregate statistics block of the artifact
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredSummary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub error_tests: usize,
    pub total_duration_seconds: f64,
    pub sequential_estimated_time: f64,
    pub time_saved_seconds: f64,
    pub speedup_factor: f64,
}

impl StoredRun {
    /// Capture a completed batch summary as an artifact
    pub fn from_summary(summary: &BatchSummary) -> Self {
        Self {
            timestamp: Utc::now(),
            summary: StoredSummary {
                total_tests: summary.total,
                successful_tests: summary.successful,
                failed_tests: summary.failed,
                error_tests: summary.errored,
                total_duration_seconds: summary.wall_clock_seconds,
                sequential_estimated_time: summary.sequential_estimate_seconds,
                time_saved_seconds: summary.time_saved_seconds,
                speedup_factor: summary.speedup_factor,
            },
            test_results: summary.results.clone(),
        }
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for artifacts
    base_dir: PathBuf,
}

impl ResultsStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Storage rooted at the platform data directory
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webbatch")
            .join("results");
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("run_{run_id}.json"))
    }

    /// Write a batch summary as a timestamped artifact. The in-memory
    /// summary is untouched whether or not the write succeeds.
    pub fn save(&self, summary: &BatchSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create results dir: {}", self.base_dir.display()))?;

        let run = StoredRun::from_summary(summary);
        let path = self.run_path(&generate_run_id());

        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &run).context("Failed to write results")?;

        info!("Saved batch results to {}", path.display());
        Ok(path)
    }

    /// Load a stored run from a specific path
    pub fn load(&self, path: &Path) -> Result<StoredRun> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open results file: {}", path.display()))?;
        let reader = BufReader::new(file);

        let run: StoredRun = serde_json::from_reader(reader).context("Failed to parse results")?;
        debug!("Loaded batch results from {}", path.display());
        Ok(run)
    }

    /// List stored runs, newest first
    pub fn list_runs(&self) -> Result<Vec<RunInfo>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load(&path) {
                    Ok(run) => runs.push(RunInfo {
                        path,
                        timestamp: run.timestamp,
                        total: run.summary.total_tests,
                        successful: run.summary.successful_tests,
                        speedup_factor: run.summary.speedup_factor,
                    }),
                    Err(e) => {
                        debug!("Skipping {}: {}", path.display(), e);
                    }
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    /// Most recent stored run, if any
    pub fn latest(&self) -> Result<Option<StoredRun>> {
        match self.list_runs()?.first() {
            Some(info) => Ok(Some(self.load(&info.path)?)),
            None => Ok(None),
        }
    }

    /// Export a stored run's individual results as CSV
    pub fn export_csv(&self, run: &StoredRun, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record([
            "test_file",
            "status",
            "start_time",
            "end_time",
            "duration_seconds",
            "activities_executed",
            "activities_failed",
            "error_message",
            "screenshots_captured",
        ])?;

        for result in &run.test_results {
            writer.write_record([
                result.test_file.clone(),
                result.status.to_string(),
                result.start_time.to_rfc3339(),
                result.end_time.to_rfc3339(),
                result.duration_seconds.to_string(),
                result.activities_executed.to_string(),
                result.activities_failed.to_string(),
                result.error_message.clone().unwrap_or_default(),
                result.screenshots_captured.join(";"),
            ])?;
        }
        writer.flush()?;

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// Brief run information
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub successful: usize,
    pub speedup_factor: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use std::time::Duration;

    fn sample_summary() -> BatchSummary {
        let start = Utc::now();
        let end = start + chrono::TimeDelta::seconds(2);
        let results = vec![
            TaskResult::success("a.yaml", start, end, 3, vec!["shot.png".into()]),
            TaskResult::failed("b.yaml", start, end, 1, 1, "locator missing", Vec::new()),
            TaskResult::errored("c.yaml", start, end, 0, 0, "timed out after 5.0s"),
        ];
        BatchSummary::from_results(results, Duration::from_secs(2))
    }

    #[test]
    fn test_generate_run_id() {
        let id = generate_run_id();
        assert!(!id.is_empty());
        assert!(id.contains('_'));
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());

        let summary = sample_summary();
        let path = storage.save(&summary).unwrap();
        assert!(path.exists());

        let run = storage.load(&path).unwrap();
        assert_eq!(run.summary.total_tests, 3);
        assert_eq!(run.summary.successful_tests, 1);
        assert_eq!(run.summary.failed_tests, 1);
        assert_eq!(run.summary.error_tests, 1);
        assert_eq!(run.test_results.len(), 3);
        assert_eq!(run.test_results[2].status, TaskStatus::Errored);
    }

    #[test]
    fn artifact_uses_schema_field_names() {
        let run = StoredRun::from_summary(&sample_summary());
        let json = serde_json::to_value(&run).unwrap();

        assert!(json.get("timestamp").is_some());
        let summary = json.get("summary").unwrap();
        for field in [
            "total_tests",
            "successful_tests",
            "failed_tests",
            "error_tests",
            "total_duration_seconds",
            "sequential_estimated_time",
            "time_saved_seconds",
            "speedup_factor",
        ] {
            assert!(summary.get(field).is_some(), "missing field {field}");
        }

        let first = &json.get("test_results").unwrap().as_array().unwrap()[0];
        for field in [
            "test_file",
            "status",
            "start_time",
            "end_time",
            "duration_seconds",
            "activities_executed",
            "activities_failed",
            "error_message",
            "screenshots_captured",
        ] {
            assert!(first.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn list_runs_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());

        storage.save(&sample_summary()).unwrap();
        storage.save(&sample_summary()).unwrap();

        let runs = storage.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].timestamp >= runs[1].timestamp);
        assert!(storage.latest().unwrap().is_some());
    }

    #[test]
    fn export_csv_writes_one_row_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let run = StoredRun::from_summary(&sample_summary());

        let csv_path = dir.path().join("out.csv");
        storage.export_csv(&run, &csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains("locator missing"));
    }

    #[test]
    fn missing_dir_lists_empty() {
        let storage = ResultsStorage::new("/nonexistent/webbatch-results");
        assert!(storage.list_runs().unwrap().is_empty());
        assert!(storage.latest().unwrap().is_none());
    }
}
