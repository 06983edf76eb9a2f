//! Report generation for stored batch runs
//!
//! Renders a saved artifact as a human-readable text or markdown report.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::TaskStatus;
use crate::results::storage::StoredRun;

/// Report output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Report generator
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn render(run: &StoredRun, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => Self::format_text(run),
            ReportFormat::Markdown => Self::format_markdown(run),
        }
    }

    fn format_text(run: &StoredRun) -> String {
        let mut output = String::new();

        writeln!(output, "\n{:=^70}", " Batch Test Report ").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Timestamp: {}", format_datetime(&run.timestamp)).unwrap();
        writeln!(output, "Tests: {}", run.summary.total_tests).unwrap();
        writeln!(
            output,
            "Success: {} | Failed: {} | Error: {}",
            run.summary.successful_tests, run.summary.failed_tests, run.summary.error_tests
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "{:-^70}", " Performance ").unwrap();
        writeln!(
            output,
            "Wall clock: {:.2}s",
            run.summary.total_duration_seconds
        )
        .unwrap();
        writeln!(
            output,
            "Sequential estimate: {:.2}s",
            run.summary.sequential_estimated_time
        )
        .unwrap();
        writeln!(
            output,
            "Speedup: {:.2}x | Time saved: {:.2}s",
            run.summary.speedup_factor, run.summary.time_saved_seconds
        )
        .unwrap();

        writeln!(output, "\n{:-^70}", " Test Results ").unwrap();
        writeln!(
            output,
            "{:<35} {:>8} {:>9} {:>6}/{}",
            "Test", "Status", "Time(s)", "Done", "Fail"
        )
        .unwrap();
        writeln!(output, "{:-<70}", "").unwrap();

        for result in &run.test_results {
            writeln!(
                output,
                "{:<35} {:>8} {:>9.2} {:>6}/{}",
                truncate(&result.test_file, 35),
                result.status.to_string(),
                result.duration_seconds,
                result.activities_executed,
                result.activities_failed
            )
            .unwrap();
            if result.status != TaskStatus::Success {
                if let Some(msg) = &result.error_message {
                    writeln!(output, "    {}", truncate(msg, 66)).unwrap();
                }
            }
        }

        writeln!(output, "\n{:=^70}", "").unwrap();
        output
    }

    fn format_markdown(run: &StoredRun) -> String {
        let mut output = String::new();

        writeln!(output, "# Batch Test Report\n").unwrap();
        writeln!(output, "## Summary\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(
            output,
            "| Timestamp | {} |",
            format_datetime(&run.timestamp)
        )
        .unwrap();
        writeln!(output, "| Total tests | {} |", run.summary.total_tests).unwrap();
        writeln!(
            output,
            "| Successful | {} |",
            run.summary.successful_tests
        )
        .unwrap();
        writeln!(output, "| Failed | {} |", run.summary.failed_tests).unwrap();
        writeln!(output, "| Errors | {} |", run.summary.error_tests).unwrap();
        writeln!(
            output,
            "| Wall clock | {:.2}s |",
            run.summary.total_duration_seconds
        )
        .unwrap();
        writeln!(
            output,
            "| Sequential estimate | {:.2}s |",
            run.summary.sequential_estimated_time
        )
        .unwrap();
        writeln!(
            output,
            "| Speedup | {:.2}x |",
            run.summary.speedup_factor
        )
        .unwrap();
        writeln!(
            output,
            "| Time saved | {:.2}s |",
            run.summary.time_saved_seconds
        )
        .unwrap();

        writeln!(output, "\n## Test Results\n").unwrap();
        writeln!(
            output,
            "| Test | Status | Duration | Executed | Failed | Error |"
        )
        .unwrap();
        writeln!(output, "|------|--------|----------|----------|--------|-------|").unwrap();

        for result in &run.test_results {
            writeln!(
                output,
                "| {} | {} | {:.2}s | {} | {} | {} |",
                result.test_file,
                result.status,
                result.duration_seconds,
                result.activities_executed,
                result.activities_failed,
                result.error_message.as_deref().unwrap_or("-")
            )
            .unwrap();
        }

        output
    }
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BatchSummary, TaskResult};
    use crate::results::storage::StoredRun;
    use std::time::Duration;

    fn sample_run() -> StoredRun {
        let start = Utc::now();
        let end = start + chrono::TimeDelta::seconds(1);
        let results = vec![
            TaskResult::success("login.yaml", start, end, 4, Vec::new()),
            TaskResult::failed("search.yaml", start, end, 2, 1, "locator missing", Vec::new()),
        ];
        StoredRun::from_summary(&BatchSummary::from_results(results, Duration::from_secs(1)))
    }

    #[test]
    fn text_report_lists_every_result() {
        let report = ReportGenerator::render(&sample_run(), ReportFormat::Text);
        assert!(report.contains("login.yaml"));
        assert!(report.contains("search.yaml"));
        assert!(report.contains("locator missing"));
        assert!(report.contains("Speedup"));
    }

    #[test]
    fn markdown_report_has_tables() {
        let report = ReportGenerator::render(&sample_run(), ReportFormat::Markdown);
        assert!(report.starts_with("# Batch Test Report"));
        assert!(report.contains("| login.yaml |"));
        assert!(report.contains("| Speedup |"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
        assert!(ReportFormat::from_str("pdf").is_none());
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-test-name", 10), "a-very-...");
    }
}
