//! Output formatters for batch results
//!
//! Provides JSON, Table, CSV, and summary output formats for live CLI
//! output.

#![allow(dead_code)]

use crate::models::{BatchSummary, TaskResult, TaskStatus};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TaskResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Csv => self.format_result_csv(result),
            OutputFormat::Summary => self.format_result_summary(result),
        }
    }

    fn status_str(&self, status: TaskStatus) -> &'static str {
        if self.colorize {
            match status {
                TaskStatus::Success => "\x1b[32m✓ SUCCESS\x1b[0m",
                TaskStatus::Failed => "\x1b[31m✗ FAILED\x1b[0m",
                TaskStatus::Errored => "\x1b[31m! ERROR\x1b[0m",
            }
        } else {
            match status {
                TaskStatus::Success => "✓ SUCCESS",
                TaskStatus::Failed => "✗ FAILED",
                TaskStatus::Errored => "! ERROR",
            }
        }
    }

    fn format_result_table(&self, result: &TaskResult) -> String {
        format!(
            "{:<35} {} [{:>7.2}s] {}/{} activities",
            result.test_file,
            self.status_str(result.status),
            result.duration_seconds,
            result.activities_executed,
            result.activities_executed + result.activities_failed
        )
    }

    fn format_result_csv(&self, result: &TaskResult) -> String {
        format!(
            "{},{},{},{},{},\"{}\"",
            result.test_file,
            result.status,
            result.duration_seconds,
            result.activities_executed,
            result.activities_failed,
            result
                .error_message
                .as_deref()
                .unwrap_or("")
                .replace('"', "\"\"")
        )
    }

    fn format_result_summary(&self, result: &TaskResult) -> String {
        format!(
            "{} {} ({:.2}s)",
            result.status.symbol(),
            result.test_file,
            result.duration_seconds
        )
    }

    /// Format a full batch summary
    pub fn format_summary(&self, summary: &BatchSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.format_summary_csv(summary),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &BatchSummary) -> String {
        let mut output = String::new();

        for result in &summary.results {
            output.push_str(&self.format_result_table(result));
            output.push('\n');
        }

        output.push_str(&format!(
            "\nTotal: {} | Success: {} | Failed: {} | Error: {} ({:.1}%)\n",
            summary.total,
            summary.successful,
            summary.failed,
            summary.errored,
            summary.success_rate()
        ));
        output.push_str(&format!(
            "Wall clock: {:.2}s | Sequential estimate: {:.2}s | Speedup: {:.2}x | Saved: {:.2}s\n",
            summary.wall_clock_seconds,
            summary.sequential_estimate_seconds,
            summary.speedup_factor,
            summary.time_saved_seconds
        ));

        output
    }

    fn format_summary_csv(&self, summary: &BatchSummary) -> String {
        let mut output = String::from(
            "test_file,status,duration_seconds,activities_executed,activities_failed,error_message\n",
        );
        for result in &summary.results {
            output.push_str(&self.format_result_csv(result));
            output.push('\n');
        }
        output
    }

    fn format_summary_brief(&self, summary: &BatchSummary) -> String {
        format!(
            "{}/{} successful ({:.1}%), {:.2}x speedup, {:.2}s saved",
            summary.successful,
            summary.total,
            summary.success_rate(),
            summary.speedup_factor,
            summary.time_saved_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn sample_summary() -> BatchSummary {
        let start = Utc::now();
        let end = start + chrono::TimeDelta::seconds(1);
        let results = vec![
            TaskResult::success("ok.yaml", start, end, 2, Vec::new()),
            TaskResult::failed("bad.yaml", start, end, 1, 1, "no \"element\"", Vec::new()),
        ];
        BatchSummary::from_results(results, Duration::from_secs(1))
    }

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::from_str("table"), Some(OutputFormat::Table));
        assert_eq!(
            OutputFormat::from_str("json-pretty"),
            Some(OutputFormat::JsonPretty)
        );
        assert!(OutputFormat::from_str("xml").is_none());
    }

    #[test]
    fn table_lists_results_and_totals() {
        let formatter = ResultFormatter::new(OutputFormat::Table).no_color();
        let output = formatter.format_summary(&sample_summary());
        assert!(output.contains("ok.yaml"));
        assert!(output.contains("bad.yaml"));
        assert!(output.contains("Speedup"));
        assert!(!output.contains('\x1b'));
    }

    #[test]
    fn csv_escapes_quotes() {
        let formatter = ResultFormatter::new(OutputFormat::Csv);
        let output = formatter.format_summary(&sample_summary());
        assert!(output.contains("\"no \"\"element\"\"\""));
        assert!(output.starts_with("test_file,"));
    }

    #[test]
    fn json_round_trips() {
        let formatter = ResultFormatter::new(OutputFormat::Json);
        let output = formatter.format_summary(&sample_summary());
        let parsed: BatchSummary = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.total, 2);
    }

    #[test]
    fn brief_summary_mentions_speedup() {
        let formatter = ResultFormatter::new(OutputFormat::Summary);
        let output = formatter.format_summary(&sample_summary());
        assert!(output.contains("speedup"));
    }
}
