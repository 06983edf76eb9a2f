//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::IsolationMode;

/// Parallel batch runner for scripted browser activity tests
#[derive(Parser, Debug)]
#[command(name = "webbatch")]
#[command(version)]
#[command(about = "Run scripted browser activity tests in parallel")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a batch of activity tests
    Run(RunArgs),

    /// Execute a single test and print its result as JSON (worker entry)
    #[command(hide = true)]
    RunOne(RunOneArgs),

    /// List test definition files
    List(ListArgs),

    /// View saved batch results
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test definition files or directories to scan
    #[arg(required = true)]
    pub tests: Vec<PathBuf>,

    /// Maximum concurrent tests
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Fault isolation mode
    #[arg(short, long, value_enum)]
    pub isolation: Option<IsolationMode>,

    /// Per-test timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for result artifacts and screenshots
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// WebDriver endpoint URL
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the hidden single-test worker command
#[derive(Parser, Debug)]
pub struct RunOneArgs {
    /// Test definition file
    #[arg(long)]
    pub test: PathBuf,

    /// WebDriver endpoint URL
    #[arg(long)]
    pub webdriver_url: String,

    /// Directory for failure screenshots
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory to scan for test definitions
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Show activity counts per test
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Results directory (defaults to the configured output directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Render the most recent run as a report
    #[arg(long)]
    pub latest: bool,

    /// Report format (text, markdown)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Export the most recent run's results to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(default_value = "./webbatch.yaml")]
        path: PathBuf,
    },

    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let args = Args::parse_from([
            "webbatch",
            "run",
            "tests/",
            "--workers",
            "8",
            "--isolation",
            "process",
            "--timeout",
            "60",
        ]);

        match args.command {
            Command::Run(run) => {
                assert_eq!(run.workers, Some(8));
                assert_eq!(run.isolation, Some(IsolationMode::Process));
                assert_eq!(run.timeout, Some(60));
                assert!(!run.headed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_hidden_worker_command() {
        let args = Args::parse_from([
            "webbatch",
            "run-one",
            "--test",
            "login.yaml",
            "--webdriver-url",
            "http://localhost:9515",
            "--output-dir",
            "out",
            "--headless",
        ]);

        match args.command {
            Command::RunOne(one) => {
                assert_eq!(one.test, PathBuf::from("login.yaml"));
                assert!(one.headless);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_at_least_one_test() {
        assert!(Args::try_parse_from(["webbatch", "run"]).is_err());
    }
}
