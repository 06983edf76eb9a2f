//! webbatch - Parallel Browser Activity Test Runner
//!
//! A CLI tool that dispatches scripted browser-interaction tests across a
//! bounded pool of isolated workers and aggregates their outcomes.
//!
//! ## Features
//!
//! - Activity sequences (navigate, click, type, wait) defined in YAML/JSON
//! - Bounded worker pool with thread or per-process fault isolation
//! - Per-test timeouts; one test's crash never aborts the batch
//! - Speedup statistics against an estimated sequential baseline
//! - Timestamped JSON artifacts, CSV export, text/markdown reports
//!
//! ## Usage
//!
//! ```bash
//! # Run every test in a directory with 8 workers
//! webbatch run tests/ --workers 8
//!
//! # Per-process isolation with a 60s deadline per test
//! webbatch run tests/ --isolation process --timeout 60
//!
//! # Inspect stored results
//! webbatch results --latest --format markdown
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

mod browser;
mod cli;
mod config;
mod executor;
mod models;
mod output;
mod results;
mod runner;
mod utils;

use browser::WebDriverFactory;
use cli::{Args, Command};
use config::{BatchConfig, IsolationMode};
use executor::{BatchExecutor, IsolationStrategy, ProcessIsolation, ThreadIsolation};
use models::{TestDefinition, TestTask};
use output::{OutputFormat, ResultFormatter};
use results::{ReportFormat, ReportGenerator, ResultsStorage};
use runner::ActivityRunner;
use utils::{init_logger, init_stderr_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    match args.command {
        Command::Run(run_args) => {
            init_logger(level);
            run_batch(run_args).await
        }
        Command::RunOne(one_args) => {
            // stdout carries the result payload for the parent process
            init_stderr_logger(level);
            run_one(one_args).await
        }
        Command::List(list_args) => {
            init_logger(level);
            list_tests(list_args)
        }
        Command::Results(results_args) => {
            init_logger(level);
            show_results(results_args)
        }
        Command::Config(config_args) => {
            init_logger(level);
            manage_config(config_args)
        }
    }
}

async fn run_batch(args: cli::RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::load_default()?,
    };

    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(isolation) = args.isolation {
        config.isolation = isolation;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_per_test_secs = timeout;
    }
    if args.headed {
        config.headless = false;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(url) = args.webdriver_url {
        config.webdriver_url = url;
    }
    config.validate()?;

    let tasks = collect_tasks(&args.tests)?;
    if tasks.is_empty() {
        bail!("no test definitions found under the given paths");
    }

    let strategy = build_strategy(&config)?;
    let pool = BatchExecutor::new(
        config.max_workers,
        Duration::from_secs(config.timeout_per_test_secs),
        strategy,
    )?;

    let summary = pool.run_batch(tasks).await;

    let format = OutputFormat::from_str(&args.format).unwrap_or(OutputFormat::Table);
    println!("{}", ResultFormatter::new(format).format_summary(&summary));

    // Persistence failure downgrades to a warning; the summary above is
    // already complete.
    let storage = ResultsStorage::new(&config.output_dir);
    if let Err(e) = storage.save(&summary) {
        warn!("Results were not persisted: {e:#}");
    }

    Ok(())
}

/// Worker-process entry: execute one test and print its result to stdout
async fn run_one(args: cli::RunOneArgs) -> Result<()> {
    let factory = WebDriverFactory::new(&args.webdriver_url, args.headless)?;
    let runner = ActivityRunner::new(args.output_dir.join("screenshots"));
    let strategy = ThreadIsolation::new(Arc::new(factory), runner);

    let result = strategy.execute(&TestTask::new(args.test)).await;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn build_strategy(config: &BatchConfig) -> Result<Arc<dyn IsolationStrategy>> {
    let strategy: Arc<dyn IsolationStrategy> = match config.isolation {
        IsolationMode::Thread => {
            let factory = WebDriverFactory::new(&config.webdriver_url, config.headless)?;
            let runner = ActivityRunner::new(config.output_dir.join("screenshots"));
            Arc::new(ThreadIsolation::new(Arc::new(factory), runner))
        }
        IsolationMode::Process => Arc::new(
            ProcessIsolation::from_current_exe(
                &config.webdriver_url,
                config.headless,
                &config.output_dir,
            )
            .context("failed to locate current executable")?,
        ),
    };
    Ok(strategy)
}

fn collect_tasks(paths: &[PathBuf]) -> Result<Vec<TestTask>> {
    let mut tasks = Vec::new();
    for path in paths {
        if path.is_dir() {
            tasks.extend(TestTask::discover(path)?);
        } else {
            tasks.push(TestTask::new(path));
        }
    }
    Ok(tasks)
}

fn list_tests(args: cli::ListArgs) -> Result<()> {
    let tasks = TestTask::discover(&args.dir)?;
    if tasks.is_empty() {
        println!("No test definitions found in {}", args.dir.display());
        return Ok(());
    }

    for task in &tasks {
        if args.detailed {
            match TestDefinition::load(&task.test_file) {
                Ok(definition) => {
                    let name = definition
                        .name
                        .map(|n| format!("  ({n})"))
                        .unwrap_or_default();
                    println!(
                        "{:<45} {:>3} activities{}",
                        task.to_string(),
                        definition.activities.len(),
                        name
                    );
                }
                Err(e) => println!("{:<45} (unreadable: {e:#})", task.to_string()),
            }
        } else {
            println!("{task}");
        }
    }

    Ok(())
}

fn show_results(args: cli::ResultsArgs) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => BatchConfig::load_default()?.output_dir,
    };
    let storage = ResultsStorage::new(dir);

    if let Some(export_path) = &args.export {
        let run = storage.latest()?.context("no stored runs to export")?;
        storage.export_csv(&run, export_path)?;
        return Ok(());
    }

    if args.latest {
        let run = storage.latest()?.context("no stored runs")?;
        let format = ReportFormat::from_str(&args.format).unwrap_or(ReportFormat::Text);
        println!("{}", ReportGenerator::render(&run, format));
        return Ok(());
    }

    let runs = storage.list_runs()?;
    if runs.is_empty() {
        println!("No stored runs in {}", storage.base_dir().display());
        return Ok(());
    }

    println!(
        "{:<45} {:>6} {:>9} {:>9}",
        "Artifact", "Tests", "Success", "Speedup"
    );
    for run in runs {
        println!(
            "{:<45} {:>6} {:>9} {:>8.2}x",
            run.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?"),
            run.total,
            run.successful,
            run.speedup_factor
        );
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { path } => {
            BatchConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        cli::ConfigAction::Show => {
            let config = BatchConfig::load_default()?;
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }
    Ok(())
}
