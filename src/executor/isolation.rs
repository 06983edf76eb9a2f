//! Task isolation strategies
//!
//! One executor contract, two fault-isolation strengths: in-process
//! worker tasks sharing the runtime, or one worker process per task.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use crate::browser::SessionFactory;
use crate::models::{TaskResult, TestDefinition, TestTask};
use crate::runner::ActivityRunner;

/// Executes one task to completion and always yields a result.
///
/// Implementations must not let a task's failure escape as an error;
/// every fault becomes an `Errored` result. Ordering, timeout, and
/// result shape are identical across implementations; only the
/// fault-isolation guarantee differs.
#[async_trait]
pub trait IsolationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, task: &TestTask) -> TaskResult;
}

/// Shared-process isolation: tasks run as worker tasks on the calling
/// runtime. Suitable when the activity runner is exception safe.
pub struct ThreadIsolation {
    factory: Arc<dyn SessionFactory>,
    runner: ActivityRunner,
}

impl ThreadIsolation {
    pub fn new(factory: Arc<dyn SessionFactory>, runner: ActivityRunner) -> Self {
        Self { factory, runner }
    }
}

#[async_trait]
impl IsolationStrategy for ThreadIsolation {
    fn name(&self) -> &'static str {
        "thread"
    }

    async fn execute(&self, task: &TestTask) -> TaskResult {
        let identifier = task.identifier();
        let started_at = Utc::now();

        let definition = match TestDefinition::load(&task.test_file) {
            Ok(definition) => definition,
            Err(e) => {
                return TaskResult::errored(
                    &identifier,
                    started_at,
                    Utc::now(),
                    0,
                    0,
                    format!("failed to load test definition: {e:#}"),
                );
            }
        };

        let session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => {
                return TaskResult::errored(
                    &identifier,
                    started_at,
                    Utc::now(),
                    0,
                    0,
                    e.to_string(),
                );
            }
        };

        let display_name = definition
            .name
            .clone()
            .unwrap_or_else(|| file_stem(&task.test_file));
        let outcome = self
            .runner
            .run(&display_name, &definition.activities, session)
            .await;
        let ended_at = Utc::now();

        if outcome.status.is_success() {
            TaskResult::success(
                &identifier,
                started_at,
                ended_at,
                outcome.executed,
                outcome.screenshots,
            )
        } else {
            TaskResult::failed(
                &identifier,
                started_at,
                ended_at,
                outcome.executed,
                outcome.failed,
                outcome.error.unwrap_or_else(|| "activity failed".to_string()),
                outcome.screenshots,
            )
        }
    }
}

/// Per-process isolation: each task re-invokes this executable with the
/// hidden `run-one` subcommand and reads the child's result from stdout.
/// A fatal fault or leak in one task dies with its own process, and an
/// abandoned child is killed rather than left running.
pub struct ProcessIsolation {
    program: PathBuf,
    webdriver_url: String,
    headless: bool,
    output_dir: PathBuf,
}

impl ProcessIsolation {
    pub fn new(
        program: impl Into<PathBuf>,
        webdriver_url: impl Into<String>,
        headless: bool,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            webdriver_url: webdriver_url.into(),
            headless,
            output_dir: output_dir.into(),
        }
    }

    /// Strategy re-invoking the currently running executable
    pub fn from_current_exe(
        webdriver_url: impl Into<String>,
        headless: bool,
        output_dir: impl Into<PathBuf>,
    ) -> std::io::Result<Self> {
        Ok(Self::new(
            std::env::current_exe()?,
            webdriver_url,
            headless,
            output_dir,
        ))
    }
}

#[async_trait]
impl IsolationStrategy for ProcessIsolation {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn execute(&self, task: &TestTask) -> TaskResult {
        let identifier = task.identifier();
        let started_at = Utc::now();

        let mut command = Command::new(&self.program);
        command
            .arg("run-one")
            .arg("--test")
            .arg(&task.test_file)
            .arg("--webdriver-url")
            .arg(&self.webdriver_url)
            .arg("--output-dir")
            .arg(&self.output_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if self.headless {
            command.arg("--headless");
        }

        debug!("Spawning worker process for {}", identifier);

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                return TaskResult::errored(
                    &identifier,
                    started_at,
                    Utc::now(),
                    0,
                    0,
                    format!("failed to spawn worker process: {e}"),
                );
            }
        };

        match serde_json::from_slice::<TaskResult>(&output.stdout) {
            Ok(result) => result,
            Err(e) => TaskResult::errored(
                &identifier,
                started_at,
                Utc::now(),
                0,
                0,
                format!(
                    "worker process exited with {} and unparseable output: {e}",
                    output.status
                ),
            ),
        }
    }
}

fn file_stem(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserSession, SessionError};
    use crate::models::TaskStatus;

    struct NoopSession;

    #[async_trait]
    impl BrowserSession for NoopSession {
        async fn navigate(&self, _url: &str) -> Result<(), SessionError> {
            Ok(())
        }
        async fn click(&self, locator: &crate::models::Locator) -> Result<(), SessionError> {
            Err(SessionError::NotFound(locator.to_string()))
        }
        async fn type_text(
            &self,
            locator: &crate::models::Locator,
            _text: &str,
        ) -> Result<(), SessionError> {
            Err(SessionError::NotFound(locator.to_string()))
        }
        async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
            Err(SessionError::Request("no display".into()))
        }
        async fn close(&self) -> Result<(), SessionError> {
            Ok(())
        }
    }

    struct NoopFactory;

    #[async_trait]
    impl SessionFactory for NoopFactory {
        async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
            Ok(Box::new(NoopSession))
        }
    }

    struct RefusingFactory;

    #[async_trait]
    impl SessionFactory for RefusingFactory {
        async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
            Err(SessionError::Create("driver endpoint down".into()))
        }
    }

    fn write_definition(dir: &std::path::Path, name: &str, yaml: &str) -> TestTask {
        let path = dir.join(name);
        std::fs::write(&path, yaml).unwrap();
        TestTask::new(path)
    }

    #[tokio::test]
    async fn thread_isolation_maps_outcome_to_result() {
        let dir = tempfile::tempdir().unwrap();
        let task = write_definition(
            dir.path(),
            "ok.yaml",
            "- action: navigation\n  details:\n    url: https://example.com\n- action: wait\n  details:\n    duration: 0.01\n",
        );

        let strategy = ThreadIsolation::new(
            Arc::new(NoopFactory),
            ActivityRunner::new(dir.path().join("shots")),
        );

        let result = strategy.execute(&task).await;
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.activities_executed, 2);
        assert_eq!(result.activities_failed, 0);
    }

    #[tokio::test]
    async fn missing_definition_becomes_errored_result() {
        let strategy = ThreadIsolation::new(
            Arc::new(NoopFactory),
            ActivityRunner::new("shots"),
        );

        let result = strategy
            .execute(&TestTask::new("/nonexistent/definitely-missing.yaml"))
            .await;
        assert_eq!(result.status, TaskStatus::Errored);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("test definition"));
    }

    #[tokio::test]
    async fn session_open_failure_becomes_errored_result() {
        let dir = tempfile::tempdir().unwrap();
        let task = write_definition(
            dir.path(),
            "ok.yaml",
            "- action: wait\n  details:\n    duration: 0.01\n",
        );

        let strategy = ThreadIsolation::new(
            Arc::new(RefusingFactory),
            ActivityRunner::new(dir.path().join("shots")),
        );

        let result = strategy.execute(&task).await;
        assert_eq!(result.status, TaskStatus::Errored);
        assert!(result.error_message.as_deref().unwrap().contains("driver"));
    }

    #[tokio::test]
    async fn process_isolation_reports_spawn_failure() {
        let strategy = ProcessIsolation::new(
            "/nonexistent/webbatch-binary",
            "http://localhost:4444",
            true,
            "out",
        );

        let result = strategy.execute(&TestTask::new("any.yaml")).await;
        assert_eq!(result.status, TaskStatus::Errored);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("spawn"));
    }

    #[test]
    fn definition_name_falls_back_to_file_stem() {
        assert_eq!(file_stem(std::path::Path::new("tests/login.yaml")), "login");
    }

    #[tokio::test]
    async fn thread_isolation_records_step_failure_counts() {
        let dir = tempfile::tempdir().unwrap();
        let task = write_definition(
            dir.path(),
            "fail.yaml",
            "- action: navigation\n  details:\n    url: https://example.com\n- action: click\n  details:\n    locators:\n      - id: missing\n",
        );

        let strategy = ThreadIsolation::new(
            Arc::new(NoopFactory),
            ActivityRunner::new(dir.path().join("shots")),
        );

        let result = strategy.execute(&task).await;
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.activities_executed, 1);
        assert_eq!(result.activities_failed, 1);
        assert!(result.error_message.is_some());
    }
}
