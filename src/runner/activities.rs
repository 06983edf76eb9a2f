//! Activity sequence runner
//!
//! Executes one ordered activity sequence against one browser session,
//! stopping at the first failing activity. The session is released on
//! every exit path; the caller only manages the timing envelope.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::browser::{BrowserSession, SessionError};
use crate::models::{Activity, Locator, TaskStatus};

/// Outcome of running one activity sequence.
///
/// The runner only ever yields `Success` or `Failed`; faults outside the
/// sequence itself (session setup, panics, timeouts) are the executor's
/// concern.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub status: TaskStatus,
    pub executed: u32,
    pub failed: u32,
    pub error: Option<String>,
    pub screenshots: Vec<String>,
}

impl RunOutcome {
    fn success(executed: u32, screenshots: Vec<String>) -> Self {
        Self {
            status: TaskStatus::Success,
            executed,
            failed: 0,
            error: None,
            screenshots,
        }
    }

    fn step_failed(executed: u32, error: String, screenshots: Vec<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            executed,
            failed: 1,
            error: Some(error),
            screenshots,
        }
    }
}

/// Runs activity sequences and captures failure screenshots
pub struct ActivityRunner {
    screenshot_dir: PathBuf,
}

impl ActivityRunner {
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
        }
    }

    /// Execute activities in order against a fresh session. Stops at the
    /// first failing activity and always closes the session before
    /// returning.
    pub async fn run(
        &self,
        test_name: &str,
        activities: &[Activity],
        session: Box<dyn BrowserSession>,
    ) -> RunOutcome {
        let mut executed: u32 = 0;
        let mut screenshots = Vec::new();

        let mut failure: Option<String> = None;

        for (index, activity) in activities.iter().enumerate() {
            debug!("[{}] step {}: {}", test_name, index + 1, activity);

            match self.execute_activity(activity, session.as_ref()).await {
                Ok(()) => executed += 1,
                Err(e) => {
                    let message = format!("activity {} ({}) failed: {}", index + 1, activity.kind(), e);
                    if let Some(path) = self
                        .capture_failure_screenshot(test_name, index + 1, session.as_ref())
                        .await
                    {
                        screenshots.push(path);
                    }
                    failure = Some(message);
                    break;
                }
            }
        }

        if let Err(e) = session.close().await {
            warn!("[{}] failed to close session: {}", test_name, e);
        }

        match failure {
            None => RunOutcome::success(executed, screenshots),
            Some(message) => RunOutcome::step_failed(executed, message, screenshots),
        }
    }

    async fn execute_activity(
        &self,
        activity: &Activity,
        session: &dyn BrowserSession,
    ) -> Result<(), SessionError> {
        match activity {
            Activity::Navigation { url } => session.navigate(url).await,
            Activity::Wait { duration } => {
                tokio::time::sleep(Duration::from_secs_f64(duration.max(0.0))).await;
                Ok(())
            }
            Activity::Click { locators } => {
                interact(session, locators, Interaction::Click).await
            }
            Activity::TextInput { locators, value } => {
                interact(session, locators, Interaction::TypeText(value)).await
            }
        }
    }

    /// Best effort; a failing screenshot never changes the outcome
    async fn capture_failure_screenshot(
        &self,
        test_name: &str,
        step: usize,
        session: &dyn BrowserSession,
    ) -> Option<String> {
        let png = match session.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!("[{}] screenshot capture failed: {}", test_name, e);
                return None;
            }
        };

        let safe_name: String = test_name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let filename = format!("{safe_name}_failure_step{step}.png");
        let path = self.screenshot_dir.join(&filename);

        if let Err(e) = std::fs::create_dir_all(&self.screenshot_dir) {
            warn!("[{}] cannot create screenshot dir: {}", test_name, e);
            return None;
        }
        if let Err(e) = std::fs::write(&path, png) {
            warn!("[{}] cannot write screenshot: {}", test_name, e);
            return None;
        }

        Some(path.display().to_string())
    }
}

/// Interaction applied to the first element a locator resolves
#[derive(Clone, Copy)]
enum Interaction<'a> {
    Click,
    TypeText(&'a str),
}

/// Try locators in fixed strategy priority (id, css, text). A locator
/// that resolves nothing falls through to the next; any other session
/// error fails the step immediately.
async fn interact(
    session: &dyn BrowserSession,
    locators: &[Locator],
    interaction: Interaction<'_>,
) -> Result<(), SessionError> {
    if locators.is_empty() {
        return Err(SessionError::NotFound("no locators given".into()));
    }

    let mut ordered: Vec<&Locator> = locators.iter().collect();
    ordered.sort_by_key(|l| l.priority());

    for locator in &ordered {
        let attempt = match interaction {
            Interaction::Click => session.click(locator).await,
            Interaction::TypeText(text) => session.type_text(locator, text).await,
        };

        match attempt {
            Ok(()) => return Ok(()),
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
    }

    let tried: Vec<String> = ordered.iter().map(|l| l.to_string()).collect();
    Err(SessionError::NotFound(tried.join(", ")))
}
