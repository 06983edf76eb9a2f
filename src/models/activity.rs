//! Activity sequence models
//!
//! Defines the scripted browser interactions that make up one test, and
//! the task identity submitted to the executor.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Element locator, one resolution strategy per entry.
///
/// Resolution order is fixed: `id` first, then `css`, then visible `text`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Exact element identifier
    Id(String),
    /// Structural CSS selector
    Css(String),
    /// Visible text match
    Text(String),
}

impl Locator {
    /// Strategy priority, lower resolves first
    pub fn priority(&self) -> u8 {
        match self {
            Locator::Id(_) => 0,
            Locator::Css(_) => 1,
            Locator::Text(_) => 2,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id={v}"),
            Locator::Css(v) => write!(f, "css={v}"),
            Locator::Text(v) => write!(f, "text={v}"),
        }
    }
}

/// One scripted browser interaction step
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", content = "details", rename_all = "snake_case")]
pub enum Activity {
    /// Open a URL
    Navigation { url: String },
    /// Click the first element any locator resolves to
    Click { locators: Vec<Locator> },
    /// Type a value into the first element any locator resolves to
    TextInput { locators: Vec<Locator>, value: String },
    /// Pause for a number of seconds
    Wait { duration: f64 },
}

impl Activity {
    /// Short action name as it appears in definition files
    pub fn kind(&self) -> &'static str {
        match self {
            Activity::Navigation { .. } => "navigation",
            Activity::Click { .. } => "click",
            Activity::TextInput { .. } => "text_input",
            Activity::Wait { .. } => "wait",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Navigation { url } => write!(f, "navigation -> {url}"),
            Activity::Click { locators } => {
                write!(f, "click ({} locators)", locators.len())
            }
            Activity::TextInput { locators, value } => {
                write!(f, "text_input '{}' ({} locators)", value, locators.len())
            }
            Activity::Wait { duration } => write!(f, "wait {duration}s"),
        }
    }
}

/// Parsed test definition: an ordered activity sequence with an optional name
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub activities: Vec<Activity>,
}

/// Definition files are either a bare activity list or a named document
#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Named {
        #[serde(default)]
        name: Option<String>,
        activities: Vec<Activity>,
    },
    Bare(Vec<Activity>),
}

impl TestDefinition {
    /// Load a definition from a YAML or JSON file, detected by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read test definition: {}", path.display()))?;

        let parsed: DefinitionFile = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML definition: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON definition: {}", path.display()))?
        };

        let definition = match parsed {
            DefinitionFile::Named { name, activities } => Self { name, activities },
            DefinitionFile::Bare(activities) => Self {
                name: None,
                activities,
            },
        };

        Ok(definition)
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// One unit of work submitted to the executor. Immutable once submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestTask {
    pub test_file: PathBuf,
}

impl TestTask {
    pub fn new(test_file: impl Into<PathBuf>) -> Self {
        Self {
            test_file: test_file.into(),
        }
    }

    /// Identifier recorded on the task's result
    pub fn identifier(&self) -> String {
        self.test_file.display().to_string()
    }

    /// Discover definition files (yaml/yml/json) directly under a directory
    pub fn discover(dir: impl AsRef<Path>) -> Result<Vec<TestTask>> {
        let dir = dir.as_ref();
        let mut tasks = Vec::new();

        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read test directory: {}", dir.display()))?
        {
            let path = entry?.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());

            if matches!(ext.as_deref(), Some("yaml") | Some("yml") | Some("json")) {
                tasks.push(TestTask::new(path));
            }
        }

        tasks.sort_by(|a, b| a.test_file.cmp(&b.test_file));
        Ok(tasks)
    }
}

impl fmt::Display for TestTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.test_file.display())
    }
}
