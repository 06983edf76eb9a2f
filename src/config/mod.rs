//! Configuration module
//!
//! Handles loading, validating, and managing batch configuration. All
//! settings are explicit values handed to the executor and storage at
//! construction; nothing is process-wide.

#![allow(dead_code)]

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./webbatch.yaml",
    "./webbatch.yml",
    "./.webbatch.yaml",
    "./.webbatch/config.yaml",
];

/// Fault-isolation strength for concurrent tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Tasks share the process; cheapest, assumes an exception-safe runner
    #[default]
    Thread,
    /// One worker process per task; a fatal fault dies alone
    Process,
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationMode::Thread => write!(f, "thread"),
            IsolationMode::Process => write!(f, "process"),
        }
    }
}

/// Batch execution configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Concurrency ceiling
    pub max_workers: usize,

    /// Fault-isolation strength
    pub isolation: IsolationMode,

    /// Per-task deadline in seconds, from each task's own dispatch time
    pub timeout_per_test_secs: u64,

    /// Passed through to the browser session, not interpreted here
    pub headless: bool,

    /// Where result artifacts and failure screenshots are written
    pub output_dir: PathBuf,

    /// WebDriver endpoint driving the browser sessions
    pub webdriver_url: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            isolation: IsolationMode::Thread,
            timeout_per_test_secs: 300,
            headless: true,
            output_dir: PathBuf::from("webbatch-results"),
            webdriver_url: "http://localhost:9515".to_string(),
        }
    }
}

impl BatchConfig {
    /// Find a configuration file in the standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Load from the first standard location, falling back to defaults
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Reject invalid settings before any task is dispatched
    pub fn validate(&self) -> Result<()> {
        if self.max_workers < 1 {
            bail!("max_workers must be at least 1, got {}", self.max_workers);
        }
        if self.timeout_per_test_secs == 0 {
            bail!("timeout_per_test_secs must be positive");
        }
        if self.webdriver_url.is_empty() {
            bail!("webdriver_url must not be empty");
        }
        Ok(())
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.isolation, IsolationMode::Thread);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut config = BatchConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = BatchConfig::default();
        config.timeout_per_test_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webbatch.yaml");

        let mut config = BatchConfig::default();
        config.max_workers = 8;
        config.isolation = IsolationMode::Process;
        config.save(&path).unwrap();

        let loaded = BatchConfig::load(&path).unwrap();
        assert_eq!(loaded.max_workers, 8);
        assert_eq!(loaded.isolation, IsolationMode::Process);
    }

    #[test]
    fn invalid_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webbatch.yaml");
        std::fs::write(&path, "max_workers: 0\nisolation: thread\ntimeout_per_test_secs: 10\nheadless: true\noutput_dir: out\nwebdriver_url: http://localhost:9515\n").unwrap();

        assert!(BatchConfig::load(&path).is_err());
    }

    #[test]
    fn isolation_mode_serde_form() {
        let yaml = serde_yaml::to_string(&IsolationMode::Process).unwrap();
        assert_eq!(yaml.trim(), "process");
    }
}
