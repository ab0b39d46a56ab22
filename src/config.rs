use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::reset::ProcessSpec;

/// Name of the per-user config directory and file stem.
pub const APP_NAME: &str = "code-reset";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Append-only log file
    pub log_file: PathBuf,
    pub target: TargetConfig,
    pub residual: ResidualConfig,
    pub deletion: DeletionConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Storage roots to wipe (empty = platform defaults)
    pub roots: Vec<PathBuf>,
    /// Processes to terminate before deleting anything
    pub processes: Vec<ProcessSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualConfig {
    /// Include residual matches in a full reset
    pub enabled: bool,
    /// Case-insensitive substring to look for in entry names
    pub keyword: String,
    /// Directories to search (empty = platform defaults)
    pub search_roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionConfig {
    /// Attempts per path, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds, doubled on each retry
    pub initial_backoff_ms: u64,
    /// Upper bound for any external command in seconds
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// How many times process termination is repeated
    pub kill_rounds: u32,
    /// Wait after each termination round in milliseconds
    pub settle_ms: u64,
    /// Extra wait before collecting paths in milliseconds
    pub final_settle_ms: u64,
    /// Ratio of removed paths accepted as a successful reset (0.0-1.0)
    pub success_threshold: f64,
    /// Log progress every N paths
    pub progress_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("code-reset.log"),
            target: TargetConfig::default(),
            residual: ResidualConfig::default(),
            deletion: DeletionConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            roots: vec![],
            processes: default_processes(),
        }
    }
}

#[cfg(windows)]
fn default_processes() -> Vec<ProcessSpec> {
    vec![
        ProcessSpec::Name("Code.exe".to_string()),
        ProcessSpec::Name("Code - Insiders.exe".to_string()),
        ProcessSpec::Name("augment.exe".to_string()),
        ProcessSpec::Name("node.exe".to_string()),
        ProcessSpec::Name("electron.exe".to_string()),
        ProcessSpec::Pattern("augment".to_string()),
    ]
}

#[cfg(not(windows))]
fn default_processes() -> Vec<ProcessSpec> {
    let mut specs: Vec<ProcessSpec> = ["code", "code-insiders", "electron", "node"]
        .iter()
        .map(|n| ProcessSpec::Name(n.to_string()))
        .collect();
    // Extension hosts run as `node`; the extension path identifies them
    specs.push(ProcessSpec::Pattern("augment".to_string()));
    specs
}

impl Default for ResidualConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keyword: "augment".to_string(),
            search_roots: vec![],
        }
    }
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            command_timeout_secs: 10,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            kill_rounds: 3,
            settle_ms: 3000,
            final_settle_ms: 5000,
            success_threshold: 0.8,
            progress_interval: 50,
        }
    }
}

impl DeletionConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl RunConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn final_settle(&self) -> Duration {
        Duration::from_millis(self.final_settle_ms)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user file
    /// (`<config dir>/code-reset/config.toml`) is used when present,
    /// otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Location of the per-user config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deletion.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "deletion.max_attempts must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.run.success_threshold) {
            return Err(ConfigError::Invalid(format!(
                "run.success_threshold must be within 0.0..=1.0, got {}",
                self.run.success_threshold
            )));
        }
        if self.run.progress_interval == 0 {
            return Err(ConfigError::Invalid(
                "run.progress_interval must be at least 1".into(),
            ));
        }
        if self.residual.enabled && self.residual.keyword.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "residual.keyword must not be empty when residual scanning is enabled".into(),
            ));
        }
        Ok(())
    }
}
