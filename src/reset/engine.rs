//! Deletion of single paths with retries and escalation.
//!
//! Each path goes through increasingly forceful steps:
//!
//! 1. plain removal (`remove_file` / `remove_dir_all`)
//! 2. clearing protection flags and retrying
//! 3. a manual post-order walk for directories
//! 4. the platform's forced-delete command
//!
//! The whole sequence is retried with exponential backoff. A path that
//! survives every attempt is reported as failed; it never aborts a batch.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

use super::target::{path_exists, PathKind, TargetPath};
use crate::config::DeletionConfig;
use crate::error::{DeleteError, FailureKind};
use crate::platform::Platform;

/// Outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Removed,
    Retry,
    Failed,
}

/// One pass of the removal sequence over a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionAttempt {
    pub path: std::path::PathBuf,
    /// 1-based attempt number.
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub error: Option<FailureKind>,
}

/// Every attempt made for one path.
#[derive(Debug, Clone)]
pub struct RemovalRecord {
    pub attempts: Vec<DeletionAttempt>,
    pub removed: bool,
}

impl RemovalRecord {
    /// The attempt that decided the outcome.
    pub fn last(&self) -> Option<&DeletionAttempt> {
        self.attempts.last()
    }
}

/// Retry and timeout settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub command_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&DeletionConfig::default())
    }
}

impl From<&DeletionConfig> for EngineOptions {
    fn from(config: &DeletionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            command_timeout: config.command_timeout(),
        }
    }
}

/// Deletes paths on behalf of the orchestrator.
pub struct DeletionEngine<'a> {
    platform: &'a dyn Platform,
    options: EngineOptions,
}

impl<'a> DeletionEngine<'a> {
    pub fn new(platform: &'a dyn Platform, options: EngineOptions) -> Self {
        Self { platform, options }
    }

    /// Remove `target`, returning whether it is gone afterwards.
    pub fn remove_path(&self, target: &TargetPath) -> bool {
        self.remove(&target.path).removed
    }

    /// Remove `path` with retries and return the full attempt history.
    ///
    /// A path that does not exist counts as removed.
    pub fn remove(&self, path: &Path) -> RemovalRecord {
        let mut attempts = Vec::new();
        let mut delay = self.options.initial_backoff;
        let max = self.options.max_attempts;

        for attempt in 1..=max {
            let err = match self.remove_once(path) {
                Ok(()) => {
                    attempts.push(DeletionAttempt {
                        path: path.to_path_buf(),
                        attempt,
                        outcome: AttemptOutcome::Removed,
                        error: None,
                    });
                    tracing::debug!(path = %path.display(), attempt, "Removed");
                    return RemovalRecord {
                        attempts,
                        removed: true,
                    };
                }
                Err(e) => e,
            };

            let kind = err.kind();
            if attempt < max {
                tracing::warn!(
                    path = %path.display(),
                    attempt,
                    max,
                    ?kind,
                    error = %err,
                    "Removal failed, retrying in {:?}",
                    delay
                );
                attempts.push(DeletionAttempt {
                    path: path.to_path_buf(),
                    attempt,
                    outcome: AttemptOutcome::Retry,
                    error: Some(kind),
                });
                thread::sleep(delay);
                delay = next_backoff(delay);
            } else {
                tracing::error!(
                    path = %path.display(),
                    ?kind,
                    error = %err,
                    "Removal failed after {} attempts",
                    max
                );
                attempts.push(DeletionAttempt {
                    path: path.to_path_buf(),
                    attempt,
                    outcome: AttemptOutcome::Failed,
                    error: Some(kind),
                });
            }
        }

        RemovalRecord {
            attempts,
            removed: false,
        }
    }

    /// One pass of the removal sequence.
    fn remove_once(&self, path: &Path) -> Result<(), DeleteError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(DeleteError::io(path, e)),
        };

        let result = if meta.is_dir() {
            self.remove_dir(path)
        } else {
            self.remove_file(path)
        };

        match result {
            Ok(()) if path_exists(path) => Err(DeleteError::StillPresent(path.to_path_buf())),
            other => other,
        }
    }

    /// Remove a file or symlink, escalating from plain unlink to the
    /// platform's forced delete.
    fn remove_file(&self, path: &Path) -> Result<(), DeleteError> {
        let err = match fs::remove_file(path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => e,
        };

        let err = if err.kind() == io::ErrorKind::PermissionDenied {
            if let Err(e) = self.platform.clear_protection(path) {
                tracing::debug!(path = %path.display(), error = %e, "Could not clear protection");
            }
            match fs::remove_file(path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) => e,
            }
        } else {
            err
        };

        tracing::debug!(path = %path.display(), error = %err, "Falling back to forced delete");
        self.force_remove(path, PathKind::File)
            .map_err(|_| DeleteError::io(path, err))
    }

    /// Remove a directory tree, falling back to a manual deepest-first walk.
    fn remove_dir(&self, path: &Path) -> Result<(), DeleteError> {
        match fs::remove_dir_all(path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Recursive removal failed, walking tree");
            }
        }

        let entries = WalkDir::new(path)
            .min_depth(1)
            .follow_links(false)
            .contents_first(true)
            .into_iter()
            .filter_map(|e| e.ok());

        for entry in entries {
            let child = entry.path();
            if entry.file_type().is_dir() {
                let _ = self.platform.clear_protection(child);
                if let Err(e) = fs::remove_dir(child) {
                    tracing::debug!(path = %child.display(), error = %e, "Could not remove subdirectory");
                }
            } else if let Err(e) = self.remove_file(child) {
                tracing::debug!(path = %child.display(), error = %e, "Could not remove file");
            }
        }

        let _ = self.platform.clear_protection(path);
        match fs::remove_dir(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Falling back to forced delete");
                self.force_remove(path, PathKind::Directory)
                    .map_err(|_| DeleteError::io(path, e))
            }
        }
    }

    fn force_remove(&self, path: &Path, kind: PathKind) -> Result<(), DeleteError> {
        let result = self
            .platform
            .force_remove(path, kind, self.options.command_timeout);
        if let Err(e) = &result {
            tracing::debug!(path = %path.display(), error = %e, "Forced delete failed");
        }
        result
    }
}

/// Doubled retry delay, saturating instead of overflowing.
fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2)
}
