use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum ResetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not determine the user's home directory")]
    NoHomeDir,
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Why a single deletion attempt did not remove its path.
#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {code:?}")]
    Command { program: String, code: Option<i32> },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Path still present after removal: {0}")]
    StillPresent(PathBuf),
}

/// Classification of a deletion failure.
///
/// `NotFound` is never reported as a failure by the engine; it exists so
/// callers can classify raw IO errors with the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    InUseOrLocked,
    CommandFailed,
    Unknown,
}

impl FailureKind {
    /// Classify an IO error.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FailureKind::NotFound,
            io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
            _ if is_lock_error(err) => FailureKind::InUseOrLocked,
            _ => FailureKind::Unknown,
        }
    }
}

#[cfg(unix)]
fn is_lock_error(err: &io::Error) -> bool {
    // EBUSY, ETXTBSY
    matches!(err.raw_os_error(), Some(16) | Some(26))
}

#[cfg(windows)]
fn is_lock_error(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(any(unix, windows)))]
fn is_lock_error(_err: &io::Error) -> bool {
    false
}

impl DeleteError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DeleteError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            DeleteError::Io { source, .. } => FailureKind::from_io(source),
            DeleteError::Command { .. } | DeleteError::Spawn { .. } | DeleteError::Timeout { .. } => {
                FailureKind::CommandFailed
            }
            DeleteError::StillPresent(_) => FailureKind::Unknown,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ResetError>;
