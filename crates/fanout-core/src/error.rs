//! Error types for analysis operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::scope::ScopeError;

/// Result alias used throughout the analyzers.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while building or scanning a stats tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed construction input, e.g. an empty path.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found (or vanished mid-scan).
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The task was aborted because a sibling or ancestor failed.
    #[error("Operation cancelled")]
    Cancelled,

    /// A spawned task panicked.
    #[error("Task panicked: {message}")]
    TaskPanicked { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether this error came from a filesystem read.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NotFound { .. } | Self::Io { .. }
        )
    }

    /// Whether this error is a silent cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The path the failure is attached to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::NotADirectory { path } => Some(path),
            _ => None,
        }
    }
}

impl ScopeError for ScanError {
    fn cancelled() -> Self {
        Self::Cancelled
    }

    fn panicked(message: String) -> Self {
        Self::TaskPanicked { message }
    }

    fn is_cancelled(&self) -> bool {
        ScanError::is_cancelled(self)
    }
}
