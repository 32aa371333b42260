//! Error types for the network demos.

use fanout_core::ScopeError;
use thiserror::Error;

/// Result alias for network operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors raised by the echo server and the sender.
#[derive(Debug, Error)]
pub enum NetError {
    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection before sending a line.
    #[error("Connection closed before a line was received")]
    ConnectionClosed,

    /// The task was stopped because a sibling failed.
    #[error("Operation cancelled")]
    Cancelled,

    /// A spawned task panicked.
    #[error("Task panicked: {message}")]
    TaskPanicked { message: String },
}

impl ScopeError for NetError {
    fn cancelled() -> Self {
        Self::Cancelled
    }

    fn panicked(message: String) -> Self {
        Self::TaskPanicked { message }
    }

    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
