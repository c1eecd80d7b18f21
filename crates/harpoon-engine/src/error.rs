//! Error types for harpoon-engine

use std::path::PathBuf;

/// Result type for harpoon-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in harpoon-engine operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Container runtime failed to {operation}: {message}")]
    Runtime {
        operation: &'static str,
        message: String,
    },

    #[error("Cancelled before container runtime could {operation}")]
    Cancelled { operation: &'static str },

    #[error("Deadline exceeded while container runtime tried to {operation}")]
    DeadlineExceeded { operation: &'static str },

    #[error("Invalid container spec: {message}")]
    InvalidSpec { message: String },

    #[error("Helper container {container} exited with status {exit_code}")]
    HelperFailed { container: String, exit_code: i64 },

    #[error("Cannot derive a service name from {path}")]
    NoServiceName { path: PathBuf },
}

impl Error {
    pub fn runtime(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Runtime {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            message: message.into(),
        }
    }
}
