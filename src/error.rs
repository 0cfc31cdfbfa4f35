//! Error types for repsync.

use thiserror::Error;

use crate::backend::RemoteError;

/// Main error type for repsync operations.
#[derive(Error, Debug)]
pub enum RepsyncError {
    /// Configuration or invalid-input error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or parse failure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A workout status change that the state machine forbids.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A workout is already in progress.
    #[error("A workout session is already active: {0}")]
    SessionActive(String),

    /// No workout is in progress.
    #[error("No active workout session")]
    NoActiveSession,

    /// Async runtime unavailable or misused.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Failure reported by the remote data service.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl From<serde_json::Error> for RepsyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl RepsyncError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 2,
            Self::NotFound(_) => 3,
            Self::InvalidTransition(_) | Self::SessionActive(_) | Self::NoActiveSession => 4,
            Self::Remote(_) => 5,
            Self::Database(_) | Self::Io(_) | Self::Runtime(_) => 1,
        }
    }
}
