//! Error types for the recorder.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for recording operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Archive backend refused to allocate a context
    #[error("Archive context creation failed")]
    ContextCreation,

    /// Archive could not be opened for writing
    #[error("Failed to open archive: {path}")]
    ArchiveOpen { path: PathBuf },

    /// Hierarchy setup failed while the session was starting
    #[error("Session begin failed: {0}")]
    SessionBegin(String),

    /// A sample write failed during a capture pass
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Handle unknown to the backend, or its context was released
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Recorder configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a session-begin error.
    pub fn begin(msg: impl Into<String>) -> Self {
        Self::SessionBegin(msg.into())
    }

    /// Create a capture error.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Create an invalid handle error.
    pub fn handle(msg: impl Into<String>) -> Self {
        Self::InvalidHandle(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias for recorder operations.
pub type Result<T> = std::result::Result<T, Error>;
