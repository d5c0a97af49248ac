//! Error types for the job scheduler
//!
//! The runtime error surface is deliberately small: backpressure is
//! absorbed by spinning and never surfaced, so errors only arise at
//! initialization.

use core::fmt;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur in scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// Configuration rejected by validation
    InvalidConfig(&'static str),

    /// Failed to spawn a worker thread
    WorkerSpawnFailed,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            SchedError::WorkerSpawnFailed => write!(f, "failed to spawn worker thread"),
        }
    }
}

impl std::error::Error for SchedError {}
