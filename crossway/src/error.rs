//! Error types for `Crossway`
//!
//! Aggregates the core signal and configuration errors with the
//! scheduler, transport and process-level failures, and maps each to a
//! process exit code.

use thiserror::Error;

pub use crossway_core::error::{ConfigError, SignalError};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `Crossway` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Transport error (bind failed, server error)
    pub const TRANSPORT_ERROR: i32 = 4;

    /// Scheduler error (conflict detected, lifecycle misuse)
    pub const SCHEDULER_ERROR: i32 = 5;

    /// Usage error (unknown subcommand, invalid or missing arguments)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `Crossway` operations.
#[derive(Debug, Error)]
pub enum CrosswayError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Phase scheduler error
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// HTTP transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrosswayError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) => ExitCode::CONFIG_ERROR,
            Self::Scheduler(_) => ExitCode::SCHEDULER_ERROR,
            Self::Transport(_) => ExitCode::TRANSPORT_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

impl From<SignalError> for CrosswayError {
    fn from(err: SignalError) -> Self {
        Self::Scheduler(SchedulerError::Signal(err))
    }
}

// ============================================================================
// Scheduler Errors
// ============================================================================

/// Phase scheduler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Table construction or the conflict guard rejected the operation
    #[error(transparent)]
    Signal(#[from] SignalError),

    /// `start` was called outside a tokio runtime
    #[error("scheduler must be started from within a tokio runtime")]
    NoRuntime,

    /// `start` was called a second time
    #[error("scheduler already started")]
    AlreadyStarted,

    /// The scheduler has been stopped and accepts no further reconfiguration
    #[error("scheduler stopped")]
    Stopped,
}

impl SchedulerError {
    /// Whether this error is the conflict-guard fault.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Signal(SignalError::ConflictDetected { .. }))
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// HTTP transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind or resolve the listen address
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `Crossway` operations.
pub type Result<T> = std::result::Result<T, CrosswayError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crossway_core::Direction;

    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::TRANSPORT_ERROR, 4);
        assert_eq!(ExitCode::SCHEDULER_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: CrosswayError = ConfigError::MissingFile {
            path: PathBuf::from("/etc/crossway.yaml"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_scheduler_error_exit_code() {
        let err: CrosswayError = SchedulerError::AlreadyStarted.into();
        assert_eq!(err.exit_code(), ExitCode::SCHEDULER_ERROR);
    }

    #[test]
    fn test_signal_error_maps_to_scheduler() {
        let err: CrosswayError = SignalError::ConflictDetected {
            active: Direction::North,
            conflicting: vec![Direction::South],
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::SCHEDULER_ERROR);
        assert!(matches!(err, CrosswayError::Scheduler(e) if e.is_conflict()));
    }

    #[test]
    fn test_transport_error_exit_code() {
        let err: CrosswayError = TransportError::ConnectionFailed("bind".to_string()).into();
        assert_eq!(err.exit_code(), ExitCode::TRANSPORT_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: CrosswayError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_invalid_configuration_is_not_conflict() {
        let err = SchedulerError::Signal(SignalError::InvalidConfiguration {
            field: "ns_green_secs".to_string(),
            value: -1,
            expected: "a non-negative number of seconds".to_string(),
        });
        assert!(!err.is_conflict());
    }
}
