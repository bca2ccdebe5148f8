//! Core error types for `Crossway`
//!
//! Signal-safety and configuration errors shared across the workspace.

use std::path::PathBuf;
use thiserror::Error;

use crate::signal::Direction;

// ============================================================================
// Signal Errors
// ============================================================================

fn join_directions(directions: &[Direction]) -> String {
    directions
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while building phase tables or committing phases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// A duration or other schedule parameter is out of range.
    ///
    /// Raised before any scheduler state is touched, so a rejected
    /// reconfiguration leaves the running sequence intact.
    #[error("invalid configuration for '{field}': got {value}, expected {expected}")]
    InvalidConfiguration {
        /// Name of the offending parameter
        field: String,
        /// The value that was supplied
        value: i64,
        /// Description of the accepted range
        expected: String,
    },

    /// More than one approach would show a non-red aspect.
    #[error(
        "conflicting signals: {active} is active but {} not red",
        join_directions(conflicting)
    )]
    ConflictDetected {
        /// Direction that owns the current phase
        active: Direction,
        /// Inactive directions that were not red
        conflicting: Vec<Direction>,
    },
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}{}: {message}", line.map_or_else(String::new, |l| format!(" (line {l})")))]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("config file too large: {size} bytes (limit: {limit})")]
    FileTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },

    /// One or more configuration files failed validation.
    #[error("{count} file(s) failed validation")]
    ValidationFailed {
        /// Number of files that failed validation.
        count: usize,
    },
}

impl From<SignalError> for ConfigError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::InvalidConfiguration {
                field,
                value,
                expected,
            } => Self::InvalidValue {
                field,
                value: value.to_string(),
                expected,
            },
            SignalError::ConflictDetected { .. } => Self::InvalidValue {
                field: "sequence".to_string(),
                value: err.to_string(),
                expected: "a conflict-free phase table".to_string(),
            },
        }
    }
}
