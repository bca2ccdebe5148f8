//! Controller configuration schema.
//!
//! Mirrors the YAML file accepted by `crossway run --config` and
//! `crossway validate`. Every section is optional; omitted values fall
//! back to the startup defaults.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SignalError};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::table::{PhaseTable, SequenceConfig};

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Initial phase timing
    pub sequence: SequenceConfig,
    /// History retention
    pub history: HistoryConfig,
    /// HTTP control API
    pub http: HttpSettings,
}

/// History retention settings. Fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Records retained and returned by `/api/v1/history`
    pub max_records: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// `[host:]port` to bind
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Checks the values that deserialization cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations, a cycle
    /// with no duration at all, or a zero history size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sequence(&self.sequence)?;

        if self.history.max_records == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.max_records".to_string(),
                value: "0".to_string(),
                expected: "at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Builds the table for `sequence` and rejects a cycle that would never wait.
///
/// # Errors
///
/// Returns [`SignalError::InvalidConfiguration`] for negative durations or
/// when every phase is zero-length.
pub fn checked_table(sequence: &SequenceConfig) -> Result<PhaseTable, SignalError> {
    let table = PhaseTable::from_config(sequence)?;
    if table.is_degenerate() {
        return Err(SignalError::InvalidConfiguration {
            field: "sequence".to_string(),
            value: 0,
            expected: "at least one phase with a non-zero duration".to_string(),
        });
    }
    Ok(table)
}

fn validate_sequence(sequence: &SequenceConfig) -> Result<(), ConfigError> {
    checked_table(sequence).map(|_| ()).map_err(|err| match err {
        SignalError::InvalidConfiguration {
            field,
            value,
            expected,
        } => ConfigError::InvalidValue {
            field: format!("sequence.{field}"),
            value: value.to_string(),
            expected,
        },
        other @ SignalError::ConflictDetected { .. } => other.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg: ControllerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, ControllerConfig::default());
        assert_eq!(cfg.history.max_records, 10);
        assert_eq!(cfg.http.bind, DEFAULT_BIND_ADDR);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn full_document_parses() {
        let yaml = r#"
sequence:
  ns_green_secs: 30
  ns_yellow_secs: 4
  ew_green_secs: 25
  ew_yellow_secs: 4
history:
  max_records: 50
http:
  bind: "0.0.0.0:9000"
"#;
        let cfg: ControllerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.sequence.ns_green_secs, 30);
        assert_eq!(cfg.sequence.ew_yellow_secs, 4);
        assert_eq!(cfg.history.max_records, 50);
        assert_eq!(cfg.http.bind, "0.0.0.0:9000");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_section_rejected() {
        let res: Result<ControllerConfig, _> = serde_yaml::from_str("sensors: {}");
        assert!(res.is_err());
    }

    #[test]
    fn negative_duration_fails_validation_with_path() {
        let mut cfg = ControllerConfig::default();
        cfg.sequence.ns_yellow_secs = -3;
        match cfg.validate() {
            Err(ConfigError::InvalidValue { field, value, .. }) => {
                assert_eq!(field, "sequence.ns_yellow_secs");
                assert_eq!(value, "-3");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn all_zero_sequence_fails_validation() {
        let mut cfg = ControllerConfig::default();
        cfg.sequence = SequenceConfig {
            ns_green_secs: 0,
            ns_yellow_secs: 0,
            ew_green_secs: 0,
            ew_yellow_secs: 0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_history_fails_validation() {
        let mut cfg = ControllerConfig::default();
        cfg.history.max_records = 0;
        match cfg.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "history.max_records");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn checked_table_accepts_partial_zero() {
        let table = checked_table(&SequenceConfig {
            ns_green_secs: 0,
            ns_yellow_secs: 2,
            ew_green_secs: 4,
            ew_yellow_secs: 2,
        })
        .unwrap();
        assert!(table[0].is_instant());
    }
}
