//! `Crossway` Core: signal phase types and pure intersection logic
//!
//! This crate holds everything about a four-way intersection that does not
//! need a runtime: the phase table, status derivation, the conflict guard,
//! the bounded history log, and the configuration schema shared with the
//! `crossway` controller binary.

pub mod config;
pub mod error;
pub mod guard;
pub mod history;
pub mod signal;
pub mod status;
pub mod table;

pub use error::{ConfigError, SignalError};
pub use history::{HistoryLog, HistoryRecord};
pub use signal::{Color, Direction, Phase};
pub use status::StatusSnapshot;
pub use table::{PhaseTable, SequenceConfig};

/// Version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
