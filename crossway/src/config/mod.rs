//! Configuration module
//!
//! Loads the controller YAML file; the schema itself lives in
//! `crossway_core::config` so validators and the controller share it.

pub mod loader;

pub use crossway_core::config::{
    ControllerConfig, DEFAULT_BIND_ADDR, HistoryConfig, HttpSettings, checked_table,
};
pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions, validate};
