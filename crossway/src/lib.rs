//! `Crossway` - four-way intersection signal controller
//!
//! Runs the phase scheduler on tokio and exposes it over an HTTP control
//! API, with configuration loading, a CLI and observability around it.
//! The runtime-free domain types live in `crossway_core`.

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod scheduler;
pub mod transport;
