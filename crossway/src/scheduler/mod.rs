//! Phase scheduler
//!
//! Drives the intersection through its phase table on a wall-clock timer.
//!
//! # Architecture
//!
//! - [`SchedulerState`](state) - table, logical index, pause flag, timer
//!   generation and history, all behind one lock
//! - [`PhaseScheduler`] - public operations plus the timer-driven advance

pub mod engine;
pub mod state;

pub use engine::{PhaseScheduler, SchedulerConfig};
pub use state::Lifecycle;
