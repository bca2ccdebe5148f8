//! Mutable scheduler state.
//!
//! Everything here is owned by [`PhaseScheduler`](super::PhaseScheduler)
//! and only touched while its lock is held.

use std::sync::Arc;

use crossway_core::{Color, Direction, HistoryLog, PhaseTable, SignalError};
use tokio_util::sync::CancellationToken;

/// Where the scheduler is in its start/stop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, `start` not yet called
    Idle,
    /// Timers may be armed
    Running,
    /// `stop` was called; no further advances
    Stopped,
}

/// State guarded by the scheduler lock.
#[derive(Debug)]
pub(crate) struct SchedulerState {
    /// Installed table; replaced wholesale, never mutated.
    pub(crate) table: Arc<PhaseTable>,
    /// Logical index, interpreted modulo the table length. Never wraps.
    pub(crate) index: u64,
    pub(crate) paused: bool,
    pub(crate) lifecycle: Lifecycle,
    /// Bumped on every arm and cancel. A timer fire whose captured value
    /// no longer matches is stale.
    pub(crate) generation: u64,
    /// Token of the armed timer task, if any.
    pub(crate) pending: Option<CancellationToken>,
    pub(crate) history: HistoryLog,
    pub(crate) last_fault: Option<SignalError>,
    /// Phase currently reflected in the active-phase gauge.
    pub(crate) showing: Option<(Direction, Color)>,
}

impl SchedulerState {
    pub(crate) fn new(table: PhaseTable, history_size: usize) -> Self {
        Self {
            table: Arc::new(table),
            index: 0,
            paused: false,
            lifecycle: Lifecycle::Idle,
            generation: 0,
            pending: None,
            history: HistoryLog::new(history_size),
            last_fault: None,
            showing: None,
        }
    }

    /// Cancels the armed timer (if any) and invalidates every fire that
    /// may already be waiting on the lock.
    pub(crate) fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether a fire armed at `generation` may still advance the cycle.
    pub(crate) fn accepts_fire(&self, generation: u64) -> bool {
        self.lifecycle == Lifecycle::Running && !self.paused && self.generation == generation
    }
}
