//! Phase scheduler orchestration.
//!
//! `PhaseScheduler` walks the phase table on the tokio timer. One lock
//! serializes the public operations and the timer callback; each armed
//! timer is a spawned task racing its deadline against a child
//! [`CancellationToken`], and a generation counter turns any fire that
//! slipped past cancellation into a no-op.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use crossway_core::config::{ControllerConfig, checked_table};
use crossway_core::history::DEFAULT_HISTORY_CAPACITY;
use crossway_core::table::PHASE_COUNT;
use crossway_core::{
    HistoryRecord, PhaseTable, SequenceConfig, SignalError, StatusSnapshot, guard, status,
};
use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::SchedulerError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;

use super::state::{Lifecycle, SchedulerState};

/// Computes a status snapshot from a table, logical index and pause flag.
pub(crate) type StatusDeriver = fn(&PhaseTable, u64, bool) -> StatusSnapshot;

/// Construction parameters for [`PhaseScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Records kept and returned by [`PhaseScheduler::history`]
    pub history_size: usize,
    /// Timing installed before the first `set_sequence`
    pub sequence: SequenceConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_CAPACITY,
            sequence: SequenceConfig::DEFAULT,
        }
    }
}

impl From<&ControllerConfig> for SchedulerConfig {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            history_size: config.history.max_records,
            sequence: config.sequence,
        }
    }
}

/// Timer-driven intersection phase scheduler.
///
/// Construct with [`new`](Self::new), wrap in an `Arc`, then call
/// [`start`](Self::start) from inside a tokio runtime. [`stop`](Self::stop)
/// cancels every armed timer; nothing advances after it returns.
pub struct PhaseScheduler {
    state: Mutex<SchedulerState>,
    history_size: usize,
    /// Parent of every timer token.
    cancel: CancellationToken,
    /// Runtime captured by `start`, used to spawn timer tasks from any thread.
    runtime: OnceLock<Handle>,
    events: Arc<EventEmitter>,
    deriver: StatusDeriver,
}

impl std::fmt::Debug for PhaseScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseScheduler")
            .field("history_size", &self.history_size)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl PhaseScheduler {
    /// Creates an idle scheduler at index 0 of the configured table.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Signal`] if the initial timing is negative
    /// or every phase is zero-length.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let table = checked_table(&config.sequence)?;
        let history_size = config.history_size.max(1);
        Ok(Self {
            state: Mutex::new(SchedulerState::new(table, history_size)),
            history_size,
            cancel: CancellationToken::new(),
            runtime: OnceLock::new(),
            events: Arc::new(EventEmitter::noop()),
            deriver: status::derive,
        })
    }

    /// Routes scheduler events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_deriver(mut self, deriver: StatusDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    /// Starts the cycle: the current phase is committed immediately and its
    /// timer armed.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::NoRuntime`] outside a tokio runtime
    /// - [`SchedulerError::AlreadyStarted`] on a second call
    /// - [`SchedulerError::Stopped`] after `stop`
    /// - [`SchedulerError::Signal`] if the conflict guard trips
    pub fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let mut state = self.lock();
        match state.lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running => return Err(SchedulerError::AlreadyStarted),
            Lifecycle::Stopped => return Err(SchedulerError::Stopped),
        }
        let _ = self.runtime.set(handle);
        state.lifecycle = Lifecycle::Running;
        info!(history_size = self.history_size, "phase scheduler started");

        if state.paused {
            return Ok(());
        }
        self.advance_locked(&mut state)?;
        Ok(())
    }

    /// Stops the scheduler. Idempotent.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.lifecycle == Lifecycle::Stopped {
            return;
        }
        state.lifecycle = Lifecycle::Stopped;
        state.cancel_pending();
        self.cancel.cancel();
        drop(state);
        info!("phase scheduler stopped");
    }

    /// Installs a new phase table and restarts the cycle from phase 0.
    ///
    /// The table is built and checked before any state changes, so a
    /// rejected timing leaves the running cycle untouched. When not paused
    /// the first phase is committed before this returns.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::Signal`] for negative durations, an all-zero
    ///   cycle, or a conflict guard failure. All four durations at zero is
    ///   the only non-negative timing that is rejected: such a cycle has no
    ///   phase to wait on.
    /// - [`SchedulerError::Stopped`] after `stop`
    pub fn set_sequence(self: &Arc<Self>, sequence: &SequenceConfig) -> Result<(), SchedulerError> {
        let table = checked_table(sequence)?;

        let mut state = self.lock();
        if state.lifecycle == Lifecycle::Stopped {
            return Err(SchedulerError::Stopped);
        }
        state.cancel_pending();
        state.table = Arc::new(table);
        state.index = 0;

        metrics::record_sequence_update();
        self.events.emit(Event::SequenceUpdated {
            timestamp: Utc::now(),
            timing: *sequence,
        });
        info!(
            ns_green_secs = sequence.ns_green_secs,
            ns_yellow_secs = sequence.ns_yellow_secs,
            ew_green_secs = sequence.ew_green_secs,
            ew_yellow_secs = sequence.ew_yellow_secs,
            generation = state.generation,
            "sequence updated"
        );

        if state.lifecycle == Lifecycle::Running && !state.paused {
            self.advance_locked(&mut state)?;
        }
        Ok(())
    }

    /// Freezes the cycle at the current phase. Idempotent.
    ///
    /// Time already spent in the phase is discarded.
    pub fn pause(&self) {
        let mut state = self.lock();
        if state.paused {
            return;
        }
        state.paused = true;
        state.cancel_pending();

        let sequence_id = state.index.saturating_add(1);
        metrics::record_pause();
        self.events.emit(Event::Paused {
            timestamp: Utc::now(),
            sequence_id,
        });
        info!(sequence_id, "cycle paused");
    }

    /// Unfreezes the cycle, restarting the current phase at its full
    /// duration. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Signal`] if the conflict guard trips on the
    /// restarted phase; the scheduler is paused again.
    pub fn resume(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let mut state = self.lock();
        if !state.paused {
            return Ok(());
        }
        state.paused = false;

        let sequence_id = state.index.saturating_add(1);
        metrics::record_resume();
        self.events.emit(Event::Resumed {
            timestamp: Utc::now(),
            sequence_id,
        });
        info!(sequence_id, "cycle resumed");

        if state.lifecycle == Lifecycle::Running {
            self.advance_locked(&mut state)?;
        }
        Ok(())
    }

    /// Current status of every approach.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let state = self.lock();
        (self.deriver)(&state.table, state.index, state.paused)
    }

    /// Most recent committed phases, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.lock().history.recent(self.history_size)
    }

    /// The conflict that last force-paused the cycle, if any.
    #[must_use]
    pub fn last_fault(&self) -> Option<SignalError> {
        self.lock().last_fault.clone()
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle
    }

    /// Configured history cap.
    #[must_use]
    pub const fn history_size(&self) -> usize {
        self.history_size
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commits the phase at the current index and arms its timer.
    ///
    /// Zero-length phases are recorded and skipped in place. The table is
    /// never all-zero, so a timed phase is reached within one cycle.
    fn advance_locked(self: &Arc<Self>, state: &mut SchedulerState) -> Result<(), SignalError> {
        for _ in 0..=PHASE_COUNT {
            let phase = *state.table.phase_at(state.index);
            let snapshot = (self.deriver)(&state.table, state.index, state.paused);
            if let Err(fault) = guard::check(&snapshot) {
                self.fault_locked(state, &fault);
                return Err(fault);
            }

            let record = HistoryRecord::for_phase(state.index, &phase, Utc::now());
            let sequence_id = record.sequence_id;
            state.history.append(record);

            let current = (phase.direction(), phase.color());
            metrics::record_phase_transition(current.0, current.1);
            metrics::set_active_phase(current, state.showing.replace(current));
            metrics::set_history_records(state.history.len());
            self.events.emit(Event::PhaseEntered {
                timestamp: Utc::now(),
                sequence_id,
                direction: current.0,
                color: current.1,
                duration_ms: phase.duration_ms(),
            });
            info!(
                sequence_id,
                direction = %current.0,
                color = %current.1,
                duration_ms = phase.duration_ms(),
                "phase committed"
            );

            if phase.is_instant() {
                state.index = state.index.wrapping_add(1);
                continue;
            }

            self.arm_locked(state, Duration::from_millis(phase.duration_ms()));
            return Ok(());
        }

        let fault = SignalError::InvalidConfiguration {
            field: "sequence".to_string(),
            value: 0,
            expected: "at least one phase with a non-zero duration".to_string(),
        };
        state.paused = true;
        state.cancel_pending();
        error!(error = %fault, "no timed phase in table, cycle paused");
        Err(fault)
    }

    /// Force-pauses on a conflict and records it.
    fn fault_locked(&self, state: &mut SchedulerState, fault: &SignalError) {
        state.paused = true;
        state.cancel_pending();
        state.last_fault = Some(fault.clone());

        metrics::record_conflict();
        self.events.emit(Event::ConflictDetected {
            timestamp: Utc::now(),
            detail: fault.to_string(),
        });
        error!(
            sequence_id = state.index.saturating_add(1),
            error = %fault,
            "conflict detected, cycle paused"
        );
    }

    /// Arms a one-shot timer that advances the cycle after `delay`.
    fn arm_locked(self: &Arc<Self>, state: &mut SchedulerState, delay: Duration) {
        let Some(handle) = self.runtime.get() else {
            return;
        };
        state.cancel_pending();
        let generation = state.generation;
        let token = self.cancel.child_token();
        state.pending = Some(token.clone());

        let deadline = Instant::now() + delay;
        let scheduler: Weak<Self> = Arc::downgrade(self);
        handle.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    if let Some(scheduler) = scheduler.upgrade() {
                        scheduler.on_timer(generation);
                    }
                }
            }
        });
        debug!(generation, delay_ms = delay.as_millis(), "phase timer armed");
    }

    fn on_timer(self: &Arc<Self>, generation: u64) {
        let mut state = self.lock();
        if !state.accepts_fire(generation) {
            metrics::record_stale_fire();
            debug!(
                generation,
                current = state.generation,
                paused = state.paused,
                "stale timer fire ignored"
            );
            return;
        }
        state.pending = None;
        state.index = state.index.wrapping_add(1);
        // Faults are stored in `last_fault`; there is no caller to return to.
        let _ = self.advance_locked(&mut state);
    }
}
