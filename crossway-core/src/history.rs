//! Bounded record of committed phases.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signal::{Color, Direction, Phase};

/// Default number of records retained and returned.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// One committed phase.
///
/// `id` is the 1-based logical cycle index at commit time; it keeps
/// increasing across reconfigurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Logical sequence number (current index + 1)
    #[serde(rename = "id")]
    pub sequence_id: u64,
    /// Approach that owned the phase
    pub direction: Direction,
    /// Aspect shown
    pub color: Color,
    /// When the phase was committed
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
    /// Configured phase length in whole seconds
    pub duration_seconds: u64,
}

impl HistoryRecord {
    /// Builds the record for `phase` committed at logical `index`.
    #[must_use]
    pub fn for_phase(index: u64, phase: &Phase, occurred_at: DateTime<Utc>) -> Self {
        Self {
            sequence_id: index.saturating_add(1),
            direction: phase.direction(),
            color: phase.color(),
            occurred_at,
            duration_seconds: phase.duration_secs(),
        }
    }
}

/// Ring buffer of [`HistoryRecord`]s.
///
/// Holds at most `capacity` records; appending beyond that evicts the
/// oldest, so memory stays flat for a long-running controller.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl HistoryLog {
    /// Creates an empty log. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest once full.
    pub fn append(&mut self, record: HistoryRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Up to `limit` records, most recent first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<HistoryRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of retained records.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
