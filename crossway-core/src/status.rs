//! Externally visible intersection status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signal::{Color, Direction};
use crate::table::PhaseTable;

/// What every approach is showing right now.
///
/// Computed on demand from a table, a logical index and the pause flag;
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Approach that currently owns the junction
    pub active_direction: Direction,
    /// Aspect shown to the active approach
    pub active_color: Color,
    /// Aspects of the three other approaches
    pub inactive_state: BTreeMap<Direction, Color>,
    /// Whether phase advancement is frozen
    pub paused: bool,
}

impl StatusSnapshot {
    /// Inactive approaches whose aspect is not red.
    #[must_use]
    pub fn permissive_inactive(&self) -> Vec<Direction> {
        self.inactive_state
            .iter()
            .filter(|(_, color)| color.is_permissive())
            .map(|(direction, _)| *direction)
            .collect()
    }
}

/// Derives the status for `table[index mod len]`.
///
/// Inactive approaches are reported red: the model does not track their
/// aspects independently.
#[must_use]
pub fn derive(table: &PhaseTable, index: u64, paused: bool) -> StatusSnapshot {
    let active = table.phase_at(index);
    let inactive_state = Direction::ALL
        .into_iter()
        .filter(|d| *d != active.direction())
        .map(|d| (d, Color::Red))
        .collect();

    StatusSnapshot {
        active_direction: active.direction(),
        active_color: active.color(),
        inactive_state,
        paused,
    }
}
