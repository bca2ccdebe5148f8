//! Phase table construction.
//!
//! A [`PhaseTable`] is the fixed eight-step cycle the scheduler walks
//! through. Tables are immutable; reconfiguration builds a new one and the
//! scheduler swaps it in wholesale, so a reader holding an older table
//! still sees a consistent cycle.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::SignalError;
use crate::signal::{Color, Direction, Phase};

/// Number of phases in every table.
pub const PHASE_COUNT: usize = 8;

/// The four duration knobs, in seconds.
///
/// Signed so that a negative value supplied by a caller reaches
/// [`PhaseTable::build`] and is rejected there instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequenceConfig {
    /// North green, seconds
    pub ns_green_secs: i64,
    /// North yellow, seconds
    pub ns_yellow_secs: i64,
    /// East, south and west green, seconds
    pub ew_green_secs: i64,
    /// East, south and west yellow, seconds
    pub ew_yellow_secs: i64,
}

impl SequenceConfig {
    /// Startup timing: 20s green and 3s yellow on both axes.
    pub const DEFAULT: Self = Self {
        ns_green_secs: 20,
        ns_yellow_secs: 3,
        ew_green_secs: 20,
        ew_yellow_secs: 3,
    };
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Ordered, immutable cycle of eight phases.
///
/// Order is always NORTH-GREEN, NORTH-YELLOW, EAST-GREEN, EAST-YELLOW,
/// SOUTH-GREEN, SOUTH-YELLOW, WEST-GREEN, WEST-YELLOW. South and west reuse
/// the east/west durations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTable {
    phases: [Phase; PHASE_COUNT],
}

impl PhaseTable {
    /// Builds a table from four second counts.
    ///
    /// Zero is accepted and yields an instant phase.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::InvalidConfiguration`] if any value is negative
    /// or too large to express in milliseconds.
    pub fn build(
        ns_green_secs: i64,
        ns_yellow_secs: i64,
        ew_green_secs: i64,
        ew_yellow_secs: i64,
    ) -> Result<Self, SignalError> {
        let ns_green = to_millis("ns_green_secs", ns_green_secs)?;
        let ns_yellow = to_millis("ns_yellow_secs", ns_yellow_secs)?;
        let ew_green = to_millis("ew_green_secs", ew_green_secs)?;
        let ew_yellow = to_millis("ew_yellow_secs", ew_yellow_secs)?;

        Ok(Self::assemble(ns_green, ns_yellow, ew_green, ew_yellow))
    }

    /// Builds a table from a [`SequenceConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`PhaseTable::build`].
    pub fn from_config(config: &SequenceConfig) -> Result<Self, SignalError> {
        Self::build(
            config.ns_green_secs,
            config.ns_yellow_secs,
            config.ew_green_secs,
            config.ew_yellow_secs,
        )
    }

    /// The startup table (20/3/20/3).
    #[must_use]
    pub const fn default_cycle() -> Self {
        Self::assemble(20_000, 3_000, 20_000, 3_000)
    }

    const fn assemble(ns_green: u64, ns_yellow: u64, ew_green: u64, ew_yellow: u64) -> Self {
        Self {
            phases: [
                Phase::new(Direction::North, Color::Green, ns_green),
                Phase::new(Direction::North, Color::Yellow, ns_yellow),
                Phase::new(Direction::East, Color::Green, ew_green),
                Phase::new(Direction::East, Color::Yellow, ew_yellow),
                Phase::new(Direction::South, Color::Green, ew_green),
                Phase::new(Direction::South, Color::Yellow, ew_yellow),
                Phase::new(Direction::West, Color::Green, ew_green),
                Phase::new(Direction::West, Color::Yellow, ew_yellow),
            ],
        }
    }

    /// Number of phases (always [`PHASE_COUNT`]).
    #[must_use]
    pub const fn len(&self) -> usize {
        PHASE_COUNT
    }

    /// Tables are never empty; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Phase for a logical, ever-increasing cycle index.
    #[must_use]
    pub const fn phase_at(&self, index: u64) -> &Phase {
        #[allow(clippy::cast_possible_truncation)]
        let slot = (index % PHASE_COUNT as u64) as usize;
        &self.phases[slot]
    }

    /// Iterates the phases in cycle order.
    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter()
    }

    /// Sum of all phase durations.
    #[must_use]
    pub fn cycle_duration_ms(&self) -> u64 {
        self.phases
            .iter()
            .map(Phase::duration_ms)
            .fold(0, u64::saturating_add)
    }

    /// A cycle where every phase is instant would never yield.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.phases.iter().all(Phase::is_instant)
    }
}

impl Index<usize> for PhaseTable {
    type Output = Phase;

    fn index(&self, index: usize) -> &Self::Output {
        &self.phases[index]
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::default_cycle()
    }
}

fn to_millis(field: &str, seconds: i64) -> Result<u64, SignalError> {
    u64::try_from(seconds)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .ok_or_else(|| SignalError::InvalidConfiguration {
            field: field.to_string(),
            value: seconds,
            expected: "a non-negative number of seconds".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [(Direction, Color); PHASE_COUNT] = [
        (Direction::North, Color::Green),
        (Direction::North, Color::Yellow),
        (Direction::East, Color::Green),
        (Direction::East, Color::Yellow),
        (Direction::South, Color::Green),
        (Direction::South, Color::Yellow),
        (Direction::West, Color::Green),
        (Direction::West, Color::Yellow),
    ];

    #[test]
    fn build_produces_fixed_order() {
        let table = PhaseTable::build(5, 2, 4, 1).unwrap();
        assert_eq!(table.len(), PHASE_COUNT);
        for (phase, (direction, color)) in table.iter().zip(ORDER) {
            assert_eq!(phase.direction(), direction);
            assert_eq!(phase.color(), color);
        }
    }

    #[test]
    fn build_converts_to_millis_and_reuses_ew_timing() {
        let table = PhaseTable::build(5, 2, 4, 1).unwrap();
        let durations: Vec<u64> = table.iter().map(Phase::duration_ms).collect();
        assert_eq!(
            durations,
            vec![5000, 2000, 4000, 1000, 4000, 1000, 4000, 1000]
        );
    }

    #[test]
    fn build_accepts_zero() {
        let table = PhaseTable::build(0, 2, 4, 2).unwrap();
        assert!(table[0].is_instant());
        assert!(!table.is_degenerate());
    }

    #[test]
    fn all_zero_table_is_degenerate() {
        let table = PhaseTable::build(0, 0, 0, 0).unwrap();
        assert_eq!(table.len(), PHASE_COUNT);
        assert!(table.is_degenerate());
        assert_eq!(table.cycle_duration_ms(), 0);
    }

    #[test]
    fn build_rejects_negative() {
        let err = PhaseTable::build(20, 3, -1, 3).unwrap_err();
        assert_eq!(
            err,
            SignalError::InvalidConfiguration {
                field: "ew_green_secs".to_string(),
                value: -1,
                expected: "a non-negative number of seconds".to_string(),
            }
        );
    }

    #[test]
    fn build_rejects_overflowing_seconds() {
        assert!(PhaseTable::build(i64::MAX, 3, 20, 3).is_err());
    }

    #[test]
    fn default_cycle_matches_default_config() {
        let built = PhaseTable::from_config(&SequenceConfig::default()).unwrap();
        assert_eq!(built, PhaseTable::default_cycle());
        assert_eq!(built.cycle_duration_ms(), 92_000);
    }

    #[test]
    fn phase_at_wraps_logical_index() {
        let table = PhaseTable::default_cycle();
        assert_eq!(table.phase_at(0), &table[0]);
        assert_eq!(table.phase_at(9), &table[1]);
        assert_eq!(table.phase_at(8 * 1_000 + 6), &table[6]);
    }

    #[test]
    fn sequence_config_partial_yaml_uses_defaults() {
        let cfg: SequenceConfig = serde_yaml::from_str("ns_green_secs: 30").unwrap();
        assert_eq!(cfg.ns_green_secs, 30);
        assert_eq!(cfg.ns_yellow_secs, 3);
        assert_eq!(cfg.ew_green_secs, 20);
    }

    #[test]
    fn sequence_config_rejects_unknown_fields() {
        let res: Result<SequenceConfig, _> = serde_yaml::from_str("red_secs: 4");
        assert!(res.is_err());
    }
}
