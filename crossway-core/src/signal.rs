//! Signal vocabulary: approaches, aspects, and timed phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One approach of the four-way intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Northbound approach
    North,
    /// Eastbound approach
    East,
    /// Southbound approach
    South,
    /// Westbound approach
    West,
}

impl Direction {
    /// All approaches in cycle order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Returns the uppercase name used on the wire and in metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::East => "EAST",
            Self::South => "SOUTH",
            Self::West => "WEST",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal aspect shown to an approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    /// Proceed
    Green,
    /// Clear the intersection
    Yellow,
    /// Stop
    Red,
}

impl Color {
    /// Returns the uppercase name used on the wire and in metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }

    /// Whether this aspect lets traffic enter or occupy the junction.
    #[must_use]
    pub const fn is_permissive(self) -> bool {
        !matches!(self, Self::Red)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed step of the cycle: a single approach showing green or yellow.
///
/// Phases are only produced by [`PhaseTable::build`](crate::table::PhaseTable::build)
/// and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    direction: Direction,
    color: Color,
    duration_ms: u64,
}

impl Phase {
    pub(crate) const fn new(direction: Direction, color: Color, duration_ms: u64) -> Self {
        Self {
            direction,
            color,
            duration_ms,
        }
    }

    /// Approach that owns this phase.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Aspect shown to the owning approach.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// How long the phase runs, in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// How long the phase runs, in whole seconds.
    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_ms / 1000
    }

    /// Zero-length phases are recorded but skipped without waiting.
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.duration_ms == 0
    }
}
