//! Simulation time: integer ticks plus a delta-cycle index.
//!
//! [`SimTime`] orders events first by tick, then by delta cycle. Ticks are
//! unitless; the waveform timescale gives them a physical meaning.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A simulation time point.
///
/// Delta cycles are zero-duration propagation steps within one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Simulated time in ticks.
    pub ticks: u64,
    /// Delta cycle index within the current tick.
    pub delta: u32,
}

impl SimTime {
    /// Creates a time point at tick zero, delta zero.
    pub fn zero() -> Self {
        Self { ticks: 0, delta: 0 }
    }

    /// Creates a time point at the given tick with delta 0.
    pub fn at(ticks: u64) -> Self {
        Self { ticks, delta: 0 }
    }

    /// Returns the next delta cycle at the same tick.
    pub fn next_delta(&self) -> Self {
        Self {
            ticks: self.ticks,
            delta: self.delta + 1,
        }
    }

    /// Advances to a new tick, resetting the delta counter.
    pub fn advance_to(&self, ticks: u64) -> Self {
        debug_assert!(
            ticks >= self.ticks,
            "cannot advance backwards: {} -> {}",
            self.ticks,
            ticks
        );
        Self { ticks, delta: 0 }
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks
            .cmp(&other.ticks)
            .then(self.delta.cmp(&other.delta))
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.ticks)?;
        if self.delta > 0 {
            write!(f, "+d{}", self.delta)?;
        }
        Ok(())
    }
}
