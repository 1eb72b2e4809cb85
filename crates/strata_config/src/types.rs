//! Configuration types deserialized from `strata.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The top-level run configuration parsed from `strata.toml`.
///
/// Every table is optional; a missing table takes its defaults.
#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    /// Scheduler limits and stall policy.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Waveform dump settings.
    #[serde(default)]
    pub waveform: WaveformConfig,
}

/// Scheduler limits for a simulation run.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Simulated time (in ticks) after which the run stops. `None` runs
    /// until quiescence.
    #[serde(default)]
    pub time_limit: Option<u64>,
    /// Maximum number of delta cycles allowed within a single time step.
    #[serde(default = "default_max_deltas")]
    pub max_deltas: u32,
    /// Whether a stalled testbench aborts the run or is only reported.
    #[serde(default = "default_true")]
    pub stall_is_error: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_deltas: default_max_deltas(),
            stall_is_error: true,
        }
    }
}

fn default_max_deltas() -> u32 {
    10_000
}

fn default_true() -> bool {
    true
}

/// VCD waveform dump settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct WaveformConfig {
    /// Whether a waveform is written at all.
    #[serde(default)]
    pub enabled: bool,
    /// Output file path. Required when `enabled` is set.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Name of the top-level VCD scope.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Duration of one simulation tick.
    #[serde(default)]
    pub timescale: Timescale,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
            scope: default_scope(),
            timescale: Timescale::default(),
        }
    }
}

fn default_scope() -> String {
    "top".to_string()
}

/// Unit of a [`Timescale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Seconds.
    S,
    /// Milliseconds.
    Ms,
    /// Microseconds.
    Us,
    /// Nanoseconds.
    Ns,
    /// Picoseconds.
    Ps,
    /// Femtoseconds.
    Fs,
}

impl TimeUnit {
    fn suffix(self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
            TimeUnit::Ps => "ps",
            TimeUnit::Fs => "fs",
        }
    }
}

/// A VCD timescale such as `1ns` or `100ps`.
///
/// The magnitude must be 1, 10 or 100 as IEEE 1364 requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timescale {
    /// Numeric part (1, 10 or 100).
    pub magnitude: u32,
    /// Unit part.
    pub unit: TimeUnit,
}

impl Default for Timescale {
    fn default() -> Self {
        Self {
            magnitude: 1,
            unit: TimeUnit::Ns,
        }
    }
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

impl FromStr for Timescale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("timescale '{s}' has no unit"))?;
        let (digits, unit) = s.split_at(split);
        let magnitude: u32 = digits
            .parse()
            .map_err(|_| format!("timescale '{s}' has no magnitude"))?;
        if !matches!(magnitude, 1 | 10 | 100) {
            return Err(format!("timescale magnitude must be 1, 10 or 100, got {magnitude}"));
        }
        let unit = match unit.trim() {
            "s" => TimeUnit::S,
            "ms" => TimeUnit::Ms,
            "us" => TimeUnit::Us,
            "ns" => TimeUnit::Ns,
            "ps" => TimeUnit::Ps,
            "fs" => TimeUnit::Fs,
            other => return Err(format!("unknown timescale unit '{other}'")),
        };
        Ok(Self { magnitude, unit })
    }
}

impl<'de> Deserialize<'de> for Timescale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TimescaleVisitor;

        impl Visitor<'_> for TimescaleVisitor {
            type Value = Timescale;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a timescale string such as \"1ns\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(TimescaleVisitor)
    }
}
