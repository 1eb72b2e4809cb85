//! Simulation error types.
//!
//! All errors that can occur while building or running a simulation are
//! represented as variants of [`SimError`]. Any error returned by a process
//! or by the commit phase aborts the whole run.

use std::io;

use strata_common::BitError;
use strata_ir::{BusId, ProcessId, SignalId};

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A range, index or bounds violation on a value.
    #[error(transparent)]
    Bits(#[from] BitError),

    /// Two writers drove overlapping bits of a signal in the same delta
    /// cycle, or two tristate drivers asserted different values.
    #[error("write conflict on '{signal}': {detail}")]
    WriteConflict {
        /// The signal or bus name.
        signal: String,
        /// What collided.
        detail: String,
    },

    /// A write was attempted through a read-only view.
    #[error("cannot write through read-only view: {view}")]
    ReadOnlyView {
        /// Description of the view.
        view: String,
    },

    /// The run became quiescent while initial processes were still waiting.
    #[error("simulation stalled at t={time}: waiting processes: {}", .processes.join(", "))]
    Stalled {
        /// Simulated time of quiescence.
        time: u64,
        /// Names of the processes still waiting.
        processes: Vec<String>,
    },

    /// Too many delta cycles at a single time step, indicating a combinational loop.
    #[error("delta cycle limit exceeded at t={time} (max {max_deltas} deltas)")]
    DeltaCycleLimit {
        /// The time step where the limit was hit.
        time: u64,
        /// The maximum number of delta cycles allowed.
        max_deltas: u32,
    },

    /// An error raised while a process was running.
    #[error("process '{process}' failed at t={time}: {source}")]
    ProcessFailed {
        /// The process name.
        process: String,
        /// Simulated time of the failure.
        time: u64,
        /// The underlying error.
        source: Box<SimError>,
    },

    /// The commit phase rejected the writes of a delta cycle, e.g. two
    /// tristate drivers asserting different values.
    #[error("commit failed at t={time}: {source}")]
    CommitFailed {
        /// Simulated time of the failing delta cycle.
        time: u64,
        /// The underlying error.
        source: Box<SimError>,
    },

    /// A signal ID that was not allocated by this simulator.
    #[error("unknown signal {0}")]
    UnknownSignal(SignalId),

    /// A process ID that was not allocated by this simulator.
    #[error("unknown process {0}")]
    UnknownProcess(ProcessId),

    /// A bus ID that was not allocated by this simulator.
    #[error("unknown tristate bus {0}")]
    UnknownBus(BusId),

    /// A signal was used in a way its shape does not allow.
    #[error("invalid signal use: {reason}")]
    InvalidSignal {
        /// Description of the misuse.
        reason: String,
    },

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}

impl SimError {
    /// Strips any [`SimError::ProcessFailed`] or [`SimError::CommitFailed`]
    /// wrapping and returns the root cause.
    pub fn root_cause(&self) -> &SimError {
        match self {
            SimError::ProcessFailed { source, .. } | SimError::CommitFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_conflict_display() {
        let e = SimError::WriteConflict {
            signal: "bus".into(),
            detail: "drivers disagree".into(),
        };
        assert_eq!(e.to_string(), "write conflict on 'bus': drivers disagree");
    }

    #[test]
    fn stalled_lists_processes() {
        let e = SimError::Stalled {
            time: 40,
            processes: vec!["stim".into(), "check".into()],
        };
        assert_eq!(
            e.to_string(),
            "simulation stalled at t=40: waiting processes: stim, check"
        );
    }

    #[test]
    fn delta_cycle_limit_display() {
        let e = SimError::DeltaCycleLimit {
            time: 100,
            max_deltas: 10000,
        };
        assert_eq!(
            e.to_string(),
            "delta cycle limit exceeded at t=100 (max 10000 deltas)"
        );
    }

    #[test]
    fn bit_errors_are_transparent() {
        let e: SimError = BitError::EmptyConcat.into();
        assert_eq!(e.to_string(), BitError::EmptyConcat.to_string());
    }

    #[test]
    fn process_failed_wraps_and_unwraps() {
        let e = SimError::ProcessFailed {
            process: "driver".into(),
            time: 7,
            source: Box::new(SimError::ReadOnlyView {
                view: "concat".into(),
            }),
        };
        assert!(e.to_string().starts_with("process 'driver' failed at t=7"));
        assert!(matches!(e.root_cause(), SimError::ReadOnlyView { .. }));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn commit_failed_carries_time() {
        let e = SimError::CommitFailed {
            time: 20,
            source: Box::new(SimError::WriteConflict {
                signal: "bus".into(),
                detail: "tristate drivers assert 1 and 2".into(),
            }),
        };
        assert_eq!(
            e.to_string(),
            "commit failed at t=20: write conflict on 'bus': tristate drivers assert 1 and 2"
        );
        assert!(matches!(e.root_cause(), SimError::WriteConflict { .. }));
    }

    #[test]
    fn waveform_io_display() {
        let e = SimError::WaveformIo(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(e.to_string().contains("waveform I/O error"));
    }
}
