//! Delta-cycle discrete-event simulator for Strata hardware descriptions.
//!
//! This crate implements the simulation core: bit-accurate signals with
//! pending-write commit semantics, slice, concatenation and tristate views
//! over them, and processes written as resumable state machines that
//! suspend on delays, edges, value changes or other processes.
//!
//! # Architecture
//!
//! A [`Simulator`] owns the [`SignalTable`], the processes and the event
//! queue. Every delta cycle runs each ready process to its next
//! suspension, then commits all pending writes atomically and releases the
//! waiters whose conditions fired. Waiters run in the next delta cycle.
//! Multiple writers to the same bits, or overlapping slice writes, within
//! one delta are a [`SimError::WriteConflict`].
//!
//! # Usage
//!
//! ```ignore
//! use strata_sim::{simulate, ProcessContext, ProcessKind, SimConfig, Simulator, Suspend};
//!
//! let mut sim = Simulator::new();
//! let led = sim.signal("led", false)?;
//! sim.spawn("bench", ProcessKind::Initial, move |cx: &mut ProcessContext<'_>| {
//!     cx.write(&led, true)?;
//!     Ok(Suspend::Done)
//! });
//! let result = simulate(&mut sim, &SimConfig::default())?;
//! println!("Simulation ended at {}", result.final_time);
//! ```
//!
//! # Modules
//!
//! - `error`: Simulation error types
//! - `time`: Tick plus delta-cycle time
//! - `signal`: Signal storage, pending writes and tristate resolution
//! - `view`: Slice, concatenation and tristate bus views
//! - `process`: Process trait, wait conditions and process helpers
//! - `waveform`: Waveform recording (VCD format)
//! - `kernel`: Simulation kernel with event queue and delta-cycle loop

#![warn(missing_docs)]

pub mod error;
pub mod kernel;
pub mod process;
pub mod signal;
pub mod time;
pub mod view;
pub mod waveform;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use strata_config::RunConfig;

pub use error::SimError;
pub use kernel::{SimResult, Simulator};
pub use process::{
    always_comb, always_seq, assign, Process, ProcessContext, ProcessKind, ProcessState,
    ResetSpec, Suspend, WaitCondition,
};
pub use signal::{resolve_tristate, BusState, Edge, SignalState, SignalTable, Writer};
pub use time::SimTime;
pub use view::{ConcatPart, ConcatView, SignalSink, SignalSource, SliceView, TristateBus};
pub use waveform::{VcdRecorder, WaveformRecorder};

/// Configuration for a simulation run.
///
/// Controls time limits, delta-cycle limits, the stall policy and waveform output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Optional simulation time limit in ticks.
    /// If `None`, simulation runs until quiescence or a stop request.
    pub time_limit: Option<u64>,
    /// Maximum delta cycles within a single time step.
    pub max_deltas: u32,
    /// Whether initial processes left waiting at quiescence abort the run.
    pub stall_is_error: bool,
    /// Whether to record waveform data. Ignored if `waveform_path` is `None`.
    pub record_waveform: bool,
    /// Optional path for waveform output.
    pub waveform_path: Option<PathBuf>,
    /// Name of the top-level waveform scope.
    pub waveform_scope: String,
    /// Timescale declared in the waveform header.
    pub timescale: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_deltas: 10_000,
            stall_is_error: true,
            record_waveform: false,
            waveform_path: None,
            waveform_scope: "top".to_string(),
            timescale: "1ns".to_string(),
        }
    }
}

impl From<&RunConfig> for SimConfig {
    fn from(config: &RunConfig) -> Self {
        Self {
            time_limit: config.simulation.time_limit,
            max_deltas: config.simulation.max_deltas,
            stall_is_error: config.simulation.stall_is_error,
            record_waveform: config.waveform.enabled,
            waveform_path: config.waveform.path.clone(),
            waveform_scope: config.waveform.scope.clone(),
            timescale: config.waveform.timescale.to_string(),
        }
    }
}

/// High-level entry point: runs a prepared simulator under a configuration.
///
/// Applies `config` to the simulator, optionally attaches a VCD recorder
/// writing to `config.waveform_path`, and runs to completion.
pub fn simulate(sim: &mut Simulator, config: &SimConfig) -> Result<SimResult, SimError> {
    sim.set_config(config.clone());

    if config.record_waveform {
        if let Some(path) = &config.waveform_path {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            let recorder = VcdRecorder::with_timescale(writer, config.timescale.clone());
            sim.set_recorder(Box::new(recorder));
        }
    }

    sim.run()
}
