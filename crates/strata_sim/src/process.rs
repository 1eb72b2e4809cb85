//! Processes: re-entrant step functions driven by the scheduler.
//!
//! A [`Process`] runs synchronously until it returns a [`Suspend`]. The
//! scheduler resumes it once the returned [`WaitCondition`] is satisfied.
//! Closures implement [`Process`] directly; [`always_comb`], [`always_seq`]
//! and [`assign`] build the common hardware idioms.

use strata_common::Value;
use strata_ir::{ProcessId, SignalId};

use crate::error::SimError;
use crate::signal::{Edge, SignalTable};
use crate::view::{SignalSink, SignalSource};

/// What a process is waiting for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaitCondition {
    /// A number of ticks from now.
    Delay(u64),
    /// An edge of a signal.
    Edge(SignalId, Edge),
    /// Any committed change of any of the signals.
    Change(Vec<SignalId>),
    /// Termination of another process.
    ProcessDone(ProcessId),
    /// Whichever of the conditions is satisfied first.
    AnyOf(Vec<WaitCondition>),
}

/// How a process hands control back to the scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Suspend {
    /// Park until the condition holds.
    Wait(WaitCondition),
    /// The process has finished.
    Done,
    /// End the whole simulation now.
    Stop,
}

impl Suspend {
    /// Waits `ticks` ticks.
    pub fn delay(ticks: u64) -> Self {
        Suspend::Wait(WaitCondition::Delay(ticks))
    }

    /// Waits for a rising edge of `signal`.
    pub fn rising(signal: SignalId) -> Self {
        Suspend::Wait(WaitCondition::Edge(signal, Edge::Rising))
    }

    /// Waits for a falling edge of `signal`.
    pub fn falling(signal: SignalId) -> Self {
        Suspend::Wait(WaitCondition::Edge(signal, Edge::Falling))
    }

    /// Waits for any change of any of `signals`.
    pub fn change(signals: impl IntoIterator<Item = SignalId>) -> Self {
        Suspend::Wait(WaitCondition::Change(signals.into_iter().collect()))
    }

    /// Waits for `process` to finish.
    pub fn join(process: ProcessId) -> Self {
        Suspend::Wait(WaitCondition::ProcessDone(process))
    }
}

/// The role a process plays in the design.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    /// A testbench-style process expected to run to completion.
    Initial,
    /// Re-evaluated on every change of its inputs.
    Combinational,
    /// Triggered by a clock edge.
    Sequential,
}

/// Lifecycle state of a spawned process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Queued to run in the current or next delta cycle.
    Ready,
    /// Parked on a wait condition.
    Waiting,
    /// Finished; never resumed again.
    Terminated,
}

/// A schedulable unit of cooperative execution.
pub trait Process {
    /// Runs until the next suspension point.
    fn resume(&mut self, cx: &mut ProcessContext<'_>) -> Result<Suspend, SimError>;
}

impl<F> Process for F
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<Suspend, SimError>,
{
    fn resume(&mut self, cx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        self(cx)
    }
}

/// What a running process may do to the simulation.
///
/// Reads see committed values only; writes become pending until the end of
/// the delta cycle.
pub struct ProcessContext<'a> {
    signals: &'a mut SignalTable,
    process: ProcessId,
    now: u64,
    display: &'a mut Vec<String>,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        signals: &'a mut SignalTable,
        process: ProcessId,
        now: u64,
        display: &'a mut Vec<String>,
    ) -> Self {
        Self {
            signals,
            process,
            now,
            display,
        }
    }

    /// The current simulated time in ticks.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// The ID of the running process.
    pub fn id(&self) -> ProcessId {
        self.process
    }

    /// Reads a signal or view.
    pub fn read(&self, source: &impl SignalSource) -> Result<Value, SimError> {
        source.read(self.signals)
    }

    /// Reads a signal or view as an integer.
    pub fn read_int(&self, source: &impl SignalSource) -> Result<i128, SimError> {
        let value = source.read(self.signals)?;
        value.to_int().ok_or_else(|| SimError::InvalidSignal {
            reason: format!("value {value} has no integer interpretation"),
        })
    }

    /// Reads a signal or view as a truth value.
    pub fn read_bool(&self, source: &impl SignalSource) -> Result<bool, SimError> {
        Ok(source.read(self.signals)?.is_truthy())
    }

    /// Writes a signal or view for the end of this delta cycle.
    pub fn write(&mut self, sink: &impl SignalSink, value: impl Into<Value>) -> Result<(), SimError> {
        sink.write(self.signals, value.into(), Some(self.process))
    }

    /// Stops a tristate driver from driving its bus.
    pub fn release(&mut self, driver: SignalId) -> Result<(), SimError> {
        let width = self.signals.get(driver)?.width().unwrap_or(0);
        self.signals
            .write(driver, Value::HighZ(width), Some(self.process))
    }

    /// Writes a signal's declared initial value back to it.
    pub fn reset(&mut self, signal: SignalId) -> Result<(), SimError> {
        let init = self.signals.get(signal)?.init.clone();
        self.signals.write(signal, init, Some(self.process))
    }

    /// The backing signals of a source, for building wait conditions.
    pub fn sensitivity(&self, source: &impl SignalSource) -> Vec<SignalId> {
        source.sensitivity(self.signals)
    }

    /// Emits one line of testbench output.
    pub fn display(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(time = self.now, process = %self.process, "{line}");
        self.display.push(line);
    }
}

/// A combinational block: runs once at start, then on every change of its sources.
pub struct AlwaysComb<F> {
    sources: Vec<SignalId>,
    body: F,
}

/// Builds a combinational process from its sensitivity list and body.
pub fn always_comb<F>(sources: impl IntoIterator<Item = SignalId>, body: F) -> AlwaysComb<F>
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<(), SimError>,
{
    AlwaysComb {
        sources: sources.into_iter().collect(),
        body,
    }
}

impl<F> Process for AlwaysComb<F>
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<(), SimError>,
{
    fn resume(&mut self, cx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        (self.body)(cx)?;
        Ok(Suspend::change(self.sources.iter().copied()))
    }
}

/// Reset behaviour of a sequential block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetSpec {
    /// The reset signal.
    pub signal: SignalId,
    /// The truth value at which reset is asserted.
    pub active: bool,
    /// Whether asserting reset takes effect without waiting for the clock.
    pub asynchronous: bool,
}

/// A clocked block with optional reset.
pub struct AlwaysSeq<F> {
    clock: SignalId,
    edge: Edge,
    reset: Option<ResetSpec>,
    registers: Vec<SignalId>,
    body: F,
    armed: bool,
}

/// Builds a sequential process.
///
/// While reset is asserted, every register is driven back to its declared
/// initial value instead of running `body`.
pub fn always_seq<F>(
    clock: SignalId,
    edge: Edge,
    reset: Option<ResetSpec>,
    registers: Vec<SignalId>,
    body: F,
) -> AlwaysSeq<F>
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<(), SimError>,
{
    AlwaysSeq {
        clock,
        edge,
        reset,
        registers,
        body,
        armed: false,
    }
}

impl<F> AlwaysSeq<F> {
    /// The registers this block drives.
    pub fn registers(&self) -> &[SignalId] {
        &self.registers
    }

    fn trigger(&self) -> WaitCondition {
        let clock = WaitCondition::Edge(self.clock, self.edge);
        match self.reset {
            Some(reset) if reset.asynchronous => {
                let assert = if reset.active {
                    Edge::Rising
                } else {
                    Edge::Falling
                };
                WaitCondition::AnyOf(vec![clock, WaitCondition::Edge(reset.signal, assert)])
            }
            _ => clock,
        }
    }
}

impl<F> Process for AlwaysSeq<F>
where
    F: FnMut(&mut ProcessContext<'_>) -> Result<(), SimError>,
{
    fn resume(&mut self, cx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        if !self.armed {
            self.armed = true;
            return Ok(Suspend::Wait(self.trigger()));
        }
        let in_reset = match self.reset {
            Some(reset) => cx.read_bool(&reset.signal)? == reset.active,
            None => false,
        };
        if in_reset {
            for reg in &self.registers {
                cx.reset(*reg)?;
            }
        } else {
            (self.body)(cx)?;
        }
        Ok(Suspend::Wait(self.trigger()))
    }
}

/// A continuous assignment of a source to a sink.
pub struct Assign<S, T> {
    source: S,
    target: T,
}

/// Builds a process that keeps `target` equal to `source`.
pub fn assign<S: SignalSource, T: SignalSink>(target: T, source: S) -> Assign<S, T> {
    Assign { source, target }
}

impl<S: SignalSource, T: SignalSink> Process for Assign<S, T> {
    fn resume(&mut self, cx: &mut ProcessContext<'_>) -> Result<Suspend, SimError> {
        let value = cx.read(&self.source)?;
        cx.write(&self.target, value)?;
        Ok(Suspend::change(cx.sensitivity(&self.source)))
    }
}
