//! Simulation kernel: event queue, ready queue and the delta-cycle loop.
//!
//! [`Simulator`] is the explicit simulation context. Signals, views, buses
//! and processes are all created through it, and [`Simulator::run`] drives
//! the processes until the design is quiescent, a process requests
//! [`Suspend::Stop`], or the time limit is reached.
//!
//! Each delta cycle runs every ready process to its next suspension, then
//! commits all pending writes at once. Waiters released by the commit run
//! in the following delta cycle. When nothing is ready, time advances to the
//! earliest scheduled wake-up.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use strata_common::Value;
use strata_ir::{Arena, ProcessId, SignalId};

use crate::error::SimError;
use crate::process::{
    self, Process, ProcessContext, ProcessKind, ProcessState, ResetSpec, Suspend, WaitCondition,
};
use crate::signal::{Edge, SignalState, SignalTable, WaitKind, Waiter};
use crate::time::SimTime;
use crate::view::{ConcatPart, ConcatView, SignalSink, SignalSource, SliceView, TristateBus};
use crate::waveform::{WaveformRecorder, INT_DUMP_WIDTH};
use crate::SimConfig;

/// A process wake-up scheduled in the event queue.
///
/// Ordered by time, then by scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledWake {
    time: u64,
    seq: u64,
    process: ProcessId,
    epoch: u64,
}

/// A spawned process with its scheduling state.
struct ProcessEntry {
    name: String,
    kind: ProcessKind,
    state: ProcessState,
    /// Incremented on every suspension; stale wake-ups carry an older epoch.
    epoch: u64,
    routine: Option<Box<dyn Process>>,
    done_waiters: Vec<(ProcessId, u64)>,
}

/// The result of a completed simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimResult {
    /// The simulation time when the run ended.
    pub final_time: SimTime,
    /// Whether a process ended the run with [`Suspend::Stop`].
    pub stopped_by_user: bool,
    /// The total number of delta cycles executed so far.
    pub total_deltas: u64,
    /// Display output collected during this run.
    pub display_output: Vec<String>,
    /// Initial processes left waiting at quiescence, when stalls are not errors.
    pub stalled: Vec<String>,
}

/// The discrete-event simulation context.
pub struct Simulator {
    now: SimTime,
    signals: SignalTable,
    processes: Arena<ProcessId, ProcessEntry>,
    ready: VecDeque<ProcessId>,
    events: BinaryHeap<Reverse<ScheduledWake>>,
    seq: u64,
    config: SimConfig,
    recorder: Option<Box<dyn WaveformRecorder>>,
    /// Signals announced to the recorder; `None` until its header is written.
    traced: Option<usize>,
    stopped: bool,
    display_output: Vec<String>,
    total_deltas: u64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Creates a simulator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Creates a simulator with the given configuration.
    pub fn with_config(config: SimConfig) -> Self {
        Self {
            now: SimTime::zero(),
            signals: SignalTable::new(),
            processes: Arena::new(),
            ready: VecDeque::new(),
            events: BinaryHeap::new(),
            seq: 0,
            config,
            recorder: None,
            traced: None,
            stopped: false,
            display_output: Vec::new(),
            total_deltas: 0,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: SimConfig) {
        self.config = config;
    }

    /// Sets the time limit for subsequent runs.
    pub fn set_time_limit(&mut self, limit: u64) {
        self.config.time_limit = Some(limit);
    }

    /// Sets the maximum number of delta cycles per time step.
    pub fn set_max_deltas(&mut self, max: u32) {
        self.config.max_deltas = max;
    }

    /// Attaches a waveform recorder, replacing any previous one.
    ///
    /// Every signal is registered, with its current value, when the next run
    /// starts.
    pub fn set_recorder(&mut self, recorder: Box<dyn WaveformRecorder>) {
        self.recorder = Some(recorder);
        self.traced = None;
    }

    /// Returns the current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Read access to every signal and bus.
    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    // ---- construction ----

    /// Creates a signal holding `init`.
    ///
    /// The shape of `init` (boolean, bounded vector or unsized integer) is
    /// the shape every later write is coerced to.
    pub fn signal(&mut self, name: impl Into<String>, init: impl Into<Value>) -> Result<SignalId, SimError> {
        self.signals.add_signal(name, init.into())
    }

    /// Creates a view of bits `[lo, hi)` of a bit-vector signal.
    pub fn slice_view(&self, signal: SignalId, hi: u32, lo: u32) -> Result<SliceView, SimError> {
        SliceView::new(&self.signals, signal, hi, lo)
    }

    /// Creates a boolean view of one bit of a bit-vector signal.
    pub fn bit(&self, signal: SignalId, index: u32) -> Result<SliceView, SimError> {
        SliceView::bit(&self.signals, signal, index)
    }

    /// Creates a read-only concatenation, the first part most significant.
    pub fn concat_view(&self, parts: Vec<ConcatPart>) -> Result<ConcatView, SimError> {
        ConcatView::new(&self.signals, parts)
    }

    /// Creates a tristate bus shaped like `template`.
    pub fn tristate(&mut self, name: impl Into<String>, template: impl Into<Value>) -> Result<TristateBus, SimError> {
        let id = self.signals.add_bus(name, template.into())?;
        Ok(TristateBus::new(id))
    }

    /// Adds a driver to a tristate bus. The driver starts out not driving.
    pub fn driver(&mut self, bus: &TristateBus) -> Result<SignalId, SimError> {
        self.signals.add_driver(bus.id())
    }

    /// Spawns a process. It runs in the first delta cycle of the next run.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        kind: ProcessKind,
        routine: impl Process + 'static,
    ) -> ProcessId {
        let id = self.processes.alloc(ProcessEntry {
            name: name.into(),
            kind,
            state: ProcessState::Ready,
            epoch: 0,
            routine: Some(Box::new(routine)),
            done_waiters: Vec::new(),
        });
        self.ready.push_back(id);
        id
    }

    /// Spawns a combinational block sensitive to `sources`.
    pub fn always_comb<F>(
        &mut self,
        name: impl Into<String>,
        sources: impl IntoIterator<Item = SignalId>,
        body: F,
    ) -> ProcessId
    where
        F: FnMut(&mut ProcessContext<'_>) -> Result<(), SimError> + 'static,
    {
        self.spawn(
            name,
            ProcessKind::Combinational,
            process::always_comb(sources, body),
        )
    }

    /// Spawns a clocked block driving `registers`.
    pub fn always_seq<F>(
        &mut self,
        name: impl Into<String>,
        clock: SignalId,
        edge: Edge,
        reset: Option<ResetSpec>,
        registers: Vec<SignalId>,
        body: F,
    ) -> Result<ProcessId, SimError>
    where
        F: FnMut(&mut ProcessContext<'_>) -> Result<(), SimError> + 'static,
    {
        for reg in &registers {
            self.signals.mark_register(*reg)?;
        }
        Ok(self.spawn(
            name,
            ProcessKind::Sequential,
            process::always_seq(clock, edge, reset, registers, body),
        ))
    }

    /// Spawns a continuous assignment of `source` to `target`.
    pub fn assign<S, T>(&mut self, name: impl Into<String>, target: T, source: S) -> ProcessId
    where
        S: SignalSource + 'static,
        T: SignalSink + 'static,
    {
        self.spawn(
            name,
            ProcessKind::Combinational,
            process::assign(target, source),
        )
    }

    // ---- inspection ----

    /// Returns the state of a signal.
    pub fn signal_state(&self, id: SignalId) -> Result<&SignalState, SimError> {
        self.signals.get(id)
    }

    /// Returns the committed value of a signal.
    pub fn value(&self, id: SignalId) -> Result<&Value, SimError> {
        self.signals.value(id)
    }

    /// Reads a signal or view.
    pub fn read(&self, source: &impl SignalSource) -> Result<Value, SimError> {
        source.read(&self.signals)
    }

    /// Writes a signal or view from outside any process.
    ///
    /// The write is committed at the end of the next delta cycle.
    pub fn write(&mut self, sink: &impl SignalSink, value: impl Into<Value>) -> Result<(), SimError> {
        sink.write(&mut self.signals, value.into(), None)
    }

    /// The backing signals of a source.
    pub fn sensitivity(&self, source: &impl SignalSource) -> Vec<SignalId> {
        source.sensitivity(&self.signals)
    }

    /// Finds a signal by name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals.find(name)
    }

    /// Returns the number of signals, bus drivers included.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns the number of spawned processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Returns the lifecycle state of a process.
    pub fn process_state(&self, id: ProcessId) -> Result<ProcessState, SimError> {
        self.entry(id).map(|p| p.state)
    }

    /// Returns the name of a process.
    pub fn process_name(&self, id: ProcessId) -> Result<&str, SimError> {
        self.entry(id).map(|p| p.name.as_str())
    }

    fn entry(&self, id: ProcessId) -> Result<&ProcessEntry, SimError> {
        self.processes.try_get(id).ok_or(SimError::UnknownProcess(id))
    }

    // ---- running ----

    /// Runs until quiescence, a stop request, or the configured time limit.
    pub fn run(&mut self) -> Result<SimResult, SimError> {
        let limit = self.config.time_limit;
        self.run_loop(limit)
    }

    /// Runs without advancing past tick `limit`.
    ///
    /// Wake-ups scheduled after `limit` stay queued for a later run.
    pub fn run_until(&mut self, limit: u64) -> Result<SimResult, SimError> {
        self.run_loop(Some(limit))
    }

    fn run_loop(&mut self, limit: Option<u64>) -> Result<SimResult, SimError> {
        self.sync_waveform()?;

        let mut deltas_this_step = 0u32;
        let mut hit_limit = false;
        while !self.stopped {
            if !self.ready.is_empty() || self.signals.has_pending() {
                deltas_this_step += 1;
                if deltas_this_step > self.config.max_deltas {
                    return Err(SimError::DeltaCycleLimit {
                        time: self.now.ticks,
                        max_deltas: self.config.max_deltas,
                    });
                }
                self.run_delta()?;
                continue;
            }

            let Some(Reverse(next)) = self.events.peek().copied() else {
                break;
            };
            if limit.is_some_and(|l| next.time > l) {
                hit_limit = true;
                break;
            }
            self.now = self.now.advance_to(next.time);
            deltas_this_step = 0;
            tracing::debug!(time = next.time, "advancing time");
            while let Some(Reverse(wake)) = self.events.peek().copied() {
                if wake.time != next.time {
                    break;
                }
                self.events.pop();
                self.wake(wake.process, wake.epoch);
            }
        }

        if let Some(rec) = &mut self.recorder {
            rec.finalize()?;
        }

        let stalled = if self.stopped || hit_limit {
            Vec::new()
        } else {
            self.stalled_processes()
        };
        if !stalled.is_empty() {
            if self.config.stall_is_error {
                tracing::debug!(time = self.now.ticks, ?stalled, "simulation stalled");
                return Err(SimError::Stalled {
                    time: self.now.ticks,
                    processes: stalled,
                });
            }
            tracing::warn!(
                time = self.now.ticks,
                ?stalled,
                "simulation quiescent with waiting initial processes"
            );
        }

        Ok(SimResult {
            final_time: self.now,
            stopped_by_user: self.stopped,
            total_deltas: self.total_deltas,
            display_output: std::mem::take(&mut self.display_output),
            stalled,
        })
    }

    /// Runs every ready process once, then commits.
    fn run_delta(&mut self) -> Result<(), SimError> {
        let batch: Vec<ProcessId> = self.ready.drain(..).collect();
        for pid in batch {
            self.resume(pid)?;
            if self.stopped {
                tracing::debug!(time = self.now.ticks, process = %pid, "stop requested");
                self.events.clear();
                self.ready.clear();
                self.signals.discard_pending();
                return Ok(());
            }
        }

        let time = self.now.ticks;
        let outcome = self
            .signals
            .commit()
            .map_err(|source| SimError::CommitFailed {
                time,
                source: Box::new(source),
            })?;
        if let Some(rec) = &mut self.recorder {
            for id in &outcome.changed {
                rec.record_change(self.now.ticks, *id, &self.signals.get(*id)?.current)?;
            }
        }
        for (pid, epoch) in outcome.released {
            self.wake(pid, epoch);
        }
        self.total_deltas += 1;
        self.now = self.now.next_delta();
        Ok(())
    }

    fn resume(&mut self, pid: ProcessId) -> Result<(), SimError> {
        let entry = self.processes.get_mut(pid);
        if entry.state != ProcessState::Ready {
            return Ok(());
        }
        let Some(mut routine) = entry.routine.take() else {
            return Ok(());
        };

        let now = self.now.ticks;
        let outcome = {
            let mut cx = ProcessContext::new(&mut self.signals, pid, now, &mut self.display_output);
            routine.resume(&mut cx)
        };
        self.processes.get_mut(pid).routine = Some(routine);

        let result = outcome.and_then(|suspend| self.suspend(pid, suspend));
        result.map_err(|source| SimError::ProcessFailed {
            process: self.processes.get(pid).name.clone(),
            time: now,
            source: Box::new(source),
        })
    }

    fn suspend(&mut self, pid: ProcessId, suspend: Suspend) -> Result<(), SimError> {
        match suspend {
            Suspend::Wait(condition) => {
                let entry = self.processes.get_mut(pid);
                entry.state = ProcessState::Waiting;
                entry.epoch += 1;
                let epoch = entry.epoch;
                self.register_wait(pid, epoch, &condition)
            }
            Suspend::Done => {
                let entry = self.processes.get_mut(pid);
                entry.state = ProcessState::Terminated;
                entry.routine = None;
                let waiters = std::mem::take(&mut entry.done_waiters);
                for (waiter, epoch) in waiters {
                    self.wake(waiter, epoch);
                }
                Ok(())
            }
            Suspend::Stop => {
                self.processes.get_mut(pid).state = ProcessState::Terminated;
                self.stopped = true;
                Ok(())
            }
        }
    }

    fn register_wait(
        &mut self,
        pid: ProcessId,
        epoch: u64,
        condition: &WaitCondition,
    ) -> Result<(), SimError> {
        let waiter = |kind| Waiter {
            process: pid,
            epoch,
            kind,
        };
        match condition {
            WaitCondition::Delay(ticks) => {
                let time = self.now.ticks.saturating_add(*ticks);
                self.seq += 1;
                self.events.push(Reverse(ScheduledWake {
                    time,
                    seq: self.seq,
                    process: pid,
                    epoch,
                }));
            }
            WaitCondition::Edge(signal, edge) => {
                self.signals
                    .add_waiter(*signal, waiter(WaitKind::Edge(*edge)))?;
            }
            WaitCondition::Change(signals) => {
                for signal in signals {
                    self.signals.add_waiter(*signal, waiter(WaitKind::Change))?;
                }
            }
            WaitCondition::ProcessDone(target) => {
                let entry = self
                    .processes
                    .try_get_mut(*target)
                    .ok_or(SimError::UnknownProcess(*target))?;
                if entry.state == ProcessState::Terminated {
                    self.wake(pid, epoch);
                } else {
                    entry.done_waiters.push((pid, epoch));
                }
            }
            WaitCondition::AnyOf(conditions) => {
                for c in conditions {
                    self.register_wait(pid, epoch, c)?;
                }
            }
        }
        Ok(())
    }

    /// Moves a waiting process to the ready queue if `epoch` is its current wait.
    fn wake(&mut self, pid: ProcessId, epoch: u64) {
        let entry = self.processes.get_mut(pid);
        if entry.state == ProcessState::Waiting && entry.epoch == epoch {
            tracing::trace!(time = %self.now, process = %entry.name, "wake");
            entry.state = ProcessState::Ready;
            self.ready.push_back(pid);
        }
    }

    fn stalled_processes(&self) -> Vec<String> {
        self.processes
            .iter()
            .filter(|(_, p)| p.kind == ProcessKind::Initial && p.state == ProcessState::Waiting)
            .map(|(_, p)| p.name.clone())
            .collect()
    }

    /// Registers signals the recorder has not seen yet and dumps their
    /// current values.
    fn sync_waveform(&mut self) -> Result<(), SimError> {
        let Some(rec) = &mut self.recorder else {
            return Ok(());
        };
        let time = self.now.ticks;
        let seen = match self.traced {
            Some(seen) => seen,
            None => {
                rec.begin_scope(&self.config.waveform_scope)?;
                for (id, state) in self.signals.iter() {
                    rec.register_signal(id, &state.name, state.width().unwrap_or(INT_DUMP_WIDTH))?;
                }
                rec.end_scope()?;
                0
            }
        };
        for (id, state) in self.signals.iter().skip(seen) {
            if self.traced.is_some() {
                rec.register_signal(id, &state.name, state.width().unwrap_or(INT_DUMP_WIDTH))?;
            }
            rec.record_change(time, id, &state.current)?;
        }
        self.traced = Some(self.signals.len());
        Ok(())
    }
}
