//! Signal storage, pending writes, driver bookkeeping and tristate resolution.
//!
//! Every signal holds a `current` value that only the commit phase changes,
//! plus an optional pending write for the delta cycle in progress. Writers
//! claim the bits they touch. Overlapping slice writes in one delta are a
//! [`SimError::WriteConflict`], as are whole-signal writes from two
//! different writers. A tristate bus is
//! a set of driver signals whose committed values are combined by
//! [`resolve_tristate`].

use strata_common::{BitError, BitVector, Value};
use strata_ir::{Arena, BusId, ProcessId, SignalId};

use crate::error::SimError;

/// Who wrote a pending value: a process, or code outside the run loop (`None`).
pub type Writer = Option<ProcessId>;

/// Which transition of a signal's truthiness wakes an edge waiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Zero to non-zero.
    Rising,
    /// Non-zero to zero.
    Falling,
    /// Either transition.
    Both,
}

impl Edge {
    /// Returns true if the transition `before -> after` is this edge.
    pub fn matches(self, before: bool, after: bool) -> bool {
        match self {
            Edge::Rising => !before && after,
            Edge::Falling => before && !after,
            Edge::Both => before != after,
        }
    }
}

/// What a registered waiter is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WaitKind {
    Change,
    Edge(Edge),
}

/// A process parked on a signal. `epoch` identifies the wait it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Waiter {
    pub process: ProcessId,
    pub epoch: u64,
    pub kind: WaitKind,
}

/// The bits one writer touched in the current delta. `None` means all of them.
#[derive(Clone, Debug)]
struct Claim {
    writer: Writer,
    mask: Option<BitVector>,
}

#[derive(Clone, Debug)]
struct PendingWrite {
    value: Value,
    claims: Vec<Claim>,
}

/// The full runtime state of one signal.
#[derive(Clone, Debug)]
pub struct SignalState {
    /// Name for display and waveform output.
    pub name: String,
    /// The declared initial value.
    pub init: Value,
    /// The committed value.
    pub current: Value,
    /// The value before the most recent change.
    pub previous: Value,
    /// The tristate bus this signal drives, if any.
    pub bus: Option<BusId>,
    template: Value,
    pending: Option<PendingWrite>,
    drivers: Vec<Writer>,
    waiters: Vec<Waiter>,
    register: bool,
}

impl SignalState {
    fn new(name: String, template: Value, init: Value, bus: Option<BusId>) -> Self {
        Self {
            name,
            previous: init.clone(),
            current: init.clone(),
            init,
            bus,
            template,
            pending: None,
            drivers: Vec::new(),
            waiters: Vec::new(),
            register: false,
        }
    }

    /// Bit width, or `None` for an unsized integer signal.
    pub fn width(&self) -> Option<u32> {
        self.template.width()
    }

    /// Returns true for two's-complement vectors and unsized integers.
    pub fn is_signed(&self) -> bool {
        match &self.template {
            Value::Bits(bv) => bv.is_signed(),
            Value::Int(_) => true,
            _ => false,
        }
    }

    /// Returns the value written this delta, if any.
    pub fn pending(&self) -> Option<&Value> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// Number of distinct writers seen over the whole run.
    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// Returns true if a clocked process drives this signal.
    pub fn is_register(&self) -> bool {
        self.register
    }

    fn coerce(&self, value: Value) -> Result<Value, SimError> {
        if value.is_high_z() {
            if self.bus.is_none() {
                return Err(SimError::InvalidSignal {
                    reason: format!(
                        "'{}' is not a tristate driver and cannot hold high impedance",
                        self.name
                    ),
                });
            }
            return Ok(Value::HighZ(self.width().unwrap_or(0)));
        }
        Ok(value.coerce_to(&self.template)?)
    }

    fn note_driver(&mut self, writer: Writer) {
        if !self.drivers.contains(&writer) {
            self.drivers.push(writer);
        }
    }

    fn conflict(&self, writer: Writer, mask: Option<&BitVector>) -> Option<SimError> {
        let pending = self.pending.as_ref()?;
        // Overlapping slices collide even from one writer; whole-signal
        // writes only collide across writers.
        let other = pending.claims.iter().find(|c| match (&c.mask, mask) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => c.writer != writer,
        })?;
        let detail = if other.writer == writer {
            format!(
                "{} wrote overlapping slices in the same delta cycle",
                describe(writer)
            )
        } else {
            format!(
                "{} and {} wrote overlapping bits in the same delta cycle",
                describe(other.writer),
                describe(writer)
            )
        };
        Some(SimError::WriteConflict {
            signal: self.name.clone(),
            detail,
        })
    }
}

fn describe(writer: Writer) -> String {
    match writer {
        Some(p) => p.to_string(),
        None => "an external writer".into(),
    }
}

/// The runtime state of one tristate bus.
#[derive(Clone, Debug)]
pub struct BusState {
    /// Name for diagnostics.
    pub name: String,
    /// Shape every driver value is coerced to.
    pub template: Value,
    /// Driver signals in creation order.
    pub drivers: Vec<SignalId>,
}

impl BusState {
    /// Bit width of the bus.
    pub fn width(&self) -> u32 {
        self.template.width().unwrap_or(0)
    }
}

/// Signals and buses changed or released by one commit.
#[derive(Debug, Default)]
pub(crate) struct CommitOutcome {
    pub changed: Vec<SignalId>,
    pub released: Vec<(ProcessId, u64)>,
}

/// All signals and tristate buses owned by a simulator.
#[derive(Debug, Default)]
pub struct SignalTable {
    signals: Arena<SignalId, SignalState>,
    buses: Arena<BusId, BusState>,
    dirty: Vec<SignalId>,
}

impl SignalTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a signal holding `init`.
    pub fn add_signal(&mut self, name: impl Into<String>, init: Value) -> Result<SignalId, SimError> {
        let name = name.into();
        if init.is_high_z() {
            return Err(SimError::InvalidSignal {
                reason: format!("signal '{name}' cannot start in high impedance"),
            });
        }
        Ok(self
            .signals
            .alloc(SignalState::new(name, init.clone(), init, None)))
    }

    /// Allocates a tristate bus whose drivers take the shape of `template`.
    pub fn add_bus(&mut self, name: impl Into<String>, template: Value) -> Result<BusId, SimError> {
        let name = name.into();
        if !matches!(template, Value::Bool(_) | Value::Bits(_)) {
            return Err(BitError::Unsized(format!("tristate bus '{name}'")).into());
        }
        Ok(self.buses.alloc(BusState {
            name,
            template,
            drivers: Vec::new(),
        }))
    }

    /// Allocates a new driver signal on `bus`, initially not driving.
    pub fn add_driver(&mut self, bus: BusId) -> Result<SignalId, SimError> {
        let state = self.bus(bus)?;
        let name = format!("{}_driver{}", state.name, state.drivers.len());
        let template = state.template.clone();
        let idle = Value::HighZ(state.width());
        let id = self
            .signals
            .alloc(SignalState::new(name, template, idle, Some(bus)));
        self.buses.get_mut(bus).drivers.push(id);
        Ok(id)
    }

    /// Returns the state of a signal.
    pub fn get(&self, id: SignalId) -> Result<&SignalState, SimError> {
        self.signals.try_get(id).ok_or(SimError::UnknownSignal(id))
    }

    /// Returns the committed value of a signal.
    pub fn value(&self, id: SignalId) -> Result<&Value, SimError> {
        Ok(&self.get(id)?.current)
    }

    /// Returns the state of a bus.
    pub fn bus(&self, id: BusId) -> Result<&BusState, SimError> {
        self.buses.try_get(id).ok_or(SimError::UnknownBus(id))
    }

    /// Finds a signal by name.
    pub fn find(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    /// Number of signals, bus drivers included.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if no signal has been allocated.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterates over all signals in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &SignalState)> {
        self.signals.iter()
    }

    /// Iterates over all buses in allocation order.
    pub fn buses(&self) -> impl Iterator<Item = (BusId, &BusState)> {
        self.buses.iter()
    }

    /// Returns true if any signal has a pending write.
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Stores a whole-signal write for the current delta.
    ///
    /// The value is coerced to the signal's shape. A second write by the same
    /// writer replaces the first.
    pub fn write(&mut self, id: SignalId, value: Value, writer: Writer) -> Result<(), SimError> {
        let sig = self
            .signals
            .try_get_mut(id)
            .ok_or(SimError::UnknownSignal(id))?;
        let value = sig.coerce(value)?;
        if let Some(err) = sig.conflict(writer, None) {
            return Err(err);
        }
        sig.note_driver(writer);
        let first = sig.pending.is_none();
        sig.pending = Some(PendingWrite {
            value,
            claims: vec![Claim { writer, mask: None }],
        });
        if first {
            self.dirty.push(id);
        }
        Ok(())
    }

    /// Replaces bits `[lo, lo + src.width())` of the pending (or current) value.
    ///
    /// Writes from different writers to disjoint bits compose. The composed
    /// value is checked against the signal's bounds.
    pub fn write_slice(
        &mut self,
        id: SignalId,
        lo: u32,
        src: &BitVector,
        writer: Writer,
    ) -> Result<(), SimError> {
        let sig = self
            .signals
            .try_get_mut(id)
            .ok_or(SimError::UnknownSignal(id))?;
        let base = match &sig.pending {
            Some(p) => &p.value,
            None => &sig.current,
        };
        let Value::Bits(base) = base else {
            return Err(SimError::InvalidSignal {
                reason: format!("'{}' is not a bit vector and cannot be sliced", sig.name),
            });
        };
        let updated = base.splice(lo, src)?;
        let mut mask = BitVector::new(base.width());
        mask.set_range(lo, lo + src.width(), true);
        if let Some(err) = sig.conflict(writer, Some(&mask)) {
            return Err(err);
        }
        sig.note_driver(writer);
        match &mut sig.pending {
            Some(pending) => {
                pending.value = Value::Bits(updated);
                match pending.claims.iter_mut().find(|c| c.writer == writer) {
                    Some(claim) => {
                        if let Some(existing) = &claim.mask {
                            claim.mask = Some(existing | &mask);
                        }
                    }
                    None => pending.claims.push(Claim {
                        writer,
                        mask: Some(mask),
                    }),
                }
            }
            None => {
                sig.pending = Some(PendingWrite {
                    value: Value::Bits(updated),
                    claims: vec![Claim {
                        writer,
                        mask: Some(mask),
                    }],
                });
                self.dirty.push(id);
            }
        }
        Ok(())
    }

    /// Resolves a tristate bus from its drivers' committed values.
    pub fn resolve_bus(&self, id: BusId) -> Result<Value, SimError> {
        let bus = self.bus(id)?;
        let values = bus
            .drivers
            .iter()
            .map(|d| self.value(*d))
            .collect::<Result<Vec<_>, _>>()?;
        resolve_tristate(&bus.name, bus.width(), &values)
    }

    /// Parks a process on a signal. Re-registering the same process and kind
    /// only refreshes the epoch.
    pub(crate) fn add_waiter(&mut self, id: SignalId, waiter: Waiter) -> Result<(), SimError> {
        let sig = self
            .signals
            .try_get_mut(id)
            .ok_or(SimError::UnknownSignal(id))?;
        match sig
            .waiters
            .iter_mut()
            .find(|w| w.process == waiter.process && w.kind == waiter.kind)
        {
            Some(existing) => existing.epoch = waiter.epoch,
            None => sig.waiters.push(waiter),
        }
        Ok(())
    }

    pub(crate) fn mark_register(&mut self, id: SignalId) -> Result<(), SimError> {
        self.signals
            .try_get_mut(id)
            .ok_or(SimError::UnknownSignal(id))?
            .register = true;
        Ok(())
    }

    /// Merges every pending write into `current`.
    ///
    /// Returns the signals whose value changed and the waiters released by
    /// those changes, in commit order. Buses whose drivers changed are
    /// re-resolved so that conflicting drivers surface here.
    pub(crate) fn commit(&mut self) -> Result<CommitOutcome, SimError> {
        let mut outcome = CommitOutcome::default();
        let mut buses = Vec::new();
        for id in std::mem::take(&mut self.dirty) {
            let sig = self.signals.get_mut(id);
            let Some(pending) = sig.pending.take() else {
                continue;
            };
            if pending.value == sig.current {
                continue;
            }
            let before = sig.current.is_truthy();
            sig.previous = std::mem::replace(&mut sig.current, pending.value);
            let after = sig.current.is_truthy();
            tracing::trace!(signal = %sig.name, value = %sig.current, "commit");
            outcome.changed.push(id);
            sig.waiters.retain(|w| {
                let fire = match w.kind {
                    WaitKind::Change => true,
                    WaitKind::Edge(edge) => edge.matches(before, after),
                };
                if fire {
                    outcome.released.push((w.process, w.epoch));
                }
                !fire
            });
            if let Some(bus) = sig.bus {
                if !buses.contains(&bus) {
                    buses.push(bus);
                }
            }
        }
        for bus in buses {
            self.resolve_bus(bus)?;
        }
        Ok(outcome)
    }

    /// Drops every pending write without committing it.
    pub(crate) fn discard_pending(&mut self) {
        for id in std::mem::take(&mut self.dirty) {
            self.signals.get_mut(id).pending = None;
        }
    }
}

/// Resolves tristate driver values to the value seen on the bus.
///
/// Resolution rules:
/// 1. No driver asserts a value: the bus is high impedance.
/// 2. Every asserting driver agrees: the bus carries that value.
/// 3. Two asserting drivers disagree: [`SimError::WriteConflict`].
pub fn resolve_tristate(name: &str, width: u32, drivers: &[&Value]) -> Result<Value, SimError> {
    let mut resolved: Option<&Value> = None;
    for value in drivers.iter().copied().filter(|v| !v.is_high_z()) {
        match resolved {
            None => resolved = Some(value),
            Some(r) if r == value => {}
            Some(r) => {
                return Err(SimError::WriteConflict {
                    signal: name.to_string(),
                    detail: format!("tristate drivers assert {r} and {value}"),
                })
            }
        }
    }
    Ok(resolved.cloned().unwrap_or(Value::HighZ(width)))
}
