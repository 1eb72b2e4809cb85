//! Signal declarations and view expressions in the elaborated description.
//!
//! A [`SignalDecl`] names one flattened storage signal. A [`SignalRef`]
//! expresses a signal view (slice, concatenation, tristate bus) as an
//! expression over backing signals, which is how an emitter renders it.

use crate::const_value::ConstValue;
use crate::ids::{BusId, SignalId};
use serde::{Deserialize, Serialize};
use strata_common::BitVector;

/// How a declared signal is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// A combinationally driven net.
    Wire,
    /// A signal driven from a clocked process.
    Reg,
    /// One driver of a tristate bus.
    TristateDriver,
}

/// A flattened signal in an elaborated module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDecl {
    /// The hardware name, with interface nesting joined by `_`.
    pub name: String,
    /// The dotted path the signal was reached through (e.g. `intf.b.c`).
    pub path: String,
    /// The simulator signal this declaration stands for.
    pub signal: SignalId,
    /// Bit width, or `None` for an unsized integer signal.
    pub width: Option<u32>,
    /// Whether the value is two's-complement signed.
    pub signed: bool,
    /// How the signal is driven.
    pub kind: SignalKind,
    /// The declared initial value.
    pub init: ConstValue,
}

/// An expression over backing signals describing a signal view.
///
/// Slice bounds are inclusive, matching HDL part-select notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalRef {
    /// A whole signal.
    Signal(SignalId),
    /// A contiguous bit range `[high:low]` of a signal.
    Slice {
        /// The backing signal.
        signal: SignalId,
        /// The high bit index (inclusive).
        high: u32,
        /// The low bit index (inclusive).
        low: u32,
    },
    /// A concatenation, first element most significant.
    Concat(Vec<SignalRef>),
    /// A literal bit pattern.
    Const(BitVector),
    /// A tristate bus resolved from independent drivers.
    Tristate {
        /// The bus.
        bus: BusId,
        /// Driver signals in creation order.
        drivers: Vec<SignalId>,
    },
}

impl SignalRef {
    /// Returns every backing signal referenced, in order of appearance.
    pub fn signals(&self) -> Vec<SignalId> {
        let mut out = Vec::new();
        self.collect_signals(&mut out);
        out
    }

    fn collect_signals(&self, out: &mut Vec<SignalId>) {
        match self {
            SignalRef::Signal(id) | SignalRef::Slice { signal: id, .. } => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            SignalRef::Concat(parts) => {
                for p in parts {
                    p.collect_signals(out);
                }
            }
            SignalRef::Const(_) => {}
            SignalRef::Tristate { drivers, .. } => {
                for d in drivers {
                    if !out.contains(d) {
                        out.push(*d);
                    }
                }
            }
        }
    }

    /// Computes the width of the expression given the widths of whole signals.
    pub fn width(&self, signal_width: &impl Fn(SignalId) -> Option<u32>) -> Option<u32> {
        match self {
            SignalRef::Signal(id) => signal_width(*id),
            SignalRef::Slice { high, low, .. } => Some(high - low + 1),
            SignalRef::Concat(parts) => parts.iter().map(|p| p.width(signal_width)).sum(),
            SignalRef::Const(bv) => Some(bv.width()),
            SignalRef::Tristate { drivers, .. } => {
                drivers.first().and_then(|d| signal_width(*d))
            }
        }
    }
}
