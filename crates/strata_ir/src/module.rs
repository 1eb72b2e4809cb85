//! The elaborated-module description consumed by an HDL emitter.
//!
//! An [`ElaboratedModule`] is fully flat: interface nesting has been resolved
//! to hardware names, interface constants are literal values, and every
//! signal view is an expression over declared backing signals.

use crate::const_value::ConstValue;
use crate::ids::SignalId;
use crate::port::PortDecl;
use crate::signal::{SignalDecl, SignalRef};
use serde::{Deserialize, Serialize};

/// A named signal view bound to an expression over backing signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewBinding {
    /// The hardware name of the view.
    pub name: String,
    /// Width of the view in bits.
    pub width: u32,
    /// The expression the view aliases.
    pub expr: SignalRef,
}

/// An interface constant inlined as a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstDecl {
    /// The hardware name, nesting joined by `_`.
    pub name: String,
    /// The dotted path the constant was reached through.
    pub path: String,
    /// The literal value.
    pub value: ConstValue,
}

/// A flattened module ready for HDL emission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElaboratedModule {
    /// The module name.
    pub name: String,
    /// Ports in declaration order.
    pub ports: Vec<PortDecl>,
    /// Internal signals in declaration order.
    pub signals: Vec<SignalDecl>,
    /// Signal views in declaration order.
    pub views: Vec<ViewBinding>,
    /// Inlined constants in declaration order.
    pub constants: Vec<ConstDecl>,
}

impl ElaboratedModule {
    /// Returns the declaration (port or internal) for a simulator signal.
    pub fn decl_for(&self, signal: SignalId) -> Option<&SignalDecl> {
        self.ports
            .iter()
            .map(|p| &p.decl)
            .chain(self.signals.iter())
            .find(|d| d.signal == signal)
    }

    /// Finds a port or internal signal by hardware name.
    pub fn find(&self, name: &str) -> Option<&SignalDecl> {
        self.ports
            .iter()
            .map(|p| &p.decl)
            .chain(self.signals.iter())
            .find(|d| d.name == name)
    }

    /// Finds an inlined constant by dotted path.
    pub fn constant(&self, path: &str) -> Option<&ConstValue> {
        self.constants
            .iter()
            .find(|c| c.path == path)
            .map(|c| &c.value)
    }

    /// Total number of flattened storage signals (ports and internals).
    pub fn signal_count(&self) -> usize {
        self.ports.len() + self.signals.len()
    }
}
