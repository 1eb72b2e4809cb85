//! Shared identifiers and the elaborated-module description.
//!
//! This crate defines the arena and opaque IDs the simulator stores signals,
//! processes and tristate buses under, the [`SignalRef`] expressions that
//! describe signal views, and the [`ElaboratedModule`] handed to an external
//! HDL emitter.

#![warn(missing_docs)]

pub mod arena;
pub mod const_value;
pub mod ids;
pub mod module;
pub mod port;
pub mod signal;

pub use arena::{Arena, ArenaId};
pub use const_value::ConstValue;
pub use ids::{BusId, ProcessId, SignalId};
pub use module::{ConstDecl, ElaboratedModule, ViewBinding};
pub use port::{PortDecl, PortDirection};
pub use signal::{SignalDecl, SignalKind, SignalRef};
