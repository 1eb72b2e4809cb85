//! Port declarations on an elaborated module boundary.

use crate::signal::SignalDecl;
use serde::{Deserialize, Serialize};

/// The direction of a port on a module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// An input port (data flows into the module).
    Input,
    /// An output port (data flows out of the module).
    Output,
    /// A bidirectional port, used for tristate buses.
    InOut,
}

/// A flattened port: a signal declaration plus its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDecl {
    /// The backing signal declaration.
    pub decl: SignalDecl,
    /// The direction of data flow.
    pub direction: PortDirection,
}
