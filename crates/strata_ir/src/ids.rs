//! Opaque ID newtypes for simulation entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and `Serialize`/`Deserialize`.
//! IDs are created by [`Arena::alloc`](crate::arena::Arena::alloc) and are only
//! meaningful for the simulator that allocated them.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a signal owned by a simulator.
    SignalId,
    "sig"
);

define_id!(
    /// Opaque, copyable ID for a process spawned on a simulator.
    ProcessId,
    "proc"
);

define_id!(
    /// Opaque, copyable ID for a tristate bus.
    BusId,
    "bus"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = SignalId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(ProcessId::from_raw(1));
        set.insert(ProcessId::from_raw(2));
        set.insert(ProcessId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display() {
        assert_eq!(SignalId::from_raw(3).to_string(), "sig3");
        assert_eq!(ProcessId::from_raw(0).to_string(), "proc0");
        assert_eq!(BusId::from_raw(9).to_string(), "bus9");
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = BusId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: BusId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
