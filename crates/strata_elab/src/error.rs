//! Elaboration error types.

use strata_ir::SignalId;
use strata_sim::SimError;

/// Errors that can occur while resolving interfaces, folding constants or
/// building an elaborated module.
#[derive(Debug, thiserror::Error)]
pub enum ElabError {
    /// A simulator lookup failed.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// Two members of one interface share a field name.
    #[error("duplicate member '{member}' in interface '{interface}'")]
    DuplicateMember {
        /// The interface name.
        interface: String,
        /// The repeated field name.
        member: String,
    },

    /// A path did not lead to any interface member.
    #[error("interface '{interface}' has no member '{path}'")]
    UnresolvedPath {
        /// The interface the lookup started from.
        interface: String,
        /// The dotted path that failed.
        path: String,
    },

    /// A path resolved to a member of the wrong kind.
    #[error("'{path}' is not a {expected}")]
    WrongMemberKind {
        /// The dotted path.
        path: String,
        /// What the caller needed.
        expected: &'static str,
    },

    /// Two declarations in one module share a hardware name.
    #[error("duplicate name '{0}' in elaborated module")]
    DuplicateName(String),

    /// The same simulator signal was declared twice.
    #[error("signal {signal} already declared as '{name}'")]
    DuplicateSignal {
        /// The signal.
        signal: SignalId,
        /// The name of the earlier declaration.
        name: String,
    },

    /// A view refers to a signal that was never declared in the module.
    #[error("view '{view}' refers to undeclared signal {signal}")]
    UndeclaredSignal {
        /// The view name.
        view: String,
        /// The missing backing signal.
        signal: SignalId,
    },

    /// A view has no fixed bit width.
    #[error("view '{0}' has no fixed width")]
    UnsizedView(String),

    /// A constant expression could not be evaluated.
    #[error("constant expression error: {0}")]
    ConstEval(String),

    /// Integer overflow while folding a constant expression.
    #[error("arithmetic overflow in constant expression")]
    Overflow,
}
