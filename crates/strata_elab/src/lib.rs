//! Elaboration of simulator designs into flat module descriptions.
//!
//! This crate turns the structural side of a design into an
//! [`ElaboratedModule`](strata_ir::ElaboratedModule) that an HDL emitter can
//! consume without touching the simulator:
//!
//! - [`Interface`] trees of signals, constants and nested interfaces are
//!   resolved by dotted path and flattened to `_`-joined hardware names.
//! - [`ConstExpr`] folds arithmetic over interface constants to literals.
//! - [`ModuleBuilder`] collects ports, signals, views and constants and
//!   checks that every view refers to declared storage.

#![warn(missing_docs)]

pub mod const_eval;
pub mod error;
pub mod interface;
pub mod module;

pub use const_eval::{const_to_i128, eval_const_expr, BinaryOp, ConstEnv, ConstExpr};
pub use error::ElabError;
pub use interface::{FlatConst, FlatSignal, Interface, InterfaceBuilder, Member};
pub use module::ModuleBuilder;
