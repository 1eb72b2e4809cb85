//! Shared value types used across the Strata simulation workspace.
//!
//! This crate provides the fixed-width [`BitVector`], the [`Value`] a signal
//! can hold, and the [`BitError`] raised by range- and bounds-checked value
//! operations.

#![warn(missing_docs)]

pub mod bitvec;
pub mod error;
pub mod value;

pub use bitvec::{BitVector, Bounds, Overflow};
pub use error::BitError;
pub use value::Value;
