//! Errors raised by range- and bounds-checked value operations.

/// Errors produced by [`BitVector`](crate::BitVector) and [`Value`](crate::Value)
/// operations.
///
/// `Range` and `Index` correspond to slicing out of bounds; `OutOfBounds`,
/// `EmptyConcat` and `Unsized` are value errors raised at assignment or
/// construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitError {
    /// A slice `[hi:lo]` does not fit the vector, or is empty.
    #[error("slice [{hi}:{lo}] out of range for width {width}")]
    Range {
        /// Exclusive upper bit index.
        hi: u32,
        /// Inclusive lower bit index.
        lo: u32,
        /// Width of the sliced vector.
        width: u32,
    },

    /// A single-bit index does not fit the vector.
    #[error("bit index {index} out of range for width {width}")]
    Index {
        /// The requested bit.
        index: u32,
        /// Width of the indexed vector.
        width: u32,
    },

    /// An assigned value lies outside the declared `[min, max)` range.
    #[error("value {value} out of bounds [{min}, {max})")]
    OutOfBounds {
        /// The rejected value.
        value: i128,
        /// Inclusive lower bound.
        min: i128,
        /// Exclusive upper bound.
        max: i128,
    },

    /// Declared bounds are empty.
    #[error("invalid bounds: min {min} is not less than max {max}")]
    InvalidBounds {
        /// Requested lower bound.
        min: i128,
        /// Requested upper bound.
        max: i128,
    },

    /// A vector is too wide to be represented as a 128-bit integer.
    #[error("{width}-bit value does not fit in a 128-bit integer")]
    Unrepresentable {
        /// Width of the offending vector.
        width: u32,
    },

    /// Concatenation of zero parts.
    #[error("cannot concatenate an empty sequence")]
    EmptyConcat,

    /// A value without a fixed bit width was used where one is required.
    #[error("{0} has no fixed bit width")]
    Unsized(String),

    /// A value of one kind cannot be stored into a slot of another kind.
    #[error("cannot convert {from} into {to}")]
    Incompatible {
        /// Description of the source value.
        from: String,
        /// Description of the destination slot.
        to: String,
    },
}
