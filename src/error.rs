//! General error types
//!
//! This module contains the error types produced by the cell layer, which
//! sits underneath both the address codec and the ABI-driven codecs in
//! [`conv`](crate::conv). Failures of the underlying cell library are
//! folded into [`CellError`].
//!
//! Errors raised at the level of a schema-directed encode or decode are
//! defined separately in [`conv::error`](crate::conv::error), and carry
//! these lower-level errors as their source where relevant.

use num_bigint::BigInt;
use thiserror::Error;

/// Enumerated error type for values that cannot be represented within
/// the bit-width that a store operation was asked to use.
///
/// Structurally similar to [`CellError`], which relates to the capacity of
/// the cell being written, rather than the representability of an individual
/// value.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[non_exhaustive]
pub enum BoundsError {
    /// Negative value supplied where only unsigned values are legal
    #[error("negative value {val} cannot be stored as an unsigned integer")]
    IllegalNegative { val: BigInt },
    /// Value does not fit into the requested number of bits
    #[error("value {val} does not fit in {width} bits")]
    Overflow { val: BigInt, width: usize },
    /// Variable-length integer whose byte-count exceeds what its length
    /// prefix can express
    #[error("value {val} needs {needed} bytes, but a {len_bits}-bit length prefix allows at most {max}")]
    LengthPrefix {
        val: BigInt,
        needed: usize,
        len_bits: usize,
        max: usize,
    },
    /// Requested width exceeds what a fixed-size machine integer can hold
    #[error("bit-width {width} exceeds the maximum of {max} for this operation")]
    WidthTooLarge { width: usize, max: usize },
}

/// Enumerated error type for failures when writing to or reading from a cell.
///
/// Overflow cases arise while building a cell, and underflow cases
/// arise while reading from a cursor over a finished one.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[non_exhaustive]
pub enum CellError {
    /// Builder has no room left for the requested bits or references
    #[error("cell capacity exceeded")]
    Overflow,
    /// Slice holds fewer bits or references than were requested
    #[error("cell underflow")]
    Underflow,
    /// Value could not be represented in the requested encoding
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    /// Exotic (special) cells carry no readable data
    #[error("exotic cells are not supported")]
    Exotic,
    /// Any other failure reported by the cell library
    #[error("cell error: {0}")]
    Other(String),
}

impl CellError {
    /// Returns `true` for the errors caused by a full builder
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow)
    }

    /// Returns `true` for the errors caused by an exhausted slice
    #[must_use]
    pub const fn is_underflow(&self) -> bool {
        matches!(self, Self::Underflow)
    }
}

impl From<everscale_types::error::Error> for CellError {
    fn from(err: everscale_types::error::Error) -> Self {
        use everscale_types::error::Error;
        match err {
            Error::CellOverflow => Self::Overflow,
            Error::CellUnderflow => Self::Underflow,
            Error::PrunedBranchAccess => Self::Exotic,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Type alias for Result with an error type of [`CellError`]
pub type CellResult<T> = std::result::Result<T, CellError>;

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn cell_error_threadsafe() {
        dummy::<CellError>();
        dummy::<BoundsError>();
    }

    #[test]
    fn classification() {
        assert!(CellError::Overflow.is_overflow());
        assert!(CellError::Underflow.is_underflow());
        assert_eq!(
            CellError::from(everscale_types::error::Error::CellUnderflow),
            CellError::Underflow
        );
        let bounds = CellError::from(BoundsError::WidthTooLarge { width: 65, max: 64 });
        assert!(!bounds.is_overflow() && !bounds.is_underflow());
    }

    #[test]
    fn messages() {
        let err = BoundsError::Overflow {
            val: BigInt::from(256),
            width: 8,
        };
        assert_eq!(err.to_string(), "value 256 does not fit in 8 bits");
    }
}
