//! Error handling logic.

use crate::core::dimensions::Dimensions;

/// Errors reported by the quantity arithmetic and the EPG models.
///
/// Every variant is a programmer error, not a data-dependent failure: the
/// core performs no retries and no logging, and the state of a model after
/// a failed call is unspecified (discard it).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Arithmetic, comparison or conversion on quantities whose dimension
    /// signatures differ.
    #[error("invalid dimensions: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The signature required by the operation.
        expected: Dimensions,
        /// The signature that was provided.
        actual: Dimensions,
    },

    /// A Regular-EPG gradient whose area is not an integer multiple of the
    /// model's unit gradient area.
    #[error("gradient area is not an integer multiple of the unit area (ratio {ratio})")]
    InvalidGradientArea {
        /// Ratio of the requested area to the unit area.
        ratio: f64,
    },

    /// Out-of-range argument: negative duration, negative relaxation rate,
    /// negative pulse saturation, and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A Regular-EPG state index beyond the populated orders.
    #[error("no state at index {0}")]
    OutOfRange(usize),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
