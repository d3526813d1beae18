//! Error type shared by the filter and biquad design APIs.

use thiserror::Error;

/// Errors from filter construction, design, and bank operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    /// A bank only accepts filters designed at its own sample rate.
    #[error("sample rates must agree ({bank} Hz vs {filter} Hz)")]
    SampleRateMismatch {
        /// Sample rate the bank was created with.
        bank: f64,
        /// Sample rate of the rejected filter.
        filter: f64,
    },

    /// The slot exists but its filter was removed.
    #[error("filter {0} has been removed")]
    FilterRemoved(usize),

    /// The id was never issued by this bank.
    #[error("filter id {id} out of bounds (>= {len})")]
    FilterIdOutOfBounds {
        /// Requested id.
        id: usize,
        /// Number of slots ever issued.
        len: usize,
    },

    /// Closed kernels carry no design parameters to update.
    #[error("cannot change the design of a closed kernel")]
    ClosedDesign,

    /// Equalizer designs need at least one analog section.
    #[error("order must be > 0")]
    ZeroOrder,

    /// Designs are only meaningful at a positive sample rate.
    #[error("sample rate must be > 0 (got {0})")]
    NonPositiveSampleRate(f64),

    /// A zero or negative bandwidth has no band edges.
    #[error("bandwidth must be > 0 (got {0})")]
    NonPositiveBandwidth(f64),
}
