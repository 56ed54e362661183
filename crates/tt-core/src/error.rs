//! Shared error types.
//!
//! [`ValidationError`] covers every input a caller can get wrong; it is the
//! only failure the ping path surfaces synchronously.  Sub-crates wrap it (or
//! [`TtError`]) as one variant of their own error enums.

use thiserror::Error;

use crate::{RiderId, Timestamp};

/// Rejected input.  Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid rider id {0:?}: expected an unsigned integer")]
    InvalidRiderId(String),

    #[error("rider {0} is not registered")]
    UnknownRider(RiderId),

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("ping for {rider} at {at} precedes its last accepted ping at {last}")]
    OutOfOrder {
        rider: RiderId,
        at:    Timestamp,
        last:  Timestamp,
    },
}

/// The top-level error type for `tt-core`.
#[derive(Debug, Error)]
pub enum TtError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tt-core`.
pub type TtResult<T> = Result<T, TtError>;
