use thiserror::Error;

use tt_core::{RiderId, ValidationError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no travel history for rider {0}")]
    RiderNotFound(RiderId),
}

pub type SessionResult<T> = Result<T, SessionError>;
