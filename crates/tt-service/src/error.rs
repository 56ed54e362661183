use thiserror::Error;

use tt_analytics::AnalyticsError;
use tt_core::{RiderId, TtError, ValidationError};
use tt_session::SessionError;
use tt_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("rider {0} not found")]
    NotFound(RiderId),

    #[error(transparent)]
    Core(#[from] TtError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// A lock was poisoned by a panicking holder.
    #[error("{0} lock poisoned")]
    Concurrency(&'static str),
}

impl From<SessionError> for ServiceError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(v)        => ServiceError::Validation(v),
            SessionError::RiderNotFound(rider) => ServiceError::NotFound(rider),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
