//! Analytics error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics snapshot schema {found} is not supported (this build reads up to {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
