//! Spatial-subsystem error types.

use thiserror::Error;

/// A route (or a geometry request) that cannot be turned into a corridor.
///
/// Always absorbed at the component boundary: the offending route is logged
/// and skipped, never failing a ping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("polyline has {points} point(s); at least 2 are required")]
    Degenerate { points: usize },

    #[error("coordinate #{index} ({lat}, {lon}) is out of range")]
    InvalidCoordinate { index: usize, lat: f64, lon: f64 },

    #[error("resampling step must be positive, got {0} m")]
    InvalidStep(f64),

    #[error("corridor produced no polygon")]
    EmptyCorridor,
}

/// The external "fetch raw route geometries" collaborator failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("route source {provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("route source parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by `tt-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("data source error: {0}")]
    DataSource(#[from] SourceError),

    #[error("route cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
