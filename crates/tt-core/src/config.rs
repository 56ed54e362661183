//! Tracker configuration.
//!
//! Typically loaded from a JSON file by the application crate and handed to
//! the service builder.  Every field has a default, so a partial file (or
//! none at all) is valid.

use std::path::PathBuf;

use crate::{TtError, TtResult};

/// Every tunable distance, window and limit of the ride detector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    // ── Geometry ──────────────────────────────────────────────────────────
    /// Buffer distance on each side of a route polyline, metres.
    pub corridor_width_m: f64,

    /// Resampling step applied before buffering, metres.
    pub resample_step_m: f64,

    /// Radius used to collect candidate routes before the corridor test.
    pub match_radius_m: f64,

    /// A classification is only attempted when a route lies this close.
    pub classify_radius_m: f64,

    /// Edge length of one spatial-index grid cell, degrees (0.01 ≈ 1 km).
    pub grid_cell_deg: f64,

    // ── Session windows ───────────────────────────────────────────────────
    /// An on-route ping within this many seconds of the session's last
    /// update continues it.
    pub continuation_window_secs: i64,

    /// An off-route ping within this many seconds of the session's last
    /// update ends it.
    pub end_grace_secs: i64,

    /// Sessions must last strictly longer than this to count as a trip.
    pub min_trip_secs: i64,

    // ── Route corpus ──────────────────────────────────────────────────────
    /// Durable route cache.  `None` keeps the corpus in memory only.
    pub route_cache_path: Option<PathBuf>,

    /// A cache older than this is refetched on `load()`.
    pub route_cache_max_age_secs: i64,

    /// Upper bound on the number of routes kept after deduplication.
    pub max_routes: usize,

    /// Number of leading coordinates hashed into a geometry fingerprint.
    pub fingerprint_prefix: usize,

    // ── Analytics ─────────────────────────────────────────────────────────
    /// Where learned patterns and usage counters are persisted.
    pub analytics_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            corridor_width_m:         20.0,
            resample_step_m:          10.0,
            match_radius_m:           1_000.0,
            classify_radius_m:        100.0,
            grid_cell_deg:            0.01,
            continuation_window_secs: 10 * 60,
            end_grace_secs:           15 * 60,
            min_trip_secs:            120,
            route_cache_path:         None,
            route_cache_max_age_secs: 7 * 24 * 3_600,
            max_routes:               1_000,
            fingerprint_prefix:       10,
            analytics_path:           None,
        }
    }
}

impl TrackerConfig {
    /// Reject configurations that would make matching or the session state
    /// machine meaningless.
    pub fn validate(&self) -> TtResult<()> {
        let positive = [
            ("corridor_width_m", self.corridor_width_m),
            ("resample_step_m", self.resample_step_m),
            ("match_radius_m", self.match_radius_m),
            ("classify_radius_m", self.classify_radius_m),
            ("grid_cell_deg", self.grid_cell_deg),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TtError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if self.match_radius_m < self.corridor_width_m {
            return Err(TtError::Config(format!(
                "match_radius_m ({}) must be at least corridor_width_m ({})",
                self.match_radius_m, self.corridor_width_m
            )));
        }
        if self.continuation_window_secs <= 0 || self.end_grace_secs <= 0 {
            return Err(TtError::Config("session windows must be positive".into()));
        }
        if self.min_trip_secs < 0 {
            return Err(TtError::Config("min_trip_secs must not be negative".into()));
        }
        if self.max_routes == 0 || self.fingerprint_prefix == 0 {
            return Err(TtError::Config(
                "max_routes and fingerprint_prefix must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
