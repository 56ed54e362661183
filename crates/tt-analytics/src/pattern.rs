//! Learned per-transport-type movement patterns.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use tt_core::{haversine_km, Coordinate, Timestamp};

/// Most recent speed samples kept per pattern.
pub const MAX_SPEED_SAMPLES: usize = 1_000;

/// Smoothing factor for the stop-frequency moving average.
pub const STOP_FREQUENCY_ALPHA: f64 = 0.1;

/// Samples after which a pattern is fully trusted.
pub const CONFIDENT_SAMPLES: u64 = 50;

/// A leg slower than this counts as a stop.
pub const STOP_SPEED_KMH: f64 = 5.0;

/// What has been learned about one transport type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportPattern {
    /// Rolling window of observed speeds, km/h, oldest first.
    pub speeds:           VecDeque<f64>,
    /// Exponentially smoothed fraction of legs spent stopped.
    pub stop_frequency:   f64,
    pub sample_count:     u64,
    /// `min(sample_count / 50, 1)`.
    pub confidence:       f64,
    pub last_fingerprint: Option<String>,
}

impl TransportPattern {
    /// Fold one finished trip into the pattern.
    ///
    /// Non-finite and negative speeds are dropped.  The stop frequency is
    /// initialised by the first sample and smoothed afterwards.
    pub fn learn(&mut self, speeds: &[f64], stop_frequency: f64, fingerprint: Option<&str>) {
        for &s in speeds.iter().filter(|s| s.is_finite() && **s >= 0.0) {
            if self.speeds.len() == MAX_SPEED_SAMPLES {
                self.speeds.pop_front();
            }
            self.speeds.push_back(s);
        }

        let stop_frequency = stop_frequency.clamp(0.0, 1.0);
        self.stop_frequency = if self.sample_count == 0 {
            stop_frequency
        } else {
            STOP_FREQUENCY_ALPHA * stop_frequency + (1.0 - STOP_FREQUENCY_ALPHA) * self.stop_frequency
        };

        self.sample_count += 1;
        self.confidence = (self.sample_count as f64 / CONFIDENT_SAMPLES as f64).min(1.0);
        if let Some(fp) = fingerprint {
            self.last_fingerprint = Some(fp.to_owned());
        }
    }

    pub fn avg_speed(&self) -> Option<f64> {
        if self.speeds.is_empty() {
            return None;
        }
        Some(self.speeds.iter().sum::<f64>() / self.speeds.len() as f64)
    }

    /// `(min, max)` of the rolling speed window.
    pub fn speed_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.speeds.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
    }

    /// `true` if `speed` lies within the observed range.
    pub fn admits(&self, speed_kmh: f64) -> bool {
        self.speed_range()
            .is_some_and(|(lo, hi)| (lo..=hi).contains(&speed_kmh))
    }
}

/// Speed of each leg between consecutive timestamped points, km/h.
///
/// Legs with no elapsed time are skipped.
pub fn leg_speeds_kmh(path: &[(Coordinate, Timestamp)]) -> Vec<f64> {
    path.windows(2)
        .filter_map(|pair| {
            let (a, ta) = pair[0];
            let (b, tb) = pair[1];
            let secs = tb.secs_since(ta);
            (secs > 0).then(|| haversine_km(a, b) / (secs as f64 / 3_600.0))
        })
        .collect()
}

/// Fraction of legs slower than [`STOP_SPEED_KMH`]; `0.0` with no legs.
pub fn stop_frequency(speeds: &[f64]) -> f64 {
    if speeds.is_empty() {
        return 0.0;
    }
    speeds.iter().filter(|&&s| s < STOP_SPEED_KMH).count() as f64 / speeds.len() as f64
}
