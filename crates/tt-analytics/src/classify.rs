//! Transport-type classification from speed, stop spacing and learned
//! patterns.
//!
//! # Scoring
//!
//! Each signal votes for one or more types with a weight:
//!
//! | Signal   | Rule                                      | Vote              |
//! |----------|-------------------------------------------|-------------------|
//! | speed    | < 15 / < 35 / < 80 / ≥ 80 km/h            | bus 0.7 / tram 0.6 / train 0.8 / train 0.9 |
//! | spacing  | mean ping gap < 0.5 / < 1.5 / ≥ 1.5 km    | bus 0.8 / tram 0.7 / train 0.8 |
//! | learned  | speed within a pattern's observed range   | 0.5 × pattern confidence |
//!
//! Votes are summed per type.  The winner's confidence is its score divided
//! by the largest weight each *fired* signal could have contributed, so a
//! type backed by every available signal at full strength approaches 1.0.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tt_core::{haversine_km, Coordinate, TransportType};

use crate::TransportPattern;

/// A classification result.  `confidence ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub transport:  TransportType,
    pub confidence: f64,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification { transport: TransportType::Unknown, confidence: 0.0 };

    pub fn is_known(&self) -> bool {
        self.transport.is_known()
    }
}

/// Thresholds and vote weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierWeights {
    // ── Speed signal ──────────────────────────────────────────────────────
    pub bus_max_kmh:        f64,
    pub tram_max_kmh:       f64,
    pub train_max_kmh:      f64,
    pub speed_bus:          f64,
    pub speed_tram:         f64,
    pub speed_train:        f64,
    pub speed_fast_train:   f64,

    // ── Spacing signal ────────────────────────────────────────────────────
    pub bus_max_spacing_km:  f64,
    pub tram_max_spacing_km: f64,
    pub spacing_bus:         f64,
    pub spacing_tram:        f64,
    pub spacing_train:       f64,

    // ── Learned signal ────────────────────────────────────────────────────
    pub learned:            f64,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        Self {
            bus_max_kmh:         15.0,
            tram_max_kmh:        35.0,
            train_max_kmh:       80.0,
            speed_bus:           0.7,
            speed_tram:          0.6,
            speed_train:         0.8,
            speed_fast_train:    0.9,
            bus_max_spacing_km:  0.5,
            tram_max_spacing_km: 1.5,
            spacing_bus:         0.8,
            spacing_tram:        0.7,
            spacing_train:       0.8,
            learned:             0.5,
        }
    }
}

impl ClassifierWeights {
    fn speed_max(&self) -> f64 {
        self.speed_bus.max(self.speed_tram).max(self.speed_train).max(self.speed_fast_train)
    }

    fn spacing_max(&self) -> f64 {
        self.spacing_bus.max(self.spacing_tram).max(self.spacing_train)
    }
}

/// Stateless scorer; learned patterns are passed in per call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Classifier {
    pub weights: ClassifierWeights,
}

impl Classifier {
    pub fn new(weights: ClassifierWeights) -> Self {
        Self { weights }
    }

    /// Best `(type, confidence)` for the given evidence.
    ///
    /// `speed_kmh` is ignored unless finite and non-negative.  `recent` are
    /// the rider's latest ping positions; spacing needs at least two.
    pub fn classify(
        &self,
        patterns: &BTreeMap<TransportType, TransportPattern>,
        speed_kmh: Option<f64>,
        recent: &[Coordinate],
    ) -> Classification {
        let w = &self.weights;
        let speed = speed_kmh.filter(|s| s.is_finite() && *s >= 0.0);

        let mut scores: BTreeMap<TransportType, f64> = BTreeMap::new();
        let mut max_total = 0.0;

        if let Some(s) = speed {
            let (t, vote) = if s < w.bus_max_kmh {
                (TransportType::Bus, w.speed_bus)
            } else if s < w.tram_max_kmh {
                (TransportType::Tram, w.speed_tram)
            } else if s < w.train_max_kmh {
                (TransportType::Train, w.speed_train)
            } else {
                (TransportType::Train, w.speed_fast_train)
            };
            *scores.entry(t).or_insert(0.0) += vote;
            max_total += w.speed_max();
        }

        if let Some(spacing) = mean_spacing_km(recent) {
            let (t, vote) = if spacing < w.bus_max_spacing_km {
                (TransportType::Bus, w.spacing_bus)
            } else if spacing < w.tram_max_spacing_km {
                (TransportType::Tram, w.spacing_tram)
            } else {
                (TransportType::Train, w.spacing_train)
            };
            *scores.entry(t).or_insert(0.0) += vote;
            max_total += w.spacing_max();
        }

        let mut learned_fired = false;
        for (&t, pattern) in patterns {
            if !t.is_known() || pattern.sample_count == 0 {
                continue;
            }
            let fits = match speed {
                Some(s) => pattern.admits(s),
                None => true,
            };
            if fits {
                let vote = w.learned * pattern.confidence;
                if vote > 0.0 {
                    *scores.entry(t).or_insert(0.0) += vote;
                    learned_fired = true;
                }
            }
        }
        if learned_fired {
            max_total += w.learned;
        }

        // Ties go to the lower-ordered type.
        let best = scores
            .into_iter()
            .fold(None::<(TransportType, f64)>, |best, (t, s)| match best {
                Some((_, bs)) if bs >= s => best,
                _ => Some((t, s)),
            });

        match best {
            Some((transport, score)) if score > 0.0 && max_total > 0.0 => Classification {
                transport,
                confidence: (score / max_total).min(1.0),
            },
            _ => Classification::UNKNOWN,
        }
    }
}

/// Mean great-circle distance between consecutive points; `None` below two.
fn mean_spacing_km(points: &[Coordinate]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let total: f64 = points.windows(2).map(|p| haversine_km(p[0], p[1])).sum();
    Some(total / (points.len() - 1) as f64)
}
