//! Read models over usage counters and learned patterns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tt_core::TransportType;

use crate::{TransportPattern, UsageStats};

/// Patterns at or above this confidence count as high-confidence.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Below this confidence a pattern is still `learning`.
pub const DEVELOPING_CONFIDENCE: f64 = 0.3;

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorShare {
    pub operator:         String,
    pub total_uses:       u64,
    pub distinct_routes:  usize,
    /// Percentage of all recorded uses, rounded to two decimals.
    pub market_share_pct: f64,
    pub by_type:          BTreeMap<TransportType, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorSummary {
    /// Busiest operator first; ties by name.
    pub operators:         Vec<OperatorShare>,
    pub type_distribution: BTreeMap<TransportType, u64>,
    pub total_uses:        u64,
}

impl OperatorSummary {
    pub fn from_usage(usage: &UsageStats) -> Self {
        let total_uses: u64 = usage
            .operators()
            .values()
            .flat_map(|by_type| by_type.values())
            .sum();

        let mut type_distribution: BTreeMap<TransportType, u64> = BTreeMap::new();
        let mut operators: Vec<OperatorShare> = usage
            .operators()
            .iter()
            .map(|(operator, by_type)| {
                for (&t, &n) in by_type {
                    *type_distribution.entry(t).or_insert(0) += n;
                }
                let uses: u64 = by_type.values().sum();
                OperatorShare {
                    operator:         operator.clone(),
                    total_uses:       uses,
                    distinct_routes:  usage.routes().iter().filter(|r| &r.operator == operator).count(),
                    market_share_pct: percent(uses, total_uses),
                    by_type:          by_type.clone(),
                }
            })
            .collect();
        operators.sort_by(|a, b| b.total_uses.cmp(&a.total_uses).then_with(|| a.operator.cmp(&b.operator)));

        Self { operators, type_distribution, total_uses }
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / whole as f64).round() / 100.0
}

// ── Patterns ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStatus {
    Learning,
    Developing,
    Confident,
}

impl LearningStatus {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            LearningStatus::Confident
        } else if confidence >= DEVELOPING_CONFIDENCE {
            LearningStatus::Developing
        } else {
            LearningStatus::Learning
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub transport:      TransportType,
    pub confidence:     f64,
    pub samples:        u64,
    pub stop_frequency: f64,
    pub status:         LearningStatus,
    pub speed:          Option<SpeedStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionAccuracy {
    pub transport_types:          usize,
    pub high_confidence_patterns: usize,
    pub total_samples:            u64,
    /// Mean pattern confidence; `0.0` with no patterns.
    pub mean_confidence:          f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub patterns: Vec<PatternSummary>,
    pub accuracy: DetectionAccuracy,
}

impl PatternReport {
    pub fn from_patterns(patterns: &BTreeMap<TransportType, TransportPattern>) -> Self {
        let summaries: Vec<PatternSummary> = patterns
            .iter()
            .map(|(&transport, p)| PatternSummary {
                transport,
                confidence:     p.confidence,
                samples:        p.sample_count,
                stop_frequency: p.stop_frequency,
                status:         LearningStatus::from_confidence(p.confidence),
                speed:          p.avg_speed().zip(p.speed_range()).map(|(avg, (min, max))| SpeedStats { avg, min, max }),
            })
            .collect();

        let n = summaries.len();
        let accuracy = DetectionAccuracy {
            transport_types:          n,
            high_confidence_patterns: summaries.iter().filter(|s| s.confidence >= HIGH_CONFIDENCE).count(),
            total_samples:            summaries.iter().map(|s| s.samples).sum(),
            mean_confidence:          if n == 0 {
                0.0
            } else {
                summaries.iter().map(|s| s.confidence).sum::<f64>() / n as f64
            },
        };

        Self { patterns: summaries, accuracy }
    }
}
