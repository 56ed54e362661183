//! `PatternAnalytics`: usage counters, learned patterns and the classifier
//! behind one value.

use std::collections::BTreeMap;

use tracing::debug;

use tt_core::{Coordinate, Timestamp, TransportType};

use crate::{
    AnalyticsSnapshot, Classification, Classifier, OperatorSummary, PatternReport, TransportPattern,
    UsageStats,
};

#[derive(Debug, Clone, Default)]
pub struct PatternAnalytics {
    usage:      UsageStats,
    patterns:   BTreeMap<TransportType, TransportPattern>,
    classifier: Classifier,
}

impl PatternAnalytics {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier, ..Self::default() }
    }

    /// Restore state saved by [`snapshot`](Self::snapshot).
    pub fn from_snapshot(snapshot: AnalyticsSnapshot, classifier: Classifier) -> Self {
        Self { usage: snapshot.usage, patterns: snapshot.patterns, classifier }
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot::new(self.usage.clone(), self.patterns.clone())
    }

    // ── Usage ─────────────────────────────────────────────────────────────

    pub fn record_usage(&mut self, route_id: &str, operator: Option<&str>, transport: TransportType, at: Timestamp) {
        self.usage.record(route_id, operator, transport, at);
    }

    pub fn popular_routes(&self, limit: usize) -> Vec<(String, u64)> {
        self.usage.popular(limit)
    }

    /// `{operator: {type: count}}`.
    pub fn operator_stats(&self) -> BTreeMap<String, BTreeMap<TransportType, u64>> {
        self.usage.operators().clone()
    }

    pub fn usage(&self) -> &UsageStats {
        &self.usage
    }

    // ── Patterns ──────────────────────────────────────────────────────────

    /// Fold one finished trip into the pattern for `transport`.
    pub fn learn(&mut self, transport: TransportType, speeds: &[f64], stop_frequency: f64, fingerprint: Option<&str>) {
        let pattern = self.patterns.entry(transport).or_default();
        pattern.learn(speeds, stop_frequency, fingerprint);
        debug!(
            transport = %transport,
            samples = pattern.sample_count,
            confidence = pattern.confidence,
            "learned transport pattern"
        );
    }

    pub fn pattern(&self, transport: TransportType) -> Option<&TransportPattern> {
        self.patterns.get(&transport)
    }

    pub fn patterns(&self) -> &BTreeMap<TransportType, TransportPattern> {
        &self.patterns
    }

    pub fn classify(&self, speed_kmh: Option<f64>, recent: &[Coordinate]) -> Classification {
        self.classifier.classify(&self.patterns, speed_kmh, recent)
    }

    // ── Reports ───────────────────────────────────────────────────────────

    pub fn operator_summary(&self) -> OperatorSummary {
        OperatorSummary::from_usage(&self.usage)
    }

    pub fn pattern_report(&self) -> PatternReport {
        PatternReport::from_patterns(&self.patterns)
    }
}
