//! Unit tests for tt-analytics.

#[cfg(test)]
mod usage {
    use tt_core::{Timestamp, TransportType};

    use crate::{UsageStats, UNKNOWN_OPERATOR};

    #[test]
    fn counts_routes_and_operators() {
        let mut u = UsageStats::new();
        u.record("M10", Some("BVG"), TransportType::Tram, Timestamp(10));
        u.record("M10", Some("BVG"), TransportType::Tram, Timestamp(20));
        u.record("100", Some("BVG"), TransportType::Bus, Timestamp(30));

        assert_eq!(u.route("M10").unwrap().count, 2);
        assert_eq!(u.route("M10").unwrap().last_used, Timestamp(20));
        assert_eq!(u.total_uses(), 3);
        let bvg = &u.operators()["BVG"];
        assert_eq!(bvg[&TransportType::Tram], 2);
        assert_eq!(bvg[&TransportType::Bus], 1);
    }

    #[test]
    fn missing_operator_is_unknown() {
        let mut u = UsageStats::new();
        u.record("x", None, TransportType::Bus, Timestamp(0));
        u.record("y", Some("  "), TransportType::Bus, Timestamp(0));
        assert_eq!(u.operators()[UNKNOWN_OPERATOR][&TransportType::Bus], 2);
    }

    #[test]
    fn popular_orders_by_count_then_first_seen() {
        let mut u = UsageStats::new();
        for id in ["c", "a", "b", "a", "b", "d"] {
            u.record(id, None, TransportType::Bus, Timestamp(0));
        }
        // a and b tie at 2 (a seen first); c and d tie at 1 (c seen first).
        let top = u.popular(10);
        let ids: Vec<_> = top.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(u.popular(2), vec![("a".to_string(), 2), ("b".to_string(), 2)]);
        assert!(u.popular(0).is_empty());
    }

    #[test]
    fn lookup_survives_json_round_trip() {
        let mut u = UsageStats::new();
        u.record("M10", Some("BVG"), TransportType::Tram, Timestamp(5));
        let json = serde_json::to_string(&u).unwrap();
        let mut back: UsageStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, u);
        back.record("M10", Some("BVG"), TransportType::Tram, Timestamp(6));
        assert_eq!(back.route("M10").unwrap().count, 2);
        assert_eq!(back.routes().len(), 1);
    }
}

#[cfg(test)]
mod pattern {
    use tt_core::{Coordinate, Timestamp};

    use crate::pattern::{CONFIDENT_SAMPLES, MAX_SPEED_SAMPLES};
    use crate::{leg_speeds_kmh, stop_frequency, TransportPattern};

    #[test]
    fn confidence_saturates_at_fifty_samples() {
        let mut p = TransportPattern::default();
        for i in 1..=60u64 {
            p.learn(&[20.0], 0.5, None);
            let expected = (i as f64 / CONFIDENT_SAMPLES as f64).min(1.0);
            assert!((p.confidence - expected).abs() < 1e-12);
        }
        assert_eq!(p.sample_count, 60);
        assert_eq!(p.confidence, 1.0);
    }

    #[test]
    fn speed_window_keeps_most_recent() {
        let mut p = TransportPattern::default();
        let speeds: Vec<f64> = (0..1_500).map(|i| i as f64).collect();
        p.learn(&speeds, 0.0, None);
        assert_eq!(p.speeds.len(), MAX_SPEED_SAMPLES);
        assert_eq!(p.speeds.front().copied(), Some(500.0));
        assert_eq!(p.speeds.back().copied(), Some(1_499.0));
    }

    #[test]
    fn invalid_speeds_are_dropped() {
        let mut p = TransportPattern::default();
        p.learn(&[f64::NAN, -3.0, 12.0, f64::INFINITY], 0.2, None);
        assert_eq!(p.speeds.iter().copied().collect::<Vec<_>>(), vec![12.0]);
    }

    #[test]
    fn stop_frequency_is_smoothed() {
        let mut p = TransportPattern::default();
        p.learn(&[], 0.8, None);
        assert_eq!(p.stop_frequency, 0.8);
        p.learn(&[], 0.0, None);
        assert!((p.stop_frequency - 0.72).abs() < 1e-12);
        p.learn(&[], 1.0, Some("abc"));
        assert!((p.stop_frequency - (0.1 + 0.9 * 0.72)).abs() < 1e-12);
        assert_eq!(p.last_fingerprint.as_deref(), Some("abc"));
    }

    #[test]
    fn admits_within_range() {
        let mut p = TransportPattern::default();
        assert!(!p.admits(10.0));
        p.learn(&[8.0, 14.0, 11.0], 0.5, None);
        assert_eq!(p.speed_range(), Some((8.0, 14.0)));
        assert!(p.admits(8.0) && p.admits(14.0) && p.admits(10.0));
        assert!(!p.admits(14.5));
        assert!((p.avg_speed().unwrap() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn leg_speeds_and_stops() {
        let a = Coordinate::new(52.50, 13.40).unwrap();
        let b = a.offset_m(1_000.0, 0.0);
        let path = [(a, Timestamp(0)), (b, Timestamp(180)), (b, Timestamp(180)), (b, Timestamp(240))];
        let speeds = leg_speeds_kmh(&path);
        // Zero-duration leg skipped; 1 km in 3 min ≈ 20 km/h, then stationary.
        assert_eq!(speeds.len(), 2);
        assert!((speeds[0] - 20.0).abs() < 0.1, "{}", speeds[0]);
        assert_eq!(speeds[1], 0.0);
        assert_eq!(stop_frequency(&speeds), 0.5);
        assert_eq!(stop_frequency(&[]), 0.0);
    }
}

#[cfg(test)]
mod classify {
    use std::collections::BTreeMap;

    use tt_core::{Coordinate, TransportType};

    use crate::{Classification, Classifier, TransportPattern};

    fn line(spacing_m: f64, n: usize) -> Vec<Coordinate> {
        let origin = Coordinate::new(52.50, 13.40).unwrap();
        (0..n).map(|i| origin.offset_m(i as f64 * spacing_m, 0.0)).collect()
    }

    fn none() -> BTreeMap<TransportType, TransportPattern> {
        BTreeMap::new()
    }

    #[test]
    fn no_evidence_is_unknown() {
        let c = Classifier::default();
        assert_eq!(c.classify(&none(), None, &[]), Classification::UNKNOWN);
        assert_eq!(c.classify(&none(), Some(f64::NAN), &line(100.0, 1)), Classification::UNKNOWN);
    }

    #[test]
    fn slow_and_dense_is_bus() {
        let c = Classifier::default();
        let got = c.classify(&none(), Some(5.0), &line(200.0, 3));
        assert_eq!(got.transport, TransportType::Bus);
        // (0.7 + 0.8) / (0.9 + 0.8)
        assert!((got.confidence - 1.5 / 1.7).abs() < 1e-9);
        assert!(got.confidence >= 0.7);
    }

    #[test]
    fn speed_bands() {
        let c = Classifier::default();
        let at = |s: f64| c.classify(&none(), Some(s), &[]);
        assert_eq!(at(14.9).transport, TransportType::Bus);
        assert_eq!(at(15.0).transport, TransportType::Tram);
        assert_eq!(at(50.0).transport, TransportType::Train);
        assert!((at(50.0).confidence - 0.8 / 0.9).abs() < 1e-9);
        assert_eq!(at(120.0).confidence, 1.0);
    }

    #[test]
    fn spacing_bands() {
        let c = Classifier::default();
        assert_eq!(c.classify(&none(), None, &line(1_000.0, 4)).transport, TransportType::Tram);
        assert_eq!(c.classify(&none(), None, &line(3_000.0, 2)).transport, TransportType::Train);
    }

    #[test]
    fn learned_pattern_breaks_disagreement() {
        let mut patterns = none();
        let mut tram = TransportPattern::default();
        for _ in 0..50 {
            tram.learn(&[10.0, 25.0], 0.3, None);
        }
        patterns.insert(TransportType::Tram, tram);

        let c = Classifier::default();
        // Speed says bus (0.7), spacing says tram (0.7), learned tram adds 0.5.
        let got = c.classify(&patterns, Some(12.0), &line(1_000.0, 3));
        assert_eq!(got.transport, TransportType::Tram);
        assert!((got.confidence - 1.2 / 2.2).abs() < 1e-9);
    }

    #[test]
    fn learned_pattern_outside_range_is_ignored() {
        let mut patterns = none();
        let mut train = TransportPattern::default();
        train.learn(&[90.0, 120.0], 0.1, None);
        patterns.insert(TransportType::Train, train);

        let got = Classifier::default().classify(&patterns, Some(5.0), &[]);
        assert_eq!(got.transport, TransportType::Bus);
        assert!((got.confidence - 0.7 / 0.9).abs() < 1e-9);
    }

    #[test]
    fn learned_only_when_speed_unknown() {
        let mut patterns = none();
        let mut bus = TransportPattern::default();
        for _ in 0..25 {
            bus.learn(&[12.0], 0.6, None);
        }
        patterns.insert(TransportType::Bus, bus);
        let got = Classifier::default().classify(&patterns, None, &[]);
        assert_eq!(got.transport, TransportType::Bus);
        // 0.5 × 0.5 / 0.5
        assert!((got.confidence - 0.5).abs() < 1e-9);
    }
}

#[cfg(test)]
mod summary {
    use tt_core::{Timestamp, TransportType};

    use crate::{LearningStatus, PatternAnalytics};

    #[test]
    fn operator_market_share() {
        let mut a = PatternAnalytics::default();
        for _ in 0..3 {
            a.record_usage("M10", Some("BVG"), TransportType::Tram, Timestamp(0));
        }
        a.record_usage("100", Some("BVG"), TransportType::Bus, Timestamp(0));
        a.record_usage("S1", Some("DB"), TransportType::Train, Timestamp(0));

        let s = a.operator_summary();
        assert_eq!(s.total_uses, 5);
        assert_eq!(s.operators[0].operator, "BVG");
        assert_eq!(s.operators[0].distinct_routes, 2);
        assert_eq!(s.operators[0].market_share_pct, 80.0);
        assert_eq!(s.operators[1].market_share_pct, 20.0);
        assert_eq!(s.type_distribution[&TransportType::Tram], 3);
    }

    #[test]
    fn empty_summary() {
        let a = PatternAnalytics::default();
        assert_eq!(a.operator_summary().total_uses, 0);
        let r = a.pattern_report();
        assert!(r.patterns.is_empty());
        assert_eq!(r.accuracy.mean_confidence, 0.0);
    }

    #[test]
    fn pattern_report_statuses() {
        let mut a = PatternAnalytics::default();
        a.learn(TransportType::Bus, &[10.0, 20.0], 0.5, None);
        for _ in 0..20 {
            a.learn(TransportType::Tram, &[25.0], 0.3, None);
        }
        for _ in 0..45 {
            a.learn(TransportType::Train, &[90.0], 0.1, None);
        }

        let r = a.pattern_report();
        let status: Vec<_> = r.patterns.iter().map(|p| (p.transport, p.status)).collect();
        assert_eq!(
            status,
            vec![
                (TransportType::Bus, LearningStatus::Learning),
                (TransportType::Tram, LearningStatus::Developing),
                (TransportType::Train, LearningStatus::Confident),
            ]
        );
        let bus_speed = r.patterns[0].speed.unwrap();
        assert_eq!((bus_speed.min, bus_speed.max, bus_speed.avg), (10.0, 20.0, 15.0));
        assert_eq!(r.accuracy.transport_types, 3);
        assert_eq!(r.accuracy.high_confidence_patterns, 1);
        assert_eq!(r.accuracy.total_samples, 66);
    }
}

#[cfg(test)]
mod snapshot {
    use tt_core::{Timestamp, TransportType};

    use crate::{
        AnalyticsError, AnalyticsSnapshot, AnalyticsStore, Classifier, JsonFileStore, MemoryStore,
        PatternAnalytics, SCHEMA_VERSION,
    };

    fn populated() -> PatternAnalytics {
        let mut a = PatternAnalytics::default();
        a.record_usage("M10", Some("BVG"), TransportType::Tram, Timestamp(100));
        a.record_usage("100", None, TransportType::Bus, Timestamp(200));
        a.learn(TransportType::Bus, &[12.5, 9.0], 0.5, Some("00ff00ff00ff00ff"));
        a
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("analytics.json"));
        assert!(store.load().unwrap().is_none());

        let original = populated();
        store.save(&original.snapshot()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);

        let restored = PatternAnalytics::from_snapshot(loaded, Classifier::default());
        assert_eq!(restored.popular_routes(10), original.popular_routes(10));
        assert_eq!(restored.operator_stats(), original.operator_stats());
        let bus = restored.pattern(TransportType::Bus).unwrap();
        assert_eq!(bus.sample_count, 1);
        assert_eq!(bus.speeds.iter().copied().collect::<Vec<_>>(), vec![12.5, 9.0]);
        assert_eq!(bus.last_fingerprint.as_deref(), Some("00ff00ff00ff00ff"));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&populated().snapshot()).unwrap();
        let back = store.load().unwrap().unwrap();
        assert_eq!(back.usage.total_uses(), 2);
    }

    #[test]
    fn future_schema_rejected() {
        let store = MemoryStore::with_json(r#"{"schema_version": 99, "usage": {}, "patterns": {}}"#);
        match store.load() {
            Err(AnalyticsError::UnsupportedSchema { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected UnsupportedSchema, got {other:?}"),
        }
    }

    #[test]
    fn minimal_snapshot_accepted() {
        let snap = AnalyticsSnapshot::from_json(r#"{"schema_version": 1}"#).unwrap();
        assert!(snap.usage.is_empty());
        assert!(snap.patterns.is_empty());
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(AnalyticsSnapshot::from_json("[]"), Err(AnalyticsError::Json(_))));
    }
}
