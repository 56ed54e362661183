//! Unit tests for tt-spatial.
//!
//! Routes are synthetic straight lines and L-shapes around (52.50, 13.40);
//! no provider data is needed.

#[cfg(test)]
mod helpers {
    use tt_core::{Coordinate, TransportType};

    use crate::{RawRoute, RouteMeta};

    pub const ORIGIN: Coordinate = Coordinate { lat: 52.50, lon: 13.40 };

    /// East-west line of `len_m` metres starting `north_m` north of ORIGIN.
    pub fn straight(id: &str, north_m: f64, len_m: f64) -> RawRoute {
        let a = ORIGIN.offset_m(north_m, 0.0);
        let b = ORIGIN.offset_m(north_m, len_m);
        RawRoute::new(id, vec![[a.lat, a.lon], [b.lat, b.lon]])
    }

    /// 1 km east, then 1 km north.
    pub fn l_shape(id: &str) -> RawRoute {
        let a = ORIGIN;
        let b = ORIGIN.offset_m(0.0, 1_000.0);
        let c = ORIGIN.offset_m(1_000.0, 1_000.0);
        RawRoute::new(id, vec![[a.lat, a.lon], [b.lat, b.lon], [c.lat, c.lon]])
    }

    pub fn bus_meta(operator: &str) -> RouteMeta {
        RouteMeta {
            transport: Some(TransportType::Bus),
            operator:  Some(operator.into()),
            name:      Some("Bus 100".into()),
            reference: Some("100".into()),
        }
    }

    pub fn coords(raw: &RawRoute) -> Vec<Coordinate> {
        raw.points.iter().map(|&[lat, lon]| Coordinate { lat, lon }).collect()
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod geometry {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use tt_core::METERS_PER_DEGREE;

    use super::helpers::{coords, l_shape, straight, ORIGIN};
    use crate::{buffer, distance_deg, interpolate, GeometryError};

    #[test]
    fn interpolate_preserves_endpoints() {
        let line = coords(&l_shape("l"));
        let out = interpolate(&line, 10.0).unwrap();
        assert_eq!(out.first(), line.first());
        assert_eq!(out.last(), line.last());
        // 2 km at 10 m → 200 segments, give or take rounding.
        assert!((201..=202).contains(&out.len()), "{} points", out.len());
    }

    #[test]
    fn interpolate_spacing_is_at_most_step() {
        let line = coords(&straight("s", 0.0, 333.0));
        let out = interpolate(&line, 10.0).unwrap();
        for pair in out.windows(2) {
            let d = (pair[1].lon - pair[0].lon).hypot(pair[1].lat - pair[0].lat) * METERS_PER_DEGREE;
            assert!(d <= 10.0 + 1e-6, "spacing {d} m");
        }
    }

    #[test]
    fn interpolate_short_line_keeps_both_ends() {
        let line = coords(&straight("s", 0.0, 3.0));
        let out = interpolate(&line, 10.0).unwrap();
        assert_eq!(out, line);
    }

    #[test]
    fn degenerate_input_rejected() {
        assert_eq!(interpolate(&[ORIGIN], 10.0), Err(GeometryError::Degenerate { points: 1 }));
        assert_eq!(interpolate(&[], 10.0), Err(GeometryError::Degenerate { points: 0 }));
        assert!(buffer(&[ORIGIN], 20.0, 10.0).is_err());
        assert_eq!(
            interpolate(&[ORIGIN, ORIGIN.offset_m(5.0, 0.0)], 0.0),
            Err(GeometryError::InvalidStep(0.0))
        );
    }

    #[test]
    fn zero_length_route_buffers_to_a_disc() {
        let corridor = buffer(&[ORIGIN, ORIGIN], 20.0, 10.0).unwrap();
        assert!(corridor.contains(ORIGIN));
        assert!(corridor.contains(ORIGIN.offset_m(15.0, 0.0)));
        assert!(!corridor.contains(ORIGIN.offset_m(30.0, 0.0)));
    }

    #[test]
    fn straight_runs_are_merged() {
        let corridor = buffer(&coords(&straight("s", 0.0, 2_000.0)), 20.0, 10.0).unwrap();
        // One rectangle plus two end caps.
        assert_eq!(corridor.piece_count(), 3);
    }

    #[test]
    fn buffer_is_deterministic() {
        let line = coords(&l_shape("l"));
        let a = buffer(&line, 20.0, 10.0).unwrap();
        let b = buffer(&line, 20.0, 10.0).unwrap();
        assert_eq!(a.polygon(), b.polygon());
    }

    #[test]
    fn vertex_is_inside() {
        let line = coords(&l_shape("l"));
        let corridor = buffer(&line, 20.0, 10.0).unwrap();
        for p in &line {
            assert!(corridor.contains(*p));
        }
    }

    /// Points along the interior of a straight route: well inside the width
    /// are contained, well outside are not.
    #[test]
    fn corridor_width_property() {
        let width = 20.0;
        let len = 2_000.0;
        let corridor = buffer(&coords(&straight("s", 0.0, len)), width, 10.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..500 {
            let along = rng.gen_range(0.05..0.95) * len;
            let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let inside = ORIGIN.offset_m(side * rng.gen_range(0.0..0.9) * width, along);
            let outside = ORIGIN.offset_m(side * rng.gen_range(1.1..5.0) * width, along);
            assert!(corridor.contains(inside), "{inside} should be inside");
            assert!(!corridor.contains(outside), "{outside} should be outside");
        }
    }

    #[test]
    fn bend_is_covered() {
        let corridor = buffer(&coords(&l_shape("l")), 20.0, 10.0).unwrap();
        let corner = ORIGIN.offset_m(0.0, 1_000.0);
        // Outer diagonal of the corner, 10 m away.
        let p = corner.offset_m(-10.0 / 2f64.sqrt(), 10.0 / 2f64.sqrt());
        assert!(corridor.contains(p));
        assert!(!corridor.contains(corner.offset_m(-40.0, 40.0)));
    }

    #[test]
    fn distance_deg_to_segment() {
        let line = coords(&straight("s", 0.0, 1_000.0));
        let p = ORIGIN.offset_m(50.0, 500.0);
        let d_m = distance_deg(p, &line) * METERS_PER_DEGREE;
        assert!((d_m - 50.0).abs() < 1e-6, "got {d_m}");
        // Beyond the end: distance to the endpoint.
        let q = ORIGIN.offset_m(0.0, 1_100.0);
        assert!((distance_deg(q, &line) * METERS_PER_DEGREE - 100.0).abs() < 1e-6);
        assert_eq!(distance_deg(p, &[]), f64::INFINITY);
        assert_eq!(distance_deg(p, &[p]), 0.0);
    }
}

// ── Route model ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod route {
    use tt_core::{Coordinate, TransportType};

    use super::helpers::{bus_meta, coords, straight};
    use crate::{fingerprint, normalize_routes, GeometryError, RawRoute, Route};

    #[test]
    fn fingerprint_is_stable_hex() {
        let pts = coords(&straight("a", 0.0, 500.0));
        let fp = fingerprint(&pts, 10);
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint(&pts, 10));
    }

    #[test]
    fn fingerprint_ignores_sub_metre_noise() {
        let pts = coords(&straight("a", 0.0, 500.0));
        let jittered: Vec<Coordinate> = pts
            .iter()
            .map(|c| Coordinate { lat: c.lat + 1e-8, lon: c.lon - 1e-8 })
            .collect();
        assert_eq!(fingerprint(&pts, 10), fingerprint(&jittered, 10));
        let moved = coords(&straight("b", 50.0, 500.0));
        assert_ne!(fingerprint(&pts, 10), fingerprint(&moved, 10));
    }

    #[test]
    fn unnamed_route_gets_fingerprint_id() {
        let mut raw = straight("x", 0.0, 500.0);
        raw.id = None;
        let route = Route::from_raw(raw, 10).unwrap();
        assert_eq!(route.id, format!("route-{}", route.fingerprint));
    }

    #[test]
    fn corrupt_coordinate_rejected() {
        let raw = RawRoute::new("bad", vec![[52.5, 13.4], [95.0, 13.4]]);
        assert_eq!(
            Route::from_raw(raw, 10),
            Err(GeometryError::InvalidCoordinate { index: 1, lat: 95.0, lon: 13.4 })
        );
    }

    #[test]
    fn normalize_keeps_first_of_duplicate_ids() {
        let raw = vec![
            straight("M10", 0.0, 500.0),
            straight("M10", 300.0, 500.0),
            straight("M11", 600.0, 500.0),
        ];
        let routes = normalize_routes(raw, 10, 1_000);
        let ids: Vec<_> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["M10", "M11"]);
        assert_eq!(routes[0].fingerprint, fingerprint(&coords(&straight("x", 0.0, 500.0)), 10));
    }

    #[test]
    fn unknown_transport_tag_is_not_declared() {
        let mut raw = straight("a", 0.0, 500.0).with_meta(bus_meta("BVG"));
        let route = Route::from_raw(raw.clone(), 10).unwrap();
        assert_eq!(route.transport(), Some(TransportType::Bus));
        raw.meta.transport = Some(TransportType::Unknown);
        assert_eq!(Route::from_raw(raw, 10).unwrap().transport(), None);
    }

    #[test]
    fn normalize_skips_dedupes_and_caps() {
        let raw = vec![
            straight("a", 0.0, 500.0),
            RawRoute::new("one-point", vec![[52.5, 13.4]]),
            straight("a-copy", 0.0, 500.0),
            straight("b", 100.0, 500.0),
            straight("c", 200.0, 500.0),
        ];
        let routes = normalize_routes(raw.clone(), 10, 1_000);
        let ids: Vec<_> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        let capped = normalize_routes(raw, 10, 2);
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[1].id, "b");
    }
}

// ── Grid index ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod index {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use tt_core::RouteIdx;

    use super::helpers::{straight, ORIGIN};
    use crate::{linear_scan, normalize_routes, GridIndex, RawRoute, Route};

    fn random_routes(rng: &mut SmallRng, n: usize) -> Vec<Route> {
        let raw: Vec<RawRoute> = (0..n)
            .map(|i| {
                let start = ORIGIN.offset_m(rng.gen_range(-5_000.0..5_000.0), rng.gen_range(-5_000.0..5_000.0));
                let points = (0..rng.gen_range(2..6))
                    .scan(start, |p, _| {
                        let here = *p;
                        *p = p.offset_m(rng.gen_range(-800.0..800.0), rng.gen_range(-800.0..800.0));
                        Some([here.lat, here.lon])
                    })
                    .collect();
                RawRoute::new(format!("r{i}"), points)
            })
            .collect();
        normalize_routes(raw, 10, 1_000)
    }

    #[test]
    fn empty_index_finds_nothing() {
        let idx = GridIndex::empty(0.01);
        assert!(idx.query(&[], ORIGIN, 1_000.0).is_empty());
        assert_eq!(idx.cell_count(), 0);
    }

    #[test]
    fn query_matches_linear_scan() {
        let mut rng = SmallRng::seed_from_u64(7);
        let routes = random_routes(&mut rng, 60);
        let idx = GridIndex::build(&routes, 0.01);

        for _ in 0..300 {
            let at = ORIGIN.offset_m(rng.gen_range(-7_000.0..7_000.0), rng.gen_range(-7_000.0..7_000.0));
            let radius = rng.gen_range(0.0..2_500.0);
            assert_eq!(idx.query(&routes, at, radius), linear_scan(&routes, at, radius));
        }
    }

    #[test]
    fn long_route_found_from_every_cell_it_crosses() {
        // 5 km line spans several 0.01° cells.
        let routes = normalize_routes(vec![straight("long", 0.0, 5_000.0)], 10, 10);
        let idx = GridIndex::build(&routes, 0.01);
        for east in [0.0, 1_200.0, 2_500.0, 3_700.0, 5_000.0] {
            let at = ORIGIN.offset_m(30.0, east);
            assert_eq!(idx.query(&routes, at, 100.0), vec![RouteIdx(0)], "east {east}");
        }
        assert!(!idx.cell_routes(ORIGIN.offset_m(0.0, 2_500.0)).is_empty());
    }

    #[test]
    fn results_sorted_and_unique() {
        let raw = vec![
            straight("a", 0.0, 3_000.0),
            straight("b", 50.0, 3_000.0),
            straight("c", 100.0, 3_000.0),
        ];
        let routes = normalize_routes(raw, 10, 10);
        let idx = GridIndex::build(&routes, 0.01);
        let hits = idx.query(&routes, ORIGIN.offset_m(50.0, 1_500.0), 1_000.0);
        assert_eq!(hits, vec![RouteIdx(0), RouteIdx(1), RouteIdx(2)]);
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod source {
    use std::io::Cursor;

    use tt_core::TransportType;

    use super::helpers::straight;
    use crate::{load_routes_reader, FnSource, MultiSource, RouteSource, SourceError, StaticSource};

    const CSV: &str = "\
route_id,seq,lat,lon,transport,operator,name,ref
M10,1,52.5300,13.4100,,,,
M10,0,52.5290,13.4010,tram,BVG,Tram M10,M10
100,0,52.5210,13.4130,bus,BVG,Bus 100,100
100,1,52.5150,13.3900,,,,
";

    #[test]
    fn csv_groups_and_orders_by_seq() {
        let routes = load_routes_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].id.as_deref(), Some("M10"));
        assert_eq!(routes[0].points, vec![[52.5290, 13.4010], [52.5300, 13.4100]]);
        assert_eq!(routes[0].meta.transport, Some(TransportType::Tram));
        assert_eq!(routes[0].meta.name.as_deref(), Some("Tram M10"));
        assert_eq!(routes[1].meta.operator.as_deref(), Some("BVG"));
        assert_eq!(routes[1].meta.reference.as_deref(), Some("100"));
    }

    #[test]
    fn csv_parse_error_reported() {
        let bad = "route_id,seq,lat,lon,transport,operator,name,ref\nX,zero,1,2,,,,\n";
        assert!(matches!(load_routes_reader(Cursor::new(bad)), Err(SourceError::Parse(_))));
    }

    fn down(name: &'static str) -> FnSource<impl Fn() -> Result<Vec<crate::RawRoute>, SourceError> + Send + Sync> {
        FnSource::new(name, move || {
            Err(SourceError::Unavailable { provider: name.into(), reason: "timeout".into() })
        })
    }

    #[test]
    fn multi_source_skips_failures() {
        let multi = MultiSource::new()
            .with(down("overpass"))
            .with(StaticSource::new(vec![straight("a", 0.0, 500.0)]))
            .with(StaticSource::new(vec![straight("b", 50.0, 500.0)]));
        let routes = multi.fetch().unwrap();
        let ids: Vec<_> = routes.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn multi_source_fails_when_all_fail() {
        let multi = MultiSource::new().with(down("one")).with(down("two"));
        let err = multi.fetch().unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert!(err.to_string().contains("one"));
    }
}

// ── Store & cache ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tt_core::Timestamp;

    use super::helpers::{l_shape, straight};
    use crate::{
        normalize_routes, FnSource, RawRoute, RouteCache, RouteStore, SnapshotOrigin, SourceError,
        SpatialError, StaticSource, StoreConfig, CACHE_VERSION,
    };

    const NOW: Timestamp = Timestamp(1_714_552_200);
    const WEEK: i64 = 7 * 86_400;

    fn corpus() -> Vec<RawRoute> {
        vec![
            straight("a", 0.0, 1_000.0),
            straight("b", 200.0, 1_000.0),
            l_shape("c"),
            straight("a-dup", 0.0, 1_000.0),
            RawRoute::new("degenerate", vec![[52.5, 13.4]]),
        ]
    }

    fn cfg_with_cache(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig { cache_path: Some(dir.path().join("routes.json")), ..StoreConfig::default() }
    }

    fn failing() -> FnSource<impl Fn() -> Result<Vec<RawRoute>, SourceError> + Send + Sync> {
        FnSource::new("down", || {
            Err(SourceError::Unavailable { provider: "down".into(), reason: "503".into() })
        })
    }

    #[test]
    fn load_normalises_source() {
        let store = RouteStore::new(StaticSource::new(corpus()), StoreConfig::default());
        assert_eq!(store.count(), 0);
        assert_eq!(store.load_at(NOW).unwrap(), 3);
        assert!(store.is_loaded());
        assert_eq!(store.snapshot().origin(), SnapshotOrigin::Fetch);
        let ids: Vec<_> = store.all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn load_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = FnSource::new("counting", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(corpus())
        });
        let store = RouteStore::new(source, StoreConfig::default());
        store.load_at(NOW).unwrap();
        store.load_at(NOW).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RouteStore::new(StaticSource::new(corpus()), cfg_with_cache(&dir));
        let report = store.refresh_at(true, NOW).unwrap();
        assert_eq!(report.routes_loaded, 3);
        assert_eq!(report.origin, SnapshotOrigin::Fetch);

        let cache = RouteCache::new(dir.path().join("routes.json"), WEEK).read().unwrap().unwrap();
        assert_eq!(cache.version, CACHE_VERSION);
        assert_eq!(cache.total_routes, 3);
        assert_eq!(cache.created_at, NOW);

        // A second process whose source is down still loads from the cache.
        let again = RouteStore::new(failing(), cfg_with_cache(&dir));
        assert_eq!(again.load_at(NOW + 3_600).unwrap(), 3);
        assert_eq!(again.snapshot().origin(), SnapshotOrigin::Cache);
        let ids = |routes: Vec<crate::Route>| routes.into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(again.all()), ids(store.all()));
    }

    #[test]
    fn stale_cache_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RouteCache::new(dir.path().join("routes.json"), WEEK);
        let old = normalize_routes(vec![straight("old", 0.0, 500.0)], 10, 10);
        cache.write(&old, NOW - WEEK - 1).unwrap();

        let store = RouteStore::new(StaticSource::new(corpus()), cfg_with_cache(&dir));
        assert_eq!(store.load_at(NOW).unwrap(), 3);
        assert_eq!(store.snapshot().origin(), SnapshotOrigin::Fetch);
        assert_eq!(cache.read().unwrap().unwrap().created_at, NOW);
    }

    #[test]
    fn failed_fetch_leaves_store_empty() {
        let store = RouteStore::new(failing(), StoreConfig::default());
        let err = store.load_at(NOW).unwrap_err();
        assert!(matches!(err, SpatialError::DataSource(_)));
        assert_eq!(store.count(), 0);
        assert!(!store.is_loaded());
        assert!(store.refresh_at(true, NOW).is_err());
    }

    #[test]
    fn failed_fetch_falls_back_to_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RouteCache::new(dir.path().join("routes.json"), WEEK);
        let old = normalize_routes(vec![straight("old", 0.0, 500.0)], 10, 10);
        cache.write(&old, NOW - 30 * 86_400).unwrap();

        let store = RouteStore::new(failing(), cfg_with_cache(&dir));
        assert!(store.load_at(NOW).is_err());
        assert_eq!(store.count(), 1);
        assert_eq!(store.snapshot().origin(), SnapshotOrigin::StaleCache);
        assert!(!store.is_loaded());
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let up = Arc::new(AtomicUsize::new(1));
        let flag = Arc::clone(&up);
        let source = FnSource::new("flaky", move || {
            if flag.load(Ordering::SeqCst) == 1 {
                Ok(corpus())
            } else {
                Err(SourceError::Parse("garbled".into()))
            }
        });
        let store = RouteStore::new(source, StoreConfig::default());
        store.load_at(NOW).unwrap();
        let before = store.snapshot();

        up.store(0, Ordering::SeqCst);
        assert!(store.refresh_at(true, NOW).is_err());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("routes.json"), "{ not json").unwrap();
        let store = RouteStore::new(StaticSource::new(corpus()), cfg_with_cache(&dir));
        assert_eq!(store.load_at(NOW).unwrap(), 3);
    }

    #[test]
    fn unforced_refresh_prefers_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = RouteStore::new(StaticSource::new(corpus()), cfg_with_cache(&dir));
        store.refresh_at(true, NOW).unwrap();
        let report = store.refresh_at(false, NOW + 60).unwrap();
        assert_eq!(report.origin, SnapshotOrigin::Cache);
        assert_eq!(report.routes_loaded, 3);
    }

    #[test]
    fn snapshot_survives_refresh() {
        let store = RouteStore::new(StaticSource::new(corpus()), StoreConfig::default());
        store.load_at(NOW).unwrap();
        let held = store.snapshot();
        store.refresh_at(true, NOW).unwrap();
        assert!(!Arc::ptr_eq(&held, &store.snapshot()));
        assert_eq!(held.len(), 3);
    }
}

// ── Matcher ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod matcher {
    use tt_core::{RouteIdx, Timestamp, TransportType};

    use super::helpers::{bus_meta, l_shape, straight, ORIGIN};
    use crate::{normalize_routes, RouteMatcher, RouteSnapshot, SnapshotOrigin, StoreConfig};

    fn snapshot() -> RouteSnapshot {
        let raw = vec![
            straight("a", 0.0, 1_000.0).with_meta(bus_meta("BVG")),
            straight("b", 30.0, 1_000.0),
            l_shape("c"),
        ];
        let cfg = StoreConfig::default();
        let routes = normalize_routes(raw, cfg.fingerprint_prefix, cfg.max_routes);
        RouteSnapshot::build(routes, &cfg, SnapshotOrigin::Fetch, Timestamp(0))
    }

    #[test]
    fn vertex_matches() {
        let snap = snapshot();
        let m = RouteMatcher::default().match_point(&snap, ORIGIN.offset_m(0.0, 500.0)).unwrap();
        assert_eq!(m.route_id, "a");
        assert_eq!(m.transport, Some(TransportType::Bus));
        assert_eq!(m.operator.as_deref(), Some("BVG"));
    }

    #[test]
    fn overlapping_corridors_prefer_nearest_centreline() {
        let snap = snapshot();
        let m = RouteMatcher::default();
        // Between a (0 m) and b (30 m): inside both corridors.
        assert_eq!(m.match_point(&snap, ORIGIN.offset_m(18.0, 500.0)).unwrap().route_id, "b");
        assert_eq!(m.match_point(&snap, ORIGIN.offset_m(12.0, 500.0)).unwrap().route_id, "a");
    }

    #[test]
    fn off_route_is_not_matched() {
        let snap = snapshot();
        let m = RouteMatcher::default();
        assert!(!m.is_on_any_route(&snap, ORIGIN.offset_m(-100.0, 500.0)));
        assert!(!m.has_route_within(&snap, ORIGIN.offset_m(-150.0, 500.0)));
        assert!(m.has_route_within(&snap, ORIGIN.offset_m(-60.0, 500.0)));
    }

    #[test]
    fn empty_snapshot_matches_nothing() {
        let snap = RouteSnapshot::empty(&StoreConfig::default());
        let m = RouteMatcher::default();
        assert!(m.match_point(&snap, ORIGIN).is_none());
        assert!(m.nearby_routes(&snap, ORIGIN, 5_000.0).is_empty());
    }

    #[test]
    fn nearby_is_idempotent_and_sorted() {
        let snap = snapshot();
        let m = RouteMatcher::default();
        let at = ORIGIN.offset_m(100.0, 900.0);
        let first = m.nearby_routes(&snap, at, 500.0);
        let second = m.nearby_routes(&snap, at, 500.0);
        assert_eq!(first, second);
        let idx: Vec<RouteIdx> = first.iter().map(|s| s.idx).collect();
        assert_eq!(idx, vec![RouteIdx(0), RouteIdx(1), RouteIdx(2)]);
        assert!((first[0].distance_m - 100.0).abs() < 1e-6);
        assert_eq!(first[0].name.as_deref(), Some("Bus 100"));
    }

    #[test]
    fn corridor_is_memoised() {
        let snap = snapshot();
        let a = snap.corridor(RouteIdx(0)).unwrap() as *const _;
        let b = snap.corridor(RouteIdx(0)).unwrap() as *const _;
        assert_eq!(a, b);
        assert!(snap.corridor(RouteIdx(99)).is_none());
    }
}
