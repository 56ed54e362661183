//! Route records: raw provider output, validated routes and fingerprints.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tt_core::{Coordinate, TransportType};

use crate::GeometryError;

/// Quantisation applied before fingerprinting: 1e-5 degrees ≈ 1 m.
const FINGERPRINT_SCALE: f64 = 1e5;

// ── RouteMeta ─────────────────────────────────────────────────────────────────

/// Optional descriptive metadata a provider may attach to a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteMeta {
    pub transport: Option<TransportType>,
    pub operator:  Option<String>,
    pub name:      Option<String>,
    /// Line number or short code shown on vehicles ("M10", "S41").
    pub reference: Option<String>,
}

// ── RawRoute ──────────────────────────────────────────────────────────────────

/// Unvalidated route geometry as returned by a [`RouteSource`][crate::RouteSource]
/// or read back from the cache.  Points are `[lat, lon]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRoute {
    #[serde(default)]
    pub id:     Option<String>,
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub meta:   RouteMeta,
}

impl RawRoute {
    pub fn new(id: impl Into<String>, points: Vec<[f64; 2]>) -> Self {
        Self { id: Some(id.into()), points, meta: RouteMeta::default() }
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl From<&Route> for RawRoute {
    fn from(route: &Route) -> Self {
        Self {
            id:     Some(route.id.clone()),
            points: route.points.iter().map(|c| [c.lat, c.lon]).collect(),
            meta:   route.meta.clone(),
        }
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Bounds {
    /// Bounding box of a non-empty point list.
    fn of(points: &[Coordinate]) -> Bounds {
        let mut b = Bounds { min: points[0], max: points[0] };
        for p in &points[1..] {
            b.min.lat = b.min.lat.min(p.lat);
            b.min.lon = b.min.lon.min(p.lon);
            b.max.lat = b.max.lat.max(p.lat);
            b.max.lon = b.max.lon.max(p.lon);
        }
        b
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A validated, immutable route of the loaded corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id:          String,
    pub points:      Vec<Coordinate>,
    pub meta:        RouteMeta,
    /// Geometry fingerprint over the leading coordinates (see [`fingerprint`]).
    pub fingerprint: String,
    pub bounds:      Bounds,
}

impl Route {
    /// Validate a raw route.  Routes without an id are named after their
    /// fingerprint.
    pub fn from_raw(raw: RawRoute, prefix: usize) -> Result<Route, GeometryError> {
        if raw.points.len() < 2 {
            return Err(GeometryError::Degenerate { points: raw.points.len() });
        }
        let points = raw
            .points
            .iter()
            .enumerate()
            .map(|(index, &[lat, lon])| {
                Coordinate::new(lat, lon)
                    .map_err(|_| GeometryError::InvalidCoordinate { index, lat, lon })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fingerprint = fingerprint(&points, prefix);
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("route-{fingerprint}"));
        let bounds = Bounds::of(&points);

        Ok(Route { id, points, meta: raw.meta, fingerprint, bounds })
    }

    /// Declared transport type, if the provider supplied a recognised one.
    pub fn transport(&self) -> Option<TransportType> {
        self.meta.transport.filter(|t| t.is_known())
    }
}

/// Deterministic 64-bit fingerprint of the first `prefix` coordinates,
/// quantised to ~1 m, as 16 hex digits.
///
/// Two routes whose leading vertices agree to within a metre share a
/// fingerprint and are treated as duplicates.
pub fn fingerprint(points: &[Coordinate], prefix: usize) -> String {
    let mut hasher = FxHasher::default();
    for p in points.iter().take(prefix) {
        ((p.lat * FINGERPRINT_SCALE).round() as i64).hash(&mut hasher);
        ((p.lon * FINGERPRINT_SCALE).round() as i64).hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}

/// Validate, deduplicate and cap a batch of raw routes.
///
/// Degenerate or corrupt routes are logged and skipped.  The first route
/// with a given fingerprint wins; later near-identical ones are dropped.
/// Route ids are unique too: a later route reusing an id is dropped with a
/// warning.  At most `max_routes` routes are returned, in input order.
pub fn normalize_routes(raw: Vec<RawRoute>, prefix: usize, max_routes: usize) -> Vec<Route> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut ids: FxHashSet<String> = FxHashSet::default();
    let mut routes = Vec::with_capacity(raw.len().min(max_routes));

    for (i, raw_route) in raw.into_iter().enumerate() {
        if routes.len() >= max_routes {
            break;
        }
        let label = raw_route.id.clone().unwrap_or_else(|| format!("#{i}"));
        match Route::from_raw(raw_route, prefix) {
            Ok(route) => {
                if ids.contains(&route.id) {
                    warn!(route = %route.id, "skipping route with duplicate id");
                } else if seen.insert(route.fingerprint.clone()) {
                    ids.insert(route.id.clone());
                    routes.push(route);
                }
            }
            Err(e) => warn!(route = %label, error = %e, "skipping route"),
        }
    }
    routes
}
