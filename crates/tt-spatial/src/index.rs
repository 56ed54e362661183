//! Grid spatial index over route bounding boxes.
//!
//! # Data layout
//!
//! The plane is cut into square cells of `cell_deg` degrees.  Cell
//! `(floor(lat / cell), floor(lon / cell))` lists every route whose bounding
//! box touches it:
//!
//! ```text
//! cells[(r, c)] = [RouteIdx, RouteIdx, ...]   (ascending, no duplicates)
//! ```
//!
//! A query visits the cells covering the square around the search disc,
//! unions their lists, then applies the exact [`distance_deg`] filter.  The
//! index only ever prunes, so its answer is identical to [`linear_scan`] with
//! the same predicate.
//!
//! The index is rebuilt wholesale whenever the route corpus changes.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use tt_core::{Coordinate, RouteIdx, METERS_PER_DEGREE};

use crate::geometry::distance_deg;
use crate::route::{Bounds, Route};

type Cell = (i32, i32);

// ── GridIndex ─────────────────────────────────────────────────────────────────

/// Fixed-size cell buckets mapping grid cells to route indices.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_deg: f64,
    cells:    FxHashMap<Cell, Vec<RouteIdx>>,
}

impl GridIndex {
    /// An index with no routes.
    pub fn empty(cell_deg: f64) -> Self {
        Self { cell_deg, cells: FxHashMap::default() }
    }

    /// Build the index for `routes`; `RouteIdx(i)` refers to `routes[i]`.
    pub fn build(routes: &[Route], cell_deg: f64) -> Self {
        let per_route = route_cells(routes, cell_deg);

        let mut cells: FxHashMap<Cell, Vec<RouteIdx>> = FxHashMap::default();
        for (i, route_cells) in per_route.into_iter().enumerate() {
            let idx = RouteIdx(i as u32);
            for cell in route_cells {
                cells.entry(cell).or_default().push(idx);
            }
        }

        info!(routes = routes.len(), cells = cells.len(), cell_deg, "built route grid index");
        Self { cell_deg, cells }
    }

    pub fn cell_deg(&self) -> f64 {
        self.cell_deg
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Routes indexed under the cell containing `at`.
    pub fn cell_routes(&self, at: Coordinate) -> &[RouteIdx] {
        let key = (cell_of(at.lat, self.cell_deg), cell_of(at.lon, self.cell_deg));
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of routes within `radius_m` of `at`, ascending.
    ///
    /// Coordinates are expected in range; the caller validates them.
    pub fn query(&self, routes: &[Route], at: Coordinate, radius_m: f64) -> Vec<RouteIdx> {
        if routes.is_empty() || !(radius_m >= 0.0) {
            return Vec::new();
        }
        let r_deg = radius_m / METERS_PER_DEGREE;

        let lat_lo = cell_of(at.lat - r_deg, self.cell_deg);
        let lat_hi = cell_of(at.lat + r_deg, self.cell_deg);
        let lon_lo = cell_of(at.lon - r_deg, self.cell_deg);
        let lon_hi = cell_of(at.lon + r_deg, self.cell_deg);

        let mut seen: FxHashSet<RouteIdx> = FxHashSet::default();
        for r in lat_lo..=lat_hi {
            for c in lon_lo..=lon_hi {
                if let Some(list) = self.cells.get(&(r, c)) {
                    seen.extend(list.iter().copied());
                }
            }
        }

        let mut hits: Vec<RouteIdx> = seen
            .into_iter()
            .filter(|idx| {
                routes
                    .get(idx.index())
                    .is_some_and(|route| within(route, at, r_deg))
            })
            .collect();
        hits.sort_unstable();
        hits
    }
}

/// Brute-force reference for [`GridIndex::query`]: same predicate, every
/// route visited.
pub fn linear_scan(routes: &[Route], at: Coordinate, radius_m: f64) -> Vec<RouteIdx> {
    if !(radius_m >= 0.0) {
        return Vec::new();
    }
    let r_deg = radius_m / METERS_PER_DEGREE;
    routes
        .iter()
        .enumerate()
        .filter(|(_, route)| within(route, at, r_deg))
        .map(|(i, _)| RouteIdx(i as u32))
        .collect()
}

// ── Helpers ───────────────────────────────────────────────────────────────────

#[inline]
fn cell_of(deg: f64, cell_deg: f64) -> i32 {
    (deg / cell_deg).floor() as i32
}

#[inline]
fn within(route: &Route, at: Coordinate, r_deg: f64) -> bool {
    distance_deg(at, &route.points) <= r_deg
}

fn bbox_cells(bounds: &Bounds, cell_deg: f64) -> Vec<Cell> {
    let (r0, r1) = (cell_of(bounds.min.lat, cell_deg), cell_of(bounds.max.lat, cell_deg));
    let (c0, c1) = (cell_of(bounds.min.lon, cell_deg), cell_of(bounds.max.lon, cell_deg));
    let mut out = Vec::with_capacity(((r1 - r0 + 1) * (c1 - c0 + 1)) as usize);
    for r in r0..=r1 {
        for c in c0..=c1 {
            out.push((r, c));
        }
    }
    out
}

#[cfg(not(feature = "parallel"))]
fn route_cells(routes: &[Route], cell_deg: f64) -> Vec<Vec<Cell>> {
    routes.iter().map(|r| bbox_cells(&r.bounds, cell_deg)).collect()
}

#[cfg(feature = "parallel")]
fn route_cells(routes: &[Route], cell_deg: f64) -> Vec<Vec<Cell>> {
    use rayon::prelude::*;
    routes.par_iter().map(|r| bbox_cells(&r.bounds, cell_deg)).collect()
}
