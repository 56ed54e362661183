//! Polyline resampling, corridor buffering and point tests.
//!
//! # Corridor construction
//!
//! A corridor is the set of points within `width` of a route polyline.  It is
//! assembled as a [`MultiPolygon`] of simple pieces rather than a single
//! unioned outline:
//!
//! ```text
//!   ○━━━━━━━━━━━○━━━━━━━━━━○      ○  join / cap: regular 16-gon around a vertex
//!   ┃  segment  ┃          ┃      ━  segment: rectangle of half-width `width`
//! ```
//!
//! Point-in-corridor is "point in any piece", so no polygon union is ever
//! needed.  The join polygons circumscribe the true disc, which makes the
//! corridor at most ~2 % wider than `width` at bends and never narrower.
//!
//! Resampled points that lie on the same straight run are merged back before
//! buffering, so a 10 m resampling step does not multiply the piece count.

use geo::{coord, BoundingRect, Intersects, LineString, MultiPolygon, Point, Polygon, Rect};

use tt_core::{Coordinate, METERS_PER_DEGREE};

use crate::GeometryError;

/// Sides of the polygon approximating a round join or cap.
const JOIN_SIDES: usize = 16;

/// Sine of the largest direction change still treated as "straight".
const COLLINEAR_EPS: f64 = 1e-9;

// ── Corridor ──────────────────────────────────────────────────────────────────

/// A route buffered into a polygon corridor.
#[derive(Debug, Clone)]
pub struct Corridor {
    polygon: MultiPolygon<f64>,
    bounds:  Rect<f64>,
}

impl Corridor {
    /// Boundary-inclusive containment test.
    pub fn contains(&self, at: Coordinate) -> bool {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        if at.lon < min.x || at.lon > max.x || at.lat < min.y || at.lat > max.y {
            return false;
        }
        contains(&self.polygon, at)
    }

    pub fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    /// Number of simple polygons (segment rectangles plus joins).
    pub fn piece_count(&self) -> usize {
        self.polygon.0.len()
    }
}

// ── Public helpers ────────────────────────────────────────────────────────────

/// Resample a polyline to approximately `step_m` spacing.
///
/// Points are placed at equal fractions of the planar length, so the first
/// and last input coordinates are always preserved exactly.  A zero-length
/// polyline resamples to its two (identical) endpoints.
pub fn interpolate(points: &[Coordinate], step_m: f64) -> Result<Vec<Coordinate>, GeometryError> {
    if points.len() < 2 {
        return Err(GeometryError::Degenerate { points: points.len() });
    }
    if !(step_m.is_finite() && step_m > 0.0) {
        return Err(GeometryError::InvalidStep(step_m));
    }

    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += planar(pair[0], pair[1]);
        cumulative.push(total);
    }

    let step_deg = step_m / METERS_PER_DEGREE;
    let n = ((total / step_deg).ceil() as usize).max(1);
    let last_seg = points.len() - 2;

    let mut out = Vec::with_capacity(n + 1);
    let mut seg = 0;
    for i in 0..=n {
        let target = total * i as f64 / n as f64;
        while seg < last_seg && cumulative[seg + 1] < target {
            seg += 1;
        }
        let seg_len = cumulative[seg + 1] - cumulative[seg];
        let t = if seg_len > 0.0 {
            ((target - cumulative[seg]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(lerp(points[seg], points[seg + 1], t));
    }

    out[0] = points[0];
    out[n] = points[points.len() - 1];
    Ok(out)
}

/// Buffer a route into a corridor of `width_m` on each side, after
/// resampling it every `step_m`.  Deterministic for identical input.
pub fn buffer(points: &[Coordinate], width_m: f64, step_m: f64) -> Result<Corridor, GeometryError> {
    let line = interpolate(points, step_m)?;
    let vertices = merge_straight_runs(&line);
    let half = width_m / METERS_PER_DEGREE;

    let mut pieces: Vec<Polygon<f64>> = Vec::with_capacity(vertices.len() * 2);
    for pair in vertices.windows(2) {
        if let Some(rect) = segment_rect(pair[0], pair[1], half) {
            pieces.push(rect);
        }
    }
    for &v in &vertices {
        pieces.push(join_polygon(v, half));
    }

    let polygon = MultiPolygon::new(pieces);
    let bounds = polygon.bounding_rect().ok_or(GeometryError::EmptyCorridor)?;
    Ok(Corridor { polygon, bounds })
}

/// Boundary-inclusive point-in-polygon test.
pub fn contains(polygon: &MultiPolygon<f64>, at: Coordinate) -> bool {
    let p = Point::new(at.lon, at.lat);
    polygon.0.iter().any(|piece| piece.intersects(&p))
}

/// Planar distance in degrees from `at` to the nearest point of `polyline`.
///
/// A single-point "polyline" degenerates to point distance; an empty one is
/// infinitely far away.
pub fn distance_deg(at: Coordinate, polyline: &[Coordinate]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => planar(at, *only),
        _ => polyline
            .windows(2)
            .map(|pair| segment_distance(at, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

// ── Internals ─────────────────────────────────────────────────────────────────

#[inline]
fn planar(a: Coordinate, b: Coordinate) -> f64 {
    (b.lat - a.lat).hypot(b.lon - a.lon)
}

#[inline]
fn lerp(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate {
        lat: a.lat + (b.lat - a.lat) * t,
        lon: a.lon + (b.lon - a.lon) * t,
    }
}

fn segment_distance(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return planar(p, a);
    }
    let t = (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / len2).clamp(0.0, 1.0);
    planar(p, lerp(a, b, t))
}

/// Drop consecutive duplicates and interior points that do not change the
/// polyline's direction.  Endpoints are always kept.
fn merge_straight_runs(line: &[Coordinate]) -> Vec<Coordinate> {
    let mut out: Vec<Coordinate> = Vec::with_capacity(line.len());
    for (i, &p) in line.iter().enumerate() {
        if out.last().is_some_and(|&last| last == p) {
            continue;
        }
        let is_last = i + 1 == line.len();
        if !is_last && out.len() >= 1 {
            let prev = out[out.len() - 1];
            let next = line[i + 1];
            if next != p && is_straight(prev, p, next) {
                continue;
            }
        }
        out.push(p);
    }
    out
}

/// `true` when `a → b → c` continues in the same direction.
fn is_straight(a: Coordinate, b: Coordinate, c: Coordinate) -> bool {
    let (ux, uy) = (b.lon - a.lon, b.lat - a.lat);
    let (vx, vy) = (c.lon - b.lon, c.lat - b.lat);
    let norm = ux.hypot(uy) * vx.hypot(vy);
    if norm == 0.0 {
        return false;
    }
    let cross = (ux * vy - uy * vx) / norm;
    let dot = ux * vx + uy * vy;
    cross.abs() <= COLLINEAR_EPS && dot > 0.0
}

fn segment_rect(a: Coordinate, b: Coordinate, half: f64) -> Option<Polygon<f64>> {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    // Unit normal scaled to the half-width.
    let (nx, ny) = (-dy / len * half, dx / len * half);
    let ring = LineString::new(vec![
        coord! { x: a.lon + nx, y: a.lat + ny },
        coord! { x: b.lon + nx, y: b.lat + ny },
        coord! { x: b.lon - nx, y: b.lat - ny },
        coord! { x: a.lon - nx, y: a.lat - ny },
        coord! { x: a.lon + nx, y: a.lat + ny },
    ]);
    Some(Polygon::new(ring, vec![]))
}

fn join_polygon(center: Coordinate, half: f64) -> Polygon<f64> {
    let step = std::f64::consts::TAU / JOIN_SIDES as f64;
    // Circumscribe the disc so the polygon never undercuts `half`.
    let r = half / (step / 2.0).cos();
    let mut ring: Vec<_> = (0..JOIN_SIDES)
        .map(|k| {
            let theta = step * k as f64;
            coord! { x: center.lon + r * theta.cos(), y: center.lat + r * theta.sin() }
        })
        .collect();
    ring.push(ring[0]);
    Polygon::new(LineString::new(ring), vec![])
}
