//! Point-to-route matching against a [`RouteSnapshot`].
//!
//! Matching is two-phase: the grid index narrows the corpus to routes within
//! `match_radius_m`, then each candidate's corridor decides containment.  A
//! route whose corridor cannot be built is skipped, so matching never fails;
//! the worst case is "not on transit".

use tt_core::{Coordinate, RouteIdx, TrackerConfig, TransportType, METERS_PER_DEGREE};

use crate::geometry::distance_deg;
use crate::store::RouteSnapshot;

/// A candidate route near a point.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub idx:        RouteIdx,
    pub id:         String,
    pub name:       Option<String>,
    pub operator:   Option<String>,
    pub transport:  Option<TransportType>,
    pub reference:  Option<String>,
    /// Planar distance to the route centreline, metres.
    pub distance_m: f64,
}

/// The route whose corridor contains a point.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub route:       RouteIdx,
    pub route_id:    String,
    pub transport:   Option<TransportType>,
    pub operator:    Option<String>,
    pub fingerprint: String,
}

/// Radii for candidate search and classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteMatcher {
    pub match_radius_m:    f64,
    pub classify_radius_m: f64,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for RouteMatcher {
    fn from(cfg: &TrackerConfig) -> Self {
        Self {
            match_radius_m:    cfg.match_radius_m,
            classify_radius_m: cfg.classify_radius_m,
        }
    }
}

impl RouteMatcher {
    /// Candidate routes within `radius_m`, ascending by route index.
    pub fn nearby_routes(&self, snap: &RouteSnapshot, at: Coordinate, radius_m: f64) -> Vec<RouteSummary> {
        snap.nearby(at, radius_m)
            .into_iter()
            .filter_map(|idx| {
                let route = snap.route(idx)?;
                Some(RouteSummary {
                    idx,
                    id:         route.id.clone(),
                    name:       route.meta.name.clone(),
                    operator:   route.meta.operator.clone(),
                    transport:  route.transport(),
                    reference:  route.meta.reference.clone(),
                    distance_m: distance_deg(at, &route.points) * METERS_PER_DEGREE,
                })
            })
            .collect()
    }

    /// The route whose corridor contains `at`.
    ///
    /// When several corridors overlap, the route with the nearest
    /// centreline wins; ties go to the lower index.
    pub fn match_point(&self, snap: &RouteSnapshot, at: Coordinate) -> Option<RouteMatch> {
        let mut best: Option<(f64, RouteIdx)> = None;
        for idx in snap.nearby(at, self.match_radius_m) {
            let Some(corridor) = snap.corridor(idx) else { continue };
            if !corridor.contains(at) {
                continue;
            }
            let Some(route) = snap.route(idx) else { continue };
            let d = distance_deg(at, &route.points);
            if best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, idx));
            }
        }

        let (_, idx) = best?;
        let route = snap.route(idx)?;
        Some(RouteMatch {
            route:       idx,
            route_id:    route.id.clone(),
            transport:   route.transport(),
            operator:    route.meta.operator.clone(),
            fingerprint: route.fingerprint.clone(),
        })
    }

    pub fn is_on_any_route(&self, snap: &RouteSnapshot, at: Coordinate) -> bool {
        self.match_point(snap, at).is_some()
    }

    /// `true` if any route centreline lies within the classification radius.
    pub fn has_route_within(&self, snap: &RouteSnapshot, at: Coordinate) -> bool {
        !snap.nearby(at, self.classify_radius_m).is_empty()
    }
}
