//! `TransitService`: the ping path and every read operation around it.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use tt_analytics::{
    leg_speeds_kmh, stop_frequency, AnalyticsStore, Classification, OperatorSummary, PatternAnalytics,
    PatternReport,
};
use tt_core::{Coordinate, RiderId, SessionId, Timeframe, Timestamp, TrackerConfig, TransportType, ValidationError};
use tt_session::{PingResult, PingState, Pruned, RiderStats, RouteHit, SessionTracker, TravelSession, TripRecord};
use tt_spatial::{RefreshReport, RouteMatch, RouteMatcher, RouteSnapshot, RouteSource, RouteStore, RouteSummary};

use crate::{RiderDirectory, ServiceError, ServiceResult, TripObserver};

/// Positions fed to the stop-spacing signal.
pub const RECENT_POINTS: usize = 5;

/// Confidence given to a route's declared transport type when the
/// classifier has no opinion.
pub const DECLARED_TYPE_CONFIDENCE: f64 = 0.5;

/// What a ping did, as reported to the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PingOutcome {
    pub on_transit:     bool,
    pub session_state:  PingState,
    pub duration_secs:  i64,
    pub distance_km:    f64,
    pub transport_type: TransportType,
    pub confidence:     f64,
    pub session_id:     Option<SessionId>,
    pub route_id:       Option<String>,
}

impl PingOutcome {
    fn from_result(on_transit: bool, result: &PingResult) -> Self {
        match &result.session {
            Some(s) => Self {
                on_transit,
                session_state:  result.state,
                duration_secs:  s.duration_secs,
                distance_km:    s.distance_km,
                transport_type: s.transport,
                confidence:     s.confidence,
                session_id:     Some(s.id),
                route_id:       s.route_id.clone(),
            },
            None => Self {
                on_transit,
                session_state:  result.state,
                duration_secs:  0,
                distance_km:    0.0,
                transport_type: TransportType::Unknown,
                confidence:     0.0,
                session_id:     None,
                route_id:       None,
            },
        }
    }
}

/// Ride detection for every rider, shared between request threads.
///
/// Built by [`TransitServiceBuilder`](crate::TransitServiceBuilder).
pub struct TransitService<S: RouteSource> {
    pub(crate) config:          TrackerConfig,
    pub(crate) store:           RouteStore<S>,
    pub(crate) matcher:         RouteMatcher,
    pub(crate) tracker:         SessionTracker,
    pub(crate) analytics:       Mutex<PatternAnalytics>,
    pub(crate) analytics_store: Option<Box<dyn AnalyticsStore>>,
    /// Serialises snapshot-then-save so saves land in order.
    pub(crate) save_lock:       Mutex<()>,
    pub(crate) directory:       Box<dyn RiderDirectory>,
    pub(crate) observer:        Box<dyn TripObserver>,
}

impl<S: RouteSource> TransitService<S> {
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &RouteStore<S> {
        &self.store
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    // ── Ping path ─────────────────────────────────────────────────────────

    /// Validate and apply one ping.
    ///
    /// `timestamp` is RFC 3339 or unix seconds; `None` means now.  Every
    /// [`ValidationError`] is raised before any state changes.
    pub fn process_ping(
        &self,
        rider:     &str,
        lat:       f64,
        lon:       f64,
        timestamp: Option<&str>,
    ) -> ServiceResult<PingOutcome> {
        let rider: RiderId = rider.parse()?;
        let at = Coordinate::new(lat, lon)?;
        let now = match timestamp {
            Some(ts) => Timestamp::parse(ts)?,
            None => Timestamp::now(),
        };
        self.process_ping_at(rider, at, now)
    }

    /// [`process_ping`](Self::process_ping) with parsed inputs.
    pub fn process_ping_at(&self, rider: RiderId, at: Coordinate, now: Timestamp) -> ServiceResult<PingOutcome> {
        if !self.directory.contains(rider) {
            return Err(ValidationError::UnknownRider(rider).into());
        }

        let snap = self.store.snapshot();
        let matched = self.matcher.match_point(&snap, at);
        let hit = matched.as_ref().map(|m| RouteHit { route_id: m.route_id.clone() });

        let result = self
            .tracker
            .process(rider, at, now, hit, |session| self.classify_session(session, matched.as_ref()))?;

        if let (Some(m), Some(session)) = (&matched, &result.session) {
            self.analytics()?.record_usage(&m.route_id, m.operator.as_deref(), session.transport, now);
        }

        let mut outcome = PingOutcome::from_result(matched.is_some(), &result);

        let finished: Vec<&TripRecord> = result.finished_trips().collect();
        if !finished.is_empty() {
            {
                let mut analytics = self.analytics()?;
                for trip in &finished {
                    learn_from_trip(&mut analytics, &snap, trip);
                }
            }
            if let Err(e) = self.save_analytics() {
                warn!(rider = %rider, error = %e, "cannot persist analytics after trip");
                if result.ended.is_some() {
                    outcome.session_state = PingState::Error;
                }
            }
            for trip in finished {
                self.observer.on_trip_finished(trip);
            }
        }

        debug!(
            rider = %rider,
            on_transit = outcome.on_transit,
            state = %outcome.session_state,
            transport = %outcome.transport_type,
            "ping processed"
        );
        Ok(outcome)
    }

    /// Classifier verdict for an active session, falling back to the matched
    /// route's declared type.
    fn classify_session(&self, session: &TravelSession, matched: Option<&RouteMatch>) -> (TransportType, f64) {
        let verdict = match self.analytics() {
            Ok(analytics) => analytics.classify(session.average_speed_kmh(), &session.recent(RECENT_POINTS)),
            Err(e) => {
                warn!(session = %session.id, error = %e, "classification skipped");
                Classification::UNKNOWN
            }
        };
        if verdict.is_known() {
            return (verdict.transport, verdict.confidence);
        }
        match matched.and_then(|m| m.transport) {
            Some(declared) => (declared, DECLARED_TYPE_CONFIDENCE),
            None => (TransportType::Unknown, 0.0),
        }
    }

    // ── Routes ────────────────────────────────────────────────────────────

    /// Load the route corpus if it is not loaded yet; returns the count.
    pub fn load_routes(&self) -> ServiceResult<usize> {
        Ok(self.store.load()?)
    }

    /// Rebuild the route corpus.  `force` bypasses a fresh cache.
    pub fn refresh_route_cache(&self, force: bool) -> ServiceResult<RefreshReport> {
        let report = self.store.refresh(force)?;
        self.observer.on_routes_refreshed(&report);
        Ok(report)
    }

    /// Candidate routes within `radius_m` of a point.
    pub fn nearby_routes(&self, lat: f64, lon: f64, radius_m: f64) -> ServiceResult<Vec<RouteSummary>> {
        let at = Coordinate::new(lat, lon)?;
        Ok(self.matcher.nearby_routes(&self.store.snapshot(), at, radius_m))
    }

    /// Transport type at a point.  Unknown unless a route lies within the
    /// classification radius.
    pub fn classify_transport_type(
        &self,
        lat:       f64,
        lon:       f64,
        speed_kmh: Option<f64>,
        recent:    &[Coordinate],
    ) -> ServiceResult<Classification> {
        let at = Coordinate::new(lat, lon)?;
        if !self.matcher.has_route_within(&self.store.snapshot(), at) {
            return Ok(Classification::UNKNOWN);
        }
        Ok(self.analytics()?.classify(speed_kmh, recent))
    }

    // ── Analytics ─────────────────────────────────────────────────────────

    pub fn popular_routes(&self, limit: usize) -> ServiceResult<Vec<(String, u64)>> {
        Ok(self.analytics()?.popular_routes(limit))
    }

    pub fn operator_stats(&self) -> ServiceResult<BTreeMap<String, BTreeMap<TransportType, u64>>> {
        Ok(self.analytics()?.operator_stats())
    }

    pub fn operator_summary(&self) -> ServiceResult<OperatorSummary> {
        Ok(self.analytics()?.operator_summary())
    }

    pub fn pattern_report(&self) -> ServiceResult<PatternReport> {
        Ok(self.analytics()?.pattern_report())
    }

    /// Persist analytics now.  A no-op without an analytics store.
    pub fn flush(&self) -> ServiceResult<()> {
        self.save_analytics()
    }

    fn save_analytics(&self) -> ServiceResult<()> {
        let Some(store) = &self.analytics_store else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().map_err(|_| ServiceError::Concurrency("analytics save"))?;
        let snapshot = self.analytics()?.snapshot();
        store.save(&snapshot)?;
        Ok(())
    }

    fn analytics(&self) -> ServiceResult<MutexGuard<'_, PatternAnalytics>> {
        self.analytics.lock().map_err(|_| ServiceError::Concurrency("analytics"))
    }

    // ── Riders ────────────────────────────────────────────────────────────

    /// Travel totals for a rider over `timeframe`, as of now.
    pub fn rider_stats(&self, rider: &str, timeframe: Timeframe) -> ServiceResult<RiderStats> {
        self.rider_stats_at(rider.parse()?, timeframe, Timestamp::now())
    }

    pub fn rider_stats_at(&self, rider: RiderId, timeframe: Timeframe, now: Timestamp) -> ServiceResult<RiderStats> {
        Ok(self.tracker.rider_stats(rider, timeframe, now)?)
    }

    /// The rider's finished trips, oldest first.
    pub fn trips(&self, rider: RiderId) -> Vec<TripRecord> {
        self.tracker.trips(rider)
    }

    /// Forget trips that ended before `cutoff` and riders idle since then.
    /// Analytics counters are kept.
    pub fn prune_riders(&self, cutoff: Timestamp) -> Pruned {
        let pruned = self.tracker.prune(cutoff);
        info!(riders = pruned.riders, trips = pruned.trips, "rider history pruned");
        pruned
    }
}

/// Fold a finished trip's leg speeds into the pattern of its type.
fn learn_from_trip(analytics: &mut PatternAnalytics, snap: &RouteSnapshot, trip: &TripRecord) {
    if !trip.transport.is_known() {
        return;
    }
    let speeds = leg_speeds_kmh(&trip.timed_path());
    if speeds.is_empty() {
        return;
    }
    let fingerprint = trip
        .route_id
        .as_deref()
        .and_then(|id| snap.routes().iter().find(|r| r.id == id))
        .map(|r| r.fingerprint.as_str());
    analytics.learn(trip.transport, &speeds, stop_frequency(&speeds), fingerprint);
}
