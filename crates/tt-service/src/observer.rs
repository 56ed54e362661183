//! Trip observer trait for reward hand-off and data collection.

use tt_session::TripRecord;
use tt_spatial::RefreshReport;

/// Callbacks invoked by [`TransitService`][crate::TransitService] as trips
/// finish and the route corpus changes.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  The service is shared between threads,
/// so callbacks take `&self`; implementors that write somewhere keep their
/// own lock.
///
/// # Example: reward hand-off
///
/// ```rust,ignore
/// struct Rewards { queue: Mutex<Vec<TripRecord>> }
///
/// impl TripObserver for Rewards {
///     fn on_trip_finished(&self, trip: &TripRecord) {
///         self.queue.lock().unwrap().push(trip.clone());
///     }
/// }
/// ```
pub trait TripObserver: Send + Sync {
    /// Called once per finished trip, whether it ended on an off-route ping
    /// or lapsed.  Runs after the rider's lock has been released.
    fn on_trip_finished(&self, _trip: &TripRecord) {}

    /// Called after a successful `refresh_route_cache`.
    fn on_routes_refreshed(&self, _report: &RefreshReport) {}
}

/// A [`TripObserver`] that does nothing.
pub struct NoopObserver;

impl TripObserver for NoopObserver {}

impl<T: TripObserver + ?Sized> TripObserver for std::sync::Arc<T> {
    fn on_trip_finished(&self, trip: &TripRecord) {
        (**self).on_trip_finished(trip);
    }

    fn on_routes_refreshed(&self, report: &RefreshReport) {
        (**self).on_routes_refreshed(report);
    }
}
