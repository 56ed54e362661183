//! Plain data row types written by output backends.

use tt_session::TripRecord;

/// One finished trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRow {
    pub session_id:    u64,
    pub rider_id:      u64,
    pub started_at:    i64,
    pub ended_at:      i64,
    pub duration_secs: i64,
    pub distance_km:   f64,
    /// Lower-case transport tag, `"unknown"` when unclassified.
    pub transport:     &'static str,
    pub confidence:    f64,
    /// Empty when the trip never matched a named route.
    pub route_id:      String,
    /// `"ended"` or `"lapsed"`.
    pub finish:        &'static str,
    pub points:        u32,
}

/// One recorded position of a trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripPointRow {
    pub session_id: u64,
    pub seq:        u32,
    pub unix_secs:  i64,
    pub lat:        f64,
    pub lon:        f64,
}

impl TripRow {
    pub fn from_trip(trip: &TripRecord) -> Self {
        Self {
            session_id:    trip.session_id.0,
            rider_id:      trip.rider.0,
            started_at:    trip.started_at.0,
            ended_at:      trip.ended_at.0,
            duration_secs: trip.duration_secs,
            distance_km:   trip.distance_km,
            transport:     trip.transport.as_str(),
            confidence:    trip.confidence,
            route_id:      trip.route_id.clone().unwrap_or_default(),
            finish:        trip.finish.as_str(),
            points:        trip.path.len() as u32,
        }
    }
}

impl TripPointRow {
    /// Every path point of `trip`, in order.
    pub fn from_trip(trip: &TripRecord) -> Vec<Self> {
        trip.path
            .iter()
            .enumerate()
            .map(|(seq, p)| Self {
                session_id: trip.session_id.0,
                seq:        seq as u32,
                unix_secs:  p.at.0,
                lat:        p.coord.lat,
                lon:        p.coord.lon,
            })
            .collect()
    }
}
