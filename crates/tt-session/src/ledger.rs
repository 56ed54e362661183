//! Finished trips per rider and the statistics derived from them.

use serde::{Deserialize, Serialize};

use tt_core::{Timeframe, Timestamp};

use crate::TripRecord;

/// A rider's finished trips in completion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TripLedger {
    trips: Vec<TripRecord>,
}

impl TripLedger {
    pub fn push(&mut self, trip: TripRecord) {
        self.trips.push(trip);
    }

    pub fn trips(&self) -> &[TripRecord] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Drop trips that ended before `cutoff`; returns how many went.
    pub fn retain_since(&mut self, cutoff: Timestamp) -> usize {
        let before = self.trips.len();
        self.trips.retain(|t| t.ended_at >= cutoff);
        before - self.trips.len()
    }

    /// Totals over trips started inside `timeframe` as seen at `now`.
    pub fn stats(&self, timeframe: Timeframe, now: Timestamp) -> RiderStats {
        let since = timeframe.since(now);
        let mut stats = RiderStats { timeframe, ..RiderStats::default() };
        for trip in self.trips.iter().filter(|t| since.is_none_or(|s| t.started_at >= s)) {
            stats.trips += 1;
            stats.total_duration_min += trip.duration_secs as f64 / 60.0;
            stats.total_distance_km += trip.distance_km;
        }
        if stats.trips > 0 {
            stats.avg_duration_min = stats.total_duration_min / stats.trips as f64;
            stats.avg_distance_km = stats.total_distance_km / stats.trips as f64;
        }
        stats
    }
}

/// Travel totals for one rider and timeframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiderStats {
    pub timeframe:          Timeframe,
    pub trips:              usize,
    pub total_duration_min: f64,
    pub total_distance_km:  f64,
    pub avg_duration_min:   f64,
    pub avg_distance_km:    f64,
}
