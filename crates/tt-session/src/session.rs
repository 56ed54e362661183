//! Travel sessions and the trip records they finish as.

use serde::{Deserialize, Serialize};

use tt_core::{path_length_km, Coordinate, RiderId, SessionId, Timestamp, TransportType};

use crate::Phase;

/// One accepted ping of a session.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub coord: Coordinate,
    pub at:    Timestamp,
}

/// A rider's ride, from the first on-route ping until it ends, is discarded
/// or lapses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TravelSession {
    pub id:            SessionId,
    pub rider:         RiderId,
    pub started_at:    Timestamp,
    pub last_update:   Timestamp,
    pub path:          Vec<TrackPoint>,
    pub duration_secs: i64,
    pub distance_km:   f64,
    /// Route of the most recent on-route match.
    pub route_id:      Option<String>,
    pub transport:     TransportType,
    pub confidence:    f64,
    pub phase:         Phase,
}

impl TravelSession {
    pub fn start(id: SessionId, rider: RiderId, at: Coordinate, now: Timestamp, route_id: Option<String>) -> Self {
        Self {
            id,
            rider,
            started_at:    now,
            last_update:   now,
            path:          vec![TrackPoint { coord: at, at: now }],
            duration_secs: 0,
            distance_km:   0.0,
            route_id,
            transport:     TransportType::Unknown,
            confidence:    0.0,
            phase:         Phase::Active,
        }
    }

    /// Append an on-route ping.  Distance is the path sum; duration is
    /// measured from the start.
    pub fn extend(&mut self, at: Coordinate, now: Timestamp, route_id: Option<String>) {
        self.path.push(TrackPoint { coord: at, at: now });
        self.last_update = now;
        self.duration_secs = now.secs_since(self.started_at);
        self.distance_km = path_length_km(self.path.iter().map(|p| p.coord));
        if route_id.is_some() {
            self.route_id = route_id;
        }
    }

    /// Close the session at `end`.
    pub fn close(&mut self, end: Timestamp, phase: Phase) {
        self.duration_secs = end.secs_since(self.started_at);
        self.phase = phase;
    }

    /// The most recent `n` positions, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Coordinate> {
        let skip = self.path.len().saturating_sub(n);
        self.path[skip..].iter().map(|p| p.coord).collect()
    }

    /// Average speed over the session so far, km/h; `None` before any time
    /// has elapsed.
    pub fn average_speed_kmh(&self) -> Option<f64> {
        let secs = self.last_update.secs_since(self.started_at);
        (secs > 0).then(|| self.distance_km / (secs as f64 / 3_600.0))
    }
}

/// How a trip was closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishKind {
    /// An off-route ping inside the end-grace window.
    Ended,
    /// The rider's next ping came too late; closed at the last update.
    Lapsed,
}

impl FinishKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FinishKind::Ended  => "ended",
            FinishKind::Lapsed => "lapsed",
        }
    }
}

/// A finished, valid session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub rider:         RiderId,
    pub session_id:    SessionId,
    pub started_at:    Timestamp,
    pub ended_at:      Timestamp,
    pub duration_secs: i64,
    pub distance_km:   f64,
    pub transport:     TransportType,
    pub confidence:    f64,
    pub route_id:      Option<String>,
    pub finish:        FinishKind,
    pub path:          Vec<TrackPoint>,
}

impl TripRecord {
    pub fn from_session(session: &TravelSession, ended_at: Timestamp, finish: FinishKind) -> Self {
        Self {
            rider:         session.rider,
            session_id:    session.id,
            started_at:    session.started_at,
            ended_at,
            duration_secs: session.duration_secs,
            distance_km:   session.distance_km,
            transport:     session.transport,
            confidence:    session.confidence,
            route_id:      session.route_id.clone(),
            finish,
            path:          session.path.clone(),
        }
    }

    /// Positions with their timestamps, for speed analysis.
    pub fn timed_path(&self) -> Vec<(Coordinate, Timestamp)> {
        self.path.iter().map(|p| (p.coord, p.at)).collect()
    }
}
