//! `SessionTracker`: per-rider session slots behind per-rider locks.
//!
//! # Locking
//!
//! ```text
//! slots: DashMap<RiderId, Arc<Mutex<RiderSlot>>>
//! ```
//!
//! A ping clones its rider's `Arc` out of the map (holding the shard lock
//! only for that), then locks the rider's own mutex for the whole
//! read-decide-write step.  Pings of different riders never contend; pings of
//! the same rider are applied one at a time.
//!
//! # Retention
//!
//! Slots and trip ledgers grow with every rider and trip until
//! [`SessionTracker::prune`] is called.  The host decides the horizon; the
//! tracker never evicts on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tracing::debug;

use tt_core::{Coordinate, RiderId, SessionId, Timeframe, Timestamp, TransportType, ValidationError};

use crate::{
    transition, FinishKind, Phase, PingState, RiderStats, SessionError, SessionResult, Transition,
    TravelSession, TripLedger, TripRecord, Windows,
};

/// The route a ping matched, as far as the session cares.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteHit {
    pub route_id: String,
}

/// Everything a ping changed.
#[derive(Clone, Debug, PartialEq)]
pub struct PingResult {
    pub state:   PingState,
    pub phase:   Phase,
    /// The active session after a `new`/`continuing` ping, or the session
    /// just closed by an `ended` ping.  A discarded session is never
    /// surfaced, so `invalid` pings carry `None`.
    pub session: Option<TravelSession>,
    /// Set when the ping ended a valid trip.
    pub ended:   Option<TripRecord>,
    /// Set when an older session lapsed and was long enough to count.
    pub lapsed:  Option<TripRecord>,
}

impl PingResult {
    /// Every trip this ping finished, lapsed first.
    pub fn finished_trips(&self) -> impl Iterator<Item = &TripRecord> {
        self.lapsed.iter().chain(self.ended.iter())
    }
}

#[derive(Debug, Default)]
struct RiderSlot {
    session:    Option<TravelSession>,
    last_ping:  Option<Timestamp>,
    last_phase: Phase,
    ledger:     TripLedger,
}

/// What [`SessionTracker::prune`] removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pruned {
    pub riders: usize,
    pub trips:  usize,
}

/// Per-rider session state for every rider seen so far.
pub struct SessionTracker {
    windows: Windows,
    slots:   DashMap<RiderId, Arc<Mutex<RiderSlot>>>,
    next_id: AtomicU64,
}

impl SessionTracker {
    pub fn new(windows: Windows) -> Self {
        Self { windows, slots: DashMap::new(), next_id: AtomicU64::new(1) }
    }

    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    /// Number of riders with any state.
    pub fn rider_count(&self) -> usize {
        self.slots.len()
    }

    /// Apply one ping.
    ///
    /// `hit` is the matched route, `None` when off route.  `classify` runs
    /// under the rider's lock on the active session after it has been
    /// started or extended and returns the transport type and confidence to
    /// store on it.
    ///
    /// Fails only with [`ValidationError::OutOfOrder`], before any state
    /// changes.
    pub fn process<F>(
        &self,
        rider:    RiderId,
        at:       Coordinate,
        now:      Timestamp,
        hit:      Option<RouteHit>,
        classify: F,
    ) -> Result<PingResult, ValidationError>
    where
        F: FnOnce(&TravelSession) -> (TransportType, f64),
    {
        let slot = self.slot(rider);
        let mut slot = lock(&slot);

        if let Some(last) = slot.last_ping.filter(|&last| now < last) {
            return Err(ValidationError::OutOfOrder { rider, at: now, last });
        }

        let step = transition(slot.session.as_ref(), hit.is_some(), now, &self.windows)?;
        slot.last_ping = Some(now);

        let lapsed = if step.retires_stale() { self.retire(&mut slot) } else { None };

        let mut result = PingResult {
            state:   step.ping_state(),
            phase:   Phase::None,
            session: None,
            ended:   None,
            lapsed,
        };

        match step {
            Transition::Start { .. } => {
                let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
                let mut session = TravelSession::start(id, rider, at, now, hit.map(|h| h.route_id));
                (session.transport, session.confidence) = classify(&session);
                result.session = Some(session.clone());
                slot.session = Some(session);
                result.phase = Phase::Active;
            }
            Transition::Continue => {
                if let Some(session) = slot.session.as_mut() {
                    session.extend(at, now, hit.map(|h| h.route_id));
                    (session.transport, session.confidence) = classify(session);
                    result.session = Some(session.clone());
                }
                result.phase = Phase::Active;
            }
            Transition::Finish | Transition::Discard => {
                let phase = if step == Transition::Finish { Phase::Ended } else { Phase::Discarded };
                if let Some(mut session) = slot.session.take() {
                    session.close(now, phase);
                    if phase == Phase::Ended {
                        let trip = TripRecord::from_session(&session, now, FinishKind::Ended);
                        slot.ledger.push(trip.clone());
                        result.ended = Some(trip);
                        result.session = Some(session);
                    } else {
                        debug!(rider = %rider, session = %session.id, "short session discarded");
                    }
                }
                result.phase = phase;
            }
            Transition::Idle { .. } => {
                result.phase = slot.last_phase;
            }
        }
        slot.last_phase = result.phase;

        debug!(
            rider = %rider,
            state = %result.state,
            session = ?result.session.as_ref().map(|s| s.id),
            lapsed = result.lapsed.is_some(),
            "ping applied"
        );
        Ok(result)
    }

    /// Close the active session at its last update.  Returns the trip if it
    /// was long enough to count.
    fn retire(&self, slot: &mut RiderSlot) -> Option<TripRecord> {
        let mut stale = slot.session.take()?;
        let end = stale.last_update;
        let valid = self.windows.is_valid_trip(end.secs_since(stale.started_at));
        stale.close(end, if valid { Phase::Ended } else { Phase::Discarded });
        slot.last_phase = Phase::None;
        if !valid {
            debug!(rider = %stale.rider, session = %stale.id, "stale session dropped");
            return None;
        }
        let trip = TripRecord::from_session(&stale, end, FinishKind::Lapsed);
        slot.ledger.push(trip.clone());
        Some(trip)
    }

    /// The rider's active session, if any.
    pub fn active_session(&self, rider: RiderId) -> Option<TravelSession> {
        let slot = self.slots.get(&rider).map(|s| Arc::clone(s.value()))?;
        let slot = lock(&slot);
        slot.session.clone()
    }

    /// The rider's finished trips.
    pub fn trips(&self, rider: RiderId) -> Vec<TripRecord> {
        let Some(slot) = self.slots.get(&rider).map(|s| Arc::clone(s.value())) else {
            return Vec::new();
        };
        let trips = lock(&slot).ledger.trips().to_vec();
        trips
    }

    /// Travel totals for `rider` over `timeframe`.
    ///
    /// A rider the tracker has never seen is [`SessionError::RiderNotFound`].
    pub fn rider_stats(&self, rider: RiderId, timeframe: Timeframe, now: Timestamp) -> SessionResult<RiderStats> {
        let slot = self
            .slots
            .get(&rider)
            .map(|s| Arc::clone(s.value()))
            .ok_or(SessionError::RiderNotFound(rider))?;
        let stats = lock(&slot).ledger.stats(timeframe, now);
        Ok(stats)
    }

    /// Forget history older than `cutoff`.
    ///
    /// Trips that ended before `cutoff` are dropped from every ledger.  A
    /// rider is evicted once it has no active session, no trips left and no
    /// ping at or after `cutoff`.  Riders with a ping in flight are kept.
    pub fn prune(&self, cutoff: Timestamp) -> Pruned {
        let mut pruned = Pruned::default();
        self.slots.retain(|_, slot| {
            let in_flight = Arc::strong_count(slot) > 1;
            let mut s = lock(slot);
            pruned.trips += s.ledger.retain_since(cutoff);
            let idle = s.session.is_none()
                && s.ledger.is_empty()
                && s.last_ping.is_none_or(|t| t < cutoff);
            let evict = idle && !in_flight;
            if evict {
                pruned.riders += 1;
            }
            !evict
        });
        debug!(riders = pruned.riders, trips = pruned.trips, cutoff = %cutoff, "tracker pruned");
        pruned
    }

    fn slot(&self, rider: RiderId) -> Arc<Mutex<RiderSlot>> {
        Arc::clone(self.slots.entry(rider).or_default().value())
    }
}

fn lock(slot: &Mutex<RiderSlot>) -> MutexGuard<'_, RiderSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
