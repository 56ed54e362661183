//! Session phases and the pure transition function.

use std::fmt;

use serde::{Deserialize, Serialize};

use tt_core::{Timestamp, TrackerConfig, ValidationError};

use crate::TravelSession;

// ── Phase / PingState ─────────────────────────────────────────────────────────

/// Where a rider's most recent session stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No session yet, or the last one lapsed.
    #[default]
    None,
    Active,
    /// Finished as a valid trip.
    Ended,
    /// Finished too short to count.
    Discarded,
}

/// The state a ping reports back to the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingState {
    New,
    Continuing,
    Ended,
    Invalid,
    None,
    /// The trip ended but could not be persisted downstream.
    Error,
}

impl PingState {
    pub fn as_str(self) -> &'static str {
        match self {
            PingState::New        => "new",
            PingState::Continuing => "continuing",
            PingState::Ended      => "ended",
            PingState::Invalid    => "invalid",
            PingState::None       => "none",
            PingState::Error      => "error",
        }
    }
}

impl fmt::Display for PingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Windows ───────────────────────────────────────────────────────────────────

/// Timing rules of the state machine, seconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Windows {
    pub continuation_secs: i64,
    pub end_grace_secs:    i64,
    pub min_trip_secs:     i64,
}

impl Default for Windows {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for Windows {
    fn from(cfg: &TrackerConfig) -> Self {
        Self {
            continuation_secs: cfg.continuation_window_secs,
            end_grace_secs:    cfg.end_grace_secs,
            min_trip_secs:     cfg.min_trip_secs,
        }
    }
}

impl Windows {
    /// `true` if a trip of `duration_secs` counts.
    #[inline]
    pub fn is_valid_trip(&self, duration_secs: i64) -> bool {
        duration_secs > self.min_trip_secs
    }
}

// ── Transition ────────────────────────────────────────────────────────────────

/// What a ping does to a rider's session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Open a new session.  `retire_stale`: an active session exists but is
    /// too old to continue and must be closed first.
    Start { retire_stale: bool },
    /// Append the ping to the active session.
    Continue,
    /// Close the active session as a valid trip.
    Finish,
    /// Close the active session as too short.
    Discard,
    /// Nothing to do.  `retire_stale` as for `Start`.
    Idle { retire_stale: bool },
}

impl Transition {
    /// The state reported for the ping itself.
    pub fn ping_state(self) -> PingState {
        match self {
            Transition::Start { .. } => PingState::New,
            Transition::Continue     => PingState::Continuing,
            Transition::Finish       => PingState::Ended,
            Transition::Discard      => PingState::Invalid,
            Transition::Idle { .. }  => PingState::None,
        }
    }

    pub fn retires_stale(self) -> bool {
        matches!(self, Transition::Start { retire_stale: true } | Transition::Idle { retire_stale: true })
    }
}

/// Decide what a ping at `now` does to `session`.
///
/// `session` is the rider's current session, if any; only an
/// [`Phase::Active`] session can be continued or finished.  A timestamp
/// earlier than the session's last update is rejected; equal timestamps are
/// accepted.
pub fn transition(
    session:  Option<&TravelSession>,
    on_route: bool,
    now:      Timestamp,
    windows:  &Windows,
) -> Result<Transition, ValidationError> {
    let active = session.filter(|s| s.phase == Phase::Active);

    if let Some(s) = active {
        if now < s.last_update {
            return Err(ValidationError::OutOfOrder { rider: s.rider, at: now, last: s.last_update });
        }
    }

    let since_update = active.map(|s| now.secs_since(s.last_update));

    Ok(match (on_route, active, since_update) {
        (true, Some(_), Some(gap)) if gap <= windows.continuation_secs => Transition::Continue,
        (true, active, _) => Transition::Start { retire_stale: active.is_some() },
        (false, Some(s), Some(gap)) if gap <= windows.end_grace_secs => {
            if windows.is_valid_trip(now.secs_since(s.started_at)) {
                Transition::Finish
            } else {
                Transition::Discard
            }
        }
        (false, active, _) => Transition::Idle { retire_stale: active.is_some() },
    })
}
