//! `tt-session`: the per-rider travel session state machine.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`state`]   | `Phase`, `PingState`, `Windows`, pure `transition` function     |
//! | [`session`] | `TravelSession`, `TrackPoint`, `TripRecord`, `FinishKind`       |
//! | [`tracker`] | `SessionTracker`: per-rider locked slots, `PingResult`, `prune` |
//! | [`ledger`]  | `TripLedger`, `RiderStats`: finished trips per rider           |
//! | [`error`]   | `SessionError`, `SessionResult<T>`                              |
//!
//! # Session model
//!
//! A rider has at most one active session.  Each ping is classified as on or
//! off route by the caller and fed to [`transition`], which decides between
//! starting, continuing, finishing or discarding a session:
//!
//! ```text
//!              on route                     on route, within continuation window
//!   (none) ───────────────▶ Active ◀──────────────────────────────┐
//!                            │  └───────────────────────────────────┘
//!                            │ off route, within end-grace window
//!                            ▼
//!                  duration > min_trip ? Ended : Discarded
//! ```
//!
//! A session that can no longer be continued or finished because the next
//! ping came too late is *lapsed*: it is closed at its last update and, if
//! long enough, recorded like any other trip.

pub mod error;
pub mod ledger;
pub mod session;
pub mod state;
pub mod tracker;


pub use error::{SessionError, SessionResult};
pub use ledger::{RiderStats, TripLedger};
pub use session::{FinishKind, TrackPoint, TravelSession, TripRecord};
pub use state::{transition, Phase, PingState, Transition, Windows};
pub use tracker::{PingResult, Pruned, RouteHit, SessionTracker};
