//! `tt-core`: foundational types for the `traveltime` ride detector.
//!
//! This crate is a dependency of every other `tt-*` crate.  It has no `tt-*`
//! dependencies and few external ones (`chrono` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RiderId`, `SessionId`, `RouteIdx`                    |
//! | [`geo`]         | `Coordinate`, haversine distance, path length         |
//! | [`time`]        | `Timestamp`, `Timeframe`                              |
//! | [`transport`]   | `TransportType` enum                                  |
//! | [`config`]      | `TrackerConfig` with every tunable window and radius  |
//! | [`error`]       | `ValidationError`, `TtError`, `TtResult`              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod time;
pub mod transport;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::TrackerConfig;
pub use error::{TtError, TtResult, ValidationError};
pub use geo::{haversine_km, path_length_km, Coordinate, METERS_PER_DEGREE};
pub use ids::{RiderId, RouteIdx, SessionId};
pub use time::{Timeframe, Timestamp};
pub use transport::TransportType;
