//! `tt-service`: the ping orchestrator of the `traveltime` ride detector.
//!
//! # One ping
//!
//! ```text
//! process_ping(rider, lat, lon, ts?):
//!   ① Validate : rider id parses and is in the RiderDirectory, coordinate
//!                in range, timestamp parses.  Nothing is touched on error.
//!   ② Match    : RouteMatcher against the current RouteSnapshot
//!                (grid index candidates, then corridor containment).
//!   ③ Track    : SessionTracker applies the transition under the rider's
//!                lock; the active session is classified in place.
//!   ④ Count    : an on-route ping bumps route and operator counters.
//!   ⑤ Learn    : each finished trip feeds its leg speeds into the pattern
//!                of its type; analytics are saved; observers are told.
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`service`]   | `TransitService`, `PingOutcome`                            |
//! | [`builder`]   | `TransitServiceBuilder`                                    |
//! | [`directory`] | `RiderDirectory` trait, `AnyRider`, `KnownRiders`          |
//! | [`observer`]  | `TripObserver` trait, `NoopObserver`                       |
//! | [`error`]     | `ServiceError`, `ServiceResult<T>`                         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tt_service::TransitServiceBuilder;
//! use tt_spatial::CsvRouteSource;
//!
//! let service = TransitServiceBuilder::new(CsvRouteSource::new("routes.csv"))
//!     .config(config)
//!     .build()?;
//! service.load_routes()?;
//! let outcome = service.process_ping("42", 52.52, 13.40, Some("2024-05-01T08:00:00Z"))?;
//! ```

pub mod builder;
pub mod directory;
pub mod error;
pub mod observer;
pub mod service;


pub use builder::TransitServiceBuilder;
pub use directory::{AnyRider, KnownRiders, RiderDirectory};
pub use error::{ServiceError, ServiceResult};
pub use observer::{NoopObserver, TripObserver};
pub use service::{PingOutcome, TransitService, DECLARED_TYPE_CONFIDENCE, RECENT_POINTS};
