//! `tt-spatial`: route corpus, corridor geometry, spatial index and
//! route matching.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`geometry`] | `interpolate`, `buffer` → `Corridor`, `contains`, `distance_deg` |
//! | [`route`]    | `RawRoute`, `Route`, `RouteMeta`, `Bounds`, `fingerprint`       |
//! | [`index`]    | `GridIndex` (fixed-size cell buckets), `linear_scan`            |
//! | [`source`]   | `RouteSource` trait, static/CSV/multi sources                   |
//! | [`cache`]    | `RouteCache`: durable JSON corpus cache with staleness check   |
//! | [`store`]    | `RouteStore<S>`, `RouteSnapshot`, `RefreshReport`               |
//! | [`matcher`]  | `RouteMatcher`, `RouteMatch`, `RouteSummary`                    |
//! | [`error`]    | `SpatialError`, `GeometryError`, `SourceError`                  |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | Builds grid cell lists on Rayon's thread pool.              |
//!
//! # Coordinate conventions
//!
//! All planar arithmetic happens in degree space with the single
//! [`tt_core::METERS_PER_DEGREE`] conversion.  `geo` types store longitude
//! in `x` and latitude in `y`.

pub mod cache;
pub mod error;
pub mod geometry;
pub mod index;
pub mod matcher;
pub mod route;
pub mod source;
pub mod store;

#[cfg(test)]
mod tests;

pub use cache::{CacheFile, RouteCache, CACHE_VERSION};
pub use error::{GeometryError, SourceError, SpatialError, SpatialResult};
pub use geometry::{buffer, contains, distance_deg, interpolate, Corridor};
pub use index::{linear_scan, GridIndex};
pub use matcher::{RouteMatch, RouteMatcher, RouteSummary};
pub use route::{fingerprint, normalize_routes, Bounds, RawRoute, Route, RouteMeta};
pub use source::{load_routes_csv, load_routes_reader, CsvRouteSource, FnSource, MultiSource, RouteSource, StaticSource};
pub use store::{RefreshReport, RouteSnapshot, RouteStore, SnapshotOrigin, StoreConfig};
