//! `tt-analytics`: usage counters, learned transport patterns and the
//! transport-type classifier.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                       |
//! |---------------|----------------------------------------------------------------|
//! | [`usage`]     | `UsageStats`: per-route and per-(operator, type) counters      |
//! | [`pattern`]   | `TransportPattern`, rolling speed samples, stop frequency      |
//! | [`classify`]  | `Classifier`, `ClassifierWeights`, `Classification`            |
//! | [`summary`]   | `OperatorSummary`, `PatternReport` read models                 |
//! | [`engine`]    | `PatternAnalytics`: the above behind one façade                |
//! | [`snapshot`]  | `AnalyticsSnapshot`, `AnalyticsStore`, JSON/memory stores      |
//! | [`error`]     | `AnalyticsError`, `AnalyticsResult<T>`                         |
//!
//! `PatternAnalytics` is plain data with `&mut self` mutators.  Callers that
//! share it between threads wrap it in a `Mutex` and keep I/O outside the
//! critical section: take a [`snapshot`](PatternAnalytics::snapshot) under
//! the lock, save it after releasing.

pub mod classify;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod snapshot;
pub mod summary;
pub mod usage;

#[cfg(test)]
mod tests;

pub use classify::{Classification, Classifier, ClassifierWeights};
pub use engine::PatternAnalytics;
pub use error::{AnalyticsError, AnalyticsResult};
pub use pattern::{leg_speeds_kmh, stop_frequency, TransportPattern, STOP_SPEED_KMH};
pub use snapshot::{AnalyticsSnapshot, AnalyticsStore, JsonFileStore, MemoryStore, SCHEMA_VERSION};
pub use summary::{
    DetectionAccuracy, LearningStatus, OperatorShare, OperatorSummary, PatternReport, PatternSummary,
    SpeedStats,
};
pub use usage::{RouteUsage, UsageStats, UNKNOWN_OPERATOR};
