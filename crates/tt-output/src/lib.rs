//! `tt-output`: finished-trip writers for the `traveltime` ride detector.
//!
//! Two backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                     |
//! |-----------|---------|-----------------------------------|
//! | *(none)*  | CSV     | `trips.csv`, `trip_points.csv`    |
//! | `sqlite`  | SQLite  | `trips.db`                        |
//!
//! All backends implement [`TripWriter`] and are driven by
//! [`TripOutputObserver`], which implements `tt_service::TripObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tt_output::{CsvTripWriter, TripOutputObserver};
//!
//! let output = Arc::new(TripOutputObserver::new(CsvTripWriter::new(Path::new("./output"))?));
//! let service = TransitServiceBuilder::new(source).observer(output.clone()).build()?;
//! // ... process pings ...
//! output.finish()?;
//! output.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvTripWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TripOutputObserver;
pub use row::{TripPointRow, TripRow};
pub use writer::TripWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTripWriter;
