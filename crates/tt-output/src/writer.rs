//! The `TripWriter` trait implemented by all backend writers.

use crate::{OutputResult, TripPointRow, TripRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are stored by [`TripOutputObserver`](crate::TripOutputObserver)
/// and retrieved with its `take_error`.
pub trait TripWriter: Send {
    /// Write one trip summary row.
    fn write_trip(&mut self, row: &TripRow) -> OutputResult<()>;

    /// Write a batch of path points.
    fn write_points(&mut self, rows: &[TripPointRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
