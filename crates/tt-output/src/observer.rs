//! `TripOutputObserver<W>`: bridges `TripObserver` to a `TripWriter`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use tt_service::TripObserver;
use tt_session::TripRecord;

use crate::row::{TripPointRow, TripRow};
use crate::writer::TripWriter;
use crate::{OutputError, OutputResult};

/// A [`TripObserver`] that writes every finished trip to any [`TripWriter`]
/// backend (CSV, SQLite).
///
/// Errors from the writer are stored internally because `TripObserver`
/// methods have no return value.  Check for them with
/// [`take_error`][Self::take_error].
pub struct TripOutputObserver<W: TripWriter> {
    inner: Mutex<Inner<W>>,
}

struct Inner<W> {
    writer:     W,
    trips:      u64,
    last_error: Option<OutputError>,
}

impl<W: TripWriter> TripOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: Mutex::new(Inner { writer, trips: 0, last_error: None }) }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&self) -> Option<OutputError> {
        self.lock().last_error.take()
    }

    /// Trips written so far.
    pub fn trips_written(&self) -> u64 {
        self.lock().trips
    }

    /// Flush the writer.
    pub fn finish(&self) -> OutputResult<()> {
        self.lock().writer.finish()
    }

    /// Unwrap the inner writer (e.g. to inspect files after a run).
    pub fn into_writer(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner).writer
    }

    fn lock(&self) -> MutexGuard<'_, Inner<W>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: TripWriter> TripObserver for TripOutputObserver<W> {
    fn on_trip_finished(&self, trip: &TripRecord) {
        let mut inner = self.lock();
        match write(&mut inner.writer, trip) {
            Ok(()) => inner.trips += 1,
            Err(e) => {
                warn!(session = %trip.session_id, error = %e, "cannot write trip");
                // Keep only the first error.
                if inner.last_error.is_none() {
                    inner.last_error = Some(e);
                }
            }
        }
    }
}

fn write<W: TripWriter>(writer: &mut W, trip: &TripRecord) -> OutputResult<()> {
    writer.write_trip(&TripRow::from_trip(trip))?;
    writer.write_points(&TripPointRow::from_trip(trip))
}
