//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `trips.csv`
//! - `trip_points.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{OutputError, OutputResult, TripPointRow, TripRow};
use crate::writer::TripWriter;

pub const TRIP_HEADER: [&str; 11] = [
    "session_id", "rider_id", "started_at", "ended_at", "duration_secs", "distance_km",
    "transport", "confidence", "route_id", "finish", "points",
];

pub const POINT_HEADER: [&str; 5] = ["session_id", "seq", "unix_secs", "lat", "lon"];

/// Writes finished trips to two CSV files.
pub struct CsvTripWriter {
    trips:    Writer<File>,
    points:   Writer<File>,
    finished: bool,
}

impl CsvTripWriter {
    /// Create the two CSV files in `dir` (creating `dir` if needed) and write
    /// the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut trips = Writer::from_path(dir.join("trips.csv"))?;
        trips.write_record(TRIP_HEADER)?;

        let mut points = Writer::from_path(dir.join("trip_points.csv"))?;
        points.write_record(POINT_HEADER)?;

        Ok(Self { trips, points, finished: false })
    }
}

impl TripWriter for CsvTripWriter {
    fn write_trip(&mut self, row: &TripRow) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.trips.write_record(&[
            row.session_id.to_string(),
            row.rider_id.to_string(),
            row.started_at.to_string(),
            row.ended_at.to_string(),
            row.duration_secs.to_string(),
            format!("{:.4}", row.distance_km),
            row.transport.to_string(),
            format!("{:.3}", row.confidence),
            row.route_id.clone(),
            row.finish.to_string(),
            row.points.to_string(),
        ])?;
        self.trips.flush()?;
        Ok(())
    }

    fn write_points(&mut self, rows: &[TripPointRow]) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        for row in rows {
            self.points.write_record(&[
                row.session_id.to_string(),
                row.seq.to_string(),
                row.unix_secs.to_string(),
                format!("{:.6}", row.lat),
                format!("{:.6}", row.lon),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trips.flush()?;
        self.points.flush()?;
        Ok(())
    }
}
