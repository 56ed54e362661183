//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `trips.db` file in the configured output directory with
//! two tables: `trips` and `trip_points`.

use std::path::Path;

use rusqlite::Connection;

use crate::{OutputError, OutputResult, TripPointRow, TripRow};
use crate::writer::TripWriter;

/// Writes finished trips to an SQLite database.
pub struct SqliteTripWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteTripWriter {
    /// Open (or create) `trips.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("trips.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS trips (
                 session_id    INTEGER PRIMARY KEY,
                 rider_id      INTEGER NOT NULL,
                 started_at    INTEGER NOT NULL,
                 ended_at      INTEGER NOT NULL,
                 duration_secs INTEGER NOT NULL,
                 distance_km   REAL    NOT NULL,
                 transport     TEXT    NOT NULL,
                 confidence    REAL    NOT NULL,
                 route_id      TEXT    NOT NULL,
                 finish        TEXT    NOT NULL,
                 points        INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS trip_points (
                 session_id INTEGER NOT NULL,
                 seq        INTEGER NOT NULL,
                 unix_secs  INTEGER NOT NULL,
                 lat        REAL    NOT NULL,
                 lon        REAL    NOT NULL,
                 PRIMARY KEY (session_id, seq)
             );
             CREATE INDEX IF NOT EXISTS trips_by_rider ON trips (rider_id, started_at);",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl TripWriter for SqliteTripWriter {
    fn write_trip(&mut self, row: &TripRow) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO trips \
             (session_id, rider_id, started_at, ended_at, duration_secs, distance_km, \
              transport, confidence, route_id, finish, points) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                row.session_id as i64,
                row.rider_id as i64,
                row.started_at,
                row.ended_at,
                row.duration_secs,
                row.distance_km,
                row.transport,
                row.confidence,
                row.route_id,
                row.finish,
                row.points,
            ],
        )?;
        Ok(())
    }

    fn write_points(&mut self, rows: &[TripPointRow]) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO trip_points (session_id, seq, unix_secs, lat, lon) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.session_id as i64, row.seq, row.unix_secs, row.lat, row.lon])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
