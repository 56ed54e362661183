//! Durable JSON route cache.
//!
//! # File format
//!
//! ```json
//! {
//!   "version": "tt-routes/1",
//!   "created_at": 1714552200,
//!   "total_routes": 2,
//!   "routes": [ { "id": "M10", "points": [[52.5, 13.4], ...], "meta": {...} }, ... ]
//! }
//! ```
//!
//! The cache stores validated routes in their raw form.  Corridors and the
//! grid index are always rebuilt from it; nothing derived is persisted.
//!
//! Writes go to a sibling temporary file that is renamed over the target, so
//! a crash mid-write never leaves a truncated cache behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tt_core::Timestamp;

use crate::route::{RawRoute, Route};
use crate::{SpatialError, SpatialResult};

/// Version tag written into every cache file.  A cache carrying any other tag
/// is ignored and refetched.
pub const CACHE_VERSION: &str = "tt-routes/1";

// ── CacheFile ─────────────────────────────────────────────────────────────────

/// On-disk representation of the route cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheFile {
    pub version:      String,
    pub created_at:   Timestamp,
    pub total_routes: usize,
    pub routes:       Vec<RawRoute>,
}

impl CacheFile {
    pub fn new(routes: &[Route], created_at: Timestamp) -> Self {
        Self {
            version:      CACHE_VERSION.to_owned(),
            created_at,
            total_routes: routes.len(),
            routes:       routes.iter().map(RawRoute::from).collect(),
        }
    }

    /// Age of the cache at `now`, seconds.
    pub fn age_secs(&self, now: Timestamp) -> i64 {
        now.secs_since(self.created_at)
    }

    /// `true` if the version tag matches and the cache is younger than
    /// `max_age_secs`.
    pub fn is_fresh(&self, now: Timestamp, max_age_secs: i64) -> bool {
        self.version == CACHE_VERSION && self.age_secs(now) < max_age_secs
    }
}

// ── RouteCache ────────────────────────────────────────────────────────────────

/// A cache file location plus its staleness threshold.
#[derive(Debug, Clone)]
pub struct RouteCache {
    path:         PathBuf,
    max_age_secs: i64,
}

impl RouteCache {
    pub fn new(path: impl Into<PathBuf>, max_age_secs: i64) -> Self {
        Self { path: path.into(), max_age_secs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    /// Read and parse the cache regardless of age or version.
    ///
    /// `Ok(None)` when no cache file exists.
    pub fn read(&self) -> SpatialResult<Option<CacheFile>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SpatialError::Io(e)),
        };
        let parsed: CacheFile = serde_json::from_reader(BufReader::new(file))?;
        if parsed.total_routes != parsed.routes.len() {
            return Err(SpatialError::Cache(format!(
                "{} declares {} routes but holds {}",
                self.path.display(),
                parsed.total_routes,
                parsed.routes.len()
            )));
        }
        Ok(Some(parsed))
    }

    /// The cache contents if they exist, parse and are fresh at `now`.
    ///
    /// Unreadable or corrupt caches are logged and treated as absent.
    pub fn read_fresh(&self, now: Timestamp) -> Option<CacheFile> {
        match self.read() {
            Ok(Some(cache)) if cache.is_fresh(now, self.max_age_secs) => Some(cache),
            Ok(Some(cache)) => {
                debug!(
                    path = %self.path.display(),
                    version = %cache.version,
                    age_secs = cache.age_secs(now),
                    "route cache is stale"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable route cache");
                None
            }
        }
    }

    /// The cache contents at any age, as long as they parse and carry the
    /// current version tag.  Used as fallback when a fetch fails.
    pub fn read_any(&self) -> Option<CacheFile> {
        match self.read() {
            Ok(Some(cache)) if cache.version == CACHE_VERSION => Some(cache),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable route cache");
                None
            }
        }
    }

    /// Atomically replace the cache with `routes`.
    pub fn write(&self, routes: &[Route], now: Timestamp) -> SpatialResult<()> {
        let contents = CacheFile::new(routes, now);

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut out, &contents)?;
            out.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), routes = routes.len(), "wrote route cache");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
