//! The in-memory route corpus and its refresh protocol.
//!
//! # Snapshots
//!
//! A [`RouteSnapshot`] bundles the validated routes, the grid index built
//! over them and a lazily filled corridor table.  It is immutable once
//! built.  [`RouteStore`] keeps the current snapshot in an
//! `RwLock<Arc<RouteSnapshot>>`:
//!
//! ```text
//! readers:  lock → clone Arc → unlock → query at leisure
//! refresh:  fetch + validate + index (no lock held) → lock → swap Arc → unlock
//! ```
//!
//! A reader therefore sees either the complete old corpus or the complete new
//! one, and never waits on I/O.  Loads and refreshes are serialised among
//! themselves by a separate mutex.
//!
//! # Load order
//!
//! 1. Fresh cache (current version tag, younger than `cache_max_age_secs`).
//! 2. The [`RouteSource`]; the result is validated, deduplicated, capped and
//!    written back to the cache.
//! 3. If the source fails and nothing is loaded yet, any parseable cache is
//!    installed as a stale fallback.  The error is still returned and the
//!    store stays "not loaded", so the next `load()` retries the source.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use tt_core::{Coordinate, RouteIdx, Timestamp, TrackerConfig};

use crate::cache::RouteCache;
use crate::geometry::{buffer, Corridor};
use crate::index::GridIndex;
use crate::route::{normalize_routes, RawRoute, Route};
use crate::source::RouteSource;
use crate::{SpatialError, SpatialResult};

// ── StoreConfig ───────────────────────────────────────────────────────────────

/// The subset of [`TrackerConfig`] that shapes the route corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub corridor_width_m:   f64,
    pub resample_step_m:    f64,
    pub grid_cell_deg:      f64,
    pub cache_path:         Option<PathBuf>,
    pub cache_max_age_secs: i64,
    pub max_routes:         usize,
    pub fingerprint_prefix: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for StoreConfig {
    fn from(cfg: &TrackerConfig) -> Self {
        Self {
            corridor_width_m:   cfg.corridor_width_m,
            resample_step_m:    cfg.resample_step_m,
            grid_cell_deg:      cfg.grid_cell_deg,
            cache_path:         cfg.route_cache_path.clone(),
            cache_max_age_secs: cfg.route_cache_max_age_secs,
            max_routes:         cfg.max_routes,
            fingerprint_prefix: cfg.fingerprint_prefix,
        }
    }
}

// ── RouteSnapshot ─────────────────────────────────────────────────────────────

/// Where the contents of a snapshot came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// Nothing loaded yet.
    Empty,
    /// A fresh cache file.
    Cache,
    /// The route source.
    Fetch,
    /// An out-of-date cache, used because the source failed.
    StaleCache,
}

/// An immutable route corpus with its index and memoised corridors.
#[derive(Debug)]
pub struct RouteSnapshot {
    routes:           Vec<Route>,
    index:            GridIndex,
    corridors:        Vec<OnceLock<Option<Corridor>>>,
    corridor_width_m: f64,
    resample_step_m:  f64,
    origin:           SnapshotOrigin,
    loaded_at:        Timestamp,
}

impl RouteSnapshot {
    pub fn empty(cfg: &StoreConfig) -> Self {
        Self::build(Vec::new(), cfg, SnapshotOrigin::Empty, Timestamp(0))
    }

    pub fn build(routes: Vec<Route>, cfg: &StoreConfig, origin: SnapshotOrigin, loaded_at: Timestamp) -> Self {
        let index = if routes.is_empty() {
            GridIndex::empty(cfg.grid_cell_deg)
        } else {
            GridIndex::build(&routes, cfg.grid_cell_deg)
        };
        let corridors = (0..routes.len()).map(|_| OnceLock::new()).collect();
        Self {
            routes,
            index,
            corridors,
            corridor_width_m: cfg.corridor_width_m,
            resample_step_m:  cfg.resample_step_m,
            origin,
            loaded_at,
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, idx: RouteIdx) -> Option<&Route> {
        self.routes.get(idx.index())
    }

    pub fn index(&self) -> &GridIndex {
        &self.index
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    pub fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }

    /// Routes within `radius_m` of `at`, ascending by index.
    pub fn nearby(&self, at: Coordinate, radius_m: f64) -> Vec<RouteIdx> {
        self.index.query(&self.routes, at, radius_m)
    }

    /// The route's corridor, built on first use.
    ///
    /// `None` if the route cannot be buffered; the failure is logged once.
    pub fn corridor(&self, idx: RouteIdx) -> Option<&Corridor> {
        let route = self.routes.get(idx.index())?;
        self.corridors[idx.index()]
            .get_or_init(|| {
                match buffer(&route.points, self.corridor_width_m, self.resample_step_m) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        warn!(route = %route.id, error = %e, "cannot buffer route; skipping");
                        None
                    }
                }
            })
            .as_ref()
    }
}

// ── RouteStore ────────────────────────────────────────────────────────────────

/// Outcome of [`RouteStore::refresh`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RefreshReport {
    pub routes_loaded: usize,
    pub duration:      Duration,
    pub origin:        SnapshotOrigin,
}

/// Owns the route corpus and swaps it atomically on refresh.
pub struct RouteStore<S: RouteSource> {
    source:    S,
    config:    StoreConfig,
    cache:     Option<RouteCache>,
    current:   RwLock<Arc<RouteSnapshot>>,
    loaded:    AtomicBool,
    load_lock: Mutex<()>,
}

impl<S: RouteSource> RouteStore<S> {
    pub fn new(source: S, config: StoreConfig) -> Self {
        let cache = config
            .cache_path
            .as_ref()
            .map(|p| RouteCache::new(p.clone(), config.cache_max_age_secs));
        Self {
            source,
            current: RwLock::new(Arc::new(RouteSnapshot::empty(&config))),
            config,
            cache,
            loaded: AtomicBool::new(false),
            load_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// `true` once a fresh cache or a successful fetch has been installed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    // ── Read side ─────────────────────────────────────────────────────────

    /// The current snapshot.  Never blocks on I/O.
    pub fn snapshot(&self) -> Arc<RouteSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    /// A copy of every loaded route.
    pub fn all(&self) -> Vec<Route> {
        self.snapshot().routes().to_vec()
    }

    // ── Write side ────────────────────────────────────────────────────────

    /// Load the corpus if it is not loaded yet; returns the route count.
    pub fn load(&self) -> SpatialResult<usize> {
        self.load_at(Timestamp::now())
    }

    /// [`load`](Self::load) with an explicit clock for staleness checks.
    pub fn load_at(&self, now: Timestamp) -> SpatialResult<usize> {
        if self.is_loaded() {
            return Ok(self.count());
        }
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_loaded() {
            return Ok(self.count());
        }
        self.reload(false, now).map(|snap| snap.len())
    }

    /// Rebuild the corpus.  `force` skips the cache and always fetches.
    pub fn refresh(&self, force: bool) -> SpatialResult<RefreshReport> {
        self.refresh_at(force, Timestamp::now())
    }

    /// [`refresh`](Self::refresh) with an explicit clock.
    pub fn refresh_at(&self, force: bool, now: Timestamp) -> SpatialResult<RefreshReport> {
        let started = Instant::now();
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snap = self.reload(force, now)?;
        let report = RefreshReport {
            routes_loaded: snap.len(),
            duration:      started.elapsed(),
            origin:        snap.origin(),
        };
        info!(routes = report.routes_loaded, origin = ?report.origin, elapsed = ?report.duration, "route corpus refreshed");
        Ok(report)
    }

    /// Caller holds `load_lock`.
    fn reload(&self, force: bool, now: Timestamp) -> SpatialResult<Arc<RouteSnapshot>> {
        if !force {
            if let Some(cached) = self.cache.as_ref().and_then(|c| c.read_fresh(now)) {
                let snap = self.install(cached.routes, SnapshotOrigin::Cache, now);
                self.loaded.store(true, Ordering::Release);
                info!(routes = snap.len(), "loaded routes from cache");
                return Ok(snap);
            }
        }

        let raw = match self.source.fetch() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "route fetch failed");
                self.fall_back_to_stale(now);
                return Err(SpatialError::DataSource(e));
            }
        };

        let fetched = raw.len();
        let routes = normalize_routes(raw, self.config.fingerprint_prefix, self.config.max_routes);
        if let Some(cache) = &self.cache {
            if routes.is_empty() {
                warn!(source = self.source.name(), "route source returned no usable routes; cache left untouched");
            } else if let Err(e) = cache.write(&routes, now) {
                warn!(path = %cache.path().display(), error = %e, "cannot write route cache");
            }
        }

        let snap = Arc::new(RouteSnapshot::build(routes, &self.config, SnapshotOrigin::Fetch, now));
        self.swap(Arc::clone(&snap));
        self.loaded.store(true, Ordering::Release);
        info!(source = self.source.name(), fetched, routes = snap.len(), "loaded routes from source");
        Ok(snap)
    }

    /// Install a stale cache if nothing usable is loaded.
    fn fall_back_to_stale(&self, now: Timestamp) {
        if !self.snapshot().is_empty() {
            return;
        }
        if let Some(stale) = self.cache.as_ref().and_then(RouteCache::read_any) {
            let snap = self.install(stale.routes, SnapshotOrigin::StaleCache, now);
            warn!(routes = snap.len(), "serving routes from stale cache");
        }
    }

    fn install(&self, raw: Vec<RawRoute>, origin: SnapshotOrigin, now: Timestamp) -> Arc<RouteSnapshot> {
        let routes = normalize_routes(raw, self.config.fingerprint_prefix, self.config.max_routes);
        let snap = Arc::new(RouteSnapshot::build(routes, &self.config, origin, now));
        self.swap(Arc::clone(&snap));
        snap
    }

    fn swap(&self, snap: Arc<RouteSnapshot>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snap;
    }
}
