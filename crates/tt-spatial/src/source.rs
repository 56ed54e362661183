//! Route providers.
//!
//! The ride detector never talks to a transit-data API itself.  It asks a
//! [`RouteSource`] for raw geometries and leaves validation, deduplication
//! and caching to the [`RouteStore`][crate::RouteStore].
//!
//! # CSV format
//!
//! One row per route vertex.  Rows of a route need not be contiguous; they
//! are ordered by `seq`.  Metadata columns may be empty and are taken from
//! the first row of each route.
//!
//! ```csv
//! route_id,seq,lat,lon,transport,operator,name,ref
//! M10,0,52.5290,13.4010,tram,BVG,Tram M10,M10
//! M10,1,52.5300,13.4100,,,,
//! 100,0,52.5210,13.4130,bus,BVG,Bus 100,100
//! 100,1,52.5150,13.3900,,,,
//! ```
//!
//! Routes appear in the output in order of their first row.

use std::io::Read;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::warn;

use tt_core::TransportType;

use crate::route::{RawRoute, RouteMeta};
use crate::SourceError;

// ── RouteSource ───────────────────────────────────────────────────────────────

/// External "fetch raw route geometries" collaborator.
pub trait RouteSource: Send + Sync {
    /// Short name used in log lines and errors.
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<Vec<RawRoute>, SourceError>;
}

impl RouteSource for Box<dyn RouteSource> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self) -> Result<Vec<RawRoute>, SourceError> {
        (**self).fetch()
    }
}

// ── StaticSource ──────────────────────────────────────────────────────────────

/// A fixed, in-memory route list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    routes: Vec<RawRoute>,
}

impl StaticSource {
    pub fn new(routes: Vec<RawRoute>) -> Self {
        Self { routes }
    }
}

impl RouteSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self) -> Result<Vec<RawRoute>, SourceError> {
        Ok(self.routes.clone())
    }
}

// ── FnSource ──────────────────────────────────────────────────────────────────

/// Adapts a closure into a [`RouteSource`].
pub struct FnSource<F> {
    name: String,
    f:    F,
}

impl<F> FnSource<F>
where
    F: Fn() -> Result<Vec<RawRoute>, SourceError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> RouteSource for FnSource<F>
where
    F: Fn() -> Result<Vec<RawRoute>, SourceError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<RawRoute>, SourceError> {
        (self.f)()
    }
}

// ── MultiSource ───────────────────────────────────────────────────────────────

/// Concatenates several providers in order.
///
/// A failing provider is logged and skipped; the fetch only fails when every
/// provider fails.  An empty `MultiSource` yields no routes.
#[derive(Default)]
pub struct MultiSource {
    sources: Vec<Box<dyn RouteSource>>,
}

impl MultiSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl RouteSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl RouteSource for MultiSource {
    fn name(&self) -> &str {
        "multi"
    }

    fn fetch(&self) -> Result<Vec<RawRoute>, SourceError> {
        let mut routes = Vec::new();
        let mut failures = Vec::new();

        for source in &self.sources {
            match source.fetch() {
                Ok(mut batch) => routes.append(&mut batch),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "route source failed");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }

        if !self.sources.is_empty() && failures.len() == self.sources.len() {
            return Err(SourceError::Unavailable {
                provider: self.name().to_owned(),
                reason:   failures.join("; "),
            });
        }
        Ok(routes)
    }
}

// ── CsvRouteSource ────────────────────────────────────────────────────────────

/// Reads routes from a CSV file on every fetch.
#[derive(Debug, Clone)]
pub struct CsvRouteSource {
    path: PathBuf,
}

impl CsvRouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RouteSource for CsvRouteSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self) -> Result<Vec<RawRoute>, SourceError> {
        load_routes_csv(&self.path)
    }
}

#[derive(Deserialize)]
struct RouteRecord {
    route_id:  String,
    seq:       u32,
    lat:       f64,
    lon:       f64,
    #[serde(default)]
    transport: Option<String>,
    #[serde(default)]
    operator:  Option<String>,
    #[serde(default)]
    name:      Option<String>,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
}

/// Load routes from a CSV file.
pub fn load_routes_csv(path: &Path) -> Result<Vec<RawRoute>, SourceError> {
    let file = std::fs::File::open(path)?;
    load_routes_reader(file)
}

/// Like [`load_routes_csv`] but accepts any `Read` source.
pub fn load_routes_reader<R: Read>(reader: R) -> Result<Vec<RawRoute>, SourceError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let mut order: Vec<String> = Vec::new();
    let mut by_route: FxHashMap<String, Vec<RouteRecord>> = FxHashMap::default();

    for result in csv_reader.deserialize::<RouteRecord>() {
        let row = result.map_err(|e| SourceError::Parse(e.to_string()))?;
        if !by_route.contains_key(&row.route_id) {
            order.push(row.route_id.clone());
        }
        by_route.entry(row.route_id.clone()).or_default().push(row);
    }

    let mut routes = Vec::with_capacity(order.len());
    for id in order {
        let Some(mut rows) = by_route.remove(&id) else { continue };
        rows.sort_by_key(|r| r.seq);

        let first = &rows[0];
        let meta = RouteMeta {
            transport: non_empty(&first.transport).map(TransportType::from_tag),
            operator:  non_empty(&first.operator).map(str::to_owned),
            name:      non_empty(&first.name).map(str::to_owned),
            reference: non_empty(&first.reference).map(str::to_owned),
        };
        let points = rows.iter().map(|r| [r.lat, r.lon]).collect();
        routes.push(RawRoute { id: Some(id), points, meta });
    }
    Ok(routes)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
