//! Versioned persistence of analytics state.
//!
//! # Schema
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "usage":    { "routes": [...], "operators": { "BVG": { "bus": 12 } } },
//!   "patterns": { "bus": { "speeds": [...], "stop_frequency": 0.4, ... } }
//! }
//! ```
//!
//! Readers check `schema_version` before parsing the body, so a snapshot
//! written by a newer build fails with
//! [`AnalyticsError::UnsupportedSchema`] instead of a confusing field error.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use tt_core::TransportType;

use crate::{AnalyticsError, AnalyticsResult, TransportPattern, UsageStats};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the analytics engine persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub schema_version: u32,
    #[serde(default)]
    pub usage:          UsageStats,
    #[serde(default)]
    pub patterns:       BTreeMap<TransportType, TransportPattern>,
}

impl Default for AnalyticsSnapshot {
    fn default() -> Self {
        Self::new(UsageStats::default(), BTreeMap::new())
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

impl AnalyticsSnapshot {
    pub fn new(usage: UsageStats, patterns: BTreeMap<TransportType, TransportPattern>) -> Self {
        Self { schema_version: SCHEMA_VERSION, usage, patterns }
    }

    pub fn to_json(&self) -> AnalyticsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot, rejecting schema versions newer than
    /// [`SCHEMA_VERSION`].
    pub fn from_json(json: &str) -> AnalyticsResult<Self> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.schema_version == 0 || probe.schema_version > SCHEMA_VERSION {
            return Err(AnalyticsError::UnsupportedSchema {
                found:     probe.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(serde_json::from_str(json)?)
    }
}

// ── Stores ────────────────────────────────────────────────────────────────────

/// Where analytics snapshots live between runs.
pub trait AnalyticsStore: Send + Sync {
    /// The last saved snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> AnalyticsResult<Option<AnalyticsSnapshot>>;

    fn save(&self, snapshot: &AnalyticsSnapshot) -> AnalyticsResult<()>;
}

impl AnalyticsStore for Box<dyn AnalyticsStore> {
    fn load(&self) -> AnalyticsResult<Option<AnalyticsSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &AnalyticsSnapshot) -> AnalyticsResult<()> {
        (**self).save(snapshot)
    }
}

/// One JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalyticsStore for JsonFileStore {
    fn load(&self) -> AnalyticsResult<Option<AnalyticsSnapshot>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        AnalyticsSnapshot::from_json(&json).map(Some)
    }

    fn save(&self, snapshot: &AnalyticsSnapshot) -> AnalyticsResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut out, snapshot)?;
            out.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved analytics snapshot");
        Ok(())
    }
}

/// Keeps the serialised snapshot in memory.  Round-trips through JSON so
/// that it behaves exactly like a file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    json: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw JSON, e.g. to test schema handling.
    pub fn with_json(json: impl Into<String>) -> Self {
        Self { json: Mutex::new(Some(json.into())) }
    }

    pub fn raw(&self) -> Option<String> {
        self.json.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AnalyticsStore for MemoryStore {
    fn load(&self) -> AnalyticsResult<Option<AnalyticsSnapshot>> {
        match self.raw() {
            Some(json) => AnalyticsSnapshot::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &AnalyticsSnapshot) -> AnalyticsResult<()> {
        let json = snapshot.to_json()?;
        *self.json.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
