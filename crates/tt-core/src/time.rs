//! Wall-clock time model.
//!
//! Pings carry a [`Timestamp`]: whole seconds since the Unix epoch, UTC.  An
//! integer representation keeps window comparisons exact and makes the
//! per-rider monotonicity check a plain integer compare.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::ValidationError;

const SECS_PER_DAY: i64 = 86_400;

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// Seconds since the Unix epoch (UTC).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Timestamp(Utc::now().timestamp())
    }

    /// Parse an RFC 3339 timestamp (`2024-05-01T08:30:00Z`,
    /// `2024-05-01T10:30:00+02:00`), an offset-less ISO timestamp (read as
    /// UTC) or a decimal count of Unix seconds.
    ///
    /// Unix seconds outside the range a calendar date can represent are
    /// rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<i64>() {
            return DateTime::<Utc>::from_timestamp(secs, 0)
                .map(|_| Timestamp(secs))
                .ok_or_else(|| ValidationError::InvalidTimestamp(s.to_owned()));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Timestamp(dt.timestamp()));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Timestamp(naive.and_utc().timestamp()))
            .map_err(|_| ValidationError::InvalidTimestamp(s.to_owned()))
    }

    /// Seconds elapsed from `earlier` to `self`; negative if `earlier` is
    /// actually later.  Saturates at the `i64` bounds.
    #[inline]
    pub fn secs_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Midnight UTC of the day containing `self`.
    #[inline]
    pub fn start_of_day(self) -> Timestamp {
        Timestamp(self.0.saturating_sub(self.0.rem_euclid(SECS_PER_DAY)))
    }
}

impl std::ops::Add<i64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, secs: i64) -> Timestamp {
        Timestamp(self.0.saturating_add(secs))
    }
}

impl std::ops::Sub<i64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn sub(self, secs: i64) -> Timestamp {
        Timestamp(self.0.saturating_sub(secs))
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: Timestamp) -> i64 {
        self.secs_since(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.0, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "@{}", self.0),
        }
    }
}

// ── Timeframe ─────────────────────────────────────────────────────────────────

/// Reporting window for per-rider travel statistics.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Timeframe {
    /// Since midnight UTC today.
    #[default]
    Daily,
    /// The trailing 7 days.
    Weekly,
    /// The trailing 30 days.
    Monthly,
    /// Everything on record.
    All,
}

impl Timeframe {
    /// Earliest trip start included in the window ending at `now`.
    /// `None` means unbounded.
    pub fn since(self, now: Timestamp) -> Option<Timestamp> {
        match self {
            Timeframe::Daily   => Some(now.start_of_day()),
            Timeframe::Weekly  => Some(now - 7 * SECS_PER_DAY),
            Timeframe::Monthly => Some(now - 30 * SECS_PER_DAY),
            Timeframe::All     => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Daily   => "daily",
            Timeframe::Weekly  => "weekly",
            Timeframe::Monthly => "monthly",
            Timeframe::All     => "all",
        }
    }
}

impl FromStr for Timeframe {
    type Err = std::convert::Infallible;

    /// Unrecognised names fall back to [`Timeframe::All`], matching the
    /// outer service's "anything else means all time" contract.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "daily"   => Timeframe::Daily,
            "weekly"  => Timeframe::Weekly,
            "monthly" => Timeframe::Monthly,
            _         => Timeframe::All,
        })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
