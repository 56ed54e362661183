//! Geographic coordinate type and great-circle helpers.
//!
//! `Coordinate` uses `f64`.  Route corridors are ~20 m wide, i.e. about
//! 1.8e-4 degrees, which is below what `f32` can resolve reliably once the
//! integer part of a longitude is large.

use std::fmt;

use crate::ValidationError;

/// Metres per degree used for every metres↔degrees conversion.
///
/// Planar approximation: one degree of latitude.  Longitude degrees shrink
/// with `cos(lat)` but all corridor and search-radius arithmetic uses this
/// single constant so that results stay consistent between the index and
/// the matcher.
pub const METERS_PER_DEGREE: f64 = 111_139.0;

/// Mean Earth radius, kilometres.
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A validated WGS-84 position in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Validate and construct.  Non-finite values fail the range check.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Haversine great-circle distance to `other` in kilometres.
    #[inline]
    pub fn distance_km(self, other: Coordinate) -> f64 {
        haversine_km(self, other)
    }

    /// Offset by a number of metres north/east using the planar
    /// [`METERS_PER_DEGREE`] conversion.  No range check; callers building
    /// synthetic geometry stay well inside the valid domain.
    pub fn offset_m(self, north_m: f64, east_m: f64) -> Coordinate {
        Coordinate {
            lat: self.lat + north_m / METERS_PER_DEGREE,
            lon: self.lon + east_m / METERS_PER_DEGREE,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat * 0.5).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Sum of haversine distances between consecutive points, kilometres.
///
/// Fewer than two points → `0.0`.
pub fn path_length_km<I>(points: I) -> f64
where
    I: IntoIterator<Item = Coordinate>,
{
    let mut iter = points.into_iter();
    let Some(mut prev) = iter.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for p in iter {
        total += haversine_km(prev, p);
        prev = p;
    }
    total
}
