//! Coordinates and location grouping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept when grouping coordinates.
///
/// The alerts API rejects points with more than four decimals, so users whose
/// coordinates agree to this precision share a single query.
pub const LOCATION_PRECISION: i32 = 4;

const SCALE: f64 = 10_000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns the location group this point belongs to.
    pub fn key(&self) -> LocationKey {
        LocationKey {
            lat_e4: (self.latitude * SCALE).round() as i32,
            lon_e4: (self.longitude * SCALE).round() as i32,
        }
    }
}

/// A coordinate rounded to [`LOCATION_PRECISION`] decimals.
///
/// Stored as scaled integers so it can be hashed and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    lat_e4: i32,
    lon_e4: i32,
}

impl LocationKey {
    /// Returns the rounded point used for the alerts query.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat_e4 as f64 / SCALE, self.lon_e4 as f64 / SCALE)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let point = self.point();
        write!(
            f,
            "{:.prec$},{:.prec$}",
            point.latitude,
            point.longitude,
            prec = LOCATION_PRECISION as usize
        )
    }
}
