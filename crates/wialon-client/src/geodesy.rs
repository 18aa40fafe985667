//! Spherical geometry helpers

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Geographic point as transmitted by the API (`y` latitude, `x` longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "y")]
    pub latitude: f64,
    #[serde(rename = "x")]
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Haversine distance to another point in meters
    pub fn distance_to(&self, other: &Point) -> f64 {
        distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Great-circle distance in meters between two points given in degrees
pub fn distance(latitude_1: f64, longitude_1: f64, latitude_2: f64, longitude_2: f64) -> f64 {
    let (lat1, lat2) = (latitude_1.to_radians(), latitude_2.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (longitude_2 - longitude_1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points
    2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
}
