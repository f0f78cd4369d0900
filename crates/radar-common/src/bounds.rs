//! Geographic bounds for radar products.

use serde::{Deserialize, Serialize};

/// Normalize a longitude into [-180, 180].
///
/// GRIB2 grids commonly use the 0-360 convention; map clients expect
/// -180..180.
pub fn normalize_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Geographic bounding box of a radar image, in degrees.
///
/// `north >= south` and `west <= east` hold after construction through
/// [`GeoBounds::from_corners`]; longitudes are normalized to [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Fixed CONUS rectangle reported for Lambert Conformal products.
    pub const CONUS: GeoBounds = GeoBounds {
        north: 55.0,
        south: 20.0,
        east: -60.0,
        west: -130.0,
    };

    /// Build bounds from two grid corners given in any order.
    ///
    /// Longitudes above 180 are wrapped before the min/max is taken.
    pub fn from_corners(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        let lon1 = normalize_longitude(lon1);
        let lon2 = normalize_longitude(lon2);
        GeoBounds {
            north: lat1.max(lat2),
            south: lat1.min(lat2),
            east: lon1.max(lon2),
            west: lon1.min(lon2),
        }
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}
