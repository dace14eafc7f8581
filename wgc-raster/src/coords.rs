use crate::error::RasterError;
use serde::{Deserialize, Serialize};

/// A WGS84 geographic coordinate in degrees.
///
/// Geographic and projected coordinates are distinct types on purpose:
/// every spatial operation declares which reference system it takes and
/// returns, so degrees and meters cannot be mixed silently.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Degrees east
    pub lon: f64,
    /// Degrees north
    pub lat: f64,
}

/// A projected planar coordinate in meters (UTM easting/northing here).
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
}

impl GridPoint {
    /// Euclidean distance to another projected point, in meters.
    pub fn distance(&self, other: &GridPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A geographic bounding box in WGS84 degrees.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<GeoBounds, RasterError> {
        if !(min_lon.is_finite() && min_lat.is_finite() && max_lon.is_finite() && max_lat.is_finite())
        {
            return Err(RasterError::InvalidBounds {
                reason: "non-finite coordinate".to_string(),
            });
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(RasterError::InvalidBounds {
                reason: format!(
                    "min >= max: ({min_lon}, {min_lat}) vs ({max_lon}, {max_lat})"
                ),
            });
        }
        if min_lon < -180.0 || max_lon > 180.0 || min_lat < -90.0 || max_lat > 90.0 {
            return Err(RasterError::InvalidBounds {
                reason: "coordinates outside WGS84 range".to_string(),
            });
        }
        Ok(GeoBounds {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint { lon: self.min_lon, lat: self.min_lat },
            GeoPoint { lon: self.max_lon, lat: self.min_lat },
            GeoPoint { lon: self.max_lon, lat: self.max_lat },
            GeoPoint { lon: self.min_lon, lat: self.max_lat },
        ]
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lon >= self.min_lon && p.lon <= self.max_lon && p.lat >= self.min_lat && p.lat <= self.max_lat
    }
}

/// A projected envelope in meters.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl GridBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: &GridPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}
