use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One grid-cell station from a watershed mapping table.
///
/// A station is a point on the source climate grid: its coordinates, its
/// elevation, and whatever extra columns the mapping table carried (basin
/// id, per-catalog data file paths, ...). Immutable once parsed.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    /// WGS84 degrees, east positive
    pub longitude: f64,
    /// WGS84 degrees, north positive
    pub latitude: f64,
    /// Meters above sea level
    pub elevation: f64,
    /// Extra mapping-table columns, keyed by header name.
    pub attributes: BTreeMap<String, String>,
}

impl Station {
    /// Composite identity of the station: longitude/latitude rounded to the
    /// source grid resolution (in degrees). Two stations sharing a grid key
    /// describe the same source cell.
    pub fn grid_key(&self, resolution: f64) -> (i64, i64) {
        (
            (self.longitude / resolution).round() as i64,
            (self.latitude / resolution).round() as i64,
        )
    }

    /// Look up an extra attribute column by header name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
