use crate::error::CoreError;
use crate::station::Station;
use csv::ReaderBuilder;
use log::info;
use std::collections::BTreeMap;

/// Required mapping-table columns, in any order. Remaining columns are kept
/// as per-station attributes (basin ids, per-catalog file paths, ...).
const REQUIRED_COLUMNS: [&str; 4] = ["station_id", "longitude", "latitude", "elevation"];

/// The catalog of grid-cell stations for one watershed.
///
/// Built once at watershed-selection time from a CSV mapping file and
/// read-only afterwards. Station order follows the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTable {
    stations: Vec<Station>,
    /// Non-required column headers, in source order.
    attribute_columns: Vec<String>,
}

impl MappingTable {
    /// Parse a mapping-table CSV.
    ///
    /// Expected header: `station_id,longitude,latitude,elevation` plus any
    /// number of extra columns. Duplicate station ids are rejected.
    pub fn parse_csv(csv_object: &str) -> Result<MappingTable, CoreError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(csv_object.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| CoreError::Csv {
                line: 1,
                reason: e.to_string(),
            })?
            .clone();
        let header_names: Vec<String> =
            headers.iter().map(|h| h.trim().to_string()).collect();

        let mut column_index: BTreeMap<&str, usize> = BTreeMap::new();
        for (idx, name) in header_names.iter().enumerate() {
            column_index.insert(name.as_str(), idx);
        }
        for required in REQUIRED_COLUMNS {
            if !column_index.contains_key(required) {
                return Err(CoreError::Csv {
                    line: 1,
                    reason: format!("missing required column: {required}"),
                });
            }
        }
        let attribute_columns: Vec<String> = header_names
            .iter()
            .filter(|name| !REQUIRED_COLUMNS.contains(&name.as_str()))
            .cloned()
            .collect();

        let mut stations: Vec<Station> = Vec::new();
        for (row_number, row) in rdr.records().enumerate() {
            let line = row_number + 2;
            let record = row.map_err(|e| CoreError::Csv {
                line,
                reason: e.to_string(),
            })?;

            let field = |name: &str| -> &str {
                record.get(column_index[name]).unwrap_or("").trim()
            };
            let number = |name: &str| -> Result<f64, CoreError> {
                field(name).parse::<f64>().map_err(|_| CoreError::Csv {
                    line,
                    reason: format!("bad {name} value: {}", field(name)),
                })
            };

            let station_id = field("station_id").to_string();
            if station_id.is_empty() {
                return Err(CoreError::Csv {
                    line,
                    reason: "empty station_id".to_string(),
                });
            }
            if stations.iter().any(|s| s.station_id == station_id) {
                return Err(CoreError::Csv {
                    line,
                    reason: format!("duplicate station_id: {station_id}"),
                });
            }

            let mut attributes = BTreeMap::new();
            for name in &attribute_columns {
                let value = field(name);
                if !value.is_empty() {
                    attributes.insert(name.clone(), value.to_string());
                }
            }

            stations.push(Station {
                station_id,
                longitude: number("longitude")?,
                latitude: number("latitude")?,
                elevation: number("elevation")?,
                attributes,
            });
        }

        info!(
            "parsed mapping table: {} stations, {} attribute columns",
            stations.len(),
            attribute_columns.len()
        );
        Ok(MappingTable {
            stations,
            attribute_columns,
        })
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn attribute_columns(&self) -> &[String] {
        &self.attribute_columns
    }

    /// Find a station by id.
    pub fn station(&self, station_id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    /// File paths for one catalog label (a mapping-table column holding
    /// per-station data file references), in station order.
    pub fn paths_for(&self, catalog: &str) -> Vec<Option<&str>> {
        self.stations
            .iter()
            .map(|s| s.attribute(catalog))
            .collect()
    }

    /// Station elevations in station order.
    pub fn elevations(&self) -> Vec<f64> {
        self.stations.iter().map(|s| s.elevation).collect()
    }

    /// Geographic extent of the catalog as
    /// (min_lon, min_lat, max_lon, max_lat). None for an empty table.
    pub fn geo_extent(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.stations.first()?;
        let mut extent = (
            first.longitude,
            first.latitude,
            first.longitude,
            first.latitude,
        );
        for s in &self.stations[1..] {
            extent.0 = extent.0.min(s.longitude);
            extent.1 = extent.1.min(s.latitude);
            extent.2 = extent.2.max(s.longitude);
            extent.3 = extent.3.max(s.latitude);
        }
        Some(extent)
    }

    /// Drop stations that duplicate an earlier station's grid key at the
    /// given source resolution (degrees). Keeps first occurrence.
    pub fn dedup_by_grid_key(&mut self, resolution: f64) -> usize {
        let mut seen: Vec<(i64, i64)> = Vec::with_capacity(self.stations.len());
        let before = self.stations.len();
        self.stations.retain(|s| {
            let key = s.grid_key(resolution);
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
        before - self.stations.len()
    }
}
