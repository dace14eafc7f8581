use crate::coords::GridPoint;
use crate::error::RasterError;
use crate::grid::RasterGrid;
use log::warn;
use wgc_core::mapping_table::MappingTable;

/// Nearest-station assignment from raster cells to mapping-table stations.
///
/// Every cell center is matched to its nearest station by Euclidean
/// distance in the grid's projected plane; ties resolve to the lowest
/// station id. Cells farther than `max_distance` from every station stay
/// unassigned (no data). Built once per grid + mapping table pair and
/// read-only afterwards.
///
/// The scan is the naive stations-times-cells loop; at the scale this
/// pipeline runs (hundreds of stations, thousands of cells) that is fine.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossmap {
    grid: RasterGrid,
    station_ids: Vec<String>,
    station_points: Vec<GridPoint>,
    elevations: Vec<f64>,
    /// Per cell, row-major: index into `station_ids`, or None for no data.
    assignments: Vec<Option<usize>>,
}

impl Crossmap {
    /// Assign every cell of `grid` to its nearest station within
    /// `max_distance` meters.
    pub fn build(
        grid: RasterGrid,
        table: &MappingTable,
        max_distance: f64,
    ) -> Result<Crossmap, RasterError> {
        let mut station_ids = Vec::with_capacity(table.len());
        let mut station_points = Vec::with_capacity(table.len());
        let mut elevations = Vec::with_capacity(table.len());
        for station in table.stations() {
            let point = grid.projection.forward(&crate::coords::GeoPoint {
                lon: station.longitude,
                lat: station.latitude,
            })?;
            station_ids.push(station.station_id.clone());
            station_points.push(point);
            elevations.push(station.elevation);
        }

        let mut assignments = vec![None; grid.len()];
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let center = grid.cell_center(row, col);
                let mut best: Option<(usize, f64)> = None;
                for (idx, point) in station_points.iter().enumerate() {
                    let distance = center.distance(point);
                    if distance > max_distance {
                        continue;
                    }
                    best = match best {
                        None => Some((idx, distance)),
                        Some((best_idx, best_distance)) => {
                            if distance < best_distance
                                || (distance == best_distance
                                    && station_ids[idx] < station_ids[best_idx])
                            {
                                Some((idx, distance))
                            } else {
                                Some((best_idx, best_distance))
                            }
                        }
                    };
                }
                assignments[grid.cell_index(row, col)] = best.map(|(idx, _)| idx);
            }
        }

        let unassigned = assignments.iter().filter(|a| a.is_none()).count();
        if unassigned > 0 {
            warn!(
                "{unassigned} of {} cells have no station within {max_distance} m",
                assignments.len()
            );
        }

        Ok(Crossmap {
            grid,
            station_ids,
            station_points,
            elevations,
            assignments,
        })
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn station_ids(&self) -> &[String] {
        &self.station_ids
    }

    /// Station index assigned to a row-major cell index.
    pub fn assignment(&self, cell: usize) -> Option<usize> {
        self.assignments[cell]
    }

    /// Station id assigned to a cell, if any.
    pub fn station_for_cell(&self, row: usize, col: usize) -> Option<&str> {
        self.assignments[self.grid.cell_index(row, col)]
            .map(|idx| self.station_ids[idx].as_str())
    }

    /// Projected location of a station.
    pub fn station_point(&self, idx: usize) -> &GridPoint {
        &self.station_points[idx]
    }

    /// Number of cells with an assigned station.
    pub fn assigned_cells(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_some()).count()
    }

    /// Spread an arbitrary per-station attribute over the raster: each cell
    /// takes its station's value, unassigned cells take the sentinel.
    /// `values` must be in station order.
    pub fn attribute_field(&self, values: &[f64], nodata: f64) -> Result<Vec<f64>, RasterError> {
        if values.len() != self.station_ids.len() {
            return Err(RasterError::AttributeLength {
                expected: self.station_ids.len(),
                actual: values.len(),
            });
        }
        Ok(self
            .assignments
            .iter()
            .map(|a| a.map_or(nodata, |idx| values[idx]))
            .collect())
    }

    /// The station elevation raster, for inspection and plotting.
    pub fn elevation_field(&self, nodata: f64) -> Vec<f64> {
        self.assignments
            .iter()
            .map(|a| a.map_or(nodata, |idx| self.elevations[idx]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::GeoBounds;
    use crate::grid::RasterGrid;
    use crate::NO_DATA_SENTINEL;
    use wgc_core::mapping_table::MappingTable;

    const MAPPING_CSV: &str = "\
station_id,longitude,latitude,elevation
S164,-121.75,47.85,164
S1500,-121.05,48.55,1500
";

    fn small_grid() -> RasterGrid {
        let bounds = GeoBounds::new(-121.8, 47.8, -121.0, 48.6).unwrap();
        // 2x2-ish coarse grid
        RasterGrid::build(&bounds, 40_000.0, 50_000.0).unwrap()
    }

    #[test]
    fn test_nearest_assignment() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let grid = small_grid();
        let crossmap = Crossmap::build(grid, &table, f64::INFINITY).unwrap();

        // Southwest corner cell belongs to the southwest station,
        // northeast corner cell to the northeast station.
        let rows = crossmap.grid().rows;
        let cols = crossmap.grid().cols;
        assert_eq!(crossmap.station_for_cell(rows - 1, 0), Some("S164"));
        assert_eq!(crossmap.station_for_cell(0, cols - 1), Some("S1500"));
        assert_eq!(crossmap.assigned_cells(), crossmap.grid().len());
    }

    #[test]
    fn test_max_distance_leaves_no_data() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let grid = small_grid();
        let max_distance = 20_000.0;
        let crossmap = Crossmap::build(grid, &table, max_distance).unwrap();

        assert!(crossmap.assigned_cells() < crossmap.grid().len());
        // Every assigned cell really is within the threshold
        for row in 0..crossmap.grid().rows {
            for col in 0..crossmap.grid().cols {
                let cell = crossmap.grid().cell_index(row, col);
                if let Some(idx) = crossmap.assignment(cell) {
                    let center = crossmap.grid().cell_center(row, col);
                    assert!(center.distance(crossmap.station_point(idx)) <= max_distance);
                }
            }
        }
    }

    #[test]
    fn test_tie_break_lowest_station_id() {
        // Two stations at the same location: the lexicographically lower
        // id must win every cell.
        let csv = "station_id,longitude,latitude,elevation\n\
                   B2,-121.4,48.2,200\n\
                   A1,-121.4,48.2,100\n";
        let table = MappingTable::parse_csv(csv).unwrap();
        let grid = small_grid();
        let crossmap = Crossmap::build(grid, &table, f64::INFINITY).unwrap();
        for row in 0..crossmap.grid().rows {
            for col in 0..crossmap.grid().cols {
                assert_eq!(crossmap.station_for_cell(row, col), Some("A1"));
            }
        }
    }

    #[test]
    fn test_elevation_field() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let grid = small_grid();
        let crossmap = Crossmap::build(grid, &table, 20_000.0).unwrap();
        let field = crossmap.elevation_field(NO_DATA_SENTINEL);
        assert_eq!(field.len(), crossmap.grid().len());
        assert!(field.contains(&NO_DATA_SENTINEL));
        assert!(field.iter().any(|&v| v == 164.0 || v == 1500.0));
    }

    #[test]
    fn test_attribute_field_length_checked() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let crossmap = Crossmap::build(small_grid(), &table, f64::INFINITY).unwrap();
        assert!(matches!(
            crossmap.attribute_field(&[1.0], NO_DATA_SENTINEL),
            Err(RasterError::AttributeLength { expected: 2, actual: 1 })
        ));
    }
}
