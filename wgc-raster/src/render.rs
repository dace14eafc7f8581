use crate::crossmap::Crossmap;
use crate::error::RasterError;
use wgc_core::aggregate::SummaryTable;

/// Project one time bucket of a summary table onto the raster.
///
/// Returns a flat row-major array of rows x cols values: each cell carries
/// the statistic of its assigned station for the requested bucket, or the
/// caller-supplied no-data sentinel where the crossmap left the cell
/// unassigned. Pure function of its inputs; identical inputs produce
/// bit-identical output.
pub fn render(
    table: &SummaryTable,
    bucket: &str,
    crossmap: &Crossmap,
    nodata: f64,
) -> Result<Vec<f64>, RasterError> {
    let row = table
        .bucket_row(bucket)
        .ok_or_else(|| RasterError::BucketNotFound {
            bucket: bucket.to_string(),
        })?;

    // Resolve each assigned station to its table column up front, so a
    // missing station fails before any output is produced. One pass over
    // the assignments marks which stations are in play.
    let mut assigned = vec![false; crossmap.station_ids().len()];
    for cell in 0..crossmap.grid().len() {
        if let Some(idx) = crossmap.assignment(cell) {
            assigned[idx] = true;
        }
    }
    let mut columns: Vec<Option<usize>> = Vec::with_capacity(crossmap.station_ids().len());
    for (idx, station_id) in crossmap.station_ids().iter().enumerate() {
        if !assigned[idx] {
            columns.push(None);
            continue;
        }
        match table.station_col(station_id) {
            Some(col) => columns.push(Some(col)),
            None => {
                return Err(RasterError::UnknownStation {
                    station: station_id.clone(),
                })
            }
        }
    }

    let values = table.row_values(row);
    Ok((0..crossmap.grid().len())
        .map(|cell| match crossmap.assignment(cell) {
            Some(idx) => values[columns[idx].expect("assigned station resolved above")],
            None => nodata,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::coords::GeoBounds;
    use crate::crossmap::Crossmap;
    use crate::error::RasterError;
    use crate::grid::RasterGrid;
    use crate::projection::UtmProjection;
    use crate::NO_DATA_SENTINEL;
    use chrono::NaiveDate;
    use wgc_core::aggregate::{
        bucket_totals, long_term_by_month, PartialBucketPolicy, Statistic, Window,
    };
    use wgc_core::mapping_table::MappingTable;
    use wgc_core::series::DailySeries;

    const MAPPING_CSV: &str = "\
station_id,longitude,latitude,elevation
S164,-121.7,47.9,164
S1500,-121.4,48.2,1500
S2216,-121.1,48.5,2216
";

    /// A 2x2 grid spanning the three stations' bounding box.
    fn two_by_two_grid(bounds: &GeoBounds) -> RasterGrid {
        let projection = UtmProjection::for_bounds(bounds).unwrap();
        let corners: Vec<_> = bounds
            .corners()
            .iter()
            .map(|c| projection.forward(c).unwrap())
            .collect();
        let width = corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max)
            - corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
        let height = corners.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max)
            - corners.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
        let grid = RasterGrid::build(bounds, width / 2.0 + 1.0, height / 2.0 + 1.0).unwrap();
        assert_eq!((grid.rows, grid.cols), (2, 2));
        grid
    }

    /// One full synthetic year of precipitation: station i rains
    /// (i + 1) mm every day.
    fn synthetic_year(table: &MappingTable) -> Vec<DailySeries> {
        table
            .stations()
            .iter()
            .enumerate()
            .map(|(i, s)| DailySeries {
                station_id: s.station_id.clone(),
                variable: "Prec".to_string(),
                start_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                values: vec![(i + 1) as f64; 365],
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_december_sums() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let series = synthetic_year(&table);
        let refs: Vec<&DailySeries> = series.iter().collect();
        let monthly = bucket_totals(
            &refs,
            Window::Month,
            Statistic::Sum,
            PartialBucketPolicy::Include,
        )
        .unwrap();
        let ltm = long_term_by_month(&monthly).unwrap();

        let (min_lon, min_lat, max_lon, max_lat) = table.geo_extent().unwrap();
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap();
        let grid = two_by_two_grid(&bounds);
        let crossmap = Crossmap::build(grid, &table, f64::INFINITY).unwrap();

        let rendered = render(&ltm, "12", &crossmap, NO_DATA_SENTINEL).unwrap();
        assert_eq!(rendered.len(), 4);

        // Every cell reproduces its assigned station's December sum exactly
        let december_sum = |station_id: &str| {
            let col = ltm.station_col(station_id).unwrap();
            let row = ltm.bucket_row("12").unwrap();
            ltm.value(row, col)
        };
        for row in 0..2 {
            for col in 0..2 {
                let station = crossmap.station_for_cell(row, col).unwrap();
                let cell = crossmap.grid().cell_index(row, col);
                assert_eq!(rendered[cell], december_sum(station));
            }
        }
        // Corner cells belong to the corner stations: 31 days of 1 mm and
        // 3 mm respectively
        let sw = crossmap.grid().cell_index(1, 0);
        let ne = crossmap.grid().cell_index(0, 1);
        assert_eq!(rendered[sw], 31.0);
        assert_eq!(rendered[ne], 93.0);
    }

    #[test]
    fn test_end_to_end_out_of_threshold_cell_is_no_data() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let series = synthetic_year(&table);
        let refs: Vec<&DailySeries> = series.iter().collect();
        let monthly = bucket_totals(
            &refs,
            Window::Month,
            Statistic::Sum,
            PartialBucketPolicy::Include,
        )
        .unwrap();
        let ltm = long_term_by_month(&monthly).unwrap();

        let (min_lon, min_lat, max_lon, max_lat) = table.geo_extent().unwrap();
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap();
        let grid = two_by_two_grid(&bounds);
        // Stations sit on the box diagonal; a tight threshold strands the
        // off-diagonal cells.
        let crossmap = Crossmap::build(grid, &table, 15_000.0).unwrap();
        assert!(crossmap.assigned_cells() < 4);

        let rendered = render(&ltm, "12", &crossmap, NO_DATA_SENTINEL).unwrap();
        assert!(rendered.contains(&NO_DATA_SENTINEL));
        for row in 0..2 {
            for col in 0..2 {
                let cell = crossmap.grid().cell_index(row, col);
                if crossmap.station_for_cell(row, col).is_none() {
                    assert_eq!(rendered[cell], NO_DATA_SENTINEL);
                } else {
                    assert_ne!(rendered[cell], NO_DATA_SENTINEL);
                }
            }
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let series = synthetic_year(&table);
        let refs: Vec<&DailySeries> = series.iter().collect();
        let monthly = bucket_totals(
            &refs,
            Window::Month,
            Statistic::Sum,
            PartialBucketPolicy::Include,
        )
        .unwrap();
        let ltm = long_term_by_month(&monthly).unwrap();

        let (min_lon, min_lat, max_lon, max_lat) = table.geo_extent().unwrap();
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap();
        let crossmap = Crossmap::build(two_by_two_grid(&bounds), &table, f64::INFINITY).unwrap();

        let first = render(&ltm, "6", &crossmap, NO_DATA_SENTINEL).unwrap();
        let second = render(&ltm, "6", &crossmap, NO_DATA_SENTINEL).unwrap();
        let first_bits: Vec<u64> = first.iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u64> = second.iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn test_unknown_bucket_rejected() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        let series = synthetic_year(&table);
        let refs: Vec<&DailySeries> = series.iter().collect();
        let monthly = bucket_totals(
            &refs,
            Window::Month,
            Statistic::Sum,
            PartialBucketPolicy::Include,
        )
        .unwrap();
        let ltm = long_term_by_month(&monthly).unwrap();

        let (min_lon, min_lat, max_lon, max_lat) = table.geo_extent().unwrap();
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap();
        let crossmap = Crossmap::build(two_by_two_grid(&bounds), &table, f64::INFINITY).unwrap();

        let err = render(&ltm, "13", &crossmap, NO_DATA_SENTINEL).unwrap_err();
        assert_eq!(
            err,
            RasterError::BucketNotFound {
                bucket: "13".to_string()
            }
        );
    }

    #[test]
    fn test_unassigned_station_may_be_absent_from_table() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        // Summary covers two of the three stations; the threshold strands
        // every cell, so the missing station is never looked up.
        let series = synthetic_year(&table);
        let refs: Vec<&DailySeries> = series[..2].iter().collect();
        let monthly = bucket_totals(
            &refs,
            Window::Month,
            Statistic::Sum,
            PartialBucketPolicy::Include,
        )
        .unwrap();
        let ltm = long_term_by_month(&monthly).unwrap();

        let (min_lon, min_lat, max_lon, max_lat) = table.geo_extent().unwrap();
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap();
        let crossmap = Crossmap::build(two_by_two_grid(&bounds), &table, 15_000.0).unwrap();
        assert!(crossmap.assigned_cells() < 4);

        let rendered = render(&ltm, "12", &crossmap, NO_DATA_SENTINEL).unwrap();
        for (cell, value) in rendered.iter().enumerate() {
            if crossmap.assignment(cell).is_none() {
                assert_eq!(*value, NO_DATA_SENTINEL);
            }
        }
    }

    #[test]
    fn test_assigned_station_missing_from_table() {
        let table = MappingTable::parse_csv(MAPPING_CSV).unwrap();
        // Summary only covers two of the three stations
        let series = synthetic_year(&table);
        let refs: Vec<&DailySeries> = series[..2].iter().collect();
        let monthly = bucket_totals(
            &refs,
            Window::Month,
            Statistic::Sum,
            PartialBucketPolicy::Include,
        )
        .unwrap();
        let ltm = long_term_by_month(&monthly).unwrap();

        let (min_lon, min_lat, max_lon, max_lat) = table.geo_extent().unwrap();
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap();
        let crossmap = Crossmap::build(two_by_two_grid(&bounds), &table, f64::INFINITY).unwrap();

        let err = render(&ltm, "12", &crossmap, NO_DATA_SENTINEL).unwrap_err();
        assert_eq!(
            err,
            RasterError::UnknownStation {
                station: "S2216".to_string()
            }
        );
    }
}
