//! Render one summary bucket onto a raster grid and export artifacts.

use anyhow::Context;
use log::info;
use std::path::PathBuf;
use wgc_core::mapping_table::MappingTable;
use wgc_core::summary::{LongTermSummary, SummaryKey};
use wgc_raster::coords::GeoBounds;
use wgc_raster::crossmap::Crossmap;
use wgc_raster::export;
use wgc_raster::grid::RasterGrid;
use wgc_raster::render::render;

pub struct RasterizeArgs {
    pub mapping: String,
    pub summary: String,
    pub key: String,
    pub bucket: String,
    pub cell_size: f64,
    pub max_distance: Option<f64>,
    pub nodata: f64,
    pub points: String,
    pub cells: Option<String>,
    pub grid_csv: Option<String>,
}

/// Run the rasterization pipeline: build the grid over the mapping table's
/// extent, crossmap cells to stations, render the requested bucket, and
/// export the GeoJSON (and optional grid CSV) artifacts.
///
/// Nothing is written until every compute step has succeeded, so a failure
/// partway leaves no partial artifacts behind.
pub fn run_rasterize(args: &RasterizeArgs) -> anyhow::Result<Vec<PathBuf>> {
    let key: SummaryKey = args.key.parse()?;

    let mapping_text = std::fs::read_to_string(&args.mapping)
        .with_context(|| format!("reading mapping table {}", args.mapping))?;
    let table = MappingTable::parse_csv(&mapping_text)?;
    let (min_lon, min_lat, max_lon, max_lat) = table
        .geo_extent()
        .ok_or_else(|| anyhow::anyhow!("mapping table {} has no stations", args.mapping))?;

    let summary_text = std::fs::read_to_string(&args.summary)
        .with_context(|| format!("reading summary {}", args.summary))?;
    let summary = LongTermSummary::from_json(&summary_text)?;
    let summary_table = summary
        .get(&key)
        .ok_or_else(|| anyhow::anyhow!("summary {} has no entry for {}", args.summary, key))?;

    let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat)?;
    let grid = RasterGrid::build(&bounds, args.cell_size, args.cell_size)?;
    info!(
        "grid: {} x {} cells of {} m, UTM zone {}",
        grid.rows, grid.cols, args.cell_size, grid.projection.zone
    );

    let max_distance = args.max_distance.unwrap_or(f64::INFINITY);
    let crossmap = Crossmap::build(grid, &table, max_distance)?;
    info!(
        "crossmap: {} of {} cells assigned across {} stations",
        crossmap.assigned_cells(),
        crossmap.grid().len(),
        table.len()
    );

    let rendered = render(summary_table, &args.bucket, &crossmap, args.nodata)?;

    // All computation done; produce every artifact body before writing any
    let points_body = export::to_geojson_string(export::rendered_points(&crossmap, &rendered)?);
    let cells_body = match &args.cells {
        Some(_) => Some(export::to_geojson_string(export::rendered_cells(
            &crossmap, &rendered,
        )?)),
        None => None,
    };
    let grid_csv_body = args.grid_csv.as_ref().map(|_| grid_csv(&crossmap, &rendered));

    let mut artifacts = Vec::new();
    std::fs::write(&args.points, points_body)
        .with_context(|| format!("writing points {}", args.points))?;
    artifacts.push(PathBuf::from(&args.points));
    if let (Some(path), Some(body)) = (&args.cells, cells_body) {
        std::fs::write(path, body).with_context(|| format!("writing cells {path}"))?;
        artifacts.push(PathBuf::from(path));
    }
    if let (Some(path), Some(body)) = (&args.grid_csv, grid_csv_body) {
        std::fs::write(path, body).with_context(|| format!("writing grid csv {path}"))?;
        artifacts.push(PathBuf::from(path));
    }

    info!("rasterize complete: bucket {} of {}", args.bucket, key);
    for path in &artifacts {
        info!("  wrote {}", path.display());
    }
    Ok(artifacts)
}

/// The raw rendered field as CSV, one line per grid row, north first.
fn grid_csv(crossmap: &Crossmap, rendered: &[f64]) -> String {
    let grid = crossmap.grid();
    let mut out = String::new();
    for row in 0..grid.rows {
        let line: Vec<String> = (0..grid.cols)
            .map(|col| format!("{}", rendered[grid.cell_index(row, col)]))
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wgc_core::aggregate::{SummaryTable, TimeBucket};
    use wgc_core::summary::AggregationKind;

    const MAPPING_CSV: &str = "\
station_id,longitude,latitude,elevation
A,-121.6,47.9,164
B,-121.1,48.5,2216
";

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("wgc-rasterize-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_fixture(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn summary_json() -> String {
        let mut summary = LongTermSummary::new();
        let key = SummaryKey::new(AggregationKind::MeanByMonthSum, "Prec", "livneh2013");
        summary.insert(
            &key,
            SummaryTable {
                buckets: (1..=12).map(TimeBucket::MonthOfYear).collect(),
                station_ids: vec!["A".to_string(), "B".to_string()],
                values: (0..24).map(|i| i as f64).collect(),
            },
        );
        summary.to_json().unwrap()
    }

    fn args(dir: &Path) -> RasterizeArgs {
        RasterizeArgs {
            mapping: write_fixture(dir, "mapping.csv", MAPPING_CSV),
            summary: write_fixture(dir, "summary.json", &summary_json()),
            key: "meanbymonthsum:Prec:livneh2013".to_string(),
            bucket: "12".to_string(),
            cell_size: 20_000.0,
            max_distance: None,
            nodata: wgc_raster::NO_DATA_SENTINEL,
            points: dir.join("points.geojson").to_string_lossy().into_owned(),
            cells: Some(dir.join("cells.geojson").to_string_lossy().into_owned()),
            grid_csv: Some(dir.join("grid.csv").to_string_lossy().into_owned()),
        }
    }

    #[test]
    fn test_run_rasterize_writes_artifacts() {
        let dir = temp_dir("basic");
        let artifacts = run_rasterize(&args(&dir)).unwrap();
        assert_eq!(artifacts.len(), 3);

        let points = std::fs::read_to_string(&artifacts[0]).unwrap();
        assert!(points.contains("\"FeatureCollection\""));
        assert!(points.contains("\"station_id\""));

        let cells = std::fs::read_to_string(&artifacts[1]).unwrap();
        assert!(cells.contains("\"Polygon\""));

        let grid = std::fs::read_to_string(&artifacts[2]).unwrap();
        assert!(!grid.trim().is_empty());
        // Every grid value is one of the two December entries
        for value in grid.trim().lines().flat_map(|l| l.split(',')) {
            let v: f64 = value.parse().unwrap();
            assert!(v == 22.0 || v == 23.0);
        }
    }

    #[test]
    fn test_unknown_bucket_writes_nothing() {
        let dir = temp_dir("nobucket");
        let mut bad = args(&dir);
        bad.bucket = "13".to_string();
        assert!(run_rasterize(&bad).is_err());
        assert!(!dir.join("points.geojson").exists());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = temp_dir("nokey");
        let mut bad = args(&dir);
        bad.key = "yearsum:Prec:livneh2013".to_string();
        let err = run_rasterize(&bad).unwrap_err();
        assert!(err.to_string().contains("yearsum"));
    }
}
