//! Command implementations for WGC CLI.
//!
//! Provides subcommands for aggregating station time series into summary
//! statistic tables and rasterizing them over a watershed grid.

use clap::Subcommand;
use std::path::PathBuf;

pub mod aggregate;
pub mod rasterize;

#[derive(Subcommand)]
pub enum Command {
    /// Aggregate per-station daily series into a summary dictionary
    Aggregate {
        /// Path to the watershed mapping-table CSV
        #[arg(short = 'm', long)]
        mapping: String,

        /// Path to the per-station daily series CSV (station_id,date,value)
        #[arg(short = 's', long)]
        series: String,

        /// Climate variable name (e.g. Prec, Tmax)
        #[arg(short = 'v', long)]
        variable: String,

        /// Dataset label the series came from (e.g. livneh2013)
        #[arg(short = 'd', long)]
        dataset: String,

        /// Aggregation window: month or year
        #[arg(long, default_value = "month")]
        window: String,

        /// Bucket statistic: sum or mean
        #[arg(long, default_value = "sum")]
        statistic: String,

        /// Drop calendar buckets only partially covered by the series
        #[arg(long)]
        exclude_partial: bool,

        /// Output path for the summary dictionary JSON
        #[arg(short = 'o', long)]
        output: String,
    },

    /// Render one summary bucket onto a raster grid and export GeoJSON
    Rasterize {
        /// Path to the watershed mapping-table CSV
        #[arg(short = 'm', long)]
        mapping: String,

        /// Path to the summary dictionary JSON written by `aggregate`
        #[arg(short = 's', long)]
        summary: String,

        /// Summary dictionary key, kind:variable:dataset
        #[arg(short = 'k', long)]
        key: String,

        /// Time bucket label to render (e.g. "12", "2015-06", "2015")
        #[arg(short = 'b', long)]
        bucket: String,

        /// Square cell size in projected meters
        #[arg(short = 'c', long)]
        cell_size: f64,

        /// Leave cells farther than this (meters) from every station unassigned
        #[arg(long)]
        max_distance: Option<f64>,

        /// No-data sentinel written into unassigned cells
        #[arg(long, default_value_t = wgc_raster::NO_DATA_SENTINEL)]
        nodata: f64,

        /// Output path for the cell-center point GeoJSON
        #[arg(short = 'p', long)]
        points: String,

        /// Optional output path for the cell-polygon GeoJSON
        #[arg(long)]
        cells: Option<String>,

        /// Optional output path for the raw grid values CSV
        #[arg(long)]
        grid_csv: Option<String>,
    },
}

/// Dispatch a parsed subcommand. Returns the artifact paths it wrote.
pub fn run(command: Command) -> anyhow::Result<Vec<PathBuf>> {
    match command {
        Command::Aggregate {
            mapping,
            series,
            variable,
            dataset,
            window,
            statistic,
            exclude_partial,
            output,
        } => aggregate::run_aggregate(&aggregate::AggregateArgs {
            mapping,
            series,
            variable,
            dataset,
            window,
            statistic,
            exclude_partial,
            output,
        }),
        Command::Rasterize {
            mapping,
            summary,
            key,
            bucket,
            cell_size,
            max_distance,
            nodata,
            points,
            cells,
            grid_csv,
        } => rasterize::run_rasterize(&rasterize::RasterizeArgs {
            mapping,
            summary,
            key,
            bucket,
            cell_size,
            max_distance,
            nodata,
            points,
            cells,
            grid_csv,
        }),
    }
}
