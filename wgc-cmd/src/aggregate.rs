//! Aggregate per-station daily series into the summary dictionary.

use anyhow::Context;
use log::info;
use std::path::PathBuf;
use wgc_core::aggregate::{
    bucket_totals, long_term_by_month, PartialBucketPolicy, Statistic, Window,
};
use wgc_core::error::CoreError;
use wgc_core::mapping_table::MappingTable;
use wgc_core::series::SeriesStore;
use wgc_core::summary::{AggregationKind, LongTermSummary, SummaryKey};

pub struct AggregateArgs {
    pub mapping: String,
    pub series: String,
    pub variable: String,
    pub dataset: String,
    pub window: String,
    pub statistic: String,
    pub exclude_partial: bool,
    pub output: String,
}

/// Run the aggregation pipeline: parse the mapping table and series CSV,
/// reduce to bucket totals, collapse monthly tables to the long-term
/// month-of-year table, and write the summary dictionary JSON.
///
/// The output file is written only after every compute step has succeeded.
pub fn run_aggregate(args: &AggregateArgs) -> anyhow::Result<Vec<PathBuf>> {
    let window = match args.window.as_str() {
        "month" => Window::Month,
        "year" => Window::Year,
        other => anyhow::bail!("unknown window: {other} (expected month or year)"),
    };
    let statistic = match args.statistic.as_str() {
        "sum" => Statistic::Sum,
        "mean" => Statistic::Mean,
        other => anyhow::bail!("unknown statistic: {other} (expected sum or mean)"),
    };
    let policy = if args.exclude_partial {
        PartialBucketPolicy::Exclude
    } else {
        PartialBucketPolicy::Include
    };

    let mapping_text = std::fs::read_to_string(&args.mapping)
        .with_context(|| format!("reading mapping table {}", args.mapping))?;
    let table = MappingTable::parse_csv(&mapping_text)?;
    info!("mapping table: {} stations", table.len());

    let series_text = std::fs::read_to_string(&args.series)
        .with_context(|| format!("reading series {}", args.series))?;
    let mut store = SeriesStore::new();
    store.parse_series_csv(&series_text, &args.variable)?;
    let series = store.for_variable(&args.variable);
    anyhow::ensure!(
        !series.is_empty(),
        "no {} series found in {}",
        args.variable,
        args.series
    );
    // Every series station must exist in the mapping table
    for s in &series {
        if table.station(&s.station_id).is_none() {
            return Err(CoreError::UnknownStation {
                station: s.station_id.clone(),
            }
            .into());
        }
    }
    info!(
        "{} {} series, {} to {}",
        series.len(),
        args.variable,
        series[0].start_date,
        series[0].end_date()
    );

    let bucketed = bucket_totals(&series, window, statistic, policy)?;
    let mut summary = LongTermSummary::new();
    match window {
        Window::Month => {
            let kind = match statistic {
                Statistic::Sum => AggregationKind::MonthSum,
                Statistic::Mean => AggregationKind::MonthMean,
            };
            let long_term = long_term_by_month(&bucketed)?;
            let long_term_kind = match statistic {
                Statistic::Sum => AggregationKind::MeanByMonthSum,
                Statistic::Mean => AggregationKind::MeanByMonthMean,
            };
            log_profiles(&long_term);
            summary.insert(
                &SummaryKey::new(kind, &args.variable, &args.dataset),
                bucketed,
            );
            summary.insert(
                &SummaryKey::new(long_term_kind, &args.variable, &args.dataset),
                long_term,
            );
        }
        Window::Year => {
            let kind = match statistic {
                Statistic::Sum => AggregationKind::YearSum,
                Statistic::Mean => AggregationKind::YearMean,
            };
            log_profiles(&bucketed);
            summary.insert(
                &SummaryKey::new(kind, &args.variable, &args.dataset),
                bucketed,
            );
        }
    }

    let json = summary.to_json()?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("writing summary {}", args.output))?;
    info!(
        "aggregation complete: {} tables written to {}",
        summary.len(),
        args.output
    );
    Ok(vec![PathBuf::from(&args.output)])
}

/// Log the cross-station and cross-time profiles, monthly rows in
/// water-year order.
fn log_profiles(table: &wgc_core::aggregate::SummaryTable) {
    let temporal = table.mean_by_bucket();
    info!("cross-station profile:");
    for row in table.water_year_row_order() {
        info!("  {:>7}: {:.2}", table.buckets[row].label(), temporal[row]);
    }
    let spatial = table.mean_by_station();
    info!("cross-time profile:");
    for (station, mean) in table.station_ids.iter().zip(spatial) {
        info!("  {station}: {mean:.2}");
    }
}
