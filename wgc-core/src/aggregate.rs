use crate::error::CoreError;
use crate::series::DailySeries;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wgc_utils::dates::water_year_month_position;

/// Calendar window a daily series is reduced over.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Window {
    Month,
    Year,
}

/// How daily values inside one bucket are reduced: Sum for accumulating
/// quantities (precipitation), Mean for state quantities (temperature).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Statistic {
    Sum,
    Mean,
}

/// Policy for calendar buckets only partially covered at the series
/// boundary. Include replicates the source workflow and is a known
/// approximation; Exclude drops incomplete first/last buckets.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PartialBucketPolicy {
    Include,
    Exclude,
}

/// A row key of a summary table.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TimeBucket {
    /// Long-term month-of-year, 1 = January .. 12 = December.
    MonthOfYear(u32),
    /// A concrete calendar month instance.
    YearMonth(i32, u32),
    /// A concrete calendar year.
    Year(i32),
}

impl TimeBucket {
    /// Stable label used to address buckets from the outside:
    /// "12" (December), "2015-06", "2015".
    pub fn label(&self) -> String {
        match self {
            TimeBucket::MonthOfYear(m) => format!("{m}"),
            TimeBucket::YearMonth(y, m) => format!("{y:04}-{m:02}"),
            TimeBucket::Year(y) => format!("{y}"),
        }
    }
}

/// A 2D summary statistic table: rows are time buckets, columns are
/// stations, values row-major. Produced by aggregation and never mutated in
/// place; every derived aggregation is a new table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub buckets: Vec<TimeBucket>,
    pub station_ids: Vec<String>,
    pub values: Vec<f64>,
}

impl SummaryTable {
    pub fn rows(&self) -> usize {
        self.buckets.len()
    }

    pub fn cols(&self) -> usize {
        self.station_ids.len()
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols() + col]
    }

    pub fn row_values(&self, row: usize) -> &[f64] {
        let cols = self.cols();
        &self.values[row * cols..(row + 1) * cols]
    }

    /// Row index of the bucket with the given label.
    pub fn bucket_row(&self, label: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.label() == label)
    }

    /// Column index of a station.
    pub fn station_col(&self, station_id: &str) -> Option<usize> {
        self.station_ids.iter().position(|s| s == station_id)
    }

    /// Cross-station mean per bucket (the temporal profile).
    pub fn mean_by_bucket(&self) -> Vec<f64> {
        (0..self.rows())
            .map(|row| {
                let vals = self.row_values(row);
                vals.iter().sum::<f64>() / vals.len() as f64
            })
            .collect()
    }

    /// Cross-bucket mean per station (the spatial profile).
    pub fn mean_by_station(&self) -> Vec<f64> {
        (0..self.cols())
            .map(|col| {
                let sum: f64 = (0..self.rows()).map(|row| self.value(row, col)).sum();
                sum / self.rows() as f64
            })
            .collect()
    }

    /// Row order for water-year display (October first). Only meaningful for
    /// month-of-year tables; other tables keep their natural order. Display
    /// ordering only: no resampling math depends on this.
    pub fn water_year_row_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows()).collect();
        order.sort_by_key(|&row| match self.buckets[row] {
            TimeBucket::MonthOfYear(m) => water_year_month_position(m),
            _ => row,
        });
        order
    }
}

fn bucket_of(date: NaiveDate, window: Window) -> TimeBucket {
    match window {
        Window::Month => TimeBucket::YearMonth(date.year(), date.month()),
        Window::Year => TimeBucket::Year(date.year()),
    }
}

/// First and last calendar day a bucket spans.
fn bucket_bounds(bucket: TimeBucket) -> (NaiveDate, NaiveDate) {
    match bucket {
        TimeBucket::YearMonth(y, m) => {
            let first = NaiveDate::from_ymd_opt(y, m, 1).unwrap();
            let next = if m == 12 {
                NaiveDate::from_ymd_opt(y + 1, 1, 1).unwrap()
            } else {
                NaiveDate::from_ymd_opt(y, m + 1, 1).unwrap()
            };
            (first, next.pred_opt().unwrap())
        }
        TimeBucket::Year(y) => (
            NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(y, 12, 31).unwrap(),
        ),
        TimeBucket::MonthOfYear(_) => unreachable!("long-term buckets have no calendar span"),
    }
}

/// Reduce daily series into per-station, per-bucket totals.
///
/// All series must share one date range; the first series pins it and any
/// other station deviating fails with `DateRangeMismatch`. Output rows are
/// concrete bucket instances in chronological order, columns follow the
/// input series order.
pub fn bucket_totals(
    series: &[&DailySeries],
    window: Window,
    statistic: Statistic,
    policy: PartialBucketPolicy,
) -> Result<SummaryTable, CoreError> {
    let reference = series.first().ok_or_else(|| CoreError::EmptySeries {
        station: "(no stations)".to_string(),
    })?;
    for s in series {
        if s.values.is_empty() {
            return Err(CoreError::EmptySeries {
                station: s.station_id.clone(),
            });
        }
        if s.start_date != reference.start_date || s.values.len() != reference.values.len() {
            return Err(CoreError::DateRangeMismatch {
                station: s.station_id.clone(),
            });
        }
    }

    // Bucket layout from the shared date range
    let mut buckets: Vec<TimeBucket> = Vec::new();
    let mut bucket_row: BTreeMap<TimeBucket, usize> = BTreeMap::new();
    for (date, _) in reference.iter_dated() {
        let bucket = bucket_of(date, window);
        if !bucket_row.contains_key(&bucket) {
            bucket_row.insert(bucket, buckets.len());
            buckets.push(bucket);
        }
    }

    let cols = series.len();
    let mut sums = vec![0.0f64; buckets.len() * cols];
    let mut counts = vec![0u32; buckets.len() * cols];
    for (col, s) in series.iter().enumerate() {
        for (date, value) in s.iter_dated() {
            let row = bucket_row[&bucket_of(date, window)];
            sums[row * cols + col] += value;
            counts[row * cols + col] += 1;
        }
    }

    let keep: Vec<bool> = buckets
        .iter()
        .map(|b| match policy {
            PartialBucketPolicy::Include => true,
            PartialBucketPolicy::Exclude => {
                let (first, last) = bucket_bounds(*b);
                first >= reference.start_date && last <= reference.end_date()
            }
        })
        .collect();

    let mut out_buckets = Vec::new();
    let mut out_values = Vec::new();
    for (row, bucket) in buckets.iter().enumerate() {
        if !keep[row] {
            continue;
        }
        out_buckets.push(*bucket);
        for col in 0..cols {
            let sum = sums[row * cols + col];
            out_values.push(match statistic {
                Statistic::Sum => sum,
                Statistic::Mean => sum / counts[row * cols + col] as f64,
            });
        }
    }

    Ok(SummaryTable {
        buckets: out_buckets,
        station_ids: series.iter().map(|s| s.station_id.clone()).collect(),
        values: out_values,
    })
}

/// Collapse a table of concrete month instances into the long-term
/// month-of-year table: for each calendar month 1..12, the mean across
/// years per station (the `meanbymonthsum` / `meanbymonthmean` family).
pub fn long_term_by_month(table: &SummaryTable) -> Result<SummaryTable, CoreError> {
    if table
        .buckets
        .iter()
        .any(|b| !matches!(b, TimeBucket::YearMonth(_, _)))
    {
        return Err(CoreError::UnsupportedBuckets {
            expected: "year-month",
        });
    }

    let cols = table.cols();
    let mut month_rows: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (row, bucket) in table.buckets.iter().enumerate() {
        if let TimeBucket::YearMonth(_, m) = bucket {
            month_rows.entry(*m).or_default().push(row);
        }
    }

    let mut buckets = Vec::with_capacity(month_rows.len());
    let mut values = Vec::with_capacity(month_rows.len() * cols);
    for (month, rows) in month_rows {
        buckets.push(TimeBucket::MonthOfYear(month));
        for col in 0..cols {
            let sum: f64 = rows.iter().map(|&row| table.value(row, col)).sum();
            values.push(sum / rows.len() as f64);
        }
    }

    Ok(SummaryTable {
        buckets,
        station_ids: table.station_ids.clone(),
        values,
    })
}
