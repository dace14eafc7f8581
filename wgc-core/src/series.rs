use crate::error::CoreError;
use chrono::{NaiveDate, TimeDelta};
use csv::ReaderBuilder;
use log::info;
use std::collections::BTreeMap;
use wgc_utils::dates::{format_date, parse_date};

/// A contiguous daily time series for one (station, variable) pair.
///
/// Dates are implicit: `values[i]` belongs to `start_date + i` days. The
/// retrieval layer delivers complete series, so a gap in the source rows is
/// an input error, not something to interpolate over here.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub station_id: String,
    pub variable: String,
    pub start_date: NaiveDate,
    pub values: Vec<f64>,
}

impl DailySeries {
    /// Last date covered by the series (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + TimeDelta::days(self.values.len() as i64 - 1)
    }

    /// Date of the i-th value.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start_date + TimeDelta::days(index as i64)
    }

    /// Iterate (date, value) pairs in order.
    pub fn iter_dated(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (self.date_at(i), *v))
    }
}

/// Per-station daily series keyed by (variable, station id).
///
/// Insertion enforces the shared date-range invariant: every series for a
/// given variable must cover the same start/end dates. The first series for
/// a variable pins the range; later mismatches fail naming the station.
#[derive(Debug, Default, Clone)]
pub struct SeriesStore {
    series: BTreeMap<(String, String), DailySeries>,
}

impl SeriesStore {
    pub fn new() -> SeriesStore {
        SeriesStore::default()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Insert a series, enforcing the per-variable date-range invariant.
    pub fn insert(&mut self, series: DailySeries) -> Result<(), CoreError> {
        if series.values.is_empty() {
            return Err(CoreError::EmptySeries {
                station: series.station_id.clone(),
            });
        }
        if let Some(existing) = self
            .series
            .values()
            .find(|s| s.variable == series.variable)
        {
            if existing.start_date != series.start_date
                || existing.values.len() != series.values.len()
            {
                return Err(CoreError::DateRangeMismatch {
                    station: series.station_id.clone(),
                });
            }
        }
        self.series.insert(
            (series.variable.clone(), series.station_id.clone()),
            series,
        );
        Ok(())
    }

    pub fn get(&self, variable: &str, station_id: &str) -> Option<&DailySeries> {
        self.series
            .get(&(variable.to_string(), station_id.to_string()))
    }

    /// All series for one variable, in station-id order.
    pub fn for_variable(&self, variable: &str) -> Vec<&DailySeries> {
        self.series
            .iter()
            .filter(|((var, _), _)| var == variable)
            .map(|(_, s)| s)
            .collect()
    }

    /// Parse a per-station daily series CSV into the store.
    ///
    /// Expected rows: `station_id,date,value` with a header line and dates in
    /// "YYYY-MM-DD". Rows are grouped by station; each station's rows must
    /// form a contiguous daily run once sorted.
    pub fn parse_series_csv(&mut self, csv_object: &str, variable: &str) -> Result<(), CoreError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_object.as_bytes());

        let mut rows_by_station: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for (row_number, row) in rdr.records().enumerate() {
            let line = row_number + 2;
            let record = row.map_err(|e| CoreError::Csv {
                line,
                reason: e.to_string(),
            })?;
            let station_id = record.get(0).unwrap_or("").trim().to_string();
            let date_str = record.get(1).unwrap_or("").trim();
            let value_str = record.get(2).unwrap_or("").trim();
            if station_id.is_empty() {
                return Err(CoreError::Csv {
                    line,
                    reason: "empty station_id".to_string(),
                });
            }
            let date = parse_date(date_str).map_err(|_| CoreError::Csv {
                line,
                reason: format!("bad date: {date_str}"),
            })?;
            let value = value_str.parse::<f64>().map_err(|_| CoreError::Csv {
                line,
                reason: format!("bad value: {value_str}"),
            })?;
            rows_by_station.entry(station_id).or_default().push((date, value));
        }

        info!(
            "parsed {} {} station series",
            rows_by_station.len(),
            variable
        );
        for (station_id, mut rows) in rows_by_station {
            rows.sort_by_key(|(date, _)| *date);
            let start_date = rows[0].0;
            let mut values = Vec::with_capacity(rows.len());
            for (i, (date, value)) in rows.iter().enumerate() {
                let expected = start_date + TimeDelta::days(i as i64);
                if *date != expected {
                    return Err(CoreError::GapInSeries {
                        station: station_id,
                        date: format_date(&expected),
                    });
                }
                values.push(*value);
            }
            self.insert(DailySeries {
                station_id,
                variable: variable.to_string(),
                start_date,
                values,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DailySeries, SeriesStore};
    use crate::error::CoreError;
    use chrono::NaiveDate;

    fn series(station: &str, start: (i32, u32, u32), n: usize) -> DailySeries {
        DailySeries {
            station_id: station.to_string(),
            variable: "Prec".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            values: vec![1.0; n],
        }
    }

    #[test]
    fn test_end_date_and_iteration() {
        let s = series("A", (2020, 1, 1), 31);
        assert_eq!(s.end_date(), NaiveDate::from_ymd_opt(2020, 1, 31).unwrap());
        let dated: Vec<_> = s.iter_dated().collect();
        assert_eq!(dated.len(), 31);
        assert_eq!(dated[0].0, s.start_date);
        assert_eq!(dated[30].0, s.end_date());
    }

    #[test]
    fn test_insert_enforces_shared_range() {
        let mut store = SeriesStore::new();
        store.insert(series("A", (2020, 1, 1), 31)).unwrap();
        store.insert(series("B", (2020, 1, 1), 31)).unwrap();
        let err = store.insert(series("C", (2020, 1, 2), 31)).unwrap_err();
        assert_eq!(
            err,
            CoreError::DateRangeMismatch {
                station: "C".to_string()
            }
        );
        let err = store.insert(series("D", (2020, 1, 1), 30)).unwrap_err();
        assert_eq!(
            err,
            CoreError::DateRangeMismatch {
                station: "D".to_string()
            }
        );
    }

    #[test]
    fn test_insert_rejects_empty() {
        let mut store = SeriesStore::new();
        let err = store.insert(series("A", (2020, 1, 1), 0)).unwrap_err();
        assert_eq!(
            err,
            CoreError::EmptySeries {
                station: "A".to_string()
            }
        );
    }

    #[test]
    fn test_parse_series_csv() {
        let csv = "station_id,date,value\n\
                   A,2020-01-01,1.5\n\
                   A,2020-01-02,2.5\n\
                   B,2020-01-01,0.0\n\
                   B,2020-01-02,4.0\n";
        let mut store = SeriesStore::new();
        store.parse_series_csv(csv, "Prec").unwrap();
        assert_eq!(store.len(), 2);
        let a = store.get("Prec", "A").unwrap();
        assert_eq!(a.values, vec![1.5, 2.5]);
        let all = store.for_variable("Prec");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].station_id, "A");
    }

    #[test]
    fn test_parse_series_csv_rejects_bad_date() {
        let csv = "station_id,date,value\n\
                   A,20200101,1.0\n";
        let mut store = SeriesStore::new();
        match store.parse_series_csv(csv, "Prec").unwrap_err() {
            CoreError::Csv { line: 2, reason } => {
                assert!(reason.contains("20200101"));
            }
            other => panic!("expected csv error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_series_csv_detects_gap() {
        let csv = "station_id,date,value\n\
                   A,2020-01-01,1.0\n\
                   A,2020-01-03,2.0\n";
        let mut store = SeriesStore::new();
        let err = store.parse_series_csv(csv, "Prec").unwrap_err();
        assert_eq!(
            err,
            CoreError::GapInSeries {
                station: "A".to_string(),
                date: "2020-01-02".to_string()
            }
        );
    }
}
