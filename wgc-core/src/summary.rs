use crate::aggregate::SummaryTable;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The named aggregations the pipeline produces.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
pub enum AggregationKind {
    /// Per month instance, daily sum
    MonthSum,
    /// Per month instance, daily mean
    MonthMean,
    /// Per year, daily sum
    YearSum,
    /// Per year, daily mean
    YearMean,
    /// Long-term month-of-year mean of monthly sums
    MeanByMonthSum,
    /// Long-term month-of-year mean of monthly means
    MeanByMonthMean,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::MonthSum => "monthsum",
            AggregationKind::MonthMean => "monthmean",
            AggregationKind::YearSum => "yearsum",
            AggregationKind::YearMean => "yearmean",
            AggregationKind::MeanByMonthSum => "meanbymonthsum",
            AggregationKind::MeanByMonthMean => "meanbymonthmean",
        }
    }
}

impl FromStr for AggregationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthsum" => Ok(AggregationKind::MonthSum),
            "monthmean" => Ok(AggregationKind::MonthMean),
            "yearsum" => Ok(AggregationKind::YearSum),
            "yearmean" => Ok(AggregationKind::YearMean),
            "meanbymonthsum" => Ok(AggregationKind::MeanByMonthSum),
            "meanbymonthmean" => Ok(AggregationKind::MeanByMonthMean),
            other => Err(CoreError::BadKey {
                key: other.to_string(),
            }),
        }
    }
}

/// Structured key for one summary table: which aggregation, of which
/// variable, from which dataset. Replaces ad hoc string-concatenated
/// dictionary names and their collision risk; the canonical encoding is
/// `kind:variable:dataset`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct SummaryKey {
    pub kind: AggregationKind,
    pub variable: String,
    pub dataset: String,
}

impl SummaryKey {
    pub fn new(kind: AggregationKind, variable: &str, dataset: &str) -> SummaryKey {
        SummaryKey {
            kind,
            variable: variable.to_string(),
            dataset: dataset.to_string(),
        }
    }
}

impl fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind.as_str(), self.variable, self.dataset)
    }
}

impl FromStr for SummaryKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(kind), Some(variable), Some(dataset)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::BadKey { key: s.to_string() });
        };
        if variable.is_empty() || dataset.is_empty() {
            return Err(CoreError::BadKey { key: s.to_string() });
        }
        Ok(SummaryKey {
            kind: kind.parse()?,
            variable: variable.to_string(),
            dataset: dataset.to_string(),
        })
    }
}

/// The long-term mean dictionary: every aggregation computed for a
/// watershed, keyed by `SummaryKey`. Serializes to a JSON object mapping
/// canonical key strings to tables, which is the persisted artifact the
/// publisher collects.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LongTermSummary {
    entries: BTreeMap<String, SummaryTable>,
}

impl LongTermSummary {
    pub fn new() -> LongTermSummary {
        LongTermSummary::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a new aggregation. Existing entries are never mutated; a
    /// duplicate key replaces the whole table.
    pub fn insert(&mut self, key: &SummaryKey, table: SummaryTable) {
        self.entries.insert(key.to_string(), table);
    }

    pub fn get(&self, key: &SummaryKey) -> Option<&SummaryTable> {
        self.entries.get(&key.to_string())
    }

    /// Iterate entries as parsed keys with their tables.
    pub fn iter(&self) -> impl Iterator<Item = (SummaryKey, &SummaryTable)> {
        self.entries
            .iter()
            .filter_map(|(k, t)| k.parse::<SummaryKey>().ok().map(|key| (key, t)))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a persisted summary dictionary, rejecting tables whose value
    /// array does not match their declared rows x columns shape. Downstream
    /// consumers index tables by row, so a malformed file must fail here
    /// with the offending key rather than later.
    pub fn from_json(text: &str) -> Result<LongTermSummary, CoreError> {
        let summary: LongTermSummary =
            serde_json::from_str(text).map_err(|e| CoreError::Json {
                reason: e.to_string(),
            })?;
        for (key, table) in &summary.entries {
            let expected = table.buckets.len() * table.station_ids.len();
            if table.station_ids.is_empty() || table.values.len() != expected {
                return Err(CoreError::TableShape {
                    key: key.clone(),
                    expected,
                    actual: table.values.len(),
                });
            }
        }
        Ok(summary)
    }
}
