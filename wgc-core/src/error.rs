use std::fmt;

/// Errors surfaced by mapping-table parsing, series ingest and aggregation.
///
/// All of these are input inconsistencies: the pipeline fails fast with the
/// offending key rather than silently truncating or padding data.
#[derive(Debug, PartialEq, Clone)]
pub enum CoreError {
    /// A station's series does not share the date range of its peers.
    DateRangeMismatch { station: String },
    /// A station contributed no values for the requested variable.
    EmptySeries { station: String },
    /// A daily series skips a calendar day.
    GapInSeries { station: String, date: String },
    /// A station id appears in the series data but not in the mapping table.
    UnknownStation { station: String },
    /// The requested time bucket is not a row of the summary table.
    BucketNotFound { bucket: String },
    /// The summary table rows are not the bucket kind the operation expects.
    UnsupportedBuckets { expected: &'static str },
    /// Malformed CSV input.
    Csv { line: usize, reason: String },
    /// Malformed summary JSON input.
    Json { reason: String },
    /// A persisted summary table's value array does not match its
    /// declared rows x columns shape.
    TableShape {
        key: String,
        expected: usize,
        actual: usize,
    },
    /// A summary key string does not parse as kind:variable:dataset.
    BadKey { key: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::DateRangeMismatch { station } => {
                write!(f, "station {station}: date range differs from other stations")
            }
            CoreError::EmptySeries { station } => {
                write!(f, "station {station}: series is empty")
            }
            CoreError::GapInSeries { station, date } => {
                write!(f, "station {station}: missing daily value at {date}")
            }
            CoreError::UnknownStation { station } => {
                write!(f, "station {station}: not present in the mapping table")
            }
            CoreError::BucketNotFound { bucket } => {
                write!(f, "bucket not found: {bucket}")
            }
            CoreError::UnsupportedBuckets { expected } => {
                write!(f, "summary table rows are not {expected} buckets")
            }
            CoreError::Csv { line, reason } => {
                write!(f, "csv parse error at line {line}: {reason}")
            }
            CoreError::Json { reason } => {
                write!(f, "json parse error: {reason}")
            }
            CoreError::TableShape {
                key,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "summary table {key}: {actual} values, expected {expected}"
                )
            }
            CoreError::BadKey { key } => {
                write!(f, "bad summary key (expected kind:variable:dataset): {key}")
            }
        }
    }
}

impl std::error::Error for CoreError {}
