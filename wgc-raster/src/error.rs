use std::fmt;

/// Errors raised by the grid builder, crossmap, renderer and exporter.
///
/// Spatial configuration and projection problems are rejected before any
/// allocation or artifact write; no-data cells are not errors and travel as
/// sentinel values instead.
#[derive(Debug, PartialEq, Clone)]
pub enum RasterError {
    /// Bounding box with min >= max or out-of-range coordinates.
    InvalidBounds { reason: String },
    /// Non-positive or non-finite cell size.
    InvalidCellSize { dx: f64, dy: f64 },
    /// The requested cell size would produce an unreasonably large grid.
    OversizedGrid { cells: usize, limit: usize },
    /// Failed to determine or apply a coordinate reference.
    Projection { reason: String },
    /// The requested time bucket is not a row of the summary table.
    BucketNotFound { bucket: String },
    /// A crossmap station is missing from the summary table's columns.
    UnknownStation { station: String },
    /// An attribute array does not match the crossmap's station count.
    AttributeLength { expected: usize, actual: usize },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::InvalidBounds { reason } => {
                write!(f, "invalid bounding box: {reason}")
            }
            RasterError::InvalidCellSize { dx, dy } => {
                write!(f, "invalid cell size: dx={dx}, dy={dy}")
            }
            RasterError::OversizedGrid { cells, limit } => {
                write!(f, "grid of {cells} cells exceeds the {limit}-cell limit")
            }
            RasterError::Projection { reason } => {
                write!(f, "projection error: {reason}")
            }
            RasterError::BucketNotFound { bucket } => {
                write!(f, "bucket not found: {bucket}")
            }
            RasterError::UnknownStation { station } => {
                write!(f, "station {station}: assigned by crossmap but absent from summary table")
            }
            RasterError::AttributeLength { expected, actual } => {
                write!(f, "attribute array has {actual} entries, expected {expected}")
            }
        }
    }
}

impl std::error::Error for RasterError {}
