pub mod coords;
pub mod crossmap;
pub mod error;
pub mod export;
pub mod grid;
pub mod projection;
pub mod render;

/// Reserved value marking raster cells without an assigned data source.
pub const NO_DATA_SENTINEL: f64 = -9999.0;
