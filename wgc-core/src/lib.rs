pub mod aggregate;
pub mod error;
pub mod mapping_table;
pub mod series;
pub mod station;
pub mod summary;
