//! Reporting on the catalog database

mod stats;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};
