//! Data module - CSV loading, cleaning and region joins

pub mod cleaner;
mod loader;
pub mod merge;

pub use loader::{DataLoader, GenderRates, GenderReference, LoaderError, PopulationTables, SURVEY_COLUMNS};
pub use merge::{join_regions, CoverageReport, ExcludedRegion, MergeError, RegionSource, REGION_KEY};
