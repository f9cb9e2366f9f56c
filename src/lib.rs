//! Male Mental Health - state indicator report
//!
//! Joins NSDUH state estimates with census population counts, projects the
//! share of men with any mental illness who receive treatment, and renders
//! maps and ranked charts of the result.

pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod pipeline;
pub mod stats;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{run, RunSummary};
