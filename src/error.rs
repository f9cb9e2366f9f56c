//! Pipeline-level error type wrapping each stage's errors.

use crate::charts::RenderError;
use crate::data::cleaner::CleanError;
use crate::data::{LoaderError, MergeError};
use crate::geo::BoundaryError;
use crate::stats::DeriveError;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Loading failed: {0}")]
    Load(#[from] LoaderError),
    #[error("Cleaning failed: {0}")]
    Clean(#[from] CleanError),
    #[error("Join failed: {0}")]
    Merge(#[from] MergeError),
    #[error("Derivation failed: {0}")]
    Derive(#[from] DeriveError),
    #[error("Boundary load failed: {0}")]
    Boundary(#[from] BoundaryError),
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No region is present in every input table")]
    NoRegions,
}
