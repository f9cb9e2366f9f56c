//! Region Join Module
//! Inner-joins the cleaned sources on region name and audits coverage.

use log::{info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Key column shared by every source.
pub const REGION_KEY: &str = "State";

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("{source_name}: region {region:?} appears more than once")]
    DuplicateRegion { source_name: String, region: String },
}

/// A named input table taking part in the join.
pub struct RegionSource<'a> {
    pub name: &'static str,
    pub frame: &'a DataFrame,
}

impl<'a> RegionSource<'a> {
    pub fn new(name: &'static str, frame: &'a DataFrame) -> Self {
        Self { name, frame }
    }
}

/// A region dropped by the join and the sources it was missing from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedRegion {
    pub region: String,
    pub missing_from: Vec<&'static str>,
}

/// How many regions survived the join and which ones did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub merged: usize,
    pub excluded: Vec<ExcludedRegion>,
}

/// Ordered, de-duplicated region names of a table.
fn region_names(source: &RegionSource<'_>) -> Result<Vec<String>, MergeError> {
    let keys = source.frame.column(REGION_KEY)?.str()?;
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(keys.len());
    for key in keys.into_iter().flatten() {
        if !seen.insert(key) {
            return Err(MergeError::DuplicateRegion {
                source_name: source.name.to_string(),
                region: key.to_string(),
            });
        }
        names.push(key.to_string());
    }
    Ok(names)
}

/// List every region that is absent from at least one source.
///
/// Regions are reported in order of first appearance across the sources.
pub fn coverage(sources: &[RegionSource<'_>]) -> Result<CoverageReport, MergeError> {
    let names: Vec<Vec<String>> = sources
        .iter()
        .map(region_names)
        .collect::<Result<_, _>>()?;
    let sets: Vec<HashSet<&str>> = names
        .iter()
        .map(|n| n.iter().map(String::as_str).collect())
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut report = CoverageReport::default();
    for region in names.iter().flatten() {
        if !visited.insert(region.as_str()) {
            continue;
        }
        let missing_from: Vec<&'static str> = sources
            .iter()
            .zip(&sets)
            .filter(|(_, set)| !set.contains(region.as_str()))
            .map(|(source, _)| source.name)
            .collect();
        if missing_from.is_empty() {
            report.merged += 1;
        } else {
            report.excluded.push(ExcludedRegion {
                region: region.clone(),
                missing_from,
            });
        }
    }
    Ok(report)
}

/// Inner-join the sources on [`REGION_KEY`].
///
/// The first source drives the row order of the result. Rows without a match
/// in every source are dropped; they are logged through [`coverage`].
pub fn join_regions(sources: &[RegionSource<'_>]) -> Result<(DataFrame, CoverageReport), MergeError> {
    let report = coverage(sources)?;
    for excluded in &report.excluded {
        warn!(
            "Region {:?} excluded: missing from {}",
            excluded.region,
            excluded.missing_from.join(", ")
        );
    }

    let Some((first, rest)) = sources.split_first() else {
        return Ok((DataFrame::empty(), report));
    };

    let mut lf = first.frame.clone().lazy().with_row_index("source_row", None);
    for source in rest {
        lf = lf.join(
            source.frame.clone().lazy(),
            [col(REGION_KEY)],
            [col(REGION_KEY)],
            JoinArgs::new(JoinType::Inner),
        );
    }
    let merged = lf
        .sort(["source_row"], SortMultipleOptions::default())
        .collect()?
        .drop("source_row")?;

    info!(
        "Joined {} sources: {} regions merged, {} excluded",
        sources.len(),
        merged.height(),
        report.excluded.len()
    );
    Ok((merged, report))
}
