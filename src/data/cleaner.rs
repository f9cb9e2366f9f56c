//! Data Cleaner Module
//! Row trimming and strict numeric coercion of text columns.

use log::debug;
use polars::prelude::*;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("{source_name}: column {column:?} not found")]
    MissingColumn { source_name: String, column: String },
    #[error("{source_name}: row {row} ({key}) column {column:?}: cannot parse {raw:?} as a number")]
    Malformed {
        source_name: String,
        row: usize,
        key: String,
        column: String,
        raw: String,
    },
    #[error("{source_name}: row {row} ({key}) column {column:?}: negative value {value}")]
    Negative {
        source_name: String,
        row: usize,
        key: String,
        column: String,
        value: f64,
    },
}

/// Parse a number written with thousands separators, e.g. `"1,234.5"`.
///
/// Returns `None` for empty cells and for anything that is not a finite number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Remove the rows whose position falls inside `range`.
pub fn drop_row_range(df: &DataFrame, range: &Range<usize>) -> PolarsResult<DataFrame> {
    let start = range.start.min(df.height());
    let end = range.end.clamp(start, df.height());
    if start == end {
        return Ok(df.clone());
    }

    let mut head = df.slice(0, start);
    let tail = df.slice(end as i64, df.height() - end);
    head.vstack_mut(&tail)?;
    Ok(head)
}

/// Trim the key column and drop rows where it is null or blank.
pub fn drop_blank_regions(df: DataFrame, key_col: &str) -> PolarsResult<DataFrame> {
    let before = df.height();
    let keys: StringChunked = df
        .column(key_col)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim))
        .collect();
    let keep: BooleanChunked = keys
        .into_iter()
        .map(|v| v.is_some_and(|s| !s.is_empty()))
        .collect();

    let mut df = df;
    df.with_column(keys.into_series().with_name(key_col.into()))?;
    let df = df.filter(&keep)?;
    if df.height() != before {
        debug!("Dropped {} blank rows", before - df.height());
    }
    Ok(df)
}

/// Coerce text columns to `Float64`, failing on the first malformed cell.
///
/// Unparsable, empty and negative cells are errors, never nulls.
pub fn coerce_numeric_columns(
    mut df: DataFrame,
    columns: &[String],
    key_col: &str,
    source_name: &str,
) -> Result<DataFrame, CleanError> {
    let keys: Vec<String> = match df.column(key_col) {
        Ok(c) => c
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect(),
        Err(_) => {
            return Err(CleanError::MissingColumn {
                source_name: source_name.to_string(),
                column: key_col.to_string(),
            })
        }
    };

    for name in columns {
        let column = df.column(name).map_err(|_| CleanError::MissingColumn {
            source_name: source_name.to_string(),
            column: name.clone(),
        })?;
        let text = column.cast(&DataType::String)?;
        let text = text.str()?;

        let mut values: Vec<f64> = Vec::with_capacity(text.len());
        for (row, cell) in text.into_iter().enumerate() {
            let raw = cell.unwrap_or_default();
            let value = parse_number(raw).ok_or_else(|| CleanError::Malformed {
                source_name: source_name.to_string(),
                row,
                key: keys.get(row).cloned().unwrap_or_default(),
                column: name.clone(),
                raw: raw.to_string(),
            })?;
            if value < 0.0 {
                return Err(CleanError::Negative {
                    source_name: source_name.to_string(),
                    row,
                    key: keys.get(row).cloned().unwrap_or_default(),
                    column: name.clone(),
                    value,
                });
            }
            values.push(value);
        }

        df.with_column(Column::new(name.as_str().into(), values))?;
        debug!("{}: coerced column {} to Float64", source_name, name);
    }

    Ok(df)
}
