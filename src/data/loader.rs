//! CSV Data Loader Module
//! Reads the survey, population and gender reference tables using Polars.

use crate::config::{PopulationLayout, SurveyLayout};
use crate::data::cleaner::{self, CleanError};
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical column names of a cleaned NSDUH state table.
pub const SURVEY_COLUMNS: [&str; 10] = [
    "State",
    "Estimate_18plus",
    "CI_18plus_Lower",
    "CI_18plus_Upper",
    "Estimate_18_25",
    "CI_18_25_Lower",
    "CI_18_25_Upper",
    "Estimate_26plus",
    "CI_26_Lower",
    "CI_26_Upper",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("{path}: expected {expected} columns after dropping the index column, found {found}")]
    ColumnCount {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error("{path}: negative population {value} for {region} (AGE {age})")]
    NegativePopulation {
        path: PathBuf,
        region: String,
        age: i64,
        value: f64,
    },
    #[error("{path}: no row with Sex == {sex:?}")]
    MissingGenderRow { path: PathBuf, sex: String },
    #[error(transparent)]
    Clean(#[from] CleanError),
}

impl LoaderError {
    fn csv(path: &Path) -> impl FnOnce(PolarsError) -> LoaderError + '_ {
        move |source| LoaderError::CsvError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// National rates for one sex from the gender reference table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderRates {
    /// Share of adults of this sex with AMI (%)
    pub ami_pct: f64,
    /// Share of adults of this sex with AMI who received treatment (%)
    pub treatment_pct: f64,
}

/// Rows of the gender reference table, in file order.
#[derive(Debug, Clone, Default)]
pub struct GenderReference {
    rows: Vec<(String, GenderRates)>,
}

impl GenderReference {
    pub fn new(rows: Vec<(String, GenderRates)>) -> Self {
        Self { rows }
    }

    pub fn get(&self, sex: &str) -> Option<GenderRates> {
        self.rows
            .iter()
            .find(|(name, _)| name == sex)
            .map(|(_, rates)| *rates)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Adult population per region, split into all adults and adult men.
#[derive(Debug, Clone)]
pub struct PopulationTables {
    /// Columns: State, Adults18plus
    pub adults: DataFrame,
    /// Columns: State, AdultMen18plus
    pub adult_men: DataFrame,
}

/// Loads the four input tables of the report.
pub struct DataLoader;

impl DataLoader {
    /// Load a NSDUH state table and clean it.
    ///
    /// Every field is read as text. The leading `header_skip_rows` lines and the
    /// header line itself are skipped, the index column is dropped, the noise
    /// rows are removed and the canonical names from [`SURVEY_COLUMNS`] are
    /// assigned. The numeric columns of the layout are then coerced strictly.
    pub fn load_survey_table(path: &Path, layout: &SurveyLayout) -> Result<DataFrame, LoaderError> {
        let raw = LazyCsvReader::new(path)
            .with_has_header(false)
            .with_skip_rows(layout.header_skip_rows + 1)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(LoaderError::csv(path))?;
        info!("Loaded {} rows from {}", raw.height(), path.display());

        let df = Self::shape_survey_table(raw, path, layout)?;

        let source = path.display().to_string();
        let df = cleaner::drop_blank_regions(df, "State").map_err(LoaderError::csv(path))?;
        let df = cleaner::coerce_numeric_columns(df, &layout.numeric_columns, "State", &source)?;
        info!("{}: {} regions after cleaning", source, df.height());
        Ok(df)
    }

    /// Drop the index column and noise rows, then rename to canonical names.
    fn shape_survey_table(
        raw: DataFrame,
        path: &Path,
        layout: &SurveyLayout,
    ) -> Result<DataFrame, LoaderError> {
        let names: Vec<String> = raw
            .get_column_names()
            .iter()
            .skip(1)
            .map(|s| s.to_string())
            .collect();
        if names.len() != SURVEY_COLUMNS.len() {
            return Err(LoaderError::ColumnCount {
                path: path.to_path_buf(),
                expected: SURVEY_COLUMNS.len(),
                found: names.len(),
            });
        }

        let mut df = raw.select(names).map_err(LoaderError::csv(path))?;
        df = cleaner::drop_row_range(&df, &layout.noise_rows).map_err(LoaderError::csv(path))?;
        df.set_column_names(SURVEY_COLUMNS)
            .map_err(LoaderError::csv(path))?;
        debug!(
            "Shaped survey table: {} rows, noise rows {:?} removed",
            df.height(),
            layout.noise_rows
        );
        Ok(df)
    }

    /// Load the census age/sex file and sum adult population per region.
    ///
    /// Adults are the rows with `AGE >= adult_min_age`. The file also carries an
    /// all-ages total under `AGE == total_age_code` (999); that row is left out
    /// so it is not counted on top of the single-year ages. Any negative
    /// population cell fails the load.
    pub fn load_population(
        path: &Path,
        layout: &PopulationLayout,
    ) -> Result<PopulationTables, LoaderError> {
        let lf = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()
            .map_err(LoaderError::csv(path))?;

        Self::reject_negative_population(&lf, path, layout)?;

        let adult_rows = col(layout.age_col.as_str())
            .gt_eq(lit(layout.adult_min_age))
            .and(col(layout.age_col.as_str()).neq(lit(layout.total_age_code)));

        let sum_for_sex = |sex_code: i64, alias: &str| -> Result<DataFrame, LoaderError> {
            lf.clone()
                .filter(
                    adult_rows
                        .clone()
                        .and(col(layout.sex_col.as_str()).eq(lit(sex_code))),
                )
                .group_by_stable([col(layout.name_col.as_str())])
                .agg([col(layout.population_col.as_str())
                    .cast(DataType::Float64)
                    .sum()
                    .alias(alias)])
                .select([col(layout.name_col.as_str()).alias("State"), col(alias)])
                .collect()
                .map_err(LoaderError::csv(path))
        };

        let adults = sum_for_sex(layout.sex_total_code, "Adults18plus")?;
        let adult_men = sum_for_sex(layout.sex_male_code, "AdultMen18plus")?;
        info!(
            "{}: adult population for {} regions ({} with male totals)",
            path.display(),
            adults.height(),
            adult_men.height()
        );

        Ok(PopulationTables { adults, adult_men })
    }

    fn reject_negative_population(
        lf: &LazyFrame,
        path: &Path,
        layout: &PopulationLayout,
    ) -> Result<(), LoaderError> {
        let negative = lf
            .clone()
            .select([
                col(layout.name_col.as_str()).cast(DataType::String),
                col(layout.age_col.as_str()).cast(DataType::Int64),
                col(layout.population_col.as_str()).cast(DataType::Float64),
            ])
            .filter(col(layout.population_col.as_str()).lt(lit(0.0)))
            .limit(1)
            .collect()
            .map_err(LoaderError::csv(path))?;
        if negative.height() == 0 {
            return Ok(());
        }

        let first = |name: &str| negative.column(name).map_err(LoaderError::csv(path));
        let region = first(&layout.name_col)?
            .str()
            .map_err(LoaderError::csv(path))?
            .get(0)
            .unwrap_or_default()
            .to_string();
        let age = first(&layout.age_col)?
            .i64()
            .map_err(LoaderError::csv(path))?
            .get(0)
            .unwrap_or_default();
        let value = first(&layout.population_col)?
            .f64()
            .map_err(LoaderError::csv(path))?
            .get(0)
            .unwrap_or_default();
        Err(LoaderError::NegativePopulation {
            path: path.to_path_buf(),
            region,
            age,
            value,
        })
    }

    /// Load the national AMI / treatment percentages by sex.
    pub fn load_gender_reference(path: &Path) -> Result<GenderReference, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(LoaderError::csv(path))?;

        let source = path.display().to_string();
        let df = cleaner::coerce_numeric_columns(
            df,
            &["AMI_pct".to_string(), "Treatment_pct".to_string()],
            "Sex",
            &source,
        )?;

        let sexes = df
            .column("Sex")
            .and_then(|c| c.str().cloned())
            .map_err(LoaderError::csv(path))?;
        let ami = df
            .column("AMI_pct")
            .and_then(|c| c.f64().cloned())
            .map_err(LoaderError::csv(path))?;
        let treatment = df
            .column("Treatment_pct")
            .and_then(|c| c.f64().cloned())
            .map_err(LoaderError::csv(path))?;

        let rows: Vec<(String, GenderRates)> = sexes
            .into_iter()
            .zip(ami.into_iter().zip(treatment.into_iter()))
            .filter_map(|(sex, (ami_pct, treatment_pct))| {
                Some((
                    sex?.trim().to_string(),
                    GenderRates {
                        ami_pct: ami_pct?,
                        treatment_pct: treatment_pct?,
                    },
                ))
            })
            .collect();

        for (sex, rates) in &rows {
            info!(
                "National {}: AMI {:.1}%, treated {:.1}%",
                sex, rates.ami_pct, rates.treatment_pct
            );
        }

        Ok(GenderReference::new(rows))
    }

    /// National rates for men; the report cannot be built without them.
    pub fn male_rates(reference: &GenderReference, path: &Path) -> Result<GenderRates, LoaderError> {
        reference
            .get("Male")
            .ok_or_else(|| LoaderError::MissingGenderRow {
                path: path.to_path_buf(),
                sex: "Male".to_string(),
            })
    }
}
