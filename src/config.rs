//! Pipeline configuration.
//!
//! Every path and constant the run depends on lives here. Nothing is read from
//! flags or the environment: `PipelineConfig::default()` describes the report.

use std::ops::Range;
use std::path::{Path, PathBuf};

/// Public boundary dataset for the US states, keyed by `properties.name`.
pub const US_STATES_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/PublicaMundi/MappingAPI/master/data/geojson/us-states.json";

/// Where the boundary GeoJSON comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundarySource {
    /// Download over HTTP(S).
    Url(String),
    /// Read a local GeoJSON file.
    File(PathBuf),
}

/// Layout of a NSDUH state estimate table.
#[derive(Debug, Clone)]
pub struct SurveyLayout {
    /// Lines skipped before the real header line
    pub header_skip_rows: usize,
    /// Data rows (0-based, after the header) holding regional aggregates
    pub noise_rows: Range<usize>,
    /// Columns coerced from separator-formatted text to `f64`
    pub numeric_columns: Vec<String>,
}

impl Default for SurveyLayout {
    fn default() -> Self {
        Self {
            header_skip_rows: 1,
            noise_rows: 1..6,
            numeric_columns: vec![
                "Estimate_18plus".to_string(),
                "CI_18plus_Lower".to_string(),
                "CI_18plus_Upper".to_string(),
            ],
        }
    }
}

/// Column names and age rules of the census age/sex population file.
#[derive(Debug, Clone)]
pub struct PopulationLayout {
    pub name_col: String,
    pub sex_col: String,
    pub age_col: String,
    pub population_col: String,
    /// First age counted as adult
    pub adult_min_age: i64,
    /// Code used by the census file for the all-ages total row
    pub total_age_code: i64,
    pub sex_total_code: i64,
    pub sex_male_code: i64,
}

impl Default for PopulationLayout {
    fn default() -> Self {
        Self {
            name_col: "NAME".to_string(),
            sex_col: "SEX".to_string(),
            age_col: "AGE".to_string(),
            population_col: "POPEST2023_CIV".to_string(),
            adult_min_age: 18,
            total_age_code: 999,
            sex_total_code: 0,
            sex_male_code: 1,
        }
    }
}

/// Size of the static raster exports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub base_width: u32,
    pub base_height: u32,
    /// Multiplier applied to the base size and to font sizes
    pub scale: u32,
}

impl ImageSize {
    pub fn width(&self) -> u32 {
        self.base_width * self.scale
    }

    pub fn height(&self) -> u32 {
        self.base_height * self.scale
    }

    /// Scale a base font or stroke size.
    pub fn px(&self, base: f64) -> f64 {
        base * self.scale as f64
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            base_width: 700,
            base_height: 500,
            scale: 3,
        }
    }
}

/// Full configuration of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub disorder_file: String,
    pub treatment_file: String,
    pub population_file: String,
    pub gender_file: String,
    pub survey: SurveyLayout,
    pub population: PopulationLayout,
    pub boundary_source: BoundarySource,
    /// Published NSDUH share of adults with AMI who received treatment
    pub national_treatment_overall_pct: f64,
    /// Number of regions shown in each ranked bar chart
    pub top_n: usize,
    pub image: ImageSize,
    /// Also write the merged indicator table as CSV
    pub export_merged_csv: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            output_dir: PathBuf::from("Visuals"),
            disorder_file: "mental_disorder.csv".to_string(),
            treatment_file: "treatment_received.csv".to_string(),
            population_file: "sc-est2023-agesex-civ.csv".to_string(),
            gender_file: "ami_by_gender.csv".to_string(),
            survey: SurveyLayout::default(),
            population: PopulationLayout::default(),
            boundary_source: BoundarySource::Url(US_STATES_GEOJSON_URL.to_string()),
            national_treatment_overall_pct: 50.6,
            top_n: 10,
            image: ImageSize::default(),
            export_merged_csv: true,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with `Data/` and `Visuals/` under `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_dir: root.join("Data"),
            output_dir: root.join("Visuals"),
            ..Self::default()
        }
    }

    pub fn disorder_path(&self) -> PathBuf {
        self.data_dir.join(&self.disorder_file)
    }

    pub fn treatment_path(&self) -> PathBuf {
        self.data_dir.join(&self.treatment_file)
    }

    pub fn population_path(&self) -> PathBuf {
        self.data_dir.join(&self.population_file)
    }

    pub fn gender_path(&self) -> PathBuf {
        self.data_dir.join(&self.gender_file)
    }
}
