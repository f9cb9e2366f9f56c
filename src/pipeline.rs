//! Report Pipeline
//! Load, join, derive and render, in that order.

use crate::charts::interactive::{bar_figure, choropleth_figure, write_html};
use crate::charts::{render_rgb, save_jpeg, BarChart, Canvas, ChoroplethMap, RenderError};
use crate::config::PipelineConfig;
use crate::data::{
    join_regions, CoverageReport, DataLoader, ExcludedRegion, GenderRates, PopulationTables, RegionSource,
    REGION_KEY,
};
use crate::error::PipelineError;
use crate::geo::Boundaries;
use crate::stats::{IndicatorCalculator, IndicatorTable, NationalRates};
use log::info;
use polars::prelude::*;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const DISORDER_IMAGE: &str = "fig_dis.jpg";
pub const DISORDER_HTML: &str = "interactive_disorder-18plus.html";
pub const TREATMENT_IMAGE: &str = "fig_treat.jpg";
pub const TREATMENT_HTML: &str = "interactive_treatment-18plus.html";
pub const TOP_RATE_IMAGE: &str = "fig_rate.jpg";
pub const TOP_RATE_HTML: &str = "interactive_top10_male_treatment_rate.html";
pub const BOTTOM_GAP_IMAGE: &str = "fig_bottom_gap.jpg";
pub const BOTTOM_GAP_HTML: &str = "interactive_bottom10_male_treatment_gap.html";
pub const MERGED_CSV: &str = "merged_indicators.csv";

/// The four input tables after loading and cleaning.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub disorder: DataFrame,
    pub treatment: DataFrame,
    pub population: PopulationTables,
    pub male: GenderRates,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub table: IndicatorTable,
    pub excluded: Vec<ExcludedRegion>,
    /// Every file written, in write order
    pub outputs: Vec<PathBuf>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Run the whole report.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    fs::create_dir_all(&config.output_dir).map_err(io_error(&config.output_dir))?;

    let inputs = load_inputs(config)?;
    let (merged, coverage) = join_inputs(&inputs)?;
    if merged.height() == 0 {
        return Err(PipelineError::NoRegions);
    }

    let national = NationalRates {
        male_ami_pct: inputs.male.ami_pct,
        male_treatment_pct: inputs.male.treatment_pct,
        overall_treatment_pct: config.national_treatment_overall_pct,
    };
    let table = IndicatorCalculator::derive_from_frame(&merged, national)?;

    let mut outputs = Vec::new();
    if config.export_merged_csv {
        outputs.push(write_indicator_csv(&table, &config.output_dir)?);
    }

    let boundaries = Boundaries::load(&config.boundary_source)?;
    outputs.extend(render_charts(&table, &boundaries, config)?);

    info!(
        "Report complete: {} regions, {} files in {}",
        table.len(),
        outputs.len(),
        config.output_dir.display()
    );
    Ok(RunSummary {
        table,
        excluded: coverage.excluded,
        outputs,
    })
}

/// Load the survey, population and gender tables named by `config`.
pub fn load_inputs(config: &PipelineConfig) -> Result<LoadedInputs, PipelineError> {
    let disorder = DataLoader::load_survey_table(&config.disorder_path(), &config.survey)?;
    let treatment = DataLoader::load_survey_table(&config.treatment_path(), &config.survey)?;
    let population = DataLoader::load_population(&config.population_path(), &config.population)?;

    let gender_path = config.gender_path();
    let reference = DataLoader::load_gender_reference(&gender_path)?;
    let male = DataLoader::male_rates(&reference, &gender_path)?;

    Ok(LoadedInputs {
        disorder,
        treatment,
        population,
        male,
    })
}

/// Keep the region key and the adult estimate, renamed to `alias`.
fn adult_estimate(df: &DataFrame, alias: &str) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .select([col(REGION_KEY), col("Estimate_18plus").alias(alias)])
        .collect()
}

/// Inner-join the inputs into one row per region, in disorder table order.
pub fn join_inputs(inputs: &LoadedInputs) -> Result<(DataFrame, CoverageReport), PipelineError> {
    let disorder = adult_estimate(&inputs.disorder, "Disorder_18plus")?;
    let treatment = adult_estimate(&inputs.treatment, "Treatment_18plus")?;
    let sources = [
        RegionSource::new("mental_disorder", &disorder),
        RegionSource::new("treatment_received", &treatment),
        RegionSource::new("adult population", &inputs.population.adults),
        RegionSource::new("adult male population", &inputs.population.adult_men),
    ];
    Ok(join_regions(&sources)?)
}

/// Write the derived table as CSV.
pub fn write_indicator_csv(table: &IndicatorTable, output_dir: &Path) -> Result<PathBuf, PipelineError> {
    let path = output_dir.join(MERGED_CSV);
    let mut df = table.to_dataframe()?;
    let file = File::create(&path).map_err(io_error(&path))?;
    CsvWriter::new(file).include_header(true).finish(&mut df)?;
    info!("Saved {}", path.display());
    Ok(path)
}

/// Render one chart as a JPEG and an HTML page.
fn export_chart<F>(
    config: &PipelineConfig,
    image_name: &str,
    html_name: &str,
    title: &str,
    figure: Value,
    draw: F,
) -> Result<[PathBuf; 2], PipelineError>
where
    F: FnOnce(&Canvas<'_>) -> Result<(), RenderError>,
{
    let image_path = config.output_dir.join(image_name);
    let image = render_rgb(config.image, draw)?;
    save_jpeg(&image, &image_path)?;
    info!("Saved {}", image_path.display());

    let html_path = config.output_dir.join(html_name);
    write_html(&html_path, title, &figure)?;
    info!("Saved {}", html_path.display());

    Ok([image_path, html_path])
}

/// Render the two maps and the two ranked bar charts.
pub fn render_charts(
    table: &IndicatorTable,
    boundaries: &Boundaries,
    config: &PipelineConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    let size = config.image;
    let mut outputs = Vec::with_capacity(8);

    let disorder = ChoroplethMap::disorder(table, boundaries);
    outputs.extend(export_chart(
        config,
        DISORDER_IMAGE,
        DISORDER_HTML,
        &disorder.title,
        choropleth_figure(&disorder),
        |root| disorder.draw(root, size),
    )?);

    let treatment = ChoroplethMap::treatment(table, boundaries);
    outputs.extend(export_chart(
        config,
        TREATMENT_IMAGE,
        TREATMENT_HTML,
        &treatment.title,
        choropleth_figure(&treatment),
        |root| treatment.draw(root, size),
    )?);

    let top = BarChart::top_treatment_rate(&table.regions, config.top_n);
    outputs.extend(export_chart(
        config,
        TOP_RATE_IMAGE,
        TOP_RATE_HTML,
        &top.title,
        bar_figure(&top),
        |root| top.draw(root, size),
    )?);

    let bottom = BarChart::bottom_treatment_gap(&table.regions, config.top_n);
    outputs.extend(export_chart(
        config,
        BOTTOM_GAP_IMAGE,
        BOTTOM_GAP_HTML,
        &bottom.title,
        bar_figure(&bottom),
        |root| bottom.draw(root, size),
    )?);

    Ok(outputs)
}
