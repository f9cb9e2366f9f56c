//! Male Mental Health - builds the state indicator report from `Data/` into
//! `Visuals/`.

use anyhow::Context;
use log::info;
use male_mental_health::{run, PipelineConfig};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let root = std::env::current_dir().context("Cannot resolve the working directory")?;
    let config = PipelineConfig::from_root(&root);
    info!(
        "Reading inputs from {}, writing charts to {}",
        config.data_dir.display(),
        config.output_dir.display()
    );

    let start = Instant::now();
    let summary = run(&config).context("Report pipeline failed")?;
    info!(
        "Wrote {} files for {} regions in {:?}",
        summary.outputs.len(),
        summary.table.len(),
        start.elapsed()
    );
    Ok(())
}
