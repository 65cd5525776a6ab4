mod config;
mod metrics;
mod scenario;

use crate::config::Config;
use crate::metrics::{SweepMetrics, METRICS_FILE};
use crate::scenario::{ScenarioKind, CASE_STUDY_FILE};
use anyhow::Context;
use masp_instance::{format, rng, Catalog, InstanceBuilder};
use rand::RngCore;
use rayon::prelude::*;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    tracing::info!(config = ?config, "Loaded configuration");

    let catalog = Catalog::drone_fleet().context("Failed to build the drone catalog")?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let metrics = SweepMetrics::new().context("Failed to register metrics")?;

    if config.scenario == ScenarioKind::CaseStudy {
        let started = Instant::now();
        let instance = scenario::case_study(&catalog, config.budget_error)
            .context("Failed to assemble the case study")?;
        let path = config.output_dir.join(CASE_STUDY_FILE);
        format::write_file(&path, &instance)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        metrics.observe(&instance, started.elapsed());
        tracing::info!(path = %path.display(), "Wrote case study");
    } else {
        run_sweep(&config, &catalog, &metrics)?;
    }

    if let Some(avg) = metrics.average_demand() {
        tracing::info!(average_demand = avg, "Average minimum team size");
    }

    let path = config.output_dir.join(METRICS_FILE);
    std::fs::write(&path, metrics.render()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

fn run_sweep(config: &Config, catalog: &Catalog, metrics: &SweepMetrics) -> anyhow::Result<()> {
    let jobs = scenario::plan(config)?;
    let seed = config
        .seed
        .unwrap_or_else(|| rng::entropy_rng().next_u64());
    tracing::info!(
        scenario = %config.scenario,
        jobs = jobs.len(),
        seed,
        "Starting sweep"
    );

    jobs.par_iter().enumerate().try_for_each(|(k, job)| {
        let started = Instant::now();
        let builder = InstanceBuilder::new(catalog, job.params.clone())
            .with_context(|| format!("Invalid parameters for {}", job.file_name()))?;
        let instance = builder
            .build(&mut rng::derive_rng(seed, k as u64))
            .with_context(|| format!("Failed to generate {}", job.file_name()))?;

        let path = config.output_dir.join(job.file_name());
        format::write_file(&path, &instance)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        metrics.observe(&instance, started.elapsed());

        tracing::debug!(path = %path.display(), "Wrote instance");
        anyhow::Ok(())
    })?;

    tracing::info!(
        written = metrics.instances_written_total.get(),
        "Sweep complete"
    );
    Ok(())
}
