use crate::scenario::ScenarioKind;
use anyhow::{bail, Context};
use std::path::PathBuf;
use std::str::FromStr;

/// Holds all configuration for one sweep run.
#[derive(Debug, Clone)]
pub struct Config {
    pub scenario: ScenarioKind,
    pub output_dir: PathBuf,
    /// Instances generated per sweep point.
    pub replicas: usize,
    /// Swept value range (agent count or floater count), inclusive.
    pub start: usize,
    pub end: usize,
    pub step: usize,
    /// Fleet and task counts for sweeps that hold them fixed.
    pub agents: usize,
    pub tasks: usize,
    pub floater_ratio: f64,
    pub task_ratio: f64,
    pub base_ratio: f64,
    pub budget_error: f64,
    pub half_extent_m: f64,
    /// Master seed; a random one is drawn and logged when unset.
    pub seed: Option<u64>,
}

impl Config {
    /// Parses configuration from `MASP_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            scenario: parse_or(&get, "MASP_SCENARIO", "agent-sweep")?,
            output_dir: get("MASP_OUTPUT_DIR")
                .unwrap_or_else(|| "instances".into())
                .into(),
            replicas: parse_or(&get, "MASP_REPLICAS", "50")?,
            start: parse_or(&get, "MASP_START", "50")?,
            end: parse_or(&get, "MASP_END", "150")?,
            step: parse_or(&get, "MASP_STEP", "10")?,
            agents: parse_or(&get, "MASP_AGENTS", "15")?,
            tasks: parse_or(&get, "MASP_TASKS", "4")?,
            floater_ratio: parse_or(&get, "MASP_FLOATER_RATIO", "0.25")?,
            task_ratio: parse_or(&get, "MASP_TASK_RATIO", "0.25")?,
            base_ratio: parse_or(&get, "MASP_BASE_RATIO", "0.1")?,
            budget_error: parse_or(&get, "MASP_BUDGET_ERROR", "0.25")?,
            half_extent_m: parse_or(&get, "MASP_HALF_EXTENT_M", "1500")?,
            seed: get("MASP_SEED")
                .map(|s| s.parse())
                .transpose()
                .context("Failed to parse MASP_SEED")?,
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.step == 0 {
            bail!("MASP_STEP must be greater than 0");
        }
        if self.start > self.end {
            bail!("MASP_START ({}) must not exceed MASP_END ({})", self.start, self.end);
        }
        if self.replicas == 0 {
            bail!("MASP_REPLICAS must be greater than 0");
        }
        for (name, ratio) in [
            ("MASP_FLOATER_RATIO", self.floater_ratio),
            ("MASP_TASK_RATIO", self.task_ratio),
            ("MASP_BASE_RATIO", self.base_ratio),
            ("MASP_BUDGET_ERROR", self.budget_error),
        ] {
            if !(ratio.is_finite() && ratio >= 0.0) {
                bail!("{name} must be a non-negative number");
            }
        }
        Ok(())
    }

    /// Values visited by the sweep, `start..=end` in `step` increments.
    pub fn sweep_values(&self) -> impl Iterator<Item = usize> {
        (self.start..=self.end).step_by(self.step)
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .unwrap_or_else(|| default.into())
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {key}"))
}
