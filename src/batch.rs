// src/batch.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{default_format, default_workers, RunConfig};
use crate::io::output::OutputSpec;
use crate::processing::Calculation;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub jobs: Vec<Job>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default)]
    pub no_data: Option<f64>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub tile_size: Option<(usize, usize)>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub creation_options: Vec<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            no_data: None,
            overwrite: false,
            tile_size: None,
            format: default_format(),
            creation_options: Vec::new(),
            workers: default_workers(),
        }
    }
}

/// One calculation; unset fields fall back to `global`.
#[derive(Deserialize, Serialize, Debug)]
pub struct Job {
    pub formula: String,
    pub inputs: BTreeMap<String, PathBuf>,
    pub outputs: BTreeMap<String, OutputSpec>,
    pub no_data: Option<f64>,
    pub overwrite: Option<bool>,
    pub tile_size: Option<(usize, usize)>,
    pub format: Option<String>,
    pub creation_options: Option<Vec<String>>,
    pub workers: Option<usize>,
}

impl Job {
    pub fn to_run_config(&self, global: &GlobalParams) -> RunConfig {
        RunConfig {
            formula: self.formula.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            no_data: self.no_data.or(global.no_data),
            overwrite: self.overwrite.unwrap_or(global.overwrite),
            tile_size: self.tile_size.or(global.tile_size),
            format: self.format.clone().unwrap_or_else(|| global.format.clone()),
            creation_options: self
                .creation_options
                .clone()
                .unwrap_or_else(|| global.creation_options.clone()),
            workers: self.workers.unwrap_or(global.workers),
        }
    }
}

pub fn load_batch(config_path: &Path) -> Result<BatchConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read batch file {}", config_path.display()))?;
    let config: BatchConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("Invalid batch file {}", config_path.display()))?;
    Ok(config)
}

pub fn process_batch(config_path: &Path) -> Result<()> {
    let config = load_batch(config_path)?;

    info!("Starting batch processing with {} jobs...", config.jobs.len());

    for (i, job) in config.jobs.iter().enumerate() {
        info!(
            "[{}/{}] Processing {} -> {}",
            i + 1,
            config.jobs.len(),
            job.formula,
            job.outputs.keys().cloned().collect::<Vec<_>>().join(", ")
        );

        let run_config = job.to_run_config(&config.global);
        Calculation::new(&run_config)?
            .run()
            .with_context(|| format!("Job {} ({}) failed", i + 1, job.formula))?;
    }

    info!("Batch processing complete!");
    Ok(())
}
