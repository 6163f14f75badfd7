// src/main.rs
use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use band_calc::batch::process_batch;
use band_calc::cli::{Cli, Commands};
use band_calc::processing::{Calculation, Progress};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Commands::Batch { config } = &cli.command {
        return process_batch(config);
    }

    let Some(config) = cli.run_config() else {
        return Ok(());
    };
    if config.outputs.is_empty() {
        anyhow::bail!("No output files given. Nothing to do!");
    }

    // Report in 10% steps.
    let mut last_step = None;
    let summary = Calculation::new(&config)?
        .with_progress(|progress: Progress| {
            let step = (progress.percent() / 10.0).floor() as u32;
            if last_step != Some(step) {
                last_step = Some(step);
                info!("{}%", step * 10);
            }
        })
        .run()?;

    for output in &summary.outputs {
        info!("Processing complete: {}", output.display());
    }
    Ok(())
}
