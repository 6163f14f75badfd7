// src/processing/engine.rs
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{CalcError, Result};
use crate::io::output::{ensure_output, OutputOptions};
use crate::io::raster::{OpenMode, RasterHandle};
use crate::processing::blocks::{suggest_tile_size, BlockGrid, BlockSpec};
use crate::processing::formulas::{self, Formula};
use crate::processing::mask::{self, InputMask};
use crate::processing::parallel;
use crate::processing::tile::Tile;
use crate::processing::validate::validate_dimensions;

/// Blocks finished so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub width: usize,
    pub height: usize,
    pub tile_size: (usize, usize),
    pub blocks: usize,
    pub outputs: Vec<PathBuf>,
}

/// How one configured output is masked.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputPlan {
    pub name: &'static str,
    /// Tile band indices whose no-data invalidates this output.
    pub mask_bands: Vec<usize>,
    pub no_data: f64,
}

type ProgressFn<'a> = Box<dyn FnMut(Progress) + 'a>;

/// One run of a formula over a set of co-registered inputs.
pub struct Calculation<'a> {
    config: &'a RunConfig,
    formula: &'static dyn Formula,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> Calculation<'a> {
    pub fn new(config: &'a RunConfig) -> Result<Self> {
        let formula = formulas::lookup(&config.formula)?;
        Ok(Self {
            config,
            formula,
            progress: None,
        })
    }

    /// Called after every written block.
    pub fn with_progress<F: FnMut(Progress) + 'a>(mut self, observer: F) -> Self {
        self.progress = Some(Box::new(observer));
        self
    }

    pub fn run(mut self) -> Result<RunSummary> {
        let formula = self.formula;
        let config = self.config;

        let input_paths = resolve_inputs(formula, config)?;
        let inputs = open_inputs(&input_paths)?;
        let (width, height) = validate_dimensions(&inputs)?;
        info!(
            "Running {} on {} inputs of {}x{}",
            formula.name(),
            inputs.len(),
            width,
            height
        );

        // The grid is checked before any output is opened or created.
        let (tile_width, tile_height) = config
            .tile_size
            .unwrap_or_else(|| suggest_tile_size(inputs[0].native_block_size(), width, height));
        let grid = BlockGrid::new(width, height, tile_width, tile_height)?;
        info!(
            "Using blocksize {} x {} ({} blocks)",
            tile_width,
            tile_height,
            grid.len()
        );

        let (plans, mut outputs) = synthesize_outputs(formula, config, &inputs[0], width, height)?;

        let mut observer = self.progress.take();
        let mut notify = |progress: Progress| {
            if let Some(observer) = observer.as_mut() {
                observer(progress);
            }
        };

        let workers = config.worker_count();
        if workers > 1 && grid.len() > 1 {
            drop(inputs);
            parallel::run_blocks(
                formula,
                &input_paths,
                &plans,
                &grid,
                &mut outputs,
                workers.min(grid.len()),
                &mut notify,
            )?;
        } else {
            let total = grid.len();
            for (index, block) in grid.iter().enumerate() {
                let tile = Tile::read(block, formula.inputs(), &inputs)?;
                let planes = finish_block(formula, &tile, &plans)?;
                write_block(&mut outputs, &block, planes)?;
                notify(Progress {
                    completed: index + 1,
                    total,
                });
            }
        }

        for output in &mut outputs {
            output.flush()?;
        }
        info!("{} done", formula.name());

        Ok(RunSummary {
            width,
            height,
            tile_size: grid.tile_size(),
            blocks: grid.len(),
            outputs: outputs.iter().map(|o| o.path().to_path_buf()).collect(),
        })
    }
}

/// Input paths in formula input order.
fn resolve_inputs(formula: &dyn Formula, config: &RunConfig) -> Result<Vec<PathBuf>> {
    for band in config.inputs.keys() {
        if !formula.inputs().contains(&band.as_str()) {
            warn!("Input {} is not used by {}", band, formula.name());
        }
    }

    formula
        .inputs()
        .iter()
        .map(|&band| {
            config
                .inputs
                .get(band)
                .cloned()
                .ok_or_else(|| CalcError::MissingInput {
                    formula: formula.name().to_string(),
                    band: band.to_string(),
                })
        })
        .collect()
}

pub(crate) fn open_inputs(paths: &[PathBuf]) -> Result<Vec<RasterHandle>> {
    paths
        .iter()
        .map(|path| RasterHandle::open(path, OpenMode::ReadOnly))
        .collect()
}

fn synthesize_outputs(
    formula: &dyn Formula,
    config: &RunConfig,
    reference: &RasterHandle,
    width: usize,
    height: usize,
) -> Result<(Vec<OutputPlan>, Vec<RasterHandle>)> {
    if config.outputs.is_empty() {
        return Err(CalcError::NoOutputs(formula.name().to_string()));
    }

    // Check every role before touching the filesystem.
    let decls = config
        .outputs
        .keys()
        .map(|name| {
            formula.output(name).ok_or_else(|| CalcError::UnknownOutput {
                formula: formula.name().to_string(),
                output: name.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let options = OutputOptions {
        overwrite: config.overwrite,
        driver: &config.format,
        creation_options: &config.creation_options,
    };

    let mut plans = Vec::with_capacity(decls.len());
    let mut handles = Vec::with_capacity(decls.len());
    for (decl, spec) in decls.into_iter().zip(config.outputs.values()) {
        let spec = config.effective_output(spec);
        let handle = ensure_output(&spec, width, height, reference.info(), &options)?;
        let no_data = handle.no_data().unwrap_or_else(|| spec.resolved_no_data());
        debug!(
            "Output {} -> {} ({}, nodata {})",
            decl.name,
            handle.path().display(),
            handle.pixel_type(),
            no_data
        );

        let mask_bands = decl
            .depends_on
            .iter()
            .filter_map(|dep| formula.inputs().iter().position(|input| input == dep))
            .collect();
        plans.push(OutputPlan {
            name: decl.name,
            mask_bands,
            no_data,
        });
        handles.push(handle);
    }

    Ok((plans, handles))
}

/// Evaluate and mask one tile, returning a plane per plan.
pub(crate) fn finish_block(formula: &dyn Formula, tile: &Tile, plans: &[OutputPlan]) -> Result<Vec<Vec<f64>>> {
    let mut planes = formulas::evaluate(formula, tile)?;
    let input_mask = InputMask::compute(tile);

    plans
        .iter()
        .map(|plan| {
            let mut plane = planes.remove(plan.name).ok_or_else(|| CalcError::Evaluation {
                formula: formula.name().to_string(),
                block: tile.block,
                reason: format!("no plane produced for output {}", plan.name),
            })?;
            mask::apply(&mut plane, &input_mask.reduce_any(&plan.mask_bands), plan.no_data);
            Ok(plane)
        })
        .collect()
}

pub(crate) fn write_block(outputs: &mut [RasterHandle], block: &BlockSpec, planes: Vec<Vec<f64>>) -> Result<()> {
    for (output, plane) in outputs.iter_mut().zip(planes) {
        output.write_tile(block, plane)?;
    }
    Ok(())
}
