// src/processing/parallel.rs
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::debug;

use crate::error::{CalcError, Result};
use crate::io::raster::RasterHandle;
use crate::processing::blocks::{BlockGrid, BlockSpec};
use crate::processing::engine::{finish_block, open_inputs, write_block, OutputPlan, Progress};
use crate::processing::formulas::Formula;
use crate::processing::tile::Tile;

type BlockResult = Result<(BlockSpec, Vec<Vec<f64>>)>;

/// Raises the cancel flag if the owning worker unwinds.
struct CancelOnPanic<'a>(&'a AtomicBool);

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::Relaxed);
        }
    }
}

/// Process `grid` on `workers` threads.
///
/// Each worker opens its own read-only inputs, pulls blocks from a shared
/// queue, and hands finished planes back over a bounded channel. The calling
/// thread owns the outputs and does every write. The first failure cancels
/// the remaining blocks and is returned; a panicking worker cancels them too
/// and surfaces as [`CalcError::WorkerPanicked`].
pub(crate) fn run_blocks(
    formula: &'static dyn Formula,
    input_paths: &[PathBuf],
    plans: &[OutputPlan],
    grid: &BlockGrid,
    outputs: &mut [RasterHandle],
    workers: usize,
    notify: &mut dyn FnMut(Progress),
) -> Result<()> {
    let (job_tx, job_rx) = flume::unbounded::<BlockSpec>();
    for block in grid.iter() {
        if job_tx.send(block).is_err() {
            break;
        }
    }
    drop(job_tx);

    // Bounded so finished tiles cannot pile up faster than they are written.
    let (result_tx, result_rx) = flume::bounded::<BlockResult>(workers);
    let cancelled = AtomicBool::new(false);
    let total = grid.len();

    debug!("Processing {} blocks on {} workers", total, workers);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let cancelled = &cancelled;

            handles.push(scope.spawn(move || {
                let _guard = CancelOnPanic(cancelled);
                let inputs = match open_inputs(input_paths) {
                    Ok(inputs) => inputs,
                    Err(e) => {
                        cancelled.store(true, Ordering::Relaxed);
                        let _ = result_tx.send(Err(e));
                        return;
                    }
                };

                for block in job_rx.iter() {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    let outcome = Tile::read(block, formula.inputs(), &inputs)
                        .and_then(|tile| finish_block(formula, &tile, plans))
                        .map(|planes| (block, planes));
                    let failed = outcome.is_err();
                    if failed {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    if result_tx.send(outcome).is_err() || failed {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        let mut first_error = None;
        let mut completed = 0;
        for outcome in result_rx.iter() {
            match outcome.and_then(|(block, planes)| write_block(outputs, &block, planes)) {
                Ok(()) => {
                    completed += 1;
                    notify(Progress { completed, total });
                }
                Err(e) => {
                    cancelled.store(true, Ordering::Relaxed);
                    first_error = Some(e);
                    break;
                }
            }
        }
        // Unblocks workers waiting on a full channel.
        drop(result_rx);

        let mut panicked = false;
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        match first_error {
            Some(e) => Err(e),
            None if panicked => Err(CalcError::WorkerPanicked),
            None => Ok(()),
        }
    })
}
