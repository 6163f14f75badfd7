use std::path::PathBuf;

use gdal::errors::GdalError;
use thiserror::Error;

use crate::processing::blocks::BlockSpec;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error(
        "Dimensions of {} ({}, {}) are different from other files ({}, {})",
        path.display(), actual.0, actual.1, expected.0, expected.1
    )]
    DimensionMismatch {
        path: PathBuf,
        actual: (usize, usize),
        expected: (usize, usize),
    },

    #[error("No input rasters supplied")]
    NoInputs,

    #[error("Formula {formula} requires input band {band}, which was not supplied")]
    MissingInput { formula: String, band: String },

    #[error("Unknown formula: {0}")]
    UnknownFormula(String),

    #[error("Formula {formula} has no output named {output}")]
    UnknownOutput { formula: String, output: String },

    #[error("No outputs configured for formula {0}")]
    NoOutputs(String),

    #[error("Invalid tile size: {0}x{1} (both sides must be positive)")]
    InvalidTileSize(usize, usize),

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    #[error("Failed to remove existing output {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read block {block} of {}: {source}", path.display())]
    Read {
        path: PathBuf,
        block: BlockSpec,
        #[source]
        source: GdalError,
    },

    #[error("Failed to write block {block} of {}: {source}", path.display())]
    Write {
        path: PathBuf,
        block: BlockSpec,
        #[source]
        source: GdalError,
    },

    #[error("Failed to set no-data value on {}: {source}", path.display())]
    SetNoData {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    #[error("Failed to flush {}: {source}", path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    #[error(
        "Output {} exists but is {}x{}, expected {}x{}; use overwrite to replace it",
        path.display(), actual.0, actual.1, expected.0, expected.1
    )]
    IncompatibleOutput {
        path: PathBuf,
        actual: (usize, usize),
        expected: (usize, usize),
    },

    #[error("Unsupported pixel type {data_type} in {}", path.display())]
    UnsupportedPixelType { path: PathBuf, data_type: String },

    #[error("Evaluation of {formula} failed on block {block}: {reason}")]
    Evaluation {
        formula: String,
        block: BlockSpec,
        reason: String,
    },

    #[error("Worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, CalcError>;
