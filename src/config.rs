// src/config.rs
use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::io::output::OutputSpec;

pub const DEFAULT_FORMAT: &str = "GTiff";

pub fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

pub fn default_workers() -> usize {
    1
}

/// Everything one calculation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Registered formula name, e.g. `modis-indices`.
    pub formula: String,
    /// Input raster per band role.
    pub inputs: BTreeMap<String, PathBuf>,
    /// Output raster per output role. Roles left out are not written.
    pub outputs: BTreeMap<String, OutputSpec>,
    /// No-data for outputs that do not set their own.
    #[serde(default)]
    pub no_data: Option<f64>,
    #[serde(default)]
    pub overwrite: bool,
    /// Tile width and height; derived from the inputs' storage blocks when
    /// absent.
    #[serde(default)]
    pub tile_size: Option<(usize, usize)>,
    /// GDAL driver for new outputs.
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub creation_options: Vec<String>,
    /// 1 runs on the calling thread, 0 uses every CPU.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl RunConfig {
    pub fn new<S: Into<String>>(formula: S) -> Self {
        Self {
            formula: formula.into(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            no_data: None,
            overwrite: false,
            tile_size: None,
            format: default_format(),
            creation_options: Vec::new(),
            workers: default_workers(),
        }
    }

    pub fn input<S: Into<String>, P: Into<PathBuf>>(mut self, band: S, path: P) -> Self {
        self.inputs.insert(band.into(), path.into());
        self
    }

    pub fn output<S: Into<String>>(mut self, name: S, spec: OutputSpec) -> Self {
        self.outputs.insert(name.into(), spec);
        self
    }

    /// The output spec with the run-wide no-data applied where the output
    /// has none of its own.
    pub fn effective_output(&self, spec: &OutputSpec) -> OutputSpec {
        OutputSpec {
            no_data: spec.no_data.or(self.no_data),
            ..spec.clone()
        }
    }

    pub fn worker_count(&self) -> usize {
        match self.workers {
            0 => num_cpus::get(),
            n => n,
        }
    }
}
