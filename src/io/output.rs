// src/io/output.rs
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};
use crate::io::pixel::PixelType;
use crate::io::raster::{CreateParams, OpenMode, RasterHandle, RasterInfo};

/// Where and how one formula output is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub path: PathBuf,
    #[serde(default, rename = "type")]
    pub pixel_type: PixelType,
    #[serde(default)]
    pub no_data: Option<f64>,
}

impl OutputSpec {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            pixel_type: PixelType::F32,
            no_data: None,
        }
    }

    /// Configured no-data value, or the default for the pixel type.
    pub fn resolved_no_data(&self) -> f64 {
        self.no_data.unwrap_or_else(|| self.pixel_type.default_no_data())
    }
}

/// Options shared by every output of a run.
#[derive(Debug, Clone)]
pub struct OutputOptions<'a> {
    pub overwrite: bool,
    pub driver: &'a str,
    pub creation_options: &'a [String],
}

/// Open `spec.path` for fill-in, or create it fresh.
///
/// An existing output is reused as-is (pixel type and no-data included)
/// unless `overwrite` is set; its size must match `width` x `height`. New
/// outputs take geotransform and projection from `reference`.
pub fn ensure_output(
    spec: &OutputSpec,
    width: usize,
    height: usize,
    reference: &RasterInfo,
    options: &OutputOptions<'_>,
) -> Result<RasterHandle> {
    let path = &spec.path;

    if path.exists() && !options.overwrite {
        info!("Output {} exists - filling in results", path.display());
        let mut handle = RasterHandle::open(path, OpenMode::Update)?;
        let actual = handle.dimensions();
        if actual != (width, height) {
            return Err(CalcError::IncompatibleOutput {
                path: path.clone(),
                actual,
                expected: (width, height),
            });
        }
        if handle.no_data().is_none() {
            let ndv = spec.no_data.unwrap_or_else(|| handle.pixel_type().default_no_data());
            warn!(
                "Output {} has no no-data value, setting it to {}",
                path.display(),
                ndv
            );
            handle.set_no_data(ndv)?;
        }
        if handle.pixel_type() != spec.pixel_type {
            debug!(
                "Keeping existing pixel type {} of {} (requested {})",
                handle.pixel_type(),
                path.display(),
                spec.pixel_type
            );
        }
        return Ok(handle);
    }

    if path.exists() {
        debug!("Removing existing output {}", path.display());
        fs::remove_file(path).map_err(|source| CalcError::Remove {
            path: path.clone(),
            source,
        })?;
    }

    info!("Generating output file {}", path.display());
    let params = CreateParams {
        width,
        height,
        pixel_type: spec.pixel_type,
        no_data: spec.resolved_no_data(),
        geo_transform: reference.geo_transform,
        projection: &reference.projection,
        driver: options.driver,
        creation_options: options.creation_options,
    };
    RasterHandle::create(path, &params)
}
