// src/processing/validate.rs
use log::debug;

use crate::error::{CalcError, Result};
use crate::io::raster::RasterHandle;

/// Check that every input has the size of the first one and return it.
pub fn validate_dimensions(handles: &[RasterHandle]) -> Result<(usize, usize)> {
    let first = handles.first().ok_or(CalcError::NoInputs)?;
    let expected = first.dimensions();

    for handle in handles {
        let actual = handle.dimensions();
        debug!(
            "Input {}: {}x{}, type {}",
            handle.path().display(),
            actual.0,
            actual.1,
            handle.pixel_type()
        );
        if actual != expected {
            return Err(CalcError::DimensionMismatch {
                path: handle.path().to_path_buf(),
                actual,
                expected,
            });
        }
    }

    Ok(expected)
}
