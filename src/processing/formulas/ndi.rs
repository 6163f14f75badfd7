// src/processing/formulas/ndi.rs
use rayon::prelude::*;

use super::{Formula, OutputDecl};

const OUTPUTS: &[OutputDecl] = &[OutputDecl {
    name: "ndi",
    depends_on: &["a", "b"],
}];

/// Normalized Difference Index: (A-B)/(A+B), clamped to [-1, 1].
///
/// Covers NDVI, NDWI, NDSI and friends depending on which bands are bound
/// to `a` and `b`. A zero denominator yields NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NDI;

impl Formula for NDI {
    fn name(&self) -> &'static str {
        "ndi"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["a", "b"]
    }

    fn outputs(&self) -> &'static [OutputDecl] {
        OUTPUTS
    }

    fn compute(&self, bands: &[&[f64]]) -> Vec<Vec<f64>> {
        let (a_data, b_data) = (bands[0], bands[1]);
        let mut result_data = vec![0.0f64; a_data.len()];

        result_data.par_iter_mut().enumerate().for_each(|(i, result)| {
            let a_val = a_data[i];
            let b_val = b_data[i];

            *result = if a_val + b_val != 0.0 {
                ((a_val - b_val) / (a_val + b_val)).clamp(-1.0, 1.0)
            } else {
                f64::NAN
            };
        });

        vec![result_data]
    }
}
