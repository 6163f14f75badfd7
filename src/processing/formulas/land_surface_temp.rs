// src/processing/formulas/land_surface_temp.rs
use rayon::prelude::*;

use super::{Formula, OutputDecl};

const OUTPUTS: &[OutputDecl] = &[
    OutputDecl {
        name: "day",
        depends_on: &["day"],
    },
    OutputDecl {
        name: "night",
        depends_on: &["night"],
    },
];

/// Day and night land surface temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandSurfaceTemp {
    pub scale: f64,
    pub offset: f64,
}

impl LandSurfaceTemp {
    /// MOD11A2 LST: stored values are Kelvin / 0.02.
    pub const MOD11: Self = Self {
        scale: 0.02,
        offset: -273.15,
    };

    pub fn celsius(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }
}

impl Formula for LandSurfaceTemp {
    fn name(&self) -> &'static str {
        "lst"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["day", "night"]
    }

    fn outputs(&self) -> &'static [OutputDecl] {
        OUTPUTS
    }

    fn compute(&self, bands: &[&[f64]]) -> Vec<Vec<f64>> {
        bands
            .iter()
            .map(|band| band.par_iter().map(|&raw| self.celsius(raw)).collect())
            .collect()
    }
}
