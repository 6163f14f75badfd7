// src/processing/formulas/modis_indices.rs
use rayon::prelude::*;

use super::{Formula, OutputDecl};

const BANDS: &[&str] = &["B1", "B2", "B3", "B4", "B5", "B6", "B7"];

const OUTPUTS: &[OutputDecl] = &[
    OutputDecl {
        name: "evi",
        depends_on: &["B1", "B2", "B3"],
    },
    OutputDecl {
        name: "tcb",
        depends_on: BANDS,
    },
    OutputDecl {
        name: "tcw",
        depends_on: BANDS,
    },
];

/// Enhanced Vegetation Index coefficients (Huete et al.).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EviCoefficients {
    /// Canopy background adjustment
    pub l: f64,
    /// Gain factor
    pub g: f64,
    /// Aerosol resistance (red)
    pub c1: f64,
    /// Aerosol resistance (blue)
    pub c2: f64,
}

/// EVI plus tasseled-cap brightness and wetness from the seven MODIS
/// reflectance bands (B1 red, B2 NIR, B3 blue, B4..B7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModisIndices {
    /// Multiplier turning stored integers into reflectance
    pub scale: f64,
    pub evi: EviCoefficients,
    pub tcb: [f64; 7],
    pub tcw: [f64; 7],
}

impl ModisIndices {
    /// MCD43 nadir BRDF-adjusted reflectance.
    pub const MCD43: Self = Self {
        scale: 0.0001,
        evi: EviCoefficients {
            l: 1.0,
            g: 2.5,
            c1: 6.0,
            c2: 7.5,
        },
        tcb: [0.4395, 0.5945, 0.2460, 0.3918, 0.3506, 0.2136, 0.2678],
        tcw: [0.1147, 0.2489, 0.2408, 0.3132, -0.3122, -0.6416, -0.5087],
    };

    /// EVI for one pixel, clamped to [0, 1].
    pub fn evi(&self, red: f64, nir: f64, blue: f64) -> f64 {
        let EviCoefficients { l, g, c1, c2 } = self.evi;
        let s = self.scale;
        (((nir - red) * s) / ((nir + red * c1 - blue * c2) * s + l) * g).clamp(0.0, 1.0)
    }

    fn tasseled_cap(&self, coeffs: &[f64; 7], bands: &[&[f64]], i: usize) -> f64 {
        let sum: f64 = coeffs.iter().zip(bands).map(|(c, band)| band[i] * c).sum();
        (sum * self.scale).clamp(-100.0, 100.0)
    }
}

impl Formula for ModisIndices {
    fn name(&self) -> &'static str {
        "modis-indices"
    }

    fn inputs(&self) -> &'static [&'static str] {
        BANDS
    }

    fn outputs(&self) -> &'static [OutputDecl] {
        OUTPUTS
    }

    fn compute(&self, bands: &[&[f64]]) -> Vec<Vec<f64>> {
        let n = bands[0].len();
        let (red, nir, blue) = (bands[0], bands[1], bands[2]);

        let evi = (0..n)
            .into_par_iter()
            .map(|i| self.evi(red[i], nir[i], blue[i]))
            .collect();
        let tcb = (0..n)
            .into_par_iter()
            .map(|i| self.tasseled_cap(&self.tcb, bands, i))
            .collect();
        let tcw = (0..n)
            .into_par_iter()
            .map(|i| self.tasseled_cap(&self.tcw, bands, i))
            .collect();

        vec![evi, tcb, tcw]
    }
}
