// src/processing/formulas/mod.rs
use std::collections::BTreeMap;

use crate::error::{CalcError, Result};
use crate::processing::tile::Tile;

pub mod land_surface_temp;
pub mod modis_indices;
pub mod ndi;

pub use land_surface_temp::LandSurfaceTemp;
pub use modis_indices::ModisIndices;
pub use ndi::NDI;

/// One plane a formula produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDecl {
    pub name: &'static str,
    /// Inputs whose no-data pixels invalidate this output.
    pub depends_on: &'static [&'static str],
}

/// A per-pixel formula over named input bands.
pub trait Formula: Send + Sync {
    fn name(&self) -> &'static str;

    /// Input band names, in the order `compute` receives them.
    fn inputs(&self) -> &'static [&'static str];

    fn outputs(&self) -> &'static [OutputDecl];

    /// Compute every output, in `outputs()` order. All `bands` have the same
    /// length.
    fn compute(&self, bands: &[&[f64]]) -> Vec<Vec<f64>>;

    fn output(&self, name: &str) -> Option<&'static OutputDecl> {
        self.outputs().iter().find(|decl| decl.name == name)
    }
}

static MODIS_INDICES: ModisIndices = ModisIndices::MCD43;
static LAND_SURFACE_TEMP: LandSurfaceTemp = LandSurfaceTemp::MOD11;
static NORMALIZED_DIFFERENCE: NDI = NDI;

static REGISTRY: [&dyn Formula; 3] = [&MODIS_INDICES, &LAND_SURFACE_TEMP, &NORMALIZED_DIFFERENCE];

/// Look up a registered formula by name.
pub fn lookup(name: &str) -> Result<&'static dyn Formula> {
    REGISTRY
        .iter()
        .copied()
        .find(|formula| formula.name() == name)
        .ok_or_else(|| CalcError::UnknownFormula(name.to_string()))
}

pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|formula| formula.name())
}

/// Evaluate `formula` on `tile`, returning one plane per declared output.
pub fn evaluate(formula: &dyn Formula, tile: &Tile) -> Result<BTreeMap<&'static str, Vec<f64>>> {
    let fail = |reason: String| CalcError::Evaluation {
        formula: formula.name().to_string(),
        block: tile.block,
        reason,
    };
    let pixels = tile.block.pixel_count();

    let mut bands = Vec::with_capacity(formula.inputs().len());
    for &name in formula.inputs() {
        let band = tile
            .band(name)
            .ok_or_else(|| fail(format!("input band {} missing from tile", name)))?;
        if band.data.len() != pixels {
            return Err(fail(format!(
                "band {} has {} pixels, block needs {}",
                name,
                band.data.len(),
                pixels
            )));
        }
        bands.push(band.data.as_slice());
    }

    let planes = formula.compute(&bands);
    if planes.len() != formula.outputs().len() {
        return Err(fail(format!(
            "produced {} planes for {} outputs",
            planes.len(),
            formula.outputs().len()
        )));
    }

    let mut result = BTreeMap::new();
    for (decl, plane) in formula.outputs().iter().zip(planes) {
        if plane.len() != pixels {
            return Err(fail(format!(
                "output {} has {} pixels, block needs {}",
                decl.name,
                plane.len(),
                pixels
            )));
        }
        result.insert(decl.name, plane);
    }
    Ok(result)
}
