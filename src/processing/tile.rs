// src/processing/tile.rs
use crate::error::Result;
use crate::io::raster::RasterHandle;
use crate::processing::blocks::BlockSpec;

/// One input band's pixels for a block.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBand {
    pub name: String,
    pub no_data: Option<f64>,
    pub data: Vec<f64>,
}

/// All input bands for one block, in formula input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub block: BlockSpec,
    pub bands: Vec<TileBand>,
}

impl Tile {
    pub fn new(block: BlockSpec) -> Self {
        Self {
            block,
            bands: Vec::new(),
        }
    }

    pub fn with_band<S: Into<String>>(mut self, name: S, no_data: Option<f64>, data: Vec<f64>) -> Self {
        self.bands.push(TileBand {
            name: name.into(),
            no_data,
            data,
        });
        self
    }

    /// Read `block` from every handle; `names[i]` labels `inputs[i]`.
    pub fn read(block: BlockSpec, names: &[&str], inputs: &[RasterHandle]) -> Result<Self> {
        let mut tile = Self::new(block);
        for (name, handle) in names.iter().zip(inputs) {
            let data = handle.read_tile(&block)?;
            tile = tile.with_band(*name, handle.no_data(), data);
        }
        Ok(tile)
    }

    pub fn band_index(&self, name: &str) -> Option<usize> {
        self.bands.iter().position(|band| band.name == name)
    }

    pub fn band(&self, name: &str) -> Option<&TileBand> {
        self.bands.iter().find(|band| band.name == name)
    }
}
