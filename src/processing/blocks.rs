// src/processing/blocks.rs
use std::fmt;

use itertools::iproduct;
use log::debug;

use crate::error::{CalcError, Result};

/// Side length a derived tile grows to before it stops being scaled up.
pub const TARGET_TILE_EDGE: usize = 1024;

/// Pixel window of one block. Always lies inside the raster it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSpec {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BlockSpec {
    pub fn offset(&self) -> (isize, isize) {
        (self.x as isize, self.y as isize)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for BlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}

/// Row-major partition of a raster into tiles, clipped at the right and
/// bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    width: usize,
    height: usize,
    tile_width: usize,
    tile_height: usize,
    blocks_x: usize,
    blocks_y: usize,
}

impl BlockGrid {
    pub fn new(width: usize, height: usize, tile_width: usize, tile_height: usize) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(CalcError::InvalidTileSize(tile_width, tile_height));
        }

        let blocks_x = width.div_ceil(tile_width);
        let blocks_y = height.div_ceil(tile_height);

        debug!(
            "BlockGrid: {}x{} raster, tile {}x{} -> {}x{} blocks ({} total)",
            width, height, tile_width, tile_height, blocks_x, blocks_y, blocks_x * blocks_y
        );

        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            blocks_x,
            blocks_y,
        })
    }

    pub fn tile_size(&self) -> (usize, usize) {
        (self.tile_width, self.tile_height)
    }

    pub fn blocks(&self) -> (usize, usize) {
        (self.blocks_x, self.blocks_y)
    }

    pub fn len(&self) -> usize {
        self.blocks_x * self.blocks_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block at `(col, row)` in grid coordinates.
    fn block_at(&self, col: usize, row: usize) -> BlockSpec {
        let x = col * self.tile_width;
        let y = row * self.tile_height;
        BlockSpec {
            x,
            y,
            width: self.tile_width.min(self.width - x),
            height: self.tile_height.min(self.height - y),
        }
    }

    /// The `index`-th block in iteration order.
    pub fn block(&self, index: usize) -> Option<BlockSpec> {
        if index >= self.len() {
            return None;
        }
        Some(self.block_at(index % self.blocks_x, index / self.blocks_x))
    }

    /// Lazily yields every block, rows top to bottom, columns left to right.
    /// Calling it again restarts from the first block.
    pub fn iter(&self) -> impl Iterator<Item = BlockSpec> + Clone + '_ {
        iproduct!(0..self.blocks_y, 0..self.blocks_x).map(move |(row, col)| self.block_at(col, row))
    }
}

/// Derive a tile size from the native storage block of the inputs.
///
/// The native block is grown by whole multiples until each side reaches
/// [`TARGET_TILE_EDGE`] so reads stay aligned with storage chunks, then
/// clipped to the raster.
pub fn suggest_tile_size(native: (usize, usize), width: usize, height: usize) -> (usize, usize) {
    let grow = |edge: usize, limit: usize| {
        let edge = edge.max(1);
        let multiple = TARGET_TILE_EDGE.div_ceil(edge);
        (edge * multiple).min(limit.max(1))
    };
    (grow(native.0, width), grow(native.1, height))
}
