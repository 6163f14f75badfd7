// src/io/mod.rs
pub mod output;
pub mod pixel;
pub mod raster;

pub use output::{ensure_output, OutputOptions, OutputSpec};
pub use pixel::PixelType;
pub use raster::{OpenMode, RasterHandle, RasterInfo};
