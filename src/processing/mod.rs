// src/processing/mod.rs
pub mod blocks;
pub mod engine;
pub mod formulas;
pub mod mask;
pub mod parallel;
pub mod tile;
pub mod validate;

pub use blocks::{BlockGrid, BlockSpec};
pub use engine::{Calculation, Progress, RunSummary};
pub use formulas::Formula;
pub use tile::Tile;
