// src/lib.rs
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod processing;

pub use config::RunConfig;
pub use error::{CalcError, Result};
pub use processing::{Calculation, Progress, RunSummary};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
