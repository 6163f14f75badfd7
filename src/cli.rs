use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{RunConfig, DEFAULT_FORMAT};
use crate::io::output::OutputSpec;
use crate::io::pixel::PixelType;

#[derive(Parser)]
#[command(name = "band-calc")]
#[command(about = "Tiled raster calculator with no-data propagation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub options: GlobalOptions,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Output no-data value (defaults to a pixel-type specific value)
    #[arg(long = "no-data", global = true, allow_negative_numbers = true)]
    pub no_data: Option<f64>,

    /// Output pixel type for new files
    #[arg(long = "type", default_value = "f32", global = true)]
    pub pixel_type: PixelType,

    /// GDAL driver for new output files
    #[arg(long, default_value = DEFAULT_FORMAT, global = true)]
    pub format: String,

    /// Creation option passed to the output driver (repeatable)
    #[arg(long = "co", global = true)]
    pub creation_options: Vec<String>,

    /// Replace existing outputs instead of filling them in
    #[arg(long, global = true)]
    pub overwrite: bool,

    /// Tile width in pixels (defaults to a multiple of the input block)
    #[arg(long, global = true, requires = "tile_height")]
    pub tile_width: Option<usize>,

    /// Tile height in pixels
    #[arg(long, global = true, requires = "tile_width")]
    pub tile_height: Option<usize>,

    /// Worker threads; 0 uses every CPU
    #[arg(long, default_value = "1", global = true)]
    pub workers: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// EVI and tasseled-cap brightness/wetness from seven MODIS bands
    Indices {
        /// Band 1 (red)
        #[arg(long)]
        b1: PathBuf,

        /// Band 2 (NIR)
        #[arg(long)]
        b2: PathBuf,

        /// Band 3 (blue)
        #[arg(long)]
        b3: PathBuf,

        #[arg(long)]
        b4: PathBuf,

        #[arg(long)]
        b5: PathBuf,

        #[arg(long)]
        b6: PathBuf,

        #[arg(long)]
        b7: PathBuf,

        /// EVI file to generate or fill
        #[arg(long)]
        evi_file: Option<PathBuf>,

        /// Tasseled-cap brightness file to generate or fill
        #[arg(long)]
        tcb_file: Option<PathBuf>,

        /// Tasseled-cap wetness file to generate or fill
        #[arg(long)]
        tcw_file: Option<PathBuf>,
    },

    /// Day and night land surface temperature in Celsius
    Temps {
        /// LST day input
        #[arg(long)]
        day_input: PathBuf,

        /// LST night input
        #[arg(long)]
        night_input: PathBuf,

        /// Day output to generate or fill
        #[arg(long)]
        day_file: Option<PathBuf>,

        /// Night output to generate or fill
        #[arg(long)]
        night_file: Option<PathBuf>,
    },

    /// Normalized Difference Index: (A-B)/(A+B)
    Ndi {
        /// First band (A)
        #[arg(short = 'a', long)]
        band_a: PathBuf,

        /// Second band (B)
        #[arg(short = 'b', long)]
        band_b: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "ndi.tif")]
        output: PathBuf,
    },

    /// Run every job of a JSON batch file
    Batch {
        config: PathBuf,
    },
}

impl GlobalOptions {
    fn apply(&self, mut config: RunConfig) -> RunConfig {
        config.no_data = self.no_data;
        config.overwrite = self.overwrite;
        config.tile_size = self.tile_width.zip(self.tile_height);
        config.format = self.format.clone();
        config.creation_options = self.creation_options.clone();
        config.workers = self.workers;
        config
    }

    fn output_spec(&self, path: &Path) -> OutputSpec {
        OutputSpec {
            path: path.to_path_buf(),
            pixel_type: self.pixel_type,
            no_data: None,
        }
    }
}

impl Cli {
    /// The run described by the command line, or `None` for `batch`.
    pub fn run_config(&self) -> Option<RunConfig> {
        let opts = &self.options;
        let config = match &self.command {
            Commands::Indices {
                b1,
                b2,
                b3,
                b4,
                b5,
                b6,
                b7,
                evi_file,
                tcb_file,
                tcw_file,
            } => {
                let mut config = RunConfig::new("modis-indices");
                for (band, path) in [("B1", b1), ("B2", b2), ("B3", b3), ("B4", b4), ("B5", b5), ("B6", b6), ("B7", b7)] {
                    config = config.input(band, path.clone());
                }
                for (name, path) in [("evi", evi_file), ("tcb", tcb_file), ("tcw", tcw_file)] {
                    if let Some(path) = path {
                        config = config.output(name, opts.output_spec(path));
                    }
                }
                config
            }
            Commands::Temps {
                day_input,
                night_input,
                day_file,
                night_file,
            } => {
                let mut config = RunConfig::new("lst")
                    .input("day", day_input.clone())
                    .input("night", night_input.clone());
                for (name, path) in [("day", day_file), ("night", night_file)] {
                    if let Some(path) = path {
                        config = config.output(name, opts.output_spec(path));
                    }
                }
                config
            }
            Commands::Ndi { band_a, band_b, output } => RunConfig::new("ndi")
                .input("a", band_a.clone())
                .input("b", band_b.clone())
                .output("ndi", opts.output_spec(output)),
            Commands::Batch { .. } => return None,
        };
        Some(opts.apply(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temps_command_builds_config() {
        let cli = Cli::parse_from([
            "band-calc",
            "temps",
            "--day-input",
            "day.vrt",
            "--night-input",
            "night.vrt",
            "--day-file",
            "day.tif",
            "--no-data",
            "-9999",
            "--tile-width",
            "4800",
            "--tile-height",
            "4800",
        ]);
        let config = cli.run_config().unwrap();

        assert_eq!(config.formula, "lst");
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.outputs.keys().collect::<Vec<_>>(), vec!["day"]);
        assert_eq!(config.no_data, Some(-9999.0));
        assert_eq!(config.tile_size, Some((4800, 4800)));
    }

    #[test]
    fn test_batch_has_no_run_config() {
        let cli = Cli::parse_from(["band-calc", "batch", "jobs.json"]);
        assert!(cli.run_config().is_none());
    }
}
