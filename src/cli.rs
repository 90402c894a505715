use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{SubsetConfig, TablePaths, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED};

#[derive(Parser, Debug)]
#[command(name = "openflights-subset")]
#[command(version, about = "Sample a small, referentially consistent subset of the OpenFlights datasets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample routes and write the consistent subset of every table
    Subset(SubsetArgs),

    /// Download the OpenFlights data files
    Download {
        /// Output directory (defaults to the user cache directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,
    },

    /// Download (if needed) and subset the cached files
    Sync {
        #[command(flatten)]
        subset: SubsetArgs,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,

        /// Custom cache directory
        #[arg(short, long)]
        cache_dir: Option<PathBuf>,
    },

    /// List the tables and how they reference each other
    Tables,
}

#[derive(Args, Debug, Clone)]
pub struct SubsetArgs {
    /// Number of routes to sample
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE, allow_negative_numbers = true)]
    pub routes: i64,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Directory containing the input .dat files
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory for the *_small.dat outputs
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub routes_path: Option<PathBuf>,
    #[arg(long)]
    pub airports_path: Option<PathBuf>,
    #[arg(long)]
    pub airlines_path: Option<PathBuf>,
    /// Optional; planes_small.dat is skipped when absent
    #[arg(long)]
    pub planes_path: Option<PathBuf>,
    /// Optional; countries_small.dat is skipped when absent
    #[arg(long)]
    pub countries_path: Option<PathBuf>,

    #[arg(long)]
    pub routes_out: Option<PathBuf>,
    #[arg(long)]
    pub airports_out: Option<PathBuf>,
    #[arg(long)]
    pub airlines_out: Option<PathBuf>,
    #[arg(long)]
    pub planes_out: Option<PathBuf>,
    #[arg(long)]
    pub countries_out: Option<PathBuf>,

    /// Also write the subset into a SQLite database with enforced foreign keys
    #[arg(long)]
    pub sqlite: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

fn override_paths(mut paths: TablePaths, overrides: [&Option<PathBuf>; 5]) -> TablePaths {
    let [routes, airports, airlines, planes, countries] = overrides;
    let slots = [
        (&mut paths.routes, routes),
        (&mut paths.airports, airports),
        (&mut paths.airlines, airlines),
        (&mut paths.planes, planes),
        (&mut paths.countries, countries),
    ];
    for (slot, value) in slots {
        if let Some(path) = value {
            *slot = path.clone();
        }
    }
    paths
}

impl SubsetArgs {
    /// Build the run configuration; `data_dir` replaces `--data-dir` when set
    pub fn to_config(&self, data_dir: Option<&Path>) -> SubsetConfig {
        let data_dir = data_dir.unwrap_or(self.data_dir.as_path());

        SubsetConfig {
            sample_size: self.routes,
            seed: self.seed,
            inputs: override_paths(
                TablePaths::inputs_in(data_dir),
                [
                    &self.routes_path,
                    &self.airports_path,
                    &self.airlines_path,
                    &self.planes_path,
                    &self.countries_path,
                ],
            ),
            outputs: override_paths(
                TablePaths::outputs_in(&self.out_dir),
                [
                    &self.routes_out,
                    &self.airports_out,
                    &self.airlines_out,
                    &self.planes_out,
                    &self.countries_out,
                ],
            ),
            sqlite: self.sqlite.clone(),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
