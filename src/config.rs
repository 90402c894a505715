//! Run configuration: sample size, seed and the paths of every table

use std::path::{Path, PathBuf};

use crate::schema::{TableSchema, AIRLINES, AIRPORTS, COUNTRIES, PLANES, ROUTES};

pub const DEFAULT_SAMPLE_SIZE: i64 = 350;
pub const DEFAULT_SEED: u64 = 42;

/// One path per table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub routes: PathBuf,
    pub airports: PathBuf,
    pub airlines: PathBuf,
    pub planes: PathBuf,
    pub countries: PathBuf,
}

impl TablePaths {
    fn with(dir: &Path, name: impl Fn(&TableSchema) -> &'static str) -> Self {
        Self {
            routes: dir.join(name(&ROUTES)),
            airports: dir.join(name(&AIRPORTS)),
            airlines: dir.join(name(&AIRLINES)),
            planes: dir.join(name(&PLANES)),
            countries: dir.join(name(&COUNTRIES)),
        }
    }

    /// Default input file names inside `dir`
    pub fn inputs_in(dir: &Path) -> Self {
        Self::with(dir, |t| t.source_file)
    }

    /// Default output file names inside `dir`
    pub fn outputs_in(dir: &Path) -> Self {
        Self::with(dir, |t| t.output_file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetConfig {
    /// Requested number of routes; negative values are rejected by the sampler
    pub sample_size: i64,
    pub seed: u64,
    pub inputs: TablePaths,
    pub outputs: TablePaths,
    /// Also write the subset into this SQLite database
    pub sqlite: Option<PathBuf>,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SEED,
            inputs: TablePaths::inputs_in(Path::new(".")),
            outputs: TablePaths::outputs_in(Path::new(".")),
            sqlite: None,
        }
    }
}
