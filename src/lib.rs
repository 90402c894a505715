pub mod clean;
pub mod cli;
pub mod closure;
pub mod config;
pub mod download;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod sample;
pub mod schema;
pub mod sort;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::SubsetConfig;
pub use error::SubsetError;
pub use pipeline::{run_subset, Summary};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui};
