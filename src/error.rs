//! Error types for the subset engine

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubsetError {
    /// A negative number of routes was requested
    #[error("Invalid sample size {0}: must be zero or greater")]
    InvalidSampleSize(i64),

    /// A required input file is absent
    #[error("Required input for {table} not found: {path:?}")]
    MissingInput { table: &'static str, path: PathBuf },

    /// An input file is not valid delimited text
    #[error("Malformed {table} input: {message}")]
    Malformed { table: &'static str, message: String },

    /// The resolved tables are not mutually consistent
    #[error("Referential invariants violated: {}", .0.join("; "))]
    InvariantViolation(Vec<String>),

    #[error("Circular dependency detected at: {0}")]
    CircularDependency(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

pub type Result<T> = std::result::Result<T, SubsetError>;
