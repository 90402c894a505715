use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::SubsetError;
use crate::schema::TableSchema;

/// Literal token the OpenFlights files use for a missing value
pub const NULL_TOKEN: &str = "\\N";

/// A positional row; `None` is a null field
pub type Record = Vec<Option<String>>;

/// A table exactly as read from disk, before any coercion
#[derive(Debug, Clone)]
pub struct RawTable {
    pub schema: &'static TableSchema,
    pub records: Vec<Record>,
    /// Records skipped because their column count didn't match the schema
    pub malformed: usize,
}

impl RawTable {
    pub fn new(schema: &'static TableSchema, records: Vec<Record>) -> Self {
        Self {
            schema,
            records,
            malformed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a single field, mapping the null token and empty fields to `None`
pub fn parse_field(raw: &str) -> Option<String> {
    if raw.is_empty() || raw == NULL_TOKEN {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Parse an integer key, accepting integral float spellings such as `410.0`
pub fn parse_int_key(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(i);
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

/// Read a headerless delimited table from any reader
pub fn read_table<R: Read>(reader: R, schema: &'static TableSchema) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut malformed = 0;

    for result in rdr.records() {
        let row = result.map_err(|e| SubsetError::Malformed {
            table: schema.name,
            message: e.to_string(),
        })?;

        if row.len() != schema.width() {
            malformed += 1;
            continue;
        }

        records.push(row.iter().map(parse_field).collect());
    }

    Ok(RawTable {
        schema,
        records,
        malformed,
    })
}

/// Load a required table; a missing file is an error
pub fn load_table(path: &Path, schema: &'static TableSchema) -> Result<RawTable> {
    if !path.exists() {
        return Err(SubsetError::MissingInput {
            table: schema.name,
            path: path.to_path_buf(),
        }
        .into());
    }

    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    read_table(file, schema).with_context(|| format!("Failed to read {:?}", path))
}

/// Load an optional table; a missing file yields `None`
pub fn load_optional_table(path: &Path, schema: &'static TableSchema) -> Result<Option<RawTable>> {
    if !path.exists() {
        return Ok(None);
    }
    load_table(path, schema).map(Some)
}
