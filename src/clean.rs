//! Type coercion and row validation.
//!
//! Key columns are normalized to a canonical form (integer ids, trimmed
//! names). Rows whose keys can't be coerced are dropped and counted, never
//! reported as errors. Duplicate primary keys collapse to the first row seen.

use serde::Serialize;
use std::collections::HashSet;

use crate::model::Row;
use crate::parser::{parse_int_key, RawTable, Record};
use crate::schema::{ColumnType, TableSchema};

/// Result of coercing one raw table
#[derive(Debug, Clone)]
pub struct Cleaned<T> {
    pub rows: Vec<T>,
    pub stats: CleanStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    /// Records read from the source
    pub loaded: usize,
    /// Records with the wrong column count
    pub malformed: usize,
    /// Records dropped because a key column was null or unparseable
    pub coercion_failures: usize,
    /// Records dropped because their primary key was already seen
    pub duplicates: usize,
}

/// Canonicalize the key columns of a record, or `None` if any can't be coerced
pub fn normalize_keys(record: &Record, schema: &TableSchema) -> Option<Record> {
    let mut out = record.clone();

    for (idx, column) in schema.key_columns() {
        let raw = record.get(idx)?.as_deref()?;
        let canonical = match column.col_type {
            ColumnType::Integer => parse_int_key(raw)?.to_string(),
            ColumnType::Text | ColumnType::Real => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.to_string()
            }
        };
        out[idx] = Some(canonical);
    }

    Some(out)
}

/// Coerce a raw table into typed rows. The input is left untouched.
pub fn coerce<T: Row>(raw: &RawTable) -> Cleaned<T> {
    let mut stats = CleanStats {
        loaded: raw.records.len() + raw.malformed,
        malformed: raw.malformed,
        ..Default::default()
    };
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(raw.records.len());

    for record in &raw.records {
        let row = match normalize_keys(record, T::SCHEMA).and_then(T::from_record) {
            Some(row) => row,
            None => {
                stats.coercion_failures += 1;
                continue;
            }
        };

        if let Some(key) = row.identity() {
            if !seen.insert(key) {
                stats.duplicates += 1;
                continue;
            }
        }

        rows.push(row);
    }

    Cleaned { rows, stats }
}
