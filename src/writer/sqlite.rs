use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;

use super::schema_gen::{generate_create_table, generate_indexes};
use crate::parser::Record;
use crate::schema::{ColumnType, DependencyResolver, TableSchema};
use crate::ui::Ui;

/// A field ready for binding
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Typed value for a passthrough field; unparseable numbers stay text
    pub fn from_field(field: Option<&str>, col_type: ColumnType) -> Self {
        let Some(raw) = field else {
            return SqlValue::Null;
        };

        match col_type {
            ColumnType::Integer => raw
                .trim()
                .parse()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(raw.to_string())),
            ColumnType::Real => raw
                .trim()
                .parse()
                .map(SqlValue::Real)
                .unwrap_or_else(|_| SqlValue::Text(raw.to_string())),
            ColumnType::Text => SqlValue::Text(raw.to_string()),
        }
    }

    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn new(db_path: &Path) -> Result<Self> {
        // Remove existing database if present
        if db_path.exists() {
            std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        }

        let conn = Connection::open(db_path).context("Failed to create database")?;

        // Every hard reference is enforced on insert
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )?;

        Ok(Self { conn })
    }

    /// Create all tables for the given schemas, in the given order
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        let included: HashSet<&str> = schemas.iter().map(|s| s.name).collect();

        for schema in schemas {
            let sql = generate_create_table(schema, &included);
            self.conn
                .execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn
                    .execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(())
    }

    /// Insert all records of one table in a single transaction
    pub fn insert_table(&mut self, schema: &TableSchema, records: &[Record]) -> Result<u64> {
        let columns: Vec<&str> = schema.columns.iter().map(|c| c.name).collect();
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.name,
            columns.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&insert_sql)?;
            for record in records {
                for (idx, col) in schema.columns.iter().enumerate() {
                    let field = record.get(idx).and_then(|f| f.as_deref());
                    SqlValue::from_field(field, col.col_type).bind_to(idx + 1, &mut stmt)?;
                }
                stmt.raw_execute()
                    .with_context(|| format!("Failed to insert into {}", schema.name))?;
            }
        }
        tx.commit()?;

        Ok(records.len() as u64)
    }

    /// Confirm no row violates a foreign key, then optimize
    pub fn finalize(self) -> Result<()> {
        let violations: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| row.get(0))?;
        if violations > 0 {
            bail!("{} rows violate foreign key constraints", violations);
        }

        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// Write the given tables into a fresh SQLite database, parents first
pub fn export_sqlite(
    output_db: &Path,
    tables: &[(&'static TableSchema, Vec<Record>)],
    ui: &mut impl Ui,
) -> Result<u64> {
    let names: Vec<&str> = tables.iter().map(|(schema, _)| schema.name).collect();
    let ordered = DependencyResolver::new().order(&names)?;

    let mut writer = SqliteWriter::new(output_db)?;
    writer.create_tables(&ordered)?;

    let mut total_records: u64 = 0;
    for schema in &ordered {
        let Some((_, records)) = tables.iter().find(|(s, _)| s.name == schema.name) else {
            continue;
        };
        let count = writer.insert_table(schema, records)?;
        ui.log(format!("{}: {} records", schema.name, count));
        total_records += count;
    }

    writer.finalize()?;

    Ok(total_records)
}
