use std::collections::HashSet;

use crate::schema::{ColumnType, DependencyResolver, TableSchema};

/// Generate CREATE TABLE SQL for a table schema.
///
/// Only hard references to tables in `included` become FOREIGN KEY
/// constraints; a table with a single key column uses it as PRIMARY KEY.
pub fn generate_create_table(schema: &TableSchema, included: &HashSet<&str>) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);
    let mut columns = Vec::new();
    let single_key = schema.key_columns().count() == 1;

    for col in schema.columns {
        let sql_type = match col.col_type {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        };

        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let pk = if col.key && single_key { " PRIMARY KEY" } else { "" };

        columns.push(format!(
            "    {} {}{}{}",
            col.name, sql_type, pk, null_constraint
        ));
    }

    let resolver = DependencyResolver::new();
    for fk in resolver
        .active_foreign_keys(schema, included)
        .into_iter()
        .filter(|fk| fk.is_hard())
    {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column,
            fk.references_table,
            fk.references_columns.join(", ")
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for every referencing column
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| fk.column)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .map(|column| {
            format!(
                "CREATE INDEX idx_{}_{} ON {}({})",
                schema.name, column, schema.name, column
            )
        })
        .collect()
}
