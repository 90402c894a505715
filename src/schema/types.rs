use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    /// Key columns must coerce to a well-typed scalar or the row is dropped
    pub key: bool,
}

impl Column {
    /// Create an optional (nullable) passthrough column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            key: false,
        }
    }

    /// Create a key column (non-nullable, validated during coercion)
    pub const fn key(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            key: true,
        }
    }
}

/// How a relation constrains the rows on either side of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Filters in both directions: orphans on either side are removed
    Hard,
    /// Computed as a superset of matching rows, never filters the referencing table
    Derived,
}

impl ReferenceKind {
    pub fn is_hard(self) -> bool {
        self == ReferenceKind::Hard
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Hard => write!(f, "hard"),
            ReferenceKind::Derived => write!(f, "derived"),
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    /// A derived reference matches if any of these columns matches
    pub references_columns: &'static [&'static str],
    pub kind: ReferenceKind,
}

impl ForeignKey {
    pub const fn hard(
        column: &'static str,
        references_table: &'static str,
        references_columns: &'static [&'static str],
    ) -> Self {
        Self {
            column,
            references_table,
            references_columns,
            kind: ReferenceKind::Hard,
        }
    }

    pub const fn derived(
        column: &'static str,
        references_table: &'static str,
        references_columns: &'static [&'static str],
    ) -> Self {
        Self {
            column,
            references_table,
            references_columns,
            kind: ReferenceKind::Derived,
        }
    }

    pub fn is_hard(&self) -> bool {
        self.kind.is_hard()
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    /// Default input file name
    pub source_file: &'static str,
    /// Default output file name
    pub output_file: &'static str,
    /// Positional columns, in file order
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    /// Optional tables may be absent; their derivation step is skipped
    pub required: bool,
}

impl TableSchema {
    /// Tables this table depends on through hard references
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .filter(|fk| fk.is_hard())
            .map(|fk| fk.references_table)
            .collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn key_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns.iter().enumerate().filter(|(_, c)| c.key)
    }
}
