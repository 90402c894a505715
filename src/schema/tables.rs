//! Table schema definitions for the OpenFlights datasets

use super::types::*;

// =============================================================================
// Independent Tables (no hard dependencies)
// =============================================================================

pub static COUNTRIES: TableSchema = TableSchema {
    name: "countries",
    source_file: "countries.dat",
    output_file: "countries_small.dat",
    columns: &[
        Column::key("name", ColumnType::Text),
        Column::new("iso2", ColumnType::Text),
        Column::new("fips", ColumnType::Text),
    ],
    foreign_keys: &[],
    required: false,
};

pub static PLANES: TableSchema = TableSchema {
    name: "planes",
    source_file: "planes.dat",
    output_file: "planes_small.dat",
    columns: &[
        Column::new("name", ColumnType::Text),
        Column::new("iata", ColumnType::Text),
        Column::new("icao", ColumnType::Text),
    ],
    foreign_keys: &[],
    required: false,
};

// =============================================================================
// Dependent Tables
// =============================================================================

pub static AIRPORTS: TableSchema = TableSchema {
    name: "airports",
    source_file: "airports.dat",
    output_file: "airports_small.dat",
    columns: &[
        Column::key("id", ColumnType::Integer),
        Column::new("name", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("country", ColumnType::Text),
        Column::new("iata", ColumnType::Text),
        Column::new("icao", ColumnType::Text),
        Column::new("latitude", ColumnType::Real),
        Column::new("longitude", ColumnType::Real),
        Column::new("altitude", ColumnType::Integer),
        Column::new("timezone", ColumnType::Real),
        Column::new("dst", ColumnType::Text),
        Column::new("tz_database", ColumnType::Text),
        Column::new("airport_type", ColumnType::Text),
        Column::new("source", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::hard("country", "countries", &["name"])],
    required: true,
};

pub static AIRLINES: TableSchema = TableSchema {
    name: "airlines",
    source_file: "airlines.dat",
    output_file: "airlines_small.dat",
    columns: &[
        Column::key("id", ColumnType::Integer),
        Column::new("name", ColumnType::Text),
        Column::new("alias", ColumnType::Text),
        Column::new("iata", ColumnType::Text),
        Column::new("icao", ColumnType::Text),
        Column::new("callsign", ColumnType::Text),
        Column::new("country", ColumnType::Text),
        Column::new("active", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::hard("country", "countries", &["name"])],
    required: true,
};

pub static ROUTES: TableSchema = TableSchema {
    name: "routes",
    source_file: "routes.dat",
    output_file: "routes_small.dat",
    columns: &[
        Column::new("airline", ColumnType::Text),
        Column::key("airline_id", ColumnType::Integer),
        Column::new("source_airport", ColumnType::Text),
        Column::key("source_airport_id", ColumnType::Integer),
        Column::new("dest_airport", ColumnType::Text),
        Column::key("dest_airport_id", ColumnType::Integer),
        Column::new("codeshare", ColumnType::Text),
        Column::new("stops", ColumnType::Integer),
        Column::new("equipment", ColumnType::Text),
    ],
    foreign_keys: &[
        ForeignKey::hard("airline_id", "airlines", &["id"]),
        ForeignKey::hard("source_airport_id", "airports", &["id"]),
        ForeignKey::hard("dest_airport_id", "airports", &["id"]),
        ForeignKey::derived("equipment", "planes", &["iata", "icao"]),
    ],
    required: true,
};

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    // No dependencies
    &COUNTRIES,
    &PLANES,
    // Depend on countries
    &AIRPORTS,
    &AIRLINES,
    // Root table
    &ROUTES,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
