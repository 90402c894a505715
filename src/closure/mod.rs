//! Referential closure over the sampled routes and their dependent tables.
//!
//! Routes are the root table. The kind of each relation comes from the
//! table schemas (see [`Relations`]): hard references are narrowed together
//! until no table shrinks any further, derived ones only select what the
//! surviving rows use. With the stock schemas planes are derived from the
//! final route set and never feed back.

pub mod extract;
pub mod resolver;
pub mod verify;

pub use extract::*;
pub use resolver::*;
pub use verify::*;

use serde::Serialize;

use crate::model::{Airline, Airport, Country, Plane, Route};
use crate::schema::{ReferenceKind, TableSchema, AIRLINES, AIRPORTS, ROUTES};

/// How each relation between the tables behaves during resolution.
///
/// A hard relation narrows both sides: referencing rows whose target is
/// missing are dropped. A derived relation only selects the targets the
/// referencing rows use and never drops a referencing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relations {
    pub route_airline: ReferenceKind,
    pub route_airports: ReferenceKind,
    pub airport_country: ReferenceKind,
    pub airline_country: ReferenceKind,
    pub route_equipment: ReferenceKind,
}

impl Relations {
    /// Relation kinds as declared by the table schemas
    pub fn from_schemas() -> Self {
        Self {
            route_airline: kind_of(&ROUTES, "airlines"),
            route_airports: kind_of(&ROUTES, "airports"),
            airport_country: kind_of(&AIRPORTS, "countries"),
            airline_country: kind_of(&AIRLINES, "countries"),
            route_equipment: kind_of(&ROUTES, "planes"),
        }
    }
}

impl Default for Relations {
    fn default() -> Self {
        Self::from_schemas()
    }
}

/// Hard if any foreign key from `schema` to `table` is hard
fn kind_of(schema: &TableSchema, table: &str) -> ReferenceKind {
    let hard = schema
        .foreign_keys
        .iter()
        .any(|fk| fk.references_table == table && fk.is_hard());
    if hard {
        ReferenceKind::Hard
    } else {
        ReferenceKind::Derived
    }
}

/// Immutable state of the hard-referenced tables between passes
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub routes: Vec<Route>,
    pub airports: Vec<Airport>,
    pub airlines: Vec<Airline>,
    /// `None` when no country table was supplied
    pub countries: Option<Vec<Country>>,
}

impl Snapshot {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            routes: self.routes.len(),
            airports: self.airports.len(),
            airlines: self.airlines.len(),
            countries: self.countries.as_ref().map(Vec::len),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub routes: usize,
    pub airports: usize,
    pub airlines: usize,
    pub countries: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// Airline ids referenced by routes but absent from the airline table
    AirlineIds,
    /// Airport ids referenced by routes but absent from the airport table
    AirportIds,
    /// Country names used by airports/airlines but absent from the country table
    CountryNames,
}

/// A set of references that didn't resolve during one pass.
/// The referencing rows are dropped; the gap is only reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferentialGap {
    pub pass: usize,
    pub kind: GapKind,
    pub missing: usize,
}

impl std::fmt::Display for ReferentialGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            GapKind::AirlineIds => write!(
                f,
                "{} airline IDs in routes not found in airlines table",
                self.missing
            ),
            GapKind::AirportIds => write!(
                f,
                "{} airport IDs in routes not found in airports table",
                self.missing
            ),
            GapKind::CountryNames => write!(
                f,
                "{} country names from airports/airlines not found in countries table; \
                 related airports/airlines and routes will be dropped",
                self.missing
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub pass: usize,
    pub before: TableCounts,
    pub after: TableCounts,
    pub gaps: Vec<ReferentialGap>,
}

impl PassReport {
    pub fn is_stable(&self) -> bool {
        self.before == self.after
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClosureReport {
    pub passes: Vec<PassReport>,
}

impl ClosureReport {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn gaps(&self) -> impl Iterator<Item = &ReferentialGap> {
        self.passes.iter().flat_map(|p| p.gaps.iter())
    }
}

/// Mutually consistent output of the resolver
#[derive(Debug, Clone)]
pub struct Closure {
    pub tables: Snapshot,
    /// Derived from the final routes; `None` when no plane table was supplied
    pub planes: Option<Vec<Plane>>,
    pub relations: Relations,
    pub report: ClosureReport,
}
