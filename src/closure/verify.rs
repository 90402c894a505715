//! Checks that a closure satisfies the referential invariants in both directions

use std::collections::{BTreeSet, HashSet};

use super::extract::{
    equipment_tokens, plane_codes, used_airline_ids, used_airport_ids, used_country_names,
    used_equipment_codes,
};
use super::Closure;
use crate::model::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A route references an airline that isn't in the output
    DanglingAirline(i64),
    /// An output airline no route references
    OrphanAirline(i64),
    DanglingAirport(i64),
    OrphanAirport(i64),
    /// An airport or airline country that isn't in the output countries
    DanglingCountry(Option<String>),
    OrphanCountry(String),
    /// An output plane none of the route equipment codes match
    UnmatchedPlane(Option<String>),
    /// A route none of whose equipment codes names an output plane
    RouteWithoutPlane {
        airline_id: i64,
        source_airport_id: i64,
        dest_airport_id: i64,
    },
    DuplicateKey { table: &'static str, key: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::DanglingAirline(id) => write!(f, "route references missing airline {}", id),
            Violation::OrphanAirline(id) => write!(f, "airline {} is not used by any route", id),
            Violation::DanglingAirport(id) => write!(f, "route references missing airport {}", id),
            Violation::OrphanAirport(id) => write!(f, "airport {} is not used by any route", id),
            Violation::DanglingCountry(Some(name)) => write!(f, "country {:?} is missing", name),
            Violation::DanglingCountry(None) => write!(f, "airport or airline has no country"),
            Violation::OrphanCountry(name) => write!(f, "country {:?} is not used", name),
            Violation::UnmatchedPlane(name) => {
                write!(f, "plane {:?} matches no route equipment", name)
            }
            Violation::RouteWithoutPlane {
                airline_id,
                source_airport_id,
                dest_airport_id,
            } => write!(
                f,
                "route {}:{}->{} uses no known plane",
                airline_id, source_airport_id, dest_airport_id
            ),
            Violation::DuplicateKey { table, key } => {
                write!(f, "duplicate key {} in {}", key, table)
            }
        }
    }
}

/// Every violated invariant; empty when the closure is consistent.
///
/// Targets must always be used by some referencing row. Referencing rows
/// must resolve only along hard relations.
pub fn verify(closure: &Closure) -> Vec<Violation> {
    let tables = &closure.tables;
    let relations = &closure.relations;
    let mut violations = Vec::new();

    let route_airlines = used_airline_ids(&tables.routes);
    let route_airports = used_airport_ids(&tables.routes);
    let airline_ids: HashSet<i64> = tables.airlines.iter().map(|a| a.id).collect();
    let airport_ids: HashSet<i64> = tables.airports.iter().map(|a| a.id).collect();

    if relations.route_airline.is_hard() {
        violations.extend(sorted(route_airlines.difference(&airline_ids)).map(Violation::DanglingAirline));
    }
    violations.extend(sorted(airline_ids.difference(&route_airlines)).map(Violation::OrphanAirline));
    if relations.route_airports.is_hard() {
        violations.extend(sorted(route_airports.difference(&airport_ids)).map(Violation::DanglingAirport));
    }
    violations.extend(sorted(airport_ids.difference(&route_airports)).map(Violation::OrphanAirport));

    duplicates(&tables.airports, &mut violations);
    duplicates(&tables.airlines, &mut violations);

    if let Some(countries) = &tables.countries {
        let names: BTreeSet<&str> = countries.iter().map(|c| c.name.as_str()).collect();
        let used = used_country_names(&tables.airports, &tables.airlines);

        let referenced = tables
            .airports
            .iter()
            .filter(|_| relations.airport_country.is_hard())
            .map(|a| &a.country_name)
            .chain(
                tables
                    .airlines
                    .iter()
                    .filter(|_| relations.airline_country.is_hard())
                    .map(|a| &a.country_name),
            );
        let dangling: BTreeSet<Option<String>> = referenced
            .filter(|name| !name.as_deref().is_some_and(|n| names.contains(n)))
            .cloned()
            .collect();
        violations.extend(dangling.into_iter().map(Violation::DanglingCountry));

        violations.extend(
            names
                .iter()
                .filter(|n| !used.contains(**n))
                .map(|n| Violation::OrphanCountry(n.to_string())),
        );
        duplicates(countries, &mut violations);
    }

    if let Some(planes) = &closure.planes {
        let codes = used_equipment_codes(&tables.routes);
        let matches = |code: &Option<String>| code.as_ref().is_some_and(|c| codes.contains(c));
        violations.extend(
            planes
                .iter()
                .filter(|p| !matches(&p.iata_code) && !matches(&p.icao_code))
                .map(|p| Violation::UnmatchedPlane(p.name.clone())),
        );

        if relations.route_equipment.is_hard() {
            let known = plane_codes(planes);
            violations.extend(
                tables
                    .routes
                    .iter()
                    .filter(|r| !equipment_tokens(r).any(|t| known.contains(&t)))
                    .map(|r| Violation::RouteWithoutPlane {
                        airline_id: r.airline_id,
                        source_airport_id: r.source_airport_id,
                        dest_airport_id: r.dest_airport_id,
                    }),
            );
        }
        duplicates(planes, &mut violations);
    }

    violations
}

fn sorted<'a>(ids: impl Iterator<Item = &'a i64>) -> impl Iterator<Item = i64> {
    ids.copied().collect::<BTreeSet<_>>().into_iter()
}

fn duplicates<T: Row>(rows: &[T], violations: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for key in rows.iter().filter_map(Row::identity) {
        if !seen.insert(key.clone()) {
            violations.push(Violation::DuplicateKey {
                table: T::SCHEMA.name,
                key: format!("{:?}", key),
            });
        }
    }
}
