//! Derived-set extractors: the keys one table uses of another

use std::collections::{BTreeSet, HashSet};

use crate::model::{Airline, Airport, Plane, Route};

pub fn used_airport_ids(routes: &[Route]) -> HashSet<i64> {
    routes
        .iter()
        .flat_map(|r| [r.source_airport_id, r.dest_airport_id])
        .collect()
}

pub fn used_airline_ids(routes: &[Route]) -> HashSet<i64> {
    routes.iter().map(|r| r.airline_id).collect()
}

/// Union of the non-null country names across both tables
pub fn used_country_names(airports: &[Airport], airlines: &[Airline]) -> BTreeSet<String> {
    airports
        .iter()
        .filter_map(|a| a.country_name.as_ref())
        .chain(airlines.iter().filter_map(|a| a.country_name.as_ref()))
        .cloned()
        .collect()
}

/// Whitespace-split, trimmed, upper-cased equipment tokens of one route
pub fn equipment_tokens(route: &Route) -> impl Iterator<Item = String> + '_ {
    route
        .equipment
        .as_deref()
        .into_iter()
        .flat_map(str::split_whitespace)
        .map(|token| token.trim().to_uppercase())
        .filter(|token| !token.is_empty())
}

/// Equipment tokens of all routes
pub fn used_equipment_codes(routes: &[Route]) -> BTreeSet<String> {
    routes.iter().flat_map(equipment_tokens).collect()
}

/// Every IATA and ICAO code in the plane table
pub fn plane_codes(planes: &[Plane]) -> BTreeSet<String> {
    planes
        .iter()
        .flat_map(|p| [&p.iata_code, &p.icao_code])
        .flatten()
        .cloned()
        .collect()
}

/// Planes whose IATA or ICAO code is among `codes`
pub fn select_planes(planes: &[Plane], codes: &BTreeSet<String>) -> Vec<Plane> {
    let matches = |code: &Option<String>| code.as_ref().is_some_and(|c| codes.contains(c));

    planes
        .iter()
        .filter(|p| matches(&p.iata_code) || matches(&p.icao_code))
        .cloned()
        .collect()
}

/// Planes used by the given routes. Never narrows the routes themselves.
pub fn derive_planes(planes: &[Plane], routes: &[Route]) -> Vec<Plane> {
    select_planes(planes, &used_equipment_codes(routes))
}
