use std::collections::{BTreeSet, HashSet};

use super::extract::{
    derive_planes, equipment_tokens, plane_codes, used_airline_ids, used_airport_ids,
    used_country_names,
};
use super::{Closure, ClosureReport, GapKind, PassReport, ReferentialGap, Relations, Snapshot};
use crate::model::{Airline, Airport, Country, Plane, Route};

/// Computes the referential closure of a route sample against the full
/// dependent tables.
pub struct Resolver<'a> {
    airports: &'a [Airport],
    airlines: &'a [Airline],
    countries: Option<&'a [Country]>,
    planes: Option<&'a [Plane]>,
    relations: Relations,
}

impl<'a> Resolver<'a> {
    pub fn new(airports: &'a [Airport], airlines: &'a [Airline]) -> Self {
        Self {
            airports,
            airlines,
            countries: None,
            planes: None,
            relations: Relations::from_schemas(),
        }
    }

    /// Supply the country table (referenced by airports and airlines)
    pub fn with_countries(self, countries: Option<&'a [Country]>) -> Self {
        Self { countries, ..self }
    }

    /// Supply the plane table (referenced by route equipment)
    pub fn with_planes(self, planes: Option<&'a [Plane]>) -> Self {
        Self { planes, ..self }
    }

    /// Override the relation kinds declared by the schemas
    pub fn with_relations(self, relations: Relations) -> Self {
        Self { relations, ..self }
    }

    /// Narrow until a pass leaves every table the same size.
    ///
    /// Each pass only ever removes rows, so equal counts mean equal tables
    /// and the loop ends after at most `routes.len() + 2` passes.
    pub fn resolve(&self, routes: Vec<Route>) -> Closure {
        let mut current = Snapshot {
            routes,
            airports: self.airports.to_vec(),
            airlines: self.airlines.to_vec(),
            countries: self.countries.map(<[Country]>::to_vec),
        };
        let mut passes = Vec::new();

        loop {
            let (next, report) =
                narrow_pass(&current, passes.len() + 1, &self.relations, self.planes);
            let stable = report.is_stable();
            passes.push(report);
            current = next;
            if stable {
                break;
            }
        }

        let planes = self.planes.map(|planes| derive_planes(planes, &current.routes));

        Closure {
            tables: current,
            planes,
            relations: self.relations,
            report: ClosureReport { passes },
        }
    }
}

/// One narrowing pass. Pure: the input snapshot is left untouched.
///
/// Route references select airports and airlines first; the country
/// relations then apply to what's left, and finally routes are narrowed
/// along their hard relations. `planes` only matters when the equipment
/// relation is hard.
pub fn narrow_pass(
    snapshot: &Snapshot,
    pass: usize,
    relations: &Relations,
    planes: Option<&[Plane]>,
) -> (Snapshot, PassReport) {
    let mut gaps = Vec::new();
    let mut gap = |kind: GapKind, count: usize| {
        if count > 0 {
            gaps.push(ReferentialGap {
                pass,
                kind,
                missing: count,
            });
        }
    };

    // Airports and airlines used by the current routes
    let used_airports = used_airport_ids(&snapshot.routes);
    let used_airlines = used_airline_ids(&snapshot.routes);

    let airports: Vec<Airport> = snapshot
        .airports
        .iter()
        .filter(|a| used_airports.contains(&a.id))
        .cloned()
        .collect();
    let airlines: Vec<Airline> = snapshot
        .airlines
        .iter()
        .filter(|a| used_airlines.contains(&a.id))
        .cloned()
        .collect();

    gap(GapKind::AirportIds, missing(&used_airports, airports.iter().map(|a| a.id)));
    gap(GapKind::AirlineIds, missing(&used_airlines, airlines.iter().map(|a| a.id)));

    // Country relations on the narrowed airports and airlines
    let (airports, airlines, countries) = match &snapshot.countries {
        Some(all_countries) => {
            let used_names = used_country_names(&airports, &airlines);
            let countries: Vec<Country> = all_countries
                .iter()
                .filter(|c| used_names.contains(&c.name))
                .cloned()
                .collect();

            let (airports, airlines) = {
                let valid: HashSet<&str> = countries.iter().map(|c| c.name.as_str()).collect();
                gap(
                    GapKind::CountryNames,
                    used_names.iter().filter(|n| !valid.contains(n.as_str())).count(),
                );

                let in_valid =
                    |name: &Option<String>| name.as_deref().is_some_and(|n| valid.contains(n));
                let airports: Vec<Airport> = if relations.airport_country.is_hard() {
                    airports
                        .into_iter()
                        .filter(|a| in_valid(&a.country_name))
                        .collect()
                } else {
                    airports
                };
                let airlines: Vec<Airline> = if relations.airline_country.is_hard() {
                    airlines
                        .into_iter()
                        .filter(|a| in_valid(&a.country_name))
                        .collect()
                } else {
                    airlines
                };
                (airports, airlines)
            };

            (airports, airlines, Some(countries))
        }
        None => (airports, airlines, None),
    };

    // Routes whose every hard reference survived
    let valid_airports: HashSet<i64> = airports.iter().map(|a| a.id).collect();
    let valid_airlines: HashSet<i64> = airlines.iter().map(|a| a.id).collect();
    let valid_codes: Option<BTreeSet<String>> = planes
        .filter(|_| relations.route_equipment.is_hard())
        .map(plane_codes);

    let routes: Vec<Route> = snapshot
        .routes
        .iter()
        .filter(|r| {
            (!relations.route_airline.is_hard() || valid_airlines.contains(&r.airline_id))
                && (!relations.route_airports.is_hard()
                    || (valid_airports.contains(&r.source_airport_id)
                        && valid_airports.contains(&r.dest_airport_id)))
                && valid_codes
                    .as_ref()
                    .map_or(true, |codes| equipment_tokens(r).any(|t| codes.contains(&t)))
        })
        .cloned()
        .collect();

    let next = Snapshot {
        routes,
        airports,
        airlines,
        countries,
    };
    let report = PassReport {
        pass,
        before: snapshot.counts(),
        after: next.counts(),
        gaps,
    };

    (next, report)
}

fn missing(used: &HashSet<i64>, present: impl Iterator<Item = i64>) -> usize {
    let present: HashSet<i64> = present.collect();
    used.difference(&present).count()
}
