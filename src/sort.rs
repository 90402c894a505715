//! Fixed output ordering so identical runs produce byte-identical files.
//!
//! - routes: airline id, source id, dest id, then the raw codes, then the
//!   remaining fields as a final tiebreak
//! - airports, airlines: id
//! - planes: iata, icao, name
//! - countries: name

use crate::model::{Airline, Airport, Country, Plane, Route};

pub fn sort_routes(mut routes: Vec<Route>) -> Vec<Route> {
    routes.sort_by(|a, b| {
        (a.airline_id, a.source_airport_id, a.dest_airport_id)
            .cmp(&(b.airline_id, b.source_airport_id, b.dest_airport_id))
            .then_with(|| {
                (&a.airline_code, &a.source_airport_code, &a.dest_airport_code).cmp(&(
                    &b.airline_code,
                    &b.source_airport_code,
                    &b.dest_airport_code,
                ))
            })
            .then_with(|| {
                (&a.codeshare, &a.stops, &a.equipment).cmp(&(&b.codeshare, &b.stops, &b.equipment))
            })
    });
    routes
}

pub fn sort_airports(mut airports: Vec<Airport>) -> Vec<Airport> {
    airports.sort_by_key(|a| a.id);
    airports
}

pub fn sort_airlines(mut airlines: Vec<Airline>) -> Vec<Airline> {
    airlines.sort_by_key(|a| a.id);
    airlines
}

pub fn sort_planes(mut planes: Vec<Plane>) -> Vec<Plane> {
    planes.sort_by(|a, b| {
        (&a.iata_code, &a.icao_code, &a.name).cmp(&(&b.iata_code, &b.icao_code, &b.name))
    });
    planes
}

pub fn sort_countries(mut countries: Vec<Country>) -> Vec<Country> {
    countries.sort_by(|a, b| a.name.cmp(&b.name));
    countries
}
