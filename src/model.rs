//! Typed rows for the five OpenFlights tables.
//!
//! Key columns are well-typed; every other column is an opaque passthrough
//! string that is written back out unchanged.

use crate::parser::{parse_int_key, Record};
use crate::schema::{TableSchema, AIRLINES, AIRPORTS, COUNTRIES, PLANES, ROUTES};

/// Primary identity of a row, used to collapse duplicate keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Int(i64),
    Text(String),
    Pair(Option<String>, Option<String>),
}

/// A typed row that can be built from and written back to a positional record
pub trait Row: Clone + Sized {
    const SCHEMA: &'static TableSchema;

    /// Build from a record whose key columns are already canonical.
    /// Returns `None` if the record doesn't fit the table.
    fn from_record(record: Record) -> Option<Self>;

    fn to_record(&self) -> Record;

    /// `None` for tables without a primary key (routes)
    fn identity(&self) -> Option<RowKey>;
}

/// Trim a linking field; blank becomes null
pub fn link_text(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn int_field(field: &Option<String>) -> Option<i64> {
    field.as_deref().and_then(parse_int_key)
}

fn fields<const N: usize>(record: Record) -> Option<[Option<String>; N]> {
    record.try_into().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub airline_code: Option<String>,
    pub airline_id: i64,
    pub source_airport_code: Option<String>,
    pub source_airport_id: i64,
    pub dest_airport_code: Option<String>,
    pub dest_airport_id: i64,
    pub codeshare: Option<String>,
    pub stops: Option<String>,
    pub equipment: Option<String>,
}

impl Row for Route {
    const SCHEMA: &'static TableSchema = &ROUTES;

    fn from_record(record: Record) -> Option<Self> {
        let [airline, airline_id, source, source_id, dest, dest_id, codeshare, stops, equipment] =
            fields(record)?;

        Some(Self {
            airline_id: int_field(&airline_id)?,
            source_airport_id: int_field(&source_id)?,
            dest_airport_id: int_field(&dest_id)?,
            airline_code: link_text(airline),
            source_airport_code: link_text(source),
            dest_airport_code: link_text(dest),
            codeshare,
            stops,
            equipment,
        })
    }

    fn to_record(&self) -> Record {
        vec![
            self.airline_code.clone(),
            Some(self.airline_id.to_string()),
            self.source_airport_code.clone(),
            Some(self.source_airport_id.to_string()),
            self.dest_airport_code.clone(),
            Some(self.dest_airport_id.to_string()),
            self.codeshare.clone(),
            self.stops.clone(),
            self.equipment.clone(),
        ]
    }

    fn identity(&self) -> Option<RowKey> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Airport {
    pub id: i64,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country_name: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub altitude: Option<String>,
    pub timezone: Option<String>,
    pub dst: Option<String>,
    pub tz_database: Option<String>,
    pub airport_type: Option<String>,
    pub source: Option<String>,
}

impl Row for Airport {
    const SCHEMA: &'static TableSchema = &AIRPORTS;

    fn from_record(record: Record) -> Option<Self> {
        let [id, name, city, country, iata, icao, latitude, longitude, altitude, timezone, dst, tz_database, airport_type, source] =
            fields(record)?;

        Some(Self {
            id: int_field(&id)?,
            name,
            city,
            country_name: link_text(country),
            iata,
            icao,
            latitude,
            longitude,
            altitude,
            timezone,
            dst,
            tz_database,
            airport_type,
            source,
        })
    }

    fn to_record(&self) -> Record {
        vec![
            Some(self.id.to_string()),
            self.name.clone(),
            self.city.clone(),
            self.country_name.clone(),
            self.iata.clone(),
            self.icao.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.altitude.clone(),
            self.timezone.clone(),
            self.dst.clone(),
            self.tz_database.clone(),
            self.airport_type.clone(),
            self.source.clone(),
        ]
    }

    fn identity(&self) -> Option<RowKey> {
        Some(RowKey::Int(self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Airline {
    pub id: i64,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub callsign: Option<String>,
    pub country_name: Option<String>,
    pub active: Option<String>,
}

impl Row for Airline {
    const SCHEMA: &'static TableSchema = &AIRLINES;

    fn from_record(record: Record) -> Option<Self> {
        let [id, name, alias, iata, icao, callsign, country, active] = fields(record)?;

        Some(Self {
            id: int_field(&id)?,
            name,
            alias,
            iata,
            icao,
            callsign,
            country_name: link_text(country),
            active,
        })
    }

    fn to_record(&self) -> Record {
        vec![
            Some(self.id.to_string()),
            self.name.clone(),
            self.alias.clone(),
            self.iata.clone(),
            self.icao.clone(),
            self.callsign.clone(),
            self.country_name.clone(),
            self.active.clone(),
        ]
    }

    fn identity(&self) -> Option<RowKey> {
        Some(RowKey::Int(self.id))
    }
}

/// Aircraft model; matched against route equipment by either code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Plane {
    pub name: Option<String>,
    pub iata_code: Option<String>,
    pub icao_code: Option<String>,
}

impl Row for Plane {
    const SCHEMA: &'static TableSchema = &PLANES;

    fn from_record(record: Record) -> Option<Self> {
        let [name, iata, icao] = fields(record)?;

        Some(Self {
            name,
            iata_code: link_text(iata),
            icao_code: link_text(icao),
        })
    }

    fn to_record(&self) -> Record {
        vec![
            self.name.clone(),
            self.iata_code.clone(),
            self.icao_code.clone(),
        ]
    }

    fn identity(&self) -> Option<RowKey> {
        Some(RowKey::Pair(self.iata_code.clone(), self.icao_code.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Country {
    pub name: String,
    pub iso2: Option<String>,
    pub fips: Option<String>,
}

impl Row for Country {
    const SCHEMA: &'static TableSchema = &COUNTRIES;

    fn from_record(record: Record) -> Option<Self> {
        let [name, iso2, fips] = fields(record)?;

        Some(Self {
            name: link_text(name)?,
            iso2,
            fips,
        })
    }

    fn to_record(&self) -> Record {
        vec![Some(self.name.clone()), self.iso2.clone(), self.fips.clone()]
    }

    fn identity(&self) -> Option<RowKey> {
        Some(RowKey::Text(self.name.clone()))
    }
}
