//! End-to-end subset run: load, clean, sample, resolve, sort, write.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::clean::{coerce, CleanStats, Cleaned};
use crate::closure::{used_equipment_codes, verify, ClosureReport, ReferentialGap, Resolver};
use crate::config::{SubsetConfig, TablePaths};
use crate::error::SubsetError;
use crate::model::{Airline, Airport, Country, Plane, Route, Row};
use crate::parser::{load_optional_table, load_table};
use crate::sample::sample;
use crate::sort::{sort_airlines, sort_airports, sort_countries, sort_planes, sort_routes};
use crate::ui::{Phase, Ui};
use crate::writer::{export_sqlite, stage_files, PendingFile};

/// Coerced input tables. Planes and countries are `None` when their file is absent.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub routes: Vec<Route>,
    pub airports: Vec<Airport>,
    pub airlines: Vec<Airline>,
    pub planes: Option<Vec<Plane>>,
    pub countries: Option<Vec<Country>>,
    pub stats: Vec<(&'static str, CleanStats)>,
}

/// Sorted, mutually consistent output tables
#[derive(Debug, Clone)]
pub struct Subset {
    pub routes: Vec<Route>,
    pub airports: Vec<Airport>,
    pub airlines: Vec<Airline>,
    pub planes: Option<Vec<Plane>>,
    pub countries: Option<Vec<Country>>,
    pub sampled: usize,
    /// Distinct equipment codes in the output routes, when planes were derived
    pub equipment_codes: Option<usize>,
    pub report: ClosureReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: &'static str,
    pub input: CleanStats,
    pub output_rows: Option<usize>,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub seed: u64,
    pub requested_routes: i64,
    pub sampled_routes: usize,
    pub passes: usize,
    pub gaps: Vec<ReferentialGap>,
    pub tables: Vec<TableSummary>,
    pub equipment_codes: Option<usize>,
    pub sqlite_records: Option<u64>,
}

fn load<T: Row>(path: &Path, ui: &mut impl Ui) -> Result<Cleaned<T>> {
    let raw = load_table(path, T::SCHEMA)?;
    ui.log(format!("{}: {} rows", T::SCHEMA.name, raw.len()));
    Ok(coerce(&raw))
}

fn load_optional<T: Row>(path: &Path, ui: &mut impl Ui) -> Result<Option<Cleaned<T>>> {
    match load_optional_table(path, T::SCHEMA)? {
        Some(raw) => {
            ui.log(format!("{}: {} rows", T::SCHEMA.name, raw.len()));
            Ok(Some(coerce(&raw)))
        }
        None => {
            ui.log(format!(
                "Note: {:?} not found, will skip {} generation",
                path,
                T::SCHEMA.output_file
            ));
            Ok(None)
        }
    }
}

/// Load and coerce all five tables
pub fn load_dataset(inputs: &TablePaths, ui: &mut impl Ui) -> Result<Dataset> {
    ui.set_phase(Phase::Loading);

    let routes: Cleaned<Route> = load(&inputs.routes, ui)?;
    let airports: Cleaned<Airport> = load(&inputs.airports, ui)?;
    let airlines: Cleaned<Airline> = load(&inputs.airlines, ui)?;
    let planes: Option<Cleaned<Plane>> = load_optional(&inputs.planes, ui)?;
    let countries: Option<Cleaned<Country>> = load_optional(&inputs.countries, ui)?;

    ui.set_phase(Phase::Cleaning);
    let mut stats = vec![
        (Route::SCHEMA.name, routes.stats.clone()),
        (Airport::SCHEMA.name, airports.stats.clone()),
        (Airline::SCHEMA.name, airlines.stats.clone()),
    ];
    stats.extend(planes.as_ref().map(|p| (Plane::SCHEMA.name, p.stats.clone())));
    stats.extend(countries.as_ref().map(|c| (Country::SCHEMA.name, c.stats.clone())));

    for (name, s) in &stats {
        let dropped = s.malformed + s.coercion_failures + s.duplicates;
        ui.set_info(format!(
            "{} after cleaning: {} ({} dropped)",
            name,
            s.loaded - dropped,
            dropped
        ));
    }

    Ok(Dataset {
        routes: routes.rows,
        airports: airports.rows,
        airlines: airlines.rows,
        planes: planes.map(|p| p.rows),
        countries: countries.map(|c| c.rows),
        stats,
    })
}

/// Sample routes and compute their sorted referential closure
pub fn build_subset(
    dataset: &Dataset,
    sample_size: i64,
    seed: u64,
    ui: &mut impl Ui,
) -> std::result::Result<Subset, SubsetError> {
    ui.set_phase(Phase::Sampling);
    let sampled = sample(&dataset.routes, sample_size, seed)?;
    ui.log(format!("Sampled {} routes (seed {})", sampled.len(), seed));

    ui.set_phase(Phase::Resolving);
    let closure = Resolver::new(&dataset.airports, &dataset.airlines)
        .with_countries(dataset.countries.as_deref())
        .with_planes(dataset.planes.as_deref())
        .resolve(sampled.clone());

    for gap in closure.report.gaps() {
        ui.warn(format!("WARNING (pass {}): {}", gap.pass, gap));
    }
    ui.log(format!(
        "Closure stable after {} passes",
        closure.report.pass_count()
    ));

    let violations = verify(&closure);
    if !violations.is_empty() {
        return Err(SubsetError::InvariantViolation(
            violations.iter().map(ToString::to_string).collect(),
        ));
    }

    let equipment_codes = closure
        .planes
        .as_ref()
        .map(|_| used_equipment_codes(&closure.tables.routes).len());
    let tables = closure.tables;

    Ok(Subset {
        routes: sort_routes(tables.routes),
        airports: sort_airports(tables.airports),
        airlines: sort_airlines(tables.airlines),
        planes: closure.planes.map(sort_planes),
        countries: tables.countries.map(sort_countries),
        sampled: sampled.len(),
        equipment_codes,
        report: closure.report,
    })
}

/// Serialize every output table in memory. Nothing touches disk here.
pub fn render_outputs(subset: &Subset, outputs: &TablePaths) -> Result<Vec<PendingFile>> {
    let mut files = vec![
        PendingFile::new(&outputs.routes, &subset.routes)?,
        PendingFile::new(&outputs.airports, &subset.airports)?,
        PendingFile::new(&outputs.airlines, &subset.airlines)?,
    ];
    if let Some(planes) = &subset.planes {
        files.push(PendingFile::new(&outputs.planes, planes)?);
    }
    if let Some(countries) = &subset.countries {
        files.push(PendingFile::new(&outputs.countries, countries)?);
    }
    Ok(files)
}

/// Outputs of skipped optional tables left over from an earlier run
pub fn stale_outputs(subset: &Subset, outputs: &TablePaths) -> Vec<PathBuf> {
    let mut stale = Vec::new();
    if subset.planes.is_none() {
        stale.push(outputs.planes.clone());
    }
    if subset.countries.is_none() {
        stale.push(outputs.countries.clone());
    }
    stale.retain(|p| p.is_file());
    stale
}

/// Run the whole pipeline for one configuration.
///
/// Outputs are staged, the optional SQLite export runs, and only then are
/// the `.dat` files moved into place.
pub fn run_subset(config: &SubsetConfig, ui: &mut impl Ui) -> Result<Summary> {
    let dataset = load_dataset(&config.inputs, ui)?;
    let subset = build_subset(&dataset, config.sample_size, config.seed, ui)?;

    ui.set_phase(Phase::Writing);
    let files = render_outputs(&subset, &config.outputs)?;
    let staged = stage_files(&files)?;

    let sqlite_records = match &config.sqlite {
        Some(db_path) => {
            let tables: Vec<_> = files
                .iter()
                .map(|f| (f.schema, f.records.clone()))
                .collect();
            let count = export_sqlite(db_path, &tables, ui)
                .with_context(|| format!("Failed to export SQLite database {:?}", db_path))?;
            ui.log(format!("Created {:?} ({} records)", db_path, count));
            Some(count)
        }
        None => None,
    };

    staged.commit()?;
    for file in &files {
        ui.log(format!("{}: {} rows -> {:?}", file.schema.name, file.rows(), file.path));
    }
    for path in stale_outputs(&subset, &config.outputs) {
        fs::remove_file(&path).with_context(|| format!("Failed to remove stale {:?}", path))?;
        ui.log(format!("Removed stale {:?} (no matching input)", path));
    }

    let tables = dataset
        .stats
        .iter()
        .map(|(name, stats)| {
            let name = *name;
            let file = files.iter().find(|f| f.schema.name == name);
            TableSummary {
                name,
                input: stats.clone(),
                output_rows: file.map(PendingFile::rows),
                output_path: file.map(|f| f.path.clone()),
            }
        })
        .collect();

    ui.set_phase(Phase::Complete);

    Ok(Summary {
        seed: config.seed,
        requested_routes: config.sample_size,
        sampled_routes: subset.sampled,
        passes: subset.report.pass_count(),
        gaps: subset.report.gaps().cloned().collect(),
        tables,
        equipment_codes: subset.equipment_codes,
        sqlite_records,
    })
}
