//! End-to-end tests: write `.dat` fixtures into a temp directory, run the
//! subset pipeline, read the outputs back and check them.
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use openflights_subset::clean::coerce;
use openflights_subset::closure::{used_equipment_codes, GapKind};
use openflights_subset::config::{SubsetConfig, TablePaths};
use openflights_subset::model::{Airline, Airport, Country, Plane, Route, Row};
use openflights_subset::parser::load_table;
use openflights_subset::ui::{Phase, SilentUi, Ui};
use openflights_subset::{run_subset, SubsetError};

// =============================================================================
// Test Configuration
// =============================================================================

/// Seed for generating the shared random dataset
const DATASET_SEED: u64 = 7;

/// Sample seeds checked against the shared dataset
const SAMPLE_SEEDS: &[u64] = &[1, 2, 3, 42, 1234];

// =============================================================================
// Fixtures
// =============================================================================

/// Raw text of the five input files
#[derive(Clone, Default)]
struct Fixture {
    routes: String,
    airports: String,
    airlines: String,
    planes: Option<String>,
    countries: Option<String>,
}

impl Fixture {
    /// Write the fixture into a fresh directory, returning it with a config
    /// whose outputs go to `<dir>/out`
    fn install(&self) -> (TempDir, SubsetConfig) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let inputs = TablePaths::inputs_in(dir.path());

        fs::write(&inputs.routes, &self.routes).unwrap();
        fs::write(&inputs.airports, &self.airports).unwrap();
        fs::write(&inputs.airlines, &self.airlines).unwrap();
        if let Some(planes) = &self.planes {
            fs::write(&inputs.planes, planes).unwrap();
        }
        if let Some(countries) = &self.countries {
            fs::write(&inputs.countries, countries).unwrap();
        }

        let config = SubsetConfig {
            inputs,
            outputs: TablePaths::outputs_in(&dir.path().join("out")),
            ..SubsetConfig::default()
        };
        (dir, config)
    }
}

fn airport_line(id: &str, country: &str) -> String {
    format!(
        "{id},\"Airport {id}\",\"City {id}\",{country},\\N,\\N,-6.08,145.39,5282,10,\"U\",\"Pacific/Port_Moresby\",\"airport\",\"OurAirports\"\n"
    )
}

fn airline_line(id: &str, country: &str) -> String {
    format!("{id},\"Airline {id}\",\\N,\\N,\\N,\\N,{country},\"Y\"\n")
}

fn route_line(code: &str, airline: &str, source: &str, dest: &str, equipment: &str) -> String {
    format!("{code},{airline},S{source},{source},D{dest},{dest},,0,{equipment}\n")
}

/// Randomized dataset with every kind of defect the real extract has:
/// null and non-numeric keys, dangling ids, unknown and missing countries,
/// duplicate keys and equipment codes without a plane.
static RANDOM_DATASET: Lazy<Fixture> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(DATASET_SEED);
    let country = |rng: &mut StdRng| -> String {
        match rng.gen_range(0..20) {
            0 => "\\N".to_string(),
            n => format!("\"Country {}\"", n),
        }
    };

    // Countries 16..19 are used but never defined
    let mut countries = String::new();
    for n in 1..16 {
        countries.push_str(&format!("\"Country {n}\",C{n},F{n}\n"));
    }
    countries.push_str("\"Country 3\",DUP,DUP\n");

    let mut airports = String::new();
    for id in 1..=300 {
        airports.push_str(&airport_line(&id.to_string(), &country(&mut rng)));
    }
    airports.push_str(&airport_line("\\N", "\"Country 1\""));
    airports.push_str(&airport_line("12", "\"Country 2\""));

    let mut airlines = String::new();
    for id in 1..=80 {
        let raw_id = if id % 17 == 0 { format!("x{}", id) } else { id.to_string() };
        airlines.push_str(&airline_line(&raw_id, &country(&mut rng)));
    }

    let codes = ["320", "321", "73H", "738", "CR2", "E90", "ZZZ", "a320", "B738"];
    let mut routes = String::new();
    for _ in 0..2000 {
        let airline = match rng.gen_range(0..50) {
            0 => "\\N".to_string(),
            _ => rng.gen_range(1..=90).to_string(),
        };
        let source = rng.gen_range(1..=320).to_string();
        let dest = match rng.gen_range(0..40) {
            0 => "\\N".to_string(),
            _ => rng.gen_range(1..=320).to_string(),
        };
        let equipment = match rng.gen_range(0..6) {
            0 => "\\N".to_string(),
            n => (0..n)
                .map(|_| codes[rng.gen_range(0..codes.len())])
                .collect::<Vec<_>>()
                .join(" "),
        };
        routes.push_str(&route_line("XX", &airline, &source, &dest, &equipment));
    }

    let planes = "\
\"Airbus A320\",320,A320
\"Airbus A321\",321,A321
\"Boeing 737-300 Winglets\",73H,\\N
\"Boeing 737-800\",738,B738
\"Canadair CRJ-200\",CR2,CRJ2
\"Embraer 190\",E90,E190
\"Boeing 747-400\",744,B744
\"Unknown\",\\N,\\N
"
    .to_string();

    Fixture {
        routes,
        airports,
        airlines,
        planes: Some(planes),
        countries: Some(countries),
    }
});

// =============================================================================
// Output Utilities
// =============================================================================

fn read_rows<T: Row>(path: &Path) -> Vec<T> {
    let raw = load_table(path, T::SCHEMA).expect("Failed to read output");
    assert_eq!(raw.malformed, 0, "malformed rows in {:?}", path);
    let cleaned = coerce::<T>(&raw);
    assert_eq!(cleaned.stats.coercion_failures, 0, "bad keys in {:?}", path);
    cleaned.rows
}

struct Output {
    routes: Vec<Route>,
    airports: Vec<Airport>,
    airlines: Vec<Airline>,
    planes: Option<Vec<Plane>>,
    countries: Option<Vec<Country>>,
}

fn read_output(outputs: &TablePaths) -> Output {
    let optional = |p: &PathBuf| p.exists().then_some(p.clone());
    Output {
        routes: read_rows(&outputs.routes),
        airports: read_rows(&outputs.airports),
        airlines: read_rows(&outputs.airlines),
        planes: optional(&outputs.planes).map(|p| read_rows(&p)),
        countries: optional(&outputs.countries).map(|p| read_rows(&p)),
    }
}

fn airline_ids(output: &Output) -> BTreeSet<i64> {
    output.airlines.iter().map(|a| a.id).collect()
}

fn airport_ids(output: &Output) -> BTreeSet<i64> {
    output.airports.iter().map(|a| a.id).collect()
}

/// Every hard reference resolves, and every referenced row is used
fn assert_consistent(output: &Output) {
    let route_airlines: BTreeSet<i64> = output.routes.iter().map(|r| r.airline_id).collect();
    let route_airports: BTreeSet<i64> = output
        .routes
        .iter()
        .flat_map(|r| [r.source_airport_id, r.dest_airport_id])
        .collect();

    assert_eq!(route_airlines, airline_ids(output));
    assert_eq!(route_airports, airport_ids(output));
    assert_eq!(output.airlines.len(), airline_ids(output).len(), "duplicate airlines");
    assert_eq!(output.airports.len(), airport_ids(output).len(), "duplicate airports");

    if let Some(countries) = &output.countries {
        let names: BTreeSet<&str> = countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), countries.len(), "duplicate countries");

        let used: BTreeSet<&str> = output
            .airports
            .iter()
            .map(|a| a.country_name.as_deref().expect("airport without country"))
            .chain(
                output
                    .airlines
                    .iter()
                    .map(|a| a.country_name.as_deref().expect("airline without country")),
            )
            .collect();
        assert_eq!(used, names);
    }
}

/// Records UI output for assertions
#[derive(Default)]
struct RecordingUi {
    phases: Vec<Phase>,
    logs: Vec<String>,
    warnings: Vec<String>,
}

impl Ui for RecordingUi {
    fn set_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }
    fn set_info(&mut self, info: impl Into<String>) {
        self.logs.push(info.into());
    }
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }
    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_unreferenced_airline_excluded() {
    let fixture = Fixture {
        routes: route_line("A1", "1", "100", "200", "\\N") + &route_line("A2", "2", "200", "300", "\\N"),
        airports: ["100", "200", "300"]
            .iter()
            .map(|id| airport_line(id, "\"France\""))
            .collect(),
        airlines: ["1", "2", "3"]
            .iter()
            .map(|id| airline_line(id, "\"France\""))
            .collect(),
        ..Default::default()
    };
    let (_dir, mut config) = fixture.install();
    config.sample_size = 2;
    config.seed = 99;

    run_subset(&config, &mut SilentUi::new()).unwrap();
    let output = read_output(&config.outputs);

    assert_eq!(output.routes.len(), 2);
    assert_eq!(airline_ids(&output), BTreeSet::from([1, 2]));
    assert_eq!(airport_ids(&output), BTreeSet::from([100, 200, 300]));
    assert!(output.planes.is_none());
    assert!(output.countries.is_none());
}

#[test]
fn test_dangling_airline_dropped() {
    let fixture = Fixture {
        routes: route_line("A1", "1", "100", "200", "\\N") + &route_line("ZZ", "999", "200", "300", "\\N"),
        airports: ["100", "200", "300"]
            .iter()
            .map(|id| airport_line(id, "\"France\""))
            .collect(),
        airlines: airline_line("1", "\"France\""),
        ..Default::default()
    };
    let (_dir, config) = fixture.install();
    let mut ui = RecordingUi::default();

    let summary = run_subset(&config, &mut ui).unwrap();
    let output = read_output(&config.outputs);

    assert_eq!(output.routes.len(), 1);
    assert_eq!(output.routes[0].airline_id, 1);
    assert!(!airline_ids(&output).contains(&999));
    assert_eq!(airport_ids(&output), BTreeSet::from([100, 200]));
    assert!(ui
        .warnings
        .iter()
        .any(|w| w.contains("1 airline IDs in routes not found")));
    assert_eq!(summary.gaps.len(), 1);
}

#[test]
fn test_dangling_airport_dropped() {
    let fixture = Fixture {
        routes: route_line("A1", "1", "100", "200", "\\N") + &route_line("A1", "1", "200", "777", "\\N"),
        airports: ["100", "200"]
            .iter()
            .map(|id| airport_line(id, "\"France\""))
            .collect(),
        airlines: airline_line("1", "\"France\""),
        ..Default::default()
    };
    let (_dir, config) = fixture.install();
    let mut ui = RecordingUi::default();

    let summary = run_subset(&config, &mut ui).unwrap();
    let output = read_output(&config.outputs);

    assert_eq!(output.routes.len(), 1);
    assert_eq!(output.routes[0].dest_airport_id, 200);
    assert_eq!(airport_ids(&output), BTreeSet::from([100, 200]));
    assert!(ui
        .warnings
        .iter()
        .any(|w| w.contains("1 airport IDs in routes not found")));
    assert_eq!(summary.gaps.len(), 1);
    assert_eq!(summary.gaps[0].kind, GapKind::AirportIds);
}

#[test]
fn test_unknown_country_excludes_airport_and_routes() {
    let fixture = Fixture {
        routes: route_line("A1", "1", "100", "200", "\\N")
            + &route_line("A1", "1", "100", "300", "\\N")
            + &route_line("A1", "1", "300", "100", "\\N"),
        airports: airport_line("100", "\"France\"")
            + &airport_line("200", "\"France\"")
            + &airport_line("300", "\"Nowhereland\""),
        airlines: airline_line("1", "\"France\""),
        countries: Some("\"France\",FR,FR\n\"Germany\",DE,GM\n".to_string()),
        ..Default::default()
    };
    let (_dir, config) = fixture.install();

    run_subset(&config, &mut SilentUi::new()).unwrap();
    let output = read_output(&config.outputs);

    assert_eq!(output.routes.len(), 1);
    assert_eq!(airport_ids(&output), BTreeSet::from([100, 200]));
    let countries: Vec<_> = output.countries.as_ref().unwrap().iter().map(|c| c.name.clone()).collect();
    assert_eq!(countries, ["France"]);
    assert_consistent(&output);
}

#[test]
fn test_sample_size_clamped() {
    let fixture = Fixture {
        routes: route_line("A1", "1", "100", "200", "\\N")
            + &route_line("A1", "\\N", "100", "200", "\\N")
            + &route_line("A1", "1", "200", "100", "\\N"),
        airports: airport_line("100", "\\N") + &airport_line("200", "\\N"),
        airlines: airline_line("1", "\\N"),
        ..Default::default()
    };
    let (_dir, mut config) = fixture.install();
    config.sample_size = 10_000;

    let summary = run_subset(&config, &mut SilentUi::new()).unwrap();

    assert_eq!(summary.sampled_routes, 2);
    assert_eq!(read_output(&config.outputs).routes.len(), 2);
}

#[test]
fn test_negative_sample_size_writes_nothing() {
    let (dir, mut config) = RANDOM_DATASET.install();
    config.sample_size = -1;

    let err = run_subset(&config, &mut SilentUi::new()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SubsetError>(),
        Some(SubsetError::InvalidSampleSize(-1))
    ));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_missing_required_input_writes_nothing() {
    let (dir, config) = RANDOM_DATASET.install();
    fs::remove_file(&config.inputs.airlines).unwrap();

    let err = run_subset(&config, &mut SilentUi::new()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SubsetError>(),
        Some(SubsetError::MissingInput { table: "airlines", .. })
    ));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_unwritable_output_writes_nothing() {
    let (dir, config) = RANDOM_DATASET.install();
    fs::create_dir_all(&config.outputs.airports).unwrap();

    assert!(run_subset(&config, &mut SilentUi::new()).is_err());

    assert!(!config.outputs.routes.exists());
    assert!(!config.outputs.airlines.exists());
    assert!(!config.outputs.planes.exists());
    assert!(!config.outputs.countries.exists());
    // Only the blocking directory is left, no temporaries
    assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
}

#[test]
fn test_failed_sqlite_export_writes_nothing() {
    let (dir, mut config) = RANDOM_DATASET.install();
    let db_path = dir.path().join("subset.db");
    fs::create_dir(&db_path).unwrap();
    config.sqlite = Some(db_path);

    assert!(run_subset(&config, &mut SilentUi::new()).is_err());

    for path in [
        &config.outputs.routes,
        &config.outputs.airports,
        &config.outputs.airlines,
        &config.outputs.planes,
        &config.outputs.countries,
    ] {
        assert!(!path.exists(), "{:?} written by a failed run", path);
    }
}

#[test]
fn test_stale_optional_outputs_removed() {
    let fixture = Fixture {
        planes: None,
        countries: None,
        ..RANDOM_DATASET.clone()
    };
    let (_dir, config) = fixture.install();
    fs::create_dir_all(config.outputs.planes.parent().unwrap()).unwrap();
    fs::write(&config.outputs.planes, "\"Old\",OLD,OLDX\n").unwrap();
    fs::write(&config.outputs.countries, "\"Old\",OL,OL\n").unwrap();
    let mut ui = RecordingUi::default();

    run_subset(&config, &mut ui).unwrap();

    assert!(!config.outputs.planes.exists());
    assert!(!config.outputs.countries.exists());
    assert!(config.outputs.routes.exists());
    assert_eq!(ui.logs.iter().filter(|l| l.contains("Removed stale")).count(), 2);
}

#[test]
fn test_optional_inputs_absent() {
    let fixture = Fixture {
        planes: None,
        countries: None,
        ..RANDOM_DATASET.clone()
    };
    let (_dir, config) = fixture.install();
    let mut ui = RecordingUi::default();

    let summary = run_subset(&config, &mut ui).unwrap();

    assert!(!config.outputs.planes.exists());
    assert!(!config.outputs.countries.exists());
    assert_eq!(summary.equipment_codes, None);
    assert!(ui.logs.iter().any(|l| l.contains("will skip planes_small.dat")));
    assert_consistent(&read_output(&config.outputs));
}

// =============================================================================
// Properties on the random dataset
// =============================================================================

#[test]
fn test_closure_invariants_hold_for_many_seeds() {
    for &seed in SAMPLE_SEEDS {
        let (_dir, mut config) = RANDOM_DATASET.install();
        config.seed = seed;

        let summary = run_subset(&config, &mut SilentUi::new()).unwrap();
        let output = read_output(&config.outputs);

        assert!(!output.routes.is_empty(), "seed {} produced no routes", seed);
        assert!(output.routes.len() <= 350);
        assert!(summary.passes >= 1);
        assert!(summary.sampled_routes >= output.routes.len());
        assert_consistent(&output);
    }
}

#[test]
fn test_planes_are_exactly_the_matching_ones() {
    let (dir, config) = RANDOM_DATASET.install();
    run_subset(&config, &mut SilentUi::new()).unwrap();
    let output = read_output(&config.outputs);

    let codes = used_equipment_codes(&output.routes);
    let all_planes: Vec<Plane> = read_rows(&TablePaths::inputs_in(dir.path()).planes);
    let expected: HashSet<_> = all_planes
        .into_iter()
        .filter(|p| {
            [&p.iata_code, &p.icao_code]
                .into_iter()
                .flatten()
                .any(|c| codes.contains(c))
        })
        .collect();
    let actual: HashSet<_> = output.planes.unwrap().into_iter().collect();

    assert_eq!(actual, expected);
    // Lower-case tokens are upper-cased before matching
    assert!(codes.iter().all(|c| c.to_uppercase() == *c));
}

#[test]
fn test_planes_never_change_routes() {
    let (_dir, config) = RANDOM_DATASET.install();
    run_subset(&config, &mut SilentUi::new()).unwrap();
    let with_planes = fs::read(&config.outputs.routes).unwrap();

    fs::remove_file(&config.inputs.planes).unwrap();
    run_subset(&config, &mut SilentUi::new()).unwrap();
    let without_planes = fs::read(&config.outputs.routes).unwrap();

    assert_eq!(with_planes, without_planes);
    assert!(!config.outputs.planes.exists());
}

#[test]
fn test_identical_runs_are_byte_identical() {
    let (_a, config_a) = RANDOM_DATASET.install();
    let (_b, config_b) = RANDOM_DATASET.install();

    run_subset(&config_a, &mut SilentUi::new()).unwrap();
    run_subset(&config_b, &mut SilentUi::new()).unwrap();

    for (a, b) in [
        (&config_a.outputs.routes, &config_b.outputs.routes),
        (&config_a.outputs.airports, &config_b.outputs.airports),
        (&config_a.outputs.airlines, &config_b.outputs.airlines),
        (&config_a.outputs.planes, &config_b.outputs.planes),
        (&config_a.outputs.countries, &config_b.outputs.countries),
    ] {
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap(), "{:?} differs", a);
    }
}

#[test]
fn test_outputs_are_sorted() {
    let (_dir, config) = RANDOM_DATASET.install();
    run_subset(&config, &mut SilentUi::new()).unwrap();
    let output = read_output(&config.outputs);

    let keys: Vec<_> = output
        .routes
        .iter()
        .map(|r| (r.airline_id, r.source_airport_id, r.dest_airport_id))
        .collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    assert!(output.airports.windows(2).all(|w| w[0].id < w[1].id));
    assert!(output.airlines.windows(2).all(|w| w[0].id < w[1].id));
    let countries = output.countries.unwrap();
    assert!(countries.windows(2).all(|w| w[0].name < w[1].name));

    let planes = output.planes.unwrap();
    assert!(planes.len() > 1);
    let plane_keys: Vec<_> = planes
        .iter()
        .map(|p| (&p.iata_code, &p.icao_code, &p.name))
        .collect();
    assert!(plane_keys.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_summary_reports_cleaning() {
    let (_dir, config) = RANDOM_DATASET.install();
    let mut ui = RecordingUi::default();

    let summary = run_subset(&config, &mut ui).unwrap();

    let airports = summary.tables.iter().find(|t| t.name == "airports").unwrap();
    assert_eq!(airports.input.loaded, 302);
    assert_eq!(airports.input.coercion_failures, 1);
    assert_eq!(airports.input.duplicates, 1);

    let airlines = summary.tables.iter().find(|t| t.name == "airlines").unwrap();
    assert_eq!(airlines.input.coercion_failures, 4);

    let countries = summary.tables.iter().find(|t| t.name == "countries").unwrap();
    assert_eq!(countries.input.duplicates, 1);

    assert_eq!(ui.phases.first(), Some(&Phase::Loading));
    assert_eq!(ui.phases.last(), Some(&Phase::Complete));
    assert!(!ui.warnings.is_empty(), "the random dataset has dangling references");

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["seed"], 42);
    assert!(json["gaps"].as_array().is_some_and(|g| !g.is_empty()));
}

// =============================================================================
// SQLite export
// =============================================================================

#[test]
fn test_sqlite_export_enforces_foreign_keys() {
    let (dir, mut config) = RANDOM_DATASET.install();
    let db_path = dir.path().join("subset.db");
    config.sqlite = Some(db_path.clone());

    let summary = run_subset(&config, &mut SilentUi::new()).unwrap();
    let output = read_output(&config.outputs);

    let conn = Connection::open(&db_path).unwrap();
    let count = |table: &str| -> usize {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get::<_, i64>(0))
            .unwrap() as usize
    };

    assert_eq!(count("routes"), output.routes.len());
    assert_eq!(count("airports"), output.airports.len());
    assert_eq!(count("airlines"), output.airlines.len());
    assert_eq!(count("countries"), output.countries.as_ref().unwrap().len());
    assert_eq!(count("planes"), output.planes.as_ref().unwrap().len());

    let expected: u64 = [
        output.routes.len(),
        output.airports.len(),
        output.airlines.len(),
        output.countries.unwrap().len(),
        output.planes.unwrap().len(),
    ]
    .iter()
    .map(|&n| n as u64)
    .sum();
    assert_eq!(summary.sqlite_records, Some(expected));

    // Orphaned children are rejected
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    let orphan = conn.execute(
        "INSERT INTO routes (airline, airline_id, source_airport, source_airport_id, dest_airport, dest_airport_id) \
         VALUES ('ZZ', 99999, 'AAA', 1, 'BBB', 2)",
        [],
    );
    assert!(orphan.is_err());
}
