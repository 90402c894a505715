pub mod cache;
pub mod client;

pub use cache::*;
pub use client::*;

use anyhow::Result;
use std::path::PathBuf;

use crate::schema::ALL_TABLES;
use crate::ui::{Phase, Ui};

/// Make sure the OpenFlights files are in the cache, downloading what's
/// missing (or everything with `force`). Returns the cache directory.
///
/// A failed download of an optional table is only a warning; the subset
/// run then skips that table.
pub fn ensure_data_downloaded(
    cache_dir: Option<PathBuf>,
    force: bool,
    ui: &mut impl Ui,
) -> Result<PathBuf> {
    let cache = CacheManager::new(cache_dir)?;

    if !force && cache.is_complete() {
        ui.log(format!("Using cached data in {:?}", cache.cache_dir()));
        return Ok(cache.cache_dir().to_path_buf());
    }

    ui.set_phase(Phase::Downloading);
    let client = OpenFlightsClient::new()?;

    for schema in ALL_TABLES {
        if !force && cache.is_cached(schema) {
            continue;
        }

        match client.download_table(schema, &cache.file_path(schema), ui) {
            Ok(_) => {}
            Err(e) if !schema.required => {
                ui.clear_progress();
                ui.warn(format!("Skipping optional {}: {:#}", schema.name, e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(cache.cache_dir().to_path_buf())
}
