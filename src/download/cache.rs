use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::{TableSchema, ALL_TABLES};

/// Local directory holding downloaded `.dat` files
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "openflights-subset")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of a table's source file inside the cache
    pub fn file_path(&self, schema: &TableSchema) -> PathBuf {
        self.cache_dir.join(schema.source_file)
    }

    pub fn is_cached(&self, schema: &TableSchema) -> bool {
        self.file_path(schema).exists()
    }

    /// True once every required table is present
    pub fn is_complete(&self) -> bool {
        ALL_TABLES
            .iter()
            .filter(|t| t.required)
            .all(|t| self.is_cached(t))
    }
}
