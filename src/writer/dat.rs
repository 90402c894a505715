use anyhow::{anyhow, bail, Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::model::Row;
use crate::parser::{Record, NULL_TOKEN};
use crate::schema::TableSchema;

/// A fully serialized output file that hasn't been written yet
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub schema: &'static TableSchema,
    pub path: PathBuf,
    pub records: Vec<Record>,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new<T: Row>(path: &Path, rows: &[T]) -> Result<Self> {
        let records: Vec<Record> = rows.iter().map(Row::to_record).collect();
        let bytes = encode_records(&records)
            .with_context(|| format!("Failed to serialize {}", T::SCHEMA.name))?;

        Ok(Self {
            schema: T::SCHEMA,
            path: path.to_path_buf(),
            records,
            bytes,
        })
    }

    pub fn rows(&self) -> usize {
        self.records.len()
    }
}

/// Serialize records without a header, writing nulls as the null token
pub fn encode_records(records: &[Record]) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    for record in records {
        wtr.write_record(record.iter().map(|f| f.as_deref().unwrap_or(NULL_TOKEN)))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow!("Failed to flush records: {}", e.error()))
}

/// Output files written next to their destinations but not yet visible
/// under their final names
pub struct StagedFiles {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

/// Write every pending file to a temporary sibling of its destination.
///
/// Nothing is visible under a final name until [`StagedFiles::commit`];
/// dropping the result removes the temporaries.
pub fn stage_files(files: &[PendingFile]) -> Result<StagedFiles> {
    let mut staged = Vec::with_capacity(files.len());

    for file in files {
        if file.path.is_dir() {
            bail!("Output path is a directory: {:?}", file.path);
        }

        let parent = match file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        tmp.write_all(&file.bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .with_context(|| format!("Failed to write: {:?}", file.path))?;

        staged.push((tmp, file.path.clone()));
    }

    Ok(StagedFiles { staged })
}

impl StagedFiles {
    /// Move every staged file into place. If a rename fails, the files
    /// already moved by this commit are removed again.
    pub fn commit(self) -> Result<()> {
        let mut committed: Vec<PathBuf> = Vec::with_capacity(self.staged.len());

        for (tmp, dest) in self.staged {
            if let Err(e) = tmp.persist(&dest) {
                for path in &committed {
                    let _ = fs::remove_file(path);
                }
                return Err(e.error).with_context(|| format!("Failed to write: {:?}", dest));
            }
            committed.push(dest);
        }

        Ok(())
    }
}
