use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;

use crate::schema::TableSchema;
use crate::ui::Ui;

const BASE_URL: &str = "https://raw.githubusercontent.com/jpatokal/openflights/master/data";

pub struct OpenFlightsClient {
    client: Client,
    base_url: String,
}

impl OpenFlightsClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("openflights-subset")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn url_for(&self, schema: &TableSchema) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            schema.source_file
        )
    }

    /// Download one table's `.dat` file to `dest`
    pub fn download_table(&self, schema: &TableSchema, dest: &Path, ui: &mut impl Ui) -> Result<u64> {
        let url = self.url_for(schema);
        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", url))?;

        let total_size = response.content_length().unwrap_or(0);

        // Write next to the destination and rename, so a cut-off
        // download never looks cached
        let partial = dest.with_extension("part");
        let mut file = std::fs::File::create(&partial).context("Failed to create destination file")?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];
        let mut reader = response;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .context("Failed to read from response")?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])
                .context("Failed to write to file")?;

            downloaded += bytes_read as u64;
            ui.set_progress(downloaded, total_size, schema.source_file);
        }

        std::fs::rename(&partial, dest)
            .with_context(|| format!("Failed to move download into place: {:?}", dest))?;
        ui.clear_progress();
        ui.log(format!("{}: {}", schema.source_file, format_bytes(downloaded)));

        Ok(downloaded)
    }
}

/// Format a byte count as a human-readable string
fn format_bytes(bytes: u64) -> String {
    match bytes {
        b if b >= 1_000_000 => format!("{:.1} MB", b as f64 / 1_000_000.0),
        b if b >= 1_000 => format!("{:.1} KB", b as f64 / 1_000.0),
        b => format!("{} B", b),
    }
}
