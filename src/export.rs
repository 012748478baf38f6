//! Spreadsheet export of the latest snapshot

use crate::{error::ExportError, types::MarketSnapshot};
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a snapshot somewhere a spreadsheet can open it
pub trait SnapshotExporter: Send + Sync {
    /// Exports the full snapshot, replacing any previous export
    ///
    /// # Returns
    /// Number of data rows written
    fn export(&self, snapshot: &MarketSnapshot) -> Result<usize, ExportError>;

    /// Destination of the export
    fn path(&self) -> &Path;
}

/// CSV exporter
///
/// The file is written next to its destination and renamed into place, so a
/// spreadsheet open on the old file never sees a partial table.
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_rows(&self, path: &Path, snapshot: &MarketSnapshot) -> Result<usize, ExportError> {
        let mut writer = Writer::from_path(path).map_err(|e| ExportError::csv(path, e))?;

        // serialize() emits the header from the first row; an empty table still gets one
        if snapshot.is_empty() {
            writer
                .write_record(HEADER)
                .map_err(|e| ExportError::csv(path, e))?;
        }

        for row in &snapshot.rows {
            writer.serialize(row).map_err(|e| ExportError::csv(path, e))?;
        }

        writer.flush().map_err(|e| ExportError::io(path, e))?;
        Ok(snapshot.len())
    }
}

const HEADER: [&str; 6] = [
    "name",
    "symbol",
    "current_price",
    "market_cap",
    "total_volume",
    "price_change_percentage_24h",
];

impl SnapshotExporter for CsvExporter {
    fn export(&self, snapshot: &MarketSnapshot) -> Result<usize, ExportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        let written = match self.write_rows(&tmp, snapshot) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
        };

        fs::rename(&tmp, &self.path).map_err(|e| ExportError::io(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            rows = written,
            "Exported snapshot"
        );

        Ok(written)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
