use std::fs;
use std::path::{Path, PathBuf};

use jobsweep_core::error::AppError;
use jobsweep_core::models::JobRecord;
use jobsweep_core::traits::RecordSink;

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(|e| {
            AppError::SinkError(format!("Failed to create {}: {e}", parent.display()))
        }),
        _ => Ok(()),
    }
}

/// Writes records as CSV with a header row.
///
/// Columns follow [`JobRecord`] field order: title, company, location,
/// job_type, apply_url, source. An empty record set writes no file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn write(&self, records: &[JobRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            tracing::info!(path = %self.path.display(), "No records, skipping CSV export");
            return Ok(());
        }
        ensure_parent(&self.path)?;

        let csv_err =
            |e: csv::Error| AppError::SinkError(format!("CSV write to {}: {e}", self.path.display()));
        let mut writer = csv::Writer::from_path(&self.path).map_err(csv_err)?;
        for record in records {
            writer.serialize(record).map_err(csv_err)?;
        }
        writer.flush()?;

        tracing::info!(path = %self.path.display(), records = records.len(), "Exported CSV");
        Ok(())
    }
}

/// Writes records as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonSink {
    fn write(&self, records: &[JobRecord]) -> Result<(), AppError> {
        ensure_parent(&self.path)?;
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).map_err(|e| {
            AppError::SinkError(format!("JSON write to {}: {e}", self.path.display()))
        })?;

        tracing::info!(path = %self.path.display(), records = records.len(), "Exported JSON");
        Ok(())
    }
}

/// Fans a write out to several sinks in order, stopping at the first failure.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for MultiSink {
    fn write(&self, records: &[JobRecord]) -> Result<(), AppError> {
        self.sinks.iter().try_for_each(|sink| sink.write(records))
    }
}
