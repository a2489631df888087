//! Dataset loading

use crate::error::{PricingError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Loads raw listing tables from disk
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Rows scanned to infer the CSV schema (None = whole file)
    infer_schema_length: Option<usize>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(1000),
        }
    }

    /// Set how many rows are scanned for schema inference
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a table, choosing the reader from the file extension
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "csv" => self.load_csv(path),
            "json" => self.load_json(path),
            _ => Err(PricingError::DataError(format!(
                "Unsupported file format: '{}' ({})",
                ext,
                path.display()
            ))),
        }
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        Self::ensure_exists(path)?;
        let start = Instant::now();

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(df)
    }

    /// Load a JSON array of records
    pub fn load_json(&self, path: &Path) -> Result<DataFrame> {
        Self::ensure_exists(path)?;
        let df = JsonReader::new(File::open(path)?).finish()?;
        info!(path = %path.display(), rows = df.height(), "Loaded dataset");
        Ok(df)
    }

    fn ensure_exists(path: &Path) -> Result<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(PricingError::DataError(format!(
                "Dataset not found: {}",
                path.display()
            )))
        }
    }
}
