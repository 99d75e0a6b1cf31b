//! Workbook run results and per-row errors

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A row that could not be enriched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based data row index (header excluded)
    pub index: usize,
    pub keyword: String,
    pub message: String,
}

/// Summary of one workbook run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub run_id: Uuid,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    pub errors: Vec<RowError>,
    /// Collections created or updated on the storefront
    pub storefront_updates: usize,
}

impl ProcessingResult {
    /// Create an empty result for a run that has not written output yet
    pub fn new(run_id: Uuid, input_file: PathBuf) -> Self {
        Self {
            run_id,
            input_file,
            output_file: PathBuf::new(),
            processed_rows: 0,
            skipped_rows: 0,
            errors: Vec::new(),
            storefront_updates: 0,
        }
    }

    /// True when every attempted row succeeded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
