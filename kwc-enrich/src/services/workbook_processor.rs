//! Workbook processor
//!
//! Reads a keyword workbook, enriches each row with generated headings and
//! paragraphs, optionally publishes the composed HTML, and writes a new
//! timestamped workbook. Rows are processed strictly in order.
//!
//! Failure scopes:
//! - Reading the input or writing the output fails the whole run.
//! - Anything else fails only the current row, which is recorded in the
//!   result's error list while the run continues.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::content_generator::{ContentGenerator, GenerationError};
use super::content_rules::{
    compose_html, is_missing_keyword, normalize_paragraph, paragraph_fits, row_hash,
    validate_heading, word_count,
};
use super::storefront_client::{CollectionPublisher, StorefrontError};
use crate::models::{columns, ProcessingResult, RowError};
use crate::workbook::{self, Cell, Table, WorkbookError};

/// Attempts per heading or paragraph before giving up / settling
pub const MAX_ATTEMPTS: usize = 3;
/// Target length of the paragraph under the H2 heading
pub const H2_PARAGRAPH_WORDS: usize = 200;
/// Target length of the paragraph under the H3 heading
pub const H3_PARAGRAPH_WORDS: usize = 150;

/// Hash text of a blank override cell
const BLANK_HASH_FIELD: &str = "nan";

/// Run-fatal errors
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Failed to read workbook {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    #[error("Failed to write workbook {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    #[error("Failed to scan input directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    #[error("Workbook task failed: {0}")]
    Task(String),
}

/// Row-scoped failures
#[derive(Debug, Error)]
pub enum RowFailure {
    #[error("Unable to produce valid {0} heading")]
    HeadingExhausted(HeadingLevel),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storefront(#[from] StorefrontError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H2,
    H3,
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadingLevel::H2 => f.write_str("H2"),
            HeadingLevel::H3 => f.write_str("H3"),
        }
    }
}

/// What happened to one row
#[derive(Debug)]
enum RowOutcome {
    Processed { published: bool },
    Skipped,
    Failed(RowError),
}

/// Generated copy for one row
#[derive(Debug, Clone)]
struct RowContent {
    h2_heading: String,
    h2_paragraph: String,
    h3_heading: String,
    h3_paragraph: String,
    html: String,
}

pub struct WorkbookProcessor {
    generator: Arc<dyn ContentGenerator>,
    publisher: Option<Arc<dyn CollectionPublisher>>,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl WorkbookProcessor {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            generator,
            publisher: None,
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Enable storefront publishing for processed rows
    pub fn with_publisher(mut self, publisher: Arc<dyn CollectionPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn publishes(&self) -> bool {
        self.publisher.is_some()
    }

    /// Process the newest workbook in the input directory, if any
    pub async fn process_latest(&self) -> Result<Option<ProcessingResult>, ProcessorError> {
        let input_dir = self.input_dir.clone();
        let latest = tokio::task::spawn_blocking(move || workbook::find_latest_workbook(&input_dir))
            .await
            .map_err(|e| ProcessorError::Task(e.to_string()))?
            .map_err(|source| ProcessorError::Scan {
                path: self.input_dir.clone(),
                source,
            })?;

        match latest {
            Some(path) => self.process_file(&path).await.map(Some),
            None => {
                info!("No workbooks found in {}", self.input_dir.display());
                Ok(None)
            }
        }
    }

    /// Process one workbook into a new output workbook
    pub async fn process_file(&self, input: &Path) -> Result<ProcessingResult, ProcessorError> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, path = %input.display(), publish = self.publishes(), "Processing workbook");

        let path = input.to_path_buf();
        let mut table = tokio::task::spawn_blocking(move || workbook::read_workbook(&path))
            .await
            .map_err(|e| ProcessorError::Task(e.to_string()))?
            .map_err(|source| ProcessorError::Read {
                path: input.to_path_buf(),
                source,
            })?;

        normalize_columns(&mut table);

        let mut result = ProcessingResult::new(run_id, input.to_path_buf());
        for index in 0..table.len() {
            match self.process_row(&mut table, index).await {
                RowOutcome::Processed { published } => {
                    result.processed_rows += 1;
                    if published {
                        result.storefront_updates += 1;
                    }
                }
                RowOutcome::Skipped => result.skipped_rows += 1,
                RowOutcome::Failed(error) => {
                    warn!(
                        run_id = %run_id,
                        row = error.index,
                        keyword = %error.keyword,
                        error = %error.message,
                        "Row failed"
                    );
                    result.errors.push(error);
                }
            }
        }

        let output = workbook::output_path_for(input, &self.output_dir, kwc_common::time::now());
        let output_for_task = output.clone();
        tokio::task::spawn_blocking(move || workbook::write_workbook(&table, &output_for_task))
            .await
            .map_err(|e| ProcessorError::Task(e.to_string()))?
            .map_err(|source| ProcessorError::Write {
                path: output.clone(),
                source,
            })?;
        result.output_file = output;

        info!(
            run_id = %run_id,
            processed = result.processed_rows,
            skipped = result.skipped_rows,
            errors = result.errors.len(),
            storefront_updates = result.storefront_updates,
            output = %result.output_file.display(),
            "Finished processing workbook"
        );

        Ok(result)
    }

    async fn process_row(&self, table: &mut Table, index: usize) -> RowOutcome {
        let keyword = table.cell(index, columns::KEYWORD).trim().to_string();
        if is_missing_keyword(&keyword) {
            return RowOutcome::Skipped;
        }

        let h2_override = table.cell(index, columns::H2_OVERRIDE).trim().to_string();
        let h3_override = table.cell(index, columns::H3_OVERRIDE).trim().to_string();
        let hash = row_hash(
            &keyword,
            &hash_field(table.value(index, columns::H2_OVERRIDE)),
            &hash_field(table.value(index, columns::H3_OVERRIDE)),
        );

        let stored_hash = table.cell(index, columns::ROW_HASH);
        let stored_html = table.cell(index, columns::COLLECTION_HTML);
        if stored_hash.trim() == hash && !stored_html.trim().is_empty() {
            debug!(row = index, keyword = %keyword, "Row unchanged, skipping");
            return RowOutcome::Skipped;
        }

        match self
            .enrich_row(table, index, &keyword, &h2_override, &h3_override, &hash)
            .await
        {
            Ok(published) => RowOutcome::Processed { published },
            Err(e) => RowOutcome::Failed(RowError {
                index,
                keyword,
                message: e.to_string(),
            }),
        }
    }

    /// Generate, write back, then publish; returns whether it was published
    ///
    /// Columns written before a failed publish stay written.
    async fn enrich_row(
        &self,
        table: &mut Table,
        index: usize,
        keyword: &str,
        h2_override: &str,
        h3_override: &str,
        hash: &str,
    ) -> Result<bool, RowFailure> {
        let content = self.generate_content(keyword, h2_override, h3_override).await?;

        table.set_cell(index, columns::H2_HEADING, content.h2_heading.as_str());
        table.set_cell(index, columns::H2_PARAGRAPH, content.h2_paragraph.as_str());
        table.set_cell(index, columns::H3_HEADING, content.h3_heading.as_str());
        table.set_cell(index, columns::H3_PARAGRAPH, content.h3_paragraph.as_str());
        table.set_cell(index, columns::COLLECTION_HTML, content.html.as_str());
        table.set_cell(
            index,
            columns::PROCESSED_AT,
            kwc_common::time::processed_at(kwc_common::time::now()),
        );
        table.set_cell(index, columns::ROW_HASH, hash);

        match &self.publisher {
            Some(publisher) => {
                publisher.upsert_collection(keyword, &content.html).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn generate_content(
        &self,
        keyword: &str,
        h2_override: &str,
        h3_override: &str,
    ) -> Result<RowContent, RowFailure> {
        let h2_heading = self.resolve_heading(keyword, h2_override, None).await?;
        let h2_paragraph = self
            .build_paragraph(keyword, &h2_heading, H2_PARAGRAPH_WORDS)
            .await?;

        let h3_heading = self
            .resolve_heading(keyword, h3_override, Some(&h2_heading))
            .await?;
        let h3_paragraph = self
            .build_paragraph(keyword, &h3_heading, H3_PARAGRAPH_WORDS)
            .await?;

        let html = compose_html(&h2_heading, &h2_paragraph, &h3_heading, &h3_paragraph);
        Ok(RowContent {
            h2_heading,
            h2_paragraph,
            h3_heading,
            h3_paragraph,
            html,
        })
    }

    /// H2 when `h2_heading` is `None`, H3 (distinct from it) otherwise
    ///
    /// A non-blank override is authoritative and bypasses generation.
    async fn resolve_heading(
        &self,
        keyword: &str,
        override_text: &str,
        h2_heading: Option<&str>,
    ) -> Result<String, RowFailure> {
        let mut forbidden = vec![keyword];
        forbidden.extend(h2_heading);

        if !override_text.trim().is_empty() {
            return Ok(validate_heading(override_text, &forbidden));
        }

        let level = if h2_heading.is_some() {
            HeadingLevel::H3
        } else {
            HeadingLevel::H2
        };

        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = match h2_heading {
                Some(other) => self.generator.generate_h3_heading(keyword, other).await?,
                None => self.generator.generate_h2_heading(keyword).await?,
            };
            let heading = validate_heading(&candidate, &forbidden);
            if !heading.is_empty() {
                return Ok(heading);
            }
            debug!(keyword = %keyword, level = %level, attempt, candidate = %candidate, "Retrying heading");
        }

        Err(RowFailure::HeadingExhausted(level))
    }

    /// Best effort: the last attempt is kept even when out of bounds
    async fn build_paragraph(
        &self,
        keyword: &str,
        subtopic: &str,
        target_words: usize,
    ) -> Result<String, RowFailure> {
        let mut paragraph = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let generated = self
                .generator
                .generate_paragraph(keyword, subtopic, target_words)
                .await?;
            paragraph = normalize_paragraph(&generated);
            if paragraph_fits(&paragraph, target_words) {
                return Ok(paragraph);
            }
            debug!(
                keyword = %keyword,
                subtopic = %subtopic,
                attempt,
                words = word_count(&paragraph),
                target = target_words,
                "Paragraph length out of bounds"
            );
        }
        Ok(paragraph)
    }
}

/// Hash text for an override cell; blank cells hash as `nan`
fn hash_field(cell: Option<&Cell>) -> String {
    match cell {
        None | Some(Cell::Empty) => BLANK_HASH_FIELD.to_string(),
        Some(cell) => cell.text().trim().to_string(),
    }
}

/// Rename the legacy paragraph column and add any missing required columns
fn normalize_columns(table: &mut Table) {
    if table.column(columns::LEGACY_H2_PARAGRAPH).is_some()
        && table.column(columns::H2_PARAGRAPH).is_none()
    {
        table.rename_column(columns::LEGACY_H2_PARAGRAPH, columns::H2_PARAGRAPH);
    }
    for name in columns::REQUIRED {
        table.ensure_column(name);
    }
}
