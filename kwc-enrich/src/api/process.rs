//! Workbook processing endpoints
//!
//! POST /process/latest, POST /process/upload

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::{
    api::files::download_path,
    models::{ProcessingResult, RowError},
    ApiError, ApiResult, AppState,
};

/// Uploaded workbooks may be larger than axum's 2 MB default
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Query flags for POST /process/latest
#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    #[serde(default)]
    pub push_to_storefront: bool,
}

/// Run summary returned by both processing endpoints
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub run_id: Uuid,
    pub input_file: String,
    pub output_file: String,
    pub output_file_url: String,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    pub storefront_updates: usize,
    pub errors: Vec<RowError>,
}

impl ProcessResponse {
    fn from_result(state: &AppState, result: ProcessingResult) -> Self {
        Self {
            run_id: result.run_id,
            input_file: result.input_file.display().to_string(),
            output_file: result.output_file.display().to_string(),
            output_file_url: download_path(state, &result.output_file),
            processed_rows: result.processed_rows,
            skipped_rows: result.skipped_rows,
            storefront_updates: result.storefront_updates,
            errors: result.errors,
        }
    }
}

/// POST /process/latest?push_to_storefront=bool
///
/// Processes the most recently modified workbook in the input directory.
///
/// **Errors:**
/// - 400 Bad Request: push requested without storefront credentials
/// - 404 Not Found: no workbook in the input directory
pub async fn process_latest(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
) -> ApiResult<Json<ProcessResponse>> {
    let processor = state.processor(query.push_to_storefront)?;
    let result = processor.process_latest().await?.ok_or_else(|| {
        ApiError::NotFound("No Excel files found in the input directory.".to_string())
    })?;
    Ok(Json(ProcessResponse::from_result(&state, result)))
}

/// POST /process/upload (multipart)
///
/// **Fields:** `file` (an `.xlsx` workbook), `push_to_storefront` (optional bool)
///
/// The upload is stored in the input directory, then processed immediately.
pub async fn process_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut push_to_storefront = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some("push_to_storefront") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed form field: {}", e)))?;
                push_to_storefront = parse_flag(&value)?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing 'file' field.".to_string()))?;
    let file_name = sanitize_file_name(&file_name)
        .ok_or_else(|| ApiError::BadRequest("Please upload an .xlsx file.".to_string()))?;

    // Reject before anything is written
    let processor = state.processor(push_to_storefront)?;

    let destination = upload_destination(&state.settings.input_dir, &file_name);
    tokio::fs::write(&destination, &bytes).await?;
    info!(path = %destination.display(), bytes = bytes.len(), "Saved uploaded workbook");

    let result = processor.process_file(&destination).await?;
    Ok(Json(ProcessResponse::from_result(&state, result)))
}

/// Bare file name of an `.xlsx` upload, or `None` if unacceptable
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    let is_xlsx = name.len() > ".xlsx".len() && name.to_ascii_lowercase().ends_with(".xlsx");
    is_xlsx.then(|| name.to_string())
}

fn upload_destination(input_dir: &std::path::Path, file_name: &str) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    input_dir.join(format!("{}_{}", millis, file_name))
}

fn parse_flag(value: &str) -> ApiResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "off" | "no" => Ok(false),
        "true" | "1" | "on" | "yes" => Ok(true),
        other => Err(ApiError::BadRequest(format!(
            "push_to_storefront must be a boolean, got '{}'",
            other
        ))),
    }
}

/// Build processing routes
pub fn process_routes() -> Router<AppState> {
    Router::new()
        .route("/process/latest", post(process_latest))
        .route(
            "/process/upload",
            post(process_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("keywords.xlsx"), Some("keywords.xlsx".to_string()));
        assert_eq!(
            sanitize_file_name("../../etc/keywords.XLSX"),
            Some("keywords.XLSX".to_string())
        );
        assert_eq!(sanitize_file_name("C:\\Users\\me\\k.xlsx"), Some("k.xlsx".to_string()));
        assert_eq!(sanitize_file_name("keywords.csv"), None);
        assert_eq!(sanitize_file_name(".xlsx"), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag(" ON ").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("perhaps").is_err());
    }

    #[test]
    fn test_upload_destination_prefixes_millis() {
        let path = upload_destination(std::path::Path::new("/in"), "k.xlsx");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let (millis, rest) = name.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "k.xlsx");
    }
}
