//! Output workbook downloads
//!
//! GET /files/{path} serves files from the output directory only.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::{ApiError, ApiResult, AppState};

/// Bytes escaped inside one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// GET /files/*path
pub async fn download_output(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let not_found = || ApiError::NotFound("Requested file was not found.".to_string());

    let output_root = tokio::fs::canonicalize(&state.settings.output_dir)
        .await
        .map_err(|_| not_found())?;
    let target = tokio::fs::canonicalize(output_root.join(&path))
        .await
        .map_err(|_| not_found())?;

    if !target.starts_with(&output_root) || !target.is_file() {
        return Err(not_found());
    }

    let bytes = tokio::fs::read(&target).await?;
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_else(|| "output.xlsx".to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// URL path under which an output file is downloadable
pub fn download_path(state: &AppState, output_file: &std::path::Path) -> String {
    let relative = output_file
        .strip_prefix(&state.settings.output_dir)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .or_else(|| output_file.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();
    format!("/files/{}", encode_path(&relative))
}

/// Percent-encode each `/`-separated segment
fn encode_path(relative: &str) -> String {
    relative
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build file download routes
pub fn file_routes() -> Router<AppState> {
    Router::new().route("/files/*path", get(download_output))
}
