//! Prompt override endpoints
//!
//! GET /api/prompts, PUT /api/prompts

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::{ApiResult, AppState};

/// Templates in effect plus the raw overrides behind them
#[derive(Debug, Serialize)]
pub struct PromptsResponse {
    pub effective: BTreeMap<String, String>,
    pub overrides: BTreeMap<String, String>,
}

async fn current_prompts(state: &AppState) -> ApiResult<PromptsResponse> {
    Ok(PromptsResponse {
        effective: state.prompts.effective_prompts().await?,
        overrides: state.prompts.overrides().await?,
    })
}

/// GET /api/prompts
pub async fn get_prompts(State(state): State<AppState>) -> ApiResult<Json<PromptsResponse>> {
    Ok(Json(current_prompts(&state).await?))
}

/// PUT /api/prompts
///
/// **Request:** `{"h2_heading": "...", "paragraph": "...", "h3_heading": "..."}`
///
/// Replaces all overrides. Omitted or blank keys revert to defaults;
/// unknown keys are ignored.
pub async fn update_prompts(
    State(state): State<AppState>,
    Json(payload): Json<HashMap<String, String>>,
) -> ApiResult<Json<PromptsResponse>> {
    state.prompts.save(&payload).await?;
    info!("Prompt overrides updated via API");
    Ok(Json(current_prompts(&state).await?))
}

/// Build prompt routes
pub fn prompt_routes() -> Router<AppState> {
    Router::new().route("/api/prompts", get(get_prompts).put(update_prompts))
}
