//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("kwc-enrich")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Source revision the binary was built from
    pub commit: String,
    /// UTC build time
    pub built_at: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Whether storefront publishing is available
    pub storefront_configured: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "kwc-enrich".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("KWC_BUILD_COMMIT").to_string(),
        built_at: env!("KWC_BUILD_TIME").to_string(),
        uptime_seconds,
        storefront_configured: state.publisher.is_some(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
