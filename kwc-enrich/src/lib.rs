//! kwc-enrich library interface
//!
//! Keyword workbook enrichment: generated collection copy written back to a
//! new workbook and optionally published to the storefront.

pub mod api;
pub mod error;
pub mod models;
pub mod services;
pub mod workbook;

pub use crate::error::{ApiError, ApiResult};

use anyhow::Context;
use axum::Router;
use chrono::{DateTime, Utc};
use kwc_common::Settings;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{
    CollectionPublisher, ContentGenerator, OpenAiClient, PromptResolver, PromptedGenerator,
    ShopifyClient, WorkbookProcessor,
};

/// Application state shared across handlers and the background runner
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub prompts: Arc<PromptResolver>,
    pub generator: Arc<dyn ContentGenerator>,
    /// Present only when storefront credentials are configured
    pub publisher: Option<Arc<dyn CollectionPublisher>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        prompts: Arc<PromptResolver>,
        generator: Arc<dyn ContentGenerator>,
        publisher: Option<Arc<dyn CollectionPublisher>>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            prompts,
            generator,
            publisher,
            startup_time: Utc::now(),
        }
    }

    /// Wire the production services from resolved settings
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let prompts = Arc::new(PromptResolver::new(settings.prompt_file.clone()));

        let backend = OpenAiClient::new(
            settings.openai_api_key.clone(),
            settings.openai_model.clone(),
            settings.openai_base_url.clone(),
        )
        .context("Failed to create text generation client")?;
        let generator = Arc::new(PromptedGenerator::new(prompts.clone(), Arc::new(backend)));

        let publisher: Option<Arc<dyn CollectionPublisher>> = match settings.storefront_credentials() {
            Some(credentials) => Some(Arc::new(
                ShopifyClient::new(
                    &credentials.store_domain,
                    &credentials.access_token,
                    &settings.shopify_api_version,
                )
                .context("Failed to create storefront client")?,
            )),
            None => None,
        };

        Ok(Self::new(settings, prompts, generator, publisher))
    }

    /// Processor for one run; publishing requires storefront credentials
    pub fn processor(&self, publish: bool) -> ApiResult<WorkbookProcessor> {
        let processor = WorkbookProcessor::new(
            self.generator.clone(),
            self.settings.input_dir.clone(),
            self.settings.output_dir.clone(),
        );

        if !publish {
            return Ok(processor);
        }

        match &self.publisher {
            Some(publisher) => Ok(processor.with_publisher(publisher.clone())),
            None => Err(ApiError::BadRequest(
                "Storefront credentials are missing. Provide SHOPIFY_STORE_DOMAIN and SHOPIFY_ACCESS_TOKEN."
                    .to_string(),
            )),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::process_routes())
        .merge(api::prompt_routes())
        .merge(api::file_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
