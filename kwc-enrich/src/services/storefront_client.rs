//! Shopify custom collection client
//!
//! Looks a collection up by title, then updates it (PUT) or creates it (POST)
//! with the generated HTML body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("kwc-enrich/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Storefront client errors
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Storefront network error: {0}")]
    Network(String),

    #[error("Storefront API error {0}: {1}")]
    Api(u16, String),

    #[error("Storefront response could not be parsed: {0}")]
    Parse(String),
}

/// Publishes collection bodies to a storefront
#[async_trait]
pub trait CollectionPublisher: Send + Sync {
    /// Create or update the collection titled `title`; returns its remote id
    async fn upsert_collection(
        &self,
        title: &str,
        html_body: &str,
    ) -> Result<Option<u64>, StorefrontError>;
}

#[derive(Debug, Serialize)]
struct CollectionPayload<'a> {
    custom_collection: CollectionBody<'a>,
}

#[derive(Debug, Serialize)]
struct CollectionBody<'a> {
    title: &'a str,
    body_html: &'a str,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    #[serde(default)]
    custom_collections: Vec<CollectionSummary>,
}

#[derive(Debug, Deserialize)]
struct CollectionEnvelope {
    custom_collection: Option<CollectionSummary>,
}

#[derive(Debug, Deserialize)]
struct CollectionSummary {
    id: u64,
    #[serde(default)]
    title: Option<String>,
}

/// Shopify Admin REST client for custom collections
pub struct ShopifyClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ShopifyClient {
    /// `store_domain` may be a bare host (`shop.myshopify.com`) or a full
    /// `http(s)://` origin
    pub fn new(
        store_domain: &str,
        access_token: &str,
        api_version: &str,
    ) -> Result<Self, StorefrontError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut token = reqwest::header::HeaderValue::from_str(access_token)
            .map_err(|e| StorefrontError::Network(format!("Invalid access token header: {}", e)))?;
        token.set_sensitive(true);
        headers.insert("X-Shopify-Access-Token", token);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorefrontError::Network(e.to_string()))?;

        let domain = store_domain.trim().trim_end_matches('/');
        let origin = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        };

        Ok(Self {
            http_client,
            base_url: format!("{}/admin/api/{}", origin, api_version),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Id of the collection whose title matches exactly
    async fn find_collection_id(&self, title: &str) -> Result<Option<u64>, StorefrontError> {
        let response = self
            .http_client
            .get(self.url("custom_collections.json"))
            .query(&[("title", title)])
            .send()
            .await
            .map_err(|e| StorefrontError::Network(e.to_string()))?;

        let list: CollectionList = parse_response(response).await?;
        Ok(list
            .custom_collections
            .into_iter()
            .find(|c| c.title.as_deref().map_or(true, |t| t == title))
            .map(|c| c.id))
    }
}

#[async_trait]
impl CollectionPublisher for ShopifyClient {
    async fn upsert_collection(
        &self,
        title: &str,
        html_body: &str,
    ) -> Result<Option<u64>, StorefrontError> {
        let existing_id = self.find_collection_id(title).await?;
        let payload = CollectionPayload {
            custom_collection: CollectionBody {
                title,
                body_html: html_body,
            },
        };

        let request = match existing_id {
            Some(id) => self
                .http_client
                .put(self.url(&format!("custom_collections/{}.json", id))),
            None => self.http_client.post(self.url("custom_collections.json")),
        };

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| StorefrontError::Network(e.to_string()))?;
        let envelope: CollectionEnvelope = parse_response(response).await?;
        let remote_id = envelope.custom_collection.map(|c| c.id).or(existing_id);

        match existing_id {
            Some(id) => tracing::info!(title = %title, id = id, "Updated storefront collection"),
            None => tracing::info!(title = %title, id = ?remote_id, "Created storefront collection"),
        }

        Ok(remote_id)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StorefrontError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(StorefrontError::Api(status.as_u16(), error_text));
    }
    response
        .json()
        .await
        .map_err(|e| StorefrontError::Parse(e.to_string()))
}
