//! Client for the `/data/items` family of routes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::credentials::{CredentialError, CredentialProvider};
use crate::fetch::{HttpClient, RequestDescriptor, RequestError, execute};

/// Payload for `POST /data/item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub duration_minutes: u32,
    pub category: String,
}

/// Failure of a single route call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("item id must not be empty")]
    EmptyItemId,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Calls the item routes under a base endpoint, resolving a fresh credential
/// for every call.
pub struct ItemsApi<C> {
    base_url: reqwest::Url,
    client: C,
    credentials: Arc<dyn CredentialProvider>,
}

impl<C: HttpClient> ItemsApi<C> {
    pub fn new(
        base_url: &str,
        client: C,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed: reqwest::Url = base_url
            .parse()
            .map_err(|e: url::ParseError| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a hierarchical url".to_string()));
        }
        Ok(Self {
            base_url: parsed,
            client,
            credentials,
        })
    }

    /// Validates `base_url`, then resolves a credential once so a missing
    /// credential is reported before any route is called.
    pub async fn connect(
        base_url: &str,
        client: C,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let api = Self::new(base_url, client, credentials)?;
        api.credentials.credential().await?;
        Ok(api)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `GET {base}/data/items`
    pub async fn list_items(&self) -> Result<String, ApiError> {
        let url = self.route(&["data", "items"]);
        self.send(RequestDescriptor::get(url)).await
    }

    /// `GET {base}/data/item/{id}`
    pub async fn get_item(&self, id: &str) -> Result<String, ApiError> {
        if id.trim().is_empty() {
            return Err(ApiError::EmptyItemId);
        }
        let url = self.route(&["data", "item", id]);
        self.send(RequestDescriptor::get(url)).await
    }

    /// `POST {base}/data/item`
    pub async fn create_item(&self, item: &NewItem) -> Result<String, ApiError> {
        let url = self.route(&["data", "item"]);
        self.send(RequestDescriptor::post(url).json(item)?).await
    }

    async fn send(&self, descriptor: RequestDescriptor) -> Result<String, ApiError> {
        let credential = self.credentials.credential().await?;
        let body = execute(&self.client, &credential, &descriptor).await?;
        info!(
            method = %descriptor.method(),
            url = descriptor.url(),
            bytes = body.len(),
            "Route call succeeded"
        );
        Ok(body)
    }

    fn route(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }
}
