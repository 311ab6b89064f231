//! Client-side bootstrap.
//!
//! Mirrors what the browser frontend does on load: fetch the public store
//! configuration from the service's `/firebase-config` endpoint and build a
//! ready-to-use store handle from it. Errors propagate to the caller; there
//! is no retry.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::store::HttpStore;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("failed to fetch store configuration: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("store configuration has no storeUrl")]
    MissingStoreUrl,
}

#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    #[serde(rename = "storeUrl")]
    pub store_url: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: String,
}

pub struct ClientHandles {
    pub config: RemoteConfig,
    pub store: HttpStore,
}

/// Fetch `{base}/firebase-config` and initialize a store handle from it.
pub async fn init_client(base_url: &str) -> Result<ClientHandles, BootstrapError> {
    let url = format!("{}/firebase-config", base_url.trim_end_matches('/'));
    let config: RemoteConfig = reqwest::get(&url).await?.error_for_status()?.json().await?;

    let store_url = config
        .store_url
        .as_deref()
        .ok_or(BootstrapError::MissingStoreUrl)?;
    // The browser client authenticates per-user; the bootstrap handle
    // carries no server key.
    let store = HttpStore::new(store_url, None);

    info!(project_id = %config.project_id, "store client initialized");
    Ok(ClientHandles { config, store })
}
