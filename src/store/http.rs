//! HTTP client for the remote document store.
//!
//! Speaks a plain-JSON document REST dialect (the shape the store emulator
//! exposes): `GET`/`PUT`/`PATCH` on `{base}/{path}` for single documents and
//! `POST {base}/{collection}:query` for equality-filtered lookups. Document
//! revisions ride on the `ETag` response header; conditional merges send
//! `If-Match` (or `If-None-Match: *` for create-if-absent) and a `412`
//! comes back as [`StoreError::Conflict`].

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{ETAG, IF_MATCH, IF_NONE_MATCH},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{DocPath, Document, DocumentStore, Snapshot, StoreError};

pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct QueryHit {
    id: String,
    data: Map<String, Value>,
}

impl HttpStore {
    /// `base_url` should be like `http://localhost:4000` (no trailing slash).
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn doc_url(&self, path: &DocPath) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn error_for(resp: reqwest::Response) -> StoreError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        StoreError::Server { status, body }
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/{collection}:query", self.base_url);
        let filter_map: Map<String, Value> = filters
            .iter()
            .map(|(field, value)| (field.to_string(), Value::String(value.to_string())))
            .collect();

        debug!(%url, ?filters, limit, "querying collection");
        let resp = self
            .request(self.client.post(&url))
            .json(&json!({ "filters": filter_map, "limit": limit }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }

        let hits: Vec<QueryHit> = resp.json().await?;
        Ok(hits
            .into_iter()
            .map(|hit| Document {
                id: hit.id,
                data: hit.data,
            })
            .collect())
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Snapshot>, StoreError> {
        let url = self.doc_url(path);
        debug!(%url, "reading document");

        let resp = self.request(self.client.get(&url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }

        let revision = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());
        let data: Map<String, Value> = resp.json().await?;
        Ok(Some(Snapshot { data, revision }))
    }

    async fn set(&self, path: &DocPath, data: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.doc_url(path);
        debug!(%url, "writing document");

        let resp = self.request(self.client.put(&url)).json(&data).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        Ok(())
    }

    async fn update(&self, path: &DocPath, data: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.doc_url(path);
        debug!(%url, "merging fields");

        let resp = self
            .request(self.client.patch(&url))
            .json(&data)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        Ok(())
    }

    async fn update_if_revision(
        &self,
        path: &DocPath,
        data: Map<String, Value>,
        expected: Option<&str>,
    ) -> Result<(), StoreError> {
        let url = self.doc_url(path);
        debug!(%url, ?expected, "conditional merge");

        let builder = self.request(self.client.patch(&url)).json(&data);
        let builder = match expected {
            Some(rev) => builder.header(IF_MATCH, format!("\"{rev}\"")),
            None => builder.header(IF_NONE_MATCH, "*"),
        };

        let resp = builder.send().await?;
        if resp.status() == StatusCode::PRECONDITION_FAILED {
            return Err(StoreError::Conflict(path.clone()));
        }
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        Ok(())
    }
}
