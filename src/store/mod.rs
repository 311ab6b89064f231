//! # Document store
//!
//! Narrow interface over the external document database.
//!
//! The service only needs four primitives: an equality-filtered query over a
//! collection, a single-document read, a full-document set, and a field-level
//! merge. Everything else (retention, indexing, replication) belongs to the
//! store itself.
//!
//! Documents live under slash-joined paths alternating collection and
//! document segments, e.g. `courses/CS101/assistances/2024-05-01`. A path
//! with exactly two segments addresses a document in a top-level collection.
//!
//! ## Conditional writes
//!
//! `update_if_revision` is the compare-and-set variant of `update`: the merge
//! only applies if the document's revision still matches the one observed at
//! read time (`None` = "document must not exist yet"). Stores that cannot
//! honor the precondition return [`StoreError::Conflict`].

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("conditional write conflict at '{0}'")]
    Conflict(DocPath),

    #[error("{0}")]
    Other(String),
}

/// Slash-joined document path, alternating collection and document segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// One query hit: store-assigned id plus the document fields.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

/// A read document plus the revision tag needed for conditional writes.
/// `revision` is `None` when the backing store does not version documents.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data: Map<String, Value>,
    pub revision: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Equality-filtered query over a top-level collection, in the store's
    /// natural order, truncated to `limit` hits.
    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    /// Read one document; `None` when it does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<Snapshot>, StoreError>;

    /// Create or fully overwrite a document.
    async fn set(&self, path: &DocPath, data: Map<String, Value>) -> Result<(), StoreError>;

    /// Merge fields into an existing document, leaving other fields intact.
    async fn update(&self, path: &DocPath, data: Map<String, Value>) -> Result<(), StoreError>;

    /// Merge fields only if the document revision still matches `expected`
    /// (`None` = the document must not exist). Creates the document when
    /// `expected` is `None` and nothing is there.
    async fn update_if_revision(
        &self,
        path: &DocPath,
        data: Map<String, Value>,
        expected: Option<&str>,
    ) -> Result<(), StoreError>;
}
