//! In-memory document store.
//!
//! Used by the test suite and by local runs without a `STORE_URL`. Documents
//! live in a `BTreeMap` keyed by full path, so query results come back in a
//! stable lexicographic order (the "store natural order" the name lookup
//! relies on). Each document carries a bumped revision counter so the
//! conditional-write path behaves like a real versioned store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{DocPath, Document, DocumentStore, Snapshot, StoreError};

struct StoredDoc {
    data: Map<String, Value>,
    revision: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, StoredDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        let prefix = format!("{collection}/");

        let mut hits = Vec::new();
        for (path, doc) in docs.range(prefix.clone()..) {
            if hits.len() >= limit || !path.starts_with(&prefix) {
                break;
            }
            let id = &path[prefix.len()..];
            // only direct children of the collection
            if id.contains('/') {
                continue;
            }
            let matches = filters
                .iter()
                .all(|(field, value)| doc.data.get(*field).and_then(Value::as_str) == Some(*value));
            if matches {
                hits.push(Document {
                    id: id.to_string(),
                    data: doc.data.clone(),
                });
            }
        }
        Ok(hits)
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Snapshot>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.get(&path.to_string()).map(|doc| Snapshot {
            data: doc.data.clone(),
            revision: Some(doc.revision.to_string()),
        }))
    }

    async fn set(&self, path: &DocPath, data: Map<String, Value>) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let next_revision = docs
            .get(&path.to_string())
            .map(|doc| doc.revision + 1)
            .unwrap_or(1);
        docs.insert(
            path.to_string(),
            StoredDoc {
                data,
                revision: next_revision,
            },
        );
        Ok(())
    }

    async fn update(&self, path: &DocPath, data: Map<String, Value>) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(&path.to_string()) {
            Some(doc) => {
                merge(&mut doc.data, data);
                doc.revision += 1;
                Ok(())
            }
            None => Err(StoreError::Other(format!(
                "no document at '{path}' to update"
            ))),
        }
    }

    async fn update_if_revision(
        &self,
        path: &DocPath,
        data: Map<String, Value>,
        expected: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let current = docs.get_mut(&path.to_string());
        match (current, expected) {
            (Some(doc), Some(rev)) if doc.revision.to_string() == rev => {
                merge(&mut doc.data, data);
                doc.revision += 1;
                Ok(())
            }
            (None, None) => {
                docs.insert(path.to_string(), StoredDoc { data, revision: 1 });
                Ok(())
            }
            _ => Err(StoreError::Conflict(path.clone())),
        }
    }
}
