//! In-memory document store.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{Document, DocumentStore, ErrorCode, Fields, StoreError, StoreResult};

// == Memory Store ==
/// Process-local [`DocumentStore`].
///
/// Failures queued with [`MemoryStore::inject_failure`] are returned by the
/// next calls, in order, before any real work is done.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    failures: Mutex<VecDeque<StoreError>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call fail with `code`.
    pub async fn inject_failure(&self, code: ErrorCode) {
        self.inject_failures(code, 1).await;
    }

    /// Makes the next `count` calls fail with `code`.
    pub async fn inject_failures(&self, code: ErrorCode, count: usize) {
        let mut failures = self.failures.lock().await;
        for _ in 0..count {
            failures.push_back(StoreError::new(code, "injected failure"));
        }
    }

    /// Total number of calls made, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self, op: &str, collection: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().await.pop_front() {
            Some(err) => {
                debug!(op, collection, code = %err.code, "Injected store failure");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_doc(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.begin_call("get_doc", collection).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn list_docs(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.begin_call("list_docs", collection).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_doc(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document> {
        self.begin_call("set_doc", collection).await?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data.clone());
        Ok(Document::new(id, data))
    }

    async fn update_doc(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> StoreResult<Document> {
        self.begin_call("update_doc", collection).await?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| {
                StoreError::new(
                    ErrorCode::NotFound,
                    format!("No document to update: {}/{}", collection, id),
                )
            })?;

        existing.extend(patch);
        Ok(Document::new(id, existing.clone()))
    }
}
