//! In-memory vector store, for tests and development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use docsift_core::{DocumentChunk, StoreError, VectorStore};

/// Keeps chunks in a `HashMap` keyed by chunk id. Cheap to clone; clones
/// share the underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    chunks: Arc<RwLock<HashMap<String, DocumentChunk>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored chunk by id. Handy for inspection in tests.
    pub async fn get(&self, chunk_id: &str) -> Option<DocumentChunk> {
        self.chunks.read().await.get(chunk_id).cloned()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), StoreError> {
        let mut map = self.chunks.write().await;
        for chunk in chunks {
            map.insert(chunk.chunk_id.clone(), chunk.clone());
        }
        debug!(count = chunks.len(), total = map.len(), "upserted chunks");
        Ok(())
    }

    async fn stored_hash(&self, chunk_id: &str) -> Result<Option<String>, StoreError> {
        let map = self.chunks.read().await;
        Ok(map.get(chunk_id).map(|c| c.content_hash.clone()))
    }

    async fn list_urls(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let map = self.chunks.read().await;
        let mut urls: Vec<String> = map
            .values()
            .filter(|c| c.url.starts_with(prefix))
            .map(|c| c.url.clone())
            .collect();
        urls.sort();
        urls.dedup();
        Ok(urls)
    }

    async fn delete_by_url(&self, url: &str) -> Result<u64, StoreError> {
        let mut map = self.chunks.write().await;
        let before = map.len();
        map.retain(|_, c| c.url != url);
        let removed = (before - map.len()) as u64;
        debug!(%url, removed, "deleted chunks by url");
        Ok(removed)
    }

    async fn delete_chunk(&self, chunk_id: &str) -> Result<(), StoreError> {
        let mut map = self.chunks.write().await;
        if map.remove(chunk_id).is_some() {
            debug!(chunk_id, "deleted chunk");
        }
        Ok(())
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.chunks.read().await.len() as u64)
    }
}
