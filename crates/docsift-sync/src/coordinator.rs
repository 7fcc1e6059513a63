//! The sync coordinator: the only component that mutates the store.
//!
//! Pages arrive from a content source through the [`PageSink`] trait. Each
//! page is chunked (markdown or code, by page kind), each chunk's content
//! hash is compared against the stored copy, and only new or changed chunks
//! are embedded and upserted. Missing pages are deleted immediately; stale
//! pages are deleted at the end of the run unless network errors made the
//! visited set unreliable.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use docsift_chunker::{ChunkContext, CodeChunker, MarkdownChunker};
use docsift_core::{
    ChunkSettings, CrawlReport, CrawledPage, DocumentChunk, EmbedError, Embedder, PageKind,
    PageSink, Result, VectorStore,
};

pub struct SyncCoordinator {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    markdown: MarkdownChunker,
    code: CodeChunker,
    product_name: String,
    version: String,
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &ChunkSettings,
        product_name: &str,
        version: &str,
    ) -> Self {
        Self {
            store,
            embedder,
            markdown: MarkdownChunker::new(settings),
            code: CodeChunker::new(settings),
            product_name: product_name.to_string(),
            version: version.to_string(),
        }
    }

    /// True when the store holds nothing yet. The pipeline checks this once
    /// before crawling and forces processing for the whole run, overriding
    /// any upstream "unchanged" signal.
    pub async fn is_first_sync(&self) -> Result<bool> {
        Ok(self.store.count_all().await? == 0)
    }

    /// Embed and upsert the chunks whose stored hash differs (or which are
    /// not stored at all). Unchanged chunks cost one store lookup and
    /// nothing else.
    async fn upsert_changed(&self, chunks: Vec<DocumentChunk>) -> Result<()> {
        let total = chunks.len();
        let mut pending = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match self.store.stored_hash(&chunk.chunk_id).await? {
                Some(stored) if stored == chunk.content_hash => {
                    debug!(chunk_id = %chunk.chunk_id, "chunk unchanged, skipping");
                }
                _ => pending.push(chunk),
            }
        }
        if pending.is_empty() {
            debug!(total, "all chunks unchanged");
            return Ok(());
        }

        let texts: Vec<&str> = pending.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embedder.embed(&texts).await.map_err(|e| {
            warn!(error = %e, "embedding failed");
            e
        })?;
        if vectors.len() != pending.len() {
            return Err(EmbedError::Inference(format!(
                "expected {} vectors, got {}",
                pending.len(),
                vectors.len()
            ))
            .into());
        }

        let now = Utc::now();
        for (chunk, vector) in pending.iter_mut().zip(vectors) {
            chunk.embedding = Some(vector);
            chunk.indexed_at = Some(now);
        }
        self.store.upsert_chunks(&pending).await?;
        debug!(upserted = pending.len(), total, "upserted changed chunks");
        Ok(())
    }

    /// End-of-run cleanup: delete every stored URL under `prefix` the run
    /// did not visit. Skipped entirely when the crawl hit network failures,
    /// since an unreachable page is not a removed page.
    pub async fn cleanup(&self, prefix: &str, report: &CrawlReport) -> Result<u64> {
        if report.outcome.has_network_errors {
            warn!(prefix, "network errors during crawl, keeping stale chunks");
            return Ok(0);
        }
        let stored = self.store.list_urls(prefix).await?;
        let mut deleted = 0u64;
        for url in stored {
            if !report.visited.contains(&url) {
                let removed = self.store.delete_by_url(&url).await?;
                info!(%url, removed, "deleted stale page");
                deleted += removed;
            }
        }
        info!(prefix, deleted, "stale cleanup finished");
        Ok(deleted)
    }
}

#[async_trait]
impl PageSink for SyncCoordinator {
    async fn page(&self, page: CrawledPage) -> Result<()> {
        let ctx = ChunkContext {
            url: page.url.clone(),
            product_name: self.product_name.clone(),
            version: self.version.clone(),
        };
        let chunks = match &page.kind {
            PageKind::Code { language } => self.code.chunk(&page.content, language, &ctx)?,
            PageKind::Markdown | PageKind::Pdf => self.markdown.chunk(&page.content, &ctx),
        };
        self.upsert_changed(chunks).await
    }

    async fn missing(&self, url: &str) -> Result<()> {
        let removed = self.store.delete_by_url(url).await?;
        info!(%url, removed, "page gone upstream, deleted its chunks");
        Ok(())
    }
}
