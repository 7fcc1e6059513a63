//! Collaborator traits for the docsift pipeline.
//!
//! Fetching, PDF conversion, embedding, and persistence are all external
//! collaborators behind async trait objects; the crawler and the sync
//! coordinator are wired together through these seams. Tests inject
//! hand-rolled mocks.

use async_trait::async_trait;

use crate::error::{EmbedError, FetchError, Result, StoreError};
use crate::types::{CrawledPage, DocumentChunk, Extraction, Sitemap};

/// Fetches a page and converts it to markdown (or raw source for code).
///
/// `force` suppresses any upstream "unchanged" short-circuit; the pipeline
/// sets it on the first sync so an empty store is always fully populated.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str, force: bool) -> std::result::Result<Extraction, FetchError>;
}

/// Converts raw PDF bytes to markdown.
///
/// Multi-page documents are rendered with `## Page N` headings so the
/// markdown chunker's section handling applies unchanged.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    async fn extract_pdf(&self, bytes: &[u8]) -> std::result::Result<String, FetchError>;
}

/// Fetches and parses a sitemap into page URLs and nested sitemap URLs.
#[async_trait]
pub trait SitemapFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<Sitemap, FetchError>;
}

/// Discovers outbound links on a page. Independent of content extraction;
/// the scheduler calls this separately for non-PDF pages.
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    async fn links(&self, url: &str) -> std::result::Result<Vec<String>, FetchError>;
}

/// Receives crawled pages and missing-page notices, in crawl order.
///
/// Implemented by the sync coordinator; the crawler never touches the store
/// itself.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// A page was fetched and converted.
    async fn page(&self, page: CrawledPage) -> Result<()>;

    /// The page no longer exists upstream.
    async fn missing(&self, url: &str) -> Result<()>;
}

/// Produces embedding vectors for batches of chunk texts.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;

    /// Dimensionality of the produced vectors.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts. Returns one vector per input, in order.
    async fn embed(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbedError>;
}

/// Persistence backend for chunks. All mutations go through the sync
/// coordinator.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Prepare the store for use (create tables, open files, ...).
    async fn init(&self) -> std::result::Result<(), StoreError>;

    /// Insert or replace chunks, keyed by `chunk_id`.
    async fn upsert_chunks(&self, chunks: &[DocumentChunk])
        -> std::result::Result<(), StoreError>;

    /// Content hash stored for `chunk_id`, if the chunk exists.
    async fn stored_hash(&self, chunk_id: &str)
        -> std::result::Result<Option<String>, StoreError>;

    /// Distinct URLs of stored chunks whose URL starts with `prefix`.
    async fn list_urls(&self, prefix: &str) -> std::result::Result<Vec<String>, StoreError>;

    /// Delete every chunk stored under `url`. Returns the number removed.
    async fn delete_by_url(&self, url: &str) -> std::result::Result<u64, StoreError>;

    /// Delete a single chunk by id. Deleting a missing id is not an error.
    async fn delete_chunk(&self, chunk_id: &str) -> std::result::Result<(), StoreError>;

    /// Total number of stored chunks. Zero means this is the first sync.
    async fn count_all(&self) -> std::result::Result<u64, StoreError>;
}
