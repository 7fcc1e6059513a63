//! Core types and traits for docsift.
//!
//! This crate defines the shared vocabulary of the docsift pipeline:
//! crawled pages, content-addressed chunks, the crawl outcome counters,
//! the collaborator traits the pipeline is wired together with, and the
//! error taxonomy.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{ChunkSettings, CrawlerSettings, Settings, SourceKind, StoreBackend};
pub use error::{ChunkError, ConfigError, EmbedError, Error, FetchError, Result, StoreError};
pub use traits::{
    ContentExtractor, Embedder, LinkFetcher, PageSink, PdfExtractor, SitemapFetcher, VectorStore,
};
pub use types::{
    content_digest, normalize_url, CrawlOutcome, CrawlReport, CrawledPage, DocumentChunk,
    Extraction, PageKind, Sitemap,
};
