//! Core data types for the docsift pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ConfigError, Error, Result};

// ============================================================================
// Content identity
// ============================================================================

/// Hex digest of `text`, used for both chunk ids and change detection.
///
/// The digest is a pure function of the content: the same text yields the
/// same id on every run and every machine, which is what makes per-chunk
/// change detection possible without any coordination.
#[must_use]
pub fn content_digest(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Normalize a URL for identity purposes: parse it, then strip the fragment
/// and the query string. Two URLs that differ only in fragment or query are
/// the same page.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut url = url::Url::parse(raw)
        .map_err(|e| Error::Config(ConfigError::InvalidValue(format!("invalid url {raw}: {e}"))))?;
    url.set_fragment(None);
    url.set_query(None);
    Ok(url.to_string())
}

// ============================================================================
// Chunks
// ============================================================================

/// A bounded piece of text ready for embedding and storage.
///
/// `chunk_id` and `content_hash` are both the blake3 hex digest of `content`.
/// They are kept as separate fields because they answer different questions:
/// the id locates a chunk in the store, the hash is compared against the
/// stored copy to decide whether re-embedding is needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// Deterministic content-addressed identifier.
    pub chunk_id: String,
    /// The chunk text itself.
    pub content: String,
    /// Digest of `content`, equal to `chunk_id` by construction.
    pub content_hash: String,
    /// Product this chunk belongs to (e.g. a documentation set name).
    pub product_name: String,
    /// Version of the product the content was taken from.
    pub version: String,
    /// Stack of heading texts from the document root down to this chunk.
    /// Empty for content that appeared before any heading.
    pub heading_hierarchy: Vec<String>,
    /// Deepest non-empty heading, or `"Introduction"` when there is none.
    pub section: String,
    /// Source URL (or `file://` URL for local content).
    pub url: String,
    /// Embedding vector, populated by the sync coordinator before upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// When this chunk was last written to the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

impl DocumentChunk {
    /// Build a chunk from its content and provenance, computing the
    /// content-addressed identity fields.
    #[must_use]
    pub fn new(
        content: String,
        url: &str,
        product_name: &str,
        version: &str,
        heading_hierarchy: Vec<String>,
    ) -> Self {
        let digest = content_digest(&content);
        let section = heading_hierarchy
            .iter()
            .rev()
            .find(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| "Introduction".to_string());
        Self {
            chunk_id: digest.clone(),
            content,
            content_hash: digest,
            product_name: product_name.to_string(),
            version: version.to_string(),
            heading_hierarchy,
            section,
            url: url.to_string(),
            embedding: None,
            indexed_at: None,
        }
    }
}

// ============================================================================
// Crawled pages
// ============================================================================

/// What kind of content a page carries, which decides the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageKind {
    /// Prose markdown (including markdown converted from HTML).
    Markdown,
    /// Markdown converted from a PDF, with `## Page N` section headings.
    Pdf,
    /// Source code in the named language.
    Code { language: String },
}

/// A page the crawler fetched and converted, ready for chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    /// Normalized URL the content came from.
    pub url: String,
    /// The converted markdown (or raw source for code pages).
    pub content: String,
    pub kind: PageKind,
}

/// Result of asking the content extractor for a page.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Converted content, ready for the page sink.
    Content { markdown: String, kind: PageKind },
    /// The upstream reports the page has not changed since the last run.
    /// Suppressed when the run forces processing (first sync).
    Unchanged,
    /// The page exceeded the configured size limit and was skipped.
    SizeExceeded,
    /// The page no longer exists upstream.
    NotFound,
}

/// A parsed sitemap: leaf page URLs plus nested sitemap URLs.
#[derive(Debug, Clone, Default)]
pub struct Sitemap {
    pub pages: Vec<String>,
    pub nested: Vec<String>,
}

// ============================================================================
// Crawl outcome
// ============================================================================

/// Counters accumulated over a crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    /// Pages whose content reached the page sink.
    pub processed_count: u64,
    /// URLs rejected by the extension filter before any fetch.
    pub skipped_extension_count: u64,
    /// Pages skipped by the size policy.
    pub skipped_size_count: u64,
    /// PDF pages successfully converted and processed.
    pub pdf_processed_count: u64,
    /// Per-item failures of any kind.
    pub error_count: u64,
    /// True once any failure was classified as a network failure.
    /// Gates the end-of-run stale cleanup.
    pub has_network_errors: bool,
}

impl CrawlOutcome {
    /// Count a per-item failure, classifying it for cleanup gating.
    pub fn record_failure(&mut self, network: bool) {
        self.error_count += 1;
        if network {
            self.has_network_errors = true;
        }
    }
}

/// What a source run hands back: the counters plus the set of URLs that were
/// actually visited, which the end-of-run cleanup diffs against the store.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub visited: HashSet<String>,
}
