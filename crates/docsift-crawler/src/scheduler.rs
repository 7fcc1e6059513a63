//! Breadth-first crawl scheduling.
//!
//! The scheduler owns a FIFO queue and a visited set of normalized URLs.
//! It never fetches a URL twice in one run and never retries a failed URL;
//! failures are logged, counted, and classified for cleanup gating. Content
//! extraction, link discovery, and sitemap fetching are injected
//! collaborators.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};

use docsift_core::{
    normalize_url, ContentExtractor, CrawlOutcome, CrawlReport, CrawledPage, Extraction,
    LinkFetcher, PageKind, PageSink, Result, SitemapFetcher,
};

/// Crawls a site from a base URL, staying under the base's URL prefix.
pub struct CrawlScheduler {
    base_url: String,
    sitemap_url: Option<String>,
    extractor: Arc<dyn ContentExtractor>,
    links: Arc<dyn LinkFetcher>,
    sitemaps: Arc<dyn SitemapFetcher>,
}

impl CrawlScheduler {
    /// Build a scheduler. Fails with a [`ConfigError`] when the base URL does
    /// not parse.
    pub fn new(
        base_url: &str,
        sitemap_url: Option<String>,
        extractor: Arc<dyn ContentExtractor>,
        links: Arc<dyn LinkFetcher>,
        sitemaps: Arc<dyn SitemapFetcher>,
    ) -> Result<Self> {
        let base_url = normalize_url(base_url)?;
        Ok(Self {
            base_url,
            sitemap_url,
            extractor,
            links,
            sitemaps,
        })
    }

    /// Run the crawl. `force` is forwarded to the content extractor to
    /// suppress upstream "unchanged" short-circuits (set on the first sync).
    ///
    /// Per-URL failures never abort the run; the returned report carries the
    /// counters and the set of URLs actually visited.
    pub async fn crawl(&self, sink: &dyn PageSink, force: bool) -> Result<CrawlReport> {
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut outcome = CrawlOutcome::default();

        queue.push_back(self.base_url.clone());
        queued.insert(self.base_url.clone());

        if let Some(sitemap) = &self.sitemap_url {
            self.expand_sitemap(sitemap, &mut queue, &mut queued, &mut outcome)
                .await;
        }

        info!(base_url = %self.base_url, seeded = queue.len(), force, "starting crawl");

        while let Some(url) = queue.pop_front() {
            if visited.contains(&url) {
                continue;
            }
            if !has_supported_extension(&url) {
                debug!(%url, "skipping unsupported extension");
                outcome.skipped_extension_count += 1;
                continue;
            }
            visited.insert(url.clone());

            let page_exists = self.process_url(&url, sink, force, &mut outcome).await;

            if page_exists && !is_pdf_url(&url) {
                self.discover_links(&url, &mut queue, &mut queued, &visited, &mut outcome)
                    .await;
            }
        }

        info!(
            processed = outcome.processed_count,
            errors = outcome.error_count,
            network_errors = outcome.has_network_errors,
            visited = visited.len(),
            "crawl finished"
        );
        Ok(CrawlReport { outcome, visited })
    }

    /// Fetch and forward one URL. Returns whether the page exists upstream
    /// (which decides whether link discovery is worthwhile).
    async fn process_url(
        &self,
        url: &str,
        sink: &dyn PageSink,
        force: bool,
        outcome: &mut CrawlOutcome,
    ) -> bool {
        match self.extractor.extract(url, force).await {
            Ok(Extraction::Content { markdown, kind }) => {
                let is_pdf = kind == PageKind::Pdf;
                let page = CrawledPage {
                    url: url.to_string(),
                    content: markdown,
                    kind,
                };
                match sink.page(page).await {
                    Ok(()) => {
                        outcome.processed_count += 1;
                        if is_pdf {
                            outcome.pdf_processed_count += 1;
                        }
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "page sink failed");
                        outcome.record_failure(e.is_network());
                    }
                }
                true
            }
            Ok(Extraction::Unchanged) => {
                debug!(%url, "unchanged upstream, skipping");
                true
            }
            Ok(Extraction::SizeExceeded) => {
                debug!(%url, "skipping oversized page");
                outcome.skipped_size_count += 1;
                true
            }
            Ok(Extraction::NotFound) => {
                info!(%url, "page gone upstream, notifying sink");
                if let Err(e) = sink.missing(url).await {
                    warn!(%url, error = %e, "missing-page handling failed");
                    outcome.record_failure(e.is_network());
                }
                false
            }
            Err(e) => {
                let network = e.is_network();
                warn!(%url, error = %e, network, "fetch failed");
                outcome.record_failure(network);
                false
            }
        }
    }

    /// Second, independent fetch to discover outbound links. New in-scope
    /// URLs join the back of the queue.
    async fn discover_links(
        &self,
        url: &str,
        queue: &mut VecDeque<String>,
        queued: &mut HashSet<String>,
        visited: &HashSet<String>,
        outcome: &mut CrawlOutcome,
    ) {
        let found = match self.links.links(url).await {
            Ok(found) => found,
            Err(e) => {
                let network = e.is_network();
                warn!(%url, error = %e, network, "link discovery failed");
                outcome.record_failure(network);
                return;
            }
        };
        for raw in found {
            let Ok(candidate) = normalize_url(&raw) else {
                debug!(link = %raw, "ignoring unparseable link");
                continue;
            };
            if !candidate.starts_with(&self.base_url) {
                continue;
            }
            if visited.contains(&candidate) || !queued.insert(candidate.clone()) {
                continue;
            }
            queue.push_back(candidate);
        }
    }

    /// Depth-first sitemap expansion. Each sitemap URL is fetched at most
    /// once per run, so self-referencing or mutually-referencing sitemaps
    /// terminate.
    async fn expand_sitemap(
        &self,
        root: &str,
        queue: &mut VecDeque<String>,
        queued: &mut HashSet<String>,
        outcome: &mut CrawlOutcome,
    ) {
        let mut stack = vec![root.to_string()];
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(sitemap_url) = stack.pop() {
            if !seen.insert(sitemap_url.clone()) {
                debug!(%sitemap_url, "sitemap already expanded, skipping");
                continue;
            }
            match self.sitemaps.fetch(&sitemap_url).await {
                Ok(sitemap) => {
                    for nested in sitemap.nested.into_iter().rev() {
                        stack.push(nested);
                    }
                    for page in sitemap.pages {
                        let Ok(candidate) = normalize_url(&page) else {
                            debug!(link = %page, "ignoring unparseable sitemap entry");
                            continue;
                        };
                        if candidate.starts_with(&self.base_url) && queued.insert(candidate.clone())
                        {
                            queue.push_back(candidate);
                        }
                    }
                }
                Err(e) => {
                    let network = e.is_network();
                    warn!(%sitemap_url, error = %e, network, "sitemap fetch failed");
                    outcome.record_failure(network);
                }
            }
        }
    }
}

/// Extension filter applied before any fetch. Pages with no extension,
/// `.html`, `.htm`, or `.pdf` pass; everything else is skipped.
fn has_supported_extension(url: &str) -> bool {
    match path_extension(url) {
        None => true,
        Some(ext) => matches!(ext.as_str(), "html" | "htm" | "pdf"),
    }
}

fn is_pdf_url(url: &str) -> bool {
    path_extension(url).as_deref() == Some("pdf")
}

/// Lowercased extension of the final path segment, if any.
fn path_extension(url: &str) -> Option<String> {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let segment = path.rsplit('/').next().unwrap_or("");
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}
