//! One-shot sync pipeline: source → coordinator → cleanup.

use std::sync::Arc;

use tracing::info;

use docsift_core::{
    normalize_url, ConfigError, ContentExtractor, CrawlOutcome, Embedder, LinkFetcher, PdfExtractor,
    Result, Settings, SitemapFetcher, SourceKind, VectorStore,
};
use docsift_crawler::{CrawlScheduler, LocalSource};

use crate::coordinator::SyncCoordinator;

/// Per-run options.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub product_name: String,
    pub version: String,
    pub settings: Settings,
}

/// External collaborators a sync needs. Web sources use the first three;
/// local sources use the PDF extractor.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn ContentExtractor>,
    pub links: Arc<dyn LinkFetcher>,
    pub sitemaps: Arc<dyn SitemapFetcher>,
    pub pdf: Arc<dyn PdfExtractor>,
}

/// What one sync run did.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub outcome: CrawlOutcome,
    /// Chunks removed by the end-of-run stale cleanup.
    pub deleted_count: u64,
    /// True when network errors suppressed the cleanup.
    pub cleanup_skipped: bool,
}

/// Run one full sync of `source` into `store`.
///
/// Validates configuration, initializes the store, detects whether this is
/// the first sync (forcing full processing if so), runs the source, and
/// finishes with the stale cleanup.
pub async fn run_sync(
    source: &SourceKind,
    opts: &SyncOptions,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collaborators: Collaborators,
) -> Result<SyncSummary> {
    opts.settings.validate()?;
    store.init().await?;

    let coordinator = SyncCoordinator::new(
        store,
        embedder,
        &opts.settings.chunking,
        &opts.product_name,
        &opts.version,
    );
    let force = coordinator.is_first_sync().await?;
    if force {
        info!(product = %opts.product_name, "store is empty, forcing full processing");
    }

    let (report, prefix) = match source {
        SourceKind::Web {
            base_url,
            sitemap_url,
        } => {
            let scheduler = CrawlScheduler::new(
                base_url,
                sitemap_url.clone(),
                collaborators.extractor,
                collaborators.links,
                collaborators.sitemaps,
            )?;
            let report = scheduler.crawl(&coordinator, force).await?;
            (report, normalize_url(base_url)?)
        }
        SourceKind::LocalDirectory {
            path,
            recursive,
            include_extensions,
            exclude_extensions,
        } => {
            let local = LocalSource::new(
                path,
                *recursive,
                include_extensions,
                exclude_extensions,
                &opts.settings.crawler,
                collaborators.pdf,
            );
            let report = local.run(&coordinator).await?;
            let root = tokio::fs::canonicalize(path).await?;
            let prefix = url::Url::from_directory_path(&root)
                .map_err(|()| {
                    docsift_core::Error::from(ConfigError::InvalidValue(format!(
                        "directory has no file url: {}",
                        root.display()
                    )))
                })?
                .to_string();
            (report, prefix)
        }
        SourceKind::Repository { url } => {
            return Err(ConfigError::UnsupportedSource(format!(
                "repository sources are not implemented: {url}"
            ))
            .into());
        }
    };

    let cleanup_skipped = report.outcome.has_network_errors;
    let deleted_count = coordinator.cleanup(&prefix, &report).await?;

    info!(
        processed = report.outcome.processed_count,
        errors = report.outcome.error_count,
        deleted = deleted_count,
        cleanup_skipped,
        "sync finished"
    );
    Ok(SyncSummary {
        outcome: report.outcome,
        deleted_count,
        cleanup_skipped,
    })
}
