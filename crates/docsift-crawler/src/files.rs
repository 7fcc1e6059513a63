//! Local-directory content source.
//!
//! Walks a directory tree (optionally recursively), filters files by the
//! configured extension lists, applies the same size policy as the web
//! crawler, and feeds the resulting pages to a [`PageSink`]. Files get
//! stable `file://` URLs so chunk identity and cleanup work exactly as for
//! crawled pages. Local runs never produce network failures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use docsift_core::{
    CrawlOutcome, CrawlReport, CrawledPage, CrawlerSettings, PageKind, PageSink, PdfExtractor,
    Result,
};

/// Ingests files from a local directory.
pub struct LocalSource {
    root: PathBuf,
    recursive: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    max_content_bytes: u64,
    pdf: Arc<dyn PdfExtractor>,
}

impl LocalSource {
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        recursive: bool,
        include_extensions: &[String],
        exclude_extensions: &[String],
        settings: &CrawlerSettings,
        pdf: Arc<dyn PdfExtractor>,
    ) -> Self {
        Self {
            root: path.into(),
            recursive,
            include: include_extensions.iter().map(|e| e.to_lowercase()).collect(),
            exclude: exclude_extensions.iter().map(|e| e.to_lowercase()).collect(),
            max_content_bytes: settings.max_content_bytes,
            pdf,
        }
    }

    /// Walk the directory and feed every accepted file to the sink.
    /// Per-file failures are logged and counted, never fatal; only a missing
    /// or unreadable root aborts the run.
    pub async fn run(&self, sink: &dyn PageSink) -> Result<CrawlReport> {
        let root = tokio::fs::canonicalize(&self.root).await?;
        let mut outcome = CrawlOutcome::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut dirs = vec![root.clone()];

        info!(root = %root.display(), recursive = self.recursive, "scanning directory");

        while let Some(dir) = dirs.pop() {
            let mut reader = match tokio::fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "cannot read directory");
                    outcome.record_failure(false);
                    continue;
                }
            };
            let mut entries = Vec::new();
            loop {
                match reader.next_entry().await {
                    Ok(Some(entry)) => entries.push(entry.path()),
                    Ok(None) => break,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "directory entry error");
                        outcome.record_failure(false);
                        break;
                    }
                }
            }
            entries.sort();

            for path in entries {
                let meta = match tokio::fs::metadata(&path).await {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "cannot stat file");
                        outcome.record_failure(false);
                        continue;
                    }
                };
                if meta.is_dir() {
                    if self.recursive {
                        dirs.push(path);
                    }
                    continue;
                }
                self.process_file(&path, meta.len(), sink, &mut outcome, &mut visited)
                    .await;
            }
        }

        info!(
            processed = outcome.processed_count,
            errors = outcome.error_count,
            "directory scan finished"
        );
        Ok(CrawlReport { outcome, visited })
    }

    async fn process_file(
        &self,
        path: &Path,
        len: u64,
        sink: &dyn PageSink,
        outcome: &mut CrawlOutcome,
        visited: &mut HashSet<String>,
    ) {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        // Exclusion wins over inclusion; an empty include list accepts all.
        if self.exclude.contains(&ext)
            || (!self.include.is_empty() && !self.include.contains(&ext))
        {
            debug!(path = %path.display(), "skipping filtered extension");
            outcome.skipped_extension_count += 1;
            return;
        }
        let Some(kind) = kind_for_extension(&ext) else {
            debug!(path = %path.display(), "skipping unrecognized extension");
            outcome.skipped_extension_count += 1;
            return;
        };

        let Ok(url) = url::Url::from_file_path(path) else {
            warn!(path = %path.display(), "path has no file url");
            outcome.record_failure(false);
            return;
        };
        let url = url.to_string();
        visited.insert(url.clone());

        if len > self.max_content_bytes {
            debug!(%url, len, "skipping oversized file");
            outcome.skipped_size_count += 1;
            return;
        }

        let is_pdf = kind == PageKind::Pdf;
        let content = if is_pdf {
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%url, error = %e, "cannot read file");
                    outcome.record_failure(false);
                    return;
                }
            };
            match self.pdf.extract_pdf(&bytes).await {
                Ok(markdown) => markdown,
                Err(e) => {
                    warn!(%url, error = %e, "pdf conversion failed");
                    outcome.record_failure(false);
                    return;
                }
            }
        } else {
            match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(%url, error = %e, "cannot read file");
                    outcome.record_failure(false);
                    return;
                }
            }
        };

        match sink
            .page(CrawledPage {
                url: url.clone(),
                content,
                kind,
            })
            .await
        {
            Ok(()) => {
                outcome.processed_count += 1;
                if is_pdf {
                    outcome.pdf_processed_count += 1;
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "page sink failed");
                outcome.record_failure(false);
            }
        }
    }
}

/// Map a file extension to a page kind. `None` means the file type is not
/// ingestible.
fn kind_for_extension(ext: &str) -> Option<PageKind> {
    let code = |language: &str| {
        Some(PageKind::Code {
            language: language.to_string(),
        })
    };
    match ext {
        "" | "md" | "markdown" | "txt" | "text" | "html" | "htm" => Some(PageKind::Markdown),
        "pdf" => Some(PageKind::Pdf),
        "rs" => code("rust"),
        "py" => code("python"),
        "js" | "jsx" | "mjs" | "cjs" => code("javascript"),
        "ts" => code("typescript"),
        "tsx" => code("tsx"),
        "go" => code("go"),
        "java" => code("java"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsift_core::FetchError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct StubPdf;

    #[async_trait]
    impl PdfExtractor for StubPdf {
        async fn extract_pdf(&self, _bytes: &[u8]) -> std::result::Result<String, FetchError> {
            Ok("## Page 1\nconverted pdf text".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        pages: Mutex<Vec<CrawledPage>>,
    }

    #[async_trait]
    impl PageSink for RecordingSink {
        async fn page(&self, page: CrawledPage) -> Result<()> {
            self.pages.lock().unwrap().push(page);
            Ok(())
        }

        async fn missing(&self, _url: &str) -> Result<()> {
            Ok(())
        }
    }

    fn source(dir: &TempDir, recursive: bool, include: &[&str], exclude: &[&str]) -> LocalSource {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        LocalSource::new(
            dir.path(),
            recursive,
            &include,
            &exclude,
            &CrawlerSettings::default(),
            Arc::new(StubPdf),
        )
    }

    #[tokio::test]
    async fn walks_recursively_and_classifies_kinds() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.md"), "# Title\nbody").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        let sink = RecordingSink::default();

        let report = source(&dir, true, &[], &[]).run(&sink).await.unwrap();

        assert_eq!(report.outcome.processed_count, 2);
        assert!(!report.outcome.has_network_errors);
        let pages = sink.pages.lock().unwrap();
        let md = pages.iter().find(|p| p.url.ends_with("readme.md")).unwrap();
        assert_eq!(md.kind, PageKind::Markdown);
        assert!(md.url.starts_with("file://"));
        let rs = pages.iter().find(|p| p.url.ends_with("main.rs")).unwrap();
        assert_eq!(
            rs.kind,
            PageKind::Code {
                language: "rust".to_string()
            }
        );
        assert_eq!(report.visited.len(), 2);
    }

    #[tokio::test]
    async fn non_recursive_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("top.md"), "top").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/deep.md"), "deep").unwrap();
        let sink = RecordingSink::default();

        let report = source(&dir, false, &[], &[]).run(&sink).await.unwrap();

        assert_eq!(report.outcome.processed_count, 1);
        assert!(sink.pages.lock().unwrap()[0].url.ends_with("top.md"));
    }

    #[tokio::test]
    async fn include_and_exclude_filters_apply() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("keep.md"), "keep").unwrap();
        std::fs::write(dir.path().join("drop.rs"), "fn f() {}").unwrap();
        std::fs::write(dir.path().join("also.md"), "also").unwrap();
        let sink = RecordingSink::default();

        let report = source(&dir, false, &["md"], &[]).run(&sink).await.unwrap();
        assert_eq!(report.outcome.processed_count, 2);
        assert_eq!(report.outcome.skipped_extension_count, 1);

        // Exclusion wins when both lists name the extension.
        let sink = RecordingSink::default();
        let report = source(&dir, false, &["md", "rs"], &["rs"])
            .run(&sink)
            .await
            .unwrap();
        assert_eq!(report.outcome.processed_count, 2);
        assert_eq!(report.outcome.skipped_extension_count, 1);
    }

    #[tokio::test]
    async fn unrecognized_extensions_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8; 4]).unwrap();
        std::fs::write(dir.path().join("notes.md"), "notes").unwrap();
        let sink = RecordingSink::default();

        let report = source(&dir, false, &[], &[]).run(&sink).await.unwrap();

        assert_eq!(report.outcome.processed_count, 1);
        assert_eq!(report.outcome.skipped_extension_count, 1);
    }

    #[tokio::test]
    async fn oversized_files_hit_the_size_policy() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.md"), "x".repeat(64)).unwrap();
        std::fs::write(dir.path().join("small.md"), "ok").unwrap();
        let sink = RecordingSink::default();

        let settings = CrawlerSettings {
            max_content_bytes: 16,
        };
        let src = LocalSource::new(
            dir.path(),
            false,
            &[],
            &[],
            &settings,
            Arc::new(StubPdf),
        );
        let report = src.run(&sink).await.unwrap();

        assert_eq!(report.outcome.skipped_size_count, 1);
        assert_eq!(report.outcome.processed_count, 1);
        // Skipped files still count as visited so their chunks survive
        // cleanup.
        assert_eq!(report.visited.len(), 2);
    }

    #[tokio::test]
    async fn pdfs_go_through_the_extractor() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("manual.pdf"), b"%PDF-1.4 fake").unwrap();
        let sink = RecordingSink::default();

        let report = source(&dir, false, &[], &[]).run(&sink).await.unwrap();

        assert_eq!(report.outcome.pdf_processed_count, 1);
        let pages = sink.pages.lock().unwrap();
        assert_eq!(pages[0].kind, PageKind::Pdf);
        assert!(pages[0].content.contains("## Page 1"));
    }

    #[tokio::test]
    async fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("does-not-exist");
        let sink = RecordingSink::default();
        let src = LocalSource::new(
            gone,
            true,
            &[],
            &[],
            &CrawlerSettings::default(),
            Arc::new(StubPdf),
        );
        assert!(src.run(&sink).await.is_err());
    }
}
