//! Heading-aware, token-bounded markdown chunking.
//!
//! The chunker scans line by line, maintaining a stack of heading texts that
//! mirrors the document outline. Body text accumulates until the next heading
//! (or end of input), then flushes as one chunk, or as several overlapping
//! sub-chunks when it exceeds the token budget. Headings are hard boundaries:
//! no chunk ever mixes text from two sections.

use std::sync::Arc;

use docsift_core::{ChunkSettings, DocumentChunk};

// ============================================================================
// Tokenization strategy
// ============================================================================

/// Splits text into the units the token budget counts.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Default tokenizer: whitespace-separated words.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace().collect()
    }
}

// ============================================================================
// Chunker
// ============================================================================

/// Provenance attached to every chunk produced from one page.
#[derive(Debug, Clone)]
pub struct ChunkContext {
    pub url: String,
    pub product_name: String,
    pub version: String,
}

/// Heading-aware markdown chunker.
pub struct MarkdownChunker {
    max_tokens: usize,
    overlap_tokens: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl MarkdownChunker {
    #[must_use]
    pub fn new(settings: &ChunkSettings) -> Self {
        Self::with_tokenizer(settings, Arc::new(WhitespaceTokenizer))
    }

    #[must_use]
    pub fn with_tokenizer(settings: &ChunkSettings, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            max_tokens: settings.max_tokens,
            overlap_tokens: settings.overlap_tokens(),
            tokenizer,
        }
    }

    /// Chunk a markdown document. Infallible: any text yields zero or more
    /// chunks, and text outside every section yields a chunk with an empty
    /// hierarchy (reported as `"Introduction"`).
    #[must_use]
    pub fn chunk(&self, markdown: &str, ctx: &ChunkContext) -> Vec<DocumentChunk> {
        let mut hierarchy: Vec<String> = Vec::new();
        let mut buffer = String::new();
        let mut chunks = Vec::new();

        for line in markdown.lines() {
            if let Some((level, text)) = parse_heading(line) {
                self.flush(&mut buffer, &hierarchy, ctx, &mut chunks);
                if level <= hierarchy.len() {
                    // Same or shallower heading: drop deeper siblings, then
                    // replace the entry at this depth.
                    hierarchy.truncate(level);
                    hierarchy[level - 1] = text;
                } else {
                    // Skipped levels pad with empty strings so depth always
                    // equals heading level.
                    while hierarchy.len() < level - 1 {
                        hierarchy.push(String::new());
                    }
                    hierarchy.push(text);
                }
            } else {
                buffer.push_str(line);
                buffer.push('\n');
            }
        }
        self.flush(&mut buffer, &hierarchy, ctx, &mut chunks);

        tracing::debug!(
            url = %ctx.url,
            chunk_count = chunks.len(),
            "chunked markdown document"
        );
        chunks
    }

    /// Emit the accumulated section body, splitting it when it exceeds the
    /// token budget. Whitespace-only bodies produce nothing.
    fn flush(
        &self,
        buffer: &mut String,
        hierarchy: &[String],
        ctx: &ChunkContext,
        out: &mut Vec<DocumentChunk>,
    ) {
        let body = buffer.trim();
        if body.is_empty() {
            buffer.clear();
            return;
        }

        let tokens = self.tokenizer.tokenize(body);
        if tokens.len() <= self.max_tokens {
            out.push(self.make_chunk(body.to_string(), hierarchy, ctx));
        } else {
            for window in split_with_overlap(&tokens, self.max_tokens, self.overlap_tokens) {
                out.push(self.make_chunk(window, hierarchy, ctx));
            }
        }
        buffer.clear();
    }

    fn make_chunk(&self, content: String, hierarchy: &[String], ctx: &ChunkContext) -> DocumentChunk {
        DocumentChunk::new(
            content,
            &ctx.url,
            &ctx.product_name,
            &ctx.version,
            hierarchy.to_vec(),
        )
    }
}

/// Parse an ATX heading: 1-6 `#` characters followed by whitespace.
/// Returns the heading level and the trimmed heading text.
fn parse_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some((level, rest.trim().to_string()))
}

/// Sliding window over tokens: each sub-chunk holds up to `budget` tokens and
/// begins with the last `overlap` tokens of its predecessor. `overlap` must be
/// smaller than `budget` (guaranteed by config validation) so every step makes
/// forward progress.
fn split_with_overlap(tokens: &[&str], budget: usize, overlap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + budget).min(tokens.len());
        out.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start = end - overlap;
    }
    out
}
