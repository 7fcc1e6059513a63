//! Syntax-tree-aware code chunking.
//!
//! Source is parsed with tree-sitter and split recursively: a node that fits
//! the size budget becomes a leaf; an oversized node is replaced by its
//! children. An oversized node with no children (or whose children yield
//! nothing) is kept whole rather than dropped, so no content is ever lost,
//! at the cost of an occasional over-budget chunk. A final greedy pass merges
//! adjacent leaves back up toward the budget, counting one separator unit per
//! join.

use std::sync::Arc;

use docsift_core::{ChunkError, ChunkSettings, DocumentChunk};
use tree_sitter::{Node, Parser};

use crate::markdown::ChunkContext;
use crate::parsers;

// ============================================================================
// Size estimation strategy
// ============================================================================

/// Measures text in whatever unit the budget is expressed in.
pub trait SizeEstimator: Send + Sync {
    fn size(&self, text: &str) -> usize;
}

/// Default estimator: character count.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharCountEstimator;

impl SizeEstimator for CharCountEstimator {
    fn size(&self, text: &str) -> usize {
        text.chars().count()
    }
}

// ============================================================================
// Chunker
// ============================================================================

/// A measured span of source text, produced by the recursive split and
/// consumed by the merge pass.
#[derive(Debug, Clone)]
pub struct CodeChunk {
    pub text: String,
    pub size: usize,
}

/// Syntax-tree code chunker.
pub struct CodeChunker {
    budget: usize,
    estimator: Arc<dyn SizeEstimator>,
}

impl CodeChunker {
    #[must_use]
    pub fn new(settings: &ChunkSettings) -> Self {
        Self::with_estimator(settings, Arc::new(CharCountEstimator))
    }

    #[must_use]
    pub fn with_estimator(settings: &ChunkSettings, estimator: Arc<dyn SizeEstimator>) -> Self {
        Self {
            budget: settings.code_budget,
            estimator,
        }
    }

    /// Chunk source code in the named language. Fails only when the language
    /// is unknown or the parser rejects the input outright; blank source
    /// yields no chunks.
    pub fn chunk(
        &self,
        source: &str,
        language: &str,
        ctx: &ChunkContext,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }

        let grammar = parsers::language_for(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ChunkError::Parser(format!("{language}: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ChunkError::Parser(format!("{language}: parse produced no tree")))?;

        let mut leaves = Vec::new();
        self.split_node(tree.root_node(), source, &mut leaves);
        let merged = merge_chunks(leaves, self.budget);

        tracing::debug!(
            url = %ctx.url,
            language,
            chunk_count = merged.len(),
            "chunked code document"
        );

        Ok(merged
            .into_iter()
            .map(|text| {
                DocumentChunk::new(text, &ctx.url, &ctx.product_name, &ctx.version, Vec::new())
            })
            .collect())
    }

    /// Depth-first split. Appends leaves for `node` (or its descendants) to
    /// `out`; whitespace-only spans are dropped.
    fn split_node(&self, node: Node<'_>, source: &str, out: &mut Vec<CodeChunk>) {
        let text = &source[node.byte_range()];
        if text.trim().is_empty() {
            return;
        }
        let size = self.estimator.size(text);
        if size <= self.budget || node.child_count() == 0 {
            out.push(CodeChunk {
                text: text.to_string(),
                size,
            });
            return;
        }

        let before = out.len();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.split_node(child, source, out);
        }
        // A node whose children all collapsed to nothing still carries its
        // own text; keep it whole even though it is over budget.
        if out.len() == before {
            out.push(CodeChunk {
                text: text.to_string(),
                size,
            });
        }
    }
}

/// Greedy merge: walk the leaves in order, appending each to the current
/// group while the group size plus one separator unit stays within the
/// budget, otherwise starting a new group. Groups are joined with newlines.
pub fn merge_chunks(leaves: Vec<CodeChunk>, budget: usize) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut current_size = 0usize;

    for leaf in leaves {
        if leaf.text.trim().is_empty() {
            continue;
        }
        if current.is_empty() {
            current = leaf.text;
            current_size = leaf.size;
        } else if current_size + 1 + leaf.size <= budget {
            current.push('\n');
            current.push_str(&leaf.text);
            current_size += 1 + leaf.size;
        } else {
            groups.push(std::mem::take(&mut current));
            current = leaf.text;
            current_size = leaf.size;
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ChunkContext {
        ChunkContext {
            url: "file:///src/lib.rs".to_string(),
            product_name: "example".to_string(),
            version: "1.0".to_string(),
        }
    }

    fn leaf(len: usize) -> CodeChunk {
        CodeChunk {
            text: "x".repeat(len),
            size: len,
        }
    }

    #[test]
    fn merge_packs_adjacent_leaves_up_to_budget() {
        // 40 + 1 + 40 = 81 fits in 100; adding the third (81 + 1 + 40 = 122)
        // does not, so it starts a new group.
        let groups = merge_chunks(vec![leaf(40), leaf(40), leaf(40)], 100);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 81);
        assert_eq!(groups[1].len(), 40);
    }

    #[test]
    fn merge_keeps_oversized_leaf_alone() {
        let groups = merge_chunks(vec![leaf(10), leaf(250), leaf(10)], 100);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].len(), 250);
    }

    #[test]
    fn merge_drops_blank_leaves() {
        let blank = CodeChunk {
            text: "   \n ".to_string(),
            size: 5,
        };
        let groups = merge_chunks(vec![blank, leaf(20)], 100);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 20);
    }

    #[test]
    fn small_source_stays_whole() {
        let settings = ChunkSettings::default();
        let chunker = CodeChunker::new(&settings);
        let source = "fn add(a: i32, b: i32) -> i32 { a + b }\n";
        let chunks = chunker.chunk(source, "rust", &ctx()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("fn add"));
        assert!(chunks[0].heading_hierarchy.is_empty());
    }

    #[test]
    fn blank_source_yields_nothing() {
        let chunker = CodeChunker::new(&ChunkSettings::default());
        assert!(chunker.chunk("  \n\n ", "rust", &ctx()).unwrap().is_empty());
    }

    #[test]
    fn unknown_language_is_rejected() {
        let chunker = CodeChunker::new(&ChunkSettings::default());
        let err = chunker.chunk("fn main() {}", "brainfuck", &ctx()).unwrap_err();
        assert!(matches!(err, ChunkError::Parser(_)));
    }

    #[test]
    fn recursive_split_loses_no_content() {
        let settings = ChunkSettings {
            code_budget: 60,
            ..ChunkSettings::default()
        };
        let chunker = CodeChunker::new(&settings);
        let source = r#"
fn alpha(value: i32) -> i32 {
    let doubled = value * 2;
    doubled + 1
}

fn beta(name: &str) -> String {
    format!("hello {name}")
}

struct Gamma {
    field_one: u64,
    field_two: String,
}
"#;
        let chunks = chunker.chunk(source, "rust", &ctx()).unwrap();
        assert!(chunks.len() > 1);

        let joined: String = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        // The split may land between tokens, so check survival word by word.
        let words = source
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty());
        for word in words {
            assert!(joined.contains(word), "lost token: {word}");
        }
    }

    #[test]
    fn code_chunk_ids_are_deterministic() {
        let chunker = CodeChunker::new(&ChunkSettings::default());
        let source = "def greet(name):\n    return f\"hi {name}\"\n";
        let a = chunker.chunk(source, "python", &ctx()).unwrap();
        let b = chunker.chunk(source, "python", &ctx()).unwrap();
        assert_eq!(
            a.iter().map(|c| &c.chunk_id).collect::<Vec<_>>(),
            b.iter().map(|c| &c.chunk_id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn custom_estimator_changes_the_budget_unit() {
        struct LineCount;
        impl SizeEstimator for LineCount {
            fn size(&self, text: &str) -> usize {
                text.lines().count()
            }
        }
        let settings = ChunkSettings {
            code_budget: 2,
            ..ChunkSettings::default()
        };
        let chunker = CodeChunker::with_estimator(&settings, Arc::new(LineCount));
        let source = "fn a() {}\nfn b() {}\nfn c() {}\nfn d() {}\n";
        let chunks = chunker.chunk(source, "rust", &ctx()).unwrap();
        // Four one-line items under a two-line budget cannot fit in one chunk.
        assert!(chunks.len() >= 2);
    }
}
