//! Chunking strategies for docsift.
//!
//! Two chunkers: [`MarkdownChunker`] splits prose along heading boundaries
//! with a token budget, [`CodeChunker`] splits source code along syntax-tree
//! boundaries with a size budget. Both produce content-addressed
//! [`docsift_core::DocumentChunk`]s.

pub mod code;
pub mod markdown;
pub mod parsers;

pub use code::{CodeChunker, SizeEstimator};
pub use markdown::{ChunkContext, MarkdownChunker, Tokenizer};
