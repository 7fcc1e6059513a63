//! Error taxonomy for docsift.
//!
//! One sub-enum per pipeline stage, aggregated into [`Error`]. Per-item
//! failures during a crawl are logged and counted rather than propagated;
//! the aggregated error is what escapes a run.

use thiserror::Error;

/// Message fragments that mark a failure as network-related when the error
/// did not arrive as [`FetchError::Network`] in the first place.
const NETWORK_ERROR_TERMS: &[&str] = &[
    "dns",
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "unreachable",
    "network",
];

/// Errors from fetching or converting remote content.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, timeout, refused connection, ...).
    #[error("network failure: {0}")]
    Network(String),

    /// The page does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other fetch or conversion failure.
    #[error("fetch failed: {0}")]
    Failed(String),
}

impl FetchError {
    /// Whether this failure should count as a network failure for cleanup
    /// gating. `Network` always does; other variants are classified by
    /// scanning the message for network-related terms.
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::NotFound(_) => false,
            Self::Failed(msg) => {
                let msg = msg.to_lowercase();
                NETWORK_ERROR_TERMS.iter().any(|term| msg.contains(term))
            }
        }
    }
}

/// Errors from the chunking stage.
#[derive(Error, Debug)]
pub enum ChunkError {
    /// A syntax-tree parser could not be built or failed to parse.
    #[error("parser error: {0}")]
    Parser(String),

    /// Chunk settings that cannot produce valid chunks.
    #[error("invalid chunker configuration: {0}")]
    InvalidConfig(String),

    /// Any other chunking failure.
    #[error("chunking failed: {0}")]
    Failed(String),
}

/// Errors from the embedding provider.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Errors from the vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("upsert failed: {0}")]
    Upsert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),
}

/// Errors from configuration validation. Always fatal before a run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("unsupported source kind: {0}")]
    UnsupportedSource(String),
}

/// Top-level error type for docsift.
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embed error: {0}")]
    Embed(#[from] EmbedError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify an already-aggregated error for cleanup gating. Only fetch
    /// errors can be network failures; store or chunk errors never gate the
    /// cleanup.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Fetch(f) if f.is_network())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_variant_is_always_network() {
        assert!(FetchError::Network("whatever".to_string()).is_network());
    }

    #[test]
    fn not_found_is_never_network() {
        assert!(!FetchError::NotFound("https://x/".to_string()).is_network());
    }

    #[test]
    fn failed_is_classified_by_message_terms() {
        assert!(FetchError::Failed("DNS lookup failed".to_string()).is_network());
        assert!(FetchError::Failed("request timed out".to_string()).is_network());
        assert!(FetchError::Failed("Connection Refused by peer".to_string()).is_network());
        assert!(!FetchError::Failed("parse error in body".to_string()).is_network());
        assert!(!FetchError::Failed("server returned 500".to_string()).is_network());
    }

    #[test]
    fn aggregated_classification_only_sees_fetch_errors() {
        let fetch: Error = FetchError::Network("down".to_string()).into();
        assert!(fetch.is_network());
        let store: Error = StoreError::Upsert("network partition".to_string()).into();
        assert!(!store.is_network());
    }

    #[test]
    fn error_messages_name_the_stage() {
        let err: Error = ChunkError::Parser("bad grammar".to_string()).into();
        assert_eq!(err.to_string(), "chunk error: parser error: bad grammar");
    }
}
