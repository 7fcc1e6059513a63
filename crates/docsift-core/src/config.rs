//! Validated configuration for docsift runs.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_max_tokens() -> usize {
    1000
}

fn default_overlap_fraction() -> f64 {
    0.05
}

fn default_code_budget() -> usize {
    512
}

fn default_max_content_bytes() -> u64 {
    4 * 1024 * 1024
}

fn default_recursive() -> bool {
    true
}

/// Settings for both chunkers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSettings {
    /// Token budget for a markdown chunk.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Fraction of `max_tokens` carried over between consecutive sub-chunks
    /// when an oversized section is split.
    #[serde(default = "default_overlap_fraction")]
    pub overlap_fraction: f64,

    /// Size budget (in estimator units) for a code chunk.
    #[serde(default = "default_code_budget")]
    pub code_budget: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap_fraction: default_overlap_fraction(),
            code_budget: default_code_budget(),
        }
    }
}

impl ChunkSettings {
    /// Validate before a run: budgets must be positive, the overlap fraction
    /// must leave room for forward progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidValue(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.code_budget == 0 {
            return Err(ConfigError::InvalidValue(
                "code_budget must be greater than zero".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(ConfigError::InvalidValue(format!(
                "overlap_fraction must be in [0, 1), got {}",
                self.overlap_fraction
            )));
        }
        Ok(())
    }

    /// Overlap expressed in whole tokens. Always less than `max_tokens` for
    /// a validated configuration.
    #[must_use]
    pub fn overlap_tokens(&self) -> usize {
        (self.max_tokens as f64 * self.overlap_fraction) as usize
    }
}

/// Settings for content sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerSettings {
    /// Pages larger than this are skipped by the size policy.
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: u64,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            max_content_bytes: default_max_content_bytes(),
        }
    }
}

impl CrawlerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_content_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_content_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level settings bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub chunking: ChunkSettings,
    #[serde(default)]
    pub crawler: CrawlerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        self.crawler.validate()
    }
}

/// Where content comes from. Closed union: adding a kind means updating
/// every match on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// Crawl a site starting at `base_url`, staying under its path prefix.
    Web {
        base_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sitemap_url: Option<String>,
    },
    /// Walk a local directory.
    LocalDirectory {
        path: String,
        #[serde(default = "default_recursive")]
        recursive: bool,
        /// Extensions to accept; empty means accept everything.
        #[serde(default)]
        include_extensions: Vec<String>,
        /// Extensions to reject. Exclusion wins over inclusion.
        #[serde(default)]
        exclude_extensions: Vec<String>,
    },
    /// Reserved; not yet supported by any pipeline operation.
    Repository { url: String },
}

/// Which store backend to open. Closed union, handled exhaustively by the
/// store factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-memory store, for tests and development.
    Memory,
    /// Externally provided backend; the caller must supply the
    /// implementation.
    External { endpoint: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.chunking.max_tokens, 1000);
        assert_eq!(settings.chunking.code_budget, 512);
        assert!((settings.chunking.overlap_fraction - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn default_overlap_is_fifty_tokens() {
        assert_eq!(ChunkSettings::default().overlap_tokens(), 50);
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let mut settings = ChunkSettings::default();
        settings.max_tokens = 0;
        assert!(settings.validate().is_err());

        let mut settings = ChunkSettings::default();
        settings.code_budget = 0;
        assert!(settings.validate().is_err());

        let mut settings = CrawlerSettings::default();
        settings.max_content_bytes = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn overlap_fraction_must_leave_progress() {
        let mut settings = ChunkSettings::default();
        settings.overlap_fraction = 1.0;
        assert!(settings.validate().is_err());
        settings.overlap_fraction = -0.1;
        assert!(settings.validate().is_err());
        settings.overlap_fraction = 0.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn source_kind_round_trips_through_json() {
        let source = SourceKind::Web {
            base_url: "https://docs.example.com/".to_string(),
            sitemap_url: Some("https://docs.example.com/sitemap.xml".to_string()),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"kind\":\"web\""));
        let back: SourceKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, source);
    }

    #[test]
    fn local_directory_defaults_apply() {
        let source: SourceKind =
            serde_json::from_str(r#"{"kind":"local_directory","path":"/tmp/docs"}"#).unwrap();
        match source {
            SourceKind::LocalDirectory {
                recursive,
                include_extensions,
                exclude_extensions,
                ..
            } => {
                assert!(recursive);
                assert!(include_extensions.is_empty());
                assert!(exclude_extensions.is_empty());
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
