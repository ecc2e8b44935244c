//! Correlator configuration
//!
//! Loaded from a YAML file (`CORRELATE_CONFIG`), with the search endpoint and
//! API key overridable from the environment. Every field has a default.

use crate::graph::{Entity, IgnoreSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "CORRELATE_CONFIG";
pub const SEARCH_URL_ENV: &str = "CORRELATE_SEARCH_URL";
pub const API_KEY_ENV: &str = "CORRELATE_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Upstream facet-search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Ingestion cycle tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Ontologies whose entities get neighbour lookups. Empty means all.
    pub ontologies: Vec<String>,
    /// Entity keys excluded from the graph
    pub ignore: Vec<String>,
    /// Neighbour lookups in flight at once
    pub max_concurrent: usize,
    /// Start times of one batch are spread over this many milliseconds
    pub spread_delay_ms: u64,
    pub max_attempts: u32,
    /// Retry backoff is `retry_base_ms * 3^attempt` plus up to `retry_base_ms` jitter
    pub retry_base_ms: u64,
    /// Window of the first catch-up when nothing has been ingested
    pub initial_interval_secs: i64,
    /// Daemon catch-up period
    pub update_every_secs: u64,
    /// History replayed at startup; 0 disables pre-warm
    pub prewarm_secs: i64,
    pub prewarm_step_secs: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            ontologies: vec!["people".to_string()],
            ignore: Vec::new(),
            max_concurrent: 4,
            spread_delay_ms: 5000,
            max_attempts: 3,
            retry_base_ms: 500,
            initial_interval_secs: 3600,
            update_every_secs: 300,
            prewarm_secs: 0,
            prewarm_step_secs: 3600,
        }
    }
}

impl IngestConfig {
    pub fn ignore_set(&self) -> IgnoreSet {
        self.ignore.iter().map(String::as_str).collect()
    }

    /// Whether neighbour lookups cover `entity`
    pub fn wants(&self, entity: &Entity) -> bool {
        self.ontologies.is_empty() || self.ontologies.iter().any(|o| o == entity.ontology())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Partial chains the chain search may expand before giving up
    pub max_expansions: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_expansions: 200_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub default_limit: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelateConfig {
    pub search: SearchConfig,
    pub ingest: IngestConfig,
    pub paths: PathConfig,
    pub recommend: RecommendConfig,
}

impl CorrelateConfig {
    /// Parse a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: CorrelateConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the file named by `CORRELATE_CONFIG`, with environment overrides applied
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(url) = std::env::var(SEARCH_URL_ENV) {
            config.search.base_url = Some(url);
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.search.api_key = Some(key);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.ingest.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "ingest.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.ingest.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "ingest.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.ingest.initial_interval_secs <= 0 {
            return Err(ConfigError::Invalid(
                "ingest.initial_interval_secs must be positive".to_string(),
            ));
        }
        if self.ingest.prewarm_secs > 0 && self.ingest.prewarm_step_secs <= 0 {
            return Err(ConfigError::Invalid(
                "ingest.prewarm_step_secs must be positive when pre-warm is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CorrelateConfig::default();
        assert_eq!(config.ingest.ontologies, vec!["people"]);
        assert_eq!(config.ingest.max_concurrent, 4);
        assert_eq!(config.ingest.spread_delay_ms, 5000);
        assert_eq!(config.paths.max_expansions, 200_000);
        assert_eq!(config.recommend.default_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CorrelateConfig::from_yaml(
            "search:\n  base_url: http://search.local/facets\ningest:\n  max_concurrent: 2\n  ignore: [\"people:Noise\"]\n",
        )
        .unwrap();

        assert_eq!(config.search.base_url.as_deref(), Some("http://search.local/facets"));
        assert_eq!(config.search.timeout_secs, 30);
        assert_eq!(config.ingest.max_concurrent, 2);
        assert_eq!(config.ingest.max_attempts, 3);
        assert!(config.ingest.ignore_set().contains(&Entity::new("people:Noise")));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert!(matches!(
            CorrelateConfig::from_yaml("ingest:\n  max_concurrent: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CorrelateConfig::from_yaml("ingest:\n  max_attempts: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        assert!(matches!(
            CorrelateConfig::from_yaml("ingest: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_wants_filters_ontologies() {
        let mut ingest = IngestConfig::default();
        assert!(ingest.wants(&Entity::new("people:Jane")));
        assert!(!ingest.wants(&Entity::new("topics:Trade")));

        ingest.ontologies.clear();
        assert!(ingest.wants(&Entity::new("topics:Trade")));
    }
}
