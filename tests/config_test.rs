use correlate::{ConfigError, CorrelateConfig, Correlator, Entity, IngestError};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_yaml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
search:
  base_url: "http://search.local/facets"
  api_key: "secret"
  timeout_secs: 5
ingest:
  ontologies: ["people", "organisations"]
  ignore: ["people:Noise"]
  max_concurrent: 8
  spread_delay_ms: 1000
  prewarm_secs: 86400
paths:
  max_expansions: 5000
recommend:
  default_limit: 3
"#
    )
    .unwrap();

    let config = CorrelateConfig::from_file(file.path()).unwrap();
    assert_eq!(config.search.base_url.as_deref(), Some("http://search.local/facets"));
    assert_eq!(config.search.timeout_secs, 5);
    assert_eq!(config.ingest.ontologies, vec!["people", "organisations"]);
    assert_eq!(config.ingest.max_concurrent, 8);
    assert_eq!(config.ingest.max_attempts, 3);
    assert_eq!(config.ingest.prewarm_step_secs, 3600);
    assert_eq!(config.paths.max_expansions, 5000);
    assert_eq!(config.recommend.default_limit, 3);
    assert!(config.ingest.ignore_set().contains(&Entity::new("people:Noise")));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = CorrelateConfig::from_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_invalid_values_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ingest:\n  max_attempts: 0").unwrap();
    assert!(matches!(
        CorrelateConfig::from_file(file.path()),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_http_correlator_needs_endpoint() {
    let result = Correlator::from_config(CorrelateConfig::default());
    assert!(matches!(result, Err(IngestError::ConfigError(_))));
}
