//! HTTP facet search client

use crate::config::SearchConfig;
use crate::graph::Entity;
use crate::ingest::{FacetCounts, FacetQuery, FacetSearch, IngestError, IngestResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    after_secs: i64,
    before_secs: i64,
    constraints: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    facets: Option<Vec<Facet>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Facet {
    name: String,
    #[serde(default)]
    facet_elements: Vec<FacetElement>,
}

#[derive(Debug, Deserialize)]
struct FacetElement {
    name: String,
    count: u64,
}

/// Flatten `results[0].facets[].facetElements[]` into `ontology:name -> count`.
/// A missing level is a malformed payload and yields an empty mapping.
pub(crate) fn facet_counts(response: SearchResponse, query: &FacetQuery) -> FacetCounts {
    let facets = match response.results {
        None => {
            warn!(?query, "Facet search payload has no results");
            return FacetCounts::new();
        }
        Some(results) => match results.into_iter().next() {
            None => {
                warn!(?query, "Facet search payload has empty results");
                return FacetCounts::new();
            }
            Some(first) => match first.facets {
                None => {
                    warn!(?query, "Facet search payload has no facets");
                    return FacetCounts::new();
                }
                Some(facets) => facets,
            },
        },
    };

    let mut counts = FacetCounts::new();
    for facet in facets {
        for element in facet.facet_elements {
            *counts
                .entry(Entity::from_parts(&facet.name, &element.name))
                .or_insert(0) += element.count;
        }
    }
    counts
}

/// [`FacetSearch`] backed by the provider's JSON search endpoint
pub struct HttpFacetSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpFacetSearch {
    pub fn new(config: &SearchConfig) -> IngestResult<Self> {
        let endpoint = config
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| IngestError::ConfigError("search.base_url is required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl FacetSearch for HttpFacetSearch {
    async fn search_facets(&self, query: &FacetQuery) -> IngestResult<FacetCounts> {
        let mut request = self.client.post(&self.endpoint).json(&Request {
            after_secs: query.after_secs,
            before_secs: query.before_secs,
            constraints: query.constraint.iter().map(Entity::as_str).collect(),
        });
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| IngestError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IngestError::ApiError(format!(
                "Facet search error: {}",
                resp.status()
            )));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| IngestError::SerializationError(e.to_string()))?;

        let counts = facet_counts(body, query);
        debug!(?query, entities = counts.len(), "Facet search completed");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Window;

    fn parse(json: &str) -> FacetCounts {
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        facet_counts(response, &FacetQuery::window(Window::new(0, 1)))
    }

    #[test]
    fn test_flattens_facets() {
        let counts = parse(
            r#"{"results":[{"facets":[
                {"name":"people","facetElements":[{"name":"Jane Doe","count":3},{"name":"John Roe","count":1}]},
                {"name":"topics","facetElements":[{"name":"Trade","count":7}]}
            ]}]}"#,
        );

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&Entity::new("people:Jane Doe")], 3);
        assert_eq!(counts[&Entity::new("topics:Trade")], 7);
    }

    #[test]
    fn test_missing_levels_yield_empty() {
        assert!(parse(r#"{}"#).is_empty());
        assert!(parse(r#"{"results":[]}"#).is_empty());
        assert!(parse(r#"{"results":[{}]}"#).is_empty());
        assert!(parse(r#"{"results":[{"facets":[{"name":"people"}]}]}"#).is_empty());
    }

    #[test]
    fn test_new_requires_base_url() {
        let config = SearchConfig::default();
        assert!(matches!(
            HttpFacetSearch::new(&config),
            Err(IngestError::ConfigError(_))
        ));

        let config = SearchConfig {
            base_url: Some("http://localhost:9/search".to_string()),
            ..SearchConfig::default()
        };
        assert!(HttpFacetSearch::new(&config).is_ok());
    }
}
