//! Ingestion from the upstream facet-search provider
//!
//! The provider is reached through the [`FacetSearch`] trait: a windowed,
//! optionally entity-constrained search returning `entity -> mention count`.
//! [`Fetcher`] turns one window into a [`FacetDelta`](crate::graph::FacetDelta)
//! by running the window search and then one constrained search per entity of
//! interest, throttled and retried.

pub mod cache;
pub mod client;
pub mod fetcher;
pub mod validate;

use crate::graph::{Entity, Window};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub use cache::QueryCache;
pub use client::HttpFacetSearch;
pub use fetcher::{FetchStats, Fetcher};
pub use validate::is_well_formed;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Facet search API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Ingestion cancelled")]
    Cancelled,
}

pub type IngestResult<T> = Result<T, IngestError>;

/// One facet search: a `(after, before]` window, optionally constrained to
/// articles mentioning a given entity. The whole query is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetQuery {
    pub after_secs: i64,
    pub before_secs: i64,
    pub constraint: Option<Entity>,
}

impl FacetQuery {
    /// Unconstrained search over `window`
    pub fn window(window: Window) -> Self {
        FacetQuery {
            after_secs: window.after_secs,
            before_secs: window.before_secs,
            constraint: None,
        }
    }

    /// Search over `window` restricted to articles mentioning `entity`
    pub fn constrained(window: Window, entity: Entity) -> Self {
        FacetQuery {
            constraint: Some(entity),
            ..Self::window(window)
        }
    }
}

/// Entity -> mentions in the searched window
pub type FacetCounts = BTreeMap<Entity, u64>;

/// The upstream content provider, seen only through its facet search
#[async_trait]
pub trait FacetSearch: Send + Sync {
    async fn search_facets(&self, query: &FacetQuery) -> IngestResult<FacetCounts>;
}
