//! Correlate
//!
//! An in-memory correlation graph of named entities (people, organisations,
//! topics) that co-appear in published articles.
//!
//! # Architecture
//!
//! - `graph`: entity Registry, symmetric co-occurrence Adjacency Structure,
//!   watermarks and ignore-set
//! - `ingest`: windowed facet search against the upstream provider, with a
//!   throttled, retried per-entity neighbour fetch
//! - `algo`: islands (connected components), chain finding, so-nearly pairs
//!   and recommendations, built on the `correlate-algorithms` crate
//! - `diagnostics`: consistency checks across all of the above
//! - `correlator`: the owned context that runs ingestion cycles and serves queries
//!
//! ## Data flow
//!
//! fetch window -> merge delta -> recompute islands -> recompute so-nearlies
//! -> commit watermarks. Queries read the last committed analysis snapshot.
//!
//! ## Example Usage
//!
//! ```rust
//! use correlate::graph::{CoocGraph, Entity, FacetDelta, IgnoreSet};
//! use correlate::algo::{chain_between, Analysis};
//!
//! let mut delta = FacetDelta::default();
//! for (a, b) in [("people:a", "people:b"), ("people:b", "people:c")] {
//!     delta.neighbors.entry(Entity::new(a)).or_default().push(Entity::new(b));
//! }
//!
//! let mut graph = CoocGraph::new();
//! graph.apply_delta(&delta, &IgnoreSet::new());
//!
//! let (analysis, _) = Analysis::compute(&graph);
//! assert_eq!(analysis.islands.len(), 1);
//!
//! let chain = chain_between(
//!     &analysis.view,
//!     &analysis.islands,
//!     &Entity::new("people:a"),
//!     &Entity::new("people:c"),
//!     1_000,
//! );
//! assert_eq!(chain.len(), 3);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod correlator;
pub mod diagnostics;
pub mod graph;
pub mod ingest;

// Re-export main types for convenience
pub use graph::{CoocGraph, DeltaStats, Entity, FacetDelta, IgnoreSet, Watermarks, Window};

pub use algo::{
    Analysis, Candidate, ChainLayer, Island, Islands, Recommendations, SoNearlyIndex,
    SoNearlyPair,
};

pub use ingest::{
    FacetCounts, FacetQuery, FacetSearch, FetchStats, Fetcher, HttpFacetSearch, IngestError,
    IngestResult,
};

pub use config::{ConfigError, ConfigResult, CorrelateConfig};

pub use correlator::{Correlator, CycleTimings, GraphExport, GraphSummary, IngestSummary};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
