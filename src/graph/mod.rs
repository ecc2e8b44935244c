//! Core co-occurrence graph
//!
//! This module implements the correlation graph data model:
//! - Entities keyed as `ontology:value`, and the configured ignore-set
//! - The Registry of cumulative mention counts
//! - The symmetric Adjacency Structure, grown by merging facet deltas
//! - Watermarks bounding everything ingested so far

pub mod store;
pub mod types;
pub mod watermark;

// Re-export main types
pub use store::{CoocGraph, DeltaStats, FacetDelta};
pub use types::{Entity, IgnoreSet};
pub use watermark::{Watermarks, Window};
