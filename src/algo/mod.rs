//! Graph analysis module
//!
//! Algorithms are implemented in the `correlate-algorithms` crate over a dense
//! view. This module provides the integration/adapter layer: it builds that
//! view from the [`CoocGraph`] and maps results back to entities.

pub mod community;
pub mod pathfinding;
pub mod recommend;
pub mod so_nearly;

use crate::graph::{CoocGraph, Entity};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

// Re-export algorithms
pub use correlate_algorithms::{
    bfs_layers, bounded_chain, common_neighbor_pairs, connected_components, ChainLimits,
    GraphView,
};

pub use community::{Island, Islands};
pub use pathfinding::{chain_between, chain_lengths, ChainLayer};
pub use recommend::{recommend_coocs, recommend_so_nearlies, Candidate, Recommendations};
pub use so_nearly::{SoNearlyIndex, SoNearlyPair};

/// Dense view over entities
pub type EntityView = GraphView<Entity>;

/// Build a GraphView over every entity that has at least one edge.
/// Node weights are the entities' Registry counts.
pub fn build_view(graph: &CoocGraph) -> EntityView {
    GraphView::from_adjacency(graph.adjacency().iter(), |entity: &Entity| {
        graph.count(entity).unwrap_or(0)
    })
}

/// Time spent in each recomputation stage, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisTimings {
    pub view_ms: u64,
    pub islands_ms: u64,
    pub so_nearly_ms: u64,
}

/// Everything derived from one graph snapshot.
///
/// Built from scratch after every ingestion cycle and swapped in as a unit;
/// never patched in place.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Adjacency snapshot used by the path finder and recommendations
    pub view: EntityView,
    pub islands: Islands,
    /// Near-misses within the main island
    pub so_nearly: SoNearlyIndex,
}

impl Analysis {
    /// Analysis of an empty graph
    pub fn empty() -> Self {
        Analysis::compute(&CoocGraph::new()).0
    }

    /// Recompute islands and so-nearlies from the current graph
    pub fn compute(graph: &CoocGraph) -> (Self, AnalysisTimings) {
        let mut timings = AnalysisTimings::default();

        let started = Instant::now();
        let view = build_view(graph);
        timings.view_ms = started.elapsed().as_millis() as u64;

        let started = Instant::now();
        let islands = Islands::compute(&view);
        timings.islands_ms = started.elapsed().as_millis() as u64;

        let started = Instant::now();
        let so_nearly = SoNearlyIndex::compute(&view, islands.main());
        timings.so_nearly_ms = started.elapsed().as_millis() as u64;

        debug!(
            nodes = view.node_count,
            islands = islands.len(),
            so_nearlies = so_nearly.len(),
            "analysis recomputed"
        );

        (
            Analysis {
                view,
                islands,
                so_nearly,
            },
            timings,
        )
    }
}
