//! The correlation engine
//!
//! [`Correlator`] owns the Registry, the Adjacency Structure, the derived
//! [`Analysis`] and the watermarks. Ingestion cycles are serialized; queries
//! read the current `Arc<Analysis>` and never see a half-built one.

use crate::algo::{
    chain_between, chain_lengths, recommend_coocs, recommend_so_nearlies, Analysis, ChainLayer,
    Island, Recommendations, SoNearlyPair,
};
use crate::algo::so_nearly::ByEntity;
use crate::config::CorrelateConfig;
use crate::diagnostics::consistency_check;
use crate::graph::{CoocGraph, Entity, IgnoreSet, Watermarks, Window};
use crate::ingest::{FacetSearch, FetchStats, Fetcher, HttpFacetSearch, IngestError, IngestResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tracing::{info, warn};

/// Milliseconds spent in each stage of one ingestion cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleTimings {
    pub fetch_ms: u64,
    pub update_ms: u64,
    pub view_ms: u64,
    pub islands_ms: u64,
    pub so_nearly_ms: u64,
    pub total_ms: u64,
}

/// Result of one successful ingestion cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub window: Window,
    pub entities_in_window: usize,
    pub new_entity_count: usize,
    pub new_edge_count: usize,
    pub total_edge_count: usize,
    pub island_count: usize,
    pub main_island_size: usize,
    pub so_nearly_count: usize,
    pub symmetry_violations: usize,
    pub fetch: FetchStats,
    pub timings: CycleTimings,
}

/// Sizes of the graph and its analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub entity_count: usize,
    pub member_count: usize,
    pub edge_count: usize,
    pub island_count: usize,
    pub main_island_size: usize,
    pub so_nearly_count: usize,
    pub ignored_count: usize,
    pub watermarks: Watermarks,
}

/// Full, ordered dump of the Registry and Adjacency Structure
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub registry: BTreeMap<Entity, u64>,
    pub adjacency: BTreeMap<Entity, BTreeSet<Entity>>,
    pub watermarks: Watermarks,
}

pub struct Correlator {
    config: CorrelateConfig,
    fetcher: Fetcher,
    ignore: IgnoreSet,
    graph: RwLock<CoocGraph>,
    analysis: RwLock<Arc<Analysis>>,
    watermarks: RwLock<Watermarks>,
    /// Held for the whole of an ingestion cycle
    cycle: Mutex<()>,
}

impl Correlator {
    pub fn new(config: CorrelateConfig, search: Arc<dyn FacetSearch>) -> Self {
        let ignore = config.ingest.ignore_set();
        let fetcher = Fetcher::new(search, config.ingest.clone());
        Self {
            config,
            fetcher,
            ignore,
            graph: RwLock::new(CoocGraph::new()),
            analysis: RwLock::new(Arc::new(Analysis::empty())),
            watermarks: RwLock::new(Watermarks::new()),
            cycle: Mutex::new(()),
        }
    }

    /// Correlator talking to the configured HTTP search endpoint
    pub fn from_config(config: CorrelateConfig) -> IngestResult<Self> {
        let search = HttpFacetSearch::new(&config.search)?;
        Ok(Self::new(config, Arc::new(search)))
    }

    pub fn config(&self) -> &CorrelateConfig {
        &self.config
    }

    /// Stop issuing upstream requests; a cycle in progress fails with `Cancelled`
    pub fn shutdown(&self) {
        self.fetcher.shutdown();
    }

    // ---- ingestion ----

    /// Catch up from the latest watermark to now
    pub async fn ingest_latest(&self) -> IngestResult<IngestSummary> {
        self.ingest_latest_at(now_secs()).await
    }

    pub async fn ingest_latest_at(&self, now_secs: i64) -> IngestResult<IngestSummary> {
        let cycle = self.cycle.lock().await;
        let window = self
            .watermarks
            .read()
            .await
            .latest_window(now_secs, self.config.ingest.initial_interval_secs);
        let summary = self.run_cycle(window).await;
        drop(cycle);
        summary
    }

    /// Reach `interval_secs` further back than the earliest watermark
    pub async fn ingest_earlier(&self, interval_secs: i64) -> IngestResult<IngestSummary> {
        self.ingest_earlier_at(interval_secs, now_secs()).await
    }

    pub async fn ingest_earlier_at(
        &self,
        interval_secs: i64,
        now_secs: i64,
    ) -> IngestResult<IngestSummary> {
        if interval_secs <= 0 {
            return Err(IngestError::ConfigError(format!(
                "interval must be positive, got {}",
                interval_secs
            )));
        }
        let cycle = self.cycle.lock().await;
        let window = self
            .watermarks
            .read()
            .await
            .earlier_window(now_secs, interval_secs);
        let summary = self.run_cycle(window).await;
        drop(cycle);
        summary
    }

    /// Replay `prewarm_secs` of history: one catch-up, then earlier steps
    /// until the watermarks span the configured range
    pub async fn prewarm(&self) -> IngestResult<Vec<IngestSummary>> {
        self.prewarm_at(now_secs()).await
    }

    pub async fn prewarm_at(&self, now_secs: i64) -> IngestResult<Vec<IngestSummary>> {
        let target = self.config.ingest.prewarm_secs;
        if target <= 0 {
            return Ok(Vec::new());
        }
        let step = self.config.ingest.prewarm_step_secs;
        if step <= 0 {
            return Err(IngestError::ConfigError(
                "prewarm_step_secs must be positive".to_string(),
            ));
        }

        let mut summaries = vec![self.ingest_latest_at(now_secs).await?];
        while covered_secs(&self.watermarks().await) < target {
            summaries.push(self.ingest_earlier_at(step, now_secs).await?);
        }
        let covered = covered_secs(&self.watermarks().await);
        info!(
            cycles = summaries.len(),
            covered_secs = covered,
            "Pre-warm complete"
        );
        Ok(summaries)
    }

    /// Fetch, merge, recompute, commit. The caller holds the cycle lock.
    /// Watermarks move only if every stage succeeded.
    async fn run_cycle(&self, window: Window) -> IngestResult<IngestSummary> {
        let started = Instant::now();
        let mut timings = CycleTimings::default();

        let (delta, fetch) = match self.fetcher.fetch(window, &self.ignore).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(?window, error = %e, "Ingestion cycle failed, watermarks unchanged");
                return Err(e);
            }
        };
        timings.fetch_ms = started.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let mut graph = self.graph.write().await;
        let stats = graph.apply_delta(&delta, &self.ignore);
        let violations = graph.check_symmetry();
        timings.update_ms = stage.elapsed().as_millis() as u64;

        // Readers may look at the graph while the analysis is rebuilt
        let graph = RwLockWriteGuard::downgrade(graph);
        let (analysis, analysis_timings) = Analysis::compute(&graph);
        drop(graph);
        timings.view_ms = analysis_timings.view_ms;
        timings.islands_ms = analysis_timings.islands_ms;
        timings.so_nearly_ms = analysis_timings.so_nearly_ms;

        let summary_counts = (
            analysis.islands.len(),
            analysis.islands.main().map_or(0, Island::len),
            analysis.so_nearly.len(),
        );
        *self.analysis.write().await = Arc::new(analysis);
        self.watermarks.write().await.commit(window);

        timings.total_ms = started.elapsed().as_millis() as u64;
        let (island_count, main_island_size, so_nearly_count) = summary_counts;
        let summary = IngestSummary {
            window,
            entities_in_window: delta.counts.len(),
            new_entity_count: stats.new_entity_count,
            new_edge_count: stats.new_edge_count,
            total_edge_count: stats.total_edge_count,
            island_count,
            main_island_size,
            so_nearly_count,
            symmetry_violations: violations.len(),
            fetch,
            timings,
        };
        info!(
            after = window.after_secs,
            before = window.before_secs,
            entities = summary.entities_in_window,
            new_entities = summary.new_entity_count,
            new_edges = summary.new_edge_count,
            total_edges = summary.total_edge_count,
            islands = island_count,
            main_island = main_island_size,
            so_nearlies = so_nearly_count,
            failed_lookups = fetch.failed_lookups,
            elapsed_ms = timings.total_ms,
            "Ingestion cycle complete"
        );
        Ok(summary)
    }

    // ---- queries ----

    /// The current analysis snapshot
    pub async fn analysis(&self) -> Arc<Analysis> {
        self.analysis.read().await.clone()
    }

    pub async fn watermarks(&self) -> Watermarks {
        *self.watermarks.read().await
    }

    /// Islands, largest first
    pub async fn islands(&self) -> Vec<Island> {
        self.analysis().await.islands.all().to_vec()
    }

    pub async fn island_of(&self, entity: &Entity) -> Option<Island> {
        self.analysis().await.islands.island_of(entity).cloned()
    }

    /// A short chain between two entities, or empty
    pub async fn chain_between(&self, from: &Entity, to: &Entity) -> Vec<Entity> {
        let analysis = self.analysis().await;
        chain_between(
            &analysis.view,
            &analysis.islands,
            from,
            to,
            self.config.paths.max_expansions,
        )
    }

    /// BFS layers from `root`, or empty
    pub async fn chain_lengths_from(&self, root: &Entity) -> Vec<ChainLayer> {
        chain_lengths(&self.analysis().await.view, root)
    }

    /// So-nearly pairs of the main island, largest overlap first
    pub async fn so_nearlies(&self) -> Vec<SoNearlyPair> {
        self.analysis().await.so_nearly.pairs().to_vec()
    }

    pub async fn so_nearlies_by_entity(&self) -> ByEntity {
        self.analysis().await.so_nearly.by_entity().clone()
    }

    /// Both recommendation lists. `limit` defaults to `recommend.default_limit`.
    pub async fn recommend(&self, entities: &[Entity], limit: Option<usize>) -> Recommendations {
        let limit = limit.unwrap_or(self.config.recommend.default_limit);
        let analysis = self.analysis().await;
        Recommendations {
            so_nearlies: recommend_so_nearlies(&analysis.view, &analysis.so_nearly, entities, limit),
            coocs: recommend_coocs(&analysis.view, &analysis.so_nearly, entities, limit),
        }
    }

    /// Every invariant violation currently detectable
    pub async fn consistency_check(&self) -> Vec<String> {
        let _cycle = self.cycle.lock().await;
        let graph = self.graph.read().await;
        let analysis = self.analysis().await;
        consistency_check(&graph, &analysis)
    }

    pub async fn summary(&self) -> GraphSummary {
        let analysis = self.analysis().await;
        let graph = self.graph.read().await;
        GraphSummary {
            entity_count: graph.entity_count(),
            member_count: graph.member_count(),
            edge_count: graph.edge_count(),
            island_count: analysis.islands.len(),
            main_island_size: analysis.islands.main().map_or(0, Island::len),
            so_nearly_count: analysis.so_nearly.len(),
            ignored_count: self.ignore.len(),
            watermarks: self.watermarks().await,
        }
    }

    pub async fn export(&self) -> GraphExport {
        let graph = self.graph.read().await;
        GraphExport {
            registry: graph.registry().clone(),
            adjacency: graph.adjacency().clone(),
            watermarks: self.watermarks().await,
        }
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn covered_secs(watermarks: &Watermarks) -> i64 {
    match (watermarks.earliest_after_secs, watermarks.latest_before_secs) {
        (Some(earliest), Some(latest)) => latest.saturating_sub(earliest),
        _ => 0,
    }
}
