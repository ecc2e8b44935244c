//! Throttled facet fetcher
//!
//! One ingestion window costs one unconstrained search plus one constrained
//! search per entity of interest. The per-entity lookups run through a
//! semaphore of `max_concurrent` permits, start staggered across
//! `spread_delay_ms`, and retry with exponential backoff and jitter. A lookup
//! that exhausts its attempts contributes no neighbours; a failing window
//! search fails the whole cycle.

use crate::config::IngestConfig;
use crate::graph::{Entity, FacetDelta, IgnoreSet, Window};
use crate::ingest::{
    is_well_formed, FacetCounts, FacetQuery, FacetSearch, IngestError, IngestResult, QueryCache,
};
use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Request accounting for one ingestion cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStats {
    /// Facet queries issued, cache hits included
    pub requests: usize,
    /// Calls that reached the provider
    pub attempts: usize,
    pub retries: usize,
    pub cache_hits: usize,
    /// Neighbour lookups that exhausted their attempts
    pub failed_lookups: usize,
    /// Malformed identifiers dropped
    pub discarded: usize,
}

impl FetchStats {
    fn record(&mut self, lookup: &Lookup) {
        self.requests += 1;
        self.attempts += lookup.attempts as usize;
        self.retries += lookup.attempts.saturating_sub(1) as usize;
        if lookup.cache_hit {
            self.cache_hits += 1;
        }
    }
}

/// Outcome of one cached, retried query
struct Lookup {
    counts: IngestResult<FacetCounts>,
    attempts: u32,
    cache_hit: bool,
}

pub struct Fetcher {
    search: Arc<dyn FacetSearch>,
    cache: QueryCache,
    semaphore: Semaphore,
    config: IngestConfig,
}

impl Fetcher {
    pub fn new(search: Arc<dyn FacetSearch>, config: IngestConfig) -> Self {
        info!(
            max_concurrent = config.max_concurrent,
            max_attempts = config.max_attempts,
            "Facet fetcher ready"
        );
        Self {
            search,
            cache: QueryCache::new(),
            semaphore: Semaphore::new(config.max_concurrent.max(1)),
            config,
        }
    }

    /// Refuse further requests. Lookups waiting for a permit fail with
    /// [`IngestError::Cancelled`]; calls already in flight finish.
    pub fn shutdown(&self) {
        self.semaphore.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Fetch the delta for `window`. The query cache is flushed before
    /// returning, whether the cycle succeeded or not.
    pub async fn fetch(
        &self,
        window: Window,
        ignore: &IgnoreSet,
    ) -> IngestResult<(FacetDelta, FetchStats)> {
        let result = self.fetch_window(window, ignore).await;
        let flushed = self.cache.flush().await;
        debug!(flushed, "Query cache flushed");
        result
    }

    async fn fetch_window(
        &self,
        window: Window,
        ignore: &IgnoreSet,
    ) -> IngestResult<(FacetDelta, FetchStats)> {
        let mut stats = FetchStats::default();
        let mut delta = FacetDelta::default();

        let lookup = {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|_| IngestError::Cancelled)?;
            self.query(&FacetQuery::window(window)).await
        };
        stats.record(&lookup);
        let window_counts = lookup.counts?;

        for (entity, count) in window_counts {
            if ignore.contains(&entity) {
                continue;
            }
            if !is_well_formed(&entity) {
                debug!(entity = %entity, "Discarding malformed entity");
                stats.discarded += 1;
                continue;
            }
            delta.counts.insert(entity, count);
        }

        let targets: Vec<Entity> = delta
            .counts
            .keys()
            .filter(|entity| self.config.wants(entity))
            .cloned()
            .collect();
        debug!(
            entities = delta.counts.len(),
            targets = targets.len(),
            "Window search completed"
        );

        let total = targets.len();
        let lookups = join_all(
            targets
                .iter()
                .enumerate()
                .map(|(i, target)| self.lookup_neighbors(window, target, i, total)),
        )
        .await;

        for (target, lookup) in targets.into_iter().zip(lookups) {
            let lookup = lookup?;
            stats.record(&lookup);
            match lookup.counts {
                Ok(counts) => {
                    let neighbors = self.neighbors_of(&target, counts, ignore, &mut stats);
                    delta.neighbors.insert(target, neighbors);
                }
                Err(e) => {
                    warn!(
                        entity = %target,
                        attempts = lookup.attempts,
                        error = %e,
                        "Neighbour lookup failed, no neighbours this cycle"
                    );
                    stats.failed_lookups += 1;
                }
            }
        }

        Ok((delta, stats))
    }

    /// Co-mentions of `target` worth an edge: wanted ontologies, well formed,
    /// not ignored, not the target itself
    fn neighbors_of(
        &self,
        target: &Entity,
        counts: FacetCounts,
        ignore: &IgnoreSet,
        stats: &mut FetchStats,
    ) -> Vec<Entity> {
        counts
            .into_keys()
            .filter(|entity| entity != target && self.config.wants(entity) && !ignore.contains(entity))
            .filter(|entity| {
                let ok = is_well_formed(entity);
                if !ok {
                    stats.discarded += 1;
                }
                ok
            })
            .collect()
    }

    /// One staggered, throttled neighbour lookup. Only cancellation is an error here;
    /// upstream failures are carried inside the returned [`Lookup`].
    async fn lookup_neighbors(
        &self,
        window: Window,
        target: &Entity,
        position: usize,
        total: usize,
    ) -> IngestResult<Lookup> {
        let delay = stagger(
            Duration::from_millis(self.config.spread_delay_ms),
            position,
            total,
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| IngestError::Cancelled)?;
        Ok(self
            .query(&FacetQuery::constrained(window, target.clone()))
            .await)
    }

    /// Cached search with up to `max_attempts` calls
    async fn query(&self, query: &FacetQuery) -> Lookup {
        if let Some(counts) = self.cache.get(query).await {
            return Lookup {
                counts: Ok(counts),
                attempts: 0,
                cache_hit: true,
            };
        }

        let max_attempts = self.config.max_attempts.max(1);
        let base = Duration::from_millis(self.config.retry_base_ms);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            match self.search.search_facets(query).await {
                Ok(counts) => {
                    self.cache.insert(query.clone(), counts.clone()).await;
                    return Lookup {
                        counts: Ok(counts),
                        attempts: attempt + 1,
                        cache_hit: false,
                    };
                }
                Err(e) => {
                    if attempt + 1 < max_attempts {
                        let backoff = retry_backoff(base, attempt);
                        warn!(
                            ?query,
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %e,
                            "Facet search failed, retrying after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Lookup {
            counts: Err(last_error
                .unwrap_or_else(|| IngestError::ApiError("no attempt made".to_string()))),
            attempts: max_attempts,
            cache_hit: false,
        }
    }
}

/// Initial delay of request `position` out of `total`, spread evenly over `spread`
pub fn stagger(spread: Duration, position: usize, total: usize) -> Duration {
    if total == 0 {
        return Duration::ZERO;
    }
    spread.mul_f64(position as f64 / total as f64)
}

/// `base * 3^attempt` plus up to `base` of random jitter
pub fn retry_backoff(base: Duration, attempt: u32) -> Duration {
    let backoff = base.saturating_mul(3u32.saturating_pow(attempt));
    let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
    backoff.saturating_add(Duration::from_millis(jitter_ms))
}
