//! Per-cycle facet query cache

use super::{FacetCounts, FacetQuery};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Successful facet search results keyed by the exact query.
/// Only lives for one ingestion cycle; the fetcher flushes it when the cycle ends.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<FacetQuery, FacetCounts>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, query: &FacetQuery) -> Option<FacetCounts> {
        self.entries.lock().await.get(query).cloned()
    }

    pub async fn insert(&self, query: FacetQuery, counts: FacetCounts) {
        self.entries.lock().await.insert(query, counts);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Drop every entry, returning how many there were
    pub async fn flush(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let flushed = entries.len();
        entries.clear();
        flushed
    }
}
