//! Counters and latency telemetry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::vector::IndexKind;

/// Live counters, updated lock-free except for the optimization timestamp.
#[derive(Debug, Default)]
pub struct Stats {
    searches: AtomicU64,
    search_micros: AtomicU64,
    documents_added: AtomicU64,
    last_optimization: Mutex<Option<DateTime<Utc>>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.search_micros.fetch_add(micros, Ordering::Relaxed);
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_add(&self) -> u64 {
        self.documents_added.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn mark_optimized(&self) -> DateTime<Utc> {
        let now = Utc::now();
        *self.last_optimization.lock() = Some(now);
        now
    }

    pub fn search_count(&self) -> u64 {
        self.searches.load(Ordering::Relaxed)
    }

    /// Documents added since this process started.
    pub fn documents_added(&self) -> u64 {
        self.documents_added.load(Ordering::Relaxed)
    }

    /// Mean search latency in milliseconds, `0.0` before the first search.
    pub fn avg_search_time_ms(&self) -> f64 {
        let count = self.search_count();
        if count == 0 {
            return 0.0;
        }
        self.search_micros.load(Ordering::Relaxed) as f64 / count as f64 / 1000.0
    }

    pub fn last_optimization(&self) -> Option<DateTime<Utc>> {
        *self.last_optimization.lock()
    }
}

/// Estimated heap usage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub index_bytes: usize,
    pub metadata_bytes: usize,
    pub cache_bytes: usize,
}

impl MemoryUsage {
    pub fn total(&self) -> usize {
        self.index_bytes + self.metadata_bytes + self.cache_bytes
    }
}

/// Point-in-time view returned by `VectorDatabase::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Vector slots handed out, including documents loaded from disk.
    pub total_vectors: u64,
    pub total_documents: usize,
    pub total_indices: usize,
    pub cached_embeddings: usize,
    pub cache_hit_rate: f64,
    pub fallback_embeddings: u64,
    pub search_count: u64,
    pub avg_search_time_ms: f64,
    pub last_optimization: Option<DateTime<Utc>>,
    pub index_kind: IndexKind,
    pub documents_per_language: BTreeMap<String, usize>,
    pub memory: MemoryUsage,
}
