//! Query metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Relaxed atomics; exact values, no ordering guarantees between counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for query planning and execution
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
    index_shortcut_hits: AtomicU64,
    id_shortcut_hits: AtomicU64,
    full_scans: AtomicU64,
    index_builds: AtomicU64,
    resolver_refreshes: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_shortcut_hits(&self) {
        self.index_shortcut_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_id_shortcut_hits(&self) {
        self.id_shortcut_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_full_scans(&self) {
        self.full_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_builds(&self) {
        self.index_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolver_refreshes(&self) {
        self.resolver_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Current metrics as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            index_shortcut_hits: self.index_shortcut_hits.load(Ordering::Relaxed),
            id_shortcut_hits: self.id_shortcut_hits.load(Ordering::Relaxed),
            full_scans: self.full_scans.load(Ordering::Relaxed),
            index_builds: self.index_builds.load(Ordering::Relaxed),
            resolver_refreshes: self.resolver_refreshes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub index_shortcut_hits: u64,
    pub id_shortcut_hits: u64,
    pub full_scans: u64,
    pub index_builds: u64,
    pub resolver_refreshes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_queries_executed();
        registry.increment_queries_executed();
        registry.increment_index_shortcut_hits();
        registry.increment_full_scans();
        registry.increment_index_builds();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.queries_executed, 2);
        assert_eq!(snapshot.index_shortcut_hits, 1);
        assert_eq!(snapshot.full_scans, 1);
        assert_eq!(snapshot.index_builds, 1);
        assert_eq!(snapshot.id_shortcut_hits, 0);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_id_shortcut_hits();

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["id_shortcut_hits"], 1);
        assert_eq!(parsed["queries_failed"], 0);
    }
}
