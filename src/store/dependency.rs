//! Path dependency boundary
//!
//! Reading a node while generating an artifact records an edge
//! `(node id, artifact path)` with the incremental-build layer. That layer
//! lives outside this crate; `DependencyTracker` is its entry point.

use std::sync::Mutex;

/// An edge between a generated artifact and a node it read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathDependency {
    pub node_id: String,
    pub path: String,
}

impl PathDependency {
    pub fn new(node_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            path: path.into(),
        }
    }
}

/// Receives dependency edges from node reads
pub trait DependencyTracker {
    fn record(&self, dependency: PathDependency);
}

/// Tracker that keeps edges in memory, in recording order
#[derive(Debug, Default)]
pub struct MemoryDependencyTracker {
    edges: Mutex<Vec<PathDependency>>,
}

impl MemoryDependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded edges
    pub fn edges(&self) -> Vec<PathDependency> {
        match self.edges.lock() {
            Ok(edges) => edges.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the artifact paths that depend on `node_id`
    pub fn paths_for(&self, node_id: &str) -> Vec<String> {
        self.edges()
            .into_iter()
            .filter(|edge| edge.node_id == node_id)
            .map(|edge| edge.path)
            .collect()
    }
}

impl DependencyTracker for MemoryDependencyTracker {
    fn record(&self, dependency: PathDependency) {
        match self.edges.lock() {
            Ok(mut edges) => edges.push(dependency),
            Err(poisoned) => poisoned.into_inner().push(dependency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let tracker = MemoryDependencyTracker::new();
        tracker.record(PathDependency::new("a", "/blog/a"));
        tracker.record(PathDependency::new("b", "/blog/b"));
        tracker.record(PathDependency::new("a", "/index"));

        assert_eq!(tracker.edges().len(), 3);
        assert_eq!(tracker.paths_for("a"), vec!["/blog/a", "/index"]);
        assert!(tracker.paths_for("zzz").is_empty());
    }
}
