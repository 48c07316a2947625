//! Query Context
//!
//! Owns one node store together with its index cache, metrics and
//! configuration. Callers construct one per process (or per test) and pass
//! it to every query and index operation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::executor::{ExecutionResult, QueryExecutor};
use crate::index::IndexManager;
use crate::observability::{log_event, trace_event, Event, MetricsRegistry, ObservationScope};
use crate::planner::{Query, QueryPlanner};
use crate::store::{DependencyTracker, Node, NodeStore};

use super::config::QueryConfig;
use super::error::CoreResult;

/// Store, index cache, metrics and configuration for one query core
#[derive(Debug)]
pub struct QueryContext {
    store: NodeStore,
    indexes: IndexManager,
    metrics: MetricsRegistry,
    config: QueryConfig,
}

impl QueryContext {
    /// Create a context with an empty store
    pub fn new(config: QueryConfig) -> Self {
        Self::with_store(NodeStore::new(), config)
    }

    /// Create a context around an existing store
    pub fn with_store(store: NodeStore, config: QueryConfig) -> Self {
        config.apply_logging();
        log_event(
            Event::ConfigLoaded,
            &[
                ("index_invalidation", format!("{:?}", config.index_invalidation).as_str()),
                ("log_level", config.log_level.as_str()),
                ("resolve_concurrency", format!("{:?}", config.resolve_concurrency).as_str()),
            ],
        );

        Self {
            store,
            indexes: IndexManager::new(config.index_invalidation),
            metrics: MetricsRegistry::new(),
            config,
        }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Write access for the external write path
    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Inserts or replaces a node
    pub fn add_node(&mut self, node: Node) -> CoreResult<Arc<Node>> {
        Ok(self.store.add_node(node)?)
    }

    pub fn has_node_changed(&self, id: &str, digest: &str) -> bool {
        self.store.has_node_changed(id, digest)
    }

    /// Records `(id, path)` with `tracker`, then returns the node
    pub fn get_node_and_save_path_dependency(
        &self,
        id: &str,
        path: &str,
        tracker: &dyn DependencyTracker,
    ) -> Option<Arc<Node>> {
        self.store.get_node_and_save_path_dependency(id, path, tracker)
    }

    /// Plans and executes a query.
    ///
    /// Failures are logged and counted before being returned.
    pub fn run_query(&mut self, query: &Query) -> CoreResult<ExecutionResult> {
        match self.plan_and_execute(query) {
            Ok(result) => {
                self.metrics.increment_queries_executed();
                let returned = result.len().to_string();
                let scanned = result.scanned_count.to_string();
                trace_event(
                    Event::QueryExecuted,
                    &[
                        ("found", if result.outcome.is_found() { "true" } else { "false" }),
                        ("returned", returned.as_str()),
                        ("scan_type", result.scan_type.as_str()),
                        ("scanned", scanned.as_str()),
                    ],
                );
                Ok(result)
            }
            Err(e) => {
                self.metrics.increment_queries_failed();
                let reason = e.to_string();
                log_event(
                    Event::QueryFailed,
                    &[("code", e.code()), ("reason", reason.as_str())],
                );
                Err(e)
            }
        }
    }

    fn plan_and_execute(&mut self, query: &Query) -> CoreResult<ExecutionResult> {
        let plan = QueryPlanner::new(&self.store, &mut self.indexes, &self.metrics).plan(query)?;
        Ok(QueryExecutor::new(&self.store).execute(plan, query)?)
    }

    /// Recomputes the resolved overlay for `type_names` using the configured
    /// resolver concurrency.
    pub async fn refresh_resolved_fields<F, Fut, E>(
        &mut self,
        type_names: &[String],
        resolver: F,
    ) -> CoreResult<()>
    where
        F: Fn(Arc<Node>) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
    {
        let types = type_names.join(",");
        let scope = ObservationScope::with_fields("RESOLVER_REFRESH", &[("types", types.as_str())]);

        let refreshed = self
            .store
            .refresh_resolved_fields(type_names, self.config.resolve_concurrency, resolver)
            .await;

        match refreshed {
            Ok(()) => {
                self.metrics.increment_resolver_refreshes();
                scope.complete();
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                log_event(Event::ResolverFailed, &[("reason", reason.as_str())]);
                scope.fail(&reason);
                Err(e.into())
            }
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreError;
    use crate::executor::QueryOutcome;
    use crate::planner::ScanType;
    use crate::store::MemoryDependencyTracker;
    use serde_json::json;

    fn context() -> QueryContext {
        let mut ctx = QueryContext::default();
        ctx.add_node(Node::new("a", "Post", "da").with_field("slug", json!("/a")))
            .unwrap();
        ctx.add_node(Node::new("b", "Post", "db").with_field("slug", json!("/b")))
            .unwrap();
        ctx
    }

    #[test]
    fn test_run_query_counts() {
        let mut ctx = context();
        let query = Query::new(["Post"]).with_filter(json!({"fields": {"slug": {"eq": "/a"}}}));
        let result = ctx.run_query(&query).unwrap();

        assert_eq!(result.ids(), vec!["a"]);
        assert_eq!(result.scan_type, ScanType::IndexedEquality);
        assert_eq!(ctx.metrics().snapshot().queries_executed, 1);
        assert_eq!(ctx.indexes().index_count(), 1);
    }

    #[test]
    fn test_failed_query_is_counted() {
        let mut ctx = context();
        let query = Query::new(["Post"]).with_filter(json!({"title": {"like": "x"}}));
        let err = ctx.run_query(&query).unwrap_err();

        assert!(matches!(err, CoreError::Executor(_)));
        assert_eq!(err.code(), "NODEQ_FILTER_INVALID");
        assert_eq!(ctx.metrics().snapshot().queries_failed, 1);
    }

    #[test]
    fn test_index_rebuilt_after_write() {
        let mut ctx = context();
        let query = Query::new(["Post"]).with_filter(json!({"fields": {"slug": {"eq": "/c"}}}));
        assert_eq!(ctx.run_query(&query).unwrap().outcome, QueryOutcome::NotFound);

        ctx.add_node(Node::new("c", "Post", "dc").with_field("slug", json!("/c")))
            .unwrap();
        let result = ctx.run_query(&query).unwrap();
        assert_eq!(result.ids(), vec!["c"]);
        assert_eq!(result.scan_type, ScanType::IndexedEquality);
        assert_eq!(ctx.metrics().snapshot().index_builds, 2);
    }

    #[test]
    fn test_dependency_passthrough() {
        let ctx = context();
        let tracker = MemoryDependencyTracker::new();
        assert!(ctx.get_node_and_save_path_dependency("a", "/a", &tracker).is_some());
        assert_eq!(tracker.paths_for("a"), vec!["/a"]);
        assert!(!ctx.has_node_changed("a", "da"));
    }

    #[tokio::test]
    async fn test_refresh_then_filter_on_resolved_field() {
        let mut ctx = context();
        ctx.refresh_resolved_fields(&["Post".to_string()], |node| async move {
            Ok::<_, String>(json!({"title": format!("Title {}", node.id())}))
        })
        .await
        .unwrap();

        let query = Query::new(["Post"])
            .with_filter(json!({"title": {"eq": "Title b"}}))
            .with_resolved_fields(crate::planner::ResolvedFields::new(["title"]));
        let result = ctx.run_query(&query).unwrap();

        assert_eq!(result.ids(), vec!["b"]);
        assert_eq!(ctx.metrics().snapshot().resolver_refreshes, 1);
    }

    #[tokio::test]
    async fn test_refresh_restamps_index_buckets() {
        let mut ctx = context();
        let query = Query::new(["Post"]).with_filter(json!({"fields": {"slug": {"eq": "/a"}}}));

        for round in ["first", "second"] {
            ctx.refresh_resolved_fields(&["Post".to_string()], |_node| async move {
                Ok::<_, String>(json!({"round": round}))
            })
            .await
            .unwrap();

            let result = ctx.run_query(&query).unwrap();
            assert_eq!(result.scan_type, ScanType::IndexedEquality);
            assert_eq!(result.nodes()[0].resolved(), Some(&json!({"round": round})));
        }
        assert_eq!(ctx.metrics().snapshot().index_builds, 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_store_error() {
        let mut ctx = context();
        let err = ctx
            .refresh_resolved_fields(&["Post".to_string()], |_node| async {
                Err::<Value, _>("offline")
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Store(_)));
        assert_eq!(ctx.metrics().snapshot().resolver_refreshes, 0);
    }
}
