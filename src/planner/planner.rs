//! Query planner
//!
//! Picks the cheapest correct strategy, first match wins:
//! 1. Indexed equality on a single plugin field
//! 2. Point lookup on `id`
//! 3. Full scan of every candidate type, filtered by the executor
//!
//! Shortcut plans carry their final nodes; a full-scan plan carries the
//! unfiltered candidates.

use std::collections::HashSet;

use crate::index::{FieldPath, IndexError, IndexId, IndexManager};
use crate::observability::{log_event, trace_event, Event, MetricsRegistry};
use crate::store::{NodeStore, ResolvedNode};

use super::ast::Query;
use super::errors::{PlannerError, PlannerResult};

/// Scan type used by query plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    /// Bucket from a secondary index
    IndexedEquality,
    /// Point lookup by id
    IdLookup,
    /// Every node of every candidate type
    FullScan,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::IndexedEquality => "INDEX_EQ",
            ScanType::IdLookup => "PK_LOOKUP",
            ScanType::FullScan => "FULL_SCAN",
        }
    }
}

/// Query plan with its candidate nodes
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub scan_type: ScanType,
    /// Final nodes for shortcut plans, unfiltered candidates for full scans
    pub candidates: Vec<ResolvedNode>,
    /// Index used by an indexed-equality plan
    pub index_key: Option<String>,
}

/// Query planner over one store and its index cache
pub struct QueryPlanner<'a> {
    store: &'a NodeStore,
    indexes: &'a mut IndexManager,
    metrics: &'a MetricsRegistry,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(
        store: &'a NodeStore,
        indexes: &'a mut IndexManager,
        metrics: &'a MetricsRegistry,
    ) -> Self {
        Self {
            store,
            indexes,
            metrics,
        }
    }

    /// Plans a query.
    ///
    /// Index failures during the indexed-equality shortcut are logged and
    /// returned; there is no fallback to a scan.
    pub fn plan(&mut self, query: &Query) -> PlannerResult<QueryPlan> {
        let types = query.node_types.join(",");
        trace_event(Event::QueryReceived, &[("types", types.as_str())]);

        let plan = match self.indexed_equality(query)? {
            Some(plan) => plan,
            None => match self.id_lookup(query) {
                Some(plan) => plan,
                None => self.full_scan(query),
            },
        };

        let candidates = plan.candidates.len().to_string();
        trace_event(
            Event::QueryPlanned,
            &[
                ("candidates", candidates.as_str()),
                ("scan_type", plan.scan_type.as_str()),
                ("types", types.as_str()),
            ],
        );
        Ok(plan)
    }

    fn indexed_equality(&mut self, query: &Query) -> PlannerResult<Option<QueryPlan>> {
        let Some((name, value)) = query.field_eq_shortcut() else {
            return Ok(None);
        };

        let fail = |e: IndexError| {
            let reason = format!("{}", e);
            log_event(
                Event::IndexShortcutFailed,
                &[("field", name), ("path", e.path()), ("reason", reason.as_str())],
            );
            PlannerError::index_shortcut_failed(name, e)
        };

        let path = FieldPath::plugin_field(name).map_err(fail)?;
        let built = self
            .indexes
            .ensure_index(self.store, path.as_str(), &query.node_types)
            .map_err(fail)?;
        if built {
            self.metrics.increment_index_builds();
        }

        match self
            .indexes
            .lookup(self.store, path.as_str(), value, &query.node_types)
        {
            Some(bucket) if !bucket.is_empty() => {
                self.metrics.increment_index_shortcut_hits();
                Ok(Some(QueryPlan {
                    scan_type: ScanType::IndexedEquality,
                    candidates: bucket,
                    index_key: Some(IndexId::new(&query.node_types, &path).to_string()),
                }))
            }
            _ => Ok(None),
        }
    }

    fn id_lookup(&self, query: &Query) -> Option<QueryPlan> {
        let id = query.id_eq_shortcut()?;
        let node = self.store.lookup_id_in_types(id, &query.node_types)?;
        self.metrics.increment_id_shortcut_hits();
        Some(QueryPlan {
            scan_type: ScanType::IdLookup,
            candidates: vec![node],
            index_key: None,
        })
    }

    /// Resolved nodes of every candidate type, types in query order
    fn full_scan(&self, query: &Query) -> QueryPlan {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for node_type in &query.node_types {
            if seen.insert(node_type.as_str()) {
                self.store.add_resolved_nodes(node_type, &mut candidates);
            }
        }
        self.metrics.increment_full_scans();
        QueryPlan {
            scan_type: ScanType::FullScan,
            candidates,
            index_key: None,
        }
    }
}
