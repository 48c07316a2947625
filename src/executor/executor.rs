//! Query executor
//!
//! Turns a plan into an outcome.
//!
//! - Shortcut plans (indexed equality, id lookup) already hold their result
//! - Full-scan plans run the compiled filter over the candidates:
//!   - first-only: first match in candidate order, or nothing
//!   - many: every match, then a stable sort; `NotFound` when nothing matched

use crate::planner::{Query, QueryPlan, ScanType};
use crate::store::{NodeStore, ResolvedNode};

use super::errors::ExecutorResult;
use super::filters::FilterCompiler;
use super::result::{ExecutionResult, QueryOutcome};
use super::sorter::ResultSorter;

/// Query executor over one store
pub struct QueryExecutor<'a> {
    store: &'a NodeStore,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        Self { store }
    }

    /// Executes a plan produced for `query`.
    ///
    /// Fails only when the filter does not compile.
    pub fn execute(&self, plan: QueryPlan, query: &Query) -> ExecutorResult<ExecutionResult> {
        let scan_type = plan.scan_type;
        let (outcome, scanned_count) = match scan_type {
            ScanType::IndexedEquality if query.first_only => {
                let scanned = plan.candidates.len();
                let first = first_in_scan_order(plan.candidates, &query.node_types);
                (QueryOutcome::Found(first.into_iter().collect()), scanned)
            }
            ScanType::IndexedEquality | ScanType::IdLookup => {
                let scanned = plan.candidates.len();
                (QueryOutcome::Found(plan.candidates), scanned)
            }
            ScanType::FullScan => self.scan(plan.candidates, query)?,
        };

        Ok(ExecutionResult {
            outcome,
            scan_type,
            scanned_count,
        })
    }

    fn scan(
        &self,
        mut candidates: Vec<ResolvedNode>,
        query: &Query,
    ) -> ExecutorResult<(QueryOutcome, usize)> {
        let filter = FilterCompiler::new(&query.resolved_fields).compile(&query.filter)?;

        if let Some(id) = query.id_eq_shortcut() {
            let outcome = match self.store.lookup_id_in_types(id, &query.node_types) {
                Some(node) => QueryOutcome::Found(vec![node]),
                None if query.first_only => QueryOutcome::Found(Vec::new()),
                None => QueryOutcome::NotFound,
            };
            return Ok((outcome, 1));
        }

        if query.first_only {
            let position = candidates.iter().position(|node| filter.matches(node));
            let scanned = position.map_or(candidates.len(), |p| p + 1);
            let first = position.map(|p| candidates.swap_remove(p));
            return Ok((QueryOutcome::Found(first.into_iter().collect()), scanned));
        }

        let scanned = candidates.len();
        let mut matched: Vec<ResolvedNode> = if filter.is_empty() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|node| filter.matches(node))
                .collect()
        };

        if matched.is_empty() {
            return Ok((QueryOutcome::NotFound, scanned));
        }
        if let Some(sort) = &query.sort {
            ResultSorter::sort(&mut matched, sort, &query.resolved_fields);
        }
        Ok((QueryOutcome::Found(matched), scanned))
    }
}

/// The node a full scan would reach first: earliest candidate type, then id
fn first_in_scan_order(nodes: Vec<ResolvedNode>, node_types: &[String]) -> Option<ResolvedNode> {
    let rank = |node: &ResolvedNode| {
        node_types
            .iter()
            .position(|t| t == node.node_type())
            .unwrap_or(usize::MAX)
    };
    nodes
        .into_iter()
        .min_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.id().cmp(b.id())))
}
