//! Result types for query execution

use crate::planner::ScanType;
use crate::store::ResolvedNode;

/// What a query produced.
///
/// - first-only mode always yields `Found` with zero or one node
/// - many mode yields `NotFound` when nothing matched, never an empty `Found`
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    NotFound,
    Found(Vec<ResolvedNode>),
}

impl QueryOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, QueryOutcome::Found(_))
    }

    /// Matched nodes; empty for `NotFound`
    pub fn nodes(&self) -> &[ResolvedNode] {
        match self {
            QueryOutcome::NotFound => &[],
            QueryOutcome::Found(nodes) => nodes,
        }
    }

    pub fn into_nodes(self) -> Option<Vec<ResolvedNode>> {
        match self {
            QueryOutcome::NotFound => None,
            QueryOutcome::Found(nodes) => Some(nodes),
        }
    }
}

/// Result of query execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub outcome: QueryOutcome,
    /// Strategy that produced the outcome
    pub scan_type: ScanType,
    /// Number of candidate nodes examined
    pub scanned_count: usize,
}

impl ExecutionResult {
    /// Returns the matched nodes in result order
    pub fn nodes(&self) -> &[ResolvedNode] {
        self.outcome.nodes()
    }

    /// Returns the number of results
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// Returns the ids of the matched nodes in result order
    pub fn ids(&self) -> Vec<&str> {
        self.nodes().iter().map(|node| node.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Node;
    use std::sync::Arc;

    #[test]
    fn test_not_found_is_distinct_from_empty() {
        let empty = QueryOutcome::Found(Vec::new());
        assert_ne!(empty, QueryOutcome::NotFound);
        assert!(empty.is_found());
        assert_eq!(QueryOutcome::NotFound.into_nodes(), None);
        assert!(QueryOutcome::NotFound.nodes().is_empty());
    }

    #[test]
    fn test_execution_result_accessors() {
        let node = ResolvedNode::new(Arc::new(Node::new("a", "Post", "d")), None);
        let result = ExecutionResult {
            outcome: QueryOutcome::Found(vec![node]),
            scan_type: ScanType::FullScan,
            scanned_count: 3,
        };
        assert_eq!(result.len(), 1);
        assert_eq!(result.ids(), vec!["a"]);
        assert!(!result.is_empty());
    }
}
