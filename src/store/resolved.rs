//! Resolved-field cache
//!
//! Per type, a mapping of node id to an externally computed overlay value.
//! A type's entry is replaced wholesale by a refresh pass; it is never merged.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::node::Node;

/// How resolver invocations for one type are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveConcurrency {
    /// Each resolver is awaited to completion before the next starts
    #[default]
    Sequential,
    /// Up to `n` resolvers in flight; results keep enumeration order
    Bounded(usize),
}

/// Overlay values for one type, keyed by node id
pub type ResolvedEntries = HashMap<String, Arc<Value>>;

/// Per-type overlay cache
#[derive(Debug, Default)]
pub struct ResolvedCache {
    by_type: HashMap<String, ResolvedEntries>,
}

impl ResolvedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for `node_type`
    pub fn replace(&mut self, node_type: impl Into<String>, entries: ResolvedEntries) {
        self.by_type.insert(node_type.into(), entries);
    }

    /// Returns the cached overlay for a node
    pub fn get(&self, node_type: &str, id: &str) -> Option<Arc<Value>> {
        self.by_type.get(node_type)?.get(id).cloned()
    }

    /// Drops a single node's overlay (used when the node is deleted)
    pub fn forget(&mut self, node_type: &str, id: &str) {
        if let Some(entries) = self.by_type.get_mut(node_type) {
            entries.remove(id);
        }
    }
}

/// Runs `resolver` over `nodes` and collects the results for one type.
///
/// The first failure aborts the pass; nothing is returned for the type.
pub(crate) async fn resolve_entries<F, Fut, E>(
    node_type: &str,
    nodes: Vec<Arc<Node>>,
    concurrency: ResolveConcurrency,
    resolver: &F,
) -> StoreResult<ResolvedEntries>
where
    F: Fn(Arc<Node>) -> Fut,
    Fut: Future<Output = Result<Value, E>>,
    E: fmt::Display,
{
    let failed = |node: &Node, err: E| StoreError::ResolverFailed {
        id: node.id().to_string(),
        node_type: node_type.to_string(),
        reason: err.to_string(),
    };

    match concurrency {
        ResolveConcurrency::Sequential => {
            let mut entries = ResolvedEntries::with_capacity(nodes.len());
            for node in nodes {
                let value = resolver(Arc::clone(&node)).await.map_err(|e| failed(&node, e))?;
                entries.insert(node.id().to_string(), Arc::new(value));
            }
            Ok(entries)
        }
        ResolveConcurrency::Bounded(limit) => {
            let resolved: Vec<(String, Value)> = stream::iter(nodes)
                .map(|node| {
                    let pending = resolver(Arc::clone(&node));
                    async move {
                        match pending.await {
                            Ok(value) => Ok((node.id().to_string(), value)),
                            Err(e) => Err(failed(&node, e)),
                        }
                    }
                })
                .buffered(limit.max(1))
                .try_collect()
                .await?;

            Ok(resolved
                .into_iter()
                .map(|(id, value)| (id, Arc::new(value)))
                .collect())
        }
    }
}
