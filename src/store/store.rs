//! Node store
//!
//! Authoritative mapping of id -> node and type -> nodes, plus the
//! resolved-field cache. Enumeration order is ascending id order.
//!
//! The store has a single writer (the external write path). Every mutation
//! bumps `generation`, which secondary indexes compare against to detect
//! that they were built from an older view of the store.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use super::dependency::{DependencyTracker, PathDependency};
use super::errors::{StoreError, StoreResult};
use super::node::{Node, ResolvedNode};
use super::resolved::{resolve_entries, ResolveConcurrency, ResolvedCache};

/// In-memory node store
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes_by_id: BTreeMap<String, Arc<Node>>,
    nodes_by_type: BTreeMap<String, BTreeMap<String, Arc<Node>>>,
    resolved: ResolvedCache,
    generation: u64,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Write surface (external write path)
    // ---------------------------------------------------------------

    /// Inserts or replaces a node.
    ///
    /// A node's type is fixed at creation; replacing it with a different
    /// type is rejected.
    pub fn add_node(&mut self, node: Node) -> StoreResult<Arc<Node>> {
        if let Some(existing) = self.nodes_by_id.get(node.id()) {
            if existing.node_type() != node.node_type() {
                return Err(StoreError::TypeChanged {
                    id: node.id().to_string(),
                    existing: existing.node_type().to_string(),
                    requested: node.node_type().to_string(),
                });
            }
        }

        let node = Arc::new(node);
        self.nodes_by_id
            .insert(node.id().to_string(), Arc::clone(&node));
        self.nodes_by_type
            .entry(node.node_type().to_string())
            .or_default()
            .insert(node.id().to_string(), Arc::clone(&node));
        self.generation += 1;
        Ok(node)
    }

    /// Removes a node from both maps and drops its overlay
    pub fn delete_node(&mut self, id: &str) -> Option<Arc<Node>> {
        let node = self.nodes_by_id.remove(id)?;
        if let Some(of_type) = self.nodes_by_type.get_mut(node.node_type()) {
            of_type.remove(id);
            if of_type.is_empty() {
                self.nodes_by_type.remove(node.node_type());
            }
        }
        self.resolved.forget(node.node_type(), id);
        self.generation += 1;
        Some(node)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn get_node(&self, id: &str) -> Option<Arc<Node>> {
        self.nodes_by_id.get(id).cloned()
    }

    /// Returns the nodes of `node_type`; empty if the type is unknown
    pub fn get_nodes_by_type(&self, node_type: &str) -> Vec<Arc<Node>> {
        self.nodes_by_type
            .get(node_type)
            .map(|nodes| nodes.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns every type that currently has nodes
    pub fn get_types(&self) -> Vec<String> {
        self.nodes_by_type.keys().cloned().collect()
    }

    /// Iterates over all nodes in store order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes_by_id.values()
    }

    /// True if the node is absent or its digest differs from `digest`.
    ///
    /// Unknown ids count as changed so callers recompute conservatively.
    pub fn has_node_changed(&self, id: &str, digest: &str) -> bool {
        match self.nodes_by_id.get(id) {
            Some(node) => node.content_digest() != digest,
            None => true,
        }
    }

    /// Records `(id, path)` with the dependency tracker, then returns the node.
    ///
    /// The edge is recorded even when the node does not exist yet, so the
    /// artifact is rebuilt once it appears.
    pub fn get_node_and_save_path_dependency(
        &self,
        id: &str,
        path: &str,
        tracker: &dyn DependencyTracker,
    ) -> Option<Arc<Node>> {
        tracker.record(PathDependency::new(id, path));
        self.get_node(id)
    }

    pub fn len(&self) -> usize {
        self.nodes_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_id.is_empty()
    }

    /// Mutation counter; increases on every write and resolved refresh
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ---------------------------------------------------------------
    // Resolved overlay
    // ---------------------------------------------------------------

    /// Stamps a node with its cached overlay for its own type
    pub fn resolve(&self, node: &Arc<Node>) -> ResolvedNode {
        ResolvedNode::new(
            Arc::clone(node),
            self.resolved.get(node.node_type(), node.id()),
        )
    }

    /// Looks up a node of `node_type` and stamps its overlay
    pub fn get_resolved_node(&self, node_type: &str, id: &str) -> Option<ResolvedNode> {
        let node = self.nodes_by_type.get(node_type)?.get(id)?;
        Some(self.resolve(node))
    }

    /// Appends every node of `node_type`, stamped with its overlay, to `sink`
    pub fn add_resolved_nodes(&self, node_type: &str, sink: &mut Vec<ResolvedNode>) {
        if let Some(nodes) = self.nodes_by_type.get(node_type) {
            sink.extend(nodes.values().map(|node| self.resolve(node)));
        }
    }

    /// Returns the node with `id` if its type is one of `type_names`.
    ///
    /// This is the one id-equality fast path; the planner and the executor
    /// both go through it.
    pub fn lookup_id_in_types(&self, id: &str, type_names: &[String]) -> Option<ResolvedNode> {
        let node = self.nodes_by_id.get(id)?;
        type_names
            .iter()
            .any(|name| name == node.node_type())
            .then(|| self.resolve(node))
    }

    /// Recomputes the overlay cache for each of `type_names`.
    ///
    /// Each type's entry is replaced only once all of its resolvers have
    /// succeeded. Types without nodes are skipped.
    pub async fn refresh_resolved_fields<F, Fut, E>(
        &mut self,
        type_names: &[String],
        concurrency: ResolveConcurrency,
        resolver: F,
    ) -> StoreResult<()>
    where
        F: Fn(Arc<Node>) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
    {
        for node_type in type_names {
            let nodes = self.get_nodes_by_type(node_type);
            if nodes.is_empty() {
                continue;
            }

            let entries = resolve_entries(node_type, nodes, concurrency, &resolver).await?;
            self.resolved.replace(node_type.as_str(), entries);
            self.generation += 1;
        }
        Ok(())
    }
}
