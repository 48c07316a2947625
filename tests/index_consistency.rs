//! Index Consistency Tests
//!
//! Tests for secondary index invariants:
//! - Index builds are idempotent per (types, path)
//! - Type order does not change the index used
//! - Writes after a build are visible under the default invalidation policy
//! - Under `Never`, the build is a point-in-time snapshot

use nodequery::index::{IndexInvalidation, IndexManager, IndexStats};
use nodequery::planner::{Query, ScanType};
use nodequery::store::{Node, NodeStore};
use nodequery::{QueryConfig, QueryContext};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn types(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn store() -> NodeStore {
    let mut store = NodeStore::new();
    for (id, node_type, lang) in [
        ("p1", "Post", "en"),
        ("p2", "Post", "fr"),
        ("g1", "Page", "en"),
        ("a1", "Author", "en"),
    ] {
        store
            .add_node(
                Node::new(id, node_type, "d")
                    .with_field("lang", json!(lang))
                    .with_attribute("frontmatter", json!({"draft": id == "p2"})),
            )
            .unwrap();
    }
    store
}

fn ids(nodes: Option<Vec<nodequery::ResolvedNode>>) -> Vec<String> {
    nodes
        .unwrap_or_default()
        .iter()
        .map(|n| n.id().to_string())
        .collect()
}

// =============================================================================
// Build Tests
// =============================================================================

/// Second build for the same key is a no-op.
#[test]
fn test_build_is_idempotent() {
    let store = store();
    let mut manager = IndexManager::default();

    assert!(manager.ensure_index(&store, "fields/lang", &types(&["Post"])).unwrap());
    assert!(!manager.ensure_index(&store, "fields/lang", &types(&["Post"])).unwrap());
    assert_eq!(manager.index_count(), 1);
}

/// Candidate type order does not matter.
#[test]
fn test_type_order_shares_index() {
    let store = store();
    let mut manager = IndexManager::default();

    manager
        .ensure_index(&store, "fields/lang", &types(&["Post", "Page"]))
        .unwrap();
    assert!(!manager
        .ensure_index(&store, "fields/lang", &types(&["Page", "Post"]))
        .unwrap());

    let found = manager.lookup(&store, "fields/lang", &json!("en"), &types(&["Page", "Post"]));
    assert_eq!(ids(found), vec!["g1", "p1"]);
}

/// Buckets only hold nodes of the candidate types.
#[test]
fn test_buckets_restricted_to_types() {
    let store = store();
    let mut manager = IndexManager::default();
    manager
        .ensure_index(&store, "frontmatter.draft", &types(&["Post"]))
        .unwrap();

    let drafts = manager.lookup(&store, "frontmatter.draft", &json!(true), &types(&["Post"]));
    assert_eq!(ids(drafts), vec!["p2"]);

    let published = manager.lookup(&store, "frontmatter.draft", &json!(false), &types(&["Post"]));
    assert_eq!(ids(published), vec!["p1"]);

    assert_eq!(
        manager.stats(),
        IndexStats {
            indexes: 1,
            buckets: 2,
            entries: 2,
        }
    );
}

/// `id` is a point lookup restricted to the candidate types.
#[test]
fn test_id_lookup_bypasses_index() {
    let store = store();
    let manager = IndexManager::default();

    let found = manager.lookup(&store, "id", &json!("a1"), &types(&["Author"]));
    assert_eq!(ids(found), vec!["a1"]);
    assert!(manager
        .lookup(&store, "id", &json!("a1"), &types(&["Post"]))
        .is_none());
    assert_eq!(manager.index_count(), 0);
}

/// Malformed paths are rejected.
#[test]
fn test_invalid_path() {
    let store = store();
    let mut manager = IndexManager::default();

    for path in ["", "a..b", "fields/", ".lang"] {
        let err = manager.ensure_index(&store, path, &types(&["Post"])).unwrap_err();
        assert_eq!(err.code().code(), "NODEQ_INDEX_INVALID_PATH");
    }
}

// =============================================================================
// Staleness Tests
// =============================================================================

/// Default policy: writes after a build are visible to the next query.
#[test]
fn test_generation_policy_sees_writes() {
    let mut ctx = QueryContext::with_store(store(), QueryConfig::default());
    let query = Query::new(["Post"]).with_filter(json!({"fields": {"lang": {"eq": "de"}}}));
    assert!(!ctx.run_query(&query).unwrap().outcome.is_found());

    ctx.add_node(Node::new("p3", "Post", "d").with_field("lang", json!("de")))
        .unwrap();
    let result = ctx.run_query(&query).unwrap();

    assert_eq!(result.scan_type, ScanType::IndexedEquality);
    assert_eq!(result.ids(), vec!["p3"]);
}

/// `Never` policy: a built index is a snapshot; misses fall back to a scan.
#[test]
fn test_never_policy_keeps_snapshot() {
    let config = QueryConfig::default().with_index_invalidation(IndexInvalidation::Never);
    let mut ctx = QueryContext::with_store(store(), config);

    let query = Query::new(["Post"]).with_filter(json!({"fields": {"lang": {"eq": "en"}}}));
    assert_eq!(ctx.run_query(&query).unwrap().ids(), vec!["p1"]);

    ctx.add_node(Node::new("p0", "Post", "d").with_field("lang", json!("en")))
        .unwrap();
    let result = ctx.run_query(&query).unwrap();
    assert_eq!(result.ids(), vec!["p1"]);
    assert_eq!(ctx.metrics().snapshot().index_builds, 1);
}
