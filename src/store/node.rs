//! Node records and the resolved-overlay view
//!
//! A node's attribute body is a JSON object that always carries `id` and
//! `internal: { type, contentDigest }`, so every attribute (including the
//! identity ones) is addressable by a dotted path. Plugin-contributed
//! attributes live under `fields`.

use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::errors::{StoreError, StoreResult};

/// Root segment addressing the resolved overlay of a node
pub const RESOLVED_KEY: &str = "__resolved";

/// Attribute holding plugin-contributed fields
pub const FIELDS_KEY: &str = "fields";

const INTERNAL_KEY: &str = "internal";

/// Read access to attribute paths.
///
/// Implemented for plain JSON values (used by `elemMatch` on array elements),
/// for nodes, and for resolved nodes (which add the `__resolved` root).
pub trait FieldSource {
    /// Returns the value at `path`, or `None` when no value is reachable.
    ///
    /// A non-numeric segment applied to an array is applied to every element;
    /// the reachable values come back as one owned array.
    fn lookup(&self, path: &[String]) -> Option<Cow<'_, Value>>;
}

/// Walks `segments` down from `current`. Numeric segments index arrays;
/// any other segment fans out over the array's elements.
pub(crate) fn descend<'a>(current: &'a Value, segments: &[String]) -> Option<Cow<'a, Value>> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(Cow::Borrowed(current));
    };
    match current {
        Value::Object(map) => descend(map.get(segment)?, rest),
        Value::Array(items) => match segment.parse::<usize>() {
            Ok(position) => descend(items.get(position)?, rest),
            Err(_) => gather(items, segments),
        },
        _ => None,
    }
}

/// Applies `segments` to each element and collects what is reachable.
/// Array leaves are flattened one level; elements without the path are skipped.
fn gather<'a>(items: &'a [Value], segments: &[String]) -> Option<Cow<'a, Value>> {
    let mut values = Vec::new();
    for item in items {
        match descend(item, segments).map(Cow::into_owned) {
            Some(Value::Array(inner)) => values.extend(inner),
            Some(leaf) => values.push(leaf),
            None => {}
        }
    }
    if values.is_empty() {
        return None;
    }
    Some(Cow::Owned(Value::Array(values)))
}

/// Splits a dotted path into segments
pub fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

impl FieldSource for Value {
    fn lookup(&self, path: &[String]) -> Option<Cow<'_, Value>> {
        descend(self, path)
    }
}

/// A typed record held by the node store
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    node_type: String,
    content_digest: String,
    body: Map<String, Value>,
}

impl Node {
    /// Creates a node with no attributes beyond its identity
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        content_digest: impl Into<String>,
    ) -> Self {
        let mut node = Self {
            id: id.into(),
            node_type: node_type.into(),
            content_digest: content_digest.into(),
            body: Map::new(),
        };
        node.stamp_identity();
        node
    }

    /// Parses a node from a JSON object.
    ///
    /// Requires `id`, `internal.type` and `internal.contentDigest` strings.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        let Value::Object(body) = value else {
            return Err(StoreError::MalformedNode("node must be a JSON object".into()));
        };

        let text = |path: &[&str]| -> StoreResult<String> {
            let mut current = body.get(path[0]);
            for segment in &path[1..] {
                current = current.and_then(|v| v.get(segment));
            }
            current
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| StoreError::MalformedNode(format!("missing string '{}'", path.join("."))))
        };

        let id = text(&["id"])?;
        let node_type = text(&[INTERNAL_KEY, "type"])?;
        let content_digest = text(&[INTERNAL_KEY, "contentDigest"])?;

        Ok(Self {
            id,
            node_type,
            content_digest,
            body,
        })
    }

    /// Sets a native attribute. `id` and `internal.type`/`internal.contentDigest`
    /// always keep the node's identity values.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self.stamp_identity();
        self
    }

    /// Sets a plugin-contributed field under `fields`
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        let fields = self
            .body
            .entry(FIELDS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !fields.is_object() {
            *fields = Value::Object(Map::new());
        }
        if let Value::Object(map) = fields {
            map.insert(name.into(), value);
        }
        self
    }

    fn stamp_identity(&mut self) {
        self.body.insert("id".into(), Value::String(self.id.clone()));
        let internal = self
            .body
            .entry(INTERNAL_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !internal.is_object() {
            *internal = Value::Object(Map::new());
        }
        if let Value::Object(map) = internal {
            map.insert("type".into(), json!(self.node_type));
            map.insert("contentDigest".into(), json!(self.content_digest));
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    /// Returns the full attribute body
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Returns a plugin field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(FIELDS_KEY)?.get(name)
    }

    /// Returns the value at a dotted path
    pub fn value_at(&self, path: &str) -> Option<Cow<'_, Value>> {
        self.lookup(&split_path(path))
    }
}

impl FieldSource for Node {
    fn lookup(&self, path: &[String]) -> Option<Cow<'_, Value>> {
        let (first, rest) = path.split_first()?;
        descend(self.body.get(first)?, rest)
    }
}

/// A node stamped with its resolved overlay.
///
/// This is what queries return: the shared node plus the externally computed
/// value cached for it at the time the view was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    node: Arc<Node>,
    resolved: Option<Arc<Value>>,
}

impl ResolvedNode {
    pub fn new(node: Arc<Node>, resolved: Option<Arc<Value>>) -> Self {
        Self { node, resolved }
    }

    /// Returns the shared node
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Returns the overlay value, if one was cached for this node
    pub fn resolved(&self) -> Option<&Value> {
        self.resolved.as_deref()
    }
}

impl Deref for ResolvedNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl FieldSource for ResolvedNode {
    fn lookup(&self, path: &[String]) -> Option<Cow<'_, Value>> {
        match path.split_first() {
            Some((first, rest)) if first == RESOLVED_KEY => descend(self.resolved.as_deref()?, rest),
            _ => self.node.lookup(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Node {
        Node::new("a", "Post", "d1")
            .with_attribute("title", json!("Hello"))
            .with_attribute("tags", json!(["x", "y"]))
            .with_field("slug", json!("/a"))
    }

    #[test]
    fn test_identity_is_addressable() {
        let node = post();
        assert_eq!(node.value_at("id").as_deref(), Some(&json!("a")));
        assert_eq!(node.value_at("internal.type").as_deref(), Some(&json!("Post")));
        assert_eq!(node.value_at("internal.contentDigest").as_deref(), Some(&json!("d1")));
    }

    #[test]
    fn test_identity_survives_overwrite() {
        let node = post().with_attribute("internal", json!({"owner": "plugin"}));
        assert_eq!(node.value_at("internal.type").as_deref(), Some(&json!("Post")));
        assert_eq!(node.value_at("internal.owner").as_deref(), Some(&json!("plugin")));
        let node = node.with_attribute("id", json!("forged"));
        assert_eq!(node.value_at("id").as_deref(), Some(&json!("a")));
    }

    #[test]
    fn test_fields_and_array_paths() {
        let node = post();
        assert_eq!(node.field("slug"), Some(&json!("/a")));
        assert_eq!(node.value_at("fields.slug").as_deref(), Some(&json!("/a")));
        assert_eq!(node.value_at("tags.1").as_deref(), Some(&json!("y")));
        assert_eq!(node.value_at("tags.7").as_deref(), None);
        assert_eq!(node.value_at("title.nope").as_deref(), None);
    }

    #[test]
    fn test_paths_fan_out_over_arrays_of_objects() {
        let node = post().with_attribute(
            "authors",
            json!([
                {"name": "ann", "langs": ["en", "fr"]},
                {"nick": "b"},
                {"name": "bob", "langs": ["de"]}
            ]),
        );

        assert_eq!(node.value_at("authors.name").as_deref(), Some(&json!(["ann", "bob"])));
        assert_eq!(node.value_at("authors.langs").as_deref(), Some(&json!(["en", "fr", "de"])));
        assert_eq!(node.value_at("authors.2.name").as_deref(), Some(&json!("bob")));
        assert_eq!(node.value_at("authors.email"), None);
        assert_eq!(node.value_at("tags.name"), None);
    }

    #[test]
    fn test_from_json() {
        let node = Node::from_json(json!({
            "id": "b",
            "internal": {"type": "Post", "contentDigest": "d2"},
            "fields": {"slug": "/b"}
        }))
        .unwrap();
        assert_eq!(node.id(), "b");
        assert_eq!(node.node_type(), "Post");
        assert_eq!(node.field("slug"), Some(&json!("/b")));
    }

    #[test]
    fn test_from_json_rejects_missing_type() {
        let err = Node::from_json(json!({"id": "b", "internal": {}})).unwrap_err();
        assert!(matches!(err, StoreError::MalformedNode(_)));
        assert!(Node::from_json(json!("b")).is_err());
    }

    #[test]
    fn test_resolved_overlay_lookup() {
        let resolved = ResolvedNode::new(Arc::new(post()), Some(Arc::new(json!({"date": "2020"}))));
        assert_eq!(resolved.lookup(&split_path("__resolved.date")).as_deref(), Some(&json!("2020")));
        assert_eq!(resolved.lookup(&split_path("title")).as_deref(), Some(&json!("Hello")));

        let bare = ResolvedNode::new(Arc::new(post()), None);
        assert_eq!(bare.lookup(&split_path("__resolved.date")).as_deref(), None);
        assert_eq!(bare.id(), "a");
    }
}
