//! Secondary index manager
//!
//! Lazily built, cached mapping of (candidate type set, field path) to
//! (field value -> nodes holding that value).
//!
//! # API
//!
//! - `ensure_index(store, path, types)` - Build the index unless a fresh one exists
//! - `ensure_field_index(store, name, types)` - Same, for `fields/<name>`
//! - `lookup(store, path, value, types)` - Bucket for a value; `id` is a point lookup
//! - `lookup_field(store, name, value, types)` - Same, for `fields/<name>`
//!
//! An index is a point-in-time snapshot of the store. It records the store
//! generation it was built at; under `IndexInvalidation::Generation` an
//! index from an older generation is treated as absent and rebuilt.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observability::{log_event, Event, ObservationScope};
use crate::store::{split_path, FieldSource, NodeStore, ResolvedNode, FIELDS_KEY};

use super::errors::{IndexError, IndexResult};
use super::key::IndexKey;

const FIELD_PREFIX: &str = "fields/";

/// What happens to an index after the store it was built from changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexInvalidation {
    /// Indexes built at an older store generation are rebuilt on next use
    #[default]
    Generation,
    /// Indexes are built once and kept for the process lifetime
    Never,
}

/// A parsed index field path.
///
/// `fields/<name>` addresses the plugin field `<name>` (itself dotted for
/// nested plugin fields); anything else is a dotted native attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> IndexResult<Self> {
        let segments = match raw.strip_prefix(FIELD_PREFIX) {
            Some("") => return Err(IndexError::invalid_path(raw, "empty field name")),
            Some(name) => {
                let mut segments = vec![FIELDS_KEY.to_string()];
                segments.extend(split_path(name));
                segments
            }
            None => split_path(raw),
        };
        if segments.iter().any(String::is_empty) {
            return Err(IndexError::invalid_path(raw, "empty path segment"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Path for the plugin field `name`
    pub fn plugin_field(name: &str) -> IndexResult<Self> {
        Self::parse(&format!("{}{}", FIELD_PREFIX, name))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// Composite cache key: sorted, de-duplicated type names plus field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexId {
    types: String,
    path: String,
}

impl IndexId {
    pub fn new(type_names: &[String], path: &FieldPath) -> Self {
        let types: BTreeSet<&str> = type_names.iter().map(String::as_str).collect();
        Self {
            types: types.into_iter().collect::<Vec<_>>().join(","),
            path: path.as_str().to_string(),
        }
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.types, self.path)
    }
}

/// One built index
#[derive(Debug, Default)]
struct FieldIndex {
    generation: u64,
    buckets: HashMap<IndexKey, Vec<ResolvedNode>>,
    entries: usize,
}

/// Aggregate size of all cached indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub indexes: usize,
    pub buckets: usize,
    pub entries: usize,
}

/// Cache of lazily built secondary indexes
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: HashMap<IndexId, FieldIndex>,
    invalidation: IndexInvalidation,
}

impl IndexManager {
    pub fn new(invalidation: IndexInvalidation) -> Self {
        Self {
            indexes: HashMap::new(),
            invalidation,
        }
    }

    fn is_fresh(&self, index: &FieldIndex, store: &NodeStore) -> bool {
        match self.invalidation {
            IndexInvalidation::Never => true,
            IndexInvalidation::Generation => index.generation == store.generation(),
        }
    }

    /// Builds the index for `(type_names, field_path)` unless a fresh one exists.
    ///
    /// Returns `true` if a build happened. The build is one pass over every
    /// node in the store; nodes of other types and nodes where the path is
    /// undefined are skipped.
    pub fn ensure_index(
        &mut self,
        store: &NodeStore,
        field_path: &str,
        type_names: &[String],
    ) -> IndexResult<bool> {
        let path = FieldPath::parse(field_path)?;
        let id = IndexId::new(type_names, &path);

        if let Some(existing) = self.indexes.get(&id) {
            if self.is_fresh(existing, store) {
                return Ok(false);
            }
            let built_at = existing.generation.to_string();
            let current = store.generation().to_string();
            let label = id.to_string();
            log_event(
                Event::IndexStale,
                &[
                    ("built_at", built_at.as_str()),
                    ("generation", current.as_str()),
                    ("index", label.as_str()),
                ],
            );
        }

        let label = id.to_string();
        let scope = ObservationScope::with_fields("INDEX_BUILD", &[("index", label.as_str())]);

        let wanted: HashSet<&str> = type_names.iter().map(String::as_str).collect();
        let mut index = FieldIndex {
            generation: store.generation(),
            ..FieldIndex::default()
        };

        for node in store.nodes() {
            if !wanted.contains(node.node_type()) {
                continue;
            }
            let Some(value) = node.lookup(path.segments()) else {
                continue;
            };
            for key in IndexKey::keys_for(&value) {
                index.buckets.entry(key).or_default().push(store.resolve(node));
                index.entries += 1;
            }
        }

        let buckets = index.buckets.len().to_string();
        let entries = index.entries.to_string();
        scope.complete_with_fields(&[("buckets", buckets.as_str()), ("entries", entries.as_str())]);

        self.indexes.insert(id, index);
        Ok(true)
    }

    /// `ensure_index` for the plugin field `name`
    pub fn ensure_field_index(
        &mut self,
        store: &NodeStore,
        name: &str,
        type_names: &[String],
    ) -> IndexResult<bool> {
        let path = FieldPath::plugin_field(name)?;
        self.ensure_index(store, path.as_str(), type_names)
    }

    /// Returns the nodes whose value at `field_path` is `value`.
    ///
    /// `id` bypasses the index: it is a point lookup restricted to
    /// `type_names`. Otherwise `None` means no fresh index, no bucket, or a
    /// value that cannot be indexed.
    pub fn lookup(
        &self,
        store: &NodeStore,
        field_path: &str,
        value: &Value,
        type_names: &[String],
    ) -> Option<Vec<ResolvedNode>> {
        if field_path == "id" {
            let node = store.lookup_id_in_types(value.as_str()?, type_names)?;
            return Some(vec![node]);
        }

        let path = FieldPath::parse(field_path).ok()?;
        let index = self.indexes.get(&IndexId::new(type_names, &path))?;
        if !self.is_fresh(index, store) {
            return None;
        }

        let key = IndexKey::from_json(value)?;
        index.buckets.get(&key).cloned()
    }

    /// `lookup` for the plugin field `name`
    pub fn lookup_field(
        &self,
        store: &NodeStore,
        name: &str,
        value: &Value,
        type_names: &[String],
    ) -> Option<Vec<ResolvedNode>> {
        let path = FieldPath::plugin_field(name).ok()?;
        self.lookup(store, path.as_str(), value, type_names)
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            indexes: self.indexes.len(),
            buckets: self.indexes.values().map(|i| i.buckets.len()).sum(),
            entries: self.indexes.values().map(|i| i.entries).sum(),
        }
    }

    /// Drops every cached index
    pub fn clear(&mut self) {
        self.indexes.clear();
    }
}
