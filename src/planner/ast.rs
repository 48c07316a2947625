//! Query argument structures
//!
//! A `Query` is a transient bundle: candidate types, a JSON filter tree, an
//! optional multi-key sort, the first-only mode flag, and the set of field
//! paths that must be read from the resolved overlay.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::store::{split_path, FIELDS_KEY, RESOLVED_KEY};

use super::errors::{PlannerError, PlannerResult};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `ASC` / `DESC` in any case
    pub fn parse(order: &str) -> Option<Self> {
        if order.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if order.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Dotted field path
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered list of sort keys; earlier keys take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Builds a sort from parallel field and order lists.
    ///
    /// Both lists must have the same length; orders are `ASC`/`DESC`.
    pub fn new<F: AsRef<str>, O: AsRef<str>>(fields: &[F], orders: &[O]) -> PlannerResult<Self> {
        if fields.len() != orders.len() {
            return Err(PlannerError::query_invalid(format!(
                "sort has {} fields but {} orders",
                fields.len(),
                orders.len()
            )));
        }

        let keys = fields
            .iter()
            .zip(orders)
            .map(|(field, order)| {
                let direction = SortDirection::parse(order.as_ref()).ok_or_else(|| {
                    PlannerError::query_invalid(format!("unknown sort order '{}'", order.as_ref()))
                })?;
                Ok(SortKey {
                    field: field.as_ref().to_string(),
                    direction,
                })
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        Ok(Self { keys })
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::default().then_asc(field)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::default().then_desc(field)
    }

    pub fn then_asc(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction: SortDirection::Asc,
        });
        self
    }

    pub fn then_desc(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction: SortDirection::Desc,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Dotted field paths whose values come from the resolved overlay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    paths: BTreeSet<String>,
}

impl ResolvedFields {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Flattens a nested descriptor object into dotted paths.
    ///
    /// Leaves are non-object values and empty objects. Anything other than
    /// an object yields no paths.
    pub fn from_json(descriptor: &Value) -> Self {
        fn walk(map: &Map<String, Value>, prefix: &str, out: &mut BTreeSet<String>) {
            for (key, value) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                match value {
                    Value::Object(inner) if !inner.is_empty() => walk(inner, &path, out),
                    _ => {
                        out.insert(path);
                    }
                }
            }
        }

        let mut paths = BTreeSet::new();
        if let Value::Object(map) = descriptor {
            walk(map, "", &mut paths);
        }
        Self { paths }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// True when `path` must be read from the overlay: it equals a declared
    /// path, is an ancestor of one, or lies beneath one.
    pub fn redirects(&self, path: &str) -> bool {
        self.paths.iter().any(|declared| {
            declared == path
                || is_segment_prefix(declared, path)
                || is_segment_prefix(path, declared)
        })
    }

    /// Segments addressing `path` on a resolved node
    pub fn target(&self, path: &str) -> Vec<String> {
        let mut segments = split_path(path);
        if self.redirects(path) {
            segments.insert(0, RESOLVED_KEY.to_string());
        }
        segments
    }
}

/// True if `path` starts with `prefix` followed by a `.`
fn is_segment_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .map_or(false, |rest| rest.starts_with('.'))
}

/// Query argument bundle
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Candidate types, in lookup order
    pub node_types: Vec<String>,
    /// Filter tree; `Null` or `{}` matches everything
    pub filter: Value,
    pub sort: Option<SortSpec>,
    /// Return at most one node
    pub first_only: bool,
    pub resolved_fields: ResolvedFields,
}

impl Query {
    pub fn new<I, S>(node_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            node_types: node_types.into_iter().map(Into::into).collect(),
            filter: Value::Object(Map::new()),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn first_only(mut self) -> Self {
        self.first_only = true;
        self
    }

    pub fn with_resolved_fields(mut self, resolved_fields: ResolvedFields) -> Self {
        self.resolved_fields = resolved_fields;
        self
    }

    /// Matches `{ fields: { <name>: { eq: <value> } } }` exactly.
    ///
    /// Returns `None` when the field is read from the overlay, since the
    /// index is built over native values.
    pub fn field_eq_shortcut(&self) -> Option<(&str, &Value)> {
        let (key, fields) = single_entry(&self.filter)?;
        if key != FIELDS_KEY {
            return None;
        }
        let (name, ops) = single_entry(fields)?;
        let (op, value) = single_entry(ops)?;
        if op != "eq" || self.resolved_fields.redirects(&format!("{}.{}", FIELDS_KEY, name)) {
            return None;
        }
        Some((name.as_str(), value))
    }

    /// Matches `{ id: { eq: <string> } }` exactly
    pub fn id_eq_shortcut(&self) -> Option<&str> {
        id_equality(&self.filter)
    }
}

/// The id from a filter shaped exactly `{ id: { eq: <string> } }`
pub fn id_equality(filter: &Value) -> Option<&str> {
    let (key, ops) = single_entry(filter)?;
    let (op, value) = single_entry(ops)?;
    if key == "id" && op == "eq" {
        value.as_str()
    } else {
        None
    }
}

/// The only entry of a one-key object
fn single_entry(value: &Value) -> Option<(&String, &Value)> {
    match value {
        Value::Object(map) if map.len() == 1 => map.iter().next(),
        _ => None,
    }
}
