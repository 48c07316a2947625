//! Result sorting for query execution
//!
//! Multi-key, stable. Sort fields declared as resolved are read from the
//! overlay.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

use crate::planner::{ResolvedFields, SortDirection, SortSpec};
use crate::store::{FieldSource, ResolvedNode};

/// Sorts resolved nodes
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts nodes by every key in `sort_spec`, in order.
    ///
    /// Sort is stable: nodes with equal keys keep their relative order.
    /// A multi-valued key sorts by its smallest element ascending and its
    /// largest element descending.
    pub fn sort(nodes: &mut [ResolvedNode], sort_spec: &SortSpec, resolved: &ResolvedFields) {
        if nodes.len() <= 1 || sort_spec.is_empty() {
            return;
        }

        let keys: Vec<(Vec<String>, SortDirection)> = sort_spec
            .keys()
            .iter()
            .map(|key| (resolved.target(&key.field), key.direction))
            .collect();

        let mut keyed: Vec<(Vec<Option<Value>>, ResolvedNode)> = nodes
            .iter()
            .map(|node| {
                let values = keys
                    .iter()
                    .map(|(path, direction)| Self::sort_value(node.lookup(path), *direction))
                    .collect();
                (values, node.clone())
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            for ((direction, a), b) in keys.iter().map(|(_, d)| d).zip(a).zip(b) {
                let ordering = Self::compare_values(a.as_ref(), b.as_ref());
                let ordering = match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        for (slot, (_, node)) in nodes.iter_mut().zip(keyed) {
            *slot = node;
        }
    }

    fn sort_value(value: Option<Cow<'_, Value>>, direction: SortDirection) -> Option<Value> {
        match value.map(Cow::into_owned) {
            Some(Value::Array(items)) if !items.is_empty() => {
                let order = |a: &&Value, b: &&Value| Self::compare_values(Some(*a), Some(*b));
                let picked = match direction {
                    SortDirection::Asc => items.iter().min_by(order),
                    SortDirection::Desc => items.iter().max_by(order),
                };
                picked.cloned()
            }
            other => other,
        }
    }

    /// Compares two optional JSON values for sorting.
    ///
    /// Ordering rules:
    /// - null < bool < number < string < array < object < missing
    /// - For same types, natural ordering
    pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                let a_type = type_order(a_val);
                let b_type = type_order(b_val);

                if a_type != b_type {
                    return a_type.cmp(&b_type);
                }

                match (a_val, b_val) {
                    (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
                    (Value::Number(a_n), Value::Number(b_n)) => {
                        let a_f = a_n.as_f64().unwrap_or(0.0);
                        let b_f = b_n.as_f64().unwrap_or(0.0);
                        a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                    // Null, arrays and objects are not compared
                    _ => Ordering::Equal,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Node;
    use serde_json::json;
    use std::sync::Arc;

    fn make_node(id: &str, body: Value) -> ResolvedNode {
        let mut node = Node::new(id, "Post", "d");
        if let Value::Object(map) = body {
            for (key, value) in map {
                node = node.with_attribute(key, value);
            }
        }
        ResolvedNode::new(Arc::new(node), None)
    }

    fn ids(nodes: &[ResolvedNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id()).collect()
    }

    #[test]
    fn test_sort_ascending() {
        let mut nodes = vec![
            make_node("c", json!({"age": 30})),
            make_node("a", json!({"age": 20})),
            make_node("b", json!({"age": 25})),
        ];

        ResultSorter::sort(&mut nodes, &SortSpec::asc("age"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_descending() {
        let mut nodes = vec![
            make_node("c", json!({"age": 30})),
            make_node("a", json!({"age": 20})),
            make_node("b", json!({"age": 25})),
        ];

        ResultSorter::sort(&mut nodes, &SortSpec::desc("age"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_stable() {
        let mut nodes = vec![
            make_node("b", json!({"age": 25})),
            make_node("c", json!({"age": 25})),
            make_node("a", json!({"age": 25})),
        ];

        ResultSorter::sort(&mut nodes, &SortSpec::asc("age"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_multi_key() {
        let mut nodes = vec![
            make_node("1", json!({"group": "x", "rank": 1})),
            make_node("2", json!({"group": "y", "rank": 5})),
            make_node("3", json!({"group": "x", "rank": 7})),
        ];

        let spec = SortSpec::asc("group").then_desc("rank");
        ResultSorter::sort(&mut nodes, &spec, &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_missing_values_last_ascending() {
        let mut nodes = vec![
            make_node("none", json!({})),
            make_node("two", json!({"age": 2})),
            make_node("one", json!({"age": 1})),
        ];

        ResultSorter::sort(&mut nodes, &SortSpec::asc("age"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["one", "two", "none"]);

        ResultSorter::sort(&mut nodes, &SortSpec::desc("age"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["none", "two", "one"]);
    }

    #[test]
    fn test_sort_by_resolved_field() {
        let overlay = |date: &str| Some(Arc::new(json!({"date": date})));
        let mut nodes = vec![
            ResolvedNode::new(Arc::new(Node::new("a", "Post", "d")), overlay("2021")),
            ResolvedNode::new(Arc::new(Node::new("b", "Post", "d")), overlay("2019")),
            ResolvedNode::new(Arc::new(Node::new("c", "Post", "d")), overlay("2020")),
        ];

        let resolved = ResolvedFields::new(["date"]);
        ResultSorter::sort(&mut nodes, &SortSpec::asc("date"), &resolved);
        assert_eq!(ids(&nodes), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_through_arrays_of_objects() {
        let authors = |names: Value| json!({"authors": names});
        let mut nodes = vec![
            make_node("x", authors(json!([{"name": "cy"}, {"name": "al"}]))),
            make_node("y", authors(json!([{"name": "bo"}]))),
            make_node("z", authors(json!([{"name": "di"}, {"name": "bo"}]))),
        ];

        ResultSorter::sort(&mut nodes, &SortSpec::asc("authors.name"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["x", "y", "z"]);

        ResultSorter::sort(&mut nodes, &SortSpec::desc("authors.name"), &ResolvedFields::default());
        assert_eq!(ids(&nodes), vec!["z", "x", "y"]);
    }

    #[test]
    fn test_type_ordering() {
        use std::cmp::Ordering::*;
        assert_eq!(ResultSorter::compare_values(Some(&json!(null)), Some(&json!(false))), Less);
        assert_eq!(ResultSorter::compare_values(Some(&json!(1)), Some(&json!("1"))), Less);
        assert_eq!(ResultSorter::compare_values(Some(&json!(2.5)), Some(&json!(2))), Greater);
        assert_eq!(ResultSorter::compare_values(Some(&json!({})), None), Less);
    }
}
