//! Hashable index keys derived from JSON values
//!
//! Scalars map to one key. Arrays map to the keys of their scalar elements
//! (multikey), so a bucket holds exactly the nodes an `eq` predicate would
//! match. `null`, objects and nested arrays are not indexed.

use serde_json::Value;

/// Index key representing a scalar field value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Bool(bool),
    Int(i64),
    /// Float stored as order-preserving bits
    Float(u64),
    String(String),
}

impl IndexKey {
    /// Create a key from a float.
    ///
    /// `-0.0` and `0.0` compare equal as JSON numbers, so they share a key.
    pub fn from_float(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Integral floats share a key with the equal integer
    fn from_number(v: f64) -> Self {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            IndexKey::Int(v as i64)
        } else {
            IndexKey::from_float(v)
        }
    }

    /// Create a key from a scalar JSON value
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(IndexKey::Int(i)),
                None => n.as_f64().map(Self::from_number),
            },
            Value::String(s) => Some(IndexKey::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// All keys under which a node holding `value` is indexed
    pub fn keys_for(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => {
                let mut keys: Vec<Self> = items.iter().filter_map(Self::from_json).collect();
                keys.sort();
                keys.dedup();
                keys
            }
            scalar => Self::from_json(scalar).into_iter().collect(),
        }
    }
}
