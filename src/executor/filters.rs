//! Filter predicate compiler
//!
//! Compiles a JSON filter tree into a list of clauses combined with AND.
//!
//! - A key whose value is an object extends the dotted path
//! - A key whose value is anything else is an operator on the current path
//! - `elemMatch` takes a nested filter evaluated against each array element;
//!   operators directly inside it apply to the element itself
//!
//! Paths declared as resolved fields are redirected to the `__resolved`
//! overlay. Array-valued attributes match when any element satisfies the
//! operator; `ne` and `nin` are exact negations of `eq` and `in`.

use std::cmp::Ordering;

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::index::IndexKey;
use crate::planner::ResolvedFields;
use crate::store::{split_path, FieldSource};

const ELEM_MATCH: &str = "elemMatch";

/// Filter compilation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter must be an object, got {0}")]
    NotAnObject(String),

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{operator}' must be applied to a field")]
    MissingPath { operator: String },

    #[error("operator '{operator}' expects {expected}")]
    InvalidOperand {
        operator: String,
        expected: &'static str,
    },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

pub type FilterResult<T> = Result<T, FilterError>;

/// Supported filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    In,
    Nin,
    Gt,
    Gte,
    Lt,
    Lte,
    Regex,
    Glob,
}

impl Operator {
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "in" => Operator::In,
            "nin" => Operator::Nin,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "regex" => Operator::Regex,
            "glob" => Operator::Glob,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Regex => "regex",
            Operator::Glob => "glob",
        }
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(Value),
    Ne(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    /// `gt`, `gte`, `lt` or `lte`
    Range(Operator, Value),
    Regex(Regex),
    Glob(GlobMatcher),
    ElemMatch(Box<CompiledFilter>),
}

impl Condition {
    fn test(&self, actual: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => equals(actual, expected),
            Condition::Ne(expected) => !equals(actual, expected),
            Condition::In(options) => options.iter().any(|o| equals(actual, o)),
            Condition::Nin(options) => !options.iter().any(|o| equals(actual, o)),
            Condition::Range(op, bound) => any_value(actual, |v| in_range(*op, v, bound)),
            Condition::Regex(re) => any_value(actual, |v| v.as_str().map_or(false, |s| re.is_match(s))),
            Condition::Glob(glob) => {
                any_value(actual, |v| v.as_str().map_or(false, |s| glob.is_match(s)))
            }
            Condition::ElemMatch(inner) => match actual {
                Some(Value::Array(items)) => items.iter().any(|item| inner.matches(item)),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Clause {
    path: Vec<String>,
    condition: Condition,
}

/// A compiled filter: every clause must hold
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    clauses: Vec<Clause>,
}

impl CompiledFilter {
    /// True when the filter has no clauses and matches everything
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn matches<S: FieldSource + ?Sized>(&self, source: &S) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.condition.test(source.lookup(&clause.path).as_deref()))
    }
}

/// Compiles filters for one query's resolved-field set
pub struct FilterCompiler<'a> {
    resolved: &'a ResolvedFields,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(resolved: &'a ResolvedFields) -> Self {
        Self { resolved }
    }

    /// Compiles a filter tree. `null` compiles to the empty filter.
    pub fn compile(&self, filter: &Value) -> FilterResult<CompiledFilter> {
        match filter {
            Value::Null => Ok(CompiledFilter::default()),
            Value::Object(map) => {
                let mut clauses = Vec::new();
                self.compile_object(map, &mut Vec::new(), true, &mut clauses)?;
                Ok(CompiledFilter { clauses })
            }
            other => Err(FilterError::NotAnObject(kind(other).to_string())),
        }
    }

    fn compile_object(
        &self,
        map: &Map<String, Value>,
        path: &mut Vec<String>,
        top_level: bool,
        clauses: &mut Vec<Clause>,
    ) -> FilterResult<()> {
        for (key, value) in map {
            if key == ELEM_MATCH {
                let Value::Object(inner) = value else {
                    return Err(FilterError::InvalidOperand {
                        operator: ELEM_MATCH.to_string(),
                        expected: "an object",
                    });
                };
                let mut nested = Vec::new();
                self.compile_object(inner, &mut Vec::new(), false, &mut nested)?;
                let condition = Condition::ElemMatch(Box::new(CompiledFilter { clauses: nested }));
                clauses.push(self.clause(path, top_level, ELEM_MATCH, condition)?);
            } else if let Value::Object(inner) = value {
                let depth = path.len();
                path.extend(split_path(key));
                let result = self.compile_object(inner, path, top_level, clauses);
                path.truncate(depth);
                result?;
            } else {
                let operator =
                    Operator::parse(key).ok_or_else(|| FilterError::UnknownOperator(key.clone()))?;
                let condition = compile_condition(operator, value)?;
                clauses.push(self.clause(path, top_level, operator.as_str(), condition)?);
            }
        }
        Ok(())
    }

    /// Paths inside `elemMatch` are relative to the element and never redirected
    fn clause(
        &self,
        path: &[String],
        top_level: bool,
        operator: &str,
        condition: Condition,
    ) -> FilterResult<Clause> {
        if !top_level {
            return Ok(Clause {
                path: path.to_vec(),
                condition,
            });
        }
        if path.is_empty() {
            return Err(FilterError::MissingPath {
                operator: operator.to_string(),
            });
        }
        Ok(Clause {
            path: self.resolved.target(&path.join(".")),
            condition,
        })
    }
}

fn compile_condition(operator: Operator, operand: &Value) -> FilterResult<Condition> {
    let invalid = |expected| FilterError::InvalidOperand {
        operator: operator.as_str().to_string(),
        expected,
    };

    let condition = match operator {
        Operator::Eq => Condition::Eq(operand.clone()),
        Operator::Ne => Condition::Ne(operand.clone()),
        Operator::In | Operator::Nin => {
            let options = operand.as_array().ok_or_else(|| invalid("an array"))?.clone();
            if operator == Operator::In {
                Condition::In(options)
            } else {
                Condition::Nin(options)
            }
        }
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            Condition::Range(operator, operand.clone())
        }
        Operator::Regex => {
            let source = operand.as_str().ok_or_else(|| invalid("a string"))?;
            Condition::Regex(prepare_regex(source)?)
        }
        Operator::Glob => {
            let pattern = operand.as_str().ok_or_else(|| invalid("a string"))?;
            Condition::Glob(compile_glob(pattern)?)
        }
    };
    Ok(condition)
}

/// Compiles `/pattern/flags` (or a bare pattern) into a regex.
///
/// Supported flags: i (case-insensitive), m (multiline), s (dot-all),
/// x (ignore whitespace). `g` and `u` are accepted and have no effect.
pub fn prepare_regex(source: &str) -> FilterResult<Regex> {
    let (pattern, flags) = source
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])))
        .unwrap_or((source, ""));

    let invalid = |reason: String| FilterError::InvalidPattern {
        pattern: source.to_string(),
        reason,
    };

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'g' | 'u' => {}
            c => return Err(invalid(format!("unknown regex flag '{}'", c))),
        }
    }
    builder.build().map_err(|e| invalid(e.to_string()))
}

/// Compiles a shell glob; `*` stays within one `/` segment, `**` crosses them
pub fn compile_glob(pattern: &str) -> FilterResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// `eq` semantics: missing equals null; arrays match on any element
fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(value) => {
            same_value(value, expected)
                || matches!(value, Value::Array(items) if items.iter().any(|item| same_value(item, expected)))
        }
    }
}

/// Deep equality; numbers compare by value so `2` equals `2.0`
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => IndexKey::from_json(a) == IndexKey::from_json(b),
        _ => a == b,
    }
}

/// Applies `pred` to the value, or to each element of an array value
fn any_value(actual: Option<&Value>, pred: impl Fn(&Value) -> bool) -> bool {
    match actual {
        None => false,
        Some(Value::Array(items)) => items.iter().any(|item| pred(item)),
        Some(value) => pred(value),
    }
}

/// Orders numbers with numbers and strings with strings; anything else fails
fn in_range(operator: Operator, value: &Value, bound: &Value) -> bool {
    let ordering = match (value, bound) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };

    match (operator, ordering) {
        (Operator::Gt, Some(o)) => o == Ordering::Greater,
        (Operator::Gte, Some(o)) => o != Ordering::Less,
        (Operator::Lt, Some(o)) => o == Ordering::Less,
        (Operator::Lte, Some(o)) => o != Ordering::Greater,
        _ => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
