//! Filter predicates.
//!
//! A [`Filter`] is a conjunction of per-field predicates. Every predicate on
//! every field must hold for a node to match.
//!
//! # JSON Form
//!
//! ```json
//! {
//!   "price":  { "between": [120, 150] },
//!   "tags":   { "containsAny": ["rust", "web"] },
//!   "title":  { "regex": "/^lorem/i" },
//!   "author": "2"
//! }
//! ```
//!
//! A bare value is shorthand for `eq`. Operator names may carry a leading
//! `$` (`$in`, `$gte`).
//!
//! # Undefined Values
//!
//! A missing field (or `null`) never satisfies a positive predicate. It does
//! satisfy `ne`, `nin`, `containsNone` and `exists: false`.

use super::{FieldLookup, comparable, compare_values, values_equal};
use crate::error::{StoreError, StoreResult};
use crate::store::Node;
use crate::store::value::is_reference;
use crate::utils::date::{parse_date_value, same_day};
use crate::utils::slug::is_reserved;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

/// One predicate on a field value.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Inclusive on both ends
    Between(Value, Value),
    Regex(Regex),
    /// All of the values
    Contains(Vec<Value>),
    ContainsAny(Vec<Value>),
    ContainsNone(Vec<Value>),
    Exists(bool),
    /// List length
    Size(usize),
    /// Same UTC calendar day
    Dteq(DateTime<Utc>),
}

impl Predicate {
    /// Evaluate against a (possibly undefined) field value.
    pub fn test(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return matches!(
                self,
                Self::Ne(_) | Self::Nin(_) | Self::ContainsNone(_) | Self::Exists(false)
            );
        };

        match self {
            Self::Eq(expected) => values_equal(value, expected),
            Self::Ne(expected) => !values_equal(value, expected),
            Self::In(list) => is_in(value, list),
            Self::Nin(list) => !is_in(value, list),
            Self::Gt(bound) => ordering(value, bound) == Some(Ordering::Greater),
            Self::Gte(bound) => matches!(ordering(value, bound), Some(Ordering::Greater | Ordering::Equal)),
            Self::Lt(bound) => ordering(value, bound) == Some(Ordering::Less),
            Self::Lte(bound) => matches!(ordering(value, bound), Some(Ordering::Less | Ordering::Equal)),
            Self::Between(low, high) => {
                matches!(ordering(value, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(ordering(value, high), Some(Ordering::Less | Ordering::Equal))
            }
            Self::Regex(re) => match value {
                Value::String(s) => re.is_match(s),
                Value::Array(items) => items
                    .iter()
                    .any(|item| item.as_str().is_some_and(|s| re.is_match(s))),
                _ => false,
            },
            Self::Contains(list) => list.iter().all(|needle| contains(value, needle)),
            Self::ContainsAny(list) => list.iter().any(|needle| contains(value, needle)),
            Self::ContainsNone(list) => !list.iter().any(|needle| contains(value, needle)),
            Self::Exists(expected) => *expected,
            Self::Size(len) => value.as_array().is_some_and(|items| items.len() == *len),
            Self::Dteq(date) => parse_date_value(value).is_some_and(|d| same_day(&d, date)),
        }
    }

    /// Parse `op: argument`.
    fn from_op(op: &str, arg: &Value) -> StoreResult<Self> {
        let op = op.strip_prefix('$').unwrap_or(op);
        let predicate = match op {
            "eq" => Self::Eq(arg.clone()),
            "ne" => Self::Ne(arg.clone()),
            "in" => Self::In(list_arg(op, arg)?),
            "nin" => Self::Nin(list_arg(op, arg)?),
            "gt" => Self::Gt(arg.clone()),
            "gte" => Self::Gte(arg.clone()),
            "lt" => Self::Lt(arg.clone()),
            "lte" => Self::Lte(arg.clone()),
            "between" => match arg.as_array().map(Vec::as_slice) {
                Some([low, high]) => Self::Between(low.clone(), high.clone()),
                _ => return Err(invalid(format!("`between` expects [low, high], got {arg}"))),
            },
            "regex" => {
                let pattern = arg
                    .as_str()
                    .ok_or_else(|| invalid(format!("`regex` expects a string, got {arg}")))?;
                Self::Regex(compile_regex(pattern)?)
            }
            "contains" => Self::Contains(list_or_scalar(arg)),
            "containsAny" => Self::ContainsAny(list_or_scalar(arg)),
            "containsNone" => Self::ContainsNone(list_or_scalar(arg)),
            "exists" => Self::Exists(
                arg.as_bool()
                    .ok_or_else(|| invalid(format!("`exists` expects a bool, got {arg}")))?,
            ),
            "size" => Self::Size(
                arg.as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| invalid(format!("`size` expects a count, got {arg}")))?,
            ),
            "dteq" => Self::Dteq(
                parse_date_value(arg)
                    .ok_or_else(|| invalid(format!("`dteq` expects a date, got {arg}")))?,
            ),
            other => return Err(invalid(format!("unknown operator `{other}`"))),
        };
        Ok(predicate)
    }
}

/// Predicates on one field.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub predicates: Vec<Predicate>,
}

/// A conjunction of field predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fields: Vec<FieldFilter>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate on `field` (`.` separates nested names).
    pub fn field(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        let field = field.into();
        match self.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.predicates.push(predicate),
            None => self.fields.push(FieldFilter {
                field,
                predicates: vec![predicate],
            }),
        }
        self
    }

    /// Shorthand for `field(name, Predicate::Eq(value))`.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(field, Predicate::Eq(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldFilter] {
        &self.fields
    }

    /// Parse the JSON form.
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        let map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => return Err(invalid(format!("filter must be an object, got {other}"))),
        };

        let mut filter = Self::new();
        for (field, ops) in map {
            if is_reserved(field) {
                return Err(invalid(format!("field `{field}` is reserved")));
            }

            match ops {
                Value::Object(op_map) if !op_map.is_empty() && !is_reference(ops) => {
                    for (op, arg) in op_map {
                        filter = filter.field(field.as_str(), Predicate::from_op(op, arg)?);
                    }
                }
                value => filter = filter.field(field.as_str(), Predicate::Eq(value.clone())),
            }
        }
        Ok(filter)
    }

    /// Whether `node` satisfies every predicate.
    pub fn matches<L: FieldLookup + ?Sized>(&self, node: &Node, lookup: &L) -> bool {
        self.fields.iter().all(|field| {
            let value = lookup.lookup(node, &field.field).map(comparable);
            let value = value.as_deref();
            field.predicates.iter().all(|predicate| predicate.test(value))
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn invalid(message: String) -> StoreError {
    StoreError::InvalidQuery(message)
}

fn list_arg(op: &str, arg: &Value) -> StoreResult<Vec<Value>> {
    arg.as_array()
        .cloned()
        .ok_or_else(|| invalid(format!("`{op}` expects a list, got {arg}")))
}

fn list_or_scalar(arg: &Value) -> Vec<Value> {
    match arg {
        Value::Array(items) => items.clone(),
        scalar => vec![scalar.clone()],
    }
}

/// Compile `pattern` or `/pattern/flags` (flags: `i`, `m`, `s`, `x`).
fn compile_regex(pattern: &str) -> StoreResult<Regex> {
    let (source, flags) = match pattern.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
        Some((source, flags)) if flags.chars().all(|c| "imsx".contains(c)) => (source, flags),
        _ => (pattern, ""),
    };

    RegexBuilder::new(source)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
        .map_err(|err| invalid(format!("invalid regex `{pattern}`: {err}")))
}

/// Ordering of a field value against a bound; `None` when incomparable.
fn ordering(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
            Some(compare_values(value, bound))
        }
        _ => None,
    }
}

fn is_in(value: &Value, list: &[Value]) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| list.iter().any(|candidate| values_equal(item, candidate))),
        value => list.iter().any(|candidate| values_equal(value, candidate)),
    }
}

fn contains(value: &Value, needle: &Value) -> bool {
    match (value, needle) {
        (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        _ => false,
    }
}
