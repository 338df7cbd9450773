//! Filter / sort / paginate engine.
//!
//! [`evaluate`] runs a [`Query`] over any sequence of nodes: one
//! collection's table or nodes composed from the backlink index.
//!
//! ```text
//! nodes ──filter──▶ matched (total_count) ──sort──▶ ordered ──paginate──▶ items
//! ```
//!
//! Evaluation only reads, so any number of evaluations may run in parallel
//! against a settled store.

pub mod filter;
pub mod page;
pub mod sort;

pub use filter::{FieldFilter, Filter, Predicate};
pub use page::{PageInfo, PageSpec, paginate};
pub use sort::{Direction, Sort, SortKey};

use crate::error::{StoreError, StoreResult};
use crate::store::Node;
use crate::store::value::Reference;
use crate::utils::date::parse_date;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Inputs above this size are filtered on the rayon pool.
const PARALLEL_THRESHOLD: usize = 2048;

/// Resolves a field path on a node.
///
/// Collections layer their registered resolvers over the stored fields;
/// [`PlainFields`] reads stored fields only.
pub trait FieldLookup: Sync {
    fn lookup<'n>(&self, node: &'n Node, path: &str) -> Option<Cow<'n, Value>>;
}

/// Stored fields only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFields;

impl FieldLookup for PlainFields {
    #[inline]
    fn lookup<'n>(&self, node: &'n Node, path: &str) -> Option<Cow<'n, Value>> {
        node.field(path)
    }
}

// ============================================================================
// Query
// ============================================================================

/// A complete query: filter, sort and page.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Filter,
    /// Empty means the caller's default sort
    pub sort: Sort,
    pub page: PageSpec,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: PageSpec) -> Self {
        self.page = page;
        self
    }

    /// Parse the JSON form.
    ///
    /// ```json
    /// {
    ///   "filter": { "price": { "between": [120, 150] } },
    ///   "sort": [{ "field": "date", "order": "DESC" }],
    ///   "skip": 0, "limit": 100, "page": 2, "perPage": 10
    /// }
    /// ```
    ///
    /// `sortBy` + `order` is accepted as a single-key alternative to `sort`.
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        let map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "query must be an object, got {other}"
                )));
            }
        };

        let mut query = Self::new();
        for (key, arg) in map {
            match key.as_str() {
                "filter" => query.filter = Filter::from_value(arg)?,
                "sort" => query.sort = Sort::from_value(arg)?,
                "sortBy" => {
                    let field = arg.as_str().ok_or_else(|| {
                        StoreError::InvalidQuery(format!("`sortBy` must be a string, got {arg}"))
                    })?;
                    let direction = match map.get("order") {
                        Some(order) => Direction::from_value(order)?,
                        None => Direction::Desc,
                    };
                    query.sort = Sort::by(field, direction);
                }
                "order" => {}
                "skip" => query.page.skip = PageSpec::count_arg(key, arg)?,
                "limit" => query.page.limit = Some(PageSpec::count_arg(key, arg)?),
                "page" => query.page.page = PageSpec::count_arg(key, arg)?,
                "perPage" => query.page.per_page = Some(PageSpec::count_arg(key, arg)?),
                other => {
                    return Err(StoreError::InvalidQuery(format!("unknown query key `{other}`")));
                }
            }
        }
        Ok(query)
    }
}

/// Result of an evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<'a> {
    pub items: Vec<&'a Node>,
    /// Matched nodes before skip/limit/page
    pub total_count: usize,
    pub page_info: PageInfo,
}

impl<'a> QueryResult<'a> {
    pub fn ids(&self) -> Vec<&'a str> {
        self.items.iter().map(|node| node.id.as_str()).collect()
    }
}

/// Evaluate `query` over `nodes`.
///
/// `default_sort` (descending) applies when the query has no sort keys.
pub fn evaluate<'a, I, L>(nodes: I, query: &Query, lookup: &L, default_sort: &str) -> QueryResult<'a>
where
    I: IntoIterator<Item = &'a Node>,
    L: FieldLookup + ?Sized,
{
    let nodes: Vec<&'a Node> = nodes.into_iter().collect();
    let filter = &query.filter;

    let mut matched: Vec<&'a Node> = if filter.is_empty() {
        nodes
    } else if nodes.len() >= PARALLEL_THRESHOLD {
        nodes
            .into_par_iter()
            .filter(|node| filter.matches(node, lookup))
            .collect()
    } else {
        nodes
            .into_iter()
            .filter(|node| filter.matches(node, lookup))
            .collect()
    };
    let total_count = matched.len();

    if query.sort.is_empty() {
        Sort::by(default_sort, Direction::Desc).apply(&mut matched, lookup);
    } else {
        query.sort.apply(&mut matched, lookup);
    }

    let (items, page_info) = paginate(matched, &query.page);
    QueryResult {
        items,
        total_count,
        page_info,
    }
}

// ============================================================================
// Value Comparison
// ============================================================================

/// Reduce a looked-up value to what filters and sorts compare: references
/// compare by their target id(s).
pub(crate) fn comparable(value: Cow<'_, Value>) -> Cow<'_, Value> {
    match Reference::from_value(&value) {
        Some(reference) => Cow::Owned(reference.id_value()),
        None => value,
    }
}

/// Loose equality: numbers compare numerically, and a number equals a string
/// holding the same digits (ids arrive either way).
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => {
            let a = comparable(Cow::Borrowed(a));
            let b = comparable(Cow::Borrowed(b));
            match (a.as_ref(), b.as_ref()) {
                (Value::Object(_), _) | (_, Value::Object(_)) => a == b,
                (a, b) => values_equal(a, b),
            }
        }
        _ => a == b,
    }
}

/// Total order over JSON values.
///
/// Types rank `bool < number < string < array < object`. Among strings,
/// those that parse as dates rank first and compare chronologically; the
/// rest compare as text.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => match (parse_date(x), parse_date(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.cmp(y),
        },
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}
