//! Multi-key sorting.
//!
//! Keys compare lexicographically: the first key decides, later keys break
//! ties, and a full tie keeps input order. Missing values sort last in
//! both directions.

use super::{FieldLookup, comparable, compare_values};
use crate::error::{StoreError, StoreResult};
use crate::store::Node;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    /// Parse `asc`/`desc` (any case) or `1`/`-1`.
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::String(s) if s.eq_ignore_ascii_case("asc") => Ok(Self::Asc),
            Value::String(s) if s.eq_ignore_ascii_case("desc") => Ok(Self::Desc),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(Self::Asc),
            Value::Number(n) if n.as_i64() == Some(-1) => Ok(Self::Desc),
            other => Err(StoreError::InvalidQuery(format!(
                "sort order must be ASC or DESC, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Ordered sort keys. Empty means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(field: impl Into<String>, direction: Direction) -> Self {
        Self::new().then(field, direction)
    }

    /// Append a tie-breaking key.
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parse the JSON form.
    ///
    /// | Form                                            | Meaning              |
    /// |-------------------------------------------------|----------------------|
    /// | `"date"`                                        | `date` descending    |
    /// | `{"field": "date", "order": "ASC"}`             | one key              |
    /// | `[{"field": "featured"}, {"field": "date"}]`    | keys in order        |
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Array(items) => items.iter().try_fold(Self::new(), |sort, item| {
                let key = parse_key(item)?;
                Ok(sort.then(key.field, key.direction))
            }),
            single => {
                let key = parse_key(single)?;
                Ok(Self::by(key.field, key.direction))
            }
        }
    }

    /// Stable-sort `nodes` by these keys.
    pub fn apply<'a, L: FieldLookup + ?Sized>(&self, nodes: &mut Vec<&'a Node>, lookup: &L) {
        if self.keys.is_empty() || nodes.len() < 2 {
            return;
        }

        let mut keyed: Vec<(Vec<Option<Cow<'a, Value>>>, &'a Node)> = nodes
            .drain(..)
            .map(|node| {
                let values = self
                    .keys
                    .iter()
                    .map(|key| lookup.lookup(node, &key.field).map(comparable))
                    .collect();
                (values, node)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            self.keys
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|(key, (a, b))| compare_key(a.as_deref(), b.as_deref(), key.direction))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        nodes.extend(keyed.into_iter().map(|(_, node)| node));
    }
}

fn compare_key(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            Direction::Asc => compare_values(a, b),
            Direction::Desc => compare_values(b, a),
        },
    }
}

fn parse_key(value: &Value) -> StoreResult<SortKey> {
    match value {
        Value::String(field) => Ok(SortKey {
            field: field.clone(),
            direction: Direction::Desc,
        }),
        Value::Object(map) => {
            let field = map
                .get("field")
                .or_else(|| map.get("by"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    StoreError::InvalidQuery(format!("sort key needs a `field`, got {value}"))
                })?;
            let direction = match map.get("order") {
                Some(order) => Direction::from_value(order)?,
                None => Direction::Desc,
            };
            Ok(SortKey {
                field: field.to_owned(),
                direction,
            })
        }
        other => Err(StoreError::InvalidQuery(format!(
            "sort key must be a string or object, got {other}"
        ))),
    }
}
