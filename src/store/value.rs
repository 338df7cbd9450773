//! Field values and references.
//!
//! Node fields are an open JSON map. A field value shaped exactly as
//! `{"typeName": ..., "id": ...}` is a [`Reference`]: a link to one or more
//! nodes resolved by `(typeName, id)` lookup, never by ownership, so
//! reference graphs may be cyclic.
//!
//! | Shape                                         | Meaning                    |
//! |-----------------------------------------------|----------------------------|
//! | `{"typeName": "Author", "id": "2"}`           | one node                   |
//! | `{"typeName": "Tag", "id": ["a", "b"]}`       | to-many within one type    |
//! | `{"typeName": ["Post", "Page"], "id": "7"}`   | union: any of several types|
//! | `[{"typeName": ..}, {"typeName": ..}]`        | to-many via a list         |

use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

/// Custom fields of a node.
pub type FieldMap = Map<String, Value>;

/// Outgoing references of a node: type name -> referenced ids.
pub type PointsTo = BTreeMap<String, BTreeSet<String>>;

const TYPE_NAME_KEY: &str = "typeName";
const ID_KEY: &str = "id";

/// A link from one node to others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub type_names: SmallVec<[String; 1]>,
    pub ids: SmallVec<[String; 1]>,
}

impl Reference {
    /// Reference a single node.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_names: SmallVec::from_elem(type_name.into(), 1),
            ids: SmallVec::from_elem(id.into(), 1),
        }
    }

    /// Reference several nodes of one type.
    pub fn many<I, S>(type_name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_names: SmallVec::from_elem(type_name.into(), 1),
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Reference a node that may live in any of several types.
    pub fn union<I, S>(type_names: I, id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_names: type_names.into_iter().map(Into::into).collect(),
            ids: SmallVec::from_elem(id.into(), 1),
        }
    }

    /// Read a reference from a field value.
    ///
    /// Only objects with exactly the keys `typeName` and `id` qualify; ids
    /// may be strings or numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 2 {
            return None;
        }

        let type_names = string_list(map.get(TYPE_NAME_KEY)?, |v| v.as_str().map(Into::into))?;
        let ids = string_list(map.get(ID_KEY)?, id_string)?;

        Some(Self { type_names, ids })
    }

    /// Encode as a field value. Single elements encode as scalars.
    pub fn to_value(&self) -> Value {
        let encode = |list: &SmallVec<[String; 1]>| match list.as_slice() {
            [one] => Value::String(one.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };

        let mut map = FieldMap::new();
        map.insert(TYPE_NAME_KEY.into(), encode(&self.type_names));
        map.insert(ID_KEY.into(), encode(&self.ids));
        Value::Object(map)
    }

    /// Every `(typeName, id)` pair this reference may point at.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.type_names.iter().flat_map(move |type_name| {
            self.ids
                .iter()
                .map(move |id| (type_name.as_str(), id.as_str()))
        })
    }

    /// The referenced id(s) as a plain value, used when comparing or
    /// rendering a reference field.
    pub fn id_value(&self) -> Value {
        match self.ids.as_slice() {
            [one] => Value::String(one.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        reference.to_value()
    }
}

/// Whether a value is shaped like a reference.
#[inline]
pub fn is_reference(value: &Value) -> bool {
    Reference::from_value(value).is_some()
}

/// Build a reference value (`{"typeName": .., "id": ..}`).
pub fn create_reference(type_name: impl Into<String>, id: impl Into<String>) -> Value {
    Reference::new(type_name, id).to_value()
}

/// Stringify an id value (strings verbatim, numbers in decimal form).
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a scalar-or-list value into a non-empty string list.
fn string_list(
    value: &Value,
    convert: impl Fn(&Value) -> Option<String>,
) -> Option<SmallVec<[String; 1]>> {
    let list: SmallVec<[String; 1]> = match value {
        Value::Array(items) => items.iter().map(&convert).collect::<Option<_>>()?,
        scalar => SmallVec::from_elem(convert(scalar)?, 1),
    };
    (!list.is_empty()).then_some(list)
}
