//! Global key-value metadata.
//!
//! | Existing  | Added     | Result                          |
//! |-----------|-----------|---------------------------------|
//! | list      | list      | concatenated                    |
//! | list      | scalar    | appended                        |
//! | map       | map       | merged by key (added keys win)  |
//! | anything  | anything  | overwritten                     |

use super::value::FieldMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetaData {
    data: FieldMap,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, merging with any existing value under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let merged = match (self.data.remove(&key), value) {
            (Some(Value::Array(mut existing)), Value::Array(added)) => {
                existing.extend(added);
                Value::Array(existing)
            }
            (Some(Value::Array(mut existing)), added) => {
                existing.push(added);
                Value::Array(existing)
            }
            (Some(Value::Object(mut existing)), Value::Object(added)) => {
                existing.extend(added);
                Value::Object(existing)
            }
            (_, added) => added,
        };
        self.data.insert(key, merged);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
