//! Node records and node inputs.

use super::value::{FieldMap, id_string};
use crate::error::{StoreError, StoreResult};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::borrow::Cow;

/// Key of the reserved input field carrying a node's uid.
pub const UID_KEY: &str = "$uid";

/// One typed content record.
///
/// Serializes flat: custom fields sit next to `id`, `typeName` and `path`,
/// which is the shape templates and the query layer consume. A custom field
/// named like a node attribute is shadowed by the attribute, so no key is
/// written twice.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique within the owning collection
    pub id: String,

    /// Unique store-wide; survives `id` changes
    pub uid: String,

    pub type_name: String,

    /// Custom fields
    pub fields: FieldMap,

    pub internal: Internal,

    /// Computed URL path
    pub path: Option<String>,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shadowed = |key: &str| {
            matches!(key, "id" | UID_KEY | "typeName" | "internal")
                || (key == "path" && self.path.is_some())
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry(UID_KEY, &self.uid)?;
        map.serialize_entry("typeName", &self.type_name)?;
        for (key, value) in self.fields.iter().filter(|(key, _)| !shadowed(key.as_str())) {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("internal", &self.internal)?;
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        map.end()
    }
}

/// Source metadata of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    /// Where the record came from (file path or URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Raw payload handed to the transformer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Store clock value of the last add/update
    pub last_modified: u64,
}

impl Node {
    /// Look up a field by path.
    ///
    /// `id`, `$uid`, `typeName` and `path` read node attributes; everything
    /// else reads custom fields, with `.` descending into nested maps and
    /// list indices (`author.name`, `images.0`).
    pub fn field(&self, path: &str) -> Option<Cow<'_, Value>> {
        match path {
            "id" => return Some(Cow::Owned(Value::String(self.id.clone()))),
            UID_KEY => return Some(Cow::Owned(Value::String(self.uid.clone()))),
            "typeName" => return Some(Cow::Owned(Value::String(self.type_name.clone()))),
            "path" if self.path.is_some() => {
                return self.path.clone().map(|p| Cow::Owned(Value::String(p)));
            }
            _ => {}
        }

        lookup_path(&self.fields, path.split('.')).map(Cow::Borrowed)
    }
}

/// Walk nested maps and lists along `segments`.
pub fn lookup_path<'v, 's>(
    fields: &'v FieldMap,
    segments: impl IntoIterator<Item = &'s str>,
) -> Option<&'v Value> {
    let mut segments = segments.into_iter();
    let mut current = fields.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Null => None,
        value => Some(value),
    }
}

/// Raw input for adding or updating a node.
///
/// # Example
/// ```ignore
/// let input = NodeInput::new()
///     .id("1")
///     .field("title", "Lorem Ipsum")
///     .field("author", create_reference("Author", "2"))
///     .origin("/site/content/posts/lorem.md");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInput {
    pub id: Option<String>,
    pub uid: Option<String>,
    pub fields: FieldMap,
    pub internal: InternalInput,
}

/// Source metadata supplied with an input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InternalInput {
    pub origin: Option<String>,
    pub mime_type: Option<String>,
    pub content: Option<String>,
}

impl NodeInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.internal.origin = Some(origin.into());
        self
    }

    /// Attach a raw payload to be parsed by the transformer for `mime_type`.
    pub fn content(mut self, mime_type: impl Into<String>, content: impl Into<String>) -> Self {
        self.internal.mime_type = Some(mime_type.into());
        self.internal.content = Some(content.into());
        self
    }

    /// Split a JSON object into id, uid, internal metadata and custom fields.
    ///
    /// ```json
    /// { "id": "1", "$uid": "..", "internal": { "origin": "..", "mimeType": "..", "content": ".." }, "title": ".." }
    /// ```
    pub fn from_value(value: Value) -> StoreResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(StoreError::InvalidQuery(
                "node input must be a JSON object".into(),
            ));
        };

        let id = match fields.remove("id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(id_string(&value).ok_or_else(|| {
                StoreError::InvalidQuery(format!("node id must be a string or number, got {value}"))
            })?),
        };
        let uid = fields
            .remove(UID_KEY)
            .and_then(|value| value.as_str().map(str::to_owned));

        let internal = match fields.remove("internal") {
            Some(Value::Object(internal)) => {
                let text = |key: &str| internal.get(key).and_then(Value::as_str).map(str::to_owned);
                InternalInput {
                    origin: text("origin"),
                    mime_type: text("mimeType"),
                    content: text("content"),
                }
            }
            _ => InternalInput::default(),
        };

        Ok(Self {
            id,
            uid,
            fields,
            internal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node() -> Node {
        Node {
            id: "1".into(),
            uid: "u1".into(),
            type_name: "Post".into(),
            fields: json!({
                "title": "Hello",
                "author": {"name": "Ada", "links": ["a", "b"]},
                "empty": null,
            })
            .as_object()
            .cloned()
            .unwrap(),
            internal: Internal::default(),
            path: Some("/hello".into()),
        }
    }

    #[test]
    fn test_field_attributes() {
        let node = node();
        assert_eq!(node.field("id").unwrap().as_ref(), &json!("1"));
        assert_eq!(node.field("$uid").unwrap().as_ref(), &json!("u1"));
        assert_eq!(node.field("typeName").unwrap().as_ref(), &json!("Post"));
        assert_eq!(node.field("path").unwrap().as_ref(), &json!("/hello"));
    }

    #[test]
    fn test_field_nested() {
        let node = node();
        assert_eq!(node.field("title").unwrap().as_ref(), &json!("Hello"));
        assert_eq!(node.field("author.name").unwrap().as_ref(), &json!("Ada"));
        assert_eq!(node.field("author.links.1").unwrap().as_ref(), &json!("b"));
        assert!(node.field("author.missing").is_none());
        assert!(node.field("title.deeper").is_none());
    }

    #[test]
    fn test_field_null_is_undefined() {
        assert!(node().field("empty").is_none());
    }

    #[test]
    fn test_serialize_flat() {
        let value = serde_json::to_value(node()).unwrap();
        assert_eq!(value["id"], json!("1"));
        assert_eq!(value["$uid"], json!("u1"));
        assert_eq!(value["typeName"], json!("Post"));
        assert_eq!(value["title"], json!("Hello"));
        assert_eq!(value["path"], json!("/hello"));
        assert_eq!(value["internal"]["lastModified"], json!(0));
    }

    #[test]
    fn test_serialize_attributes_shadow_fields() {
        let mut node = node();
        node.fields.insert("id".into(), json!("custom"));
        node.fields.insert("path".into(), json!("/from-field"));
        node.fields.insert("typeName".into(), json!("Other"));

        let text = serde_json::to_string(&node).unwrap();
        assert_eq!(text.matches("\"id\":").count(), 1);
        assert_eq!(text.matches("\"path\":").count(), 1);
        assert_eq!(text.matches("\"typeName\":").count(), 1);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], json!("1"));
        assert_eq!(value["path"], json!("/hello"));
        assert_eq!(value["typeName"], json!("Post"));

        node.path = None;
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["path"], json!("/from-field"));
    }

    #[test]
    fn test_input_builder() {
        let input = NodeInput::new()
            .id("1")
            .field("title", "Hello")
            .origin("/a.md")
            .content("application/json", "{}");
        assert_eq!(input.id.as_deref(), Some("1"));
        assert_eq!(input.fields["title"], json!("Hello"));
        assert_eq!(input.internal.origin.as_deref(), Some("/a.md"));
        assert_eq!(input.internal.mime_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_input_from_value_splits_internal() {
        let input = NodeInput::from_value(json!({
            "id": 7,
            "$uid": "abc",
            "title": "Hello",
            "internal": {"origin": "/a.md", "mimeType": "text/markdown", "content": "# hi"}
        }))
        .unwrap();

        assert_eq!(input.id.as_deref(), Some("7"));
        assert_eq!(input.uid.as_deref(), Some("abc"));
        assert_eq!(input.fields.len(), 1);
        assert_eq!(input.internal.mime_type.as_deref(), Some("text/markdown"));
        assert_eq!(input.internal.content.as_deref(), Some("# hi"));
    }

    #[test]
    fn test_input_from_value_rejects_non_object() {
        assert!(NodeInput::from_value(json!([1, 2])).is_err());
        assert!(NodeInput::from_value(json!({"id": {"x": 1}})).is_err());
    }
}
