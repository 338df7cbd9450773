//! Node builder: turn a raw input into a finished node.
//!
//! # Pipeline
//!
//! ```text
//! NodeInput
//!   ├─ internal.mimeType set? ── transformer.parse(content) ─┐
//!   │                                                          ▼
//!   └─ explicit fields ──────────────────── overlay (explicit wins)
//!                                                             │
//!                                  process_fields (assets, keys, refs)
//!                                                             │
//!                              id (explicit | parsed | content hash)
//!                              uid (kept | explicit | hash of type+id)
//!                              path (route | explicit `path` field)
//!                                                             ▼
//!                                                 BuiltNode { node, points_to }
//! ```
//!
//! The builder never touches a collection. Uniqueness checks, clock bumps
//! and index updates happen in the caller once the node is built.

use super::fields::{FieldOptions, ProcessedFields, collect_references, process_fields};
use super::node::{Internal, Node, NodeInput};
use super::route::{RouteTemplate, normalize_path, with_trailing_slash};
use super::transform::TransformerRegistry;
use super::value::{FieldMap, PointsTo, id_string};
use crate::config::AssetConfig;
use crate::error::{StoreError, StoreResult};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Length of derived ids and uids, in hex characters.
const HASH_LEN: usize = 32;

/// A built node and everything it points to.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltNode {
    pub node: Node,
    pub points_to: PointsTo,
}

/// Per-collection settings of a build.
#[derive(Debug, Clone, Copy)]
pub struct NodeBuilder<'a> {
    pub type_name: &'a str,
    pub route: Option<&'a RouteTemplate>,
    /// Field read by `:year`, `:month` and `:day`
    pub date_field: &'a str,
    /// Declared references (field name -> type name)
    pub refs: &'a BTreeMap<String, String>,
    pub transformers: &'a TransformerRegistry,
    pub assets: &'a AssetConfig,
    pub trailing_slash: bool,
}

impl NodeBuilder<'_> {
    /// Build a node from `input`.
    ///
    /// With `previous` set (an update), the previous node's fields are the
    /// base the input is overlaid onto, and its `id` and `uid` carry over
    /// unless the input names a new `id`. `uid_taken` reports uids already
    /// in use so a derived uid never collides.
    pub fn build(
        &self,
        input: NodeInput,
        previous: Option<&Node>,
        uid_taken: impl Fn(&str) -> bool,
    ) -> StoreResult<BuiltNode> {
        let content_id = derive_id(&input);
        let NodeInput {
            id,
            uid,
            fields: explicit,
            internal,
        } = input;

        let internal = match previous {
            Some(old) => Internal {
                origin: internal.origin.or_else(|| old.internal.origin.clone()),
                mime_type: internal.mime_type.or_else(|| old.internal.mime_type.clone()),
                content: internal.content.or_else(|| old.internal.content.clone()),
                last_modified: old.internal.last_modified,
            },
            None => Internal {
                origin: internal.origin,
                mime_type: internal.mime_type,
                content: internal.content,
                last_modified: 0,
            },
        };

        // Re-parse only when the payload changed; an untouched payload is
        // already reflected in the previous fields.
        let payload_changed = previous.is_none_or(|old| {
            old.internal.mime_type != internal.mime_type || old.internal.content != internal.content
        });
        let (mut incoming, parsed_id) = match (&internal.mime_type, payload_changed) {
            (Some(mime_type), true) => {
                let content = internal.content.as_deref().unwrap_or_default();
                let mut parsed = self.transformers.transform(self.type_name, mime_type, content)?;
                let parsed_id = parsed.remove("id").as_ref().and_then(id_string);
                (parsed, parsed_id)
            }
            _ => (FieldMap::new(), None),
        };
        incoming.extend(explicit);

        let options = FieldOptions {
            origin: internal.origin.as_deref(),
            assets: self.assets,
        };
        let ProcessedFields { fields, points_to } = process_fields(incoming, self.refs, &options);
        let (fields, points_to) = match previous {
            None => (fields, points_to),
            Some(old) => {
                let mut merged = old.fields.clone();
                merged.extend(fields);
                let points_to = collect_references(&merged, self.refs);
                (merged, points_to)
            }
        };

        let id = id
            .or(parsed_id)
            .or_else(|| previous.map(|old| old.id.clone()))
            .unwrap_or(content_id);

        let uid = match (previous, uid) {
            (Some(old), _) => old.uid.clone(),
            (None, Some(uid)) => uid,
            (None, None) => derive_uid(self.type_name, &id, uid_taken),
        };

        let path = self.path_for(&id, &fields)?;

        Ok(BuiltNode {
            node: Node {
                id,
                uid,
                type_name: self.type_name.to_owned(),
                fields,
                internal,
                path,
            },
            points_to,
        })
    }

    /// Compute the path of a node from its processed fields.
    pub fn path_for(&self, id: &str, fields: &FieldMap) -> StoreResult<Option<String>> {
        let path = match self.route {
            Some(route) => Some(route.path_for(id, fields, self.date_field).map_err(|source| {
                StoreError::InvalidRoute {
                    type_name: self.type_name.to_owned(),
                    template: route.as_str().to_owned(),
                    source,
                }
            })?),
            None => fields.get("path").and_then(Value::as_str).map(normalize_path),
        };

        Ok(match path {
            Some(path) if self.trailing_slash => Some(with_trailing_slash(path)),
            path => path,
        })
    }
}

/// Deterministic id of an input without an explicit one.
///
/// Hashes the canonical JSON of the custom fields and internal metadata, so
/// the same record always gets the same id across runs.
pub fn derive_id(input: &NodeInput) -> String {
    let canonical = json!({
        "fields": input.fields,
        "internal": {
            "origin": input.internal.origin,
            "mimeType": input.internal.mime_type,
            "content": input.internal.content,
        },
    });
    short_hash(canonical.to_string().as_bytes())
}

/// Store-wide uid of `(type_name, id)`.
///
/// When the plain hash is taken (a node kept it across an `id` change), a
/// salt counter is mixed in until a free uid is found.
pub fn derive_uid(type_name: &str, id: &str, uid_taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{type_name}\0{id}");
    let mut uid = short_hash(base.as_bytes());
    let mut salt = 1u64;
    while uid_taken(&uid) {
        uid = short_hash(format!("{base}\0{salt}").as_bytes());
        salt += 1;
    }
    uid
}

fn short_hash(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hash.to_hex().as_str()[..HASH_LEN].to_owned()
}
