//! Field processing: key sanitizing, asset path resolution and reference
//! collection.
//!
//! # Asset Paths
//!
//! A string value is treated as an asset path when it has a recognized
//! extension (`[assets].extensions`), is not a URL, and is either relative
//! or absolute (`/`). It is resolved against the node's origin:
//!
//! | Value          | Origin                           | Result                               |
//! |----------------|----------------------------------|--------------------------------------|
//! | `./a.png`      | `/site/posts/p.md`               | `/site/posts/a.png`                  |
//! | `../a.png`     | `https://cms.io/posts/p`         | `https://cms.io/a.png`               |
//! | `img/a.png`    | `/site/posts/p.md`               | `/site/posts/img/a.png`              |
//! | `./a.png`      | none, context `/site`            | `/site/a.png`                        |
//! | `/img/a.png`   | any                              | unchanged                            |
//! | `/img/a.png`   | `/site/p.md`, `resolve_absolute` | `<context>/img/a.png`                |
//! | `/img/a.png`   | `https://cms.io/p`, `resolve_absolute` | `https://cms.io/img/a.png`     |
//!
//! Everything else passes through unchanged.

use super::value::{FieldMap, PointsTo, Reference, id_string};
use crate::config::AssetConfig;
use crate::log;
use crate::utils::slug::{is_reserved, sanitize_field_name};
use crate::utils::url::{extension, is_url, join_path, parent_dir, resolve_url};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Inputs shared by every value of one node.
#[derive(Debug, Clone, Copy)]
pub struct FieldOptions<'a> {
    /// Where the node came from (file path or URL)
    pub origin: Option<&'a str>,
    pub assets: &'a AssetConfig,
}

/// Processed custom fields and the references found in them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFields {
    pub fields: FieldMap,
    pub points_to: PointsTo,
}

/// Normalize a node's custom fields.
///
/// Sanitizes keys, rewrites asset paths and collects every outgoing
/// reference (nested, listed, or through `declared_refs`). Reference values
/// are left in place.
pub fn process_fields(
    fields: FieldMap,
    declared_refs: &BTreeMap<String, String>,
    options: &FieldOptions<'_>,
) -> ProcessedFields {
    let fields = process_map(fields, options);
    let points_to = collect_references(&fields, declared_refs);
    ProcessedFields { fields, points_to }
}

/// Collect every reference reachable from `fields`.
///
/// A top-level field named in `declared_refs` contributes its plain id
/// value(s) to the declared type, in addition to any reference-shaped values.
pub fn collect_references(fields: &FieldMap, declared_refs: &BTreeMap<String, String>) -> PointsTo {
    let mut points_to = PointsTo::new();

    for (key, value) in fields {
        if let Some(type_name) = declared_refs.get(key) {
            collect_declared(value, type_name, &mut points_to);
        }
        collect_value(value, &mut points_to);
    }

    points_to
}

fn collect_value(value: &Value, points_to: &mut PointsTo) {
    if let Some(reference) = Reference::from_value(value) {
        for (type_name, id) in reference.targets() {
            points_to
                .entry(type_name.to_owned())
                .or_default()
                .insert(id.to_owned());
        }
        return;
    }

    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_value(item, points_to)),
        Value::Object(map) => map.values().for_each(|item| collect_value(item, points_to)),
        _ => {}
    }
}

fn collect_declared(value: &Value, type_name: &str, points_to: &mut PointsTo) {
    match value {
        Value::Array(items) => items
            .iter()
            .for_each(|item| collect_declared(item, type_name, points_to)),
        scalar => {
            if let Some(id) = id_string(scalar) {
                points_to.entry(type_name.to_owned()).or_default().insert(id);
            }
        }
    }
}

/// Process values and sanitize keys of one map.
///
/// When two keys sanitize to the same name, a key already spelled that way
/// wins; otherwise the first key in map order wins. The dropped value is
/// logged.
fn process_map(fields: FieldMap, options: &FieldOptions<'_>) -> FieldMap {
    let mut processed = FieldMap::new();
    let mut renamed: BTreeSet<String> = BTreeSet::new();

    for (key, value) in fields {
        let value = if is_reserved(&key) {
            value
        } else {
            process_value(value, options)
        };
        let sanitized = match sanitize_field_name(&key) {
            Cow::Owned(sanitized) => Some(sanitized),
            Cow::Borrowed(_) => None,
        };

        let Some(name) = sanitized else {
            if renamed.remove(&key) {
                log!("skip"; "field `{}` replaces a field sanitized to the same name", key);
            }
            processed.insert(key, value);
            continue;
        };

        if processed.contains_key(&name) {
            log!("skip"; "field `{}` sanitizes to existing field `{}`, dropped", key, name);
            continue;
        }
        renamed.insert(name.clone());
        processed.insert(name, value);
    }

    processed
}

fn process_value(value: Value, options: &FieldOptions<'_>) -> Value {
    if Reference::from_value(&value).is_some() {
        return value;
    }

    match value {
        Value::String(s) => match resolve_asset_path(&s, options) {
            Some(resolved) => Value::String(resolved),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| process_value(item, options))
                .collect(),
        ),
        Value::Object(map) => Value::Object(process_map(map, options)),
        scalar => scalar,
    }
}

/// Resolve an asset path against the node's origin.
///
/// Returns `None` when the value is not a resolvable asset path or no base
/// is available, meaning "leave unchanged".
pub fn resolve_asset_path(value: &str, options: &FieldOptions<'_>) -> Option<String> {
    let assets = options.assets;

    if is_url(value) || !extension(value).is_some_and(|ext| assets.is_asset_extension(ext)) {
        return None;
    }

    let context = assets
        .context
        .as_ref()
        .map(|context| context.to_string_lossy().into_owned());

    if value.starts_with('/') {
        if !assets.resolve_absolute {
            return None;
        }
        return match options.origin {
            Some(origin) if is_url(origin) => Some(resolve_url(origin, value)),
            _ => context.map(|context| join_path(&context, value)),
        };
    }

    match options.origin {
        Some(origin) if is_url(origin) => Some(resolve_url(origin, value)),
        Some(origin) => Some(join_path(parent_dir(origin), value)),
        None => context.map(|context| join_path(&context, value)),
    }
}
