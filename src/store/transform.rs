//! Content transformers: parse a node's raw payload into extra fields.
//!
//! A node whose `internal.mimeType` is set gets its `internal.content`
//! parsed by the transformer registered for that mime type. Parsed fields
//! sit under the node's explicit fields (explicit input wins), except `id`,
//! which a transformer may supply when the input has none.
//!
//! ```ignore
//! struct Markdown;
//!
//! impl Transformer for Markdown {
//!     fn mime_types(&self) -> &[&str] {
//!         &["text/markdown"]
//!     }
//!
//!     fn parse(&self, content: &str) -> anyhow::Result<FieldMap> {
//!         let (front_matter, body) = split_front_matter(content)?;
//!         ...
//!     }
//! }
//!
//! store.register_transformer(Arc::new(Markdown));
//! ```

use super::value::FieldMap;
use crate::error::{StoreError, StoreResult};
use anyhow::{Result, bail};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::{fmt, sync::Arc};

/// A parser for one or more mime types.
pub trait Transformer: Send + Sync {
    /// Mime types this transformer handles.
    fn mime_types(&self) -> &[&str];

    /// Parse a raw payload into fields.
    fn parse(&self, content: &str) -> Result<FieldMap>;
}

/// Transformers keyed by mime type.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    by_mime: FxHashMap<String, Arc<dyn Transformer>>,
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("mime_types", &self.mime_types())
            .finish()
    }
}

impl TransformerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in JSON and TOML transformers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonTransformer));
        registry.register(Arc::new(TomlTransformer));
        registry
    }

    /// Register a transformer for all of its mime types.
    ///
    /// Later registrations replace earlier ones for the same mime type.
    pub fn register(&mut self, transformer: Arc<dyn Transformer>) {
        for mime_type in transformer.mime_types() {
            self.by_mime
                .insert(mime_type.to_ascii_lowercase(), Arc::clone(&transformer));
        }
    }

    /// Transformer for a mime type (case-insensitive).
    pub fn get(&self, mime_type: &str) -> Option<&Arc<dyn Transformer>> {
        self.by_mime.get(&mime_type.to_ascii_lowercase())
    }

    pub fn contains(&self, mime_type: &str) -> bool {
        self.get(mime_type).is_some()
    }

    /// Registered mime types, sorted.
    pub fn mime_types(&self) -> Vec<&str> {
        let mut mime_types: Vec<&str> = self.by_mime.keys().map(String::as_str).collect();
        mime_types.sort_unstable();
        mime_types
    }

    /// Parse `content` with the transformer for `mime_type`.
    ///
    /// Fails with `MissingTransformer` when nothing is registered.
    pub fn transform(&self, type_name: &str, mime_type: &str, content: &str) -> StoreResult<FieldMap> {
        let transformer = self
            .get(mime_type)
            .ok_or_else(|| StoreError::MissingTransformer {
                type_name: type_name.to_owned(),
                mime_type: mime_type.to_owned(),
            })?;

        transformer
            .parse(content)
            .map_err(|source| StoreError::Transform {
                mime_type: mime_type.to_owned(),
                source,
            })
    }
}

// ============================================================================
// Built-in Transformers
// ============================================================================

/// Parses a JSON object payload.
#[derive(Debug, Clone, Copy)]
pub struct JsonTransformer;

impl Transformer for JsonTransformer {
    fn mime_types(&self) -> &[&str] {
        &["application/json"]
    }

    fn parse(&self, content: &str) -> Result<FieldMap> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(fields) => Ok(fields),
            other => bail!("expected a JSON object, got `{other}`"),
        }
    }
}

/// Parses a TOML document payload.
#[derive(Debug, Clone, Copy)]
pub struct TomlTransformer;

impl Transformer for TomlTransformer {
    fn mime_types(&self) -> &[&str] {
        &["application/toml", "text/x-toml"]
    }

    fn parse(&self, content: &str) -> Result<FieldMap> {
        let table: toml::Table = toml::from_str(content)?;
        match serde_json::to_value(table)? {
            Value::Object(fields) => Ok(fields),
            other => bail!("expected a TOML table, got `{other}`"),
        }
    }
}
