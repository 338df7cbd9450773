//! Store configuration management for `sitegraph.toml`.
//!
//! # Sections
//!
//! | Section                  | Purpose                                        |
//! |--------------------------|------------------------------------------------|
//! | `[assets]`               | Relative asset path resolution in field values |
//! | `[permalinks]`           | Path compilation defaults                      |
//! | `[log]`                  | Log output                                     |
//! | `[collections.<Type>]`   | Collections created up front                   |
//!
//! # Example
//!
//! ```toml
//! [assets]
//! resolve_absolute = true
//! context = "~/blog"
//!
//! [permalinks]
//! trailing_slash = false
//!
//! [collections.Post]
//! route = "/:year/:month/:day/:slug"
//! refs = { author = "Author" }
//!
//! [collections.Author]
//! route = "/author/:id"
//! sort_by = "name"
//! ```

pub mod defaults;
mod error;

pub use error::ConfigError;

use crate::store::route::RouteTemplate;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "sitegraph.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing `sitegraph.toml`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Asset path resolution
    #[serde(default)]
    pub assets: AssetConfig,

    /// Path compilation defaults
    #[serde(default)]
    pub permalinks: PermalinkConfig,

    /// Log output
    #[serde(default)]
    pub log: LogConfig,

    /// Collections keyed by type name
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[assets]` section - how string field values that look like relative
/// file paths are rewritten against a node's origin.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct AssetConfig {
    /// Re-root absolute paths (`/img/a.png`) against the context directory
    /// or the origin's URL base.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub resolve_absolute: bool,

    /// Directory used when a node has no origin (tilde-expanded on load).
    #[serde(default = "defaults::assets::context")]
    #[educe(Default = defaults::assets::context())]
    pub context: Option<PathBuf>,

    /// Extensions (without leading dot) recognized as asset paths.
    #[serde(default = "defaults::assets::extensions")]
    #[educe(Default = defaults::assets::extensions())]
    pub extensions: Vec<String>,
}

impl AssetConfig {
    /// Whether `ext` is a recognized asset extension (case-insensitive).
    pub fn is_asset_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// `[permalinks]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PermalinkConfig {
    /// Append `/` to every computed path.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub trailing_slash: bool,

    /// Field formatted by the `:year`, `:month` and `:day` route params.
    #[serde(default = "defaults::permalinks::date_field")]
    #[educe(Default = defaults::permalinks::date_field())]
    pub date_field: String,
}

/// `[log]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Silence all `log!` output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub quiet: bool,
}

/// `[collections.<Type>]` section
///
/// # Example
/// ```toml
/// [collections.Book]
/// route = "/books/:title_raw"
/// sort_by = "title"
/// refs = { author = "Author", tags = "Tag" }
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Route template used to compute node paths.
    #[serde(default = "defaults::collection::route")]
    #[educe(Default = defaults::collection::route())]
    pub route: Option<String>,

    /// Default sort field (always descending).
    #[serde(default = "defaults::collection::sort_by")]
    #[educe(Default = defaults::collection::sort_by())]
    pub sort_by: String,

    /// Overrides `[permalinks].date_field` for this collection.
    #[serde(default = "defaults::collection::date_field")]
    #[educe(Default = defaults::collection::date_field())]
    pub date_field: Option<String>,

    /// Declared references: field name -> referenced type name.
    #[serde(default = "defaults::collection::refs")]
    #[educe(Default = defaults::collection::refs())]
    pub refs: BTreeMap<String, String>,
}

impl CollectionConfig {
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = field.into();
        self
    }

    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = Some(field.into());
        self
    }

    /// Declare `field` as a reference to nodes of `type_name`.
    pub fn with_ref(mut self, field: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.refs.insert(field.into(), type_name.into());
        self
    }
}

impl StoreConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let mut config: StoreConfig = toml::from_str(content).map_err(ConfigError::from)?;
        config.expand_paths();
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Expand `~` in configured directories.
    fn expand_paths(&mut self) {
        if let Some(context) = &self.assets.context {
            let expanded = shellexpand::tilde(&context.to_string_lossy()).into_owned();
            self.assets.context = Some(PathBuf::from(expanded));
        }
    }

    /// Validate configuration before a store is built from it.
    pub fn validate(&self) -> Result<()> {
        if let Some(ext) = self
            .assets
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            bail!(ConfigError::Validation(format!(
                "[assets.extensions] entry `{ext}` must be non-empty and have no leading dot"
            )));
        }

        if self.permalinks.date_field.is_empty() {
            bail!(ConfigError::Validation(
                "[permalinks.date_field] must not be empty".into()
            ));
        }

        for (type_name, collection) in &self.collections {
            if type_name.is_empty() {
                bail!(ConfigError::Validation(
                    "[collections] type names must not be empty".into()
                ));
            }

            if let Some(route) = &collection.route
                && let Err(err) = RouteTemplate::compile(route)
            {
                bail!(ConfigError::Validation(format!(
                    "[collections.{type_name}.route] `{route}`: {err}"
                )));
            }

            if let Some((field, _)) = collection.refs.iter().find(|(_, target)| target.is_empty()) {
                bail!(ConfigError::Validation(format!(
                    "[collections.{type_name}.refs.{field}] must name a type"
                )));
            }
        }

        Ok(())
    }

    /// Date field used by a collection's route, falling back to `[permalinks]`.
    pub fn date_field_for<'a>(&'a self, collection: &'a CollectionConfig) -> &'a str {
        collection
            .date_field
            .as_deref()
            .unwrap_or(&self.permalinks.date_field)
    }
}

// ============================================================================
// Tests
// ============================================================================
