//! The content store.
//!
//! # Architecture
//!
//! ```text
//! Store
//! ├── collections: typeName -> Collection   (nodes by insertion order)
//! ├── backlinks:   uid -> pointsTo          (+ reverse typeName/id -> uids)
//! ├── metadata:    global key-value data
//! ├── transformers: mimeType -> parser
//! ├── clock:       last-modified
//! └── listeners:   store-wide mutation events
//! ```
//!
//! Every node lives in exactly one collection. References between nodes are
//! plain `(typeName, id)` values resolved by lookup, so cyclic graphs need
//! no special handling.
//!
//! # Concurrency
//!
//! Mutation takes `&mut Store` (through [`CollectionMut`]), so concurrent
//! writers need external synchronization: [`Store::into_shared`] wraps the
//! store in a `parking_lot::RwLock`. Reads (`get_node`, `find`,
//! `query_backlinks`) take `&self` and may run in parallel once loading has
//! finished.

pub mod backlinks;
pub mod builder;
pub mod clock;
pub mod collection;
pub mod events;
pub mod fields;
pub mod metadata;
pub mod node;
pub mod route;
pub mod transform;
pub mod value;

pub use backlinks::{BacklinkEntry, BacklinkIndex};
pub use clock::Clock;
pub use collection::{Collection, CollectionMut, CollectionOptions, RemoveTarget, Resolver};
pub use events::{EventKind, ListenerId, NodeEvent};
pub use metadata::MetaData;
pub use node::{Internal, InternalInput, Node, NodeInput};
pub use transform::{Transformer, TransformerRegistry};
pub use value::{FieldMap, PointsTo, Reference, create_reference, is_reference};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::log;
use crate::query::{FieldLookup, PlainFields, Query, QueryResult, evaluate};
use events::Listeners;
use parking_lot::RwLock;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, btree_map::Entry};
use std::sync::Arc;

/// A store shared across threads.
pub type SharedStore = Arc<RwLock<Store>>;

#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    collections: BTreeMap<String, Collection>,
    backlinks: BacklinkIndex,
    metadata: MetaData,
    transformers: TransformerRegistry,
    clock: Clock,
    listeners: Listeners,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// An empty store with default configuration and the built-in
    /// transformers.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// An empty store using `config` for assets, permalinks and logging.
    ///
    /// `[log] quiet = true` silences the process-wide logger; a config
    /// without it leaves the logger as it is. `[collections]` are not
    /// created; see [`Self::from_config`].
    pub fn with_config(config: StoreConfig) -> Self {
        if config.log.quiet {
            crate::logger::set_quiet(true);
        }
        Self {
            config,
            collections: BTreeMap::new(),
            backlinks: BacklinkIndex::new(),
            metadata: MetaData::new(),
            transformers: TransformerRegistry::with_builtins(),
            clock: Clock::new(),
            listeners: Listeners::new(),
        }
    }

    /// Validate `config` and create every declared collection.
    pub fn from_config(config: StoreConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let declared = config.collections.clone();

        let mut store = Self::with_config(config);
        for (type_name, options) in declared {
            store.add_collection(type_name, options)?;
        }
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Wrap the store for shared access across threads.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Create a collection. Fails with `CollectionExists` if `type_name` is
    /// taken, or `InvalidRoute` if the route does not compile.
    pub fn add_collection(
        &mut self,
        type_name: impl Into<String>,
        options: CollectionOptions,
    ) -> StoreResult<CollectionMut<'_>> {
        let type_name = type_name.into();
        let collection = match self.collections.entry(type_name.clone()) {
            Entry::Occupied(_) => return Err(StoreError::CollectionExists(type_name)),
            Entry::Vacant(slot) => {
                let collection = Collection::new(type_name.clone(), options, &self.config)?;
                slot.insert(collection)
            }
        };
        log!("store"; "collection `{}` created", type_name);

        Ok(CollectionMut {
            collection,
            backlinks: &mut self.backlinks,
            clock: &self.clock,
            transformers: &self.transformers,
            config: &self.config,
            store_listeners: &self.listeners,
        })
    }

    pub fn collection(&self, type_name: &str) -> Option<&Collection> {
        self.collections.get(type_name)
    }

    /// Write handle for an existing collection.
    pub fn collection_mut(&mut self, type_name: &str) -> StoreResult<CollectionMut<'_>> {
        let collection = self
            .collections
            .get_mut(type_name)
            .ok_or_else(|| StoreError::UnknownCollection(type_name.to_owned()))?;

        Ok(CollectionMut {
            collection,
            backlinks: &mut self.backlinks,
            clock: &self.clock,
            transformers: &self.transformers,
            config: &self.config,
            store_listeners: &self.listeners,
        })
    }

    /// Collections sorted by type name.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn has_collection(&self, type_name: &str) -> bool {
        self.collections.contains_key(type_name)
    }

    /// Find a node in any collection by its uid.
    pub fn get_node_by_uid(&self, uid: &str) -> Option<&Node> {
        let entry = self.backlinks.get(uid)?;
        self.collections.get(&entry.type_name)?.get_by_uid(uid)
    }

    /// Find a node by type name and `id` (or uid).
    pub fn get_node(&self, type_name: &str, key: &str) -> Option<&Node> {
        self.collections.get(type_name)?.get_node(key)
    }

    // ========================================================================
    // Backlinks
    // ========================================================================

    /// Nodes referencing `(type_name, id)`, in no particular order.
    pub fn backlinks<'a>(
        &'a self,
        type_name: &str,
        id: &str,
    ) -> impl Iterator<Item = &'a Node> + use<'a> {
        self.backlinks.query(type_name, id).filter_map(move |entry| {
            self.collections
                .get(&entry.type_name)?
                .get_by_uid(&entry.uid)
        })
    }

    /// Evaluate `query` over the nodes referencing `(type_name, id)`.
    ///
    /// Without sort keys, results sort by `[permalinks].date_field`,
    /// descending.
    pub fn query_backlinks(&self, type_name: &str, id: &str, query: &Query) -> QueryResult<'_> {
        evaluate(
            self.backlinks(type_name, id),
            query,
            self,
            &self.config.permalinks.date_field,
        )
    }

    pub fn backlink_index(&self) -> &BacklinkIndex {
        &self.backlinks
    }

    // ========================================================================
    // Metadata, Transformers, Clock, Events
    // ========================================================================

    /// Add global metadata (lists concatenate, maps merge, scalars overwrite).
    pub fn add_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.add(key, value);
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Register a content transformer for all of its mime types.
    pub fn register_transformer(&mut self, transformer: Arc<dyn Transformer>) {
        log!("store"; "transformer registered for {}", transformer.mime_types().join(", "));
        self.transformers.register(transformer);
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    /// Clock value of the last mutation (0 before any).
    pub fn last_modified(&self) -> u64 {
        self.clock.last_modified()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Listen to mutations of every collection.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&NodeEvent<'_>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

/// Resolves fields through the collection owning each node.
impl FieldLookup for Store {
    fn lookup<'n>(&self, node: &'n Node, path: &str) -> Option<Cow<'n, Value>> {
        match self.collections.get(&node.type_name) {
            Some(collection) => collection.lookup(node, path),
            None => PlainFields.lookup(node, path),
        }
    }
}
