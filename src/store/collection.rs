//! Collections: one typed table of nodes per type name.
//!
//! Reads go through [`Collection`] (`&self`, safe to share across threads).
//! Writes go through [`CollectionMut`], a handle borrowed from the store
//! that also holds the backlink index, clock and transformers, so a
//! mutation updates the table, the index and the clock under one `&mut`.
//!
//! # Mutation Order
//!
//! ```text
//! build node ─▶ check uniqueness ─▶ bump clock ─▶ index ─▶ table ─▶ emit
//!      │               │
//!      └── failure ────┴──▶ return error, nothing touched
//! ```

use super::backlinks::{BacklinkEntry, BacklinkIndex};
use super::builder::{BuiltNode, NodeBuilder};
use super::clock::Clock;
use super::events::{ListenerId, Listeners, NodeEvent};
use super::node::{Node, NodeInput};
use super::route::RouteTemplate;
use super::transform::TransformerRegistry;
use crate::config::{CollectionConfig, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::log;
use crate::query::{FieldLookup, Filter, PlainFields, Query, QueryResult, evaluate};
use crate::utils::slug::is_reserved;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::sync::Arc;

/// Options of a collection. Same shape as a `[collections.<Type>]` section.
pub type CollectionOptions = CollectionConfig;

/// A computed field: derived from a node at query time.
pub type Resolver = Arc<dyn Fn(&Node) -> Option<Value> + Send + Sync>;

/// What `remove_node` deletes.
#[derive(Debug, Clone)]
pub enum RemoveTarget {
    /// An `id` or `uid`
    Key(String),
    /// Every node matching a filter
    Filter(Filter),
}

impl From<&str> for RemoveTarget {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for RemoveTarget {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<Filter> for RemoveTarget {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

/// A typed table of nodes.
pub struct Collection {
    type_name: String,
    options: CollectionOptions,
    route: Option<RouteTemplate>,
    /// `options.date_field`, or the store-wide default
    date_field: String,
    /// Nodes by insertion sequence
    nodes: BTreeMap<u64, Node>,
    by_id: FxHashMap<String, u64>,
    by_uid: FxHashMap<String, u64>,
    next_seq: u64,
    resolvers: FxHashMap<String, Resolver>,
    listeners: Listeners,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("type_name", &self.type_name)
            .field("route", &self.route.as_ref().map(RouteTemplate::as_str))
            .field("nodes", &self.nodes.len())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Collection {
    /// Create an empty collection. Fails if the route does not compile.
    pub(crate) fn new(
        type_name: String,
        options: CollectionOptions,
        config: &StoreConfig,
    ) -> StoreResult<Self> {
        let route = options
            .route
            .as_deref()
            .map(|template| {
                RouteTemplate::compile(template).map_err(|source| StoreError::InvalidRoute {
                    type_name: type_name.clone(),
                    template: template.to_owned(),
                    source,
                })
            })
            .transpose()?;
        let date_field = config.date_field_for(&options).to_owned();

        Ok(Self {
            type_name,
            options,
            route,
            date_field,
            nodes: BTreeMap::new(),
            by_id: FxHashMap::default(),
            by_uid: FxHashMap::default(),
            next_seq: 0,
            resolvers: FxHashMap::default(),
            listeners: Listeners::new(),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    pub fn route(&self) -> Option<&RouteTemplate> {
        self.route.as_ref()
    }

    /// Default sort field (always descending).
    pub fn sort_by(&self) -> &str {
        &self.options.sort_by
    }

    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    /// Declared references (field name -> type name).
    pub fn refs(&self) -> &BTreeMap<String, String> {
        &self.options.refs
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + DoubleEndedIterator {
        self.nodes.values()
    }

    /// Look up a node by `id`, falling back to `uid`.
    pub fn get_node(&self, key: &str) -> Option<&Node> {
        self.get_by_id(key).or_else(|| self.get_by_uid(key))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).and_then(|seq| self.nodes.get(seq))
    }

    pub fn get_by_uid(&self, uid: &str) -> Option<&Node> {
        self.by_uid.get(uid).and_then(|seq| self.nodes.get(seq))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_id.contains_key(key) || self.by_uid.contains_key(key)
    }

    /// Evaluate a query over this collection.
    ///
    /// Without sort keys, nodes sort by the collection's `sort_by` field,
    /// descending.
    pub fn find(&self, query: &Query) -> QueryResult<'_> {
        evaluate(self.nodes(), query, self, &self.options.sort_by)
    }

    /// First node (in insertion order) matching `filter`.
    pub fn find_one(&self, filter: &Filter) -> Option<&Node> {
        self.nodes().find(|node| filter.matches(node, self))
    }

    /// Custom field names in use, sorted, plus resolver names.
    ///
    /// Reserved `$`-prefixed names are left out.
    pub fn schema_fields(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self
            .nodes()
            .flat_map(|node| node.fields.keys())
            .map(String::as_str)
            .collect();
        names.extend(self.resolvers.keys().map(String::as_str));
        names
            .into_iter()
            .filter(|name| !is_reserved(name))
            .map(str::to_owned)
            .collect()
    }

    fn insert(&mut self, node: Node) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(node.id.clone(), seq);
        self.by_uid.insert(node.uid.clone(), seq);
        self.nodes.insert(seq, node);
        seq
    }

    /// Swap the node at `seq`, returning the old one. The uid never changes.
    fn replace(&mut self, seq: u64, node: Node) -> Option<Node> {
        let slot = self.nodes.get_mut(&seq)?;
        let old = std::mem::replace(slot, node);
        if old.id != slot.id {
            self.by_id.remove(&old.id);
            self.by_id.insert(slot.id.clone(), seq);
        }
        Some(old)
    }

    fn take(&mut self, seq: u64) -> Option<Node> {
        let node = self.nodes.remove(&seq)?;
        self.by_id.remove(&node.id);
        self.by_uid.remove(&node.uid);
        Some(node)
    }

    fn seq_of(&self, key: &str) -> Option<u64> {
        self.by_id.get(key).or_else(|| self.by_uid.get(key)).copied()
    }
}

impl FieldLookup for Collection {
    fn lookup<'n>(&self, node: &'n Node, path: &str) -> Option<Cow<'n, Value>> {
        match self.resolvers.get(path) {
            Some(resolver) => resolver(node).filter(|value| !value.is_null()).map(Cow::Owned),
            None => PlainFields.lookup(node, path),
        }
    }
}

// ============================================================================
// Write Handle
// ============================================================================

/// Mutable access to one collection, borrowed from the store.
#[derive(Debug)]
pub struct CollectionMut<'s> {
    pub(crate) collection: &'s mut Collection,
    pub(crate) backlinks: &'s mut BacklinkIndex,
    pub(crate) clock: &'s Clock,
    pub(crate) transformers: &'s TransformerRegistry,
    pub(crate) config: &'s StoreConfig,
    pub(crate) store_listeners: &'s Listeners,
}

impl Deref for CollectionMut<'_> {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        self.collection
    }
}

impl CollectionMut<'_> {
    /// Build and insert a node.
    ///
    /// Fails with `DuplicateKey` if the id (or an explicit uid) is taken;
    /// nothing is modified on failure.
    pub fn add_node(&mut self, input: NodeInput) -> StoreResult<&Node> {
        let BuiltNode { mut node, points_to } = {
            let backlinks = &*self.backlinks;
            self.builder()
                .build(input, None, |uid| backlinks.get(uid).is_some())?
        };

        if self.collection.by_id.contains_key(&node.id) {
            return Err(self.duplicate(node.id));
        }
        if self.backlinks.get(&node.uid).is_some() {
            return Err(self.duplicate(node.uid));
        }

        node.internal.last_modified = self.clock.bump();
        self.backlinks.index(entry_for(&node, points_to));
        let seq = self.collection.insert(node);

        let node = &self.collection.nodes[&seq];
        self.emit(&NodeEvent::Add(node));
        Ok(node)
    }

    /// Overlay `input` onto an existing node.
    ///
    /// The target is found by `uid` when the input carries one, else by
    /// `id`. Fields the input does not mention keep their old values. The
    /// input may change the node's `id` (then it must carry the `uid`);
    /// the uid never changes.
    pub fn update_node(&mut self, input: NodeInput) -> StoreResult<&Node> {
        let seq = input
            .uid
            .as_deref()
            .and_then(|uid| self.collection.by_uid.get(uid))
            .or_else(|| input.id.as_deref().and_then(|id| self.collection.by_id.get(id)))
            .copied()
            .ok_or_else(|| StoreError::NotFound {
                type_name: self.collection.type_name.clone(),
                key: input
                    .uid
                    .clone()
                    .or_else(|| input.id.clone())
                    .unwrap_or_default(),
            })?;

        let BuiltNode { mut node, points_to } = {
            let old = &self.collection.nodes[&seq];
            self.builder().build(input, Some(old), |_| false)?
        };

        if self
            .collection
            .by_id
            .get(&node.id)
            .is_some_and(|&other| other != seq)
        {
            return Err(self.duplicate(node.id));
        }

        node.internal.last_modified = self.clock.bump();
        self.backlinks.reindex(entry_for(&node, points_to));
        let old = self
            .collection
            .replace(seq, node)
            .ok_or_else(|| StoreError::NotFound {
                type_name: self.collection.type_name.clone(),
                key: seq.to_string(),
            })?;

        let node = &self.collection.nodes[&seq];
        self.emit(&NodeEvent::Update { node, old: &old });
        Ok(node)
    }

    /// Remove by key or filter. Returns the removed nodes; a target that
    /// matches nothing is a no-op.
    pub fn remove_node(&mut self, target: impl Into<RemoveTarget>) -> Vec<Node> {
        let seqs: Vec<u64> = match target.into() {
            RemoveTarget::Key(key) => self.collection.seq_of(&key).into_iter().collect(),
            RemoveTarget::Filter(filter) => {
                let collection = &*self.collection;
                collection
                    .nodes
                    .iter()
                    .filter(|(_, node)| filter.matches(node, collection))
                    .map(|(&seq, _)| seq)
                    .collect()
            }
        };

        let mut removed = Vec::with_capacity(seqs.len());
        for seq in seqs {
            let Some(node) = self.collection.take(seq) else {
                continue;
            };
            self.backlinks.unindex(&node.uid);
            self.clock.bump();
            self.emit(&NodeEvent::Remove(&node));
            removed.push(node);
        }
        removed
    }

    /// [`Self::add_node`], logging and skipping recoverable errors.
    pub fn try_add_node(&mut self, input: NodeInput) -> StoreResult<Option<&Node>> {
        match self.add_node(input) {
            Ok(node) => Ok(Some(node)),
            Err(err) if err.is_recoverable() => {
                log!("skip"; "{}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// [`Self::update_node`], logging and skipping recoverable errors.
    pub fn try_update_node(&mut self, input: NodeInput) -> StoreResult<Option<&Node>> {
        match self.update_node(input) {
            Ok(node) => Ok(Some(node)),
            Err(err) if err.is_recoverable() => {
                log!("skip"; "{}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// [`Self::remove_node`], logging when nothing matched.
    pub fn try_remove_node(&mut self, target: impl Into<RemoveTarget>) -> Vec<Node> {
        let target = target.into();
        let label = match &target {
            RemoveTarget::Key(key) => key.clone(),
            RemoveTarget::Filter(_) => "<filter>".to_owned(),
        };

        let removed = self.remove_node(target);
        if removed.is_empty() {
            log!("skip"; "nothing to remove for `{}` in `{}`", label, self.collection.type_name);
        }
        removed
    }

    /// Declare a named reference for later mutations.
    pub fn add_reference(&mut self, field: impl Into<String>, type_name: impl Into<String>) {
        self.collection
            .options
            .refs
            .insert(field.into(), type_name.into());
    }

    /// Register a computed field. Resolvers shadow stored fields of the
    /// same name in filters and sorts.
    pub fn add_resolver<F>(&mut self, field: impl Into<String>, resolver: F)
    where
        F: Fn(&Node) -> Option<Value> + Send + Sync + 'static,
    {
        self.collection
            .resolvers
            .insert(field.into(), Arc::new(resolver));
    }

    /// Listen to mutations of this collection.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&NodeEvent<'_>) + Send + Sync + 'static,
    {
        self.collection.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.collection.listeners.unsubscribe(id)
    }

    fn builder(&self) -> NodeBuilder<'_> {
        NodeBuilder {
            type_name: &self.collection.type_name,
            route: self.collection.route.as_ref(),
            date_field: &self.collection.date_field,
            refs: &self.collection.options.refs,
            transformers: self.transformers,
            assets: &self.config.assets,
            trailing_slash: self.config.permalinks.trailing_slash,
        }
    }

    fn duplicate(&self, id: String) -> StoreError {
        StoreError::DuplicateKey {
            type_name: self.collection.type_name.clone(),
            id,
        }
    }

    /// Collection listeners first, then store listeners.
    fn emit(&self, event: &NodeEvent<'_>) {
        self.collection.listeners.emit(event);
        self.store_listeners.emit(event);
    }
}

fn entry_for(node: &Node, points_to: super::value::PointsTo) -> BacklinkEntry {
    BacklinkEntry {
        uid: node.uid.clone(),
        type_name: node.type_name.clone(),
        id: node.id.clone(),
        points_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Direction, Predicate, Sort};
    use crate::store::events::EventKind;
    use crate::store::value::create_reference;
    use crate::store::Store;
    use parking_lot::Mutex;
    use serde_json::json;

    fn store_with_posts() -> Store {
        let mut store = Store::new();
        store
            .add_collection("Post", CollectionOptions::default().with_route("/:slug"))
            .unwrap();
        store
    }

    #[test]
    fn test_add_and_get() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        let uid = posts
            .add_node(NodeInput::new().id("1").field("title", "Hello World"))
            .unwrap()
            .uid
            .clone();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts.get_node("1").unwrap().path.as_deref(), Some("/hello-world"));
        assert_eq!(posts.get_node(&uid).unwrap().id, "1");
        assert!(posts.contains(&uid));
        assert!(posts.get_node("2").is_none());
    }

    #[test]
    fn test_duplicate_id_leaves_state_untouched() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        posts
            .add_node(NodeInput::new().id("1").field("title", "First"))
            .unwrap();
        let err = posts
            .add_node(NodeInput::new().id("1").field("title", "Second"))
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey { ref id, .. } if id == "1"));
        assert_eq!(posts.len(), 1);
        assert_eq!(posts.get_node("1").unwrap().fields["title"], json!("First"));
        assert_eq!(store.backlink_index().len(), 1);
    }

    #[test]
    fn test_try_add_skips_duplicates() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        assert!(posts.try_add_node(NodeInput::new().id("1")).unwrap().is_some());
        assert!(posts.try_add_node(NodeInput::new().id("1")).unwrap().is_none());
        assert!(posts
            .try_add_node(NodeInput::new().id("2").content("text/markdown", "# x"))
            .is_err());
    }

    #[test]
    fn test_update_preserves_unmentioned_fields() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        posts
            .add_node(
                NodeInput::new()
                    .id("1")
                    .field("title", "Hello")
                    .field("excerpt", "Short")
                    .field("tags", json!(["a"])),
            )
            .unwrap();

        let node = posts
            .update_node(NodeInput::new().id("1").field("title", "Changed"))
            .unwrap();
        assert_eq!(node.fields["title"], json!("Changed"));
        assert_eq!(node.fields["excerpt"], json!("Short"));
        assert_eq!(node.fields["tags"], json!(["a"]));
        assert_eq!(node.path.as_deref(), Some("/changed"));
    }

    #[test]
    fn test_update_missing_fails_and_try_skips() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        let err = posts.update_node(NodeInput::new().id("9")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref key, .. } if key == "9"));
        assert!(posts.try_update_node(NodeInput::new().id("9")).unwrap().is_none());
    }

    #[test]
    fn test_update_changes_id_by_uid() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        let uid = posts.add_node(NodeInput::new().id("1")).unwrap().uid.clone();
        posts.add_node(NodeInput::new().id("2")).unwrap();

        let clock_before = posts.clock.last_modified();
        let err = posts
            .update_node(
                NodeInput::new()
                    .uid(uid.clone())
                    .id("2")
                    .field("author", create_reference("Author", "9")),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref id, .. } if id == "2"));

        // failed update leaves table, index and clock alone
        let entry = posts.backlinks.get(&uid).unwrap();
        assert_eq!(entry.id, "1");
        assert!(entry.points_to.is_empty());
        assert_eq!(posts.backlinks.query("Author", "9").count(), 0);
        assert_eq!(posts.get_node("1").unwrap().uid, uid);
        assert!(!posts.get_node("1").unwrap().fields.contains_key("author"));
        assert_ne!(posts.get_node("2").unwrap().uid, uid);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts.clock.last_modified(), clock_before);

        let node = posts
            .update_node(NodeInput::new().uid(uid.clone()).id("renamed"))
            .unwrap();
        assert_eq!(node.uid, uid);
        assert!(posts.get_node("1").is_none());
        assert_eq!(posts.get_node("renamed").unwrap().uid, uid);

        // the freed id gets a fresh uid
        let fresh = posts.add_node(NodeInput::new().id("1")).unwrap().uid.clone();
        assert_ne!(fresh, uid);
    }

    #[test]
    fn test_update_reindexes_backlinks() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        posts
            .add_node(NodeInput::new().id("1").field("author", create_reference("Author", "2")))
            .unwrap();
        posts
            .update_node(NodeInput::new().id("1").field("author", create_reference("Author", "3")))
            .unwrap();

        assert_eq!(store.backlinks("Author", "2").count(), 0);
        assert_eq!(store.backlinks("Author", "3").count(), 1);
    }

    #[test]
    fn test_remove_by_key_and_filter() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        for (id, draft) in [("1", true), ("2", false), ("3", true)] {
            posts
                .add_node(NodeInput::new().id(id).field("draft", draft))
                .unwrap();
        }

        let removed = posts.remove_node(Filter::new().eq("draft", true));
        assert_eq!(removed.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), ["1", "3"]);
        assert!(posts.remove_node("missing").is_empty());
        assert!(posts.try_remove_node("missing").is_empty());
        assert_eq!(posts.remove_node("2").len(), 1);
        assert!(posts.is_empty());
        assert!(store.backlink_index().is_empty());
    }

    #[test]
    fn test_collection_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        let sink = Arc::clone(&seen);
        let id = posts.subscribe(move |event| {
            let old = match event {
                NodeEvent::Update { old, .. } => old.fields.get("title").cloned(),
                _ => None,
            };
            sink.lock().push((event.kind(), event.node().id.clone(), old));
        });

        posts.add_node(NodeInput::new().id("1").field("title", "A")).unwrap();
        posts.update_node(NodeInput::new().id("1").field("title", "B")).unwrap();
        posts.remove_node("1");
        assert!(posts.unsubscribe(id));
        posts.add_node(NodeInput::new().id("2")).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                (EventKind::Add, "1".to_string(), None),
                (EventKind::Update, "1".to_string(), Some(json!("A"))),
                (EventKind::Remove, "1".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_add_reference_applies_to_later_nodes() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        posts.add_node(NodeInput::new().id("1").field("author", "2")).unwrap();
        posts.add_reference("author", "Author");
        posts.add_node(NodeInput::new().id("2").field("author", "2")).unwrap();

        let ids: Vec<&str> = store.backlinks("Author", "2").map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["2"]);
    }

    #[test]
    fn test_find_with_resolver_and_default_sort() {
        let mut store = Store::new();
        let mut products = store
            .add_collection("Product", CollectionOptions::default().with_sort_by("price"))
            .unwrap();
        for (id, price) in [("a", 99), ("b", 199), ("c", 149), ("d", 119)] {
            products
                .add_node(NodeInput::new().id(id).field("price", price))
                .unwrap();
        }
        products.add_resolver("cheap", |node| {
            node.fields
                .get("price")
                .and_then(Value::as_i64)
                .map(|price| Value::Bool(price < 120))
        });

        let all = products.find(&Query::new());
        assert_eq!(all.ids(), ["b", "c", "d", "a"]);

        let query = Query::new()
            .filter(Filter::new().eq("cheap", true))
            .sort(Sort::by("price", Direction::Asc));
        assert_eq!(products.find(&query).ids(), ["a", "d"]);

        let found = products.find_one(&Filter::new().field("price", Predicate::Gt(json!(150))));
        assert_eq!(found.unwrap().id, "b");
        assert_eq!(products.schema_fields(), ["cheap", "price"]);
    }

    #[test]
    fn test_schema_fields_skip_reserved() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        posts
            .add_node(NodeInput::new().id("1").field("$loaded", true).field("title", "x"))
            .unwrap();
        posts
            .add_node(NodeInput::new().id("2").field("excerpt", "y"))
            .unwrap();
        assert_eq!(posts.schema_fields(), ["excerpt", "title"]);
    }

    #[test]
    fn test_nodes_in_insertion_order() {
        let mut store = store_with_posts();
        let mut posts = store.collection_mut("Post").unwrap();
        for id in ["z", "a", "m"] {
            posts.add_node(NodeInput::new().id(id)).unwrap();
        }
        posts.remove_node("a");
        posts.add_node(NodeInput::new().id("a")).unwrap();
        let ids: Vec<&str> = posts.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["z", "m", "a"]);
    }
}
