//! Mutation events and listener registries.
//!
//! Each collection and the store itself own a [`Listeners`] registry.
//! Events are delivered synchronously, after the node table and the
//! backlink index have both been updated. Subscriptions live until
//! [`Listeners::unsubscribe`] is called with the returned [`ListenerId`].

use super::node::Node;

/// A committed mutation.
#[derive(Debug, Clone, Copy)]
pub enum NodeEvent<'a> {
    Add(&'a Node),
    Update { node: &'a Node, old: &'a Node },
    Remove(&'a Node),
}

/// Event kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Update,
    Remove,
}

impl NodeEvent<'_> {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Add(_) => EventKind::Add,
            Self::Update { .. } => EventKind::Update,
            Self::Remove(_) => EventKind::Remove,
        }
    }

    /// The node after the mutation (or the removed node).
    pub const fn node(&self) -> &Node {
        match self {
            Self::Add(node) | Self::Remove(node) | Self::Update { node, .. } => node,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn Fn(&NodeEvent<'_>) + Send + Sync>;

/// An explicit listener registry.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners run in subscription order.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&NodeEvent<'_>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&self, event: &NodeEvent<'_>) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
