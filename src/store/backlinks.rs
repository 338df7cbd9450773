//! Backlink index: "which nodes reference this one".
//!
//! One entry per node, keyed by `uid`, holding everything the node points
//! to. A reverse map `typeName -> id -> {uid}` answers backlink lookups
//! without scanning every entry.
//!
//! ```text
//! entries:  uid(book-1) -> { Author: {2}, Tag: {rust} }
//! reverse:  Author -> 2    -> {uid(book-1)}
//!           Tag    -> rust -> {uid(book-1)}
//! ```
//!
//! The index holds uids only. Composing full nodes is the store's job: it
//! joins each entry back into the owning collection by uid.

use super::value::PointsTo;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// What one node points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkEntry {
    pub uid: String,
    pub type_name: String,
    pub id: String,
    pub points_to: PointsTo,
}

#[derive(Debug, Default)]
pub struct BacklinkIndex {
    entries: FxHashMap<String, BacklinkEntry>,
    reverse: FxHashMap<String, FxHashMap<String, BTreeSet<String>>>,
}

impl BacklinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any existing entry for the same uid.
    pub fn index(&mut self, entry: BacklinkEntry) {
        self.unindex(&entry.uid);

        for (type_name, ids) in &entry.points_to {
            let by_id = self.reverse.entry(type_name.clone()).or_default();
            for id in ids {
                by_id.entry(id.clone()).or_default().insert(entry.uid.clone());
            }
        }
        self.entries.insert(entry.uid.clone(), entry);
    }

    /// Replace the entry of a node wholesale.
    ///
    /// Runs under the same `&mut` borrow as the table update, so no reader
    /// can observe the window between removal and insertion.
    #[inline]
    pub fn reindex(&mut self, entry: BacklinkEntry) {
        self.index(entry);
    }

    /// Remove the entry of a node. Returns it if present.
    pub fn unindex(&mut self, uid: &str) -> Option<BacklinkEntry> {
        let entry = self.entries.remove(uid)?;

        for (type_name, ids) in &entry.points_to {
            let Some(by_id) = self.reverse.get_mut(type_name) else {
                continue;
            };
            for id in ids {
                if let Some(uids) = by_id.get_mut(id) {
                    uids.remove(uid);
                    if uids.is_empty() {
                        by_id.remove(id);
                    }
                }
            }
            if by_id.is_empty() {
                self.reverse.remove(type_name);
            }
        }

        Some(entry)
    }

    pub fn get(&self, uid: &str) -> Option<&BacklinkEntry> {
        self.entries.get(uid)
    }

    /// Entries pointing at `(type_name, id)`, in uid order.
    pub fn query<'a>(
        &'a self,
        type_name: &str,
        id: &str,
    ) -> impl Iterator<Item = &'a BacklinkEntry> + use<'a> {
        self.reverse
            .get(type_name)
            .and_then(|by_id| by_id.get(id))
            .into_iter()
            .flatten()
            .filter_map(|uid| self.entries.get(uid))
    }

    /// Number of nodes pointing at `(type_name, id)`.
    pub fn count(&self, type_name: &str, id: &str) -> usize {
        self.reverse
            .get(type_name)
            .and_then(|by_id| by_id.get(id))
            .map_or(0, BTreeSet::len)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
