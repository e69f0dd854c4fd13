//! Per-origin bookkeeping for conflict detection.
//!
//! Every original node that is used as a derivation root, or rebuilt as
//! part of one, gets an entry recording the exclusion sets it was rebuilt
//! under. Entries hold the origin weakly and never decide reuse.

use crate::exclusion::ExclusionSet;
use disinherit_types::{NodeId, TypeRef, WeakTypeRef};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Derivations produced from a single original node.
#[derive(Debug)]
pub struct OriginEntry {
    origin: WeakTypeRef,
    copies: IndexMap<ExclusionSet, TypeRef>,
}

impl OriginEntry {
    fn new(origin: &TypeRef) -> Self {
        OriginEntry {
            origin: origin.downgrade(),
            copies: IndexMap::new(),
        }
    }

    pub fn origin(&self) -> Option<TypeRef> {
        self.origin.upgrade()
    }

    pub fn origin_id(&self) -> NodeId {
        self.origin.id()
    }

    /// Rebuilt image of the origin under `set`, if any.
    pub fn copy(&self, set: &ExclusionSet) -> Option<&TypeRef> {
        self.copies.get(set)
    }

    /// Exclusion sets recorded, in the order they were first seen.
    pub fn sets(&self) -> impl Iterator<Item = &ExclusionSet> {
        self.copies.keys()
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// More than one distinct exclusion set was recorded.
    pub fn is_conflicted(&self) -> bool {
        self.copies.len() > 1
    }
}

/// Registry of origin entries keyed by node identity.
#[derive(Debug, Default)]
pub struct OriginRegistry {
    entries: HashMap<NodeId, OriginEntry>,
}

impl OriginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the entry for `origin`.
    pub fn entry(&mut self, origin: &TypeRef) -> &mut OriginEntry {
        self.entries
            .entry(origin.id())
            .or_insert_with(|| OriginEntry::new(origin))
    }

    pub fn get(&self, origin: &TypeRef) -> Option<&OriginEntry> {
        self.entries.get(&origin.id())
    }

    /// Record that `origin` was rebuilt as `copy` under `set`.
    pub fn record(&mut self, origin: &TypeRef, set: &ExclusionSet, copy: TypeRef) {
        self.entry(origin).copies.insert(set.clone(), copy);
    }

    /// Sets recorded for `origin`, oldest first.
    pub fn derivations(&self, origin: &TypeRef) -> Vec<ExclusionSet> {
        self.get(origin)
            .map(|entry| entry.sets().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_conflicted(&self, origin: &TypeRef) -> bool {
        self.get(origin).is_some_and(OriginEntry::is_conflicted)
    }

    /// Drop every copy recorded under `set`. Entries stay.
    pub fn forget(&mut self, set: &ExclusionSet) -> usize {
        self.entries
            .values_mut()
            .filter_map(|entry| entry.copies.shift_remove(set))
            .count()
    }

    /// Total copies recorded across all entries.
    pub fn copies(&self) -> usize {
        self.entries.values().map(OriginEntry::len).sum()
    }

    /// Drop entries whose origin no longer exists.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.origin.is_alive());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
