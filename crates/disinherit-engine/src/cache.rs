//! Per-exclusion-set memo tables.

use crate::exclusion::ExclusionSet;
use disinherit_types::{MemberTable, NodeId, TypeRef, WeakTypeRef};
use std::collections::HashMap;
use std::sync::Arc;

/// What an original node maps to under an exclusion set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Image {
    /// Neither the node nor any ancestor needs modification; the original
    /// is reused.
    Unchanged,
    /// A replacement node with filtered members and rewritten bases.
    Rebuilt(TypeRef),
}

impl Image {
    /// The node that stands in for `origin`.
    pub fn resolve(&self, origin: &TypeRef) -> TypeRef {
        match self {
            Image::Unchanged => origin.clone(),
            Image::Rebuilt(node) => node.clone(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Image::Unchanged)
    }
}

#[derive(Debug)]
struct Slot {
    origin: WeakTypeRef,
    table: Option<Arc<MemberTable>>,
    image: Option<Image>,
}

/// Filtered tables and images computed under one exclusion set.
///
/// Slots hold their origin weakly. `Unchanged` images carry no reference
/// at all, so reuse never extends an original's lifetime.
#[derive(Debug)]
pub(crate) struct SetCache {
    set: ExclusionSet,
    slots: HashMap<NodeId, Slot>,
    last_used: u64,
}

impl SetCache {
    pub(crate) fn new(set: ExclusionSet) -> Self {
        SetCache {
            set,
            slots: HashMap::new(),
            last_used: 0,
        }
    }

    pub(crate) fn set(&self) -> &ExclusionSet {
        &self.set
    }

    pub(crate) fn touch(&mut self, now: u64) {
        self.last_used = now;
    }

    pub(crate) fn last_used(&self) -> u64 {
        self.last_used
    }

    fn slot(&mut self, origin: &TypeRef) -> &mut Slot {
        self.slots.entry(origin.id()).or_insert_with(|| Slot {
            origin: origin.downgrade(),
            table: None,
            image: None,
        })
    }

    pub(crate) fn table(&self, id: NodeId) -> Option<&Arc<MemberTable>> {
        self.slots.get(&id).and_then(|slot| slot.table.as_ref())
    }

    pub(crate) fn insert_table(&mut self, origin: &TypeRef, table: Arc<MemberTable>) {
        self.slot(origin).table = Some(table);
    }

    pub(crate) fn image(&self, id: NodeId) -> Option<&Image> {
        self.slots.get(&id).and_then(|slot| slot.image.as_ref())
    }

    pub(crate) fn insert_image(&mut self, origin: &TypeRef, image: Image) {
        self.slot(origin).image = Some(image);
    }

    /// Drop slots whose origin no longer exists.
    pub(crate) fn prune_dead(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.origin.is_alive());
        before - self.slots.len()
    }

    /// Whether any slot's origin still exists.
    pub(crate) fn has_live_origin(&self) -> bool {
        self.slots.values().any(|slot| slot.origin.is_alive())
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionInterner;
    use disinherit_types::NodeBuilder;

    #[test]
    fn test_image_resolve() {
        let origin = NodeBuilder::named("A").build().unwrap();
        let copy = NodeBuilder::named("A").build().unwrap();

        assert_eq!(Image::Unchanged.resolve(&origin), origin);
        assert_eq!(Image::Rebuilt(copy.clone()).resolve(&origin), copy);
        assert!(Image::Unchanged.is_unchanged());
    }

    #[test]
    fn test_slots_share_origin() {
        let mut interner = ExclusionInterner::new();
        let mut cache = SetCache::new(interner.intern("m").unwrap());
        let node = NodeBuilder::named("A").with_method("m").build().unwrap();

        cache.insert_table(&node, Arc::new(node.members().without(["m"])));
        cache.insert_image(&node, Image::Unchanged);

        assert_eq!(cache.len(), 1);
        assert!(cache.table(node.id()).unwrap().is_empty());
        assert_eq!(cache.image(node.id()), Some(&Image::Unchanged));
    }

    #[test]
    fn test_unchanged_image_does_not_pin_origin() {
        let mut interner = ExclusionInterner::new();
        let mut cache = SetCache::new(interner.intern("m").unwrap());
        let node = NodeBuilder::named("A").build().unwrap();
        let weak = node.downgrade();

        cache.insert_image(&node, Image::Unchanged);
        drop(node);

        assert!(!weak.is_alive());
        assert!(!cache.has_live_origin());
        assert_eq!(cache.prune_dead(), 1);
        assert_eq!(cache.len(), 0);
    }
}
