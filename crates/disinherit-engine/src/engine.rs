//! The hierarchy-rewriting engine.
//!
//! A rewrite of `root` under an exclusion set runs in three stages:
//!
//! 1. **Filter** every member table in the root's linearization, dropping
//!    excluded names. Tables are memoized per (node, set).
//! 2. **Rebuild** the ancestor graph bottom-up. A node whose own table is
//!    untouched and whose bases all map to themselves is reused as is;
//!    anything else is declared anew from its filtered table and the
//!    images of its bases, in their original order. Images are memoized
//!    per (node, set), so unrelated roots that share ancestors share the
//!    same images.
//! 3. **Extract** the root's image, verify that no excluded name is
//!    reachable from it and report a conflict when the root was already
//!    rebuilt under a different set.

use crate::cache::{Image, SetCache};
use crate::config::{ConflictPolicy, EngineConfig};
use crate::error::{Conflict, DisinheritError, Result};
use crate::eviction::{self, EvictionResult};
use crate::exclusion::{ExclusionId, ExclusionSet};
use crate::registry::OriginRegistry;
use crate::stats::EngineStats;
use disinherit_types::{C3Builder, MemberTable, TypeBuilder, TypeRef};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Memoized rewriting of type hierarchies.
///
/// Requests only reach the engine through [`crate::Disinheritor`], which
/// validates the target and canonicalizes names against its own interner,
/// so every set the engine caches under is canonical.
pub struct RewriteEngine {
    registry: OriginRegistry,
    caches: HashMap<ExclusionId, SetCache>,
    builder: Box<dyn TypeBuilder + Send>,
    config: EngineConfig,
    stats: EngineStats,
    /// Logical time, advanced once per request.
    clock: u64,
}

impl RewriteEngine {
    /// Create an engine declaring replacements with [`C3Builder`].
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        RewriteEngine {
            registry: OriginRegistry::new(),
            caches: HashMap::new(),
            builder: Box::new(C3Builder),
            config,
            stats: EngineStats::default(),
            clock: 0,
        }
    }

    /// Use `builder` to declare replacement nodes.
    pub fn with_builder(mut self, builder: impl TypeBuilder + Send + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn registry(&self) -> &OriginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OriginRegistry {
        &mut self.registry
    }

    /// Number of exclusion sets with memo tables.
    pub fn cached_sets(&self) -> usize {
        self.caches.len()
    }

    /// Run all stages for `root` under `set`.
    pub(crate) fn rewrite(&mut self, root: &TypeRef, set: &ExclusionSet) -> Result<TypeRef> {
        self.clock += 1;
        self.stats.requests += 1;
        let now = self.clock;
        self.cache_mut(set).touch(now);

        debug!(root = %root, exclusion = %set, ancestors = root.mro_len(), "rewrite requested");

        self.filter_tables(root, set);
        let outcome = self
            .rebuild(root, set)
            .and_then(|result| self.extract(root, set, result));

        if self.config.eviction.auto_evict {
            self.evict();
        }
        outcome
    }

    /// Filter the member table of every node in the root's linearization.
    /// Returns the number of tables computed by this call.
    pub(crate) fn filter_tables(&mut self, root: &TypeRef, set: &ExclusionSet) -> usize {
        let cache = self
            .caches
            .entry(set.id())
            .or_insert_with(|| SetCache::new(set.clone()));

        let mut filtered = 0;
        for node in std::iter::once(root).chain(root.ancestors()) {
            if cache.table(node.id()).is_some() {
                self.stats.table_hits += 1;
                continue;
            }
            cache.insert_table(node, Arc::new(node.members().without(set.iter())));
            filtered += 1;
        }

        self.stats.tables_filtered += filtered as u64;
        filtered
    }

    /// Rebuild the ancestor graph of `root` under `set` and return the
    /// root's image.
    pub(crate) fn rebuild(&mut self, root: &TypeRef, set: &ExclusionSet) -> Result<TypeRef> {
        let cache = self
            .caches
            .entry(set.id())
            .or_insert_with(|| SetCache::new(set.clone()));

        if let Some(image) = cache.image(root.id()) {
            self.stats.image_hits += 1;
            return Ok(image.resolve(root));
        }

        // Seeded derived-first, so popping yields base-most nodes first.
        let mut worklist = root.mro();
        while let Some(node) = worklist.pop() {
            if cache.image(node.id()).is_some() {
                self.stats.image_hits += 1;
                continue;
            }

            let mut bases = Vec::with_capacity(node.bases().len());
            let mut pending = Vec::new();
            for base in node.bases() {
                match cache.image(base.id()) {
                    Some(image) => bases.push(image.resolve(base)),
                    None => pending.push(base.clone()),
                }
            }
            if !pending.is_empty() {
                worklist.push(node);
                worklist.extend(pending);
                continue;
            }

            let declares_excluded = node.members().declares_any(set.iter());
            let bases_unchanged = bases
                .iter()
                .zip(node.bases())
                .all(|(image, base)| image == base);

            if !declares_excluded && bases_unchanged {
                trace!(node = %node, "reused");
                cache.insert_image(&node, Image::Unchanged);
                self.stats.nodes_reused += 1;
                continue;
            }

            let table = match cache.table(node.id()) {
                Some(table) => MemberTable::clone(table),
                None => {
                    let table = Arc::new(node.members().without(set.iter()));
                    cache.insert_table(&node, Arc::clone(&table));
                    self.stats.tables_filtered += 1;
                    MemberTable::clone(&table)
                }
            };

            let rebuilt = self.builder.declare(node.name(), bases, table)?;
            trace!(node = %node, declares_excluded, "rebuilt");
            cache.insert_image(&node, Image::Rebuilt(rebuilt.clone()));
            self.registry.record(&node, set, rebuilt);
            self.stats.nodes_rebuilt += 1;
        }

        match cache.image(root.id()) {
            Some(image) => Ok(image.resolve(root)),
            None => Err(DisinheritError::Unresolved(root.name().to_string())),
        }
    }

    /// Verify `result` and check the root's origin entry for conflicts.
    fn extract(&mut self, root: &TypeRef, set: &ExclusionSet, result: TypeRef) -> Result<TypeRef> {
        if self.config.verify_postcondition {
            verify_unreachable(&result, set)?;
        }

        if !self.registry.is_conflicted(root) {
            debug!(root = %root, exclusion = %set, reused = (result == *root), "rewrite complete");
            return Ok(result);
        }

        self.stats.conflicts += 1;
        let previous = self
            .registry
            .derivations(root)
            .into_iter()
            .filter(|other| other != set)
            .collect();
        let conflict = Conflict::new(root, set.clone(), previous, result);

        match self.config.conflict_policy {
            ConflictPolicy::Error => Err(conflict.into()),
            ConflictPolicy::Warn => {
                warn!(origin = %root, exclusion = %set, "{}", conflict);
                Ok(conflict.into_result())
            }
        }
    }

    /// The filtered table of `node` under `set`, if computed.
    pub fn filtered_table(&self, node: &TypeRef, set: &ExclusionSet) -> Option<Arc<MemberTable>> {
        self.caches
            .get(&set.id())
            .and_then(|cache| cache.table(node.id()))
            .cloned()
    }

    /// The image of `node` under `set`, if resolved.
    pub fn image(&self, node: &TypeRef, set: &ExclusionSet) -> Option<TypeRef> {
        self.caches
            .get(&set.id())
            .and_then(|cache| cache.image(node.id()))
            .map(|image| image.resolve(node))
    }

    /// Run an eviction pass with the configured policy.
    pub fn evict(&mut self) -> EvictionResult {
        let result = eviction::evict(&self.config.eviction, &mut self.registry, &mut self.caches);
        if !result.is_empty() {
            info!(
                origins = result.origins_pruned,
                slots = result.slots_pruned,
                sets = result.sets_evicted.len(),
                copies = result.copies_dropped,
                "evicted cache entries"
            );
        }
        result
    }

    fn cache_mut(&mut self, set: &ExclusionSet) -> &mut SetCache {
        self.caches
            .entry(set.id())
            .or_insert_with(|| SetCache::new(set.clone()))
    }
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that no name in `set` is reachable from `node`.
pub fn verify_unreachable(node: &TypeRef, set: &ExclusionSet) -> Result<()> {
    for name in set.iter() {
        if let Some((owner, _)) = node.resolve(name) {
            return Err(DisinheritError::PostconditionViolation {
                root: node.name().to_string(),
                name: name.to_string(),
                owner: owner.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionInterner;
    use disinherit_types::{Member, NodeBuilder, TypeError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chain() -> (TypeRef, TypeRef, TypeRef) {
        let base = NodeBuilder::named("Base")
            .with_method("m1")
            .with_method("m2")
            .build()
            .unwrap();
        let mid = NodeBuilder::named("Mid")
            .with_base(base.clone())
            .with_method("m3")
            .build()
            .unwrap();
        let leaf = NodeBuilder::named("Leaf").with_base(mid.clone()).build().unwrap();
        (base, mid, leaf)
    }

    #[test]
    fn test_filter_tables_memoized() {
        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new();
        let (base, _mid, leaf) = chain();
        let set = interner.intern("m2").unwrap();

        assert_eq!(engine.filter_tables(&leaf, &set), 3);
        assert_eq!(engine.filter_tables(&leaf, &set), 0);
        assert_eq!(engine.filter_tables(&base, &set), 0);

        let table = engine.filtered_table(&base, &set).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["m1"]);
        assert_eq!(engine.stats().tables_filtered, 3);
        assert_eq!(engine.stats().table_hits, 4);
    }

    #[test]
    fn test_rebuild_replaces_affected_path() {
        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new();
        let (base, mid, leaf) = chain();
        let set = interner.intern("m2").unwrap();

        let result = engine.rewrite(&leaf, &set).unwrap();

        assert_ne!(result, leaf);
        assert_ne!(engine.image(&mid, &set).unwrap(), mid);
        assert_ne!(engine.image(&base, &set).unwrap(), base);
        assert_eq!(engine.stats().nodes_rebuilt, 3);
        assert_eq!(engine.stats().nodes_reused, 0);
    }

    #[test]
    fn test_rebuild_reuses_unaffected_bases() {
        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new();
        let (base, mid, leaf) = chain();
        let set = interner.intern("m3").unwrap();

        let result = engine.rewrite(&leaf, &set).unwrap();

        assert_eq!(engine.image(&base, &set), Some(base.clone()));
        let mid_image = engine.image(&mid, &set).unwrap();
        assert_ne!(mid_image, mid);
        assert_eq!(mid_image.bases(), &[base]);
        assert_eq!(result.bases(), &[mid_image]);
        assert_eq!(engine.stats().nodes_reused, 1);
        assert_eq!(engine.stats().nodes_rebuilt, 2);
    }

    #[test]
    fn test_repeated_request_served_from_cache() {
        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new();
        let (_, _, leaf) = chain();
        let set = interner.intern("m2").unwrap();

        let first = engine.rewrite(&leaf, &set).unwrap();
        let rebuilt = engine.stats().nodes_rebuilt;
        let second = engine.rewrite(&leaf, &set).unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.stats().nodes_rebuilt, rebuilt);
        assert_eq!(engine.stats().image_hits, 1);
    }

    #[test]
    fn test_builder_called_once_per_replacement() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let counting = |name: &str, bases: Vec<TypeRef>, members: MemberTable| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            C3Builder.declare(name, bases, members)
        };

        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new().with_builder(counting);
        let (_, mid, leaf) = chain();
        let set = interner.intern("m2").unwrap();

        engine.rewrite(&leaf, &set).unwrap();
        engine.rewrite(&mid, &set).unwrap();
        engine.rewrite(&leaf, &set).unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_builder_failure_propagates() {
        let failing = |name: &str, _: Vec<TypeRef>, _: MemberTable| -> disinherit_types::Result<TypeRef> {
            Err(TypeError::InvalidName(name.to_string()))
        };

        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new().with_builder(failing);
        let (_, _, leaf) = chain();
        let set = interner.intern("m2").unwrap();

        let err = engine.rewrite(&leaf, &set).unwrap_err();
        assert!(matches!(err, DisinheritError::Build(TypeError::InvalidName(_))));
        assert!(engine.image(&leaf, &set).is_none());
    }

    #[test]
    fn test_postcondition_detects_leak() {
        // A builder that ignores the filtered table leaks the excluded name.
        let leaky = |name: &str, bases: Vec<TypeRef>, _: MemberTable| {
            NodeBuilder::named(name)
                .with_bases(bases)
                .with_member("m2", Member::method())
                .build()
        };

        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::new().with_builder(leaky);
        let (_, _, leaf) = chain();
        let set = interner.intern("m2").unwrap();

        let err = engine.rewrite(&leaf, &set).unwrap_err();
        assert!(matches!(
            err,
            DisinheritError::PostconditionViolation { ref name, .. } if name == "m2"
        ));
    }

    #[test]
    fn test_conflict_warn_policy_returns_result() {
        let config = EngineConfig {
            conflict_policy: ConflictPolicy::Warn,
            ..Default::default()
        };
        let mut interner = ExclusionInterner::new();
        let mut engine = RewriteEngine::with_config(config);
        let (_, _, leaf) = chain();
        let a = interner.intern("m1").unwrap();
        let b = interner.intern("m2").unwrap();

        engine.rewrite(&leaf, &a).unwrap();
        let second = engine.rewrite(&leaf, &b).unwrap();

        assert!(!second.has_member("m2"));
        assert!(second.has_member("m1"));
        assert_eq!(engine.stats().conflicts, 1);
    }

    #[test]
    fn test_verify_unreachable() {
        let mut interner = ExclusionInterner::new();
        let (_, _, leaf) = chain();

        let err = verify_unreachable(&leaf, &interner.intern("m2").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            DisinheritError::PostconditionViolation { ref owner, .. } if owner == "Base"
        ));
        assert!(verify_unreachable(&leaf, &interner.intern("zzz").unwrap()).is_ok());
    }
}
