//! Cache eviction for long-running engines.
//!
//! Nothing here is needed for correctness. Origins that were dropped can
//! never be requested again, so their registry entries and cache slots are
//! dead weight. A set is only evicted once none of its slots has a live
//! origin: a live origin keeps its images, so each (node, set) pair is
//! still built at most once.

use crate::cache::SetCache;
use crate::exclusion::{ExclusionId, ExclusionSet};
use crate::registry::OriginRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Policy for eviction passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionPolicy {
    /// Drop registry entries and cache slots of origins that are gone.
    #[serde(default = "default_prune_dead")]
    pub prune_dead_origins: bool,

    /// Keep memo tables for at most this many exclusion sets, evicting
    /// the least recently used ones first. Sets with a live origin are
    /// never evicted, so the bound is soft.
    #[serde(default)]
    pub max_exclusion_sets: Option<usize>,

    /// Run an eviction pass after every request.
    #[serde(default)]
    pub auto_evict: bool,
}

fn default_prune_dead() -> bool {
    true
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        EvictionPolicy {
            prune_dead_origins: true,
            max_exclusion_sets: None,
            auto_evict: false,
        }
    }
}

/// Result of an eviction pass.
#[derive(Clone, Debug, Default)]
pub struct EvictionResult {
    /// Registry entries dropped because their origin is gone.
    pub origins_pruned: usize,

    /// Cache slots dropped because their origin is gone.
    pub slots_pruned: usize,

    /// Exclusion sets whose memo tables were dropped.
    pub sets_evicted: Vec<ExclusionSet>,

    /// Registry copies dropped along with evicted sets.
    pub copies_dropped: usize,
}

impl EvictionResult {
    pub fn is_empty(&self) -> bool {
        self.origins_pruned == 0
            && self.slots_pruned == 0
            && self.sets_evicted.is_empty()
            && self.copies_dropped == 0
    }
}

pub(crate) fn evict(
    policy: &EvictionPolicy,
    registry: &mut OriginRegistry,
    caches: &mut HashMap<ExclusionId, SetCache>,
) -> EvictionResult {
    let mut result = EvictionResult::default();

    if policy.prune_dead_origins {
        result.origins_pruned = registry.prune();
        result.slots_pruned = caches.values_mut().map(SetCache::prune_dead).sum();
    }

    if let Some(max) = policy.max_exclusion_sets {
        if caches.len() > max {
            let mut idle: Vec<(u64, ExclusionId)> = caches
                .iter()
                .filter(|(_, cache)| !cache.has_live_origin())
                .map(|(id, cache)| (cache.last_used(), *id))
                .collect();
            idle.sort();

            let excess = caches.len() - max;
            for (_, id) in idle.into_iter().take(excess) {
                if let Some(cache) = caches.remove(&id) {
                    result.slots_pruned += cache.len();
                    result.copies_dropped += registry.forget(cache.set());
                    result.sets_evicted.push(cache.set().clone());
                }
            }
        }
    }

    result
}
