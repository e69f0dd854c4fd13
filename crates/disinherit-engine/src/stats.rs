//! Engine counters.

use serde::Serialize;
use std::ops::Sub;

/// Statistics about rewrite operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Requests that reached the engine.
    pub requests: u64,

    /// Member tables filtered (cache misses in step one).
    pub tables_filtered: u64,

    /// Member tables served from cache.
    pub table_hits: u64,

    /// Replacement nodes constructed.
    pub nodes_rebuilt: u64,

    /// Original nodes mapped to themselves.
    pub nodes_reused: u64,

    /// Images served from cache during the rebuild.
    pub image_hits: u64,

    /// Requests that detected a conflict.
    pub conflicts: u64,
}

impl Sub for EngineStats {
    type Output = EngineStats;

    fn sub(self, rhs: Self) -> Self::Output {
        EngineStats {
            requests: self.requests - rhs.requests,
            tables_filtered: self.tables_filtered - rhs.tables_filtered,
            table_hits: self.table_hits - rhs.table_hits,
            nodes_rebuilt: self.nodes_rebuilt - rhs.nodes_rebuilt,
            nodes_reused: self.nodes_reused - rhs.nodes_reused,
            image_hits: self.image_hits - rhs.image_hits,
            conflicts: self.conflicts - rhs.conflicts,
        }
    }
}
