//! # disinherit-engine
//!
//! Derives type hierarchies in which selected members are unreachable
//! through inheritance, without mutating the originals.
//!
//! This crate provides:
//! - Canonical exclusion sets usable as cache keys
//! - Memoized filtering of member tables per (node, set)
//! - A bottom-up rebuild that reuses every unaffected ancestor
//! - Conflict detection for origins rewritten under different sets
//! - Eviction of memo tables for long-running processes
//!
//! ## Architecture
//!
//! A request flows through:
//! 1. Validation of the target (opaque types cannot be rewritten)
//! 2. Canonicalization of the requested names
//! 3. Filtering of every member table in the root's linearization
//! 4. Rebuild of the ancestor graph, base-most first
//! 5. Postcondition and conflict checks on the root's image
//!
//! ## Example
//!
//! ```rust
//! use disinherit_engine::Disinheritor;
//! use disinherit_types::NodeBuilder;
//!
//! let base = NodeBuilder::named("Base").with_method("m1").with_method("m2").build().unwrap();
//! let mid = NodeBuilder::named("Mid").with_base(base.clone()).with_method("m3").build().unwrap();
//! let leaf = NodeBuilder::named("Leaf").with_base(mid.clone()).build().unwrap();
//!
//! let mut disinheritor = Disinheritor::new();
//! let derived = disinheritor.remove_members(&leaf, "m2").unwrap();
//!
//! assert_eq!(derived.mro_len(), leaf.mro_len());
//! assert!(!derived.has_member("m2"));
//! assert!(derived.has_member("m1") && derived.has_member("m3"));
//! assert!(leaf.has_member("m2"));
//! ```

mod cache;
mod config;
mod engine;
mod error;
mod eviction;
mod exclusion;
mod facade;
mod registry;
mod shared;
mod stats;

pub use cache::Image;
pub use config::{ConflictPolicy, EngineConfig, EngineConfigBuilder};
pub use engine::{verify_unreachable, RewriteEngine};
pub use error::{Conflict, DisinheritError, Result};
pub use eviction::{EvictionPolicy, EvictionResult};
pub use exclusion::{validate_name, ExclusionId, ExclusionInterner, ExclusionSet, IntoExclusion, Names};
pub use facade::{validate_target, Derivation, Disinheritor};
pub use registry::{OriginEntry, OriginRegistry};
pub use shared::{global, remove_members, SharedDisinheritor};
pub use stats::EngineStats;

/// Derive a type with the listed members removed, using the process-wide
/// engine.
///
/// ```rust
/// use disinherit_engine::remove_members;
/// use disinherit_types::NodeBuilder;
///
/// let node = NodeBuilder::named("Node").with_method("a").with_method("b").build().unwrap();
/// let derived = remove_members!(&node, "a", "b").unwrap();
/// assert!(derived.members().is_empty());
/// ```
#[macro_export]
macro_rules! remove_members {
    ($root:expr, $($name:expr),+ $(,)?) => {
        $crate::remove_members($root, [$(::std::string::String::from($name)),+])
    };
}
