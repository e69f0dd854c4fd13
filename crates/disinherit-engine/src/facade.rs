//! Request entry point: validation, canonicalization and dispatch.

use crate::config::EngineConfig;
use crate::engine::RewriteEngine;
use crate::error::{DisinheritError, Result};
use crate::eviction::EvictionResult;
use crate::exclusion::{ExclusionInterner, ExclusionSet, IntoExclusion};
use crate::stats::EngineStats;
use disinherit_types::TypeRef;

/// Result of a derivation request.
#[derive(Clone, Debug)]
pub struct Derivation {
    /// The transformed root.
    pub root: TypeRef,

    /// The canonical set the request resolved to.
    pub exclusion: ExclusionSet,

    /// Work done by this request alone.
    pub stats: EngineStats,
}

impl Derivation {
    /// Whether the original was returned unchanged.
    pub fn is_identity(&self, origin: &TypeRef) -> bool {
        self.root == *origin
    }
}

/// Removes members from type hierarchies by deriving new ones.
///
/// ```rust
/// use disinherit_engine::Disinheritor;
/// use disinherit_types::{Member, NodeBuilder};
///
/// let frame = NodeBuilder::named("Frame")
///     .with_member("__getattr__", Member::hook())
///     .with_method("plot")
///     .build()
///     .unwrap();
///
/// let mut disinheritor = Disinheritor::new();
/// let quiet = disinheritor.remove_members(&frame, "__getattr__").unwrap();
///
/// assert!(!quiet.has_member("__getattr__"));
/// assert!(quiet.has_member("plot"));
/// assert!(frame.has_member("__getattr__"));
/// ```
#[derive(Default)]
pub struct Disinheritor {
    interner: ExclusionInterner,
    engine: RewriteEngine,
}

impl Disinheritor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_engine(RewriteEngine::with_config(config))
    }

    pub fn with_engine(engine: RewriteEngine) -> Self {
        Disinheritor {
            interner: ExclusionInterner::new(),
            engine,
        }
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RewriteEngine {
        &mut self.engine
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    /// Canonical exclusion set for `names`.
    pub fn exclusion(&mut self, names: impl IntoExclusion) -> Result<ExclusionSet> {
        self.interner.intern(names)
    }

    /// Derive `root` with `names` unreachable through inheritance.
    ///
    /// Returns `root` itself when nothing in its linearization declares any
    /// of the names. Fails with `Conflict` when `root` was already rebuilt
    /// under a different set; the conflict carries the valid result.
    pub fn remove_members(&mut self, root: &TypeRef, names: impl IntoExclusion) -> Result<TypeRef> {
        self.derive(root, names).map(|derivation| derivation.root)
    }

    /// Like [`Disinheritor::remove_members`], reporting the work done.
    pub fn derive(&mut self, root: &TypeRef, names: impl IntoExclusion) -> Result<Derivation> {
        validate_target(root)?;
        let exclusion = self.interner.intern(names)?;
        self.engine.registry_mut().entry(root);

        let before = self.engine.stats();
        let transformed = self.engine.rewrite(root, &exclusion)?;

        Ok(Derivation {
            root: transformed,
            exclusion,
            stats: self.engine.stats() - before,
        })
    }

    /// Run an eviction pass with the configured policy.
    pub fn evict(&mut self) -> EvictionResult {
        self.engine.evict()
    }
}

/// Check that `root` and its ancestors can be introspected.
pub fn validate_target(root: &TypeRef) -> Result<()> {
    if root.is_opaque() {
        return Err(DisinheritError::InvalidTarget {
            name: root.name().to_string(),
            reason: "members cannot be enumerated".to_string(),
        });
    }
    if let Some(ancestor) = root.ancestors().iter().find(|a| a.is_opaque()) {
        return Err(DisinheritError::InvalidTarget {
            name: root.name().to_string(),
            reason: format!("ancestor {} cannot be introspected", ancestor.name()),
        });
    }
    Ok(())
}
