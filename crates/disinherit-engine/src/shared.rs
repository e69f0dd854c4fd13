//! Mutex-guarded engine for multi-threaded callers.
//!
//! The engine itself is single-writer. Every operation is short and never
//! blocks, so one lock around the whole engine is enough.

use crate::error::Result;
use crate::exclusion::IntoExclusion;
use crate::facade::{Derivation, Disinheritor};
use crate::stats::EngineStats;
use disinherit_types::TypeRef;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A cloneable handle to a shared [`Disinheritor`].
#[derive(Clone, Default)]
pub struct SharedDisinheritor {
    inner: Arc<Mutex<Disinheritor>>,
}

impl SharedDisinheritor {
    pub fn new(disinheritor: Disinheritor) -> Self {
        SharedDisinheritor {
            inner: Arc::new(Mutex::new(disinheritor)),
        }
    }

    pub fn remove_members(&self, root: &TypeRef, names: impl IntoExclusion) -> Result<TypeRef> {
        self.inner.lock().remove_members(root, names)
    }

    pub fn derive(&self, root: &TypeRef, names: impl IntoExclusion) -> Result<Derivation> {
        self.inner.lock().derive(root, names)
    }

    pub fn stats(&self) -> EngineStats {
        self.inner.lock().stats()
    }

    /// Lock the engine for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, Disinheritor> {
        self.inner.lock()
    }
}

static GLOBAL: Lazy<SharedDisinheritor> = Lazy::new(SharedDisinheritor::default);

/// The process-wide engine.
pub fn global() -> &'static SharedDisinheritor {
    &GLOBAL
}

/// Derive `root` with `names` removed, using the process-wide engine.
pub fn remove_members(root: &TypeRef, names: impl IntoExclusion) -> Result<TypeRef> {
    GLOBAL.remove_members(root, names)
}
