//! Canonical exclusion sets.
//!
//! An exclusion set names the members to remove. Sets are interned: equal
//! name collections always yield the same `ExclusionSet`, so equality and
//! identity coincide and a set can key every cache in the engine.

use crate::error::{DisinheritError, Result};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_EXCLUSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a canonical exclusion set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExclusionId(u64);

impl ExclusionId {
    fn next() -> Self {
        ExclusionId(NEXT_EXCLUSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

struct ExclusionInner {
    id: ExclusionId,
    names: BTreeSet<String>,
}

/// An immutable, canonical set of member names.
#[derive(Clone)]
pub struct ExclusionSet(Arc<ExclusionInner>);

impl ExclusionSet {
    fn new(names: BTreeSet<String>) -> Self {
        ExclusionSet(Arc::new(ExclusionInner {
            id: ExclusionId::next(),
            names,
        }))
    }

    pub fn id(&self) -> ExclusionId {
        self.0.id
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.names.is_empty()
    }

    pub fn ptr_eq(a: &ExclusionSet, b: &ExclusionSet) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for ExclusionSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ExclusionSet {}

impl Hash for ExclusionSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().collect::<Vec<_>>().join(", "))
    }
}

impl fmt::Debug for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExclusionSet{}", self)
    }
}

/// Input accepted wherever member names are requested.
pub enum Names {
    /// Already canonical.
    Canonical(ExclusionSet),
    Raw(Vec<String>),
}

/// Conversion into a request for an exclusion set: a single name, a
/// collection of names, or an existing set.
pub trait IntoExclusion {
    fn into_names(self) -> Names;
}

impl IntoExclusion for ExclusionSet {
    fn into_names(self) -> Names {
        Names::Canonical(self)
    }
}

impl IntoExclusion for &ExclusionSet {
    fn into_names(self) -> Names {
        Names::Canonical(self.clone())
    }
}

impl IntoExclusion for &str {
    fn into_names(self) -> Names {
        Names::Raw(vec![self.to_string()])
    }
}

impl IntoExclusion for String {
    fn into_names(self) -> Names {
        Names::Raw(vec![self])
    }
}

impl<S: AsRef<str>> IntoExclusion for Vec<S> {
    fn into_names(self) -> Names {
        Names::Raw(self.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>> IntoExclusion for &[S] {
    fn into_names(self) -> Names {
        Names::Raw(self.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>, const N: usize> IntoExclusion for [S; N] {
    fn into_names(self) -> Names {
        Names::Raw(self.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>> IntoExclusion for BTreeSet<S> {
    fn into_names(self) -> Names {
        Names::Raw(self.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

/// Check that `name` can name a member.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(DisinheritError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Registry of canonical exclusion sets.
#[derive(Default)]
pub struct ExclusionInterner {
    sets: HashMap<BTreeSet<String>, ExclusionSet>,
}

impl ExclusionInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical set for `names`, registering it on first use.
    pub fn intern(&mut self, names: impl IntoExclusion) -> Result<ExclusionSet> {
        let names: BTreeSet<String> = match names.into_names() {
            Names::Canonical(set) => {
                if self.is_canonical(&set) {
                    return Ok(set);
                }
                set.iter().map(str::to_string).collect()
            }
            Names::Raw(raw) => {
                for name in &raw {
                    validate_name(name)?;
                }
                raw.into_iter().collect()
            }
        };

        if let Some(set) = self.sets.get(&names) {
            return Ok(set.clone());
        }
        let set = ExclusionSet::new(names.clone());
        self.sets.insert(names, set.clone());
        Ok(set)
    }

    /// Check whether `set` is the canonical instance registered here.
    pub fn is_canonical(&self, set: &ExclusionSet) -> bool {
        self.sets
            .get(&set.0.names)
            .is_some_and(|own| ExclusionSet::ptr_eq(own, set))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_values_share_identity() {
        let mut interner = ExclusionInterner::new();

        let a = interner.intern("__getattr__").unwrap();
        let b = interner.intern(vec!["__getattr__"]).unwrap();
        let c = interner.intern(["__getattr__".to_string()]).unwrap();

        assert!(ExclusionSet::ptr_eq(&a, &b));
        assert!(ExclusionSet::ptr_eq(&a, &c));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_order_and_duplicates_ignored() {
        let mut interner = ExclusionInterner::new();

        let a = interner.intern(["b", "a", "b"]).unwrap();
        let b = interner.intern(["a", "b"]).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_different_values_differ() {
        let mut interner = ExclusionInterner::new();

        let a = interner.intern("m1").unwrap();
        let b = interner.intern(["m1", "m2"]).unwrap();

        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_canonical_input_returned_as_is() {
        let mut interner = ExclusionInterner::new();

        let a = interner.intern("m").unwrap();
        let again = interner.intern(&a).unwrap();

        assert!(ExclusionSet::ptr_eq(&a, &again));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_foreign_set_is_recanonicalized() {
        let mut ours = ExclusionInterner::new();
        let mut theirs = ExclusionInterner::new();

        let foreign = theirs.intern(["x", "y"]).unwrap();
        let local = ours.intern(&foreign).unwrap();

        assert!(!ExclusionSet::ptr_eq(&foreign, &local));
        assert!(ours.is_canonical(&local));
        assert_eq!(ours.intern(["y", "x"]).unwrap(), local);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut interner = ExclusionInterner::new();

        assert!(matches!(interner.intern(""), Err(DisinheritError::InvalidName(_))));
        assert!(matches!(
            interner.intern(["ok", "not ok"]),
            Err(DisinheritError::InvalidName(name)) if name == "not ok"
        ));
        assert!(interner.is_empty());
    }

    #[test]
    fn test_empty_collection_is_a_set() {
        let mut interner = ExclusionInterner::new();
        let empty: Vec<String> = Vec::new();

        let set = interner.intern(empty).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "{}");
    }

    #[test]
    fn test_display() {
        let mut interner = ExclusionInterner::new();
        let set = interner.intern(["__getattr__", "__dir__"]).unwrap();
        assert_eq!(set.to_string(), "{__dir__, __getattr__}");
    }
}
