//! Error types for the rewrite engine.

use crate::exclusion::ExclusionSet;
use disinherit_types::{NodeId, TypeError, TypeRef};
use thiserror::Error;

/// Errors that can occur while deriving a hierarchy.
#[derive(Error, Debug)]
pub enum DisinheritError {
    /// The target cannot be introspected for ancestors or members.
    #[error("Invalid target {name}: {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("Invalid member name: {0:?}")]
    InvalidName(String),

    /// The origin already served as the basis of a derivation under a
    /// different exclusion set. The result is still valid.
    #[error(transparent)]
    Conflict(Box<Conflict>),

    /// An excluded name is still reachable from the result. Engine defect.
    #[error("Postcondition violated: {name:?} still reachable from {root} (declared on {owner})")]
    PostconditionViolation {
        root: String,
        name: String,
        owner: String,
    },

    /// A node in the root's linearization was left without an image.
    /// Engine defect.
    #[error("Rebuild left {0} unresolved")]
    Unresolved(String),

    #[error("Type declaration failed: {0}")]
    Build(#[from] TypeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DisinheritError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DisinheritError::Conflict(_))
    }

    /// Recover the derived root from a conflict.
    pub fn into_conflict(self) -> Option<Conflict> {
        match self {
            DisinheritError::Conflict(conflict) => Some(*conflict),
            _ => None,
        }
    }
}

impl From<Conflict> for DisinheritError {
    fn from(conflict: Conflict) -> Self {
        DisinheritError::Conflict(Box::new(conflict))
    }
}

/// An origin node rewritten under more than one exclusion set.
///
/// Hierarchies derived under different sets are not mutually
/// substitutable: a type inheriting from both may see an inconsistent
/// ancestor set.
#[derive(Error, Debug, Clone)]
#[error(
    "{origin_name} has already been rewritten for removal with {}; inheriting from rewrites under different removals may lead to inconsistent ancestors",
    format_sets(.previous)
)]
pub struct Conflict {
    pub origin_name: String,
    pub origin_id: NodeId,

    /// The exclusion set of the request that detected the conflict.
    pub requested: ExclusionSet,

    /// Other sets already recorded for the origin.
    pub previous: Vec<ExclusionSet>,

    result: TypeRef,
}

impl Conflict {
    pub(crate) fn new(
        origin: &TypeRef,
        requested: ExclusionSet,
        previous: Vec<ExclusionSet>,
        result: TypeRef,
    ) -> Self {
        Conflict {
            origin_name: origin.name().to_string(),
            origin_id: origin.id(),
            requested,
            previous,
            result,
        }
    }

    /// The fully built derivation for the requested set.
    pub fn result(&self) -> &TypeRef {
        &self.result
    }

    pub fn into_result(self) -> TypeRef {
        self.result
    }
}

fn format_sets(sets: &[ExclusionSet]) -> String {
    sets.iter()
        .map(|set| set.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, DisinheritError>;
