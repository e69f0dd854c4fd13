//! C3 linearization.
//!
//! The linearization of a type is the type itself followed by the merge of
//! its bases' linearizations and the base list. The merge repeatedly takes
//! the first head that does not appear in the tail of any remaining
//! sequence. It is monotonic: every type's linearization is a subsequence
//! of each subtype's, so rebuilding a graph with the same shape and base
//! order reproduces the same ordering.

use crate::error::{Result, TypeError};
use crate::node::TypeRef;
use std::collections::{HashSet, VecDeque};

/// Compute the ancestors of a type named `name` with direct `bases`, in
/// linearization order and without the type itself.
pub fn c3(name: &str, bases: &[TypeRef]) -> Result<Vec<TypeRef>> {
    let mut seen = HashSet::new();
    for base in bases {
        if !seen.insert(base.id()) {
            return Err(TypeError::DuplicateBase {
                name: name.to_string(),
                base: base.name().to_string(),
            });
        }
    }

    let mut seqs: Vec<VecDeque<TypeRef>> = bases
        .iter()
        .map(|base| base.mro().into_iter().collect())
        .collect();
    seqs.push(bases.iter().cloned().collect());

    let mut result = Vec::new();
    loop {
        seqs.retain(|seq| !seq.is_empty());
        if seqs.is_empty() {
            return Ok(result);
        }

        let candidate = seqs
            .iter()
            .filter_map(|seq| seq.front())
            .find(|head| !seqs.iter().any(|seq| seq.iter().skip(1).any(|t| t == *head)))
            .cloned();

        let Some(next) = candidate else {
            return Err(TypeError::InconsistentHierarchy {
                name: name.to_string(),
                bases: bases.iter().map(|b| b.name().to_string()).collect(),
            });
        };

        for seq in seqs.iter_mut() {
            if seq.front() == Some(&next) {
                seq.pop_front();
            }
        }
        result.push(next);
    }
}
