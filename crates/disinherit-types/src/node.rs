//! Type node definition and handles.
//!
//! Each node in a type hierarchy carries:
//! - A process-unique identity (`NodeId`)
//! - A declared name (not unique, rebuilt nodes reuse it)
//! - Ordered direct bases (order drives linearization)
//! - The locally declared member table
//! - Its C3 linearization, computed once when the node is declared
//!
//! Nodes are immutable. They are shared through [`TypeRef`], whose equality
//! is identity, never structure: two nodes with the same name, bases and
//! members are still different types.

use crate::error::{Result, TypeError};
use crate::linearize;
use crate::member::{Member, MemberTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a type node. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A type in the hierarchy.
pub struct TypeNode {
    id: NodeId,
    name: String,
    bases: Vec<TypeRef>,
    members: MemberTable,
    /// Linearization without the node itself, nearest first.
    ancestors: Vec<TypeRef>,
    opaque: bool,
}

impl TypeNode {
    /// Declare a new type from parts. Fails when the bases admit no
    /// consistent linearization.
    pub(crate) fn declare(
        name: String,
        bases: Vec<TypeRef>,
        members: MemberTable,
        opaque: bool,
    ) -> Result<TypeRef> {
        if name.is_empty() {
            return Err(TypeError::InvalidName(name));
        }
        let ancestors = linearize::c3(&name, &bases)?;
        Ok(TypeRef(Arc::new(TypeNode {
            id: NodeId::next(),
            name,
            bases,
            members,
            ancestors,
            opaque,
        })))
    }
}

/// Shared handle to a type node. Equality and hashing are by identity.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeNode>);

impl TypeRef {
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Direct bases in declaration order.
    pub fn bases(&self) -> &[TypeRef] {
        &self.0.bases
    }

    /// Locally declared members.
    pub fn members(&self) -> &MemberTable {
        &self.0.members
    }

    /// Whether the host can enumerate this node's members. Opaque nodes
    /// stand for native types the host cannot introspect.
    pub fn is_opaque(&self) -> bool {
        self.0.opaque
    }

    /// Ancestors in linearization order, excluding this node.
    pub fn ancestors(&self) -> &[TypeRef] {
        &self.0.ancestors
    }

    /// Full linearization: this node followed by its ancestors.
    pub fn mro(&self) -> Vec<TypeRef> {
        let mut mro = Vec::with_capacity(self.0.ancestors.len() + 1);
        mro.push(self.clone());
        mro.extend(self.0.ancestors.iter().cloned());
        mro
    }

    /// Length of the linearization, this node included.
    pub fn mro_len(&self) -> usize {
        self.0.ancestors.len() + 1
    }

    /// Check if `name` is declared locally.
    pub fn declares(&self, name: &str) -> bool {
        self.0.members.contains(name)
    }

    /// Resolve `name` through the linearization, returning the first
    /// declaring node and its definition.
    pub fn resolve(&self, name: &str) -> Option<(&TypeRef, &Member)> {
        std::iter::once(self)
            .chain(self.0.ancestors.iter())
            .find_map(|node| node.0.members.get(name).map(|member| (node, member)))
    }

    /// Check if `name` is reachable, locally or through inheritance.
    pub fn has_member(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Check if `other` appears in this node's linearization.
    pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
        self == other || self.0.ancestors.contains(other)
    }

    pub fn downgrade(&self) -> WeakTypeRef {
        WeakTypeRef {
            id: self.0.id,
            node: Arc::downgrade(&self.0),
        }
    }

    pub fn ptr_eq(a: &TypeRef, b: &TypeRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        TypeRef::ptr_eq(self, other)
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({}{})", self.0.name, self.0.id)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Non-owning handle to a type node.
#[derive(Clone)]
pub struct WeakTypeRef {
    id: NodeId,
    node: Weak<TypeNode>,
}

impl WeakTypeRef {
    /// Identity of the referenced node, available even after it is gone.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn upgrade(&self) -> Option<TypeRef> {
        self.node.upgrade().map(TypeRef)
    }

    pub fn is_alive(&self) -> bool {
        self.node.strong_count() > 0
    }
}

impl fmt::Debug for WeakTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => write!(f, "WeakTypeRef({}{})", node.name(), self.id),
            None => write!(f, "WeakTypeRef(<dropped>{})", self.id),
        }
    }
}
