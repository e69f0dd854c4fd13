//! Type declaration: the host capability and a fluent builder.

use crate::error::Result;
use crate::member::{Member, MemberTable};
use crate::node::{TypeNode, TypeRef};

/// Capability to declare a type from parts: a name, an ordered base list
/// and a member table.
///
/// The rewrite engine builds every replacement node through this trait
/// and never constructs nodes on its own.
pub trait TypeBuilder {
    fn declare(&self, name: &str, bases: Vec<TypeRef>, members: MemberTable) -> Result<TypeRef>;
}

/// Default host: declares plain nodes linearized with C3.
#[derive(Clone, Copy, Debug, Default)]
pub struct C3Builder;

impl TypeBuilder for C3Builder {
    fn declare(&self, name: &str, bases: Vec<TypeRef>, members: MemberTable) -> Result<TypeRef> {
        TypeNode::declare(name.to_string(), bases, members, false)
    }
}

impl<F> TypeBuilder for F
where
    F: Fn(&str, Vec<TypeRef>, MemberTable) -> Result<TypeRef>,
{
    fn declare(&self, name: &str, bases: Vec<TypeRef>, members: MemberTable) -> Result<TypeRef> {
        self(name, bases, members)
    }
}

/// Builder for declaring type nodes.
#[derive(Clone, Debug, Default)]
pub struct NodeBuilder {
    name: String,
    bases: Vec<TypeRef>,
    members: MemberTable,
    opaque: bool,
}

impl NodeBuilder {
    /// Create a new node builder.
    pub fn new() -> Self {
        NodeBuilder {
            name: String::new(),
            bases: Vec::new(),
            members: MemberTable::new(),
            opaque: false,
        }
    }

    /// Create a builder for a type with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        NodeBuilder::new().with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the direct bases, replacing any added so far.
    pub fn with_bases(mut self, bases: Vec<TypeRef>) -> Self {
        self.bases = bases;
        self
    }

    /// Append a single direct base.
    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.bases.push(base);
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.members.insert(name, member);
        self
    }

    /// Shorthand for declaring a method.
    pub fn with_method(self, name: impl Into<String>) -> Self {
        self.with_member(name, Member::method())
    }

    pub fn with_members(mut self, members: MemberTable) -> Self {
        self.members = members;
        self
    }

    /// Mark the node as opaque: its members cannot be enumerated.
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    /// Declare the node, computing its linearization.
    pub fn build(self) -> Result<TypeRef> {
        TypeNode::declare(self.name, self.bases, self.members, self.opaque)
    }
}
