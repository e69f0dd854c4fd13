//! # disinherit-types
//!
//! Type hierarchy model used by the disinherit engine.
//!
//! This crate provides:
//! - Immutable type nodes with identity semantics (`TypeRef`)
//! - Ordered member tables with pure filtering
//! - C3 linearization computed at declaration time
//! - The `TypeBuilder` capability for declaring types from parts
//! - JSON catalogs of named types
//!
//! ## Example
//!
//! ```rust
//! use disinherit_types::{Member, NodeBuilder};
//!
//! let base = NodeBuilder::named("Base")
//!     .with_method("m1")
//!     .with_member("__getattr__", Member::hook())
//!     .build()
//!     .unwrap();
//!
//! let leaf = NodeBuilder::named("Leaf")
//!     .with_base(base.clone())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(leaf.mro(), vec![leaf.clone(), base]);
//! assert!(leaf.has_member("__getattr__"));
//! ```

mod builder;
mod catalog;
mod error;
pub mod linearize;
mod member;
mod node;

pub use builder::{C3Builder, NodeBuilder, TypeBuilder};
pub use catalog::{Catalog, CatalogDoc, TypeDecl};
pub use error::{Result, TypeError};
pub use member::{Member, MemberKind, MemberTable};
pub use node::{NodeId, TypeNode, TypeRef, WeakTypeRef};
