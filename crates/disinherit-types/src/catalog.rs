//! Named type collections loaded from JSON.
//!
//! A catalog document lists types in declaration order; each base must be
//! declared before it is referenced:
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "NDFrame", "members": { "__getattr__": { "kind": "hook" } } },
//!     { "name": "DataFrame", "bases": ["NDFrame"], "members": { "plot": {} } }
//!   ]
//! }
//! ```

use crate::builder::NodeBuilder;
use crate::error::{Result, TypeError};
use crate::member::MemberTable;
use crate::node::TypeRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single type declaration in a catalog document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,

    #[serde(default)]
    pub bases: Vec<String>,

    #[serde(default)]
    pub members: MemberTable,

    #[serde(default)]
    pub opaque: bool,
}

/// Serialized form of a catalog.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogDoc {
    pub types: Vec<TypeDecl>,
}

/// Types indexed by name, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    types: IndexMap<String, TypeRef>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            types: IndexMap::new(),
        }
    }

    /// Parse a JSON catalog document and declare all of its types.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: CatalogDoc = serde_json::from_str(json)?;
        Self::from_doc(doc)
    }

    pub fn from_doc(doc: CatalogDoc) -> Result<Self> {
        let mut catalog = Catalog::new();
        for decl in doc.types {
            catalog.declare(decl)?;
        }
        Ok(catalog)
    }

    /// Declare a type, resolving its bases by name within this catalog.
    pub fn declare(&mut self, decl: TypeDecl) -> Result<TypeRef> {
        if self.types.contains_key(&decl.name) {
            return Err(TypeError::DuplicateType(decl.name));
        }

        let bases = decl
            .bases
            .iter()
            .map(|base| {
                self.types
                    .get(base)
                    .cloned()
                    .ok_or_else(|| TypeError::UnknownBase {
                        name: decl.name.clone(),
                        base: base.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut builder = NodeBuilder::named(decl.name.clone())
            .with_bases(bases)
            .with_members(decl.members);
        if decl.opaque {
            builder = builder.opaque();
        }
        let node = builder.build()?;

        self.types.insert(decl.name, node.clone());
        Ok(node)
    }

    /// Add an already declared type under its own name.
    pub fn insert(&mut self, node: TypeRef) -> Result<()> {
        if self.types.contains_key(node.name()) {
            return Err(TypeError::DuplicateType(node.name().to_string()));
        }
        self.types.insert(node.name().to_string(), node);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }

    /// Declared types that no other catalog type inherits from.
    pub fn leaves(&self) -> Vec<TypeRef> {
        self.types
            .values()
            .filter(|node| {
                !self
                    .types
                    .values()
                    .any(|other| other.bases().contains(node))
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
