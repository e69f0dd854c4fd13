//! Error types for the type model.

use thiserror::Error;

/// Errors that can occur while declaring types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Cannot create a consistent linearization for {name} (bases: {bases:?})")]
    InconsistentHierarchy { name: String, bases: Vec<String> },

    #[error("Duplicate base {base} in declaration of {name}")]
    DuplicateBase { name: String, base: String },

    #[error("Unknown base {base} for {name}")]
    UnknownBase { name: String, base: String },

    #[error("Type already declared: {0}")]
    DuplicateType(String),

    #[error("Invalid type name: {0:?}")]
    InvalidName(String),

    #[error("Catalog parse error: {0}")]
    Catalog(String),
}

impl From<serde_json::Error> for TypeError {
    fn from(err: serde_json::Error) -> Self {
        TypeError::Catalog(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TypeError>;
