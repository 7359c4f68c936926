//! Compiled schema inputs
//!
//! The ontology compiler produces two immutable artifacts per served schema:
//! the [`SchemaMapping`] between names and ontology URIs, and the
//! [`ResolutionTree`] describing each type's fields. Both load from the
//! compiler's JSON output.

mod mapping;
mod tree;

pub use mapping::{FieldIri, SchemaMapping, REVERSE_KEYWORD};
pub use tree::{FieldSpec, ResolutionTree, TypeKind, TypeNode};

use thiserror::Error;

/// Schema loading errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Malformed JSON
    #[error("Schema JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid input
    #[error("Invalid schema: {0}")]
    Invalid(String),

    /// Field referencing an undeclared type
    #[error("{owner} references unknown type {type_name}")]
    UnknownType { owner: String, type_name: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
