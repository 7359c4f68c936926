//! Ontoql
//!
//! Exposes an ontology-described graph of entities through nested
//! field-selection queries while the data itself lives as RDF quads in a
//! pluggable backend.
//!
//! # Architecture
//!
//! - `rdf`: RDF terms and the per-query, insertion-ordered quad store
//! - `schema`: name ↔ URI mapping and the per-type resolution tree
//! - `query`: selection-tree AST and its Pest parser
//! - `source`: data source adapters and the source-tag registry
//! - `engine`: level-batched prefetch, compiled field accessors, entry point
//! - `response`: accessor-driven response assembly with warnings
//! - `config`: engine configuration (YAML/JSON)
//!
//! A query resolves in two phases. The resolution engine walks the selection
//! tree one level at a time and, for every field, fetches the references of
//! all parents at that level in one batched round trip. The compiled
//! accessors then read field values out of the populated store without
//! touching the backend again.
//!
//! ## Example Usage
//!
//! ```rust
//! use ontoql::{
//!     EngineConfig, FieldSpec, MemorySource, QueryField, ResolutionEngine, ResponseBuilder,
//!     ResolutionTree, Schema, SchemaMapping, SourceRegistry, TypeNode, parse_operation,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let mapping = SchemaMapping::from_context([
//!     ("Organization", "http://example.com/Organization"),
//!     ("Person", "http://example.com/Person"),
//!     ("name", "http://example.com/name"),
//!     ("employee", "http://example.com/employee"),
//! ]);
//! let tree = ResolutionTree::new()
//!     .with_type("String", TypeNode::data_type())
//!     .with_type("Person", TypeNode::object().with_field("name", FieldSpec::single("String")))
//!     .with_type(
//!         "Organization",
//!         TypeNode::object().with_field("employee", FieldSpec::list("Person")),
//!     );
//! let schema = Arc::new(Schema::compile(mapping, tree, "http://schema.org/").unwrap());
//!
//! let memory = MemorySource::new(schema.mapping_handle(), "http://schema.org/");
//! memory.push_document(json!({
//!     "_id": "http://example.com/acme",
//!     "_type": ["Organization"],
//!     "employee": [{"_id": "http://example.com/alice"}]
//! })).unwrap();
//! memory.push_document(json!({
//!     "_id": "http://example.com/alice",
//!     "_type": ["Person"],
//!     "name": "Alice"
//! })).unwrap();
//!
//! let sources = SourceRegistry::new("memory", Arc::new(memory));
//! let engine = Arc::new(ResolutionEngine::new(schema.clone(), sources, EngineConfig::default()));
//!
//! let operation = parse_operation("{ Organization { employee { name } } }").unwrap();
//! let field = QueryField::for_type(&engine, "Organization").unwrap();
//! let mut resolved = field.execute_operation(&operation).await.unwrap();
//!
//! let response = ResponseBuilder::new(&schema).build(&mut resolved, &operation);
//! assert_eq!(
//!     response.data,
//!     json!({"Organization": [{"employee": [{"name": "Alice"}]}]})
//! );
//! # });
//! # fn tokio_test_block<F: std::future::Future<Output = ()>>(f: F) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod query;
pub mod rdf;
pub mod response;
pub mod schema;
pub mod source;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, DataSourcesConfig, EngineConfig, SourceConfig};

pub use engine::{
    Accessor, FieldValue, ParentValue, QueryArgs, QueryContext, QueryField, QueryMetrics,
    ResolutionEngine, ResolutionStatus, ResolveError, ResolveRequest, ResolveResult,
    ResolvedQuery, Schema, Warning,
};

pub use query::{parse_operation, Field, ParseError, ParseResult, Selection, SelectionSet};

pub use rdf::{Literal, NamedNode, Quad, QuadStore, RdfError, RdfObject, RdfResult, RdfSubject};

pub use response::{Response, ResponseBuilder};

pub use schema::{
    FieldSpec, ResolutionTree, SchemaError, SchemaMapping, SchemaResult, TypeKind, TypeNode,
};

pub use source::{
    DataSource, FetchBatch, MemorySource, SourceError, SourceRegistry, SourceResult, TypeQuery,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
