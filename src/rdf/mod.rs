//! RDF support for the resolution engine
//!
//! This module implements the quad side of the engine:
//! - RDF terms and quads (thin wrappers over `oxrdf`)
//! - The per-query, insertion-ordered quad store
//! - The few vocabulary IRIs the engine relies on
//!
//! # Example
//!
//! ```rust
//! use ontoql::rdf::{QuadStore, Quad, NamedNode, Literal, RdfPredicate};
//!
//! let mut store = QuadStore::new();
//!
//! let subject = NamedNode::new("http://example.org/alice").unwrap();
//! let predicate = RdfPredicate::new("http://xmlns.com/foaf/0.1/name").unwrap();
//! let object = Literal::new_simple_literal("Alice");
//!
//! store.insert(Quad::in_default_graph(subject.into(), predicate, object.into()));
//!
//! let names = store.object_values("http://example.org/alice", "http://xmlns.com/foaf/0.1/name");
//! assert_eq!(names, vec!["Alice"]);
//! ```

mod types;
mod store;
pub mod namespace;

pub use types::{
    RdfSubject, RdfPredicate, RdfObject,
    NamedNode, BlankNode, Literal, Quad,
    RdfError, RdfResult,
};

pub use store::{QuadStore, ReverseEdge};
