//! Resolution engine
//!
//! This module turns a selection tree into a populated per-query quad store
//! and reads field values back out of it:
//! - Level-batched prefetch driven by the selection tree ([`ResolutionEngine`])
//! - Compiled field accessors evaluated against the store ([`Accessor`])
//! - The top-level entry point with per-query metrics and warnings ([`QueryField`])
//!
//! # Example
//!
//! ```rust,no_run
//! use ontoql::engine::{QueryArgs, QueryField, ResolutionEngine, Schema};
//! use ontoql::config::EngineConfig;
//! use ontoql::query::parse_operation;
//! use std::sync::Arc;
//!
//! # async fn run(mapping: &str, tree: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Schema::from_json(mapping, tree, "http://schema.org/")?);
//! let engine = Arc::new(ResolutionEngine::from_config(schema, EngineConfig::default())?);
//!
//! let operation = parse_operation("{ Organization { _id employee { name } } }")?;
//! let field = QueryField::for_type(&engine, "Organization").ok_or("unknown type")?;
//! let resolved = field.execute(&operation, &QueryArgs::default()).await?;
//! println!("{} organizations", resolved.ids().len());
//! # Ok(())
//! # }
//! ```

mod accessor;
mod classify;
mod context;
mod entry;
mod filter;
mod resolver;
mod schema;

pub use accessor::{
    synthesize, Accessor, AccessorTable, FieldValue, ParentValue, ID_FIELD, TYPE_FIELD,
};
pub use classify::{classify, is_dereferenceable, ValueClass};
pub use context::{
    FetchFailure, FetchOperation, PageCache, QueryContext, QueryMetrics, ResolutionStatus, Warning,
    Warnings,
};
pub use entry::{QueryArgs, QueryField};
pub use filter::{apply_filter, ID_FILTER_KEY};
pub use resolver::{ResolutionEngine, ResolveError, ResolveRequest, ResolveResult, ResolvedQuery};
pub use schema::Schema;
