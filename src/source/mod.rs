//! Data source adapters
//!
//! A data source serves raw records and hands them to the engine as quads.
//! The engine only ever talks to it through two batched calls:
//! - `fetch_by_type`: one page of subjects of a type (the root level)
//! - `fetch_by_ids`: every record for a set of identifiers (one per level and field)
//!
//! Sources are selected per query subtree by a source tag through the
//! [`SourceRegistry`].

mod memory;

pub use memory::MemorySource;

use crate::config::{EngineConfig, SourceConfig};
use crate::rdf::{Quad, RdfError};
use crate::schema::SchemaMapping;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Data source errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored record could not be converted to quads
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("RDF error: {0}")]
    Rdf(#[from] RdfError),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Parameters of a type-scoped fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeQuery {
    /// Ontology URI of the requested type
    pub type_uri: String,
    /// 1-based page number; `None` = unbounded
    pub page: Option<u32>,
    pub page_size: usize,
    /// Match inferred types instead of asserted ones
    pub inferred: bool,
}

/// Quads returned by one backend round trip, plus the identifiers of the
/// records they were converted from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchBatch {
    pub quads: Vec<Quad>,
    pub ids: Vec<String>,
}

impl FetchBatch {
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty() && self.ids.is_empty()
    }
}

/// Backend adapter contract. Repeated identical calls within one query must
/// be safe; the engine does not deduplicate across calls.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Records of a type, one page at a time
    async fn fetch_by_type(&self, query: &TypeQuery) -> SourceResult<FetchBatch>;

    /// Records for a set of identifiers, in one round trip
    async fn fetch_by_ids(&self, ids: &[String]) -> SourceResult<FetchBatch>;
}

/// Source tag → adapter
#[derive(Clone)]
pub struct SourceRegistry {
    default_tag: String,
    sources: IndexMap<String, Arc<dyn DataSource>>,
}

impl SourceRegistry {
    /// Registry with a single default source
    pub fn new(default_tag: impl Into<String>, source: Arc<dyn DataSource>) -> Self {
        let default_tag = default_tag.into();
        let mut sources: IndexMap<String, Arc<dyn DataSource>> = IndexMap::new();
        sources.insert(default_tag.clone(), source);
        Self {
            default_tag,
            sources,
        }
    }

    /// Build every configured source. Memory sources convert their documents
    /// with `mapping`.
    pub fn from_config(config: &EngineConfig, mapping: Arc<SchemaMapping>) -> SourceResult<Self> {
        let mut sources: IndexMap<String, Arc<dyn DataSource>> = IndexMap::new();
        for (tag, source_config) in &config.data_sources.sources {
            let source: Arc<dyn DataSource> = match source_config {
                SourceConfig::Memory { documents } => {
                    let memory = MemorySource::new(Arc::clone(&mapping), &config.default_namespace);
                    for document in documents {
                        memory.push_document(document.clone())?;
                    }
                    Arc::new(memory)
                }
            };
            sources.insert(tag.clone(), source);
        }
        if !sources.contains_key(&config.data_sources.default) {
            return Err(SourceError::Backend(format!(
                "default source {} is not configured",
                config.data_sources.default
            )));
        }
        Ok(Self {
            default_tag: config.data_sources.default.clone(),
            sources,
        })
    }

    /// Add or replace a source
    pub fn register(&mut self, tag: impl Into<String>, source: Arc<dyn DataSource>) {
        self.sources.insert(tag.into(), source);
    }

    pub fn with_source(mut self, tag: impl Into<String>, source: Arc<dyn DataSource>) -> Self {
        self.register(tag, source);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn DataSource>> {
        self.sources.get(tag)
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("default_tag", &self.default_tag)
            .field("tags", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}
