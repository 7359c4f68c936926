//! Per-query state
//!
//! Everything a single top-level query accumulates while it resolves: the
//! quad store, the page cache, the fetch counters, non-fatal warnings and
//! adapter failures. A context is owned by one query and reset before each
//! resolution; nothing here is shared across queries.

use crate::rdf::QuadStore;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Non-fatal issue raised while resolving a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Field name missing from the schema context; a fallback IRI was used
    MappingGap { field: String, fallback: String },
    /// Requested top-level type URI has no schema name
    UnresolvableType { uri: String },
    /// Source tag not configured; the default source served the request
    UnknownSource { tag: String, fallback: String },
    /// A data source call failed and was treated as returning no data
    SourceFailure { source: String, message: String },
    /// Selection without a field name
    MalformedSelection { parent: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MappingGap { field, fallback } => {
                write!(f, "URI for {} was not found, using {}", field, fallback)
            }
            Warning::UnresolvableType { uri } => write!(f, "no schema type for {}", uri),
            Warning::UnknownSource { tag, fallback } => {
                write!(f, "unknown data source {}, using {}", tag, fallback)
            }
            Warning::SourceFailure { source, message } => {
                write!(f, "data source {} failed: {}", source, message)
            }
            Warning::MalformedSelection { parent } => {
                write!(f, "skipped unnamed selection under {}", parent)
            }
        }
    }
}

/// Per-query warning accumulator; identical warnings are kept once
#[derive(Debug, Clone, Default)]
pub struct Warnings(IndexSet<Warning>);

impl Warnings {
    pub fn push(&mut self, warning: Warning) {
        self.0.insert(warning);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    /// Take every warning, leaving the accumulator empty
    pub fn drain(&mut self) -> Vec<Warning> {
        self.0.drain(..).collect()
    }
}

/// Per-query fetch instrumentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryMetrics {
    /// Backend round trips
    pub fetches: usize,
    /// Quads in the store
    pub quads: usize,
    /// Distinct subjects materialized
    pub objects: usize,
}

/// Which adapter call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOperation {
    ByType,
    ByIds,
}

/// A data source call that failed and was degraded to "no data"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub source: String,
    pub operation: FetchOperation,
    pub message: String,
}

/// Whether every data source call succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Complete,
    Degraded,
}

/// Top-level identifiers materialized per page (`None` = unbounded fetch)
#[derive(Debug, Clone, Default)]
pub struct PageCache(FxHashMap<Option<u32>, Vec<String>>);

impl PageCache {
    pub fn record(&mut self, page: Option<u32>, ids: Vec<String>) {
        self.0.insert(page, ids);
    }

    pub fn get(&self, page: Option<u32>) -> &[String] {
        self.0.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Everything one query owns while it resolves
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub store: QuadStore,
    pub pages: PageCache,
    pub metrics: QueryMetrics,
    pub warnings: Warnings,
    pub failures: Vec<FetchFailure>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all quads, pages, counters, warnings and failures
    pub fn reset(&mut self) {
        self.store.clear();
        self.pages.clear();
        self.metrics = QueryMetrics::default();
        self.warnings = Warnings::default();
        self.failures.clear();
    }

    /// Refresh the store-derived counters
    pub fn snapshot_metrics(&mut self) {
        self.metrics.quads = self.store.len();
        self.metrics.objects = self.store.subject_count();
    }

    pub fn status(&self) -> ResolutionStatus {
        if self.failures.is_empty() {
            ResolutionStatus::Complete
        } else {
            ResolutionStatus::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, NamedNode, Quad, RdfPredicate};

    #[test]
    fn test_warnings_dedupe_and_drain() {
        let mut warnings = Warnings::default();
        let gap = Warning::MappingGap {
            field: "nickname".to_string(),
            fallback: "http://schema.org/nickname".to_string(),
        };
        warnings.push(gap.clone());
        warnings.push(gap.clone());
        warnings.push(Warning::UnresolvableType {
            uri: "http://example.com/Robot".to_string(),
        });
        assert_eq!(warnings.len(), 2);

        let drained = warnings.drain();
        assert_eq!(drained[0], gap);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_warning_serializes_with_kind() {
        let warning = Warning::UnknownSource {
            tag: "mongo".to_string(),
            fallback: "memory".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "unknown_source");
        assert_eq!(json["tag"], "mongo");
        assert_eq!(warning.to_string(), "unknown data source mongo, using memory");
    }

    #[test]
    fn test_page_cache() {
        let mut pages = PageCache::default();
        pages.record(Some(2), vec!["http://e.com/a".to_string()]);
        assert_eq!(pages.get(Some(2)), ["http://e.com/a".to_string()]);
        assert!(pages.get(None).is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ctx = QueryContext::new();
        ctx.store.insert(Quad::in_default_graph(
            NamedNode::new("http://e.com/a").unwrap().into(),
            RdfPredicate::new("http://e.com/name").unwrap(),
            Literal::new_simple_literal("A").into(),
        ));
        ctx.metrics.fetches = 3;
        ctx.pages.record(None, vec!["http://e.com/a".to_string()]);
        ctx.failures.push(FetchFailure {
            source: "memory".to_string(),
            operation: FetchOperation::ByIds,
            message: "down".to_string(),
        });
        ctx.snapshot_metrics();
        assert_eq!(ctx.metrics.quads, 1);
        assert_eq!(ctx.status(), ResolutionStatus::Degraded);

        ctx.reset();
        assert!(ctx.store.is_empty());
        assert_eq!(ctx.metrics, QueryMetrics::default());
        assert!(ctx.pages.get(None).is_empty());
        assert_eq!(ctx.status(), ResolutionStatus::Complete);
    }
}
