//! Query entry point: binds one top-level field to the resolution engine

use super::resolver::{ResolutionEngine, ResolveRequest, ResolveResult, ResolvedQuery};
use crate::query::{Field, SelectionSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Arguments of a top-level type field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    pub page: Option<u32>,
    pub inferred: bool,
    pub source: Option<String>,
}

impl QueryArgs {
    /// Read `page`, `inferred` and `source` off a top-level field. Pages that
    /// are not positive integers are ignored.
    pub fn from_field(field: &Field) -> Self {
        Self {
            page: field
                .argument("page")
                .and_then(|value| value.as_i64())
                .and_then(|page| u32::try_from(page).ok())
                .filter(|page| *page > 0),
            inferred: field
                .argument("inferred")
                .and_then(|value| value.as_bool())
                .unwrap_or(false),
            source: field
                .argument("source")
                .and_then(|value| value.first_str())
                .map(str::to_string),
        }
    }
}

/// Top-level field serving one ontology type
#[derive(Debug, Clone)]
pub struct QueryField {
    type_uri: String,
    engine: Arc<ResolutionEngine>,
}

impl QueryField {
    pub fn new(type_uri: impl Into<String>, engine: Arc<ResolutionEngine>) -> Self {
        Self {
            type_uri: type_uri.into(),
            engine,
        }
    }

    /// Entry point for the schema type `type_name`, if the mapping knows it
    pub fn for_type(engine: &Arc<ResolutionEngine>, type_name: &str) -> Option<Self> {
        let uri = engine.schema().mapping().uri_for(type_name)?;
        Some(Self::new(uri, Arc::clone(engine)))
    }

    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    /// Resolve this field within `operation`
    pub async fn execute(
        &self,
        operation: &SelectionSet,
        args: &QueryArgs,
    ) -> ResolveResult<ResolvedQuery> {
        info!("Query started for {}", self.type_uri);
        debug!("Query arguments: {:?}", args);

        let request = ResolveRequest::new(operation, &self.type_uri)
            .with_page(args.page)
            .with_inferred(args.inferred)
            .with_source(args.source.as_deref());
        let resolved = self.engine.resolve(&request).await?;

        let metrics = resolved.metrics();
        info!(
            "Query for {} finished: {} source calls, {} quads, {} objects",
            self.type_uri, metrics.fetches, metrics.quads, metrics.objects
        );
        Ok(resolved)
    }

    /// Resolve `operation`, reading the arguments off its field for this type
    pub async fn execute_operation(&self, operation: &SelectionSet) -> ResolveResult<ResolvedQuery> {
        let args = self
            .engine
            .schema()
            .mapping()
            .name_for(&self.type_uri)
            .and_then(|name| operation.field_named(name))
            .map(QueryArgs::from_field)
            .unwrap_or_default();
        self.execute(operation, &args).await
    }
}
