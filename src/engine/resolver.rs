//! Level-synchronized prefetch
//!
//! The engine walks a selection tree one level at a time. For every field
//! with a nested selection it gathers the object values of that field over
//! the whole current frontier and fetches all of them in a single
//! `fetch_by_ids` round trip, so a field costs one backend call per level no
//! matter how many parents reached it.

use super::classify::is_dereferenceable;
use super::context::{
    FetchFailure, FetchOperation, QueryContext, QueryMetrics, ResolutionStatus, Warning,
};
use super::schema::Schema;
use crate::config::EngineConfig;
use crate::query::{Selection, SelectionSet};
use crate::rdf::namespace::type_predicate;
use crate::rdf::QuadStore;
use crate::source::{DataSource, SourceError, SourceRegistry, TypeQuery};
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A data source call failed while `strict` is set
    #[error("Data source {tag} failed: {error}")]
    Source {
        tag: String,
        #[source]
        error: SourceError,
    },

    /// Neither the requested nor the default source tag is registered
    #[error("No data source registered for {0}")]
    MissingSource(String),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// One top-level resolution request
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Selection set of the operation; its top-level field named after the type is resolved
    pub operation: &'a SelectionSet,
    /// Ontology URI of the requested type
    pub type_uri: &'a str,
    pub page: Option<u32>,
    pub inferred: bool,
    /// Source tag of the top-level field, inherited by the first level below it
    pub source: Option<&'a str>,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(operation: &'a SelectionSet, type_uri: &'a str) -> Self {
        Self {
            operation,
            type_uri,
            page: None,
            inferred: false,
            source: None,
        }
    }

    pub fn with_page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    pub fn with_inferred(mut self, inferred: bool) -> Self {
        self.inferred = inferred;
        self
    }

    pub fn with_source(mut self, source: Option<&'a str>) -> Self {
        self.source = source;
        self
    }
}

enum Fetch<'a> {
    ByType(&'a TypeQuery),
    ByIds(&'a [String]),
}

impl Fetch<'_> {
    fn operation(&self) -> FetchOperation {
        match self {
            Fetch::ByType(_) => FetchOperation::ByType,
            Fetch::ByIds(_) => FetchOperation::ByIds,
        }
    }
}

/// Resolution engine bound to one compiled schema and a set of data sources
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    schema: Arc<Schema>,
    sources: SourceRegistry,
    config: EngineConfig,
}

impl ResolutionEngine {
    pub fn new(schema: Arc<Schema>, sources: SourceRegistry, config: EngineConfig) -> Self {
        Self {
            schema,
            sources,
            config,
        }
    }

    /// Engine whose sources are built from `config`
    pub fn from_config(schema: Arc<Schema>, config: EngineConfig) -> Result<Self, SourceError> {
        let sources = SourceRegistry::from_config(&config, schema.mapping_handle())?;
        Ok(Self::new(schema, sources, config))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a request into a fresh per-query context
    pub async fn resolve(&self, request: &ResolveRequest<'_>) -> ResolveResult<ResolvedQuery> {
        let mut context = QueryContext::new();
        let ids = self.resolve_into(&mut context, request).await?;
        let type_name = self
            .schema
            .mapping()
            .name_for(request.type_uri)
            .map(str::to_string);
        Ok(ResolvedQuery::new(ids, type_name, request.page, context))
    }

    /// Resolve a request into `context`, discarding whatever it held before.
    /// Returns the top-level identifiers.
    pub async fn resolve_into(
        &self,
        context: &mut QueryContext,
        request: &ResolveRequest<'_>,
    ) -> ResolveResult<Vec<String>> {
        context.reset();

        let Some(type_name) = self.schema.mapping().name_for(request.type_uri) else {
            warn!("No schema type for {}", request.type_uri);
            context.warnings.push(Warning::UnresolvableType {
                uri: request.type_uri.to_string(),
            });
            return Ok(Vec::new());
        };

        let Some(root) = request.operation.field_named(type_name) else {
            debug!("Operation selects no {} field", type_name);
            return Ok(Vec::new());
        };

        let type_query = TypeQuery {
            type_uri: request.type_uri.to_string(),
            page: request.page,
            page_size: self.config.page_size,
            inferred: request.inferred,
        };
        let page_ids = self
            .fetch(context, request.source, Fetch::ByType(&type_query))
            .await?;
        context.pages.record(request.page, page_ids);

        let frontier = self.frontier(context, request);
        debug!("Frontier for {}: {} subjects", type_name, frontier.len());

        if let Some(selection_set) = &root.selection_set {
            self.descend(context, selection_set, &frontier, type_name, None, request.source)
                .await?;
        }

        context.snapshot_metrics();
        Ok(frontier)
    }

    /// Subjects typed `type_uri`; restricted to the fetched page when paging
    fn frontier(&self, context: &QueryContext, request: &ResolveRequest<'_>) -> Vec<String> {
        let predicate = type_predicate(request.inferred);
        match request.page {
            Some(page) => context
                .pages
                .get(Some(page))
                .iter()
                .filter(|id| {
                    context
                        .store
                        .object_values(id, predicate)
                        .iter()
                        .any(|uri| uri == request.type_uri)
                })
                .cloned()
                .collect(),
            None => context.store.subjects_with(predicate, request.type_uri),
        }
    }

    /// Prefetch one selection level over `frontier`, then recurse.
    ///
    /// `call_source` is the source resolved by the enclosing field; when it is
    /// unset each field takes its first argument's value, or
    /// `parent_query_source` (only passed to the first level).
    fn descend<'b>(
        &'b self,
        context: &'b mut QueryContext,
        selection_set: &'b SelectionSet,
        frontier: &'b [String],
        parent_name: &'b str,
        call_source: Option<&'b str>,
        parent_query_source: Option<&'b str>,
    ) -> BoxFuture<'b, ResolveResult<()>> {
        async move {
            for selection in &selection_set.selections {
                let field = match selection {
                    Selection::InlineFragment(fragment) => {
                        self.descend(
                            context,
                            &fragment.selection_set,
                            frontier,
                            parent_name,
                            call_source,
                            parent_query_source,
                        )
                        .await?;
                        continue;
                    }
                    Selection::Field(field) => field,
                };

                let (Some(name), Some(nested)) = (field.name.as_deref(), &field.selection_set)
                else {
                    if field.name.is_none() {
                        warn!("Skipped unnamed selection under {}", parent_name);
                        context.warnings.push(Warning::MalformedSelection {
                            parent: parent_name.to_string(),
                        });
                    } else {
                        debug!("Skipped leaf selection {:?}", field.name);
                    }
                    continue;
                };

                let iri = self
                    .schema
                    .mapping()
                    .field_iri(name, self.schema.namespace());
                if iri.is_fallback() {
                    warn!("URI for {} was not found, using {}", name, iri.iri());
                    context.warnings.push(Warning::MappingGap {
                        field: name.to_string(),
                        fallback: iri.iri().to_string(),
                    });
                }

                let source = call_source.or_else(|| {
                    field
                        .first_argument()
                        .and_then(|value| value.first_str())
                        .or(parent_query_source)
                });

                let mut children: IndexSet<String> = IndexSet::new();
                for id in frontier {
                    for value in context.store.object_values(id, iri.iri()) {
                        if is_dereferenceable(&value) {
                            children.insert(value);
                        }
                    }
                }
                if children.is_empty() {
                    debug!("No references for {} over {} parents", name, frontier.len());
                    continue;
                }

                let children: Vec<String> = children.into_iter().collect();
                debug!(
                    "Fetching {} references for {}.{} from {:?}",
                    children.len(),
                    parent_name,
                    name,
                    source
                );
                self.fetch(context, source, Fetch::ByIds(&children)).await?;

                let child_parent = self
                    .schema
                    .tree()
                    .referenced_type(parent_name, name)
                    .unwrap_or_default();
                self.descend(context, nested, &children, child_parent, source, None)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// One backend round trip. Failures degrade to an empty batch unless
    /// `strict` is set. Returns the batch identifiers.
    async fn fetch(
        &self,
        context: &mut QueryContext,
        tag: Option<&str>,
        call: Fetch<'_>,
    ) -> ResolveResult<Vec<String>> {
        let (tag, source) = self.select_source(context, tag)?;
        let operation = call.operation();
        context.metrics.fetches += 1;

        let result = match call {
            Fetch::ByType(query) => source.fetch_by_type(query).await,
            Fetch::ByIds(ids) => source.fetch_by_ids(ids).await,
        };

        match result {
            Ok(batch) => {
                let inserted = context.store.extend(batch.quads);
                debug!("Source {} returned {} new quads", tag, inserted);
                Ok(batch.ids)
            }
            Err(error) => {
                warn!("Data source {} failed: {}", tag, error);
                context.failures.push(FetchFailure {
                    source: tag.clone(),
                    operation,
                    message: error.to_string(),
                });
                if self.config.strict {
                    return Err(ResolveError::Source { tag, error });
                }
                context.warnings.push(Warning::SourceFailure {
                    source: tag,
                    message: error.to_string(),
                });
                Ok(Vec::new())
            }
        }
    }

    /// The adapter for `tag`, falling back to the default source
    fn select_source(
        &self,
        context: &mut QueryContext,
        tag: Option<&str>,
    ) -> ResolveResult<(String, Arc<dyn DataSource>)> {
        let default_tag = self.sources.default_tag();
        if let Some(tag) = tag {
            if let Some(source) = self.sources.get(tag) {
                return Ok((tag.to_string(), Arc::clone(source)));
            }
            warn!("Unknown data source {}, using {}", tag, default_tag);
            context.warnings.push(Warning::UnknownSource {
                tag: tag.to_string(),
                fallback: default_tag.to_string(),
            });
        }
        self.sources
            .get(default_tag)
            .map(|source| (default_tag.to_string(), Arc::clone(source)))
            .ok_or_else(|| ResolveError::MissingSource(default_tag.to_string()))
    }
}

/// Outcome of one top-level resolution: the top-level identifiers and the
/// per-query context accessors read from
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    ids: Vec<String>,
    type_name: Option<String>,
    page: Option<u32>,
    context: QueryContext,
}

impl ResolvedQuery {
    pub(crate) fn new(
        ids: Vec<String>,
        type_name: Option<String>,
        page: Option<u32>,
        context: QueryContext,
    ) -> Self {
        Self {
            ids,
            type_name,
            page,
            context,
        }
    }

    /// Top-level identifiers, in fetch order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Schema name of the requested type; `None` when it was unresolvable
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn store(&self) -> &QuadStore {
        &self.context.store
    }

    pub fn metrics(&self) -> QueryMetrics {
        self.context.metrics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.context.warnings.iter()
    }

    /// Drain the warnings; a second call returns nothing
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.context.warnings.drain()
    }

    pub fn failures(&self) -> &[FetchFailure] {
        &self.context.failures
    }

    pub fn status(&self) -> ResolutionStatus {
        self.context.status()
    }

    /// Identifiers the backend returned for the requested page
    pub fn page_members(&self) -> &[String] {
        self.context.pages.get(self.page)
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }
}
