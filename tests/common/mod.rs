//! Shared fixtures: the Organization / Person / Agent schema and a data
//! source that records every call it serves.

#![allow(dead_code)]

use async_trait::async_trait;
use ontoql::source::{DataSource, FetchBatch, MemorySource, SourceError, SourceResult, TypeQuery};
use ontoql::{
    EngineConfig, FieldSpec, ResolutionEngine, ResolutionTree, Schema, SchemaMapping,
    SourceRegistry, TypeNode,
};
use serde_json::json;
use std::sync::{Arc, Mutex, Once};

pub const NS: &str = "http://schema.org/";
pub const EX: &str = "http://example.com/";

pub fn ex(local: &str) -> String {
    format!("{}{}", EX, local)
}

pub fn mapping() -> SchemaMapping {
    SchemaMapping::from_context([
        ("Organization", "http://example.com/Organization"),
        ("Person", "http://example.com/Person"),
        ("Agent", "http://example.com/Agent"),
        ("name", "http://example.com/name"),
        ("age", "http://example.com/age"),
        ("isMarried", "http://example.com/isMarried"),
        ("revenue", "http://example.com/revenue"),
        ("employee", "http://example.com/employee"),
        ("customerOf", "http://example.com/customerOf"),
        ("nickname", "http://example.com/nickname"),
        ("partner", "http://example.com/partner"),
        ("_reverse", "@reverse"),
    ])
}

pub fn tree() -> ResolutionTree {
    ResolutionTree::new()
        .with_type("String", TypeNode::data_type())
        .with_type("Int", TypeNode::data_type())
        .with_type("Boolean", TypeNode::data_type())
        .with_type("Decimal", TypeNode::data_type())
        .with_type("Agent", TypeNode::union(["Person", "Organization"]))
        .with_type(
            "Organization",
            TypeNode::object()
                .with_field("_id", FieldSpec::single("String"))
                .with_field("_type", FieldSpec::list("String"))
                .with_field("name", FieldSpec::single("String"))
                .with_field("revenue", FieldSpec::single("Decimal"))
                .with_field("employee", FieldSpec::list("Person"))
                .with_field("partner", FieldSpec::list("Agent"))
                .with_field("_reverse", FieldSpec::list("Person")),
        )
        .with_type(
            "Person",
            TypeNode::object()
                .with_field("_id", FieldSpec::single("String"))
                .with_field("_type", FieldSpec::list("String"))
                .with_field("name", FieldSpec::single("String"))
                .with_field("age", FieldSpec::single("Int"))
                .with_field("isMarried", FieldSpec::single("Boolean"))
                .with_field("nickname", FieldSpec::list("String"))
                .with_field("customerOf", FieldSpec::list("Organization"))
                .with_field("motto", FieldSpec::single("String")),
        )
}

pub fn schema() -> Arc<Schema> {
    Arc::new(Schema::compile(mapping(), tree(), NS).expect("fixture schema compiles"))
}

/// Two organizations sharing one employee, plus a customer relation
pub fn documents() -> Vec<serde_json::Value> {
    vec![
        json!({
            "_id": ex("org1"),
            "_type": ["Organization"],
            "_inferred": ["Organization", "Agent"],
            "name": "ACME",
            "revenue": 12.5,
            "employee": [{"_id": ex("alice")}, {"_id": ex("bob")}],
            "partner": [{"_id": ex("org2")}, {"_id": ex("alice")}]
        }),
        json!({
            "_id": ex("org2"),
            "_type": ["Organization"],
            "_inferred": ["Organization", "Agent"],
            "name": "Globex",
            "employee": [{"_id": ex("bob")}, {"_id": ex("carol")}]
        }),
        json!({
            "_id": ex("alice"),
            "_type": ["Person"],
            "_inferred": ["Person", "Agent"],
            "name": "Alice",
            "age": 34,
            "isMarried": true,
            "nickname": ["Al", "Ally"],
            "customerOf": [{"_id": ex("org2")}]
        }),
        json!({
            "_id": ex("bob"),
            "_type": ["Person"],
            "name": "Bob",
            "age": 41,
            "homepage": "http://bob.example.org/",
            "customerOf": [{"_id": ex("org1")}]
        }),
        json!({
            "_id": ex("carol"),
            "_type": ["Person"],
            "name": "Carol",
            "age": "42"
        }),
    ]
}

pub fn memory_source(documents: Vec<serde_json::Value>) -> MemorySource {
    let source = MemorySource::new(Arc::new(mapping()), NS);
    for document in documents {
        source.push_document(document).expect("fixture document has _id");
    }
    source
}

/// One recorded data source call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ByType { type_uri: String, page: Option<u32> },
    ByIds(Vec<String>),
}

/// Wraps a source and records every call
pub struct RecordingSource {
    inner: Option<MemorySource>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingSource {
    pub fn new(inner: MemorySource) -> Self {
        Self {
            inner: Some(inner),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A source whose every call fails
    pub fn failing() -> Self {
        Self {
            inner: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn id_fetches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ByIds(ids) => Some(ids),
                Call::ByType { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl DataSource for RecordingSource {
    async fn fetch_by_type(&self, query: &TypeQuery) -> SourceResult<FetchBatch> {
        self.calls.lock().unwrap().push(Call::ByType {
            type_uri: query.type_uri.clone(),
            page: query.page,
        });
        match &self.inner {
            Some(inner) => inner.fetch_by_type(query).await,
            None => Err(SourceError::Backend("connection refused".to_string())),
        }
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> SourceResult<FetchBatch> {
        self.calls.lock().unwrap().push(Call::ByIds(ids.to_vec()));
        match &self.inner {
            Some(inner) => inner.fetch_by_ids(ids).await,
            None => Err(SourceError::Backend("connection refused".to_string())),
        }
    }
}

static TRACING: Once = Once::new();

/// Route engine logs to the test harness output
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Engine over the fixture documents with a recording default source
pub fn engine_with(config: EngineConfig) -> (Arc<ResolutionEngine>, Arc<RecordingSource>) {
    init_tracing();
    let source = Arc::new(RecordingSource::new(memory_source(documents())));
    let registry = SourceRegistry::new("memory", source.clone());
    let engine = Arc::new(ResolutionEngine::new(schema(), registry, config));
    (engine, source)
}

pub fn engine() -> (Arc<ResolutionEngine>, Arc<RecordingSource>) {
    engine_with(EngineConfig::default())
}
