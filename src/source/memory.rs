//! In-memory document source
//!
//! Stores flat JSON documents keyed by `_id` and converts them to quads on
//! every fetch using the schema context:
//!
//! ```json
//! {
//!   "_id": "http://example.com/acme",
//!   "_type": ["Organization"],
//!   "_inferred": ["Organization", "Agent"],
//!   "name": "ACME",
//!   "employee": [{"_id": "http://example.com/alice"}],
//!   "_reverse": {"customerOf": [{"_id": "http://example.com/bob"}]}
//! }
//! ```
//!
//! `_reverse` entries describe documents pointing *at* this one; they are
//! converted as well and their identifiers are returned with the batch.
//!
//! Nested objects without an `_id` become blank nodes labelled from their
//! position in the owning document, so fetching a document twice yields the
//! same quads.

use super::{DataSource, FetchBatch, SourceError, SourceResult, TypeQuery};
use crate::rdf::namespace::{
    fallback_iri, INFERRED_TYPE, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_INTEGER,
};
use crate::rdf::{BlankNode, Literal, NamedNode, Quad, RdfObject, RdfPredicate, RdfSubject};
use crate::schema::{SchemaMapping, REVERSE_KEYWORD};
use async_trait::async_trait;
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde_json::Value;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use tracing::debug;

const ID_KEY: &str = "_id";
const TYPE_KEY: &str = "_type";
const INFERRED_KEY: &str = "_inferred";
const REVERSE_KEY: &str = "_reverse";

/// Document store held in process memory
pub struct MemorySource {
    mapping: Arc<SchemaMapping>,
    namespace: String,
    documents: RwLock<IndexMap<String, Value>>,
}

impl MemorySource {
    pub fn new(mapping: Arc<SchemaMapping>, namespace: &str) -> Self {
        Self {
            mapping,
            namespace: namespace.to_string(),
            documents: RwLock::new(IndexMap::new()),
        }
    }

    /// Add a document, replacing any previous one with the same `_id`
    pub fn push_document(&self, document: Value) -> SourceResult<()> {
        let id = document
            .get(ID_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::InvalidDocument(format!("missing {}: {}", ID_KEY, document)))?
            .to_string();
        let mut documents = self
            .documents
            .write()
            .map_err(|_| SourceError::Backend("document lock poisoned".to_string()))?;
        documents.insert(id, document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot<F>(&self, select: F) -> SourceResult<Vec<Value>>
    where
        F: FnOnce(&IndexMap<String, Value>) -> Vec<Value>,
    {
        let documents = self
            .documents
            .read()
            .map_err(|_| SourceError::Backend("document lock poisoned".to_string()))?;
        Ok(select(&documents))
    }

    fn convert(&self, documents: &[Value]) -> SourceResult<FetchBatch> {
        let mut batch = FetchBatch::default();
        for document in documents {
            let subject = self.convert_node(document, None, &mut batch.quads)?;
            batch.ids.push(subject.id());

            if let Some(Value::Object(reverse)) = document.get(REVERSE_KEY) {
                for (property, referrers) in reverse {
                    let predicate = self.predicate(property)?;
                    for (index, referrer) in as_array(referrers).into_iter().enumerate() {
                        let position = (subject.id(), REVERSE_KEY, property.as_str(), index);
                        let referrer_subject =
                            self.convert_node(referrer, Some(blank_label(position)), &mut batch.quads)?;
                        batch.ids.push(referrer_subject.id());
                        batch.quads.push(Quad::in_default_graph(
                            referrer_subject,
                            predicate.clone(),
                            subject.clone().into(),
                        ));
                    }
                }
            }
        }
        Ok(batch)
    }

    /// Convert one node object, returning its subject. `label` names the
    /// blank node used when the object carries no `_id`.
    fn convert_node(
        &self,
        node: &Value,
        label: Option<String>,
        quads: &mut Vec<Quad>,
    ) -> SourceResult<RdfSubject> {
        let subject = match (node.get(ID_KEY).and_then(Value::as_str), label) {
            (Some(id), _) => RdfSubject::from_id(id)?,
            (None, Some(label)) => BlankNode::from_str(&label)?.into(),
            (None, None) => {
                return Err(SourceError::InvalidDocument(format!("missing {}: {}", ID_KEY, node)));
            }
        };
        let Some(properties) = node.as_object() else {
            return Err(SourceError::InvalidDocument(format!("not an object: {}", node)));
        };

        for (key, value) in properties {
            match key.as_str() {
                ID_KEY | REVERSE_KEY => {}
                TYPE_KEY => self.push_types(&subject, RDF_TYPE, value, quads)?,
                INFERRED_KEY => self.push_types(&subject, INFERRED_TYPE, value, quads)?,
                k if k.starts_with('@') || k.starts_with('_') => {
                    debug!("MemorySource: skipping reserved key {}", k);
                }
                property => {
                    if self.mapping.uri_for(property) == Some(REVERSE_KEYWORD) {
                        continue;
                    }
                    let predicate = self.predicate(property)?;
                    for (index, item) in as_array(value).into_iter().enumerate() {
                        let position = (subject.id(), "", property, index);
                        if let Some(object) = self.convert_value(item, position, quads)? {
                            quads.push(Quad::in_default_graph(
                                subject.clone(),
                                predicate.clone(),
                                object,
                            ));
                        }
                    }
                }
            }
        }
        Ok(subject)
    }

    fn push_types(
        &self,
        subject: &RdfSubject,
        predicate: &str,
        value: &Value,
        quads: &mut Vec<Quad>,
    ) -> SourceResult<()> {
        let predicate = RdfPredicate::new(predicate)?;
        for name in as_array(value).into_iter().filter_map(Value::as_str) {
            let iri = self.type_iri(name);
            quads.push(Quad::in_default_graph(
                subject.clone(),
                predicate.clone(),
                NamedNode::new(&iri)?.into(),
            ));
        }
        Ok(())
    }

    fn convert_value(
        &self,
        value: &Value,
        position: (String, &str, &str, usize),
        quads: &mut Vec<Quad>,
    ) -> SourceResult<Option<RdfObject>> {
        let object = match value {
            Value::Null => return Ok(None),
            Value::String(s) => Literal::new_simple_literal(s.as_str()).into(),
            Value::Bool(b) => Literal::new_typed_literal(b.to_string(), NamedNode::new(XSD_BOOLEAN)?).into(),
            Value::Number(n) => {
                let datatype = if n.is_i64() || n.is_u64() {
                    XSD_INTEGER
                } else {
                    XSD_DECIMAL
                };
                Literal::new_typed_literal(n.to_string(), NamedNode::new(datatype)?).into()
            }
            Value::Object(_) => self.convert_node(value, Some(blank_label(position)), quads)?.into(),
            Value::Array(_) => {
                return Err(SourceError::InvalidDocument(format!("nested array: {}", value)));
            }
        };
        Ok(Some(object))
    }

    fn predicate(&self, property: &str) -> SourceResult<RdfPredicate> {
        let iri = self.mapping.field_iri(property, &self.namespace).into_iri();
        Ok(RdfPredicate::new(&iri)?)
    }

    fn type_iri(&self, name: &str) -> String {
        self.mapping
            .uri_for(name)
            .map(str::to_string)
            .unwrap_or_else(|| fallback_iri(&self.namespace, name))
    }
}

/// Stable blank node label for the `index`th value of `property` on `owner`
fn blank_label(position: (String, &str, &str, usize)) -> String {
    let mut hasher = FxHasher::default();
    position.hash(&mut hasher);
    format!("b{:016x}", hasher.finish())
}

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn has_type(document: &Value, key: &str, name: &str) -> bool {
    document
        .get(key)
        .map(|types| as_array(types).iter().any(|t| t.as_str() == Some(name)))
        .unwrap_or(false)
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_by_type(&self, query: &TypeQuery) -> SourceResult<FetchBatch> {
        let Some(type_name) = self.mapping.name_for(&query.type_uri) else {
            debug!("MemorySource: no schema name for {}", query.type_uri);
            return Ok(FetchBatch::default());
        };
        let key = if query.inferred { INFERRED_KEY } else { TYPE_KEY };

        let documents = self.snapshot(|docs| {
            let matching = docs.values().filter(|doc| has_type(doc, key, type_name));
            match query.page {
                Some(page) => {
                    let skip = (page.max(1) as usize - 1) * query.page_size;
                    matching.skip(skip).take(query.page_size).cloned().collect()
                }
                None => matching.cloned().collect(),
            }
        })?;

        debug!(
            "MemorySource: {} documents of type {} (page {:?})",
            documents.len(),
            type_name,
            query.page
        );
        self.convert(&documents)
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> SourceResult<FetchBatch> {
        let documents =
            self.snapshot(|docs| ids.iter().filter_map(|id| docs.get(id)).cloned().collect())?;
        debug!("MemorySource: {} of {} ids found", documents.len(), ids.len());
        self.convert(&documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> MemorySource {
        let mapping = SchemaMapping::from_context([
            ("Organization", "http://example.com/Organization"),
            ("Person", "http://example.com/Person"),
            ("Agent", "http://example.com/Agent"),
            ("name", "http://example.com/name"),
            ("age", "http://example.com/age"),
            ("employee", "http://example.com/employee"),
            ("customerOf", "http://example.com/customerOf"),
        ]);
        let source = MemorySource::new(Arc::new(mapping), "http://schema.org/");
        source
            .push_document(json!({
                "_id": "http://example.com/acme",
                "_type": ["Organization"],
                "_inferred": ["Organization", "Agent"],
                "name": "ACME",
                "employee": [{"_id": "http://example.com/alice"}],
                "_reverse": {"customerOf": [{"_id": "http://example.com/bob", "_type": "Person"}]}
            }))
            .unwrap();
        source
            .push_document(json!({
                "_id": "http://example.com/alice",
                "_type": "Person",
                "name": "Alice",
                "age": 30,
                "isMarried": false
            }))
            .unwrap();
        source
    }

    fn type_query(type_uri: &str, page: Option<u32>, inferred: bool) -> TypeQuery {
        TypeQuery {
            type_uri: type_uri.to_string(),
            page,
            page_size: 1,
            inferred,
        }
    }

    #[tokio::test]
    async fn test_fetch_by_type_converts_document() {
        let source = source();
        let batch = source
            .fetch_by_type(&type_query("http://example.com/Organization", None, false))
            .await
            .unwrap();

        assert_eq!(batch.ids, vec!["http://example.com/acme", "http://example.com/bob"]);
        let rendered: Vec<String> = batch.quads.iter().map(|q| q.to_string()).collect();
        assert!(rendered.contains(
            &"<http://example.com/acme> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Organization> ."
                .to_string()
        ));
        assert!(rendered.contains(
            &"<http://example.com/acme> <http://example.com/employee> <http://example.com/alice> .".to_string()
        ));
        assert!(rendered.contains(
            &"<http://example.com/bob> <http://example.com/customerOf> <http://example.com/acme> .".to_string()
        ));
        assert!(rendered
            .iter()
            .any(|q| q.starts_with("<http://example.com/acme> <http://staple-api.org/datamodel/type> <http://example.com/Agent>")));
    }

    #[tokio::test]
    async fn test_fetch_by_type_inferred_and_paging() {
        let source = source();
        let agents = source
            .fetch_by_type(&type_query("http://example.com/Agent", None, true))
            .await
            .unwrap();
        assert_eq!(agents.ids[0], "http://example.com/acme");

        let asserted = source
            .fetch_by_type(&type_query("http://example.com/Agent", None, false))
            .await
            .unwrap();
        assert!(asserted.is_empty());

        let page2 = source
            .fetch_by_type(&type_query("http://example.com/Person", Some(2), false))
            .await
            .unwrap();
        assert!(page2.is_empty());

        let unknown = source
            .fetch_by_type(&type_query("http://example.com/Robot", None, false))
            .await
            .unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_by_ids_literals_and_fallback_namespace() {
        let source = source();
        let batch = source
            .fetch_by_ids(&["http://example.com/alice".to_string(), "http://example.com/ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(batch.ids, vec!["http://example.com/alice"]);

        let rendered: Vec<String> = batch.quads.iter().map(|q| q.to_string()).collect();
        assert!(rendered.contains(
            &"<http://example.com/alice> <http://example.com/age> \"30\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
                .to_string()
        ));
        assert!(rendered.contains(
            &"<http://example.com/alice> <http://schema.org/isMarried> \"false\"^^<http://www.w3.org/2001/XMLSchema#boolean> ."
                .to_string()
        ));
    }

    #[tokio::test]
    async fn test_repeated_fetch_gives_identical_quads() {
        let source = source();
        source
            .push_document(json!({
                "_id": "http://example.com/globex",
                "_type": "Organization",
                "employee": [{"name": "Anonymous"}, {"name": "Anonymous"}],
                "_reverse": {"customerOf": [{"name": "Walk-in"}]}
            }))
            .unwrap();
        let ids = vec!["http://example.com/globex".to_string()];

        let first = source.fetch_by_ids(&ids).await.unwrap();
        let second = source.fetch_by_ids(&ids).await.unwrap();
        assert_eq!(first.quads, second.quads);
        assert_eq!(first.ids, second.ids);

        let employees: Vec<String> = first
            .quads
            .iter()
            .filter(|q| q.predicate.as_str() == "http://example.com/employee")
            .map(|q| q.object.value())
            .collect();
        assert_eq!(employees.len(), 2);
        assert_ne!(employees[0], employees[1]);
        assert!(employees.iter().all(|id| id.starts_with("_:")));
    }

    #[test]
    fn test_push_document_requires_id() {
        let source = source();
        assert!(source.push_document(json!({"name": "anonymous"})).is_err());
        assert_eq!(source.len(), 2);

        source
            .push_document(json!({"_id": "http://example.com/alice", "name": "Alice B."}))
            .unwrap();
        assert_eq!(source.len(), 2);
    }
}
