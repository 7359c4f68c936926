//! Per-query RDF quad store
//!
//! This module provides the transient in-memory quad index the resolution
//! engine fills level by level and the field accessors read from. A store is
//! owned by exactly one query; it is never shared between concurrent queries.

use super::types::{Quad, RdfObject};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A back-edge: `subject --predicate--> <queried object>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReverseEdge {
    /// Subject pointing at the queried object
    pub subject: String,
    /// Predicate of the edge
    pub predicate: String,
}

/// Quad store with multiple indices for the lookups the engine needs
///
/// Implements:
/// - SPO index (Subject -> Predicate -> Objects)
/// - POS index (Predicate -> Object -> Subjects)
/// - OSP index (Object -> (Subject, Predicate)), node objects only
///
/// All indices preserve insertion order, so lookups are deterministic.
#[derive(Debug, Clone, Default)]
pub struct QuadStore {
    /// All quads (primary storage, insertion ordered)
    quads: IndexSet<Quad>,

    /// SPO index: subject id -> predicate IRI -> objects
    spo_index: FxHashMap<String, IndexMap<String, IndexSet<RdfObject>>>,

    /// POS index: predicate IRI -> object value -> subject ids
    pos_index: FxHashMap<String, FxHashMap<String, IndexSet<String>>>,

    /// OSP index: object node id -> back-edges
    osp_index: FxHashMap<String, IndexSet<ReverseEdge>>,

    /// Distinct subjects in first-seen order
    subjects: IndexSet<String>,
}

impl QuadStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quad. Returns `false` when the quad was already present.
    pub fn insert(&mut self, quad: Quad) -> bool {
        if self.quads.contains(&quad) {
            return false;
        }
        self.update_indices_insert(&quad);
        self.quads.insert(quad);
        true
    }

    /// Insert many quads, returning how many were new
    pub fn extend<I: IntoIterator<Item = Quad>>(&mut self, quads: I) -> usize {
        quads.into_iter().filter(|q| self.insert(q.clone())).count()
    }

    /// Total number of quads
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Number of distinct subjects materialized
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Number of distinct object values across all quads
    pub fn distinct_object_count(&self) -> usize {
        self.quads
            .iter()
            .map(|q| &q.object)
            .collect::<IndexSet<_>>()
            .len()
    }

    /// Discard all quads
    pub fn clear(&mut self) {
        self.quads.clear();
        self.spo_index.clear();
        self.pos_index.clear();
        self.osp_index.clear();
        self.subjects.clear();
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    /// Iterate quads in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Objects of `(subject, predicate)`
    pub fn objects(&self, subject: &str, predicate: &str) -> Vec<&RdfObject> {
        self.spo_index
            .get(subject)
            .and_then(|preds| preds.get(predicate))
            .map(|objs| objs.iter().collect())
            .unwrap_or_default()
    }

    /// String values of the objects of `(subject, predicate)`, IRIs and literals alike
    pub fn object_values(&self, subject: &str, predicate: &str) -> Vec<String> {
        self.objects(subject, predicate)
            .into_iter()
            .map(RdfObject::value)
            .collect()
    }

    /// Lexical values of the literal objects of `(subject, predicate)`
    pub fn literal_values(&self, subject: &str, predicate: &str) -> Vec<String> {
        self.objects(subject, predicate)
            .into_iter()
            .filter(|o| o.is_literal())
            .map(RdfObject::value)
            .collect()
    }

    /// First object value of `(subject, predicate)`, if any
    pub fn single_literal(&self, subject: &str, predicate: &str) -> Option<String> {
        self.objects(subject, predicate).first().map(|o| o.value())
    }

    /// Subjects having `(predicate, object)`, in insertion order
    pub fn subjects_with(&self, predicate: &str, object: &str) -> Vec<String> {
        self.pos_index
            .get(predicate)
            .and_then(|objs| objs.get(object))
            .map(|subjs| subjs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Back-edges whose object is the node `object`.
    ///
    /// Only IRI and blank node objects are indexed. A string literal that
    /// merely looks like a URL is still followed during prefetch, but it never
    /// shows up here as an edge.
    pub fn edges_to(&self, object: &str) -> Vec<ReverseEdge> {
        self.osp_index
            .get(object)
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn update_indices_insert(&mut self, quad: &Quad) {
        let s_key = quad.subject.id();
        let p_key = quad.predicate.as_str().to_string();
        let o_val = quad.object.value();

        self.subjects.insert(s_key.clone());

        // Update SPO index
        self.spo_index
            .entry(s_key.clone())
            .or_default()
            .entry(p_key.clone())
            .or_default()
            .insert(quad.object.clone());

        // Update POS index
        self.pos_index
            .entry(p_key.clone())
            .or_default()
            .entry(o_val)
            .or_default()
            .insert(s_key.clone());

        // Update OSP index
        if let Some(o_key) = quad.object.node_id() {
            self.osp_index.entry(o_key).or_default().insert(ReverseEdge {
                subject: s_key,
                predicate: p_key,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::namespace::RDF_TYPE;
    use crate::rdf::types::{Literal, NamedNode, RdfPredicate, RdfSubject};

    fn iri(s: &str) -> NamedNode {
        NamedNode::new(s).unwrap()
    }

    fn quad(s: &str, p: &str, o: RdfObject) -> Quad {
        Quad::in_default_graph(
            RdfSubject::from_id(s).unwrap(),
            RdfPredicate::new(p).unwrap(),
            o,
        )
    }

    fn sample_store() -> QuadStore {
        let mut store = QuadStore::new();
        store.insert(quad(
            "http://example.com/org1",
            RDF_TYPE,
            iri("http://example.com/Organization").into(),
        ));
        store.insert(quad(
            "http://example.com/org1",
            "http://example.com/employee",
            iri("http://example.com/alice").into(),
        ));
        store.insert(quad(
            "http://example.com/org1",
            "http://example.com/employee",
            iri("http://example.com/bob").into(),
        ));
        store.insert(quad(
            "http://example.com/alice",
            "http://example.com/name",
            Literal::new_simple_literal("Alice").into(),
        ));
        store
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut store = sample_store();
        assert_eq!(store.len(), 4);

        let again = quad(
            "http://example.com/alice",
            "http://example.com/name",
            Literal::new_simple_literal("Alice").into(),
        );
        assert!(store.contains(&again));
        assert!(!store.insert(again));
        assert_eq!(store.len(), 4);
        assert_eq!(store.object_values("http://example.com/alice", "http://example.com/name").len(), 1);
    }

    #[test]
    fn test_object_lookups_preserve_order() {
        let store = sample_store();
        assert_eq!(
            store.object_values("http://example.com/org1", "http://example.com/employee"),
            vec!["http://example.com/alice", "http://example.com/bob"]
        );
        assert_eq!(
            store.single_literal("http://example.com/alice", "http://example.com/name"),
            Some("Alice".to_string())
        );
        assert!(store
            .literal_values("http://example.com/org1", "http://example.com/employee")
            .is_empty());
    }

    #[test]
    fn test_missing_lookups_are_empty() {
        let store = sample_store();
        assert!(store.objects("http://example.com/nobody", RDF_TYPE).is_empty());
        assert!(store.subjects_with(RDF_TYPE, "http://example.com/Person").is_empty());
        assert!(store.edges_to("http://example.com/nobody").is_empty());
        assert_eq!(store.single_literal("http://example.com/org1", "http://example.com/name"), None);
    }

    #[test]
    fn test_subjects_with_type() {
        let store = sample_store();
        assert_eq!(
            store.subjects_with(RDF_TYPE, "http://example.com/Organization"),
            vec!["http://example.com/org1"]
        );
    }

    #[test]
    fn test_edges_to() {
        let store = sample_store();
        let edges = store.edges_to("http://example.com/alice");
        assert_eq!(
            edges,
            vec![ReverseEdge {
                subject: "http://example.com/org1".to_string(),
                predicate: "http://example.com/employee".to_string(),
            }]
        );
    }

    #[test]
    fn test_edges_to_skips_url_literals() {
        let mut store = sample_store();
        store.insert(quad(
            "http://example.com/bob",
            "http://example.com/homepage",
            Literal::new_simple_literal("http://example.com/alice").into(),
        ));
        assert_eq!(store.edges_to("http://example.com/alice").len(), 1);
        assert_eq!(
            store.object_values("http://example.com/bob", "http://example.com/homepage"),
            vec!["http://example.com/alice"]
        );
    }

    #[test]
    fn test_counts_and_clear() {
        let mut store = sample_store();
        assert_eq!(store.subject_count(), 2);
        assert_eq!(store.distinct_object_count(), 4);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.subject_count(), 0);
        assert!(store.objects("http://example.com/org1", RDF_TYPE).is_empty());
    }
}
