//! Field accessors compiled from the resolution tree
//!
//! Each `(type, field)` pair compiles once per schema into an [`Accessor`]:
//! a tagged variant carrying its predicate IRI as data. A single interpreter,
//! [`Accessor::resolve`], evaluates any accessor against a query's quad
//! store. Accessors never fetch; they only read what the resolution engine
//! already prefetched, and every lookup degrades to an empty result.

use super::filter::apply_filter;
use crate::query::ArgumentValue;
use crate::rdf::namespace::type_predicate;
use crate::rdf::{QuadStore, ReverseEdge};
use crate::schema::{FieldIri, ResolutionTree, SchemaMapping, TypeKind, REVERSE_KEYWORD};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the identity field
pub const ID_FIELD: &str = "_id";
/// Name of the type-names field
pub const TYPE_FIELD: &str = "_type";

/// Compiled field accessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `_id`: the parent identifier itself
    Identity,
    /// `_type`: schema names of the parent's types
    TypeOf,
    /// Single-valued field: first object value
    Literal { predicate: String },
    /// Field mapped to `@reverse`: back-edges pointing at the parent
    ReverseEdge,
    /// List of datatype values
    ListOfLiteral { predicate: String },
    /// List of entity references, subject to the `filter` argument
    ListOfEntity { predicate: String },
    /// Union-typed reference: every object value, unfiltered
    UnionEntity { predicate: String },
}

impl Accessor {
    /// Compile the accessor for `field` declared with `type_name`/`list`
    pub fn compile(
        mapping: &SchemaMapping,
        tree: &ResolutionTree,
        namespace: &str,
        field: &str,
        type_name: &str,
        list: bool,
    ) -> (Accessor, Option<FieldIri>) {
        match field {
            ID_FIELD => return (Accessor::Identity, None),
            TYPE_FIELD => return (Accessor::TypeOf, None),
            _ => {}
        }

        let iri = mapping.field_iri(field, namespace);
        let predicate = iri.iri().to_string();
        let referenced = tree.kind_of(type_name);

        let accessor = if referenced == Some(TypeKind::Union) {
            Accessor::UnionEntity { predicate }
        } else if predicate == REVERSE_KEYWORD {
            Accessor::ReverseEdge
        } else if list && referenced == Some(TypeKind::DataType) {
            Accessor::ListOfLiteral { predicate }
        } else if list {
            Accessor::ListOfEntity { predicate }
        } else {
            Accessor::Literal { predicate }
        };
        (accessor, Some(iri))
    }

    /// Predicate IRI read by this accessor, if any
    pub fn predicate(&self) -> Option<&str> {
        match self {
            Accessor::Literal { predicate }
            | Accessor::ListOfLiteral { predicate }
            | Accessor::ListOfEntity { predicate }
            | Accessor::UnionEntity { predicate } => Some(predicate),
            Accessor::Identity | Accessor::TypeOf | Accessor::ReverseEdge => None,
        }
    }

    /// Whether the accessor yields entity identifiers a nested selection can descend into
    pub fn yields_entities(&self) -> bool {
        matches!(
            self,
            Accessor::ListOfEntity { .. } | Accessor::UnionEntity { .. } | Accessor::Literal { .. }
        )
    }

    /// Evaluate against a query's store
    pub fn resolve(
        &self,
        store: &QuadStore,
        mapping: &SchemaMapping,
        parent: &ParentValue,
        args: &IndexMap<String, ArgumentValue>,
    ) -> FieldValue {
        let parent = parent.id();
        match self {
            Accessor::Identity => FieldValue::Id(parent.to_string()),
            Accessor::TypeOf => {
                let inferred = args
                    .get("inferred")
                    .and_then(ArgumentValue::as_bool)
                    .unwrap_or(false);
                let names = store
                    .object_values(parent, type_predicate(inferred))
                    .into_iter()
                    .map(|uri| mapping.name_for(&uri).unwrap_or_default().to_string())
                    .collect();
                FieldValue::List(names)
            }
            Accessor::Literal { predicate } => {
                FieldValue::Scalar(store.single_literal(parent, predicate))
            }
            Accessor::ReverseEdge => FieldValue::Edges(store.edges_to(parent)),
            Accessor::ListOfLiteral { predicate } => {
                FieldValue::List(store.literal_values(parent, predicate))
            }
            Accessor::ListOfEntity { predicate } => {
                let candidates = store.object_values(parent, predicate);
                FieldValue::List(apply_filter(candidates, args.get("filter")))
            }
            Accessor::UnionEntity { predicate } => {
                FieldValue::List(store.object_values(parent, predicate))
            }
        }
    }
}

/// Parent value handed to an accessor: a bare identifier, or one wrapped in
/// an object with a `value` property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentValue {
    Id(String),
    Wrapped { value: String },
}

impl ParentValue {
    pub fn id(&self) -> &str {
        match self {
            ParentValue::Id(id) | ParentValue::Wrapped { value: id } => id,
        }
    }
}

impl From<&str> for ParentValue {
    fn from(id: &str) -> Self {
        ParentValue::Id(id.to_string())
    }
}

impl From<String> for ParentValue {
    fn from(id: String) -> Self {
        ParentValue::Id(id)
    }
}

/// Value produced by an accessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Id(String),
    Scalar(Option<String>),
    List(Vec<String>),
    Edges(Vec<ReverseEdge>),
}

impl FieldValue {
    /// Identifiers a nested selection would descend into
    pub fn ids(&self) -> Vec<String> {
        match self {
            FieldValue::Id(id) => vec![id.clone()],
            FieldValue::Scalar(value) => value.iter().cloned().collect(),
            FieldValue::List(values) => values.clone(),
            FieldValue::Edges(edges) => edges.iter().map(|e| e.subject.clone()).collect(),
        }
    }
}

/// `(type, field) -> Accessor` for every type of a schema
#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    types: IndexMap<String, IndexMap<String, Accessor>>,
}

impl AccessorTable {
    /// Compile accessors for every type in the tree. Returns the table and
    /// the `type.field` names whose predicates fell back to `namespace`.
    pub fn compile(
        mapping: &SchemaMapping,
        tree: &ResolutionTree,
        namespace: &str,
    ) -> (Self, Vec<String>) {
        let mut table = AccessorTable::default();
        let mut gaps = Vec::new();
        for type_name in tree.type_names() {
            let accessors = synthesize(mapping, tree, namespace, type_name, &mut gaps);
            table.types.insert(type_name.to_string(), accessors);
        }
        (table, gaps)
    }

    pub fn for_type(&self, type_name: &str) -> Option<&IndexMap<String, Accessor>> {
        self.types.get(type_name)
    }

    pub fn get(&self, type_name: &str, field: &str) -> Option<&Accessor> {
        self.for_type(type_name).and_then(|fields| fields.get(field))
    }
}

/// Field accessors of one type
pub fn synthesize(
    mapping: &SchemaMapping,
    tree: &ResolutionTree,
    namespace: &str,
    type_name: &str,
    gaps: &mut Vec<String>,
) -> IndexMap<String, Accessor> {
    let mut accessors = IndexMap::new();
    let Some(node) = tree.get(type_name) else {
        return accessors;
    };
    for (field, spec) in &node.fields {
        let (accessor, iri) =
            Accessor::compile(mapping, tree, namespace, field, &spec.type_name, spec.list);
        if let Some(FieldIri::Fallback(fallback)) = iri {
            warn!("URI for {}.{} was not found, using {}", type_name, field, fallback);
            gaps.push(format!("{}.{}", type_name, field));
        }
        accessors.insert(field.clone(), accessor);
    }
    accessors
}
