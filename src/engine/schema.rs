//! Compiled schema handle shared by every query against one served schema

use super::accessor::{Accessor, AccessorTable};
use crate::schema::{ResolutionTree, SchemaMapping, SchemaResult};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::info;

/// Schema mapping, resolution tree and the accessor table compiled from
/// them. Immutable once built.
#[derive(Debug, Clone)]
pub struct Schema {
    mapping: Arc<SchemaMapping>,
    tree: ResolutionTree,
    accessors: AccessorTable,
    namespace: String,
    mapping_gaps: Vec<String>,
}

impl Schema {
    /// Validate the tree and compile every `(type, field)` accessor
    pub fn compile(
        mapping: SchemaMapping,
        tree: ResolutionTree,
        namespace: impl Into<String>,
    ) -> SchemaResult<Self> {
        tree.validate()?;
        let namespace = namespace.into();
        let (accessors, mapping_gaps) = AccessorTable::compile(&mapping, &tree, &namespace);
        info!(
            "Compiled schema: {} types, {} mapping gaps",
            tree.type_names().count(),
            mapping_gaps.len()
        );
        Ok(Self {
            mapping: Arc::new(mapping),
            tree,
            accessors,
            namespace,
            mapping_gaps,
        })
    }

    /// Compile from the ontology compiler's JSON outputs
    pub fn from_json(
        mapping_json: &str,
        tree_json: &str,
        namespace: impl Into<String>,
    ) -> SchemaResult<Self> {
        let mapping = SchemaMapping::from_json_str(mapping_json)?;
        let tree = ResolutionTree::from_json_str(tree_json)?;
        Self::compile(mapping, tree, namespace)
    }

    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    /// Shared handle to the mapping, for adapters that convert documents
    pub fn mapping_handle(&self) -> Arc<SchemaMapping> {
        Arc::clone(&self.mapping)
    }

    pub fn tree(&self) -> &ResolutionTree {
        &self.tree
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn accessor(&self, type_name: &str, field: &str) -> Option<&Accessor> {
        self.accessors.get(type_name, field)
    }

    pub fn accessors_for(&self, type_name: &str) -> Option<&IndexMap<String, Accessor>> {
        self.accessors.for_type(type_name)
    }

    /// `type.field` names compiled with a fallback predicate
    pub fn mapping_gaps(&self) -> &[String] {
        &self.mapping_gaps
    }
}
