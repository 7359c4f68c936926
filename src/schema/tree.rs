//! Resolution tree: per-type field declarations
//!
//! One node per schema type, each listing its fields with the referenced type
//! name and whether the field is a list. The engine consults it while
//! descending (to learn the referenced type's own name) and the accessor
//! compiler turns it into field accessors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{SchemaError, SchemaResult};

/// Kind of a schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Entity type backed by subjects in the store
    #[serde(alias = "ObjectType")]
    Object,
    /// Union of entity types
    #[serde(alias = "UnionType")]
    Union,
    /// Built-in literal/datatype (String, Int, Boolean, ...)
    #[serde(alias = "http://schema.org/DataType")]
    DataType,
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Referenced type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// List cardinality
    #[serde(default)]
    pub list: bool,
}

impl FieldSpec {
    pub fn single(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            list: false,
        }
    }

    pub fn list(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            list: true,
        }
    }
}

/// A schema type with its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNode {
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: IndexMap<String, FieldSpec>,
    /// Member type names (unions only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl TypeNode {
    pub fn object() -> Self {
        Self {
            kind: TypeKind::Object,
            fields: IndexMap::new(),
            members: Vec::new(),
        }
    }

    pub fn data_type() -> Self {
        Self {
            kind: TypeKind::DataType,
            ..Self::object()
        }
    }

    pub fn union<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: TypeKind::Union,
            fields: IndexMap::new(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Builder-style field declaration
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }
}

/// The compiled type tree, keyed by type name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionTree {
    types: IndexMap<String, TypeNode>,
}

impl ResolutionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style type declaration
    pub fn with_type(mut self, name: impl Into<String>, node: TypeNode) -> Self {
        self.types.insert(name.into(), node);
        self
    }

    /// Parse the compiler's JSON output and check that every field
    /// references a declared type.
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let tree: ResolutionTree = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }

    pub fn validate(&self) -> SchemaResult<()> {
        for (type_name, node) in &self.types {
            for (field, spec) in &node.fields {
                if !self.types.contains_key(&spec.type_name) {
                    return Err(SchemaError::UnknownType {
                        owner: format!("{}.{}", type_name, field),
                        type_name: spec.type_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeNode> {
        self.types.get(type_name)
    }

    pub fn field(&self, type_name: &str, field: &str) -> Option<&FieldSpec> {
        self.get(type_name).and_then(|node| node.fields.get(field))
    }

    /// Name of the type `parent.field` refers to
    pub fn referenced_type(&self, parent: &str, field: &str) -> Option<&str> {
        self.field(parent, field).map(|spec| spec.type_name.as_str())
    }

    pub fn kind_of(&self, type_name: &str) -> Option<TypeKind> {
        self.get(type_name).map(|node| node.kind)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
