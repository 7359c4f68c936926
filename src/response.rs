//! Response assembly
//!
//! Walks a selection tree over a resolved query, evaluating the compiled
//! accessors for every selected field, and wraps the result together with
//! the query's drained warnings.

use crate::engine::{
    Accessor, FieldValue, ParentValue, ResolveError, ResolvedQuery, Schema, Warning,
};
use crate::query::{Field, Selection, SelectionSet};
use crate::rdf::namespace::RDF_TYPE;
use crate::schema::TypeKind;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Side-channel annotations attached to a response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extensions {
    #[serde(rename = "Warning")]
    pub warnings: Vec<Warning>,
}

/// Formatted query response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Selected data, or `false` when resolution failed
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

impl Response {
    /// Failed resolution: `data` is `false` and no warnings are attached
    pub fn from_error(error: &ResolveError) -> Self {
        Self {
            data: Value::Bool(false),
            errors: vec![error.to_string()],
            extensions: None,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        self.extensions
            .as_ref()
            .map(|extensions| extensions.warnings.as_slice())
            .unwrap_or(&[])
    }
}

/// Builds responses from resolved queries against one compiled schema
#[derive(Debug, Clone, Copy)]
pub struct ResponseBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Format `resolved` for `operation`, draining its warnings into
    /// `extensions.Warning`
    pub fn build(&self, resolved: &mut ResolvedQuery, operation: &SelectionSet) -> Response {
        let mut data = Map::new();
        let view: &ResolvedQuery = resolved;
        if let Some(type_name) = view.type_name() {
            if let Some(root) = operation.field_named(type_name) {
                let key = root.response_key().unwrap_or(type_name).to_string();
                let selection_set = root.selection_set.clone().unwrap_or_default();
                let objects = view
                    .ids()
                    .iter()
                    .map(|id| Value::Object(self.object(view, type_name, id, &selection_set)))
                    .collect();
                data.insert(key, Value::Array(objects));
            }
        }

        let warnings = resolved.take_warnings();
        Response {
            data: Value::Object(data),
            errors: Vec::new(),
            extensions: (!warnings.is_empty()).then_some(Extensions { warnings }),
        }
    }

    /// Selected fields of one entity
    pub fn object(
        &self,
        resolved: &ResolvedQuery,
        type_name: &str,
        id: &str,
        selection_set: &SelectionSet,
    ) -> Map<String, Value> {
        let mut object = Map::new();
        for selection in &selection_set.selections {
            match selection {
                Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.type_condition {
                        Some(condition) => {
                            condition == type_name
                                || self.type_names(resolved, id).iter().any(|t| t == condition)
                        }
                        None => true,
                    };
                    if applies {
                        object.extend(self.object(resolved, type_name, id, &fragment.selection_set));
                    }
                }
                Selection::Field(field) => {
                    let Some(key) = field.response_key() else {
                        continue;
                    };
                    let value = self.field(resolved, type_name, id, field);
                    object.insert(key.to_string(), value);
                }
            }
        }
        object
    }

    fn field(&self, resolved: &ResolvedQuery, type_name: &str, id: &str, field: &Field) -> Value {
        let Some(name) = field.name.as_deref() else {
            return Value::Null;
        };
        if name == "__typename" {
            return Value::String(type_name.to_string());
        }
        let Some(accessor) = self.schema.accessor(type_name, name) else {
            debug!("No accessor for {}.{}", type_name, name);
            return Value::Null;
        };

        let value = accessor.resolve(
            resolved.store(),
            self.schema.mapping(),
            &ParentValue::from(id),
            &field.argument_map(),
        );

        match (&field.selection_set, accessor.yields_entities()) {
            (Some(nested), true) => self.entities(resolved, type_name, name, accessor, value, nested),
            _ => serde_json::to_value(&value).unwrap_or(Value::Null),
        }
    }

    fn entities(
        &self,
        resolved: &ResolvedQuery,
        parent_type: &str,
        name: &str,
        accessor: &Accessor,
        value: FieldValue,
        nested: &SelectionSet,
    ) -> Value {
        let tree = self.schema.tree();
        let declared = tree.referenced_type(parent_type, name).unwrap_or_default();
        let objects: Vec<Value> = value
            .ids()
            .iter()
            .map(|child| {
                let concrete = self.concrete_type(resolved, declared, child);
                Value::Object(self.object(resolved, &concrete, child, nested))
            })
            .collect();

        let list = matches!(accessor, Accessor::ListOfEntity { .. } | Accessor::UnionEntity { .. })
            || tree.field(parent_type, name).map(|spec| spec.list).unwrap_or(false);
        if list {
            Value::Array(objects)
        } else {
            objects.into_iter().next().unwrap_or(Value::Null)
        }
    }

    /// Member type of a union the entity is typed as; the declared type otherwise
    fn concrete_type(&self, resolved: &ResolvedQuery, declared: &str, id: &str) -> String {
        let tree = self.schema.tree();
        if tree.kind_of(declared) != Some(TypeKind::Union) {
            return declared.to_string();
        }
        let members = tree
            .get(declared)
            .map(|node| node.members.as_slice())
            .unwrap_or(&[]);
        self.type_names(resolved, id)
            .into_iter()
            .find(|name| members.contains(name))
            .unwrap_or_else(|| declared.to_string())
    }

    fn type_names(&self, resolved: &ResolvedQuery, id: &str) -> Vec<String> {
        resolved
            .store()
            .object_values(id, RDF_TYPE)
            .iter()
            .filter_map(|uri| self.schema.mapping().name_for(uri))
            .map(str::to_string)
            .collect()
    }
}
